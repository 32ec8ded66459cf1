//! uartnic - host side of a serial-attached wireless co-processor
//!
//! Talks to the co-processor over a tty or a serial-over-TCP bridge: watches
//! link and traffic, sends credentials and lists nearby access points.

mod output;
mod session;

use clap::{Parser, Subcommand};
use colored::Colorize;
use output::{render_access_point, render_event, render_mode, EventRecord};
use session::HostSession;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use uartnic_bridge::{Config, HostEvent, SerialStream};
use uartnic_protocol::{Intron, INTRON_SIZE};

#[derive(Parser)]
#[command(name = "uartnic")]
#[command(about = "Host tool for a wireless co-processor on a serial line")]
#[command(version)]
struct Cli {
    /// Configuration file (YAML); falls back to UARTNIC_CONFIG
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial device
    #[arg(short, long)]
    device: Option<PathBuf>,

    /// Serial-over-TCP bridge address, overrides --device
    #[arg(long)]
    tcp: Option<String>,

    /// Current intron as 16 hex digits, when a previous join changed it
    #[arg(long, env = "UARTNIC_INTRON", value_parser = parse_intron)]
    intron: Option<Intron>,

    /// Emit one JSON object per line
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print events until Ctrl+C, polling the link while idle
    Monitor,

    /// Query the link state
    Status,

    /// Send network credentials
    Join {
        /// Network name
        ssid: String,

        /// Network password
        #[arg(short, long, env = "UARTNIC_PASSWORD", default_value = "")]
        password: String,

        /// Seconds to wait for the link to come up (0 returns immediately)
        #[arg(short, long, default_value_t = 0)]
        wait: u64,
    },

    /// List nearby access points
    Scan {
        /// Scan duration in seconds
        #[arg(short = 't', long)]
        duration: Option<u64>,
    },
}

fn parse_intron(s: &str) -> Result<Intron, String> {
    let s = s.trim();
    if s.len() != INTRON_SIZE * 2 {
        return Err(format!("expected {} hex digits", INTRON_SIZE * 2));
    }
    let mut bytes = [0u8; INTRON_SIZE];
    for (i, byte) in bytes.iter_mut().enumerate() {
        let digits = s
            .get(i * 2..i * 2 + 2)
            .ok_or_else(|| "invalid hex".to_string())?;
        *byte = u8::from_str_radix(digits, 16).map_err(|e| e.to_string())?;
    }
    Ok(Intron::new(bytes))
}

fn load_config(cli: &Cli) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => {
            let mut config = Config::from_file(path)?;
            config.apply_env_overrides();
            config.validate()?;
            tracing::info!("Loaded config from {}", path.display());
            config
        }
        None => match Config::load() {
            Ok(c) => c,
            Err(e) => {
                // An explicitly named file must load
                if std::env::var("UARTNIC_CONFIG").is_ok() {
                    tracing::error!("Failed to load config: {}", e);
                    return Err(e.into());
                }
                tracing::info!("Using default configuration");
                Config::default()
            }
        },
    };

    if let Some(device) = &cli.device {
        config.serial.device = device.clone();
    }
    if let Some(addr) = &cli.tcp {
        config.serial.tcp_addr = Some(addr.clone());
    }
    Ok(config)
}

fn emit(json: bool, record: EventRecord, text: String) {
    if json {
        println!("{}", record.to_json());
    } else {
        println!("{}", text);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let endpoint = config.serial.endpoint();

    let stream = SerialStream::open(&endpoint).await.map_err(|e| {
        eprintln!("{} {}: {}", "Unable to open".red(), endpoint, e);
        e
    })?;
    tracing::info!("Connected to {}", endpoint);

    let mut session = HostSession::new(stream, &config);
    if let Some(intron) = cli.intron {
        session = session.with_intron(intron);
    }

    match cli.command {
        Commands::Monitor => {
            let ctrl_c = tokio::signal::ctrl_c();
            tokio::pin!(ctrl_c);
            let mut ticker = tokio::time::interval(config.host.poll_interval());
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = &mut ctrl_c => {
                        tracing::info!("Received interrupt, stopping monitor");
                        break;
                    }
                    _ = ticker.tick() => session.keepalive().await?,
                    event = session.next_event() => {
                        let event = event?;
                        emit(cli.json, EventRecord::from(&event), render_event(&event));
                    }
                }
            }
        }

        Commands::Status => {
            let link_up = session.poll_link().await?;
            let nic = session.nic();
            let record = EventRecord::Status {
                mode: nic.mode(),
                link_up,
                mac: nic.mac().map(|m| m.to_string()),
                firmware_version: nic.firmware_version(),
            };
            let mut text = format!(
                "Mode: {}\nLink: {}",
                render_mode(nic.mode()),
                if link_up { "up".green() } else { "down".red() }
            );
            if let Some(mac) = nic.mac() {
                text.push_str(&format!("\nMAC:  {}", mac.to_string().cyan()));
            }
            emit(cli.json, record, text);
        }

        Commands::Join {
            ssid,
            password,
            wait,
        } => {
            session.join(&ssid, &password).await?;
            // Later invocations need the new intron to be understood.
            eprintln!(
                "{} {}; new intron {}",
                "Sent credentials for".green(),
                ssid.cyan(),
                session.intron().to_string().bold()
            );

            if wait > 0 {
                let up = session
                    .wait_for(Duration::from_secs(wait), |event| match event {
                        HostEvent::LinkChanged(true) | HostEvent::LinkStatus(true) => Some(()),
                        _ => None,
                    })
                    .await?;
                if up.is_none() {
                    eprintln!("{}", "Link did not come up".red());
                    std::process::exit(1);
                }
                let event = HostEvent::LinkChanged(true);
                emit(cli.json, EventRecord::from(&event), render_event(&event));
            }
        }

        Commands::Scan { duration } => {
            let duration = duration
                .map(Duration::from_secs)
                .unwrap_or_else(|| config.host.scan_duration());
            eprintln!("{} for {}s...", "Scanning".cyan(), duration.as_secs());

            let found = session.scan(duration).await?;
            if found.is_empty() && !cli.json {
                println!("{}", "No access points found".yellow());
            }
            for (index, info) in found.iter().enumerate() {
                let index = index as u8;
                emit(
                    cli.json,
                    EventRecord::access_point(Some(index), info),
                    render_access_point(index, info),
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_intron() {
        let intron = parse_intron("554e000102030405").unwrap();
        assert_eq!(intron, uartnic_protocol::DEFAULT_INTRON);
        assert!(parse_intron("554e").is_err());
        assert!(parse_intron("554e00010203040g").is_err());
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "uartnic",
            "--tcp",
            "127.0.0.1:2217",
            "join",
            "home",
            "--password",
            "secret",
            "--wait",
            "10",
        ])
        .unwrap();
        assert_eq!(cli.tcp.as_deref(), Some("127.0.0.1:2217"));
        match cli.command {
            Commands::Join { ssid, password, wait } => {
                assert_eq!(ssid, "home");
                assert_eq!(password, "secret");
                assert_eq!(wait, 10);
            }
            _ => panic!("expected join"),
        }
    }
}
