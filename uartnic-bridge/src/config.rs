//! Bridge configuration.
//!
//! Configuration is loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. YAML config file (if specified via UARTNIC_CONFIG or --config)
//! 3. Environment variables

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use uartnic_link::LinkConfig;
use uartnic_protocol::{MAX_PAYLOAD_SIZE, PROTOCOL_VERSION};

/// Bridge configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Serial endpoint configuration.
    pub serial: SerialConfig,
    /// Queue configuration.
    pub queues: QueueConfig,
    /// Link manager configuration.
    pub link: LinkConfig,
    /// Host-side NIC configuration.
    pub host: HostConfig,
}

impl Config {
    /// Loads configuration from file, then applies environment variable overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("UARTNIC_CONFIG") {
            config = Self::from_file(&path)?;
        }

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;
        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
        Ok(config)
    }

    /// Loads configuration from environment variables only.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Applies environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) {
        self.serial.apply_env_overrides();
        self.queues.apply_env_overrides();
        apply_link_env_overrides(&mut self.link);
        self.host.apply_env_overrides();
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.serial.validate()?;
        self.queues.validate()?;
        self.link
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        Ok(())
    }

    /// Saves configuration to a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = serde_yaml::to_string(self)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
        std::fs::write(path, content).map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;
        Ok(())
    }
}

/// Where the serial byte stream comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SerialEndpoint {
    /// A tty device file.
    Device(PathBuf),
    /// A serial-over-TCP bridge such as ser2net.
    Tcp(String),
}

impl std::fmt::Display for SerialEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SerialEndpoint::Device(path) => write!(f, "{}", path.display()),
            SerialEndpoint::Tcp(addr) => write!(f, "tcp://{}", addr),
        }
    }
}

/// Serial endpoint configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Device file. The line speed is set outside this program.
    pub device: PathBuf,
    /// TCP address of a serial bridge; takes precedence over `device`.
    pub tcp_addr: Option<String>,
    /// Size of each read from the serial stream.
    pub read_buffer_size: usize,
    /// Delay before the co-processor's first transmission.
    pub startup_delay_ms: u64,
    /// Period of the link liveness check.
    pub check_interval_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            device: PathBuf::from("/dev/ttyUSB0"),
            tcp_addr: None,
            read_buffer_size: 4096,
            startup_delay_ms: 1000,
            check_interval_ms: 1000,
        }
    }
}

impl SerialConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(device) = std::env::var("UARTNIC_DEVICE") {
            self.device = PathBuf::from(device);
        }

        if let Ok(addr) = std::env::var("UARTNIC_TCP") {
            self.tcp_addr = if addr.is_empty() { None } else { Some(addr) };
        }

        if let Ok(size) = std::env::var("UARTNIC_READ_BUFFER") {
            if let Ok(n) = size.parse() {
                self.read_buffer_size = n;
            }
        }

        if let Ok(delay) = std::env::var("UARTNIC_STARTUP_DELAY_MS") {
            if let Ok(ms) = delay.parse() {
                self.startup_delay_ms = ms;
            }
        }

        if let Ok(interval) = std::env::var("UARTNIC_CHECK_INTERVAL_MS") {
            if let Ok(ms) = interval.parse() {
                self.check_interval_ms = ms;
            }
        }
    }

    pub fn endpoint(&self) -> SerialEndpoint {
        match &self.tcp_addr {
            Some(addr) => SerialEndpoint::Tcp(addr.clone()),
            None => SerialEndpoint::Device(self.device.clone()),
        }
    }

    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.read_buffer_size == 0 {
            return Err(ConfigError::ValidationError(
                "serial.read_buffer_size must be positive".to_string(),
            ));
        }
        if self.check_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "serial.check_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Queue configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Capacity of the radio to serial queue.
    pub radio_to_serial: usize,
    /// Capacity of the serial to radio queue.
    pub serial_to_radio: usize,
    /// Largest network frame accepted from the serial line.
    pub max_frame_size: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            radio_to_serial: 20,
            serial_to_radio: 20,
            max_frame_size: 1600,
        }
    }
}

impl QueueConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(capacity) = std::env::var("UARTNIC_QUEUE_CAPACITY") {
            if let Ok(n) = capacity.parse() {
                self.radio_to_serial = n;
                self.serial_to_radio = n;
            }
        }

        if let Ok(size) = std::env::var("UARTNIC_MAX_FRAME") {
            if let Ok(n) = size.parse() {
                self.max_frame_size = n;
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.radio_to_serial == 0 || self.serial_to_radio == 0 {
            return Err(ConfigError::ValidationError(
                "queue capacities must be positive".to_string(),
            ));
        }
        if self.max_frame_size == 0 || self.max_frame_size > MAX_PAYLOAD_SIZE {
            return Err(ConfigError::ValidationError(format!(
                "queues.max_frame_size must be between 1 and {}",
                MAX_PAYLOAD_SIZE
            )));
        }
        Ok(())
    }
}

fn apply_link_env_overrides(link: &mut LinkConfig) {
    if let Ok(retries) = std::env::var("UARTNIC_MAX_RETRIES") {
        if let Ok(n) = retries.parse() {
            link.max_retries = n;
        }
    }

    if let Ok(retries) = std::env::var("UARTNIC_PROBE_RETRIES") {
        if let Ok(n) = retries.parse() {
            link.probe_retries = n;
        }
    }

    if let Ok(secs) = std::env::var("UARTNIC_INACTIVITY_SECS") {
        if let Ok(n) = secs.parse() {
            link.inactivity_threshold_secs = n;
        }
    }
}

/// Host-side NIC configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Co-processor protocol version this host speaks.
    pub expected_version: u8,
    /// Link poll period while no packet arrives.
    pub poll_interval_ms: u64,
    /// How long `scan` collects results before stopping.
    pub scan_duration_secs: u64,
    /// Wait for each SCAN_AP_GET answer.
    pub reply_timeout_ms: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            expected_version: PROTOCOL_VERSION,
            poll_interval_ms: 1000,
            scan_duration_secs: 5,
            reply_timeout_ms: 500,
        }
    }
}

impl HostConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(version) = std::env::var("UARTNIC_EXPECTED_VERSION") {
            if let Ok(v) = version.parse() {
                self.expected_version = v;
            }
        }

        if let Ok(interval) = std::env::var("UARTNIC_POLL_INTERVAL_MS") {
            if let Ok(ms) = interval.parse() {
                self.poll_interval_ms = ms;
            }
        }

        if let Ok(secs) = std::env::var("UARTNIC_SCAN_SECS") {
            if let Ok(n) = secs.parse() {
                self.scan_duration_secs = n;
            }
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn scan_duration(&self) -> Duration {
        Duration::from_secs(self.scan_duration_secs)
    }

    pub fn reply_timeout(&self) -> Duration {
        Duration::from_millis(self.reply_timeout_ms)
    }
}

/// Configuration error.
#[derive(Debug)]
pub enum ConfigError {
    IoError(PathBuf, std::io::Error),
    ParseError(PathBuf, String),
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(path, e) => {
                write!(f, "failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::ValidationError(msg) => {
                write!(f, "configuration validation failed: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
