//! Human and JSON rendering of host events.

use colored::Colorize;
use serde::Serialize;
use uartnic_bridge::{HostEvent, NicMode};
use uartnic_protocol::ApInfo;

/// One line of `--json` output.
#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventRecord {
    DeviceInfo {
        mac: String,
        version: u8,
        supported: bool,
    },
    Link {
        up: bool,
        changed: bool,
    },
    ApCount {
        count: u8,
    },
    AccessPoint {
        index: Option<u8>,
        ssid: String,
        requires_password: bool,
    },
    Frame {
        len: usize,
    },
    Status {
        mode: NicMode,
        link_up: bool,
        mac: Option<String>,
        firmware_version: Option<u8>,
    },
}

impl EventRecord {
    pub fn access_point(index: Option<u8>, info: &ApInfo) -> Self {
        EventRecord::AccessPoint {
            index,
            ssid: info.ssid_str().into_owned(),
            requires_password: info.requires_password,
        }
    }

    pub fn to_json(&self) -> String {
        // Plain data; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl From<&HostEvent> for EventRecord {
    fn from(event: &HostEvent) -> Self {
        match event {
            HostEvent::DeviceInfo {
                mac,
                version,
                supported,
            } => EventRecord::DeviceInfo {
                mac: mac.to_string(),
                version: *version,
                supported: *supported,
            },
            HostEvent::LinkChanged(up) => EventRecord::Link {
                up: *up,
                changed: true,
            },
            HostEvent::LinkStatus(up) => EventRecord::Link {
                up: *up,
                changed: false,
            },
            HostEvent::ApCount(count) => EventRecord::ApCount { count: *count },
            HostEvent::ApInfo { index, info } => match info {
                Some(info) => EventRecord::access_point(Some(*index), info),
                None => EventRecord::AccessPoint {
                    index: None,
                    ssid: String::new(),
                    requires_password: false,
                },
            },
            HostEvent::Frame(frame) => EventRecord::Frame { len: frame.len() },
        }
    }
}

pub fn render_event(event: &HostEvent) -> String {
    match event {
        HostEvent::DeviceInfo {
            mac,
            version,
            supported,
        } => {
            let version = if *supported {
                format!("v{}", version).green()
            } else {
                format!("v{} (unsupported)", version).red()
            };
            format!("{} {} firmware {}", "Device".bold(), mac.to_string().cyan(), version)
        }
        HostEvent::LinkChanged(up) => format!("{} {}", "Link".bold(), link_word(*up)),
        HostEvent::LinkStatus(up) => format!("Link status: {}", link_word(*up)),
        HostEvent::ApCount(count) => format!("{} access point(s) found", count.to_string().cyan()),
        HostEvent::ApInfo { index, info } => match info {
            Some(info) => render_access_point(*index, info),
            None => "No such access point".yellow().to_string(),
        },
        HostEvent::Frame(frame) => format!("Frame {} bytes", frame.len()).dimmed().to_string(),
    }
}

pub fn render_access_point(index: u8, info: &ApInfo) -> String {
    let security = if info.requires_password {
        "secured".yellow()
    } else {
        "open".green()
    };
    format!("{:>3}  {:<32}  {}", index, info.ssid_str(), security)
}

pub fn render_mode(mode: NicMode) -> String {
    let label = match mode {
        NicMode::WaitInit => "waiting for device".dimmed(),
        NicMode::WrongFirmware => "wrong firmware".red(),
        NicMode::NeedAp => "no network configured".yellow(),
        NicMode::Connecting => "connecting".yellow(),
        NicMode::Running => "running".green(),
        NicMode::Scanning => "scanning".cyan(),
    };
    label.to_string()
}

fn link_word(up: bool) -> colored::ColoredString {
    if up {
        "up".green()
    } else {
        "down".red()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use uartnic_protocol::MacAddress;

    #[test]
    fn test_json_device_info() {
        let event = HostEvent::DeviceInfo {
            mac: MacAddress([0x08, 0x3A, 0x8D, 0xFA, 0xA7, 0xD3]),
            version: 13,
            supported: true,
        };
        let value: serde_json::Value =
            serde_json::from_str(&EventRecord::from(&event).to_json()).unwrap();
        assert_eq!(value["event"], "device_info");
        assert_eq!(value["version"], 13);
        assert_eq!(value["supported"], true);
    }

    #[test]
    fn test_json_link_and_frame() {
        let value: serde_json::Value =
            serde_json::from_str(&EventRecord::from(&HostEvent::LinkChanged(true)).to_json())
                .unwrap();
        assert_eq!(value["event"], "link");
        assert_eq!(value["changed"], true);

        let frame = HostEvent::Frame(Bytes::from_static(&[0u8; 64]));
        let value: serde_json::Value =
            serde_json::from_str(&EventRecord::from(&frame).to_json()).unwrap();
        assert_eq!(value["len"], 64);
    }

    #[test]
    fn test_json_access_point() {
        let record = EventRecord::access_point(Some(2), &ApInfo::new("lab", true));
        let value: serde_json::Value = serde_json::from_str(&record.to_json()).unwrap();
        assert_eq!(value["event"], "access_point");
        assert_eq!(value["ssid"], "lab");
        assert_eq!(value["requires_password"], true);

        let missing = HostEvent::ApInfo {
            index: 0xFF,
            info: None,
        };
        let value: serde_json::Value =
            serde_json::from_str(&EventRecord::from(&missing).to_json()).unwrap();
        assert!(value["index"].is_null());
    }

    #[test]
    fn test_json_status_mode() {
        let record = EventRecord::Status {
            mode: NicMode::NeedAp,
            link_up: false,
            mac: None,
            firmware_version: None,
        };
        let value: serde_json::Value = serde_json::from_str(&record.to_json()).unwrap();
        assert_eq!(value["mode"], "need_ap");
    }

    #[test]
    fn test_render_text() {
        colored::control::set_override(false);
        assert_eq!(render_event(&HostEvent::LinkStatus(false)), "Link status: down");
        assert_eq!(
            render_event(&HostEvent::ApCount(3)),
            "3 access point(s) found"
        );
        let line = render_access_point(0, &ApInfo::new("home", false));
        assert!(line.contains("home"));
        assert!(line.ends_with("open"));
        assert_eq!(render_mode(NicMode::Running), "running");
    }
}
