//! Connectivity policy: connect, reconnect, scan and liveness probing.
//!
//! The [`LinkManager`] owns the radio and is driven from a single task by
//! radio events, commands from the serial side and a periodic tick. Its
//! outputs are [`LinkNotice`]s which the runtime turns into messages for the
//! primary controller.

use crate::error::LinkError;
use crate::radio::{ActivityMonitor, Radio, RadioEvent, ScanRecord};
use crate::scan::{ssid_eq, DwellSchedule, ScanKind, ScanParams, ScanResults};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};
use uartnic_protocol::{ApInfo, Frame, MacAddress, AP_INDEX_OUT_OF_RANGE, PROTOCOL_VERSION};

/// Link manager configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Reconnect attempts after losing the access point before giving up
    /// until the next configuration.
    pub max_retries: u32,
    /// Extra probe scans before an unseen access point is declared lost.
    pub probe_retries: u32,
    /// Inbound silence that triggers a probe.
    pub inactivity_threshold_secs: u64,
    pub probe_dwell_min_ms: u64,
    pub probe_dwell_max_ms: u64,
    /// Per-channel dwell of the first discovery round; doubles each round.
    pub discovery_dwell_initial_ms: u64,
    pub discovery_dwell_max_ms: u64,
    pub max_scan_results: usize,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            probe_retries: 3,
            inactivity_threshold_secs: 5,
            probe_dwell_min_ms: 120,
            probe_dwell_max_ms: 300,
            discovery_dwell_initial_ms: 42,
            discovery_dwell_max_ms: 2500,
            max_scan_results: 64,
        }
    }
}

impl LinkConfig {
    pub fn inactivity_threshold(&self) -> Duration {
        Duration::from_secs(self.inactivity_threshold_secs)
    }

    pub fn probe_params(&self) -> ScanParams {
        ScanParams {
            kind: ScanKind::Probe,
            dwell_min: Duration::from_millis(self.probe_dwell_min_ms),
            dwell_max: Duration::from_millis(self.probe_dwell_max_ms),
            show_hidden: true,
        }
    }

    pub fn dwell_schedule(&self) -> DwellSchedule {
        DwellSchedule::new(
            Duration::from_millis(self.discovery_dwell_initial_ms),
            Duration::from_millis(self.discovery_dwell_max_ms),
        )
    }

    pub fn validate(&self) -> Result<(), LinkError> {
        if self.inactivity_threshold_secs == 0 {
            return Err(LinkError::InvalidConfig(
                "inactivity_threshold_secs must be positive".into(),
            ));
        }
        if self.probe_dwell_min_ms > self.probe_dwell_max_ms {
            return Err(LinkError::InvalidConfig(
                "probe_dwell_min_ms exceeds probe_dwell_max_ms".into(),
            ));
        }
        if self.discovery_dwell_initial_ms == 0
            || self.discovery_dwell_initial_ms > self.discovery_dwell_max_ms
        {
            return Err(LinkError::InvalidConfig(
                "discovery dwell must satisfy 0 < initial <= max".into(),
            ));
        }
        // The count travels in a single byte and 0xFF marks out of range.
        if self.max_scan_results == 0 || self.max_scan_results >= AP_INDEX_OUT_OF_RANGE as usize {
            return Err(LinkError::InvalidConfig(
                "max_scan_results must be between 1 and 254".into(),
            ));
        }
        Ok(())
    }
}

/// Externally visible link state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connecting,
    Associated,
    Scanning,
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LinkState::Disconnected => "disconnected",
            LinkState::Connecting => "connecting",
            LinkState::Associated => "associated",
            LinkState::Scanning => "scanning",
        };
        f.write_str(s)
    }
}

/// Requests from the primary controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkCommand {
    Configure { ssid: Vec<u8>, password: Vec<u8> },
    StartScan,
    StopScan,
    GetApInfo(u8),
    QueryStatus,
}

/// Output of the link manager, one message each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkNotice {
    /// Association gained or lost.
    LinkChanged(bool),
    /// Answer to a status query.
    LinkStatus(bool),
    ApCount(u8),
    ApInfo { index: u8, info: ApInfo },
    DeviceInfo { version: u8, mac: MacAddress },
}

impl LinkNotice {
    pub fn to_frame(&self) -> Frame {
        match self {
            LinkNotice::LinkChanged(up) | LinkNotice::LinkStatus(up) => Frame::link_status(*up),
            LinkNotice::ApCount(count) => Frame::scan_ap_count(*count),
            LinkNotice::ApInfo { index, info } => Frame::ap_info_response(*index, info),
            LinkNotice::DeviceInfo { version, mac } => Frame::device_info(*version, *mac),
        }
    }
}

#[derive(Debug)]
struct Discovery {
    stop_requested: bool,
}

#[derive(Debug)]
struct Probe {
    attempts: u32,
}

#[derive(Debug)]
struct CurrentAp {
    bssid: MacAddress,
    ssid: Vec<u8>,
}

/// Owns the radio and decides when to connect, scan and probe.
pub struct LinkManager<R> {
    radio: R,
    config: LinkConfig,
    activity: ActivityMonitor,
    /// Association state; never `Scanning`.
    link: LinkState,
    /// Radio restarting after `configure`.
    awaiting_start: bool,
    retries: u32,
    reconnect_owed: bool,
    reported_up: bool,
    /// Kind of scan the radio currently runs.
    scanning: Option<ScanKind>,
    discovery: Option<Discovery>,
    discovery_pending: bool,
    probe: Option<Probe>,
    beacon_quirk: bool,
    current_ap: Option<CurrentAp>,
    dwell: DwellSchedule,
    results: ScanResults,
    notices: VecDeque<LinkNotice>,
}

impl<R: Radio> LinkManager<R> {
    pub fn new(radio: R, config: LinkConfig, activity: ActivityMonitor) -> Self {
        Self {
            radio,
            dwell: config.dwell_schedule(),
            results: ScanResults::new(config.max_scan_results),
            config,
            activity,
            link: LinkState::Disconnected,
            awaiting_start: false,
            retries: 0,
            reconnect_owed: false,
            reported_up: false,
            scanning: None,
            discovery: None,
            discovery_pending: false,
            probe: None,
            beacon_quirk: false,
            current_ap: None,
            notices: VecDeque::new(),
        }
    }

    pub fn state(&self) -> LinkState {
        if self.discovery.is_some() {
            LinkState::Scanning
        } else {
            self.link
        }
    }

    pub fn is_up(&self) -> bool {
        self.link == LinkState::Associated
    }

    pub fn reconnect_owed(&self) -> bool {
        self.reconnect_owed
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn probing(&self) -> bool {
        self.probe.is_some()
    }

    pub fn results(&self) -> &ScanResults {
        &self.results
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    /// Queues the device announcement.
    pub fn announce(&mut self) {
        self.notices.push_back(LinkNotice::DeviceInfo {
            version: PROTOCOL_VERSION,
            mac: self.radio.mac_address(),
        });
    }

    /// Hands an outbound frame to the radio.
    pub fn transmit(&mut self, frame: &[u8]) -> Result<(), LinkError> {
        self.radio.transmit(frame)?;
        Ok(())
    }

    pub fn drain_notices(&mut self) -> impl Iterator<Item = LinkNotice> + '_ {
        self.notices.drain(..)
    }

    pub fn handle_event(&mut self, event: RadioEvent, now: Instant) {
        match event {
            RadioEvent::Started => self.on_started(),
            RadioEvent::Associated { bssid, ssid } => self.on_associated(bssid, ssid, now),
            RadioEvent::Disassociated => self.on_disassociated(),
            RadioEvent::ScanDone(records) => self.on_scan_done(&records, now),
        }
    }

    pub fn handle_command(&mut self, command: LinkCommand) {
        match command {
            LinkCommand::Configure { ssid, password } => self.configure(&ssid, &password),
            LinkCommand::StartScan => {
                if self.scanning == Some(ScanKind::Probe) {
                    tracing::debug!("probe in flight, scan starts after it");
                    self.discovery_pending = true;
                } else if let Err(e) = self.begin_discovery() {
                    tracing::warn!(error = %e, "unable to start scan");
                }
            }
            LinkCommand::StopScan => self.stop_discovery(),
            LinkCommand::GetApInfo(index) => {
                let notice = match self.results.get(index) {
                    Some(info) => LinkNotice::ApInfo { index, info: *info },
                    None => LinkNotice::ApInfo {
                        index: AP_INDEX_OUT_OF_RANGE,
                        info: ApInfo::default(),
                    },
                };
                self.notices.push_back(notice);
            }
            LinkCommand::QueryStatus => {
                self.notices.push_back(LinkNotice::LinkStatus(self.is_up()));
            }
        }
    }

    /// Liveness check. Starts a probe when associated and nothing was
    /// received for longer than the inactivity threshold.
    pub fn tick(&mut self, now: Instant) {
        if self.link != LinkState::Associated
            || self.probe.is_some()
            || self.discovery.is_some()
            || self.scanning.is_some()
        {
            return;
        }
        let idle = self.activity.idle_for(now);
        if idle <= self.config.inactivity_threshold() {
            return;
        }

        tracing::info!(
            idle_ms = idle.as_millis() as u64,
            "no inbound traffic, probing access point"
        );
        self.probe = Some(Probe { attempts: 0 });
        if let Err(e) = self.start_probe() {
            tracing::warn!(error = %e, "unable to start probe");
            self.probe = None;
        }
    }

    fn on_started(&mut self) {
        tracing::info!("radio started");
        self.awaiting_start = false;
        self.connect();
    }

    fn on_associated(&mut self, bssid: MacAddress, ssid: Vec<u8>, now: Instant) {
        tracing::info!(%bssid, ssid = %String::from_utf8_lossy(&ssid), "associated");
        self.link = LinkState::Associated;
        self.retries = 0;
        self.beacon_quirk = true;
        self.activity.touch_at(now);
        self.current_ap = Some(CurrentAp { bssid, ssid });
        self.report_link(true);
    }

    fn on_disassociated(&mut self) {
        let previous = self.link;
        self.link = LinkState::Disconnected;
        self.probe = None;
        self.report_link(false);

        if self.awaiting_start {
            tracing::debug!("disassociated while restarting");
            return;
        }
        if self.scan_busy() {
            tracing::info!("disassociated during scan, reconnecting after it");
            self.reconnect_owed = true;
            return;
        }
        tracing::info!(%previous, "disassociated");
        self.reconnect();
    }

    fn on_scan_done(&mut self, records: &[ScanRecord], now: Instant) {
        match self.scanning.take() {
            Some(ScanKind::Probe) => self.on_probe_result(records, now),
            Some(ScanKind::Discovery) => self.on_discovery_round(records),
            None => tracing::debug!(found = records.len(), "ignoring stale scan result"),
        }

        if self.discovery_pending && self.scanning.is_none() {
            self.discovery_pending = false;
            if let Err(e) = self.begin_discovery() {
                tracing::warn!(error = %e, "unable to start scan");
            }
        }

        // A reconnect owed to a probe is settled once the radio is free.
        if !self.scan_busy() && std::mem::take(&mut self.reconnect_owed) {
            self.reconnect();
        }
    }

    /// Whether a scan of any kind owns the radio.
    fn scan_busy(&self) -> bool {
        self.discovery.is_some() || self.scanning.is_some()
    }

    fn configure(&mut self, ssid: &[u8], password: &[u8]) {
        tracing::info!(ssid = %String::from_utf8_lossy(ssid), "reconfiguring radio");

        // A running scan would otherwise reconnect to the previous network.
        if self.discovery.take().is_some() {
            tracing::info!("stopping scan for new configuration");
        }
        self.reconnect_owed = false;
        self.discovery_pending = false;
        self.dwell.reset();
        self.probe = None;
        if self.scanning.take().is_some() {
            if let Err(e) = self.radio.stop_scan() {
                tracing::debug!(error = %e, "stop scan failed");
            }
        }

        self.retries = 0;
        self.link = LinkState::Disconnected;
        self.current_ap = None;
        self.report_link(false);

        match self.radio.configure(ssid, password) {
            Ok(()) => {
                self.awaiting_start = true;
                // The primary learns our address again after every configuration.
                self.announce();
            }
            Err(e) => tracing::warn!(error = %e, "radio rejected configuration"),
        }
    }

    fn begin_discovery(&mut self) -> Result<(), LinkError> {
        if self.discovery.is_some() {
            return Err(LinkError::ScanInProgress);
        }
        tracing::info!("starting scan");
        self.results.clear();
        self.dwell.reset();
        self.discovery = Some(Discovery {
            stop_requested: false,
        });

        // Scanning while associated is unreliable: drop the link and owe a
        // reconnect once the scan ends.
        if matches!(self.link, LinkState::Associated | LinkState::Connecting) {
            self.reconnect_owed = true;
            if let Err(e) = self.radio.disconnect() {
                tracing::warn!(error = %e, "unable to disconnect before scan");
            }
            self.link = LinkState::Disconnected;
            self.report_link(false);
        }

        if let Err(e) = self.start_round() {
            self.finish_discovery();
            return Err(e);
        }
        Ok(())
    }

    fn start_round(&mut self) -> Result<(), LinkError> {
        let dwell = self.dwell.next_dwell();
        let params = ScanParams {
            kind: ScanKind::Discovery,
            dwell_min: dwell,
            dwell_max: dwell,
            show_hidden: false,
        };
        self.radio.start_scan(&params)?;
        self.scanning = Some(ScanKind::Discovery);
        tracing::debug!(dwell_ms = dwell.as_millis() as u64, "scan round started");
        Ok(())
    }

    fn on_discovery_round(&mut self, records: &[ScanRecord]) {
        let Some(discovery) = &self.discovery else {
            tracing::debug!("scan round finished after scan ended");
            return;
        };
        let stop_requested = discovery.stop_requested;

        self.results.merge(records);
        self.notices
            .push_back(LinkNotice::ApCount(self.results.count()));

        if stop_requested {
            self.finish_discovery();
        } else if let Err(e) = self.start_round() {
            tracing::warn!(error = %e, "unable to restart scan");
            self.finish_discovery();
        }
    }

    fn stop_discovery(&mut self) {
        self.discovery_pending = false;
        let Some(discovery) = self.discovery.as_mut() else {
            tracing::debug!("stop requested with no scan running");
            return;
        };
        discovery.stop_requested = true;

        let stopped = if self.scanning == Some(ScanKind::Discovery) {
            // The final round reports through ScanDone.
            match self.radio.stop_scan() {
                Ok(()) => return,
                Err(e) => {
                    tracing::warn!(error = %e, "stop scan failed");
                    self.scanning = None;
                    true
                }
            }
        } else {
            true
        };

        if stopped {
            self.notices
                .push_back(LinkNotice::ApCount(self.results.count()));
            self.finish_discovery();
        }
    }

    fn finish_discovery(&mut self) {
        self.discovery = None;
        self.dwell.reset();
        tracing::info!(found = self.results.len(), "scan finished");
        if std::mem::take(&mut self.reconnect_owed) {
            self.reconnect();
        }
    }

    fn start_probe(&mut self) -> Result<(), LinkError> {
        let params = self.config.probe_params();
        self.radio.start_scan(&params)?;
        self.scanning = Some(ScanKind::Probe);
        Ok(())
    }

    fn on_probe_result(&mut self, records: &[ScanRecord], now: Instant) {
        if self.probe.is_none() || self.link != LinkState::Associated {
            self.probe = None;
            return;
        }
        if self.discovery_pending {
            // Give the link the benefit of the doubt; the scan takes over.
            self.probe = None;
            self.activity.touch_at(now);
            return;
        }
        if self.ap_visible(records) {
            tracing::debug!("access point still visible");
            self.probe = None;
            self.activity.touch_at(now);
            return;
        }

        let attempts = self.probe.as_ref().map_or(0, |p| p.attempts);
        if attempts < self.config.probe_retries {
            tracing::debug!(attempt = attempts + 1, "access point not seen, probing again");
            if let Some(probe) = self.probe.as_mut() {
                probe.attempts += 1;
            }
            if let Err(e) = self.start_probe() {
                tracing::warn!(error = %e, "unable to restart probe");
                self.probe = None;
            }
            return;
        }

        self.probe = None;
        tracing::warn!(probes = attempts + 1, "access point lost");
        self.link = LinkState::Disconnected;
        self.report_link(false);
        if let Err(e) = self.radio.disconnect() {
            tracing::warn!(error = %e, "disconnect failed, reconnecting directly");
            self.reconnect();
        }
    }

    /// Matches the associated AP by address, falling back to SSID while the
    /// beacon quirk is armed.
    fn ap_visible(&mut self, records: &[ScanRecord]) -> bool {
        let Some(ap) = &self.current_ap else {
            return false;
        };
        if records.iter().any(|r| r.bssid == ap.bssid) {
            self.beacon_quirk = false;
            return true;
        }
        self.beacon_quirk
            && !ap.ssid.is_empty()
            && records
                .iter()
                .any(|r| !r.ssid.is_empty() && ssid_eq(&r.ssid, &ap.ssid))
    }

    fn connect(&mut self) {
        if self.scan_busy() {
            tracing::info!("scan in progress, connecting after it");
            self.reconnect_owed = true;
            return;
        }
        tracing::info!("connecting to access point");
        self.link = LinkState::Connecting;
        if let Err(e) = self.radio.connect() {
            tracing::warn!(error = %e, "connect request failed");
            self.link = LinkState::Disconnected;
        }
    }

    fn reconnect(&mut self) {
        if self.retries >= self.config.max_retries {
            tracing::warn!(
                retries = self.retries,
                "giving up on access point until reconfigured"
            );
            self.link = LinkState::Disconnected;
            return;
        }
        self.retries += 1;
        tracing::info!(attempt = self.retries, max = self.config.max_retries, "reconnecting");
        self.connect();
    }

    fn report_link(&mut self, up: bool) {
        if self.reported_up != up {
            self.reported_up = up;
            self.notices.push_back(LinkNotice::LinkChanged(up));
        }
    }
}
