//! Host session over a serial stream.
//!
//! Owns the host deframer and encoder, turns bytes from the co-processor into
//! [`HostEvent`]s and implements the request/answer exchanges the CLI needs.

use bytes::Bytes;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::time::Instant;
use uartnic_bridge::{BridgeError, Config, HostConfig, HostEncoder, HostEvent, HostNic};
use uartnic_protocol::{ApInfo, Deframer, Intron, MacAddress, AP_INDEX_OUT_OF_RANGE};

/// Device announcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceInfo {
    pub mac: MacAddress,
    pub version: u8,
    pub supported: bool,
}

pub struct HostSession<S> {
    stream: S,
    deframer: Deframer<HostNic>,
    events: mpsc::UnboundedReceiver<HostEvent>,
    /// Events read while waiting for something else.
    backlog: VecDeque<HostEvent>,
    encoder: HostEncoder,
    config: HostConfig,
    buf: Vec<u8>,
}

impl<S> HostSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, config: &Config) -> Self {
        let (tx, events) = mpsc::unbounded_channel();
        let nic = HostNic::new(tx, &config.host, config.queues.max_frame_size);
        Self {
            stream,
            deframer: Deframer::new(nic),
            events,
            backlog: VecDeque::new(),
            encoder: HostEncoder::new(),
            config: config.host.clone(),
            buf: vec![0u8; config.serial.read_buffer_size.max(64)],
        }
    }

    /// Starts from an intron negotiated by an earlier session.
    pub fn with_intron(mut self, intron: Intron) -> Self {
        self.encoder = HostEncoder::with_intron(intron);
        self.deframer.set_intron(intron);
        self
    }

    pub fn nic(&self) -> &HostNic {
        self.deframer.handler()
    }

    pub fn intron(&self) -> Intron {
        self.encoder.intron()
    }

    /// Next event, waiting for bytes as needed. The stream closing is an
    /// error since the co-processor never hangs up on its own.
    pub async fn next_event(&mut self) -> Result<HostEvent, BridgeError> {
        if let Some(event) = self.backlog.pop_front() {
            return Ok(event);
        }
        self.read_event().await
    }

    pub async fn next_event_within(
        &mut self,
        within: Duration,
    ) -> Result<Option<HostEvent>, BridgeError> {
        match tokio::time::timeout(within, self.next_event()).await {
            Ok(event) => event.map(Some),
            Err(_) => Ok(None),
        }
    }

    async fn read_event(&mut self) -> Result<HostEvent, BridgeError> {
        loop {
            if let Ok(event) = self.events.try_recv() {
                return Ok(event);
            }
            let n = self.stream.read(&mut self.buf).await?;
            if n == 0 {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "serial stream closed",
                )
                .into());
            }
            self.deframer.process(&self.buf[..n]);
        }
    }

    /// Reads until `pick` accepts an event or `within` elapses. Rejected
    /// events are kept for [`HostSession::next_event`].
    pub async fn wait_for<T>(
        &mut self,
        within: Duration,
        mut pick: impl FnMut(&HostEvent) -> Option<T>,
    ) -> Result<Option<T>, BridgeError> {
        let deadline = Instant::now() + within;
        loop {
            let event = match tokio::time::timeout_at(deadline, self.read_event()).await {
                Ok(event) => event?,
                Err(_) => return Ok(None),
            };
            if let Some(found) = pick(&event) {
                return Ok(Some(found));
            }
            tracing::trace!(?event, "deferring event");
            self.backlog.push_back(event);
        }
    }

    pub async fn wait_for_device(&mut self, within: Duration) -> Result<DeviceInfo, BridgeError> {
        let picked = self
            .wait_for(within, |event| match *event {
                HostEvent::DeviceInfo {
                    mac,
                    version,
                    supported,
                } => Some(DeviceInfo {
                    mac,
                    version,
                    supported,
                }),
                _ => None,
            })
            .await?;
        picked.ok_or(BridgeError::Timeout("device info"))
    }

    /// Asks for the link state and waits for the answer.
    pub async fn poll_link(&mut self) -> Result<bool, BridgeError> {
        let poll = self.encoder.link_poll();
        self.write(&poll).await?;
        let picked = self
            .wait_for(self.config.reply_timeout(), |event| match event {
                HostEvent::LinkStatus(up) => Some(*up),
                _ => None,
            })
            .await?;
        picked.ok_or(BridgeError::Timeout("link status"))
    }

    /// Sends a link poll unless a packet arrived since the last call.
    pub async fn keepalive(&mut self) -> Result<(), BridgeError> {
        if self.deframer.handler_mut().take_seen_packet() {
            return Ok(());
        }
        let poll = self.encoder.link_poll();
        self.write(&poll).await
    }

    /// Sends credentials. Both directions use a fresh intron afterwards.
    pub async fn join(&mut self, ssid: &str, password: &str) -> Result<(), BridgeError> {
        let message = self.encoder.join(ssid.as_bytes(), password.as_bytes());
        self.deframer.set_intron(self.encoder.intron());
        self.deframer.handler_mut().joining();
        tracing::info!(ssid, intron = %self.encoder.intron(), "joining network");
        self.write(&message).await
    }

    /// Runs a scan for `duration` and fetches every entry found.
    pub async fn scan(&mut self, duration: Duration) -> Result<Vec<ApInfo>, BridgeError> {
        let start = self.encoder.scan_start();
        self.write(&start).await?;
        self.deframer.handler_mut().scan_started();

        let mut count = 0u8;
        let deadline = Instant::now() + duration;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            let found = self
                .wait_for(remaining, |event| match event {
                    HostEvent::ApCount(n) => Some(*n),
                    _ => None,
                })
                .await?;
            match found {
                Some(n) => {
                    tracing::debug!(count = n, "scan progress");
                    count = n;
                }
                None => break,
            }
        }

        let stop = self.encoder.scan_stop();
        self.write(&stop).await?;
        let last = self
            .wait_for(self.config.reply_timeout(), |event| match event {
                HostEvent::ApCount(n) => Some(*n),
                _ => None,
            })
            .await?;
        self.deframer.handler_mut().scan_stopped();
        match last {
            Some(n) => count = n,
            None => tracing::warn!(count, "no final count after stopping scan"),
        }

        let mut found = Vec::with_capacity(count as usize);
        for index in 0..count {
            let request = self.encoder.ap_info(index);
            self.write(&request).await?;
            let entry = self
                .wait_for(self.config.reply_timeout(), |event| match event {
                    HostEvent::ApInfo { index: i, info } if *i == index || *i == AP_INDEX_OUT_OF_RANGE => {
                        Some(*info)
                    }
                    _ => None,
                })
                .await?
                .ok_or(BridgeError::Timeout("access point info"))?;
            match entry {
                Some(info) => found.push(info),
                None => {
                    tracing::debug!(index, "scan results shrank");
                    break;
                }
            }
        }
        Ok(found)
    }

    pub async fn send_packet(&mut self, payload: Bytes) -> Result<(), BridgeError> {
        let message = self.encoder.packet(payload)?;
        self.write(&message).await
    }

    async fn write(&mut self, bytes: &[u8]) -> Result<(), BridgeError> {
        self.stream.write_all(bytes).await?;
        self.stream.flush().await?;
        Ok(())
    }
}
