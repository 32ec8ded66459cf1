//! Co-processor runtime.
//!
//! Three tasks share the work:
//! - serial rx: deframes the serial stream, queues packets for the radio and
//!   forwards control messages to the link manager
//! - serial tx: sole writer of the serial stream; sends link notices and
//!   frames received from the radio
//! - radio: owns the [`LinkManager`], transmits queued packets and runs the
//!   liveness check

use crate::config::Config;
use crate::error::BridgeError;
use crate::queue::{frame_queue, FrameQueue, FrameSender};
use bytes::Bytes;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{broadcast, mpsc};
use tokio::time::MissedTickBehavior;
use uartnic_link::{
    accept_inbound, ActivityMonitor, LinkCommand, LinkManager, LinkNotice, Radio, RadioEvent,
};
use uartnic_protocol::{
    Deframer, Frame, FrameAssembler, Header, Intron, MacAddress, Message, MessageHandler,
    PacketTunnel,
};

/// Transmit intron shared between the serial tasks.
#[derive(Debug, Clone, Default)]
pub struct SharedIntron(Arc<RwLock<Intron>>);

impl SharedIntron {
    pub fn new(intron: Intron) -> Self {
        Self(Arc::new(RwLock::new(intron)))
    }

    pub fn get(&self) -> Intron {
        *self.0.read()
    }

    pub fn set(&self, intron: Intron) {
        *self.0.write() = intron;
    }
}

/// Bridge statistics.
#[derive(Debug, Default)]
pub struct BridgeStats {
    pub bytes_received: AtomicU64,
    pub frames_to_serial: AtomicU64,
    pub frames_to_radio: AtomicU64,
    pub notices_sent: AtomicU64,
    pub radio_errors: AtomicU64,
    pub filtered: AtomicU64,
}

/// Entry point for frames received by the radio. Never blocks.
#[derive(Debug, Clone)]
pub struct RadioIngress {
    own: MacAddress,
    activity: ActivityMonitor,
    queue: FrameSender,
    stats: Arc<BridgeStats>,
}

impl RadioIngress {
    /// Queues a received frame for the serial line. Returns false when it
    /// was filtered or dropped.
    pub fn deliver(&self, frame: Bytes) -> bool {
        // Any traffic proves the access point is still there.
        self.activity.touch();
        if !accept_inbound(&self.own, &frame) {
            self.stats.filtered.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(len = frame.len(), "frame not addressed to us");
            return false;
        }
        self.queue.offer(frame)
    }
}

/// Shuts the bridge down from outside.
#[derive(Debug, Clone)]
pub struct ShutdownHandle(broadcast::Sender<()>);

impl ShutdownHandle {
    pub fn shutdown(&self) {
        let _ = self.0.send(());
    }
}

/// Co-processor side of the serial link.
pub struct Bridge {
    config: Config,
    activity: ActivityMonitor,
    to_serial: (FrameSender, FrameQueue),
    to_radio: (FrameSender, FrameQueue),
    intron: SharedIntron,
    link_up: Arc<AtomicBool>,
    stats: Arc<BridgeStats>,
    shutdown: broadcast::Sender<()>,
}

impl Bridge {
    pub fn new(config: Config) -> Self {
        let (shutdown, _) = broadcast::channel(1);
        Self {
            to_serial: frame_queue("radio->serial", config.queues.radio_to_serial),
            to_radio: frame_queue("serial->radio", config.queues.serial_to_radio),
            config,
            activity: ActivityMonitor::new(),
            intron: SharedIntron::default(),
            link_up: Arc::new(AtomicBool::new(false)),
            stats: Arc::new(BridgeStats::default()),
            shutdown,
        }
    }

    /// Handle for the radio driver's receive path.
    pub fn ingress(&self, own: MacAddress) -> RadioIngress {
        RadioIngress {
            own,
            activity: self.activity.clone(),
            queue: self.to_serial.0.clone(),
            stats: self.stats.clone(),
        }
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle(self.shutdown.clone())
    }

    pub fn stats(&self) -> Arc<BridgeStats> {
        self.stats.clone()
    }

    pub fn intron(&self) -> SharedIntron {
        self.intron.clone()
    }

    /// Runs until the serial stream closes or shutdown is requested.
    pub async fn run<S, R>(
        self,
        serial: S,
        radio: R,
        radio_events: mpsc::UnboundedReceiver<RadioEvent>,
    ) -> Result<(), BridgeError>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
        R: Radio + 'static,
    {
        let Bridge {
            config,
            activity,
            to_serial: (to_serial_tx, to_serial_rx),
            to_radio: (to_radio_tx, to_radio_rx),
            intron,
            link_up,
            stats,
            shutdown,
        } = self;

        let (reader, writer) = tokio::io::split(serial);
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();

        tracing::info!(
            queue_capacity = config.queues.radio_to_serial,
            max_frame = config.queues.max_frame_size,
            "bridge starting"
        );

        let manager = LinkManager::new(radio, config.link.clone(), activity);
        let radio_task = tokio::spawn(run_radio(
            manager,
            RadioChannels {
                events: radio_events,
                commands: command_rx,
                to_radio: to_radio_rx,
                notices: notice_tx,
            },
            link_up.clone(),
            config.serial.check_interval(),
            stats.clone(),
            shutdown.subscribe(),
        ));

        let tx_task = tokio::spawn(run_serial_tx(
            writer,
            to_serial_rx,
            notice_rx,
            intron.clone(),
            link_up,
            config.serial.startup_delay(),
            stats.clone(),
            shutdown.subscribe(),
        ));

        let ingress = SerialIngress {
            assembler: FrameAssembler::new(config.queues.max_frame_size),
            to_radio: to_radio_tx,
            commands: command_tx,
            tx_intron: intron.clone(),
        };
        let deframer = Deframer::with_intron(ingress, intron.get());
        let rx_result = run_serial_rx(
            reader,
            deframer,
            config.serial.read_buffer_size,
            stats,
            shutdown.subscribe(),
        )
        .await;

        // Whatever ended the receive side ends the bridge.
        let _ = shutdown.send(());
        drop(to_serial_tx);

        let tx_result = tx_task.await.map_err(|e| BridgeError::Task {
            task: "serial tx",
            reason: e.to_string(),
        })?;
        radio_task.await.map_err(|e| BridgeError::Task {
            task: "radio",
            reason: e.to_string(),
        })?;

        tracing::info!("bridge stopped");
        rx_result.and(tx_result)
    }
}

/// Deframer handler of the serial receive task.
struct SerialIngress {
    assembler: FrameAssembler,
    to_radio: FrameSender,
    commands: mpsc::UnboundedSender<LinkCommand>,
    tx_intron: SharedIntron,
}

impl SerialIngress {
    fn command(&self, command: LinkCommand) {
        tracing::debug!(?command, "link command");
        if self.commands.send(command).is_err() {
            tracing::debug!("radio task gone, dropping command");
        }
    }

    fn verified(message: &Message<'_>) -> bool {
        if let Err(e) = message.verify() {
            tracing::warn!(kind = %message.header.kind, error = %e, "dropping control message");
            return false;
        }
        true
    }
}

impl PacketTunnel for SerialIngress {
    fn begin(&mut self, header: &Header) -> bool {
        self.assembler.begin(header)
    }

    fn update(&mut self, chunk: &[u8]) {
        self.assembler.update(chunk);
    }

    fn commit(&mut self, _header: &Header, checksum_valid: bool) {
        if let Some(frame) = self.assembler.finish(checksum_valid) {
            self.to_radio.offer(frame);
        }
    }

    fn abandon(&mut self) {
        self.assembler.abandon();
    }
}

impl MessageHandler for SerialIngress {
    fn on_client_config(&mut self, message: &Message<'_>) {
        if !Self::verified(message) {
            return;
        }
        match message.client_config() {
            Ok(config) => {
                tracing::info!(intron = %config.intron, "new intron from primary");
                self.tx_intron.set(config.intron);
                self.command(LinkCommand::Configure {
                    ssid: config.ssid,
                    password: config.password,
                });
            }
            Err(e) => tracing::warn!(error = %e, "malformed client config"),
        }
    }

    fn on_link_status(&mut self, message: &Message<'_>) {
        if Self::verified(message) {
            self.command(LinkCommand::QueryStatus);
        }
    }

    fn on_scan_start(&mut self, message: &Message<'_>) {
        if Self::verified(message) {
            self.command(LinkCommand::StartScan);
        }
    }

    fn on_scan_stop(&mut self, message: &Message<'_>) {
        if Self::verified(message) {
            self.command(LinkCommand::StopScan);
        }
    }

    fn on_scan_ap_get(&mut self, message: &Message<'_>) {
        if Self::verified(message) {
            self.command(LinkCommand::GetApInfo(message.header.variable_byte));
        }
    }
}

/// Writes one message and flushes.
pub async fn write_frame<W>(writer: &mut W, frame: &Frame, intron: &Intron) -> Result<(), BridgeError>
where
    W: AsyncWrite + Unpin,
{
    let bytes = frame.encode(intron);
    writer.write_all(&bytes).await?;
    writer.flush().await?;
    tracing::trace!(kind = %frame.header.kind, len = bytes.len(), "message sent");
    Ok(())
}

async fn run_serial_rx<Rd, H>(
    mut reader: Rd,
    mut deframer: Deframer<H>,
    buffer_size: usize,
    stats: Arc<BridgeStats>,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), BridgeError>
where
    Rd: AsyncRead + Unpin,
    H: MessageHandler,
{
    let mut buf = vec![0u8; buffer_size];
    let result = loop {
        tokio::select! {
            result = reader.read(&mut buf) => match result {
                Ok(0) => {
                    tracing::info!("serial stream closed");
                    break Ok(());
                }
                Ok(n) => {
                    stats.bytes_received.fetch_add(n as u64, Ordering::Relaxed);
                    deframer.process(&buf[..n]);
                }
                Err(e) => {
                    tracing::error!(error = %e, "serial read failed");
                    break Err(BridgeError::Io(e));
                }
            },
            _ = shutdown.recv() => {
                tracing::debug!("serial rx shutting down");
                break Ok(());
            }
        }
    };

    deframer.reset();
    let s = deframer.stats();
    tracing::info!(
        dispatched = s.dispatched,
        streamed = s.streamed,
        invalid = s.invalid,
        checksum_failures = s.checksum_failures,
        "serial rx stopped"
    );
    result
}

#[allow(clippy::too_many_arguments)]
async fn run_serial_tx<W>(
    mut writer: W,
    mut from_radio: FrameQueue,
    mut notices: mpsc::UnboundedReceiver<LinkNotice>,
    intron: SharedIntron,
    link_up: Arc<AtomicBool>,
    startup_delay: Duration,
    stats: Arc<BridgeStats>,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), BridgeError>
where
    W: AsyncWrite + Unpin,
{
    // Give the primary time to start listening.
    tokio::select! {
        _ = tokio::time::sleep(startup_delay) => {}
        _ = shutdown.recv() => return Ok(()),
    }

    loop {
        tokio::select! {
            biased;

            _ = shutdown.recv() => {
                tracing::debug!("serial tx shutting down");
                break;
            }

            Some(notice) = notices.recv() => {
                tracing::debug!(?notice, "link notice");
                write_frame(&mut writer, &notice.to_frame(), &intron.get()).await?;
                stats.notices_sent.fetch_add(1, Ordering::Relaxed);
            }

            Some(payload) = from_radio.recv() => {
                let up = link_up.load(Ordering::Acquire);
                match Frame::packet(up, payload) {
                    Ok(frame) => {
                        write_frame(&mut writer, &frame, &intron.get()).await?;
                        stats.frames_to_serial.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(e) => tracing::warn!(error = %e, "dropping frame"),
                }
            }

            else => break,
        }
    }

    let _ = writer.flush().await;
    Ok(())
}

struct RadioChannels {
    events: mpsc::UnboundedReceiver<RadioEvent>,
    commands: mpsc::UnboundedReceiver<LinkCommand>,
    to_radio: FrameQueue,
    notices: mpsc::UnboundedSender<LinkNotice>,
}

async fn run_radio<R: Radio>(
    mut manager: LinkManager<R>,
    mut channels: RadioChannels,
    link_up: Arc<AtomicBool>,
    check_interval: Duration,
    stats: Arc<BridgeStats>,
    mut shutdown: broadcast::Receiver<()>,
) {
    manager.announce();
    publish(&mut manager, &channels.notices, &link_up);

    let mut ticker = tokio::time::interval(check_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.recv() => break,

            Some(event) = channels.events.recv() => {
                tracing::debug!(?event, "radio event");
                manager.handle_event(event, Instant::now());
            }

            Some(command) = channels.commands.recv() => manager.handle_command(command),

            Some(frame) = channels.to_radio.recv() => {
                match manager.transmit(&frame) {
                    Ok(()) => {
                        stats.frames_to_radio.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(e) => {
                        stats.radio_errors.fetch_add(1, Ordering::Relaxed);
                        tracing::warn!(error = %e, len = frame.len(), "radio transmit failed");
                    }
                }
            }

            _ = ticker.tick() => manager.tick(Instant::now()),
        }
        publish(&mut manager, &channels.notices, &link_up);
    }

    tracing::info!(state = %manager.state(), "radio task stopped");
}

fn publish<R: Radio>(
    manager: &mut LinkManager<R>,
    notices: &mpsc::UnboundedSender<LinkNotice>,
    link_up: &AtomicBool,
) {
    link_up.store(manager.is_up(), Ordering::Release);
    for notice in manager.drain_notices() {
        if notices.send(notice).is_err() {
            tracing::debug!("serial tx gone, dropping notice");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HostConfig;
    use crate::nic::{HostEncoder, HostEvent, HostNic};
    use parking_lot::Mutex;
    use tokio::io::DuplexStream;
    use tokio::task::JoinHandle;
    use tokio::time::timeout;
    use uartnic_link::{RadioError, ScanKind, ScanParams, ScanRecord};
    use uartnic_protocol::{ApInfo, DEFAULT_INTRON, PROTOCOL_VERSION};

    const OWN: MacAddress = MacAddress([0x08, 0x3A, 0x8D, 0xFA, 0xA7, 0xD3]);
    const AP: MacAddress = MacAddress([0x10, 0x20, 0x30, 0x40, 0x50, 0x60]);

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Configure(Vec<u8>),
        Connect,
        Disconnect,
        StartScan(ScanKind),
        StopScan,
        Transmit(Vec<u8>),
    }

    #[derive(Clone, Default)]
    struct FakeRadio {
        calls: Arc<Mutex<Vec<Call>>>,
    }

    impl FakeRadio {
        fn record(&self, call: Call) -> Result<(), RadioError> {
            self.calls.lock().push(call);
            Ok(())
        }
    }

    impl Radio for FakeRadio {
        fn mac_address(&self) -> MacAddress {
            OWN
        }

        fn configure(&mut self, ssid: &[u8], _password: &[u8]) -> Result<(), RadioError> {
            self.record(Call::Configure(ssid.to_vec()))
        }

        fn connect(&mut self) -> Result<(), RadioError> {
            self.record(Call::Connect)
        }

        fn disconnect(&mut self) -> Result<(), RadioError> {
            self.record(Call::Disconnect)
        }

        fn start_scan(&mut self, params: &ScanParams) -> Result<(), RadioError> {
            self.record(Call::StartScan(params.kind))
        }

        fn stop_scan(&mut self) -> Result<(), RadioError> {
            self.record(Call::StopScan)
        }

        fn transmit(&mut self, frame: &[u8]) -> Result<(), RadioError> {
            self.record(Call::Transmit(frame.to_vec()))
        }
    }

    struct Harness {
        stream: DuplexStream,
        host: Deframer<HostNic>,
        host_events: mpsc::UnboundedReceiver<HostEvent>,
        encoder: HostEncoder,
        radio_events: mpsc::UnboundedSender<RadioEvent>,
        calls: Arc<Mutex<Vec<Call>>>,
        ingress: RadioIngress,
        shutdown: ShutdownHandle,
        stats: Arc<BridgeStats>,
        task: JoinHandle<Result<(), BridgeError>>,
    }

    fn test_config() -> Config {
        let mut config = Config::default();
        config.serial.startup_delay_ms = 0;
        config.serial.read_buffer_size = 64;
        config
    }

    fn start() -> Harness {
        let (stream, device) = tokio::io::duplex(4096);
        let radio = FakeRadio::default();
        let calls = radio.calls.clone();
        let (radio_events, radio_rx) = mpsc::unbounded_channel();

        let bridge = Bridge::new(test_config());
        let ingress = bridge.ingress(OWN);
        let shutdown = bridge.shutdown_handle();
        let stats = bridge.stats();
        let task = tokio::spawn(bridge.run(device, radio, radio_rx));

        let (tx, host_events) = mpsc::unbounded_channel();
        Harness {
            stream,
            host: Deframer::new(HostNic::new(tx, &HostConfig::default(), 1600)),
            host_events,
            encoder: HostEncoder::new(),
            radio_events,
            calls,
            ingress,
            shutdown,
            stats,
            task,
        }
    }

    impl Harness {
        async fn next_event(&mut self) -> HostEvent {
            let mut buf = [0u8; 512];
            loop {
                if let Ok(event) = self.host_events.try_recv() {
                    return event;
                }
                let n = timeout(Duration::from_secs(5), self.stream.read(&mut buf))
                    .await
                    .expect("timed out waiting for the bridge")
                    .unwrap();
                assert!(n > 0, "bridge closed the stream");
                self.host.process(&buf[..n]);
            }
        }

        async fn send(&mut self, bytes: &[u8]) {
            self.stream.write_all(bytes).await.unwrap();
        }

        async fn wait_for_call(&self, call: Call) {
            timeout(Duration::from_secs(5), async {
                loop {
                    if self.calls.lock().contains(&call) {
                        return;
                    }
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
            })
            .await
            .expect("radio call never happened");
        }

        async fn associate(&mut self) {
            self.radio_events.send(RadioEvent::Started).unwrap();
            self.radio_events
                .send(RadioEvent::Associated {
                    bssid: AP,
                    ssid: b"home".to_vec(),
                })
                .unwrap();
            // An unsolicited link report looks like a poll answer.
            assert_eq!(self.next_event().await, HostEvent::LinkChanged(true));
            assert_eq!(self.next_event().await, HostEvent::LinkStatus(true));
        }

        /// Frame addressed to the co-processor.
        fn inbound_frame(len: usize) -> Bytes {
            let mut frame = vec![0x5A; len];
            frame[..6].copy_from_slice(OWN.as_bytes());
            Bytes::from(frame)
        }
    }

    #[tokio::test]
    async fn test_announces_device_info() {
        let mut h = start();
        assert_eq!(
            h.next_event().await,
            HostEvent::DeviceInfo {
                mac: OWN,
                version: PROTOCOL_VERSION,
                supported: true
            }
        );
        h.shutdown.shutdown();
        h.task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_radio_frames_reach_host() {
        let mut h = start();
        h.next_event().await;
        h.associate().await;

        let frame = Harness::inbound_frame(300);
        assert!(h.ingress.deliver(frame.clone()));
        assert_eq!(h.next_event().await, HostEvent::Frame(frame));
        assert!(h.host.handler().link_up());

        // Unicast to someone else is filtered.
        let mut other = vec![0u8; 60];
        other[..6].copy_from_slice(AP.as_bytes());
        assert!(!h.ingress.deliver(Bytes::from(other)));
        assert_eq!(h.stats.filtered.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_host_packets_reach_radio() {
        let mut h = start();
        h.next_event().await;

        let payload = vec![0xC3; 1500];
        let bytes = h.encoder.packet(Bytes::from(payload.clone())).unwrap();
        // Split writes exercise the streaming path.
        h.send(&bytes[..100]).await;
        h.send(&bytes[100..]).await;
        h.wait_for_call(Call::Transmit(payload)).await;
    }

    #[tokio::test]
    async fn test_link_poll() {
        let mut h = start();
        h.next_event().await;
        let poll = h.encoder.link_poll();
        h.send(&poll).await;
        assert_eq!(h.next_event().await, HostEvent::LinkStatus(false));

        h.associate().await;
        h.send(&poll).await;
        assert_eq!(h.next_event().await, HostEvent::LinkStatus(true));
    }

    #[tokio::test]
    async fn test_join_rotates_intron_both_ways() {
        let mut h = start();
        h.next_event().await;

        let join = h.encoder.join(b"office", b"hunter22");
        h.host.set_intron(h.encoder.intron());
        h.send(&join).await;
        h.wait_for_call(Call::Configure(b"office".to_vec())).await;

        // The bridge announces itself again, then answers with the new
        // intron only.
        assert_eq!(
            h.next_event().await,
            HostEvent::DeviceInfo {
                mac: OWN,
                version: PROTOCOL_VERSION,
                supported: true
            }
        );
        let poll = h.encoder.link_poll();
        h.send(&poll).await;
        assert_eq!(h.next_event().await, HostEvent::LinkStatus(false));
        assert_ne!(h.encoder.intron(), DEFAULT_INTRON);

        h.radio_events.send(RadioEvent::Started).unwrap();
        h.wait_for_call(Call::Connect).await;
    }

    #[tokio::test]
    async fn test_scan_over_serial() {
        let mut h = start();
        h.next_event().await;

        let start_scan = h.encoder.scan_start();
        h.send(&start_scan).await;
        h.wait_for_call(Call::StartScan(ScanKind::Discovery)).await;

        h.radio_events
            .send(RadioEvent::ScanDone(vec![
                ScanRecord {
                    bssid: AP,
                    ssid: b"lab".to_vec(),
                    requires_password: true,
                },
                ScanRecord {
                    bssid: OWN,
                    ssid: b"guest".to_vec(),
                    requires_password: false,
                },
            ]))
            .unwrap();
        assert_eq!(h.next_event().await, HostEvent::ApCount(2));

        let stop = h.encoder.scan_stop();
        h.send(&stop).await;
        h.wait_for_call(Call::StopScan).await;
        h.radio_events.send(RadioEvent::ScanDone(Vec::new())).unwrap();
        assert_eq!(h.next_event().await, HostEvent::ApCount(2));

        let get = h.encoder.ap_info(1);
        h.send(&get).await;
        assert_eq!(
            h.next_event().await,
            HostEvent::ApInfo {
                index: 1,
                info: Some(ApInfo::new("guest", false))
            }
        );
        let get = h.encoder.ap_info(9);
        h.send(&get).await;
        assert_eq!(
            h.next_event().await,
            HostEvent::ApInfo {
                index: 0xFF,
                info: None
            }
        );
    }

    #[tokio::test]
    async fn test_garbage_between_messages() {
        let mut h = start();
        h.next_event().await;
        h.send(&[0x55, 0x4E, 0x00, 0xFF, 0x13, 0x37]).await;
        let poll = h.encoder.link_poll();
        h.send(&poll).await;
        assert_eq!(h.next_event().await, HostEvent::LinkStatus(false));
    }

    #[tokio::test]
    async fn test_stream_close_stops_bridge() {
        let h = start();
        drop(h.stream);
        timeout(Duration::from_secs(5), h.task)
            .await
            .expect("bridge did not stop")
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_write_frame() {
        let frame = Frame::scan_ap_count(3);
        let expected = frame.encode(&DEFAULT_INTRON);
        let mut mock = tokio_test::io::Builder::new().write(&expected).build();
        write_frame(&mut mock, &frame, &DEFAULT_INTRON).await.unwrap();
    }

    #[test]
    fn test_shared_intron() {
        let shared = SharedIntron::default();
        assert_eq!(shared.get(), DEFAULT_INTRON);
        let other = shared.clone();
        other.set(Intron::new([1, 2, 3, 4, 5, 6, 7, 8]));
        assert_eq!(shared.get(), Intron::new([1, 2, 3, 4, 5, 6, 7, 8]));
    }
}
