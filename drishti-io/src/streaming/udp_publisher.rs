//! UDP publisher for transformed camera records
//!
//! The driver thread hands records to a [`ChannelSink`]; a dedicated
//! publisher thread serializes them and sends one datagram per message to a
//! fixed target.
//!
//! ```text
//! FrameDriver ──► ChannelSink ══ bounded channel ══► UdpPublisher ──► target
//!   (driver thread)                                  (udp-publisher thread)
//! ```
//!
//! The channel is bounded so a stalled publisher never backs up the driver;
//! when it is full the record is dropped and the sink reports an error.

use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError, bounded};
use serde::{Deserialize, Serialize};

use crate::core::{CameraFrameRecord, CameraStaticRecord};
use crate::driver::FrameSink;
use crate::error::{Error, Result};
use crate::streaming::messages::OutputMessage;
use crate::streaming::wire::{Serializer, WireFormat, create_serializer};

/// Send buffer size; a JSON frame is well under 1 KB
const MAX_UDP_BUFFER_SIZE: usize = 4096;

/// Records buffered between driver and publisher
const CHANNEL_CAPACITY: usize = 64;

/// How often the publisher re-checks the running flag while idle
const RECV_TIMEOUT: Duration = Duration::from_millis(100);

/// Publisher settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublisherConfig {
    /// Publish records over UDP (otherwise they are only logged)
    pub enabled: bool,
    /// Destination `host:port`
    pub target: String,
    pub wire_format: WireFormat,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            target: "127.0.0.1:5600".to_string(),
            wire_format: WireFormat::default(),
        }
    }
}

/// Driver-side end of the publisher channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<OutputMessage>,
}

impl ChannelSink {
    pub fn new(tx: Sender<OutputMessage>) -> Self {
        Self { tx }
    }

    fn send(&self, msg: OutputMessage) -> Result<()> {
        self.tx.try_send(msg).map_err(|e| match e {
            TrySendError::Full(msg) => {
                Error::Other(format!("publisher queue full, dropped {}", msg.kind()))
            }
            TrySendError::Disconnected(_) => Error::Other("publisher stopped".to_string()),
        })
    }
}

impl FrameSink for ChannelSink {
    fn on_static(&mut self, record: &CameraStaticRecord) -> Result<()> {
        self.send(OutputMessage::Static(*record))
    }

    fn on_frame(&mut self, record: &CameraFrameRecord) -> Result<()> {
        self.send(OutputMessage::Frame(*record))
    }
}

/// UDP publisher that streams output messages to one target
pub struct UdpPublisher {
    socket: UdpSocket,
    serializer: Serializer,
    target: SocketAddr,
    rx: Receiver<OutputMessage>,
    /// Global running flag (daemon shutdown)
    running: Arc<AtomicBool>,
    sent: u64,
}

impl UdpPublisher {
    pub fn new(
        socket: UdpSocket,
        serializer: Serializer,
        target: SocketAddr,
        rx: Receiver<OutputMessage>,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            socket,
            serializer,
            target,
            rx,
            running,
            sent: 0,
        }
    }

    /// Run the publisher loop (blocking).
    ///
    /// Returns when the running flag is cleared or every sink is dropped.
    pub fn run(&mut self) {
        log::info!(
            "UDP publisher started ({:?} -> {})",
            self.serializer.format(),
            self.target
        );

        // Pre-allocate send buffer to avoid allocation per message
        let mut send_buffer = Vec::with_capacity(MAX_UDP_BUFFER_SIZE);

        while self.running.load(Ordering::Relaxed) {
            match self.rx.recv_timeout(RECV_TIMEOUT) {
                Ok(msg) => self.publish(&msg, &mut send_buffer),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        log::info!("UDP publisher stopped after {} messages", self.sent);
    }

    fn publish(&mut self, msg: &OutputMessage, buf: &mut Vec<u8>) {
        if let Err(e) = self.serializer.encode_framed(msg, buf) {
            log::error!("Failed to serialize {} message: {}", msg.kind(), e);
            return;
        }

        match self.socket.send_to(buf, self.target) {
            Ok(_) => self.sent += 1,
            // Nobody listening is normal for fire-and-forget UDP
            Err(e) => log::trace!("UDP send to {} failed: {}", self.target, e),
        }
    }
}

/// Resolve `target` to a socket address
pub fn resolve_target(target: &str) -> Result<SocketAddr> {
    target
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| Error::InvalidParameter(format!("no address for target {}", target)))
}

/// Bind a sender socket, spawn the publisher thread and return its sink
pub fn spawn_publisher(
    config: &PublisherConfig,
    running: Arc<AtomicBool>,
) -> Result<(ChannelSink, JoinHandle<()>)> {
    let target = resolve_target(&config.target)?;
    let bind_addr = if target.is_ipv6() { "[::]:0" } else { "0.0.0.0:0" };
    let socket = UdpSocket::bind(bind_addr)?;

    let (tx, rx) = bounded(CHANNEL_CAPACITY);
    let serializer = create_serializer(config.wire_format);

    let name = "udp-publisher".to_string();
    let handle = thread::Builder::new()
        .name(name.clone())
        .spawn(move || {
            UdpPublisher::new(socket, serializer, target, rx, running).run();
        })
        .map_err(|source| Error::ThreadSpawn { name, source })?;

    Ok((ChannelSink::new(tx), handle))
}
