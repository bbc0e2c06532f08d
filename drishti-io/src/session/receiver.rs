//! Socket receiver thread
//!
//! Owns the UDP endpoint while the session is running. The socket is moved
//! into the thread and handed back through the `JoinHandle`, so it is only
//! closed after the thread has been joined.
//!
//! ```text
//!   while running:
//!     ┌─ recv_from ──► decode ──► enqueue ─┐
//!     └──────────── until WouldBlock ◄─────┘
//!     sleep 1 ms
//! ```

use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use socket2::{Domain, Protocol, SockAddr, Socket, Type};

use crate::core::{TrackingConstants, TrackingParameters};
use crate::protocol::constants::MAX_DATAGRAM_SIZE;
use crate::protocol::{self, DecodeStats, Decoded};

use super::queue::SampleQueue;

/// Sleep between drain passes
const IDLE_SLEEP: Duration = Duration::from_millis(1);

/// State shared between the receiver thread and the session
#[derive(Debug, Default)]
pub(crate) struct Shared {
    pub parameters: SampleQueue<TrackingParameters>,
    pub constants: SampleQueue<TrackingConstants>,
    pub stats: DecodeStats,
}

impl Shared {
    /// Decode one datagram and enqueue whatever it yields
    pub fn dispatch(&self, datagram: &[u8]) {
        let decoded = protocol::decode(datagram);
        self.stats.record(&decoded);

        match decoded {
            Decoded::Parameters(params) => self.parameters.push(params),
            Decoded::Constants(constants) => self.constants.push(constants),
            Decoded::Both(params, constants) => {
                // Constants first so a consumer never sees these parameters without them
                self.constants.push(constants);
                self.parameters.push(params);
            }
            Decoded::Malformed(kind) => {
                log::trace!("Dropped malformed datagram ({} bytes): {:?}", datagram.len(), kind);
            }
            Decoded::Unrecognized => {
                log::trace!("Dropped unrecognized datagram ({} bytes)", datagram.len());
            }
        }
    }

    pub fn clear(&self) {
        self.parameters.clear();
        self.constants.clear();
    }
}

/// Bind a non-blocking, address-reusing UDP socket on all interfaces
pub(crate) fn bind(port: u16) -> io::Result<UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;

    let addr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port));
    socket.bind(&SockAddr::from(addr))?;

    Ok(socket.into())
}

/// Receiver loop state, moved into the thread
pub(crate) struct Receiver {
    socket: UdpSocket,
    running: Arc<AtomicBool>,
    shared: Arc<Shared>,
}

impl Receiver {
    pub fn new(socket: UdpSocket, running: Arc<AtomicBool>, shared: Arc<Shared>) -> Self {
        Self {
            socket,
            running,
            shared,
        }
    }

    /// Spawn the receiver on a named thread.
    ///
    /// The thread returns the socket when it exits.
    pub fn spawn(self, port: u16) -> io::Result<JoinHandle<UdpSocket>> {
        thread::Builder::new()
            .name(format!("tracking-rx-{}", port))
            .spawn(move || self.run())
    }

    /// Run until the running flag is cleared (blocking)
    pub fn run(self) -> UdpSocket {
        log::debug!("Tracking receiver started on {:?}", self.socket.local_addr());

        let mut buffer = vec![0u8; MAX_DATAGRAM_SIZE];

        while self.running.load(Ordering::Relaxed) {
            // Drain everything that is pending before sleeping
            loop {
                match self.socket.recv_from(&mut buffer) {
                    Ok((len, _src)) => self.shared.dispatch(&buffer[..len]),
                    Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                    Err(e) => {
                        log::warn!("UDP recv error: {}", e);
                        break;
                    }
                }
            }

            thread::sleep(IDLE_SLEEP);
        }

        log::debug!("Tracking receiver stopped");
        self.socket
    }
}
