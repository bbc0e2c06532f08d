//! Tracking session
//!
//! Lifecycle facade over the socket receiver and the two sample queues.
//!
//! ```text
//!          start(port)              bind ok + thread spawned
//!   Idle ─────────────► Starting ───────────────────────────► Running
//!    ▲                     │ bind failed                          │
//!    │                     ▼ (CannotCreateHandle)                 │ stop()
//!    └──────────────── Idle ◄──────── Stopping ◄──────────────────┘
//!                                  join thread, then close socket
//! ```
//!
//! Consumers poll without blocking:
//!
//! ```ignore
//! let mut session = TrackingSession::new();
//! session.start(2001);
//! loop {
//!     let available = session.poll();
//!     if available.parameters {
//!         let params = session.take_parameters();
//!         // ...
//!     }
//! }
//! ```
//!
//! Transport faults are never returned as errors. They are recorded and read
//! back through [`TrackingSession::last_error`].

mod queue;
mod receiver;

pub use queue::SampleQueue;

use std::net::{SocketAddr, UdpSocket};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use crate::core::{TrackingConstants, TrackingParameters};
use crate::error::TransportFault;
use crate::protocol::DecodeStatsSnapshot;
use receiver::{Receiver, Shared};

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Starting,
    Running,
    Stopping,
}

/// Which queues have samples waiting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Availability {
    pub parameters: bool,
    pub constants: bool,
}

impl Availability {
    /// True if either queue is non-empty
    pub fn any(&self) -> bool {
        self.parameters || self.constants
    }
}

/// One UDP tracking endpoint and its decoded sample queues
pub struct TrackingSession {
    port: u16,
    state: SessionState,
    running: Arc<AtomicBool>,
    shared: Arc<Shared>,
    /// Receiver thread; yields the socket back when joined
    receiver: Option<JoinHandle<UdpSocket>>,
    local_addr: Option<SocketAddr>,
    last_error: Option<TransportFault>,
}

impl TrackingSession {
    /// Create an idle session
    pub fn new() -> Self {
        Self {
            port: 0,
            state: SessionState::Idle,
            running: Arc::new(AtomicBool::new(false)),
            shared: Arc::new(Shared::default()),
            receiver: None,
            local_addr: None,
            last_error: None,
        }
    }

    /// Bind `0.0.0.0:<port>` and start receiving.
    ///
    /// Does nothing if already running. On failure the session stays idle and
    /// [`last_error`](Self::last_error) reports
    /// [`TransportFault::CannotCreateHandle`]. Port 0 binds an ephemeral port,
    /// see [`local_addr`](Self::local_addr).
    pub fn start(&mut self, port: u16) {
        if self.receiver.is_some() {
            log::warn!(
                "Tracking session already running on port {}, ignoring start({})",
                self.port,
                port
            );
            return;
        }

        self.port = port;
        self.state = SessionState::Starting;

        let socket = match receiver::bind(port) {
            Ok(socket) => socket,
            Err(e) => {
                log::error!("Failed to bind UDP port {}: {}", port, e);
                self.fail_start(port);
                return;
            }
        };
        self.local_addr = socket.local_addr().ok();

        // Stale samples from a previous run are not carried over
        self.shared.clear();
        self.running.store(true, Ordering::Relaxed);

        let rx = Receiver::new(socket, Arc::clone(&self.running), Arc::clone(&self.shared));
        match rx.spawn(port) {
            Ok(handle) => {
                self.receiver = Some(handle);
                self.state = SessionState::Running;
                log::info!("Tracking session listening on {:?}", self.local_addr);
            }
            Err(e) => {
                // The closure owning the socket was dropped with the failed spawn
                log::error!("Failed to spawn receiver thread for port {}: {}", port, e);
                self.running.store(false, Ordering::Relaxed);
                self.fail_start(port);
            }
        }
    }

    fn fail_start(&mut self, port: u16) {
        self.last_error = Some(TransportFault::CannotCreateHandle(port));
        self.local_addr = None;
        self.state = SessionState::Idle;
    }

    /// Stop receiving and release the socket.
    ///
    /// Blocks until the receiver thread has exited. Safe to call when idle
    /// and to call repeatedly.
    pub fn stop(&mut self) {
        let Some(handle) = self.receiver.take() else {
            self.state = SessionState::Idle;
            return;
        };

        self.state = SessionState::Stopping;
        self.running.store(false, Ordering::Relaxed);

        match handle.join() {
            Ok(socket) => drop(socket),
            Err(_) => log::error!("Receiver thread for port {} panicked", self.port),
        }

        self.local_addr = None;
        self.state = SessionState::Idle;
        log::info!("Tracking session on port {} stopped", self.port);
    }

    /// Which queues have samples waiting (non-blocking)
    pub fn poll(&self) -> Availability {
        Availability {
            parameters: !self.shared.parameters.is_empty(),
            constants: !self.shared.constants.is_empty(),
        }
    }

    /// Oldest queued parameters, or the defaults if none are queued
    pub fn take_parameters(&self) -> TrackingParameters {
        self.try_take_parameters().unwrap_or_default()
    }

    /// Oldest queued constants, or the defaults if none are queued
    pub fn take_constants(&self) -> TrackingConstants {
        self.try_take_constants().unwrap_or_default()
    }

    /// Number of queued parameters and constants samples
    pub fn queued(&self) -> (usize, usize) {
        (self.shared.parameters.len(), self.shared.constants.len())
    }

    pub fn try_take_parameters(&self) -> Option<TrackingParameters> {
        self.shared.parameters.pop()
    }

    pub fn try_take_constants(&self) -> Option<TrackingConstants> {
        self.shared.constants.pop()
    }

    /// Most recent transport fault; stays set until [`clear_error`](Self::clear_error)
    pub fn last_error(&self) -> Option<TransportFault> {
        self.last_error
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Address the socket is bound to.
    ///
    /// Records [`TransportFault::NoHandleOnPort`] when called while not running.
    pub fn local_addr(&mut self) -> Option<SocketAddr> {
        if self.local_addr.is_none() {
            self.last_error = Some(TransportFault::NoHandleOnPort(self.port));
        }
        self.local_addr
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Port requested by the last `start`
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    /// Decode counters since the session was created
    pub fn stats(&self) -> DecodeStatsSnapshot {
        self.shared.stats.snapshot()
    }

    #[cfg(test)]
    pub(crate) fn inject_parameters(&self, params: TrackingParameters) {
        self.shared.parameters.push(params);
    }

    #[cfg(test)]
    pub(crate) fn inject_constants(&self, constants: TrackingConstants) {
        self.shared.constants.push(constants);
    }
}

impl Default for TrackingSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TrackingSession {
    fn drop(&mut self) {
        self.stop();
    }
}
