//! Error types for DrishtiIO
//!
//! Two kinds of failure exist in this crate:
//!
//! - [`Error`]: ordinary Rust errors returned from configuration loading,
//!   output serialization and binary startup.
//! - [`TransportFault`]: socket-level faults of a tracking session. These are
//!   never returned from session calls; they are recorded and surfaced through
//!   [`TrackingSession::last_error`](crate::session::TrackingSession::last_error)
//!   so the polling side can back off and retry.

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// DrishtiIO error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Config parse error: {0}")]
    Config(#[from] toml::de::Error),

    /// Configuration could not be written back out
    #[error("Config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// Output record serialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Worker thread could not be spawned
    #[error("Failed to spawn thread {name}: {source}")]
    ThreadSpawn {
        /// Thread name
        name: String,
        /// Underlying spawn error
        source: std::io::Error,
    },

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

/// Transport-level fault of a tracking session.
///
/// Faults are sticky: the session keeps reporting the last one until it is
/// explicitly cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransportFault {
    /// Socket could not be created or bound for the requested port
    #[error("Cannot create handle for UDP port {0}")]
    CannotCreateHandle(u16),

    /// An operation needed a live socket but the session holds none
    #[error("No handle found for UDP port {0}")]
    NoHandleOnPort(u16),
}

impl TransportFault {
    /// Port the fault refers to
    pub fn port(&self) -> u16 {
        match self {
            TransportFault::CannotCreateHandle(port) | TransportFault::NoHandleOnPort(port) => {
                *port
            }
        }
    }
}
