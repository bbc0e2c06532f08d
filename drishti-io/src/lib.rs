//! DrishtiIO - Camera tracking receiver
//!
//! Receives camera-tracking telemetry (position, orientation, lens data) from
//! an external tracker over UDP, decodes it, and turns it into camera frame
//! records at a controlled cadence.
//!
//! ```text
//! tracker ──UDP──► session (receiver thread) ──► queues
//!                                                  │ poll / take
//!                                                  ▼
//!                          driver ──► transform ──► FrameSink ──► publisher
//! ```
//!
//! ## Modules
//!
//! - [`protocol`]: legacy and public (binary/ASCII) wire codec
//! - [`session`]: socket receiver thread, sample queues, lifecycle
//! - [`transform`]: pure tracking sample → camera frame mapping
//! - [`driver`]: polling loop, static record emission, fault backoff
//! - [`streaming`]: downstream UDP publisher (JSON or Postcard)

pub mod config;
pub mod core;
pub mod driver;
pub mod error;
pub mod protocol;
pub mod session;
pub mod streaming;
pub mod transform;

// Re-export commonly used types
pub use config::AppConfig;
pub use driver::{FrameDriver, FrameSink};
pub use error::{Error, Result, TransportFault};
pub use session::TrackingSession;
