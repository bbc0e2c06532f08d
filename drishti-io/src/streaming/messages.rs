//! Output message types
//!
//! One message per published datagram. Static records always precede the
//! frames they describe.

use serde::{Deserialize, Serialize};

use crate::core::{CameraFrameRecord, CameraStaticRecord};

/// Downstream message
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum OutputMessage {
    /// Sensor size announcement (first frame and on change)
    Static(CameraStaticRecord),
    /// One camera frame
    Frame(CameraFrameRecord),
}

impl OutputMessage {
    /// Short name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            OutputMessage::Static(_) => "static",
            OutputMessage::Frame(_) => "frame",
        }
    }
}
