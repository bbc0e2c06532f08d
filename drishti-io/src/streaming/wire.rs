//! Wire format serialization for the downstream publisher
//!
//! Every published datagram carries exactly one length-prefixed message:
//!
//! ```text
//! ┌──────────────────┬──────────────────────────┐
//! │ Length (4 bytes) │ Payload (variable)       │
//! │ Big-endian u32   │ JSON or Postcard binary  │
//! └──────────────────┴──────────────────────────┘
//! ```
//!
//! ## Wire Formats
//!
//! ### JSON (Default)
//! Human-readable; use for development and cross-language consumers.
//!
//! ### Postcard (Binary)
//! Compact; a frame is well under 200 bytes.
//!
//! ## Error Handling
//!
//! - **Serialization failure**: message skipped, error logged by the caller
//! - **Short or inconsistent length prefix**: [`Error::Serialization`]

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::streaming::messages::OutputMessage;

/// Length prefix size in bytes
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Supported wire formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireFormat {
    /// Binary format using postcard - fast and compact
    Postcard,
    /// JSON format - human-readable for debugging
    #[default]
    Json,
}

/// Serializer that can handle both formats
#[derive(Debug, Clone)]
pub struct Serializer {
    format: WireFormat,
}

impl Serializer {
    /// Create a new serializer for the given format
    pub fn new(format: WireFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> WireFormat {
        self.format
    }

    /// Serialize a message to bytes
    pub fn serialize(&self, msg: &OutputMessage) -> Result<Vec<u8>> {
        match self.format {
            WireFormat::Postcard => {
                postcard::to_allocvec(msg).map_err(|e| Error::Serialization(e.to_string()))
            }
            WireFormat::Json => {
                serde_json::to_vec(msg).map_err(|e| Error::Serialization(e.to_string()))
            }
        }
    }

    /// Deserialize bytes to a message
    pub fn deserialize(&self, bytes: &[u8]) -> Result<OutputMessage> {
        match self.format {
            WireFormat::Postcard => {
                postcard::from_bytes(bytes).map_err(|e| Error::Serialization(e.to_string()))
            }
            WireFormat::Json => {
                serde_json::from_slice(bytes).map_err(|e| Error::Serialization(e.to_string()))
            }
        }
    }

    /// Serialize into `out` behind a big-endian length prefix.
    ///
    /// `out` is cleared first so a send buffer can be reused.
    pub fn encode_framed(&self, msg: &OutputMessage, out: &mut Vec<u8>) -> Result<()> {
        let payload = self.serialize(msg)?;
        let len = u32::try_from(payload.len())
            .map_err(|_| Error::Serialization(format!("payload too large: {}", payload.len())))?;

        out.clear();
        out.extend_from_slice(&len.to_be_bytes());
        out.extend_from_slice(&payload);
        Ok(())
    }

    /// Parse one length-prefixed datagram
    pub fn decode_framed(&self, datagram: &[u8]) -> Result<OutputMessage> {
        let Some((prefix, payload)) = datagram.split_first_chunk::<LENGTH_PREFIX_SIZE>() else {
            return Err(Error::Serialization(format!(
                "datagram too short: {} bytes",
                datagram.len()
            )));
        };

        let len = u32::from_be_bytes(*prefix) as usize;
        if len != payload.len() {
            return Err(Error::Serialization(format!(
                "length prefix {} does not match payload {}",
                len,
                payload.len()
            )));
        }

        self.deserialize(payload)
    }
}

/// Create a serializer for the given wire format
pub fn create_serializer(format: WireFormat) -> Serializer {
    Serializer::new(format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CameraFrameRecord, CameraStaticRecord, FrameRate, QualifiedFrameTime};

    fn sample_frame() -> CameraFrameRecord {
        CameraFrameRecord {
            position: [-100.0, 250.0, 170.0],
            focal_length: 35.0,
            focus_distance: 300.0,
            aperture: 2.8,
            sensor_width: 9.6,
            sensor_height: 5.4,
            scene_time: QualifiedFrameTime {
                frame: 1234,
                rate: FrameRate::new(25, 1),
            },
            ..CameraFrameRecord::default()
        }
    }

    #[test]
    fn test_framed_messages_in_both_formats() {
        let messages = [
            OutputMessage::Static(CameraStaticRecord::from_frame(&sample_frame())),
            OutputMessage::Frame(sample_frame()),
        ];

        for format in [WireFormat::Json, WireFormat::Postcard] {
            let serializer = create_serializer(format);
            let mut buf = Vec::new();
            for msg in &messages {
                serializer.encode_framed(msg, &mut buf).unwrap();
                let len = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
                assert_eq!(len, buf.len() - LENGTH_PREFIX_SIZE);
                assert_eq!(&serializer.decode_framed(&buf).unwrap(), msg);
            }
        }
    }

    #[test]
    fn test_json_is_readable() {
        let serializer = Serializer::new(WireFormat::Json);
        let bytes = serializer
            .serialize(&OutputMessage::Frame(sample_frame()))
            .unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("{\"Frame\""));
        assert!(text.contains("\"focal_length\":35.0"));
    }

    #[test]
    fn test_bad_prefix_rejected() {
        let serializer = Serializer::new(WireFormat::Postcard);
        assert!(serializer.decode_framed(&[0, 0]).is_err());

        let mut buf = Vec::new();
        serializer
            .encode_framed(&OutputMessage::Frame(sample_frame()), &mut buf)
            .unwrap();
        buf.push(0);
        assert!(serializer.decode_framed(&buf).is_err());
    }
}
