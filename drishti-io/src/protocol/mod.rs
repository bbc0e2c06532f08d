//! Tracker wire codec
//!
//! Decodes one UDP datagram into tracking records. Two formats are in use and
//! are sniffed per datagram; there is no handshake.
//!
//! | Format | Detection | Header | Payload |
//! |--------|-----------|--------|---------|
//! | Legacy fixed | `len == 124` and LE u32 at 0 == `0x544d4531` | none | counter + 14 LE doubles |
//! | Public binary | `len >= 8`, `"DMC01"` at 0, byte 7 == `'B'` | 8 bytes | raw struct, exact length |
//! | Public ASCII | `len >= 8`, `"DMC01"` at 0, byte 7 != `'B'` | 8 bytes | whitespace tokens |
//!
//! Public header layout:
//!
//! ```text
//! ┌───────────────────┬──────────┬───────────┬─────────────────┐
//! │ Magic "DMC01" +   │ Type     │ Subformat │ Payload         │
//! │ reserved byte 5   │ byte 6   │ byte 7    │ bytes 8..       │
//! │                   │ 'C' = constants      │ 'B' = binary    │
//! │                   │ else = parameters    │ else = ASCII    │
//! └───────────────────┴──────────┴───────────┴─────────────────┘
//! ```
//!
//! # Error Handling
//!
//! Decoding never fails with an error. Datagrams that match no format come
//! back as [`Decoded::Unrecognized`]; datagrams that match a format but can't
//! be parsed completely come back as [`Decoded::Malformed`]. Both are normal
//! traffic filtering and are dropped by the receiver. A record is either
//! decoded completely or not at all. [`DecodeStats`] counts the outcomes.

pub mod ascii;
pub mod binary;
pub mod constants;
pub mod legacy;
mod stats;

use crate::core::{TrackingConstants, TrackingParameters};
use constants::*;

pub use ascii::{encode_constants_ascii, encode_parameters_ascii};
pub use binary::{encode_constants_binary, encode_parameters_binary};
pub use legacy::encode_legacy;
pub use stats::{DecodeStats, DecodeStatsSnapshot};

/// Datagram format detected from length and magic bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatagramFormat {
    /// 124-byte fixed layout
    Legacy,
    /// Public format, binary struct payload
    PublicBinary,
    /// Public format, ASCII token payload
    PublicAscii,
    /// Not tracker traffic
    Unknown,
}

/// Why a recognized datagram was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedKind {
    /// Binary payload length does not match the struct size
    BinaryLength { expected: usize, actual: usize },
    /// ASCII payload ran out of tokens or a token did not parse
    AsciiTokens,
}

/// Result of decoding one datagram
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Parameters(TrackingParameters),
    Constants(TrackingConstants),
    /// Legacy datagrams carry the chip size along with the parameters
    Both(TrackingParameters, TrackingConstants),
    Malformed(MalformedKind),
    Unrecognized,
}

impl Decoded {
    /// True if the datagram yielded at least one record
    pub fn is_record(&self) -> bool {
        matches!(
            self,
            Decoded::Parameters(_) | Decoded::Constants(_) | Decoded::Both(_, _)
        )
    }
}

/// Detect the format of a datagram
pub fn sniff(buf: &[u8]) -> DatagramFormat {
    if buf.len() == LEGACY_DATAGRAM_SIZE && read_u32(buf, 0) == LEGACY_MAGIC {
        return DatagramFormat::Legacy;
    }

    if buf.len() >= PUBLIC_HEADER_SIZE && buf[..PUBLIC_MAGIC.len()] == PUBLIC_MAGIC[..] {
        return if buf[PUBLIC_OFFSET_SUBFORMAT] == SUBFORMAT_BINARY {
            DatagramFormat::PublicBinary
        } else {
            DatagramFormat::PublicAscii
        };
    }

    DatagramFormat::Unknown
}

/// Decode one datagram
pub fn decode(buf: &[u8]) -> Decoded {
    match sniff(buf) {
        DatagramFormat::Legacy => {
            let (params, constants) = legacy::decode_legacy(buf);
            Decoded::Both(params, constants)
        }
        DatagramFormat::PublicBinary => {
            let payload = &buf[PUBLIC_HEADER_SIZE..];
            if is_constants(buf) {
                binary::decode_constants(payload).map_or_else(
                    || {
                        Decoded::Malformed(MalformedKind::BinaryLength {
                            expected: CONSTANTS_STRUCT_SIZE,
                            actual: payload.len(),
                        })
                    },
                    Decoded::Constants,
                )
            } else {
                binary::decode_parameters(payload).map_or_else(
                    || {
                        Decoded::Malformed(MalformedKind::BinaryLength {
                            expected: PARAMS_STRUCT_SIZE,
                            actual: payload.len(),
                        })
                    },
                    Decoded::Parameters,
                )
            }
        }
        DatagramFormat::PublicAscii => {
            let payload = &buf[PUBLIC_HEADER_SIZE..];
            let decoded = if is_constants(buf) {
                ascii::decode_constants(payload).map(Decoded::Constants)
            } else {
                ascii::decode_parameters(payload).map(Decoded::Parameters)
            };
            decoded.unwrap_or(Decoded::Malformed(MalformedKind::AsciiTokens))
        }
        DatagramFormat::Unknown => Decoded::Unrecognized,
    }
}

#[inline]
fn is_constants(buf: &[u8]) -> bool {
    buf[PUBLIC_OFFSET_TYPE] == TYPE_CONSTANTS
}

/// Write the public header for the given type and subformat tags
pub(crate) fn write_public_header(out: &mut Vec<u8>, type_tag: u8, subformat: u8) {
    out.extend_from_slice(PUBLIC_MAGIC);
    out.push(PUBLIC_RESERVED_BYTE);
    out.push(type_tag);
    out.push(subformat);
}

// ============================================================================
// Little-endian field access
//
// Callers validate the buffer length before reading, so offsets are in range.
// ============================================================================

#[inline]
pub(crate) fn read_u32(buf: &[u8], offset: usize) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&buf[offset..offset + 4]);
    u32::from_le_bytes(bytes)
}

#[inline]
pub(crate) fn read_i32(buf: &[u8], offset: usize) -> i32 {
    read_u32(buf, offset) as i32
}

#[inline]
pub(crate) fn read_f64(buf: &[u8], offset: usize) -> f64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[offset..offset + 8]);
    f64::from_le_bytes(bytes)
}

#[inline]
pub(crate) fn write_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

#[inline]
pub(crate) fn write_i32(buf: &mut [u8], offset: usize, value: i32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

#[inline]
pub(crate) fn write_f64(buf: &mut [u8], offset: usize, value: f64) {
    buf[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
}
