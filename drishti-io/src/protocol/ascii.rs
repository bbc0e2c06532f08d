//! Public ASCII sub-format
//!
//! Whitespace-delimited tokens parsed positionally after the 8-byte header.
//!
//! Constants (10 tokens):
//!
//! ```text
//! image_width image_height blank_left blank_right blank_top blank_bottom
//! chip_width chip_height fake_chip_width fake_chip_height
//! ```
//!
//! Parameters:
//!
//! ```text
//! [I<id>] <format hex> <pose> fov center_x center_y k1 k2 focus_distance aperture counter
//!
//! pose (Euler bit set):   x y z pan tilt roll
//! pose (Euler bit clear): m00 m01 m02 m03  m10 m11 m12 m13  m20 m21 m22 m23
//! ```
//!
//! The id token is only read when the first payload byte is `'I'`. Matrix
//! rows 0..2 arrive with four columns, but column 3 is forced to 0 and the
//! homogeneous row 3 to `[0, 0, 0, 1]` whatever the stream says.
//!
//! Text ends at the first NUL byte, so C strings sent with their terminator
//! decode like any other payload. A missing or unparsable token rejects the
//! whole record.

use std::fmt::Write as _;

use super::constants::{
    ASCII_ID_MARKER, SUBFORMAT_ASCII, TYPE_CONSTANTS, TYPE_PARAMETERS,
};
use super::write_public_header;
use crate::core::{EulerPose, FormatFlags, IDENTITY, Pose, TrackingConstants, TrackingParameters};

/// Positional token reader over one payload
struct Tokens<'a> {
    tokens: Vec<&'a str>,
    pos: usize,
}

impl<'a> Tokens<'a> {
    /// Split on ASCII whitespace up to the first NUL; `None` for non-UTF-8 text
    fn new(payload: &'a [u8]) -> Option<Self> {
        let end = payload.iter().position(|&b| b == 0).unwrap_or(payload.len());
        let text = std::str::from_utf8(&payload[..end]).ok()?;
        Some(Self {
            tokens: text.split_ascii_whitespace().collect(),
            pos: 0,
        })
    }

    fn next_str(&mut self) -> Option<&'a str> {
        let token = self.tokens.get(self.pos).copied()?;
        self.pos += 1;
        Some(token)
    }

    fn next_f64(&mut self) -> Option<f64> {
        self.next_str()?.parse().ok()
    }

    fn next_i32(&mut self) -> Option<i32> {
        self.next_str()?.parse().ok()
    }

    fn next_u32(&mut self) -> Option<u32> {
        self.next_str()?.parse().ok()
    }

    /// Hexadecimal u32 with optional `0x`/`0X` prefix
    fn next_hex_u32(&mut self) -> Option<u32> {
        let token = self.next_str()?;
        let digits = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
            .unwrap_or(token);
        u32::from_str_radix(digits, 16).ok()
    }

    /// Id token: `I<id>` or a bare `I` followed by the id
    fn next_id(&mut self) -> Option<u32> {
        let token = self.next_str()?;
        let digits = token.strip_prefix(ASCII_ID_MARKER as char)?;
        if digits.is_empty() {
            self.next_u32()
        } else {
            digits.parse().ok()
        }
    }
}

/// Decode a constants payload (header already stripped)
pub(super) fn decode_constants(payload: &[u8]) -> Option<TrackingConstants> {
    let mut t = Tokens::new(payload)?;

    Some(TrackingConstants {
        id: 0,
        image_width: t.next_i32()?,
        image_height: t.next_i32()?,
        blank_left: t.next_i32()?,
        blank_right: t.next_i32()?,
        blank_top: t.next_i32()?,
        blank_bottom: t.next_i32()?,
        chip_width: t.next_f64()?,
        chip_height: t.next_f64()?,
        fake_chip_width: t.next_f64()?,
        fake_chip_height: t.next_f64()?,
    })
}

/// Decode a parameters payload (header already stripped)
pub(super) fn decode_parameters(payload: &[u8]) -> Option<TrackingParameters> {
    let mut t = Tokens::new(payload)?;

    let id = if payload.first() == Some(&ASCII_ID_MARKER) {
        t.next_id()?
    } else {
        0
    };

    let format = FormatFlags::from_bits(t.next_hex_u32()?);
    let pose = if format.contains(FormatFlags::EULER) {
        Pose::Euler(EulerPose {
            x: t.next_f64()?,
            y: t.next_f64()?,
            z: t.next_f64()?,
            pan: t.next_f64()?,
            tilt: t.next_f64()?,
            roll: t.next_f64()?,
        })
    } else {
        let mut m = IDENTITY;
        for row in m.iter_mut().take(3) {
            for value in row.iter_mut() {
                *value = t.next_f64()?;
            }
            row[3] = 0.0;
        }
        m[3][3] = 1.0;
        Pose::Matrix(m)
    };

    let mut params = TrackingParameters::new(format, pose);
    params.id = id;
    params.fov = t.next_f64()?;
    params.center_x = t.next_f64()?;
    params.center_y = t.next_f64()?;
    params.k1 = t.next_f64()?;
    params.k2 = t.next_f64()?;
    params.focus_distance = t.next_f64()?;
    params.aperture = t.next_f64()?;
    params.counter = t.next_u32()?;
    Some(params)
}

/// Encode a constants record as a complete public ASCII datagram
pub fn encode_constants_ascii(constants: &TrackingConstants) -> Vec<u8> {
    let text = format!(
        "{} {} {} {} {} {} {} {} {} {}",
        constants.image_width,
        constants.image_height,
        constants.blank_left,
        constants.blank_right,
        constants.blank_top,
        constants.blank_bottom,
        constants.chip_width,
        constants.chip_height,
        constants.fake_chip_width,
        constants.fake_chip_height,
    );

    let mut out = Vec::with_capacity(8 + text.len());
    write_public_header(&mut out, TYPE_CONSTANTS, SUBFORMAT_ASCII);
    out.extend_from_slice(text.as_bytes());
    out
}

/// Encode a parameters record as a complete public ASCII datagram.
///
/// The id token is only emitted for a non-zero id.
pub fn encode_parameters_ascii(params: &TrackingParameters) -> Vec<u8> {
    let mut text = String::with_capacity(256);

    if params.id != 0 {
        let _ = write!(text, "I{} ", params.id);
    }
    let _ = write!(text, "{:x}", params.format().bits());

    match params.pose() {
        Pose::Euler(e) => {
            for value in [e.x, e.y, e.z, e.pan, e.tilt, e.roll] {
                let _ = write!(text, " {}", value);
            }
        }
        Pose::Matrix(m) => {
            for row in m.iter().take(3) {
                for value in row {
                    let _ = write!(text, " {}", value);
                }
            }
        }
    }

    let _ = write!(
        text,
        " {} {} {} {} {} {} {} {}",
        params.fov,
        params.center_x,
        params.center_y,
        params.k1,
        params.k2,
        params.focus_distance,
        params.aperture,
        params.counter,
    );

    let mut out = Vec::with_capacity(8 + text.len());
    write_public_header(&mut out, TYPE_PARAMETERS, SUBFORMAT_ASCII);
    out.extend_from_slice(text.as_bytes());
    out
}
