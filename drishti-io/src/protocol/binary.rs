//! Public binary sub-format
//!
//! The payload is the tracker's in-memory struct, little-endian with natural
//! alignment. Lengths must match exactly; anything else is dropped.
//!
//! Constants (64 bytes):
//!
//! ```text
//!  0 id u32 │ 4 image_width i32 │ 8 image_height i32 │ 12..28 blank l/r/t/b i32
//! 28 pad    │ 32 chip_width f64 │ 40 chip_height f64 │ 48 fake_chip_width f64
//! 56 fake_chip_height f64
//! ```
//!
//! Parameters (200 bytes):
//!
//! ```text
//!   0 id u32 │ 4 format u32 │ 8..136 transform 16 × f64
//! 136 fov    │ 144 center_x │ 152 center_y │ 160 k1 │ 168 k2
//! 176 focus_distance │ 184 aperture │ 192 counter u32 │ 196 pad
//! ```
//!
//! The transform block is a union on the tracker side: Euler poses occupy the
//! first six doubles (x, y, z, pan, tilt, roll), matrices all sixteen.

use super::constants::*;
use super::{read_f64, read_i32, read_u32, write_f64, write_i32, write_public_header, write_u32};
use crate::core::{EulerPose, FormatFlags, Pose, TrackingConstants, TrackingParameters};

/// Decode a constants payload (header already stripped)
pub(super) fn decode_constants(payload: &[u8]) -> Option<TrackingConstants> {
    if payload.len() != CONSTANTS_STRUCT_SIZE {
        return None;
    }

    Some(TrackingConstants {
        id: read_u32(payload, CONST_OFFSET_ID),
        image_width: read_i32(payload, CONST_OFFSET_IMAGE_WIDTH),
        image_height: read_i32(payload, CONST_OFFSET_IMAGE_HEIGHT),
        blank_left: read_i32(payload, CONST_OFFSET_BLANK_LEFT),
        blank_right: read_i32(payload, CONST_OFFSET_BLANK_RIGHT),
        blank_top: read_i32(payload, CONST_OFFSET_BLANK_TOP),
        blank_bottom: read_i32(payload, CONST_OFFSET_BLANK_BOTTOM),
        chip_width: read_f64(payload, CONST_OFFSET_CHIP_WIDTH),
        chip_height: read_f64(payload, CONST_OFFSET_CHIP_HEIGHT),
        fake_chip_width: read_f64(payload, CONST_OFFSET_FAKE_CHIP_WIDTH),
        fake_chip_height: read_f64(payload, CONST_OFFSET_FAKE_CHIP_HEIGHT),
    })
}

/// Decode a parameters payload (header already stripped)
pub(super) fn decode_parameters(payload: &[u8]) -> Option<TrackingParameters> {
    if payload.len() != PARAMS_STRUCT_SIZE {
        return None;
    }

    let format = FormatFlags::from_bits(read_u32(payload, PARAM_OFFSET_FORMAT));
    let pose = if format.contains(FormatFlags::EULER) {
        let t = |i: usize| read_f64(payload, PARAM_OFFSET_TRANSFORM + i * 8);
        Pose::Euler(EulerPose {
            x: t(0),
            y: t(1),
            z: t(2),
            pan: t(3),
            tilt: t(4),
            roll: t(5),
        })
    } else {
        let mut m = [[0.0f64; 4]; 4];
        for (row, values) in m.iter_mut().enumerate() {
            for (col, value) in values.iter_mut().enumerate() {
                *value = read_f64(payload, PARAM_OFFSET_TRANSFORM + (row * 4 + col) * 8);
            }
        }
        Pose::Matrix(m)
    };

    let mut params = TrackingParameters::new(format, pose);
    params.id = read_u32(payload, PARAM_OFFSET_ID);
    params.fov = read_f64(payload, PARAM_OFFSET_FOV);
    params.center_x = read_f64(payload, PARAM_OFFSET_CENTER_X);
    params.center_y = read_f64(payload, PARAM_OFFSET_CENTER_Y);
    params.k1 = read_f64(payload, PARAM_OFFSET_K1);
    params.k2 = read_f64(payload, PARAM_OFFSET_K2);
    params.focus_distance = read_f64(payload, PARAM_OFFSET_FOCUS_DISTANCE);
    params.aperture = read_f64(payload, PARAM_OFFSET_APERTURE);
    params.counter = read_u32(payload, PARAM_OFFSET_COUNTER);
    Some(params)
}

/// Encode a constants record as a complete public binary datagram
pub fn encode_constants_binary(constants: &TrackingConstants) -> Vec<u8> {
    let mut payload = [0u8; CONSTANTS_STRUCT_SIZE];
    write_u32(&mut payload, CONST_OFFSET_ID, constants.id);
    write_i32(&mut payload, CONST_OFFSET_IMAGE_WIDTH, constants.image_width);
    write_i32(&mut payload, CONST_OFFSET_IMAGE_HEIGHT, constants.image_height);
    write_i32(&mut payload, CONST_OFFSET_BLANK_LEFT, constants.blank_left);
    write_i32(&mut payload, CONST_OFFSET_BLANK_RIGHT, constants.blank_right);
    write_i32(&mut payload, CONST_OFFSET_BLANK_TOP, constants.blank_top);
    write_i32(&mut payload, CONST_OFFSET_BLANK_BOTTOM, constants.blank_bottom);
    write_f64(&mut payload, CONST_OFFSET_CHIP_WIDTH, constants.chip_width);
    write_f64(&mut payload, CONST_OFFSET_CHIP_HEIGHT, constants.chip_height);
    write_f64(&mut payload, CONST_OFFSET_FAKE_CHIP_WIDTH, constants.fake_chip_width);
    write_f64(&mut payload, CONST_OFFSET_FAKE_CHIP_HEIGHT, constants.fake_chip_height);

    let mut out = Vec::with_capacity(PUBLIC_HEADER_SIZE + CONSTANTS_STRUCT_SIZE);
    write_public_header(&mut out, TYPE_CONSTANTS, SUBFORMAT_BINARY);
    out.extend_from_slice(&payload);
    out
}

/// Encode a parameters record as a complete public binary datagram
pub fn encode_parameters_binary(params: &TrackingParameters) -> Vec<u8> {
    let mut payload = [0u8; PARAMS_STRUCT_SIZE];
    write_u32(&mut payload, PARAM_OFFSET_ID, params.id);
    write_u32(&mut payload, PARAM_OFFSET_FORMAT, params.format().bits());

    match params.pose() {
        Pose::Euler(e) => {
            for (i, value) in [e.x, e.y, e.z, e.pan, e.tilt, e.roll].iter().enumerate() {
                write_f64(&mut payload, PARAM_OFFSET_TRANSFORM + i * 8, *value);
            }
        }
        Pose::Matrix(m) => {
            for (row, values) in m.iter().enumerate() {
                for (col, value) in values.iter().enumerate() {
                    write_f64(&mut payload, PARAM_OFFSET_TRANSFORM + (row * 4 + col) * 8, *value);
                }
            }
        }
    }

    write_f64(&mut payload, PARAM_OFFSET_FOV, params.fov);
    write_f64(&mut payload, PARAM_OFFSET_CENTER_X, params.center_x);
    write_f64(&mut payload, PARAM_OFFSET_CENTER_Y, params.center_y);
    write_f64(&mut payload, PARAM_OFFSET_K1, params.k1);
    write_f64(&mut payload, PARAM_OFFSET_K2, params.k2);
    write_f64(&mut payload, PARAM_OFFSET_FOCUS_DISTANCE, params.focus_distance);
    write_f64(&mut payload, PARAM_OFFSET_APERTURE, params.aperture);
    write_u32(&mut payload, PARAM_OFFSET_COUNTER, params.counter);

    let mut out = Vec::with_capacity(PUBLIC_HEADER_SIZE + PARAMS_STRUCT_SIZE);
    write_public_header(&mut out, TYPE_PARAMETERS, SUBFORMAT_BINARY);
    out.extend_from_slice(&payload);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Decoded, MalformedKind, decode};

    fn sample_constants() -> TrackingConstants {
        TrackingConstants {
            id: 7,
            image_width: 3840,
            image_height: 2160,
            blank_left: 4,
            blank_right: 5,
            blank_top: 6,
            blank_bottom: 7,
            chip_width: 23.76,
            chip_height: 13.365,
            fake_chip_width: 24.0,
            fake_chip_height: 13.5,
        }
    }

    #[test]
    fn test_constants_roundtrip_bit_identical() {
        let constants = sample_constants();
        let datagram = encode_constants_binary(&constants);
        assert_eq!(datagram.len(), PUBLIC_HEADER_SIZE + CONSTANTS_STRUCT_SIZE);

        let Decoded::Constants(decoded) = decode(&datagram) else {
            panic!("expected constants");
        };
        assert_eq!(decoded, constants);
        assert_eq!(decoded.chip_width.to_bits(), constants.chip_width.to_bits());
        assert_eq!(
            decoded.fake_chip_height.to_bits(),
            constants.fake_chip_height.to_bits()
        );
        // Re-encoding the decoded record reproduces the datagram byte for byte
        assert_eq!(encode_constants_binary(&decoded), datagram);
    }

    #[test]
    fn test_parameters_roundtrip_both_pose_forms() {
        let mut euler = TrackingParameters::new(
            FormatFlags::FIELD_OF_VIEW | FormatFlags::VERTICAL,
            Pose::Euler(EulerPose {
                x: 0.1,
                y: 0.2,
                z: 1.7,
                pan: 12.0,
                tilt: -3.0,
                roll: 0.5,
            }),
        );
        euler.id = 3;
        euler.fov = 41.5;
        euler.aperture = 2.8;
        euler.counter = 1000;

        let mut m = crate::core::IDENTITY;
        m[3] = [1.0, 2.0, 3.0, 1.0];
        let mut matrix = TrackingParameters::new(FormatFlags::empty(), Pose::Matrix(m));
        matrix.k1 = 0.01;
        matrix.counter = 1001;

        for params in [euler, matrix] {
            let Decoded::Parameters(decoded) = decode(&encode_parameters_binary(&params)) else {
                panic!("expected parameters");
            };
            assert_eq!(decoded, params);
        }
    }

    #[test]
    fn test_wrong_length_dropped_for_both_struct_sizes() {
        let constants = encode_constants_binary(&sample_constants());
        let params = encode_parameters_binary(&TrackingParameters::default());

        for datagram in [constants, params] {
            for len in [datagram.len() - 1, datagram.len() + 1, PUBLIC_HEADER_SIZE] {
                let mut resized = datagram.clone();
                resized.resize(len, 0);
                let decoded = decode(&resized);
                assert!(
                    matches!(
                        decoded,
                        Decoded::Malformed(MalformedKind::BinaryLength { .. })
                    ),
                    "len {} decoded to {:?}",
                    len,
                    decoded
                );
            }
        }
    }

    #[test]
    fn test_constants_struct_offsets() {
        let datagram = encode_constants_binary(&sample_constants());
        let payload = &datagram[PUBLIC_HEADER_SIZE..];
        assert_eq!(&payload[4..8], &3840i32.to_le_bytes());
        assert_eq!(&payload[28..32], &[0u8; 4]);
        assert_eq!(&payload[32..40], &23.76f64.to_le_bytes());
        assert_eq!(&payload[56..64], &13.5f64.to_le_bytes());
    }
}
