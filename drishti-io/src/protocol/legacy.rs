//! Legacy fixed-layout datagram (124 bytes)
//!
//! ```text
//! offset  size  field
//!      0     4  magic 0x544d4531 (LE)
//!      4     4  unused
//!      8     4  counter (u32 LE)
//!     12   8×14 x, y, z, pan, tilt, roll, fov, center_x, center_y,
//!               k1, k2, focus_distance, chip_width, chip_height (f64 LE)
//! ```
//!
//! The pose is always Euler. The chip size rides along in the same datagram,
//! so one legacy datagram yields both a parameters and a constants record.

use super::constants::{LEGACY_DATAGRAM_SIZE, LEGACY_MAGIC, LEGACY_OFFSET_COUNTER, LEGACY_OFFSET_DOUBLES};
use super::{read_f64, read_u32, write_f64, write_u32};
use crate::core::math::{matrix_to_rotation, transform_origin};
use crate::core::{
    EulerPose, FormatFlags, Pose, TrackingConstants, TrackingParameters,
};

/// Field order of the double block
const FIELD_COUNT: usize = 14;

/// Decode a legacy datagram.
///
/// The caller has checked the length and magic (see [`super::sniff`]).
pub(super) fn decode_legacy(buf: &[u8]) -> (TrackingParameters, TrackingConstants) {
    debug_assert_eq!(buf.len(), LEGACY_DATAGRAM_SIZE);

    let mut fields = [0.0f64; FIELD_COUNT];
    for (i, field) in fields.iter_mut().enumerate() {
        *field = read_f64(buf, LEGACY_OFFSET_DOUBLES + i * 8);
    }
    let [x, y, z, pan, tilt, roll, fov, center_x, center_y, k1, k2, focus_distance, chip_width, chip_height] =
        fields;

    let mut params = TrackingParameters::new(
        FormatFlags::empty(),
        Pose::Euler(EulerPose {
            x,
            y,
            z,
            pan,
            tilt,
            roll,
        }),
    );
    params.counter = read_u32(buf, LEGACY_OFFSET_COUNTER);
    params.fov = fov;
    params.center_x = center_x;
    params.center_y = center_y;
    params.k1 = k1;
    params.k2 = k2;
    params.focus_distance = focus_distance;

    let constants = TrackingConstants {
        chip_width,
        chip_height,
        ..TrackingConstants::default()
    };

    (params, constants)
}

/// Encode a legacy datagram.
///
/// Matrix poses are converted to Euler first since the legacy layout has no
/// room for a matrix. Fields the layout lacks (id, format, aperture, image
/// size, blanking) are not transmitted.
pub fn encode_legacy(params: &TrackingParameters, constants: &TrackingConstants) -> Vec<u8> {
    let euler = match *params.pose() {
        Pose::Euler(e) => e,
        Pose::Matrix(m) => {
            let [x, y, z] = transform_origin(&m);
            let rotation = matrix_to_rotation(&m);
            EulerPose {
                x,
                y,
                z,
                pan: rotation.yaw,
                tilt: rotation.pitch,
                roll: rotation.roll,
            }
        }
    };

    let fields: [f64; FIELD_COUNT] = [
        euler.x,
        euler.y,
        euler.z,
        euler.pan,
        euler.tilt,
        euler.roll,
        params.fov,
        params.center_x,
        params.center_y,
        params.k1,
        params.k2,
        params.focus_distance,
        constants.chip_width,
        constants.chip_height,
    ];

    let mut buf = vec![0u8; LEGACY_DATAGRAM_SIZE];
    write_u32(&mut buf, 0, LEGACY_MAGIC);
    write_u32(&mut buf, LEGACY_OFFSET_COUNTER, params.counter);
    for (i, value) in fields.iter().enumerate() {
        write_f64(&mut buf, LEGACY_OFFSET_DOUBLES + i * 8, *value);
    }
    buf
}
