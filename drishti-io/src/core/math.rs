//! Rigid transform helpers for tracker pose matrices.
//!
//! Matrices use the row-vector convention `m[row][column]`: a point `p`
//! transforms as `p' = p * M`, rows 0..2 are the rotated X/Y/Z axes and row 3
//! is the translation. All angles are in degrees.
//!
//! Rotation order is yaw about Z, then pitch about Y, then roll about X.

use super::types::Rotation;

/// Apply `m` to the origin, i.e. read its translation row.
///
/// # Example
/// ```
/// use drishti_io::core::math::transform_origin;
///
/// let mut m = drishti_io::core::IDENTITY;
/// m[3] = [1.0, 2.0, 3.0, 1.0];
/// assert_eq!(transform_origin(&m), [1.0, 2.0, 3.0]);
/// ```
#[inline]
pub fn transform_origin(m: &[[f64; 4]; 4]) -> [f64; 3] {
    [m[3][0], m[3][1], m[3][2]]
}

/// Build a rotation matrix from yaw/pitch/roll (degrees).
pub fn rotation_matrix(rotation: Rotation) -> [[f64; 4]; 4] {
    let (sp, cp) = rotation.pitch.to_radians().sin_cos();
    let (sy, cy) = rotation.yaw.to_radians().sin_cos();
    let (sr, cr) = rotation.roll.to_radians().sin_cos();

    [
        [cp * cy, cp * sy, sp, 0.0],
        [sr * sp * cy - cr * sy, sr * sp * sy + cr * cy, -sr * cp, 0.0],
        [-(cr * sp * cy + sr * sy), cy * sr - cr * sp * sy, cr * cp, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]
}

/// Decompose the rotation part of `m` into yaw/pitch/roll (degrees).
///
/// Inverse of [`rotation_matrix`] for pitch in (-90°, 90°). Axis scale is
/// ignored, so matrices with uniform scale decompose to the same angles.
pub fn matrix_to_rotation(m: &[[f64; 4]; 4]) -> Rotation {
    let x_axis = [m[0][0], m[0][1], m[0][2]];
    let y_axis = [m[1][0], m[1][1], m[1][2]];
    let z_axis = [m[2][0], m[2][1], m[2][2]];

    let pitch = x_axis[2]
        .atan2((x_axis[0] * x_axis[0] + x_axis[1] * x_axis[1]).sqrt())
        .to_degrees();
    let yaw = x_axis[1].atan2(x_axis[0]).to_degrees();

    // Y axis of the same yaw/pitch with zero roll
    let (sy, cy) = yaw.to_radians().sin_cos();
    let sy_axis = [-sy, cy, 0.0];
    let roll = dot(&z_axis, &sy_axis)
        .atan2(dot(&y_axis, &sy_axis))
        .to_degrees();

    Rotation { yaw, pitch, roll }
}

#[inline]
fn dot(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::IDENTITY;
    use approx::assert_relative_eq;

    #[test]
    fn test_identity_decomposes_to_zero() {
        let rotation = matrix_to_rotation(&IDENTITY);
        assert_relative_eq!(rotation.yaw, 0.0);
        assert_relative_eq!(rotation.pitch, 0.0);
        assert_relative_eq!(rotation.roll, 0.0);
    }

    #[test]
    fn test_rotation_roundtrip() {
        let cases = [
            (30.0, 10.0, -5.0),
            (-120.0, 45.0, 60.0),
            (179.0, -80.0, 170.0),
            (0.0, 0.0, 90.0),
        ];

        for (yaw, pitch, roll) in cases {
            let m = rotation_matrix(Rotation { yaw, pitch, roll });
            let back = matrix_to_rotation(&m);
            assert_relative_eq!(back.yaw, yaw, epsilon = 1e-9);
            assert_relative_eq!(back.pitch, pitch, epsilon = 1e-9);
            assert_relative_eq!(back.roll, roll, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_pure_yaw_rotates_x_axis() {
        let m = rotation_matrix(Rotation {
            yaw: 90.0,
            pitch: 0.0,
            roll: 0.0,
        });
        // X axis now points along +Y
        assert_relative_eq!(m[0][0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(m[0][1], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_scaled_axes_ignored() {
        let mut m = rotation_matrix(Rotation {
            yaw: 20.0,
            pitch: -15.0,
            roll: 40.0,
        });
        for row in m.iter_mut().take(3) {
            for v in row.iter_mut().take(3) {
                *v *= 2.5;
            }
        }
        let back = matrix_to_rotation(&m);
        assert_relative_eq!(back.yaw, 20.0, epsilon = 1e-9);
        assert_relative_eq!(back.pitch, -15.0, epsilon = 1e-9);
        assert_relative_eq!(back.roll, 40.0, epsilon = 1e-9);
    }
}
