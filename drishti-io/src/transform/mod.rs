//! Frame transform
//!
//! Pure mapping from one tracking sample plus the cached constants to an
//! output camera frame:
//!
//! ```text
//! TrackingParameters ─┐
//!                     ├─► pose ─► convention ─► position / rotation
//! TrackingConstants ──┤
//!                     └─► sensor size ─► focal length (FOV bit)
//! FrameRate ──────────────► scene time (counter @ rate)
//! ```
//!
//! No state is kept between calls; the same inputs always give the same frame.

mod convention;

pub use convention::CoordinateConvention;

use serde::{Deserialize, Serialize};

use crate::core::math::{matrix_to_rotation, transform_origin};
use crate::core::{
    CameraFrameRecord, FormatFlags, FrameRate, Pose, QualifiedFrameTime, Rotation,
    TrackingConstants, TrackingParameters,
};

/// Tracker units to output units (metres to centimetres)
pub const DEFAULT_SCALE: f64 = 100.0;

/// Which constants fields give the sensor size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorSource {
    /// Physical chip size
    #[default]
    Chip,
    /// Advertised (fake) chip size
    FakeChip,
}

/// Transform policy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    pub convention: CoordinateConvention,
    /// Multiplier applied to position and focus distance
    pub scale: f64,
    pub sensor_source: SensorSource,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            convention: CoordinateConvention::default(),
            scale: DEFAULT_SCALE,
            sensor_source: SensorSource::default(),
        }
    }
}

/// Build the output frame for one sample
pub fn frame_from_tracking(
    params: &TrackingParameters,
    constants: &TrackingConstants,
    frame_rate: FrameRate,
    config: &TransformConfig,
) -> CameraFrameRecord {
    let (position, rotation) = resolve_pose(params.pose());
    let (sensor_width, sensor_height) = sensor_size(constants, config.sensor_source);

    CameraFrameRecord {
        position: config
            .convention
            .position(position, config.scale, params.format()),
        rotation: config.convention.rotation(rotation),
        focal_length: focal_length(params, sensor_width, sensor_height),
        focus_distance: params.focus_distance * config.scale,
        aperture: params.aperture,
        sensor_width,
        sensor_height,
        lens_distortion: [params.k1, params.k2],
        center_shift: [params.center_x, params.center_y],
        scene_time: QualifiedFrameTime {
            frame: params.counter,
            rate: frame_rate,
        },
    }
}

/// Position and rotation in tracker space
pub fn resolve_pose(pose: &Pose) -> ([f64; 3], Rotation) {
    match pose {
        Pose::Euler(e) => (
            [e.x, e.y, e.z],
            Rotation {
                yaw: e.pan,
                pitch: e.tilt,
                roll: e.roll,
            },
        ),
        Pose::Matrix(m) => (transform_origin(m), matrix_to_rotation(m)),
    }
}

/// Sensor `(width, height)` in mm from the selected constants fields
pub fn sensor_size(constants: &TrackingConstants, source: SensorSource) -> (f64, f64) {
    match source {
        SensorSource::Chip => (constants.chip_width, constants.chip_height),
        SensorSource::FakeChip => (constants.fake_chip_width, constants.fake_chip_height),
    }
}

/// Focal length in mm.
///
/// With the FOV bit set, `fov` is an angle in degrees measured across the
/// sensor height (vertical bit), the sensor diagonal (diagonal bit) or the
/// sensor width. Without it, `fov` already is the image distance.
pub fn focal_length(params: &TrackingParameters, sensor_width: f64, sensor_height: f64) -> f64 {
    let format = params.format();
    if !format.contains(FormatFlags::FIELD_OF_VIEW) {
        return params.fov;
    }

    let extent = if format.contains(FormatFlags::VERTICAL) {
        sensor_height
    } else if format.contains(FormatFlags::DIAGONAL) {
        sensor_width.hypot(sensor_height)
    } else {
        sensor_width
    };

    fov_to_focal_length(params.fov, extent)
}

/// `0.5 * extent / tan(fov / 2)` with `fov` in degrees
#[inline]
pub fn fov_to_focal_length(fov_degrees: f64, extent: f64) -> f64 {
    0.5 * extent / (0.5 * fov_degrees.to_radians()).tan()
}
