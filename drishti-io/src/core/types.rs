//! Core data types for tracking samples and camera output records.
//!
//! Input side (decoded from the tracker):
//! - [`TrackingParameters`]: per-frame dynamic data (pose, lens, counter)
//! - [`TrackingConstants`]: per-session semi-static data (image and chip size)
//!
//! Output side (produced by the frame transform):
//! - [`CameraFrameRecord`]: one camera frame in output units
//! - [`CameraStaticRecord`]: sensor-size announcement, re-sent only on change

use serde::{Deserialize, Serialize};

// ============================================================================
// Format bitmask
// ============================================================================

/// Per-datagram format bitmask.
///
/// Only the Euler bit selects the pose representation; the remaining bits
/// describe how the field of view is to be interpreted and which axis is up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct FormatFlags(u32);

impl FormatFlags {
    /// Pose is a 6-value Euler set instead of a 4×4 matrix
    pub const EULER: FormatFlags = FormatFlags(0x0001);
    /// Tracker coordinate system is Y-up
    pub const Y_UP: FormatFlags = FormatFlags(0x0004);
    /// `fov` holds a field of view in degrees (else an image distance)
    pub const FIELD_OF_VIEW: FormatFlags = FormatFlags(0x0010);
    /// Field of view is measured vertically
    pub const VERTICAL: FormatFlags = FormatFlags(0x0020);
    /// Field of view is measured diagonally
    pub const DIAGONAL: FormatFlags = FormatFlags(0x0040);

    /// Empty bitmask (matrix pose, image distance)
    pub const fn empty() -> Self {
        FormatFlags(0)
    }

    /// Wrap raw wire bits; unknown bits are preserved
    pub const fn from_bits(bits: u32) -> Self {
        FormatFlags(bits)
    }

    /// Raw bits as sent on the wire
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// True if every bit of `other` is set
    #[inline]
    pub const fn contains(self, other: FormatFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Set or clear the bits of `other`
    #[inline]
    pub fn set(&mut self, other: FormatFlags, value: bool) {
        if value {
            self.0 |= other.0;
        } else {
            self.0 &= !other.0;
        }
    }
}

impl std::ops::BitOr for FormatFlags {
    type Output = FormatFlags;

    fn bitor(self, rhs: FormatFlags) -> FormatFlags {
        FormatFlags(self.0 | rhs.0)
    }
}

// ============================================================================
// Pose
// ============================================================================

/// Euler pose: position plus pan/tilt/roll in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EulerPose {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub pan: f64,
    pub tilt: f64,
    pub roll: f64,
}

/// Camera pose as sent by the tracker.
///
/// The matrix uses the row-vector convention: rows 0..2 are the rotated
/// X/Y/Z axes and row 3 holds the translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pose {
    /// Position and pan/tilt/roll
    Euler(EulerPose),
    /// 4×4 rigid transform, `m[row][column]`
    Matrix([[f64; 4]; 4]),
}

/// 4×4 identity matrix
pub const IDENTITY: [[f64; 4]; 4] = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

impl Default for Pose {
    fn default() -> Self {
        Pose::Matrix(IDENTITY)
    }
}

impl Pose {
    /// True for the Euler representation
    pub fn is_euler(&self) -> bool {
        matches!(self, Pose::Euler(_))
    }
}

// ============================================================================
// Tracking input
// ============================================================================

/// Per-frame tracking sample.
///
/// The pose representation and the Euler bit of the format mask always agree:
/// both are only reachable through [`TrackingParameters::new`],
/// [`set_pose`](TrackingParameters::set_pose) and
/// [`set_format`](TrackingParameters::set_format), which keep them in sync.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingParameters {
    /// Tracker id, 0 if not explicitly specified
    pub id: u32,
    format: FormatFlags,
    pose: Pose,
    /// Field of view in degrees, or image distance (focal length) in mm
    pub fov: f64,
    /// Horizontal center shift in mm (chip space)
    pub center_x: f64,
    /// Vertical center shift in mm (chip space)
    pub center_y: f64,
    /// First radial distortion coefficient
    pub k1: f64,
    /// Second radial distortion coefficient
    pub k2: f64,
    /// Focus distance in tracker units (metres)
    pub focus_distance: f64,
    /// Aperture (f-stop)
    pub aperture: f64,
    /// Monotonic frame counter
    pub counter: u32,
}

impl TrackingParameters {
    /// Create a sample with the given format bits and pose.
    ///
    /// The Euler bit of `format` is overwritten to match `pose`.
    pub fn new(format: FormatFlags, pose: Pose) -> Self {
        let mut params = Self {
            pose,
            ..Self::default()
        };
        params.set_format(format);
        params
    }

    /// Format bitmask
    #[inline]
    pub fn format(&self) -> FormatFlags {
        self.format
    }

    /// Pose representation selected by the Euler bit
    #[inline]
    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    /// Replace the pose, updating the Euler bit
    pub fn set_pose(&mut self, pose: Pose) {
        self.pose = pose;
        self.format.set(FormatFlags::EULER, pose.is_euler());
    }

    /// Replace the format bits; the Euler bit keeps following the pose
    pub fn set_format(&mut self, format: FormatFlags) {
        self.format = format;
        self.format.set(FormatFlags::EULER, self.pose.is_euler());
    }
}

impl Default for TrackingParameters {
    fn default() -> Self {
        Self {
            id: 0,
            format: FormatFlags::empty(),
            pose: Pose::default(),
            fov: 20.0,
            center_x: 0.0,
            center_y: 0.0,
            k1: 0.0,
            k2: 0.0,
            focus_distance: 100_000.0,
            aperture: 1.0,
            counter: 0,
        }
    }
}

/// Per-session camera constants
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackingConstants {
    /// Tracker id, 0 if not explicitly specified
    pub id: u32,
    /// Image width in pixels
    pub image_width: i32,
    /// Image height in pixels
    pub image_height: i32,
    pub blank_left: i32,
    pub blank_right: i32,
    pub blank_top: i32,
    pub blank_bottom: i32,
    /// Physical chip width in mm
    pub chip_width: f64,
    /// Physical chip height in mm
    pub chip_height: f64,
    /// Advertised chip width in mm
    pub fake_chip_width: f64,
    /// Advertised chip height in mm
    pub fake_chip_height: f64,
}

impl Default for TrackingConstants {
    fn default() -> Self {
        Self {
            id: 0,
            image_width: 1920,
            image_height: 1080,
            blank_left: 0,
            blank_right: 0,
            blank_top: 0,
            blank_bottom: 0,
            chip_width: 9.6,
            chip_height: 5.4,
            fake_chip_width: 9.6,
            fake_chip_height: 5.4,
        }
    }
}

// ============================================================================
// Frame time
// ============================================================================

/// Rational frame rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRate {
    pub numerator: u32,
    pub denominator: u32,
}

impl FrameRate {
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Frames per second as a float (0 for a zero denominator)
    pub fn as_fps(&self) -> f64 {
        if self.denominator == 0 {
            return 0.0;
        }
        self.numerator as f64 / self.denominator as f64
    }

    /// Seconds at the start of `frame`
    pub fn frame_to_seconds(&self, frame: u32) -> f64 {
        if self.numerator == 0 {
            return 0.0;
        }
        frame as f64 * self.denominator as f64 / self.numerator as f64
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::new(30, 1)
    }
}

/// Frame number qualified by the rate it counts in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QualifiedFrameTime {
    pub frame: u32,
    pub rate: FrameRate,
}

impl QualifiedFrameTime {
    pub fn as_seconds(&self) -> f64 {
        self.rate.frame_to_seconds(self.frame)
    }
}

// ============================================================================
// Camera output
// ============================================================================

/// Output rotation in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rotation {
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,
}

/// One camera frame in output units
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CameraFrameRecord {
    /// World position (tracker metres × scale, centimetres by default)
    pub position: [f64; 3],
    /// Rotation in the output convention
    pub rotation: Rotation,
    /// Focal length in mm
    pub focal_length: f64,
    /// Focus distance (tracker units × scale)
    pub focus_distance: f64,
    /// Aperture (f-stop)
    pub aperture: f64,
    /// Sensor width in mm
    pub sensor_width: f64,
    /// Sensor height in mm
    pub sensor_height: f64,
    /// Radial distortion `[k1, k2]`
    pub lens_distortion: [f64; 2],
    /// Center shift `[x, y]` in mm
    pub center_shift: [f64; 2],
    /// Tracker frame counter paired with the session frame rate
    pub scene_time: QualifiedFrameTime,
}

impl CameraFrameRecord {
    /// Sensor size `(width, height)` in mm
    #[inline]
    pub fn sensor_size(&self) -> (f64, f64) {
        (self.sensor_width, self.sensor_height)
    }
}

/// Static camera data, sent on the first frame and whenever the sensor changes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraStaticRecord {
    pub sensor_width: f64,
    pub sensor_height: f64,
    pub focal_length_supported: bool,
    pub focus_distance_supported: bool,
}

impl CameraStaticRecord {
    /// Static record announcing the sensor size of `frame`
    pub fn from_frame(frame: &CameraFrameRecord) -> Self {
        Self {
            sensor_width: frame.sensor_width,
            sensor_height: frame.sensor_height,
            focal_length_supported: true,
            focus_distance_supported: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_euler_bit_follows_pose() {
        let mut params = TrackingParameters::new(
            FormatFlags::FIELD_OF_VIEW,
            Pose::Euler(EulerPose::default()),
        );
        assert!(params.format().contains(FormatFlags::EULER));
        assert!(params.format().contains(FormatFlags::FIELD_OF_VIEW));

        params.set_pose(Pose::Matrix(IDENTITY));
        assert!(!params.format().contains(FormatFlags::EULER));

        // Requesting the Euler bit with a matrix pose is ignored
        params.set_format(FormatFlags::EULER | FormatFlags::VERTICAL);
        assert!(!params.format().contains(FormatFlags::EULER));
        assert!(params.format().contains(FormatFlags::VERTICAL));
    }

    #[test]
    fn test_defaults() {
        let params = TrackingParameters::default();
        assert_eq!(params.fov, 20.0);
        assert_eq!(params.focus_distance, 100_000.0);
        assert_eq!(*params.pose(), Pose::Matrix(IDENTITY));

        let constants = TrackingConstants::default();
        assert_eq!(constants.image_width, 1920);
        assert_eq!(constants.chip_width, 9.6);
        assert_eq!(constants.fake_chip_height, 5.4);
    }

    #[test]
    fn test_frame_time() {
        let time = QualifiedFrameTime {
            frame: 50,
            rate: FrameRate::new(25, 1),
        };
        assert_eq!(time.as_seconds(), 2.0);

        let ntsc = FrameRate::new(30000, 1001);
        assert!((ntsc.as_fps() - 29.97).abs() < 0.001);
        assert_eq!(FrameRate::new(0, 1).frame_to_seconds(10), 0.0);
    }
}
