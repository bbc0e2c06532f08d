//! Core types and math shared by the codec, session and transform.
//!
//! - [`TrackingParameters`], [`TrackingConstants`]: decoded tracker samples
//! - [`CameraFrameRecord`], [`CameraStaticRecord`]: transform output
//! - [`math`]: pose matrix decomposition

pub mod math;
mod types;

pub use types::{
    CameraFrameRecord, CameraStaticRecord, EulerPose, FormatFlags, FrameRate, IDENTITY, Pose,
    QualifiedFrameTime, Rotation, TrackingConstants, TrackingParameters,
};
