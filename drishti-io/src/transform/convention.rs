//! Output coordinate conventions
//!
//! | Convention | Position | Rotation |
//! |------------|----------|----------|
//! | `ViewDirectionY` | `(-x, y, z) × s` | yaw' = 90° − yaw |
//! | `ViewDirectionX` | Y-up: `(-z, x, y) × s`, else `(y, x, z) × s` | unchanged |
//! | `Unity` | `(z, x, y) × s` | pitch and roll negated |

use serde::{Deserialize, Serialize};

use crate::core::{FormatFlags, Rotation};

/// Mapping from tracker space to output space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateConvention {
    /// Camera looks down +Y in tracker space
    #[default]
    ViewDirectionY,
    /// Camera looks down +X; honours the Y-up format bit
    ViewDirectionX,
    /// Unity-style left-handed Y-up target
    Unity,
}

impl CoordinateConvention {
    /// Map a tracker position (metres) into output units
    pub fn position(self, p: [f64; 3], scale: f64, format: FormatFlags) -> [f64; 3] {
        let [x, y, z] = p;
        match self {
            CoordinateConvention::ViewDirectionY => [-x * scale, y * scale, z * scale],
            CoordinateConvention::ViewDirectionX => {
                if format.contains(FormatFlags::Y_UP) {
                    [-z * scale, x * scale, y * scale]
                } else {
                    [y * scale, x * scale, z * scale]
                }
            }
            CoordinateConvention::Unity => [z * scale, x * scale, y * scale],
        }
    }

    /// Map a tracker rotation (degrees) into the output convention
    pub fn rotation(self, r: Rotation) -> Rotation {
        match self {
            CoordinateConvention::ViewDirectionY => Rotation {
                yaw: 90.0 - r.yaw,
                pitch: r.pitch,
                roll: r.roll,
            },
            CoordinateConvention::ViewDirectionX => r,
            CoordinateConvention::Unity => Rotation {
                yaw: r.yaw,
                pitch: -r.pitch,
                roll: -r.roll,
            },
        }
    }
}
