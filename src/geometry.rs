//! Minimal vector math for ray sampling.
//!
//! Only what the perception cone needs: a 3-D vector, a viewer orientation
//! expressed as Euler angles in degrees, and the composition of the two into
//! a ray direction. Angles follow the convention pitch-about-X, yaw-about-Y,
//! roll-about-Z, composed yaw * pitch * roll.

use serde::{Deserialize, Serialize};

/// 3-D vector (right-handed, +Z forward, +Y up)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Forward axis rotated by viewer orientation to obtain ray directions
    pub const FORWARD: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 1.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn sub(self, other: Vec3) -> Vec3 {
        Vec3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    pub fn add(self, other: Vec3) -> Vec3 {
        Vec3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    pub fn scale(self, s: f32) -> Vec3 {
        Vec3::new(self.x * s, self.y * s, self.z * s)
    }

    /// Unit-length copy; zero vector is returned unchanged
    pub fn normalized(self) -> Vec3 {
        let len = self.length();
        if len <= f32::EPSILON {
            return self;
        }
        self.scale(1.0 / len)
    }
}

/// Viewer orientation as Euler angles in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Orientation {
    pub yaw_deg: f32,
    pub pitch_deg: f32,
    pub roll_deg: f32,
}

impl Orientation {
    pub fn new(yaw_deg: f32, pitch_deg: f32, roll_deg: f32) -> Self {
        Self {
            yaw_deg,
            pitch_deg,
            roll_deg,
        }
    }

    /// Rotate a vector by this orientation (roll, then pitch, then yaw)
    pub fn rotate(self, v: Vec3) -> Vec3 {
        let (sr, cr) = self.roll_deg.to_radians().sin_cos();
        let (sp, cp) = self.pitch_deg.to_radians().sin_cos();
        let (sy, cy) = self.yaw_deg.to_radians().sin_cos();

        // Roll about Z
        let v = Vec3::new(v.x * cr - v.y * sr, v.x * sr + v.y * cr, v.z);
        // Pitch about X
        let v = Vec3::new(v.x, v.y * cp - v.z * sp, v.y * sp + v.z * cp);
        // Yaw about Y
        Vec3::new(v.x * cy + v.z * sy, v.y, -v.x * sy + v.z * cy)
    }
}

/// Position plus orientation of a viewer
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Orientation,
}

impl Default for Vec3 {
    fn default() -> Self {
        Vec3::ZERO
    }
}

impl Pose {
    pub fn new(position: Vec3, orientation: Orientation) -> Self {
        Self {
            position,
            orientation,
        }
    }
}

/// Ray direction for one sample of the view cone.
///
/// Composes viewer orientation with the local cone offset and applies the
/// result to the forward axis: `R_viewer * R_local(pitch, yaw, 0) * forward`.
pub fn cone_direction(orientation: Orientation, pitch_offset_deg: f32, yaw_offset_deg: f32) -> Vec3 {
    let local = Orientation::new(yaw_offset_deg, pitch_offset_deg, 0.0);
    orientation.rotate(local.rotate(Vec3::FORWARD))
}
