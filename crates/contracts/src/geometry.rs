//! Geometry primitives shared by actors, poses and config.

use serde::{Deserialize, Serialize};

/// 3D transform: location + rotation
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Location (x, y, z) in meters
    pub location: Location,

    /// Rotation (pitch, yaw, roll) in degrees
    #[serde(default)]
    pub rotation: Rotation,
}

impl Transform {
    pub fn new(location: Location, rotation: Rotation) -> Self {
        Self { location, rotation }
    }

    /// Transform at the given location with zero rotation
    pub fn at(x: f64, y: f64, z: f64) -> Self {
        Self {
            location: Location { x, y, z },
            rotation: Rotation::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Location {
    /// Euclidean distance to another location
    pub fn distance(&self, other: &Location) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    pub pitch: f64,
    pub yaw: f64,
    pub roll: f64,
}

/// 3D vector (velocities, accelerations)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}
