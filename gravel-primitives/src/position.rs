//! Position primitives.
#![allow(clippy::module_name_repetitions)]
use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// The position of some block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockPosition {
    pub x: i32,
    pub y: u32,
    pub z: i32,
}
impl Display for BlockPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BlockPosition(x = {}, y = {}, z = {})", self.x, self.y, self.z)
    }
}
impl BlockPosition {
    /// Creates a new `BlockPosition` from a
    /// set of coordinates.
    pub fn new(x: i32, y: u32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Offsets this position by (x, y, z).
    pub fn offset(&self, x: i32, y: i32, z: i32) -> Self {
        Self {
            x: self.x.wrapping_add(x),
            y: self.y.wrapping_add_signed(y),
            z: self.z.wrapping_add(z),
        }
    }
}

/// A three component float vector, used for
/// entity positions and motion.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// The block this vector lies in.
    ///
    /// Coordinates below zero on the y axis
    /// clamp to the bottom of the world.
    pub fn block(&self) -> BlockPosition {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        BlockPosition::new(
            self.x.floor() as i32,
            self.y.floor().max(0.0) as u32,
            self.z.floor() as i32,
        )
    }
}

impl Display for Vector3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Vector3(x = {}, y = {}, z = {})", self.x, self.y, self.z)
    }
}

/// The rotation of an entity.
///
/// `head_yaw` only travels on the wire for
/// player-like entities.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Rotation {
    pub yaw: f32,
    pub pitch: f32,
    pub head_yaw: f32,
}

impl Rotation {
    pub fn new(yaw: f32, pitch: f32, head_yaw: f32) -> Self {
        Self {
            yaw,
            pitch,
            head_yaw,
        }
    }
}
