//! Collision capsule geometry.
//!
//! The capsule is described the way a character rig sees it: a total
//! `height` (cap to cap), a `center` offset from the body's reference point
//! (its feet), and a `radius`. Backends convert this to their own collider
//! representation.

use bevy::prelude::*;

use crate::error::LocomotionError;

/// Capsule geometry relative to the body's reference point.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct CapsuleShape {
    /// Total height including both caps.
    pub height: f32,
    /// Center of the capsule relative to the body's reference point.
    pub center: Vec3,
    /// Cap radius.
    pub radius: f32,
}

impl Default for CapsuleShape {
    fn default() -> Self {
        Self::standing(1.8, 0.3)
    }
}

impl CapsuleShape {
    /// Create a capsule from explicit dimensions.
    pub fn new(height: f32, center: Vec3, radius: f32) -> Self {
        Self {
            height,
            center,
            radius,
        }
    }

    /// A capsule resting on the reference point (feet at the origin).
    pub fn standing(height: f32, radius: f32) -> Self {
        Self {
            height,
            center: Vec3::Y * (height * 0.5),
            radius,
        }
    }

    /// Rebuild a capsule from its inner segment endpoints and radius.
    ///
    /// The segment must be vertical; anything else cannot be resized for
    /// crouching.
    pub fn from_segment(a: Vec3, b: Vec3, radius: f32) -> Result<Self, LocomotionError> {
        let axis = b - a;
        if axis.x.abs() > 1e-4 || axis.z.abs() > 1e-4 {
            return Err(LocomotionError::NonVerticalCapsule(axis.to_array()));
        }
        Ok(Self {
            height: axis.y.abs() + radius * 2.0,
            center: (a + b) * 0.5,
            radius,
        })
    }

    /// The crouched version of this capsule: half height, half center.
    pub fn halved(&self) -> Self {
        Self {
            height: self.height * 0.5,
            center: self.center * 0.5,
            radius: self.radius,
        }
    }

    /// Half length of the inner segment.
    ///
    /// When the height is smaller than the cap diameter the capsule
    /// degenerates to a sphere.
    #[inline]
    pub fn segment_half_length(&self) -> f32 {
        (self.height * 0.5 - self.radius).max(0.0)
    }

    /// Inner segment endpoints relative to the reference point (bottom, top).
    pub fn segment(&self) -> (Vec3, Vec3) {
        let half = Vec3::Y * self.segment_half_length();
        (self.center - half, self.center + half)
    }
}
