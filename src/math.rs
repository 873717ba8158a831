//! Numeric and geometry helpers shared by the resolver and the controller.
//!
//! The controller reasons in *heading space*: x = right, y = up, z = forward.
//! Bevy bodies face `-Z` in their local frame, so heading space is the local
//! frame with z negated.

use std::f32::consts::PI;

use bevy::prelude::*;

/// Clamp a vector's magnitude to at most 1, preserving direction.
#[inline]
pub fn clamp_unit(v: Vec3) -> Vec3 {
    if v.length_squared() > 1.0 {
        v.normalize()
    } else {
        v
    }
}

/// Remove the component of `v` along the plane normal `normal`.
///
/// A degenerate normal leaves `v` untouched.
#[inline]
pub fn project_on_plane(v: Vec3, normal: Vec3) -> Vec3 {
    let sqr = normal.length_squared();
    if sqr < f32::EPSILON {
        return v;
    }
    v - normal * (v.dot(normal) / sqr)
}

/// Signed heading angle of a heading-space vector, in `(-PI, PI]`.
///
/// Positive angles are to the right of forward.
#[inline]
pub fn heading_angle(v: Vec3) -> f32 {
    let angle = v.x.atan2(v.z);
    // atan2(-0.0, negative) yields -PI
    if angle <= -PI {
        PI
    } else {
        angle
    }
}

/// Linear interpolation with `t` clamped to `[0, 1]`.
#[inline]
pub fn lerp_clamped(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t.clamp(0.0, 1.0)
}

/// Convert a world-space direction into the heading space of a body.
#[inline]
pub fn world_to_heading(rotation: Quat, world: Vec3) -> Vec3 {
    let local = rotation.inverse() * world;
    Vec3::new(local.x, local.y, -local.z)
}

/// Yaw rotation that turns a body by `degrees` to its right.
#[inline]
pub fn yaw_right(degrees: f32) -> Quat {
    Quat::from_rotation_y(-degrees.to_radians())
}
