//! Physics backend abstraction.
//!
//! This module defines the traits a physics engine integration implements to
//! drive a locomotion controller. The controller itself never talks to a
//! physics engine directly; it goes through a [`LocomotionBody`], a per-step
//! view of one rigid body, its collision capsule and the world it can query.

use bevy::prelude::*;

use crate::capsule::CapsuleShape;
use crate::collision::CollisionData;

/// Trait for physics backend implementations.
///
/// A backend contributes the plugin that schedules its stepping systems into
/// [`LocomotionSet`](crate::LocomotionSet). See the `rapier` module's
/// `Rapier3dBackend` for an implementation over Bevy Rapier3D.
pub trait LocomotionBackend: 'static + Send + Sync {
    /// Returns the plugin that sets up this backend.
    fn plugin() -> impl Plugin;
}

/// Per-step access to one controlled body.
///
/// Implementations borrow whatever engine state they need for the duration of
/// a single step. Query methods must ignore the body's own collider and any
/// sensors.
pub trait LocomotionBody {
    /// Position of the body's reference point (its feet).
    fn position(&self) -> Vec3;

    /// Current orientation of the body.
    fn rotation(&self) -> Quat;

    /// Apply a world-space rotation delta to the body.
    fn rotate(&mut self, delta: Quat);

    /// Current linear velocity.
    fn velocity(&self) -> Vec3;

    /// Overwrite the linear velocity.
    fn set_velocity(&mut self, velocity: Vec3);

    /// Add a force for this step.
    ///
    /// Force is applied over the physics timestep.
    fn apply_force(&mut self, force: Vec3);

    /// Gravity acting on the body.
    fn gravity(&self) -> Vec3;

    /// Cast a ray and return the first hit within `max_distance`.
    ///
    /// # Arguments
    /// * `origin` - Ray origin in world space
    /// * `direction` - Cast direction (normalized)
    /// * `max_distance` - Maximum cast distance
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<CollisionData>;

    /// Sweep a sphere along `direction` and return the first hit.
    ///
    /// Geometry already touching the sphere at its start position must not be
    /// reported.
    fn sphere_cast(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
    ) -> Option<CollisionData>;

    /// Write new capsule geometry to the body's collider.
    fn set_capsule(&mut self, capsule: &CapsuleShape);
}

/// Empty plugin for backends that don't need additional setup.
pub struct NoOpBackendPlugin;

impl Plugin for NoOpBackendPlugin {
    fn build(&self, _app: &mut App) {}
}
