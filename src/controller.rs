//! The locomotion controller component and its per-step update.
//!
//! [`LocomotionController`] is the central hub for a character's locomotion
//! state: ground contact, heading, and crouch. It contains RESULT states for
//! the last step, plus the small amount of hysteresis state (the ground check
//! distance) that carries from one step to the next.
//!
//! # Step order
//!
//! [`LocomotionController::update`] runs, in this order:
//! 1. clamp the intent to unit length
//! 2. move it into the body's heading space
//! 3. ground query (single source of truth for grounded state this step)
//! 4. project the intent onto the ground plane
//! 5. derive turn and forward amounts
//! 6. extra turn rotation
//! 7. jump (grounded) or extra gravity (airborne)
//! 8. crouch resize with stand-up veto
//! 9. independent headroom check

use bevy::prelude::*;

use crate::backend::LocomotionBody;
use crate::capsule::CapsuleShape;
use crate::config::LocomotionConfig;
use crate::math;

/// Ground contact state, refreshed once per step by the ground query.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct GroundState {
    /// Whether the ground ray hit supporting geometry this step.
    pub is_grounded: bool,
    /// World-space normal of the supporting surface (`Vec3::Y` when airborne).
    pub ground_normal: Vec3,
    /// Current ground ray length. Shrinks while ascending.
    pub ground_check_distance: f32,
}

impl Default for GroundState {
    fn default() -> Self {
        Self {
            is_grounded: false,
            ground_normal: Vec3::Y,
            ground_check_distance: LocomotionConfig::default().ground_check_distance,
        }
    }
}

/// Heading values derived from the ground-projected intent.
#[derive(Reflect, Debug, Clone, Copy, Default, PartialEq)]
pub struct OrientationState {
    /// Signed angle from forward to the intent, in `(-PI, PI]`. Positive is right.
    pub turn_amount: f32,
    /// Forward component of the projected intent.
    pub forward_amount: f32,
}

/// Crouch flag plus the live and captured capsule geometry.
///
/// The live capsule is always either `original` or `original.halved()`.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct CrouchState {
    pub crouching: bool,
    /// Geometry currently written to the collider.
    pub capsule: CapsuleShape,
    /// Geometry captured at setup.
    pub original: CapsuleShape,
}

impl CrouchState {
    /// Standing state for a captured capsule.
    pub fn new(original: CapsuleShape) -> Self {
        Self {
            crouching: false,
            capsule: original,
            original,
        }
    }

    /// Whether the live capsule is the halved one.
    pub fn is_crouch_sized(&self) -> bool {
        self.capsule == self.original.halved()
    }
}

/// Values emitted by a locomotion step, consumed by animation.
#[derive(Reflect, Debug, Clone, Copy, Default, PartialEq)]
pub struct LocomotionOutput {
    /// Forward blend value (projected intent z).
    pub forward_speed: f32,
    /// Turn blend value (the turn amount in radians).
    pub turn_rate: f32,
    pub grounded: bool,
    pub crouching: bool,
    /// Ground-projected intent in heading space (x = right, z = forward).
    pub move_vector: Vec3,
    /// Vertical velocity of the body at the end of the step.
    pub vertical_speed: f32,
}

/// Core locomotion controller component.
///
/// Call [`setup`](Self::setup) once with the body's initial capsule before
/// the first [`update`](Self::update).
#[derive(Component, Reflect, Debug, Clone, Default)]
#[reflect(Component)]
pub struct LocomotionController {
    /// Ground contact from the last step.
    pub ground: GroundState,
    /// Heading values from the last step.
    pub orientation: OrientationState,
    /// Ground-projected intent from the last step, in heading space.
    pub move_vector: Vec3,
    /// Output of the last step.
    pub last_output: LocomotionOutput,
    /// `None` until setup captures the capsule.
    crouch: Option<CrouchState>,
    original_ground_check_distance: f32,
}

impl LocomotionController {
    /// Create a controller that still needs [`setup`](Self::setup).
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the initial capsule and ground check distance.
    pub fn setup(&mut self, capsule: CapsuleShape, config: &LocomotionConfig) {
        self.crouch = Some(CrouchState::new(capsule));
        self.original_ground_check_distance = config.ground_check_distance;
        self.ground.ground_check_distance = config.ground_check_distance;
    }

    /// Create a controller that is already set up.
    pub fn with_capsule(capsule: CapsuleShape, config: &LocomotionConfig) -> Self {
        let mut controller = Self::new();
        controller.setup(capsule, config);
        controller
    }

    /// Whether the capsule has been captured.
    pub fn is_set_up(&self) -> bool {
        self.crouch.is_some()
    }

    /// Crouch state, if set up.
    pub fn crouch_state(&self) -> Option<&CrouchState> {
        self.crouch.as_ref()
    }

    /// Check if grounded after the last step.
    pub fn is_grounded(&self) -> bool {
        self.ground.is_grounded
    }

    /// Check if crouching after the last step.
    pub fn is_crouching(&self) -> bool {
        self.crouch.is_some_and(|c| c.crouching)
    }

    /// Ground check distance captured at setup.
    pub fn original_ground_check_distance(&self) -> f32 {
        self.original_ground_check_distance
    }

    /// Run one locomotion step.
    ///
    /// `intent` is a world-space movement intent (see
    /// [`IntentResolver`](crate::intent::IntentResolver)).
    ///
    /// # Panics
    ///
    /// Panics if the controller has not been set up.
    pub fn update<P: LocomotionBody>(
        &mut self,
        body: &mut P,
        config: &LocomotionConfig,
        dt: f32,
        intent: Vec3,
        crouch_requested: bool,
        jump_requested: bool,
    ) -> LocomotionOutput {
        let mut crouch = self
            .crouch
            .expect("LocomotionController::update called before setup");

        let intent = math::clamp_unit(intent);
        let rotation = body.rotation();
        let local = math::world_to_heading(rotation, intent);

        self.check_ground_status(body, config);

        let normal = math::world_to_heading(rotation, self.ground.ground_normal);
        let projected = math::project_on_plane(local, normal);
        self.orientation = OrientationState {
            turn_amount: math::heading_angle(projected),
            forward_amount: projected.z,
        };
        self.move_vector = projected;

        self.apply_extra_turn_rotation(body, config, dt);

        if self.ground.is_grounded {
            self.handle_grounded_movement(body, config, crouch_requested, jump_requested);
        } else {
            self.handle_airborne_movement(body, config);
        }

        scale_capsule_for_crouching(&mut crouch, body, self.ground.is_grounded, crouch_requested);
        prevent_standing_in_low_headroom(&mut crouch, body);
        self.crouch = Some(crouch);

        self.last_output = LocomotionOutput {
            forward_speed: self.orientation.forward_amount,
            turn_rate: self.orientation.turn_amount,
            grounded: self.ground.is_grounded,
            crouching: crouch.crouching,
            move_vector: self.move_vector,
            vertical_speed: body.velocity().y,
        };
        self.last_output
    }

    fn check_ground_status<P: LocomotionBody>(&mut self, body: &P, config: &LocomotionConfig) {
        // Start slightly inside the capsule; the reference point is the feet.
        let origin = body.position() + Vec3::Y * config.ground_probe_offset;

        match body.raycast(origin, Vec3::NEG_Y, self.ground.ground_check_distance) {
            Some(hit) => {
                self.ground.is_grounded = true;
                self.ground.ground_normal = hit.normal.try_normalize().unwrap_or(Vec3::Y);
            }
            None => {
                self.ground.is_grounded = false;
                self.ground.ground_normal = Vec3::Y;
            }
        }
    }

    /// Helps the character turn faster, on top of any root-motion rotation.
    fn apply_extra_turn_rotation<P: LocomotionBody>(
        &self,
        body: &mut P,
        config: &LocomotionConfig,
        dt: f32,
    ) {
        let turn_speed = math::lerp_clamped(
            config.stationary_turn_speed,
            config.moving_turn_speed,
            self.orientation.forward_amount,
        );
        let degrees = self.orientation.turn_amount * turn_speed * dt;
        if degrees != 0.0 {
            body.rotate(math::yaw_right(degrees));
        }
    }

    fn handle_grounded_movement<P: LocomotionBody>(
        &mut self,
        body: &mut P,
        config: &LocomotionConfig,
        crouch_requested: bool,
        jump_requested: bool,
    ) {
        if !jump_requested || crouch_requested {
            return;
        }

        let velocity = body.velocity();
        body.set_velocity(Vec3::new(velocity.x, config.jump_power, velocity.z));
        self.ground.is_grounded = false;
        self.ground.ground_check_distance = config.airborne_ground_check_distance;
        debug!("jump started with vertical velocity {}", config.jump_power);
    }

    fn handle_airborne_movement<P: LocomotionBody>(
        &mut self,
        body: &mut P,
        config: &LocomotionConfig,
    ) {
        body.apply_force(config.extra_gravity(body.gravity()));

        self.ground.ground_check_distance = if body.velocity().y < 0.0 {
            self.original_ground_check_distance
        } else {
            config.airborne_ground_check_distance
        };
    }
}

/// Halve the capsule on a grounded crouch request, otherwise try to stand.
fn scale_capsule_for_crouching<P: LocomotionBody>(
    crouch: &mut CrouchState,
    body: &mut P,
    grounded: bool,
    crouch_requested: bool,
) {
    if grounded && crouch_requested {
        if crouch.crouching {
            return;
        }
        crouch.capsule = crouch.original.halved();
        body.set_capsule(&crouch.capsule);
        crouch.crouching = true;
        debug!("crouched to height {}", crouch.capsule.height);
        return;
    }

    if headroom_blocked(crouch, body) {
        crouch.crouching = true;
        return;
    }

    if crouch.capsule != crouch.original {
        crouch.capsule = crouch.original;
        body.set_capsule(&crouch.capsule);
        debug!("stood up to height {}", crouch.capsule.height);
    }
    crouch.crouching = false;
}

/// Keep crouching in crouch-only zones even when no crouch was requested.
fn prevent_standing_in_low_headroom<P: LocomotionBody>(crouch: &mut CrouchState, body: &P) {
    if crouch.crouching {
        return;
    }
    if headroom_blocked(crouch, body) {
        crouch.crouching = true;
    }
}

/// Sweep a half-radius sphere from near the capsule base through the full
/// standing height.
fn headroom_blocked<P: LocomotionBody>(crouch: &CrouchState, body: &P) -> bool {
    let radius = crouch.original.radius;
    let origin = body.position() + Vec3::Y * (radius * 0.5);
    let length = crouch.original.height - radius * 0.5;
    body.sphere_cast(origin, radius * 0.5, Vec3::Y, length)
        .is_some()
}
