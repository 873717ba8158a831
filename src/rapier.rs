//! Rapier3D physics backend implementation.
//!
//! This module provides the physics backend for Bevy Rapier3D.
//! Enable with the `rapier3d` feature.
//!
//! The character's entity origin is its feet: build the capsule collider with
//! [`capsule_collider`] (or any vertical [`Collider::capsule`] whose segment
//! sits above the origin) so ground probes start at the right height.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::animation::AnimationParameters;
use crate::backend::{LocomotionBackend, LocomotionBody};
use crate::capsule::CapsuleShape;
use crate::collision::CollisionData;
use crate::config::LocomotionConfig;
use crate::controller::LocomotionController;
use crate::error::LocomotionError;
use crate::intent::{InputBuffer, IntentReference, IntentResolver};
use crate::pipeline::{run_fixed_step, ControllerStepper};
use crate::LocomotionSet;

/// Gravity used when no Rapier configuration can be read.
const DEFAULT_GRAVITY: Vec3 = Vec3::new(0.0, -9.81, 0.0);

/// Rapier3D physics backend for the locomotion controller.
///
/// This backend uses `bevy_rapier3d` for scene queries, velocity writes and
/// force application. Queries go through `RapierContext`, which the step
/// system receives as a system parameter.
pub struct Rapier3dBackend;

impl LocomotionBackend for Rapier3dBackend {
    fn plugin() -> impl Plugin {
        Rapier3dBackendPlugin
    }
}

/// Plugin that sets up Rapier3D-specific systems for the locomotion controller.
pub struct Rapier3dBackendPlugin;

impl Plugin for Rapier3dBackendPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<LocomotionForces>();

        // Preparation: capture capsules, then clear forces from the previous step
        app.add_systems(
            FixedUpdate,
            (rapier_setup_controllers, clear_controller_forces)
                .chain()
                .in_set(LocomotionSet::Preparation),
        );

        app.add_systems(
            FixedUpdate,
            rapier_locomotion_step.in_set(LocomotionSet::Step),
        );

        // Final Application: apply accumulated forces to physics
        app.add_systems(
            FixedUpdate,
            apply_controller_forces.in_set(LocomotionSet::FinalApplication),
        );
    }
}

/// Read the controller capsule from a Rapier collider.
pub fn capsule_from_collider(collider: &Collider) -> Result<CapsuleShape, LocomotionError> {
    let capsule = collider
        .as_capsule()
        .ok_or(LocomotionError::UnsupportedCollider)?;
    let segment = capsule.segment();
    CapsuleShape::from_segment(segment.a(), segment.b(), capsule.radius())
}

/// Build a Rapier collider for a controller capsule.
pub fn capsule_collider(capsule: &CapsuleShape) -> Collider {
    let (bottom, top) = capsule.segment();
    Collider::capsule(bottom, top, capsule.radius)
}

/// Forces the controller adds to the body's `ExternalForce`.
///
/// `ExternalForce` persists across physics steps, so the controller keeps
/// track of what it contributed last step and subtracts it before adding the
/// new step's forces. Forces from other sources are left untouched.
#[derive(Component, Reflect, Debug, Clone, Copy, Default, PartialEq)]
#[reflect(Component)]
pub struct LocomotionForces {
    pending: Vec3,
    applied: Vec3,
}

impl LocomotionForces {
    /// Accumulate a force for the current step.
    pub fn add(&mut self, force: Vec3) {
        self.pending += force;
    }

    /// Forces accumulated so far this step.
    pub fn pending(&self) -> Vec3 {
        self.pending
    }

    /// Forces written to `ExternalForce` by the last step.
    pub fn applied(&self) -> Vec3 {
        self.applied
    }

    /// Start a new step; returns the force to remove from `ExternalForce`.
    pub fn prepare_new_step(&mut self) -> Vec3 {
        self.pending = Vec3::ZERO;
        std::mem::take(&mut self.applied)
    }

    /// Finish the step; returns the force to add to `ExternalForce`.
    pub fn finalize_step(&mut self) -> Vec3 {
        self.applied = std::mem::take(&mut self.pending);
        self.applied
    }
}

/// One step's view of a Rapier-simulated character.
///
/// Body state is copied in before the step and written back afterwards by
/// the step system; queries go straight to the Rapier context.
pub struct RapierBody<'a> {
    context: &'a RapierContext<'a>,
    entity: Entity,
    collision_groups: Option<CollisionGroups>,
    position: Vec3,
    rotation: Quat,
    velocity: Vec3,
    gravity: Vec3,
    force: Vec3,
    capsule: Option<CapsuleShape>,
}

impl RapierBody<'_> {
    fn filter(&self) -> QueryFilter<'_> {
        let filter = QueryFilter::default()
            .exclude_rigid_body(self.entity)
            .exclude_sensors();

        // Inherit collision groups from the character's collider
        match self.collision_groups {
            Some(groups) => filter.groups(groups),
            None => filter,
        }
    }
}

impl LocomotionBody for RapierBody<'_> {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn rotation(&self) -> Quat {
        self.rotation
    }

    fn rotate(&mut self, delta: Quat) {
        self.rotation = (delta * self.rotation).normalize();
    }

    fn velocity(&self) -> Vec3 {
        self.velocity
    }

    fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    fn apply_force(&mut self, force: Vec3) {
        self.force += force;
    }

    fn gravity(&self) -> Vec3 {
        self.gravity
    }

    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<CollisionData> {
        self.context
            .cast_ray_and_get_normal(origin, direction, max_distance, true, self.filter())
            .map(|(hit_entity, hit)| {
                CollisionData::new(hit.time_of_impact, hit.normal, hit.point, Some(hit_entity))
            })
    }

    fn sphere_cast(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
    ) -> Option<CollisionData> {
        let shape = Collider::ball(radius);

        self.context
            .cast_shape(
                origin,
                Quat::IDENTITY,
                direction,
                &shape,
                ShapeCastOptions {
                    max_time_of_impact: max_distance,
                    stop_at_penetration: false,
                    ..default()
                },
                self.filter(),
            )
            // Overlaps at the start position are not hits.
            .filter(|(_, hit)| hit.time_of_impact > 0.0)
            .map(|(hit_entity, hit)| {
                let normal = hit.details.map(|d| d.normal2).unwrap_or(-direction);
                let hit_point = origin + direction * hit.time_of_impact;
                CollisionData::new(hit.time_of_impact, normal, hit_point, Some(hit_entity))
            })
    }

    fn set_capsule(&mut self, capsule: &CapsuleShape) {
        self.capsule = Some(*capsule);
    }
}

/// Capture the capsule of newly added controllers and freeze body rotation.
///
/// Controllers whose collider is not a vertical capsule, or whose config is
/// invalid, are left un-set-up and never stepped. A rejected controller is
/// retried when its config changes.
fn rapier_setup_controllers(
    mut commands: Commands,
    mut q_controllers: Query<
        (
            Entity,
            &mut LocomotionController,
            &LocomotionConfig,
            &Collider,
            Option<&mut LockedAxes>,
            Has<LocomotionForces>,
            Has<ExternalForce>,
        ),
        Or<(
            Added<LocomotionController>,
            Added<Collider>,
            Changed<LocomotionConfig>,
        )>,
    >,
) {
    for (entity, mut controller, config, collider, locked_axes, has_forces, has_external) in
        &mut q_controllers
    {
        if controller.is_set_up() {
            continue;
        }

        let capsule = match config
            .validate()
            .and_then(|()| capsule_from_collider(collider))
        {
            Ok(capsule) => capsule,
            Err(err) => {
                error!("{entity}: locomotion setup failed: {err}");
                continue;
            }
        };

        controller.setup(capsule, config);
        debug!(
            "{entity}: locomotion set up with capsule height {} radius {}",
            capsule.height, capsule.radius
        );

        match locked_axes {
            Some(mut axes) => *axes |= LockedAxes::ROTATION_LOCKED,
            None => {
                commands.entity(entity).insert(LockedAxes::ROTATION_LOCKED);
            }
        }
        if !has_forces {
            commands.entity(entity).insert(LocomotionForces::default());
        }
        if !has_external {
            commands.entity(entity).insert(ExternalForce::default());
        }
    }
}

/// Run one locomotion step for every set-up character.
fn rapier_locomotion_step(
    rapier_context: ReadRapierContext,
    time: Option<Res<Time<Fixed>>>,
    q_configuration: Query<&RapierConfiguration>,
    mut q_characters: Query<(
        Entity,
        &mut LocomotionController,
        &LocomotionConfig,
        &mut InputBuffer,
        Option<&IntentReference>,
        Option<&IntentResolver>,
        Option<&mut AnimationParameters>,
        &mut Transform,
        &mut Velocity,
        &mut Collider,
        &mut LocomotionForces,
        Option<&CollisionGroups>,
        Option<&GravityScale>,
    )>,
) {
    let Ok(context) = rapier_context.single() else {
        return;
    };

    // Get fixed timestep delta, with fallback for testing scenarios
    let dt = time
        .map(|t| t.delta_secs())
        .filter(|&d| d > 0.0)
        .unwrap_or(1.0 / 60.0);

    let world_gravity = q_configuration
        .single()
        .map(|configuration| configuration.gravity)
        .unwrap_or(DEFAULT_GRAVITY);

    for (
        entity,
        mut controller,
        config,
        mut input,
        reference,
        resolver,
        mut animation,
        mut transform,
        mut velocity,
        mut collider,
        mut forces,
        collision_groups,
        gravity_scale,
    ) in &mut q_characters
    {
        if !controller.is_set_up() {
            continue;
        }

        let body = RapierBody {
            context: &context,
            entity,
            collision_groups: collision_groups.copied(),
            position: transform.translation,
            rotation: transform.rotation,
            velocity: velocity.linvel,
            gravity: world_gravity * gravity_scale.map_or(1.0, |scale| scale.0),
            force: Vec3::ZERO,
            capsule: None,
        };
        let resolver = resolver.copied().unwrap_or_default();
        let frame = reference.and_then(|reference| reference.frame.as_ref());

        let mut stepper = ControllerStepper::new(&mut controller, config, body);
        run_fixed_step(
            &mut *input,
            &resolver,
            frame,
            &mut stepper,
            &mut animation.as_deref_mut(),
            dt,
        );
        let body = stepper.body;

        // Write back only what changed to keep change detection meaningful
        if transform.rotation != body.rotation {
            transform.rotation = body.rotation;
        }
        if velocity.linvel != body.velocity {
            velocity.linvel = body.velocity;
        }
        if let Some(capsule) = body.capsule {
            *collider = capsule_collider(&capsule);
        }
        forces.add(body.force);
    }
}

/// Clear controller forces at the start of each step.
///
/// This system runs BEFORE the locomotion step. It:
/// 1. Subtracts the forces we applied last step from ExternalForce
/// 2. Clears the accumulator for the new step
///
/// This ensures that external user forces are preserved while our forces
/// are "isolated" between steps.
pub fn clear_controller_forces(mut q: Query<(&mut ExternalForce, &mut LocomotionForces)>) {
    for (mut ext_force, mut forces) in &mut q {
        ext_force.force -= forces.prepare_new_step();
    }
}

/// Apply controller forces at the end of each step.
///
/// This system runs AFTER the locomotion step. It:
/// 1. Applies accumulated forces to ExternalForce
/// 2. Stores what we applied for next step's subtraction
pub fn apply_controller_forces(mut q: Query<(&mut ExternalForce, &mut LocomotionForces)>) {
    for (mut ext_force, mut forces) in &mut q {
        ext_force.force += forces.finalize_step();
    }
}

/// Bundle for creating a character with Rapier3D physics.
///
/// This bundle provides the Rapier3D components a locomotion character needs:
/// a dynamic rigid body, velocity tracking, an external force for the
/// controller's extra gravity, locked rotation and the force accumulator.
/// Add a capsule collider alongside it.
///
/// # Example
///
/// ```ignore
/// use bevy::prelude::*;
/// use bevy_rapier3d::prelude::*;
/// use msg_locomotion::prelude::*;
/// use msg_locomotion::rapier::{capsule_collider, Rapier3dCharacterBundle};
///
/// fn spawn_player(mut commands: Commands, camera: Single<Entity, With<Camera>>) {
///     commands.spawn((
///         Transform::from_xyz(0.0, 0.0, 0.0),
///         LocomotionBundle::new(LocomotionConfig::player()),
///         ReferenceCamera(*camera),
///         Rapier3dCharacterBundle::new(),
///         capsule_collider(&CapsuleShape::standing(1.8, 0.3)),
///     ));
/// }
/// ```
///
/// # Defaults
///
/// - `rigid_body`: [`RigidBody::Dynamic`]
/// - `velocity`: Zero velocity
/// - `external_force`: Zero force (accumulated by controller systems)
/// - `locked_axes`: [`LockedAxes::ROTATION_LOCKED`], the controller turns the body itself
/// - `damping`: None
#[derive(Bundle, Default)]
pub struct Rapier3dCharacterBundle {
    /// The rigid body type. Should typically be [`RigidBody::Dynamic`] for characters.
    pub rigid_body: RigidBody,
    /// Current linear and angular velocity. Updated by Rapier each physics step.
    pub velocity: Velocity,
    /// Persistent force on the body. The controller adds its extra gravity here.
    pub external_force: ExternalForce,
    /// Which axes are locked. Rotation is always locked by setup.
    pub locked_axes: LockedAxes,
    /// Damping coefficients for velocity reduction.
    pub damping: Damping,
    /// The controller's share of `external_force`.
    pub forces: LocomotionForces,
}

impl Rapier3dCharacterBundle {
    /// Create a new character bundle with rotation locked.
    pub fn new() -> Self {
        Self {
            rigid_body: RigidBody::Dynamic,
            velocity: Velocity::default(),
            external_force: ExternalForce::default(),
            locked_axes: LockedAxes::ROTATION_LOCKED,
            damping: Damping {
                linear_damping: 0.0,
                angular_damping: 0.0,
            },
            forces: LocomotionForces::default(),
        }
    }

    /// Set the rigid body type for the character.
    ///
    /// # Example
    ///
    /// ```ignore
    /// // Kinematic character for scripted movement
    /// let bundle = Rapier3dCharacterBundle::new()
    ///     .with_body(RigidBody::KinematicVelocityBased);
    /// ```
    pub fn with_body(mut self, body: RigidBody) -> Self {
        self.rigid_body = body;
        self
    }

    /// Set the damping coefficients for velocity reduction.
    ///
    /// # Arguments
    ///
    /// * `linear` - Linear damping coefficient (default: 0.0)
    /// * `angular` - Angular damping coefficient (default: 0.0)
    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.damping = Damping {
            linear_damping: linear,
            angular_damping: angular,
        };
        self
    }
}
