//! # `msg_locomotion`
//!
//! A third-person rigidbody locomotion controller for Bevy with a physics
//! backend abstraction.
//!
//! This crate turns a 2D movement input, interpreted relative to a camera,
//! into locomotion for a physics-driven capsule character:
//! - Camera-relative intent resolution with a walk modifier
//! - Raycast ground detection with ground-plane projection of the intent
//! - Heading-relative turn and forward amounts that drive extra turning
//! - Jumping, heavier-than-world gravity while airborne
//! - Crouching that halves the capsule, with a ceiling check before standing
//! - Animation parameter output (forward, turn, crouch, jump, jump leg)
//! - Abstracts physics backend for easy swapping (Rapier3D included)
//!
//! ## Architecture
//!
//! Every fixed step runs one pass of the locomotion pipeline per character:
//! 1. The [`InputBuffer`](intent::InputBuffer) is sampled once
//! 2. The raw axis is resolved into a world-space intent
//! 3. The [`LocomotionController`](controller::LocomotionController) steps
//!    the body through a [`LocomotionBody`](backend::LocomotionBody)
//! 4. The step's output is published to an
//!    [`AnimationSink`](animation::AnimationSink)
//!
//! ## Usage
//!
//! ```rust
//! use bevy::prelude::*;
//! use msg_locomotion::prelude::*;
//!
//! // Create controller components for a character
//! let controller = LocomotionController::new();
//! let config = LocomotionConfig::player();
//! let input = InputBuffer::default();
//!
//! // These can be spawned with a physics bundle; the backend captures the
//! // capsule from the collider on the first step.
//! ```

use bevy::prelude::*;

pub mod animation;
pub mod backend;
pub mod capsule;
pub mod collision;
pub mod config;
pub mod controller;
pub mod error;
pub mod intent;
pub mod math;
pub mod pipeline;
pub mod state;
pub mod systems;

#[cfg(feature = "rapier3d")]
pub mod rapier;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::animation::{AnimationParameters, AnimationSink};
    pub use crate::backend::{LocomotionBackend, LocomotionBody};
    pub use crate::capsule::CapsuleShape;
    pub use crate::collision::CollisionData;
    pub use crate::config::LocomotionConfig;
    pub use crate::controller::{LocomotionController, LocomotionOutput};
    pub use crate::error::LocomotionError;
    pub use crate::intent::{
        InputBuffer, InputSnapshot, IntentReference, IntentResolver, IntentSource,
        ReferenceCamera, ReferenceFrame,
    };
    pub use crate::pipeline::{run_fixed_step, ControllerStepper, LocomotionStepper};
    pub use crate::state::{Airborne, Crouching, Grounded};
    pub use crate::{LocomotionBundle, LocomotionPlugin, LocomotionSet};

    #[cfg(feature = "rapier3d")]
    pub use crate::rapier::{Rapier3dBackend, Rapier3dCharacterBundle};
}

/// System sets for the locomotion pipeline, run in order in `FixedUpdate`.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocomotionSet {
    /// Backend setup and clearing of last step's forces.
    Preparation,
    /// Reference basis resolution.
    Input,
    /// The locomotion step itself.
    Step,
    /// Writing accumulated forces to the physics engine.
    FinalApplication,
    /// Marker component sync.
    Sync,
}

/// Core components for a locomotion character.
///
/// Physics components come from the backend's bundle.
#[derive(Bundle, Default)]
pub struct LocomotionBundle {
    pub controller: controller::LocomotionController,
    pub config: config::LocomotionConfig,
    pub input: intent::InputBuffer,
    pub reference: intent::IntentReference,
    pub resolver: intent::IntentResolver,
    pub animation: animation::AnimationParameters,
}

impl LocomotionBundle {
    /// Create a bundle with the given config.
    pub fn new(config: config::LocomotionConfig) -> Self {
        Self {
            config,
            ..default()
        }
    }

    /// Move relative to a camera entity.
    pub fn with_camera(self, camera: Entity) -> (Self, intent::ReferenceCamera) {
        (self, intent::ReferenceCamera(camera))
    }
}

/// Main plugin for the locomotion controller.
///
/// This plugin is generic over a physics backend `B` which provides the
/// stepping systems (queries, force application, collider writes).
///
/// # Type Parameters
/// - `B`: The physics backend implementation (e.g., `Rapier3dBackend`)
///
/// # Examples
///
/// With Rapier3D backend:
/// ```rust,ignore
/// use bevy::prelude::*;
/// use bevy_rapier3d::prelude::*;
/// use msg_locomotion::prelude::*;
///
/// App::new()
///     .add_plugins(DefaultPlugins)
///     .add_plugins(RapierPhysicsPlugin::<NoUserData>::default())
///     .add_plugins(LocomotionPlugin::<Rapier3dBackend>::default())
///     .run();
/// ```
pub struct LocomotionPlugin<B: backend::LocomotionBackend> {
    _marker: std::marker::PhantomData<B>,
}

impl<B: backend::LocomotionBackend> Default for LocomotionPlugin<B> {
    fn default() -> Self {
        Self {
            _marker: std::marker::PhantomData,
        }
    }
}

impl<B: backend::LocomotionBackend> Plugin for LocomotionPlugin<B> {
    fn build(&self, app: &mut App) {
        // Register core types
        app.register_type::<controller::LocomotionController>();
        app.register_type::<config::LocomotionConfig>();
        app.register_type::<intent::InputBuffer>();
        app.register_type::<intent::IntentReference>();
        app.register_type::<intent::IntentResolver>();
        app.register_type::<intent::ReferenceCamera>();
        app.register_type::<animation::AnimationParameters>();
        app.register_type::<state::Grounded>();
        app.register_type::<state::Airborne>();
        app.register_type::<state::Crouching>();

        app.configure_sets(
            FixedUpdate,
            (
                LocomotionSet::Preparation,
                LocomotionSet::Input,
                LocomotionSet::Step,
                LocomotionSet::FinalApplication,
                LocomotionSet::Sync,
            )
                .chain(),
        );

        // Add the physics backend plugin
        app.add_plugins(B::plugin());

        app.add_systems(
            FixedUpdate,
            systems::update_intent_references.in_set(LocomotionSet::Input),
        );
        app.add_systems(
            FixedUpdate,
            systems::sync_state_markers.in_set(LocomotionSet::Sync),
        );
    }
}
