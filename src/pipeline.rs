//! Per-step wiring of input, locomotion and animation.
//!
//! The three collaborators never reference each other. [`run_fixed_step`]
//! owns the ordering: sample the [`IntentSource`] once, resolve the intent,
//! step the [`LocomotionStepper`], then hand the result to the
//! [`AnimationSink`].

use bevy::prelude::*;

use crate::animation::AnimationSink;
use crate::backend::LocomotionBody;
use crate::config::LocomotionConfig;
use crate::controller::{LocomotionController, LocomotionOutput};
use crate::intent::{IntentResolver, IntentSource, ReferenceFrame};

/// Something that advances locomotion by one fixed step.
pub trait LocomotionStepper {
    /// Advance one step with a world-space intent.
    fn step(&mut self, intent: Vec3, crouch: bool, jump: bool, dt: f32) -> LocomotionOutput;
}

/// A [`LocomotionController`] bound to its config and a physics body for one
/// step.
pub struct ControllerStepper<'a, P: LocomotionBody> {
    pub controller: &'a mut LocomotionController,
    pub config: &'a LocomotionConfig,
    pub body: P,
}

impl<'a, P: LocomotionBody> ControllerStepper<'a, P> {
    /// Bind a controller to a body.
    pub fn new(controller: &'a mut LocomotionController, config: &'a LocomotionConfig, body: P) -> Self {
        Self {
            controller,
            config,
            body,
        }
    }
}

impl<P: LocomotionBody> LocomotionStepper for ControllerStepper<'_, P> {
    fn step(&mut self, intent: Vec3, crouch: bool, jump: bool, dt: f32) -> LocomotionOutput {
        self.controller
            .update(&mut self.body, self.config, dt, intent, crouch, jump)
    }
}

/// Run one fixed step through all collaborators.
///
/// The source is sampled exactly once, so the whole step observes one input
/// snapshot.
pub fn run_fixed_step<S, L, A>(
    source: &mut S,
    resolver: &IntentResolver,
    reference: Option<&ReferenceFrame>,
    stepper: &mut L,
    sink: &mut A,
    dt: f32,
) -> LocomotionOutput
where
    S: IntentSource + ?Sized,
    L: LocomotionStepper + ?Sized,
    A: AnimationSink + ?Sized,
{
    let snapshot = source.sample();
    let intent = resolver.resolve_snapshot(&snapshot, reference);
    let output = stepper.step(intent, snapshot.crouch, snapshot.jump, dt);
    sink.publish(&output, dt);
    output
}
