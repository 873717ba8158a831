//! Animation parameter output.
//!
//! The controller does not play animations. It hands every step's
//! [`LocomotionOutput`] to an [`AnimationSink`]; the default sink,
//! [`AnimationParameters`], turns it into the blend values an animation graph
//! reads (forward, turn, crouch, on-ground, jump, jump leg, playback speed).

use bevy::prelude::*;

use crate::controller::LocomotionOutput;

/// Consumer of per-step locomotion output.
pub trait AnimationSink {
    /// Receive the output of one fixed step of length `dt`.
    fn publish(&mut self, output: &LocomotionOutput, dt: f32);
}

/// Discards all output.
impl AnimationSink for () {
    fn publish(&mut self, _output: &LocomotionOutput, _dt: f32) {}
}

impl<T: AnimationSink + ?Sized> AnimationSink for &mut T {
    fn publish(&mut self, output: &LocomotionOutput, dt: f32) {
        (**self).publish(output, dt);
    }
}

/// Publishes only when a sink is present.
impl<T: AnimationSink> AnimationSink for Option<T> {
    fn publish(&mut self, output: &LocomotionOutput, dt: f32) {
        if let Some(sink) = self {
            sink.publish(output, dt);
        }
    }
}

/// Blend parameters for an animation graph.
///
/// `forward` and `turn` ease toward their targets with a `damp_time` time
/// constant; the rest follow the controller directly.
///
/// The playback layer reports the current locomotion clip phase through
/// [`set_clip_phase`](Self::set_clip_phase) so the trailing leg for a jump
/// can be picked.
#[derive(Component, Reflect, Debug, Clone, PartialEq)]
#[reflect(Component)]
pub struct AnimationParameters {
    // === Outputs ===
    pub forward: f32,
    pub turn: f32,
    pub crouch: bool,
    pub on_ground: bool,
    /// Vertical velocity, only updated while airborne.
    pub jump: f32,
    /// Which leg trails (+1 / -1), scaled by forward. Only updated while grounded.
    pub jump_leg: f32,
    /// Playback speed for the animation graph.
    pub speed: f32,

    // === Inputs from playback ===
    /// Normalized time of the current locomotion clip.
    pub clip_phase: f32,

    // === Tuning ===
    /// Time constant for easing `forward` and `turn`, in seconds.
    pub damp_time: f32,
    /// Playback speed while grounded and moving.
    pub speed_multiplier: f32,
    /// Clip phase offset at which the legs cross (rig specific).
    pub run_cycle_leg_offset: f32,
}

impl Default for AnimationParameters {
    fn default() -> Self {
        Self {
            forward: 0.0,
            turn: 0.0,
            crouch: false,
            on_ground: false,
            jump: 0.0,
            jump_leg: 0.0,
            speed: 1.0,
            clip_phase: 0.0,
            damp_time: 0.1,
            speed_multiplier: 1.0,
            run_cycle_leg_offset: 0.2,
        }
    }
}

impl AnimationParameters {
    /// Create parameters with default tuning.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set the easing time constant.
    pub fn with_damp_time(mut self, damp_time: f32) -> Self {
        self.damp_time = damp_time;
        self
    }

    /// Builder: set the grounded playback speed.
    pub fn with_speed_multiplier(mut self, multiplier: f32) -> Self {
        self.speed_multiplier = multiplier;
        self
    }

    /// Builder: set the rig's leg crossing offset.
    pub fn with_run_cycle_leg_offset(mut self, offset: f32) -> Self {
        self.run_cycle_leg_offset = offset;
        self
    }

    /// Report the normalized time of the playing locomotion clip.
    pub fn set_clip_phase(&mut self, normalized_time: f32) {
        self.clip_phase = normalized_time;
    }
}

impl AnimationSink for AnimationParameters {
    fn publish(&mut self, output: &LocomotionOutput, dt: f32) {
        let blend = damp_factor(self.damp_time, dt);
        self.forward += (output.forward_speed - self.forward) * blend;
        self.turn += (output.turn_rate - self.turn) * blend;
        self.crouch = output.crouching;
        self.on_ground = output.grounded;

        if output.grounded {
            self.jump_leg = jump_leg(
                self.clip_phase,
                self.run_cycle_leg_offset,
                output.move_vector.z,
            );
        } else {
            self.jump = output.vertical_speed;
        }

        self.speed = if output.grounded && output.move_vector.length_squared() > 0.0 {
            self.speed_multiplier
        } else {
            1.0
        };
    }
}

/// Fraction of the remaining distance covered in one step.
#[inline]
fn damp_factor(damp_time: f32, dt: f32) -> f32 {
    if damp_time <= 0.0 {
        1.0
    } else {
        1.0 - (-dt / damp_time).exp()
    }
}

/// Pick the trailing leg for a jump from the run cycle phase.
///
/// Assumes the legs cross at normalized times 0.0 and 0.5 after applying the
/// rig's offset.
pub fn jump_leg(clip_phase: f32, leg_offset: f32, forward: f32) -> f32 {
    let cycle = (clip_phase + leg_offset).rem_euclid(1.0);
    let side = if cycle < 0.5 { 1.0 } else { -1.0 };
    side * forward
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn grounded(forward: f32, turn: f32) -> LocomotionOutput {
        LocomotionOutput {
            forward_speed: forward,
            turn_rate: turn,
            grounded: true,
            crouching: false,
            move_vector: Vec3::new(0.0, 0.0, forward),
            vertical_speed: 0.0,
        }
    }

    #[test]
    fn forward_and_turn_ease_toward_target() {
        let mut params = AnimationParameters::new();

        params.publish(&grounded(1.0, 0.5), DT);
        assert!(params.forward > 0.0 && params.forward < 1.0);
        assert!(params.turn > 0.0 && params.turn < 0.5);

        for _ in 0..120 {
            params.publish(&grounded(1.0, 0.5), DT);
        }
        assert!((params.forward - 1.0).abs() < 1e-3);
        assert!((params.turn - 0.5).abs() < 1e-3);
    }

    #[test]
    fn zero_damp_time_is_immediate() {
        let mut params = AnimationParameters::new().with_damp_time(0.0);
        params.publish(&grounded(0.7, -0.3), DT);
        assert_eq!(params.forward, 0.7);
        assert_eq!(params.turn, -0.3);
    }

    #[test]
    fn jump_tracks_vertical_speed_only_in_air() {
        let mut params = AnimationParameters::new();
        let airborne = LocomotionOutput {
            vertical_speed: 4.5,
            ..default()
        };

        params.publish(&airborne, DT);
        assert_eq!(params.jump, 4.5);
        assert!(!params.on_ground);

        params.publish(&grounded(0.0, 0.0), DT);
        assert_eq!(params.jump, 4.5);
        assert!(params.on_ground);
    }

    #[test]
    fn jump_leg_follows_clip_phase() {
        assert_eq!(jump_leg(0.0, 0.2, 1.0), 1.0);
        assert_eq!(jump_leg(0.4, 0.2, 1.0), -1.0);
        assert_eq!(jump_leg(0.9, 0.2, 1.0), 1.0);
        assert_eq!(jump_leg(0.4, 0.2, 0.5), -0.5);
    }

    #[test]
    fn jump_leg_only_updates_when_grounded() {
        let mut params = AnimationParameters::new();
        params.set_clip_phase(0.4);
        params.publish(&grounded(1.0, 0.0), DT);
        assert_eq!(params.jump_leg, -1.0);

        params.set_clip_phase(0.0);
        params.publish(&LocomotionOutput::default(), DT);
        assert_eq!(params.jump_leg, -1.0);
    }

    #[test]
    fn speed_multiplier_only_while_moving_on_ground() {
        let mut params = AnimationParameters::new().with_speed_multiplier(1.5);

        params.publish(&grounded(1.0, 0.0), DT);
        assert_eq!(params.speed, 1.5);

        params.publish(&grounded(0.0, 0.0), DT);
        assert_eq!(params.speed, 1.0);

        let airborne = LocomotionOutput {
            move_vector: Vec3::Z,
            ..default()
        };
        params.publish(&airborne, DT);
        assert_eq!(params.speed, 1.0);
    }

    #[test]
    fn crouch_passes_through() {
        let mut params = AnimationParameters::new();
        let output = LocomotionOutput {
            crouching: true,
            grounded: true,
            ..default()
        };
        params.publish(&output, DT);
        assert!(params.crouch);
    }

    #[test]
    fn unit_sink_accepts_output() {
        ().publish(&grounded(1.0, 0.0), DT);
    }

    #[test]
    fn optional_sink_publishes_when_present() {
        let mut params = AnimationParameters::new().with_damp_time(0.0);
        Some(&mut params).publish(&grounded(0.8, 0.0), DT);
        assert_eq!(params.forward, 0.8);

        let mut missing: Option<&mut AnimationParameters> = None;
        missing.publish(&grounded(0.8, 0.0), DT);
    }
}
