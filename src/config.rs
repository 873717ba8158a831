//! Controller configuration component.
//!
//! Turn speeds, jump power, ground probing and extra gravity for a
//! locomotion controller.

use bevy::prelude::*;

use crate::error::LocomotionError;

/// Configuration parameters for the locomotion controller.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
pub struct LocomotionConfig {
    // === Turning ===
    /// Extra turn speed when standing still (degrees/second per radian of
    /// turn amount).
    pub stationary_turn_speed: f32,

    /// Extra turn speed at full forward speed.
    pub moving_turn_speed: f32,

    // === Jumping ===
    /// Vertical velocity set when a jump starts (units/second).
    pub jump_power: f32,

    /// Gravity multiplier applied while airborne (1.0 = plain engine gravity).
    pub gravity_multiplier: f32,

    // === Ground probing ===
    /// Length of the ground ray while grounded or falling.
    pub ground_check_distance: f32,

    /// Length of the ground ray while ascending or right after a jump.
    /// Keeps the controller from re-grounding on the way up.
    pub airborne_ground_check_distance: f32,

    /// Height above the reference point where the ground ray starts.
    pub ground_probe_offset: f32,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            // Turning
            stationary_turn_speed: 180.0,
            moving_turn_speed: 360.0,

            // Jumping
            jump_power: 12.0,
            gravity_multiplier: 2.0,

            // Ground probing
            ground_check_distance: 0.1,
            airborne_ground_check_distance: 0.01,
            ground_probe_offset: 0.1,
        }
    }
}

impl LocomotionConfig {
    /// Allowed range for `gravity_multiplier`.
    pub const GRAVITY_MULTIPLIER_RANGE: (f32, f32) = (1.0, 4.0);

    /// Create a config optimized for responsive player control.
    pub fn player() -> Self {
        Self::default()
    }

    /// Create a config for a heavier, slower-turning character.
    pub fn heavy() -> Self {
        Self {
            stationary_turn_speed: 120.0,
            moving_turn_speed: 240.0,
            jump_power: 8.0,
            gravity_multiplier: 3.0,
            ..default()
        }
    }

    /// Builder: set stationary and moving turn speeds.
    pub fn with_turn_speeds(mut self, stationary: f32, moving: f32) -> Self {
        self.stationary_turn_speed = stationary;
        self.moving_turn_speed = moving;
        self
    }

    /// Builder: set jump power.
    pub fn with_jump_power(mut self, power: f32) -> Self {
        self.jump_power = power;
        self
    }

    /// Builder: set airborne gravity multiplier.
    ///
    /// Clamped to [`Self::GRAVITY_MULTIPLIER_RANGE`].
    pub fn with_gravity_multiplier(mut self, multiplier: f32) -> Self {
        let (min, max) = Self::GRAVITY_MULTIPLIER_RANGE;
        self.gravity_multiplier = multiplier.clamp(min, max);
        self
    }

    /// Builder: set ground check distance.
    pub fn with_ground_check_distance(mut self, distance: f32) -> Self {
        self.ground_check_distance = distance;
        self
    }

    /// Builder: set the ground ray start offset.
    pub fn with_ground_probe_offset(mut self, offset: f32) -> Self {
        self.ground_probe_offset = offset;
        self
    }

    /// Extra force added while airborne, on top of the gravity the engine
    /// already applies: `gravity * (gravity_multiplier - 1)`.
    ///
    /// The force is not mass-scaled, so the resulting acceleration only
    /// equals `gravity * gravity_multiplier` for a unit-mass body.
    #[inline]
    pub fn extra_gravity(&self, gravity: Vec3) -> Vec3 {
        gravity * self.gravity_multiplier - gravity
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> Result<(), LocomotionError> {
        let (min, max) = Self::GRAVITY_MULTIPLIER_RANGE;
        if !(min..=max).contains(&self.gravity_multiplier) {
            return Err(LocomotionError::InvalidConfig {
                field: "gravity_multiplier",
                reason: "must be within [1, 4]",
            });
        }
        if !(self.jump_power.is_finite() && self.jump_power >= 0.0) {
            return Err(LocomotionError::InvalidConfig {
                field: "jump_power",
                reason: "must be finite and non-negative",
            });
        }
        if !(self.ground_check_distance > 0.0) {
            return Err(LocomotionError::InvalidConfig {
                field: "ground_check_distance",
                reason: "must be positive",
            });
        }
        if !(self.airborne_ground_check_distance > 0.0
            && self.airborne_ground_check_distance <= self.ground_check_distance)
        {
            return Err(LocomotionError::InvalidConfig {
                field: "airborne_ground_check_distance",
                reason: "must be positive and at most ground_check_distance",
            });
        }
        if self.ground_probe_offset < 0.0 {
            return Err(LocomotionError::InvalidConfig {
                field: "ground_probe_offset",
                reason: "must not be negative",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(LocomotionConfig::default().validate().is_ok());
        assert!(LocomotionConfig::heavy().validate().is_ok());
    }

    #[test]
    fn default_tuning() {
        let config = LocomotionConfig::default();
        assert_eq!(config.stationary_turn_speed, 180.0);
        assert_eq!(config.moving_turn_speed, 360.0);
        assert_eq!(config.jump_power, 12.0);
        assert_eq!(config.ground_check_distance, 0.1);
        assert_eq!(config.gravity_multiplier, 2.0);
    }

    #[test]
    fn extra_gravity_only_adds_excess() {
        let config = LocomotionConfig::default();
        let gravity = Vec3::new(0.0, -9.81, 0.0);
        assert_eq!(config.extra_gravity(gravity), gravity);

        let neutral = config.with_gravity_multiplier(1.0);
        assert_eq!(neutral.extra_gravity(gravity), Vec3::ZERO);
    }

    #[test]
    fn gravity_multiplier_builder_clamps() {
        let config = LocomotionConfig::default().with_gravity_multiplier(10.0);
        assert_eq!(config.gravity_multiplier, 4.0);
    }

    #[test]
    fn validate_rejects_out_of_range_multiplier() {
        let config = LocomotionConfig {
            gravity_multiplier: 0.5,
            ..default()
        };
        assert!(matches!(
            config.validate(),
            Err(LocomotionError::InvalidConfig {
                field: "gravity_multiplier",
                ..
            })
        ));
    }

    #[test]
    fn validate_rejects_airborne_distance_above_ground_distance() {
        let config = LocomotionConfig::default().with_ground_check_distance(0.005);
        assert!(config.validate().is_err());
    }
}
