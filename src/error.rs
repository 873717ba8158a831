//! Error types for controller setup and configuration.
//!
//! Nothing inside a locomotion step can fail: missing ground or headroom hits
//! are state, not errors. These errors only surface while wiring a controller
//! up.

use thiserror::Error;

/// Errors raised while setting up or configuring a locomotion controller.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LocomotionError {
    /// The body's collider is not a capsule.
    #[error("locomotion requires a capsule collider")]
    UnsupportedCollider,

    /// The capsule's segment is not aligned with the vertical axis.
    #[error("capsule segment must be vertical, got direction {0:?}")]
    NonVerticalCapsule([f32; 3]),

    /// A configuration value is out of range.
    #[error("invalid locomotion config `{field}`: {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_config_message_names_field() {
        let err = LocomotionError::InvalidConfig {
            field: "jump_power",
            reason: "must be positive",
        };
        assert_eq!(
            err.to_string(),
            "invalid locomotion config `jump_power`: must be positive"
        );
    }
}
