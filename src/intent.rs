//! Movement intent components.
//!
//! Intents represent the desired movement from player input or AI. Input
//! producers write into an [`InputBuffer`]; once per fixed step the buffer is
//! sampled into an [`InputSnapshot`] and the [`IntentResolver`] turns the raw
//! 2D axis into a world-space intent relative to a reference basis (usually
//! the camera).

use bevy::prelude::*;

/// Anything that can hand the controller a consistent input snapshot.
pub trait IntentSource {
    /// Sample the latest input. Called exactly once per fixed step.
    fn sample(&mut self) -> InputSnapshot;
}

/// Input observed by one fixed step.
#[derive(Reflect, Debug, Clone, Copy, Default, PartialEq)]
pub struct InputSnapshot {
    /// Raw movement axis, each component in `[-1, 1]` (x = right, y = forward).
    pub move_axis: Vec2,
    pub crouch: bool,
    pub jump: bool,
    /// Walk modifier (halves the resolved intent).
    pub walk: bool,
}

/// Latest-value input buffer.
///
/// Input producers overwrite values whenever they change; the controller
/// samples the buffer once at the start of each fixed step so the whole step
/// sees one consistent snapshot.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use msg_locomotion::prelude::*;
///
/// let mut input = InputBuffer::default();
/// input.set_move(Vec2::new(0.0, 1.0));
/// input.set_jump(true);
///
/// let snapshot = input.sample();
/// assert_eq!(snapshot.move_axis, Vec2::Y);
/// assert!(snapshot.jump);
///
/// // A deactivated buffer (e.g. while paused) samples as neutral input.
/// input.set_active(false);
/// assert_eq!(input.sample(), InputSnapshot::default());
/// ```
#[derive(Component, Reflect, Debug, Clone, PartialEq)]
#[reflect(Component)]
pub struct InputBuffer {
    latest: InputSnapshot,
    active: bool,
}

impl Default for InputBuffer {
    fn default() -> Self {
        Self {
            latest: InputSnapshot::default(),
            active: true,
        }
    }
}

impl InputBuffer {
    /// Create an active, neutral buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the movement axis. Each component is clamped to `[-1, 1]`.
    pub fn set_move(&mut self, axis: Vec2) {
        self.latest.move_axis = axis.clamp(Vec2::NEG_ONE, Vec2::ONE);
    }

    /// Set whether jump is held.
    pub fn set_jump(&mut self, pressed: bool) {
        self.latest.jump = pressed;
    }

    /// Set whether crouch is held.
    pub fn set_crouch(&mut self, pressed: bool) {
        self.latest.crouch = pressed;
    }

    /// Set whether the walk modifier is held.
    pub fn set_walk(&mut self, pressed: bool) {
        self.latest.walk = pressed;
    }

    /// Enable or disable input, e.g. while the game is paused.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Check if input is enabled.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Latest stored values, regardless of activation.
    pub fn latest(&self) -> InputSnapshot {
        self.latest
    }

    /// Reset every input to neutral.
    pub fn clear(&mut self) {
        self.latest = InputSnapshot::default();
    }
}

impl IntentSource for InputBuffer {
    fn sample(&mut self) -> InputSnapshot {
        if self.active {
            self.latest
        } else {
            InputSnapshot::default()
        }
    }
}

/// Forward/right basis that screen-relative input is expressed in.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct ReferenceFrame {
    pub forward: Vec3,
    pub right: Vec3,
}

impl Default for ReferenceFrame {
    /// World basis (Bevy forward is `-Z`).
    fn default() -> Self {
        Self::WORLD
    }
}

impl ReferenceFrame {
    /// World forward / world right.
    pub const WORLD: Self = Self {
        forward: Vec3::NEG_Z,
        right: Vec3::X,
    };

    /// Create a basis from explicit vectors.
    pub fn new(forward: Vec3, right: Vec3) -> Self {
        Self { forward, right }
    }

    /// Create a basis from a forward vector, deriving a horizontal right.
    pub fn from_forward(forward: Vec3) -> Self {
        Self {
            forward,
            right: forward.cross(Vec3::Y).normalize_or_zero(),
        }
    }

    /// Create a basis from an entity's global transform (usually a camera).
    pub fn from_transform(transform: &GlobalTransform) -> Self {
        Self {
            forward: transform.forward().as_vec3(),
            right: transform.right().as_vec3(),
        }
    }

    /// Forward flattened onto the horizontal plane and normalized.
    ///
    /// A camera looking straight up or down has no horizontal forward; the
    /// right vector is used to recover one. Returns `None` when neither
    /// vector has a horizontal component.
    pub fn flat_forward(&self) -> Option<Vec3> {
        Vec3::new(self.forward.x, 0.0, self.forward.z)
            .try_normalize()
            .or_else(|| {
                Vec3::new(self.right.x, 0.0, self.right.z)
                    .try_normalize()
                    .map(|right| Vec3::Y.cross(right))
            })
    }
}

/// Reference basis for a controlled entity.
///
/// Filled in every step from [`ReferenceCamera`] when present. `None` means
/// world-relative input.
#[derive(Component, Reflect, Debug, Clone, Copy, Default, PartialEq)]
#[reflect(Component)]
pub struct IntentReference {
    pub frame: Option<ReferenceFrame>,
    /// Set once the missing-camera warning has been logged for this entity.
    pub(crate) warned: bool,
}

impl IntentReference {
    /// Create a reference with a fixed basis.
    pub fn fixed(frame: ReferenceFrame) -> Self {
        Self {
            frame: Some(frame),
            warned: false,
        }
    }
}

/// Points a controlled entity at the camera its input is relative to.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq, Eq)]
#[reflect(Component)]
pub struct ReferenceCamera(pub Entity);

/// Converts raw 2D input into a world-space movement intent.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use msg_locomotion::prelude::*;
///
/// let resolver = IntentResolver::default();
///
/// // No reference basis: world-relative, forward is -Z.
/// assert_eq!(resolver.resolve(Vec2::Y, false, None), Vec3::NEG_Z);
///
/// // Walking halves the intent.
/// assert_eq!(resolver.resolve(Vec2::X, true, None), Vec3::new(0.5, 0.0, 0.0));
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
pub struct IntentResolver {
    /// Scale applied while the walk modifier is held.
    pub walk_scale: f32,
}

impl Default for IntentResolver {
    fn default() -> Self {
        Self { walk_scale: 0.5 }
    }
}

impl IntentResolver {
    /// Create a resolver with a custom walk scale.
    pub fn new(walk_scale: f32) -> Self {
        Self { walk_scale }
    }

    /// Resolve a raw axis into a world-space intent.
    ///
    /// A missing or degenerate reference basis falls back to the world basis.
    pub fn resolve(
        &self,
        raw_axis: Vec2,
        walk_modifier_active: bool,
        reference: Option<&ReferenceFrame>,
    ) -> Vec3 {
        let (lateral, forward) = (raw_axis.x, raw_axis.y);

        let (forward_dir, right_dir) = reference
            .and_then(|frame| frame.flat_forward().map(|flat| (flat, frame.right)))
            .unwrap_or((ReferenceFrame::WORLD.forward, ReferenceFrame::WORLD.right));

        let intent = forward_dir * forward + right_dir * lateral;
        if walk_modifier_active {
            intent * self.walk_scale
        } else {
            intent
        }
    }

    /// Resolve a full snapshot.
    pub fn resolve_snapshot(
        &self,
        snapshot: &InputSnapshot,
        reference: Option<&ReferenceFrame>,
    ) -> Vec3 {
        self.resolve(snapshot.move_axis, snapshot.walk, reference)
    }
}
