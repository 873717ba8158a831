//! State marker components.
//!
//! These components mirror the controller's state after each fixed step so
//! gameplay systems can filter on them with `With<Grounded>` and friends
//! instead of reading the controller. They are added and removed by
//! [`sync_state_markers`](crate::systems::sync_state_markers).

use bevy::prelude::*;

/// Marker component indicating the character is grounded.
///
/// Present whenever the last ground probe found a surface.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use msg_locomotion::prelude::*;
///
/// // Grounded is a marker component - just use it in queries
/// fn check_grounded(grounded: Option<&Grounded>) -> bool {
///     grounded.is_some()
/// }
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Grounded;

/// Marker component indicating the character is airborne.
///
/// Mutually exclusive with [`Grounded`].
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Airborne;

/// Marker component indicating the character's capsule is crouch-sized.
///
/// Stays present while a low ceiling holds the character down, even if the
/// crouch input has been released.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Crouching;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markers_are_default() {
        let _ = Grounded::default();
        let _ = Airborne::default();
        let _ = Crouching::default();
    }

    #[test]
    fn markers_can_be_queried() {
        let mut world = World::new();
        let grounded = world.spawn((Grounded, Crouching)).id();
        let airborne = world.spawn(Airborne).id();

        let mut query = world.query_filtered::<Entity, With<Grounded>>();
        let found: Vec<Entity> = query.iter(&world).collect();
        assert_eq!(found, vec![grounded]);

        let mut query = world.query_filtered::<Entity, (With<Airborne>, Without<Crouching>)>();
        let found: Vec<Entity> = query.iter(&world).collect();
        assert_eq!(found, vec![airborne]);
    }
}
