//! Backend-agnostic controller systems.
//!
//! These systems run around the backend's step: resolving each character's
//! reference basis before the step, and mirroring controller state into
//! marker components after it.

use bevy::prelude::*;

use crate::controller::LocomotionController;
use crate::intent::{IntentReference, ReferenceCamera, ReferenceFrame};
use crate::state::{Airborne, Crouching, Grounded};

/// Refresh each character's reference basis from its camera.
///
/// Characters without a [`ReferenceCamera`] keep whatever basis was set on
/// their [`IntentReference`]. When no basis is available the character moves
/// world-relative and a warning is logged once.
pub fn update_intent_references(
    mut q_characters: Query<(Entity, &mut IntentReference, Option<&ReferenceCamera>)>,
    q_cameras: Query<&GlobalTransform>,
) {
    for (entity, mut reference, camera) in &mut q_characters {
        if let Some(&ReferenceCamera(camera)) = camera {
            reference.frame = q_cameras
                .get(camera)
                .ok()
                .map(ReferenceFrame::from_transform);
        }

        if reference.frame.is_some() {
            reference.warned = false;
        } else if !reference.warned {
            warn!(
                "{entity}: no reference camera available, using world-relative movement"
            );
            reference.warned = true;
        }
    }
}

/// Sync state marker components from the controller's last step.
pub fn sync_state_markers(
    mut commands: Commands,
    q_controllers: Query<(
        Entity,
        &LocomotionController,
        Has<Grounded>,
        Has<Airborne>,
        Has<Crouching>,
    )>,
) {
    for (entity, controller, has_grounded, has_airborne, has_crouching) in &q_controllers {
        if !controller.is_set_up() {
            continue;
        }

        // Sync Grounded/Airborne
        if controller.is_grounded() {
            if !has_grounded {
                commands.entity(entity).insert(Grounded);
            }
            if has_airborne {
                commands.entity(entity).remove::<Airborne>();
            }
        } else {
            if has_grounded {
                commands.entity(entity).remove::<Grounded>();
            }
            if !has_airborne {
                commands.entity(entity).insert(Airborne);
            }
        }

        // Sync Crouching
        if controller.is_crouching() && !has_crouching {
            commands.entity(entity).insert(Crouching);
        } else if !controller.is_crouching() && has_crouching {
            commands.entity(entity).remove::<Crouching>();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capsule::CapsuleShape;
    use crate::config::LocomotionConfig;

    fn create_test_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_systems(Update, (update_intent_references, sync_state_markers));
        app
    }

    fn set_up_controller() -> LocomotionController {
        LocomotionController::with_capsule(
            CapsuleShape::standing(1.8, 0.3),
            &LocomotionConfig::default(),
        )
    }

    #[test]
    fn reference_follows_camera_transform() {
        let mut app = create_test_app();

        let camera = app
            .world_mut()
            .spawn(GlobalTransform::from(
                Transform::from_xyz(0.0, 2.0, 0.0).looking_at(Vec3::new(10.0, 2.0, 0.0), Vec3::Y),
            ))
            .id();
        let character = app
            .world_mut()
            .spawn((IntentReference::default(), ReferenceCamera(camera)))
            .id();

        app.update();

        let reference = app.world().get::<IntentReference>(character).unwrap();
        let frame = reference.frame.expect("camera basis should be resolved");
        assert!((frame.forward - Vec3::X).length() < 1e-5);
        assert!(!reference.warned);
    }

    #[test]
    fn missing_camera_warns_once_and_falls_back() {
        let mut app = create_test_app();

        let camera = app.world_mut().spawn_empty().id();
        let character = app
            .world_mut()
            .spawn((IntentReference::default(), ReferenceCamera(camera)))
            .id();

        app.update();
        let reference = app.world().get::<IntentReference>(character).unwrap();
        assert!(reference.frame.is_none());
        assert!(reference.warned);

        // Camera gains a transform: basis resolves and the warning re-arms.
        app.world_mut()
            .entity_mut(camera)
            .insert(GlobalTransform::IDENTITY);
        app.update();
        let reference = app.world().get::<IntentReference>(character).unwrap();
        assert!(reference.frame.is_some());
        assert!(!reference.warned);
    }

    #[test]
    fn fixed_reference_is_left_alone() {
        let mut app = create_test_app();

        let frame = ReferenceFrame::from_forward(Vec3::X);
        let character = app.world_mut().spawn(IntentReference::fixed(frame)).id();

        app.update();

        let reference = app.world().get::<IntentReference>(character).unwrap();
        assert_eq!(reference.frame, Some(frame));
    }

    #[test]
    fn markers_follow_controller_state() {
        let mut app = create_test_app();

        let mut controller = set_up_controller();
        controller.ground.is_grounded = true;
        let entity = app.world_mut().spawn(controller).id();

        app.update();
        assert!(app.world().get::<Grounded>(entity).is_some());
        assert!(app.world().get::<Airborne>(entity).is_none());
        assert!(app.world().get::<Crouching>(entity).is_none());

        app.world_mut()
            .get_mut::<LocomotionController>(entity)
            .unwrap()
            .ground
            .is_grounded = false;
        app.update();
        assert!(app.world().get::<Grounded>(entity).is_none());
        assert!(app.world().get::<Airborne>(entity).is_some());
    }

    #[test]
    fn markers_skip_controllers_without_setup() {
        let mut app = create_test_app();
        let entity = app.world_mut().spawn(LocomotionController::new()).id();

        app.update();

        assert!(app.world().get::<Grounded>(entity).is_none());
        assert!(app.world().get::<Airborne>(entity).is_none());
    }
}
