use bevy::prelude::*;

/// The single 2D camera. It never moves; pan and zoom live in the
/// annotator's view transform.
#[derive(Component)]
pub struct EditorCamera;

pub fn spawn_camera(mut commands: Commands) {
    commands.spawn((
        Camera2d,
        EditorCamera,
        Transform::from_translation(Vec3::new(0.0, 0.0, 1000.0)),
    ));
}
