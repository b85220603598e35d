//! Common SystemParam bundles for editor systems.
//!
//! - [`CameraParams`]: window and camera access for converting window
//!   coordinates to world space
//! - [`is_cursor_over_ui`]: check if the cursor is over egui UI (for input gating)

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_egui::EguiContexts;

use super::EditorCamera;

/// Bundled camera and window queries
#[derive(SystemParam)]
pub struct CameraParams<'w, 's> {
    pub window: Query<'w, 's, &'static Window, With<PrimaryWindow>>,
    pub camera: Query<'w, 's, (&'static Camera, &'static GlobalTransform), With<EditorCamera>>,
}

impl CameraParams<'_, '_> {
    /// Cursor position in window coordinates (origin top-left, y down)
    pub fn cursor_screen_pos(&self) -> Option<Vec2> {
        self.window.single().ok()?.cursor_position()
    }

    /// Map a window position to the world space gizmos and sprites draw in.
    pub fn screen_to_world(&self, screen: Vec2) -> Option<Vec2> {
        let (camera, transform) = self.camera.single().ok()?;
        camera.viewport_to_world_2d(transform, screen).ok()
    }
}

/// Check if the cursor is currently over an egui panel or window
pub fn is_cursor_over_ui(contexts: &mut EguiContexts) -> bool {
    contexts
        .ctx_mut()
        .map(|ctx| ctx.is_pointer_over_area())
        .unwrap_or(false)
}

/// Check if a text field has keyboard focus
pub fn ui_wants_keyboard(contexts: &mut EguiContexts) -> bool {
    contexts
        .ctx_mut()
        .map(|ctx| ctx.wants_keyboard_input())
        .unwrap_or(false)
}
