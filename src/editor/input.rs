//! Bevy systems feeding window input into the annotator.

use bevy::input::mouse::{MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use bevy::window::{CursorIcon, PrimaryWindow, SystemCursorIcon};
use bevy_egui::EguiContexts;

use crate::constants::WHEEL_LINE_PIXELS;

use super::events::{CanvasEvent, KeyOutcome};
use super::params::{CameraParams, is_cursor_over_ui, ui_wants_keyboard};
use super::{Annotator, NavigateRequest};

/// Keep the viewport's idea of the screen in step with the window.
pub fn sync_screen_size(
    window_query: Query<&Window, With<PrimaryWindow>>,
    mut annotator: ResMut<Annotator>,
) {
    let Ok(window) = window_query.single() else {
        return;
    };
    let size = Vec2::new(window.width(), window.height());
    if annotator.viewport().screen_size() != size {
        annotator.set_screen_size(size);
    }
}

pub fn track_pan_modifier(keyboard: Res<ButtonInput<KeyCode>>, mut annotator: ResMut<Annotator>) {
    let changed = keyboard.any_just_pressed([KeyCode::AltLeft, KeyCode::AltRight])
        || keyboard.any_just_released([KeyCode::AltLeft, KeyCode::AltRight]);
    if changed {
        let held = keyboard.any_pressed([KeyCode::AltLeft, KeyCode::AltRight]);
        annotator.set_pan_modifier(held);
    }
}

pub fn handle_pointer(
    mouse_button: Res<ButtonInput<MouseButton>>,
    camera: CameraParams,
    mut contexts: EguiContexts,
    mut annotator: ResMut<Annotator>,
    mut last_cursor: Local<Option<Vec2>>,
) {
    let cursor = camera.cursor_screen_pos();

    if let Some(cursor) = cursor {
        if *last_cursor != Some(cursor) {
            annotator.pointer_move(cursor);
        }
        if !is_cursor_over_ui(&mut contexts) {
            for button in [MouseButton::Left, MouseButton::Right] {
                if mouse_button.just_pressed(button) {
                    annotator.pointer_down(cursor, button);
                }
            }
        }
    }

    // A release outside the window still ends the gesture where it was last seen
    if mouse_button.just_released(MouseButton::Left)
        && let Some(position) = cursor.or(*last_cursor)
        && !annotator.state().is_idle()
    {
        annotator.pointer_up(position);
    }

    if cursor.is_some() {
        *last_cursor = cursor;
    }
}

pub fn handle_wheel(
    mut scroll_events: MessageReader<MouseWheel>,
    camera: CameraParams,
    mut contexts: EguiContexts,
    mut annotator: ResMut<Annotator>,
) {
    let Some(cursor) = camera.cursor_screen_pos() else {
        scroll_events.clear();
        return;
    };
    if is_cursor_over_ui(&mut contexts) {
        scroll_events.clear();
        return;
    }

    for event in scroll_events.read() {
        let pixels = match event.unit {
            MouseScrollUnit::Line => event.y * WHEEL_LINE_PIXELS,
            MouseScrollUnit::Pixel => event.y,
        };
        // Scrolling up zooms in
        annotator.wheel(cursor, -pixels);
    }
}

pub fn handle_keys(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut contexts: EguiContexts,
    mut annotator: ResMut<Annotator>,
    mut navigate_events: MessageWriter<NavigateRequest>,
) {
    if ui_wants_keyboard(&mut contexts) {
        return;
    }
    // Ctrl combinations belong to the document (undo)
    let ctrl = keyboard.pressed(KeyCode::ControlLeft) || keyboard.pressed(KeyCode::ControlRight);
    if ctrl {
        return;
    }

    let pressed: Vec<KeyCode> = keyboard.get_just_pressed().copied().collect();
    for key in pressed {
        if let KeyOutcome::Navigate(direction) = annotator.handle_key(key) {
            navigate_events.write(NavigateRequest(direction));
        }
    }
}

/// Forward queued annotator events as Bevy messages.
pub fn flush_canvas_events(
    mut annotator: ResMut<Annotator>,
    mut canvas_events: MessageWriter<CanvasEvent>,
) {
    for event in annotator.drain_events() {
        canvas_events.write(event);
    }
}

pub fn update_cursor_icon(
    annotator: Res<Annotator>,
    window_query: Query<Entity, With<PrimaryWindow>>,
    mut commands: Commands,
    mut contexts: EguiContexts,
) {
    let Ok(entity) = window_query.single() else {
        return;
    };

    // Use default cursor over UI, the canvas cursor in editor space
    let icon = if is_cursor_over_ui(&mut contexts) && annotator.state().is_idle() {
        SystemCursorIcon::Default
    } else {
        annotator.canvas().cursor()
    };
    commands.entity(entity).insert(CursorIcon::System(icon));
}
