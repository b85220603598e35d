//! Gesture scenarios for the annotation editor, run against the in-memory canvas.

use bevy::prelude::*;
use bevy::window::SystemCursorIcon;
use uuid::Uuid;

use super::AnnotationEditor;
use crate::constants::{DIMMED_OPACITY, EMPHASIZED_OPACITY, FULL_OPACITY};
use crate::editor::canvas::CanvasSurface;
use crate::editor::events::{CanvasEvent, KeyOutcome, PageNavigation};
use crate::editor::interaction::InteractionState;
use crate::model::{AnnotationItem, RegionType, Role};

fn new_editor() -> AnnotationEditor {
    AnnotationEditor::default()
}

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-3
}

fn region(region: RegionType, id: u32, a: Vec2, b: Vec2) -> AnnotationItem {
    AnnotationItem::new(region, id, Role::Body, a, b)
}

fn drag(editor: &mut AnnotationEditor, from: Vec2, to: Vec2) {
    editor.pointer_down(from, MouseButton::Left);
    editor.pointer_move((from + to) / 2.0);
    editor.pointer_move(to);
    editor.pointer_up(to);
}

fn frame_opacity(editor: &AnnotationEditor, uuid: Uuid) -> (f32, bool) {
    let handle = editor.registry().find_by_uuid(uuid).unwrap().frame;
    let frame = editor.canvas().get(handle).unwrap();
    (frame.opacity, frame.interactive)
}

#[test]
fn test_draw_figure_creates_item_and_advances_to_caption() {
    let mut editor = new_editor();
    editor.set_mode(Some(RegionType::Figure));
    assert_eq!(editor.tools().pending_id(), 1);
    assert_eq!(editor.tools().pending_role(), Role::Body);

    drag(&mut editor, Vec2::new(10.0, 10.0), Vec2::new(50.0, 40.0));

    let events = editor.drain_events();
    assert_eq!(events.len(), 1);
    let CanvasEvent::Created(item) = &events[0] else {
        panic!("expected a created event, got {:?}", events[0]);
    };
    assert_eq!(item.region, RegionType::Figure);
    assert_eq!(item.id, 1);
    assert_eq!(item.role, Role::Body);
    assert_eq!(item.rect, [10.0, 10.0, 50.0, 40.0]);
    assert!(editor.registry().find_by_uuid(item.uuid).is_some());

    assert_eq!(editor.tools().pending_id(), 1);
    assert_eq!(editor.tools().pending_role(), Role::Caption);
    assert!(editor.state().is_idle());
    assert!(editor.drain_events().is_empty());
}

#[test]
fn test_drawing_backwards_is_normalized() {
    let mut editor = new_editor();
    editor.set_mode(Some(RegionType::Equation));

    drag(&mut editor, Vec2::new(50.0, 40.0), Vec2::new(10.0, 10.0));

    let events = editor.drain_events();
    let Some(CanvasEvent::Created(item)) = events.first() else {
        panic!("expected a created event");
    };
    assert_eq!(item.rect, [10.0, 10.0, 50.0, 40.0]);
    assert_eq!(editor.tools().pending_id(), 2);
    assert_eq!(editor.tools().pending_role(), Role::Body);
}

#[test]
fn test_preview_is_volatile() {
    let mut editor = new_editor();
    editor.set_mode(Some(RegionType::Table));

    editor.pointer_down(Vec2::new(10.0, 10.0), MouseButton::Left);
    editor.pointer_move(Vec2::new(30.0, 40.0));

    let InteractionState::Drawing { preview, .. } = editor.state().clone() else {
        panic!("expected drawing state");
    };
    let shape = editor.canvas().get(preview).unwrap();
    assert!(shape.dashed);
    assert!(!shape.interactive);
    assert_eq!(shape.size, Vec2::new(20.0, 30.0));
    assert_eq!(editor.canvas().hit_test(Vec2::new(20.0, 20.0)), None);

    editor.pointer_up(Vec2::new(30.0, 40.0));
    assert!(editor.canvas().get(preview).is_none());
}

#[test]
fn test_tiny_drag_is_discarded() {
    let mut editor = new_editor();
    editor.set_mode(Some(RegionType::Figure));

    drag(&mut editor, Vec2::new(10.0, 10.0), Vec2::new(14.0, 100.0));
    drag(&mut editor, Vec2::new(10.0, 10.0), Vec2::new(100.0, 14.9));

    assert!(editor.drain_events().is_empty());
    assert!(editor.registry().is_empty());
    assert!(editor.canvas().is_empty());
    assert_eq!(editor.tools().pending_role(), Role::Body);
}

#[test]
fn test_drag_without_tool_draws_nothing() {
    let mut editor = new_editor();

    drag(&mut editor, Vec2::new(10.0, 10.0), Vec2::new(100.0, 100.0));

    assert!(editor.drain_events().is_empty());
    assert!(editor.canvas().is_empty());
}

#[test]
fn test_uuid_selection_survives_id_collision() {
    let mut editor = new_editor();
    editor.set_screen_size(Vec2::new(800.0, 600.0));
    let first = region(RegionType::Figure, 1, Vec2::ZERO, Vec2::splat(20.0));
    let second = region(
        RegionType::Figure,
        2,
        Vec2::new(100.0, 100.0),
        Vec2::new(140.0, 160.0),
    );
    editor.render_all(&[first.clone(), second.clone()]);

    assert!(editor.update_identity(first.uuid, 2, Role::Body));
    let events = editor.drain_events();
    assert!(matches!(&events[..], [CanvasEvent::Modified(item)] if item.id == 2));

    assert!(editor.select_by_uuid(second.uuid));
    assert_eq!(editor.selected_uuid(), Some(second.uuid));
    assert_eq!(editor.selected().unwrap().rect, second.rect);
    let center = editor.viewport().to_screen(second.center());
    assert!(approx(center.x, 400.0) && approx(center.y, 300.0));

    assert!(editor.select_by_uuid(first.uuid));
    assert_eq!(editor.selected().unwrap().rect, first.rect);
}

#[test]
fn test_select_unknown_uuid_is_noop() {
    let mut editor = new_editor();
    assert!(!editor.select_by_uuid(Uuid::new_v4()));
    assert!(editor.selected_uuid().is_none());
    assert!(editor.drain_events().is_empty());
}

#[test]
fn test_mode_switch_dims_other_types() {
    let mut editor = new_editor();
    let figure = region(RegionType::Figure, 1, Vec2::ZERO, Vec2::splat(20.0));
    let selected = region(RegionType::Figure, 2, Vec2::splat(50.0), Vec2::splat(80.0));
    let table = region(RegionType::Table, 1, Vec2::splat(100.0), Vec2::splat(150.0));
    editor.render_all(&[figure.clone(), selected.clone(), table.clone()]);

    editor.set_mode(Some(RegionType::Figure));
    editor.select_by_uuid(selected.uuid);

    assert_eq!(frame_opacity(&editor, figure.uuid), (EMPHASIZED_OPACITY, true));
    assert_eq!(frame_opacity(&editor, selected.uuid), (FULL_OPACITY, true));
    assert_eq!(frame_opacity(&editor, table.uuid), (DIMMED_OPACITY, false));

    // Switching away drops the now non-interactive selection
    editor.set_mode(Some(RegionType::Table));
    assert!(editor.selected_uuid().is_none());
    assert_eq!(frame_opacity(&editor, selected.uuid), (DIMMED_OPACITY, false));
    assert_eq!(frame_opacity(&editor, table.uuid), (EMPHASIZED_OPACITY, true));

    editor.set_mode(None);
    for uuid in [figure.uuid, selected.uuid, table.uuid] {
        assert_eq!(frame_opacity(&editor, uuid), (FULL_OPACITY, true));
    }
}

#[test]
fn test_dimmed_regions_cannot_be_selected() {
    let mut editor = new_editor();
    let table = region(RegionType::Table, 1, Vec2::ZERO, Vec2::splat(50.0));
    editor.render_all(&[table]);
    editor.set_mode(Some(RegionType::Figure));

    // Falls through to drawing a figure over the table
    drag(&mut editor, Vec2::new(10.0, 10.0), Vec2::new(40.0, 40.0));

    let events = editor.drain_events();
    assert!(matches!(&events[..], [CanvasEvent::Created(item)] if item.region == RegionType::Figure));
}

#[test]
fn test_secondary_click_deletes_active_type_only() {
    let mut editor = new_editor();
    let table = region(RegionType::Table, 1, Vec2::ZERO, Vec2::splat(50.0));
    editor.render_all(&[table.clone()]);

    // No tool: right click does nothing
    editor.pointer_down(Vec2::splat(25.0), MouseButton::Right);
    assert!(editor.drain_events().is_empty());

    editor.set_mode(Some(RegionType::Table));
    editor.pointer_down(Vec2::splat(25.0), MouseButton::Right);

    let events = editor.drain_events();
    assert!(matches!(&events[..], [CanvasEvent::Removed(item)] if item.uuid == table.uuid));
    assert!(editor.registry().is_empty());
    assert!(editor.canvas().is_empty());
    assert!(editor.state().is_idle());
}

#[test]
fn test_click_selects_without_drawing() {
    let mut editor = new_editor();
    let figure = region(RegionType::Figure, 1, Vec2::ZERO, Vec2::splat(50.0));
    editor.render_all(&[figure.clone()]);
    editor.set_mode(Some(RegionType::Figure));

    editor.pointer_down(Vec2::splat(25.0), MouseButton::Left);
    editor.pointer_up(Vec2::splat(25.0));

    let events = editor.drain_events();
    assert_eq!(events, vec![CanvasEvent::SelectionChanged(Some(figure.clone()))]);
    assert_eq!(editor.registry().len(), 1);

    // Clicking empty space clears it again
    editor.pointer_down(Vec2::splat(300.0), MouseButton::Left);
    editor.pointer_up(Vec2::splat(301.0));
    assert_eq!(editor.drain_events(), vec![CanvasEvent::SelectionChanged(None)]);
}

#[test]
fn test_move_gesture_commits_modified() {
    let mut editor = new_editor();
    let figure = region(RegionType::Figure, 1, Vec2::new(10.0, 10.0), Vec2::new(50.0, 40.0));
    editor.render_all(&[figure.clone()]);

    drag(&mut editor, Vec2::new(30.0, 25.0), Vec2::new(40.0, 35.0));

    let events = editor.drain_events();
    assert_eq!(events.len(), 2);
    assert!(matches!(&events[0], CanvasEvent::SelectionChanged(Some(_))));
    let CanvasEvent::Modified(item) = &events[1] else {
        panic!("expected modified, got {:?}", events[1]);
    };
    assert_eq!(item.uuid, figure.uuid);
    assert_eq!(item.rect, [20.0, 20.0, 60.0, 50.0]);

    let entry = editor.registry().find_by_uuid(figure.uuid).unwrap();
    let label = editor.canvas().get(entry.label).unwrap();
    assert_eq!(label.position.x, 20.0);
}

#[test]
fn test_resize_from_corner_handle() {
    let mut editor = new_editor();
    let figure = region(RegionType::Figure, 1, Vec2::new(10.0, 10.0), Vec2::new(50.0, 40.0));
    editor.render_all(&[figure.clone()]);
    editor.select_by_uuid(figure.uuid);
    editor.drain_events();

    editor.pointer_down(Vec2::new(51.0, 41.0), MouseButton::Left);
    assert_eq!(editor.canvas().cursor(), SystemCursorIcon::NwseResize);
    editor.pointer_move(Vec2::new(71.0, 61.0));
    editor.pointer_up(Vec2::new(71.0, 61.0));

    let events = editor.drain_events();
    let [CanvasEvent::Modified(item)] = &events[..] else {
        panic!("expected one modified event, got {:?}", events);
    };
    assert!(approx(item.rect[0], 10.0) && approx(item.rect[1], 10.0));
    assert!(approx(item.rect[2], 70.0) && approx(item.rect[3], 60.0));

    let frame = editor.registry().find_by_uuid(figure.uuid).unwrap().frame;
    assert_eq!(editor.canvas().get(frame).unwrap().scale, Vec2::ONE);
}

#[test]
fn test_resize_below_minimum_is_reverted() {
    let mut editor = new_editor();
    let figure = region(RegionType::Figure, 1, Vec2::new(10.0, 10.0), Vec2::new(50.0, 40.0));
    editor.render_all(&[figure.clone()]);
    editor.select_by_uuid(figure.uuid);
    editor.drain_events();

    editor.pointer_down(Vec2::new(50.0, 25.0), MouseButton::Left);
    editor.pointer_move(Vec2::new(12.0, 25.0));
    editor.pointer_up(Vec2::new(12.0, 25.0));

    assert!(editor.drain_events().is_empty());
    assert_eq!(editor.selected().unwrap().rect, figure.rect);
}

#[test]
fn test_click_on_selected_without_moving_is_not_a_modification() {
    let mut editor = new_editor();
    let figure = region(RegionType::Figure, 1, Vec2::ZERO, Vec2::splat(50.0));
    editor.render_all(&[figure.clone()]);
    editor.select_by_uuid(figure.uuid);
    editor.drain_events();

    editor.pointer_down(Vec2::splat(25.0), MouseButton::Left);
    editor.pointer_up(Vec2::splat(25.0));

    assert!(editor.drain_events().is_empty());
}

#[test]
fn test_alt_drag_pans_and_release_cancels() {
    let mut editor = new_editor();
    editor.set_mode(Some(RegionType::Figure));
    editor.set_pan_modifier(true);
    assert_eq!(editor.canvas().cursor(), SystemCursorIcon::Grab);

    editor.pointer_down(Vec2::new(100.0, 100.0), MouseButton::Left);
    assert!(editor.state().is_panning());
    assert_eq!(editor.canvas().cursor(), SystemCursorIcon::Grabbing);
    editor.pointer_move(Vec2::new(130.0, 90.0));

    assert_eq!(editor.viewport().view().translation, Vec2::new(30.0, -10.0));
    assert_eq!(editor.canvas().view().translation, Vec2::new(30.0, -10.0));

    editor.set_pan_modifier(false);
    assert!(editor.state().is_idle());
    assert_eq!(editor.canvas().cursor(), SystemCursorIcon::Crosshair);

    // Further motion no longer pans
    editor.pointer_move(Vec2::new(200.0, 200.0));
    assert_eq!(editor.viewport().view().translation, Vec2::new(30.0, -10.0));
    assert!(editor.drain_events().is_empty());
}

#[test]
fn test_wheel_zoom_requires_modifier() {
    let mut editor = new_editor();
    assert!(!editor.wheel(Vec2::ZERO, 100.0));
    assert_eq!(editor.viewport().zoom(), 1.0);

    editor.set_pan_modifier(true);
    assert!(editor.wheel(Vec2::ZERO, 100.0));
    assert!(approx(editor.viewport().zoom(), 0.905));
}

#[test]
fn test_gestures_use_logical_coordinates() {
    let mut editor = new_editor();
    editor.set_screen_size(Vec2::new(1000.0, 1000.0));
    editor.set_background(None, Vec2::new(600.0, 800.0));
    assert!(approx(editor.viewport().zoom(), 1.1875));
    editor.set_mode(Some(RegionType::Title));

    let view = editor.viewport().view();
    drag(
        &mut editor,
        view.to_screen(Vec2::new(10.0, 10.0)),
        view.to_screen(Vec2::new(110.0, 60.0)),
    );

    let events = editor.drain_events();
    let [CanvasEvent::Created(item)] = &events[..] else {
        panic!("expected one created event");
    };
    assert!(approx(item.rect[0], 10.0) && approx(item.rect[3], 60.0));
    assert_eq!(
        editor.canvas().background().map(|bg| bg.size),
        Some(Vec2::new(600.0, 800.0))
    );
}

#[test]
fn test_render_all_rebuilds_and_keeps_live_selection() {
    let mut editor = new_editor();
    let keep = region(RegionType::Figure, 1, Vec2::ZERO, Vec2::splat(20.0));
    let drop = region(RegionType::Figure, 2, Vec2::splat(40.0), Vec2::splat(60.0));
    editor.render_all(&[keep.clone(), drop.clone()]);
    editor.select_by_uuid(keep.uuid);

    editor.render_all(&[keep.clone()]);
    assert_eq!(editor.selected_uuid(), Some(keep.uuid));
    assert_eq!(editor.canvas().len(), 2);

    editor.select_by_uuid(keep.uuid);
    editor.render_all(&[drop.clone()]);
    assert!(editor.selected_uuid().is_none());
    assert_eq!(editor.registry().len(), 1);
}

#[test]
fn test_rebuild_dropping_the_selection_reports_it() {
    let mut editor = new_editor();
    let table = region(RegionType::Table, 1, Vec2::ZERO, Vec2::splat(20.0));
    editor.render_all(&[table.clone()]);
    editor.select_by_uuid(table.uuid);
    editor.drain_events();

    editor.render_all(&[]);

    assert!(editor.selected_uuid().is_none());
    assert_eq!(editor.drain_events(), vec![CanvasEvent::SelectionChanged(None)]);

    // A rebuild that keeps the selection stays quiet
    editor.render_all(&[table.clone()]);
    editor.select_by_uuid(table.uuid);
    editor.drain_events();
    editor.render_all(&[table]);
    assert!(editor.drain_events().is_empty());
}

#[test]
fn test_delete_selection_emits_removed() {
    let mut editor = new_editor();
    let mask = region(RegionType::Mask, 1, Vec2::ZERO, Vec2::splat(20.0));
    editor.render_all(&[mask.clone()]);
    editor.select_by_uuid(mask.uuid);
    editor.drain_events();

    assert_eq!(editor.handle_key(KeyCode::Delete), KeyOutcome::Handled);

    assert_eq!(
        editor.drain_events(),
        vec![
            CanvasEvent::SelectionChanged(None),
            CanvasEvent::Removed(mask),
        ]
    );
    assert!(editor.canvas().is_empty());

    // Nothing selected: no-op
    editor.delete_selection();
    assert!(editor.drain_events().is_empty());
}

#[test]
fn test_keyboard_surface() {
    let mut editor = new_editor();

    assert_eq!(editor.handle_key(KeyCode::Digit2), KeyOutcome::Handled);
    assert_eq!(editor.tools().active(), Some(RegionType::Table));

    assert_eq!(editor.handle_key(KeyCode::KeyC), KeyOutcome::Handled);
    assert_eq!(editor.tools().pending_role(), Role::Caption);

    editor.handle_key(KeyCode::Digit3);
    assert_eq!(editor.handle_key(KeyCode::KeyC), KeyOutcome::Ignored);

    let figure = region(RegionType::Equation, 1, Vec2::ZERO, Vec2::splat(20.0));
    editor.render_all(&[figure.clone()]);
    editor.select_by_uuid(figure.uuid);
    editor.handle_key(KeyCode::Escape);
    assert!(editor.selected_uuid().is_none());
    assert_eq!(editor.tools().active(), Some(RegionType::Equation));
    editor.handle_key(KeyCode::Escape);
    assert_eq!(editor.tools().active(), None);

    assert_eq!(
        editor.handle_key(KeyCode::ArrowRight),
        KeyOutcome::Navigate(PageNavigation::Next)
    );
    assert_eq!(
        editor.handle_key(KeyCode::Space),
        KeyOutcome::Navigate(PageNavigation::Next)
    );
    assert_eq!(
        editor.handle_key(KeyCode::ArrowLeft),
        KeyOutcome::Navigate(PageNavigation::Previous)
    );
    assert_eq!(editor.handle_key(KeyCode::KeyQ), KeyOutcome::Ignored);
}

#[test]
fn test_every_drawn_region_is_registered_once() {
    let mut editor = new_editor();
    editor.set_mode(Some(RegionType::Figure));
    let mut page: Vec<AnnotationItem> = Vec::new();

    for step in 0..6 {
        let origin = Vec2::splat(step as f32 * 60.0);
        drag(&mut editor, origin, origin + Vec2::new(40.0, 30.0));
        for event in editor.drain_events() {
            match event {
                CanvasEvent::Created(item) => page.push(item),
                CanvasEvent::Removed(item) => page.retain(|i| i.uuid != item.uuid),
                _ => {}
            }
        }
    }
    editor.set_mode(Some(RegionType::Figure));
    editor.pointer_down(Vec2::splat(320.0), MouseButton::Right);
    for event in editor.drain_events() {
        if let CanvasEvent::Removed(item) = event {
            page.retain(|i| i.uuid != item.uuid);
        }
    }

    assert_eq!(page.len(), 5);
    assert_eq!(editor.registry().len(), page.len());
    for item in &page {
        assert_eq!(page.iter().filter(|i| i.uuid == item.uuid).count(), 1);
        assert!(editor.registry().find_by_uuid(item.uuid).is_some());
    }
    // Body/caption alternate under the same id
    let labels: Vec<(u32, Role)> = page.iter().map(|i| (i.id, i.role)).collect();
    assert_eq!(labels[0], (1, Role::Body));
    assert_eq!(labels[1], (1, Role::Caption));
}
