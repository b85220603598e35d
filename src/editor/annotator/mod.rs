//! The annotation editor facade.
//!
//! [`AnnotationEditor`] owns a canvas, the viewport, the tool mode, the
//! registry and the interaction state, and is driven by three kinds of input:
//!
//! - raw pointer, wheel and key events from [`super::input`]
//! - commands from the owning document (`render_all`, `set_background`,
//!   `select_by_uuid`, `update_identity`, ...)
//! - UI requests (`set_mode`, `set_pending_identity`, `toggle_role`)
//!
//! Every committed change is queued as a [`CanvasEvent`]; the owner drains
//! them with [`AnnotationEditor::drain_events`] and applies them to its
//! authoritative lists. The editor never touches those lists itself.

#[cfg(test)]
mod tests;

use bevy::prelude::*;
use bevy::window::SystemCursorIcon;
use uuid::Uuid;

use crate::common::DragMode;
use crate::constants::{HANDLE_SIZE, MIN_REGION_SIZE};
use crate::model::{AnnotationItem, RegionType, Role};

use super::canvas::{CanvasSurface, PageBackground, SceneCanvas, Shape};
use super::events::{CanvasEvent, KeyOutcome, PageNavigation};
use super::interaction::{InteractionState, drag_mode_at};
use super::registry::AnnotationRegistry;
use super::tools::ToolMode;
use super::viewport::Viewport;

pub struct AnnotationEditor<C: CanvasSurface = SceneCanvas> {
    canvas: C,
    viewport: Viewport,
    tools: ToolMode,
    registry: AnnotationRegistry,
    state: InteractionState,
    selected: Option<Uuid>,
    /// Alt held
    pan_modifier: bool,
    outbox: Vec<CanvasEvent>,
}

impl<C: CanvasSurface + Default> Default for AnnotationEditor<C> {
    fn default() -> Self {
        Self::new(C::default())
    }
}

impl<C: CanvasSurface> AnnotationEditor<C> {
    pub fn new(canvas: C) -> Self {
        Self {
            canvas,
            viewport: Viewport::default(),
            tools: ToolMode::default(),
            registry: AnnotationRegistry::default(),
            state: InteractionState::Idle,
            selected: None,
            pan_modifier: false,
            outbox: Vec::new(),
        }
    }

    pub fn canvas(&self) -> &C {
        &self.canvas
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn tools(&self) -> &ToolMode {
        &self.tools
    }

    pub fn registry(&self) -> &AnnotationRegistry {
        &self.registry
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn selected_uuid(&self) -> Option<Uuid> {
        self.selected
    }

    pub fn selected(&self) -> Option<&AnnotationItem> {
        self.selected
            .and_then(|uuid| self.registry.find_by_uuid(uuid))
            .map(|entry| &entry.item)
    }

    pub fn pan_modifier(&self) -> bool {
        self.pan_modifier
    }

    /// Take every event queued since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<CanvasEvent> {
        std::mem::take(&mut self.outbox)
    }

    // ---- Sync bridge commands ----

    pub fn set_screen_size(&mut self, size: Vec2) {
        self.viewport.set_screen_size(size);
    }

    /// Show a page image of `logical_size`, then fit and center it.
    pub fn set_background(&mut self, image: Option<Handle<Image>>, logical_size: Vec2) {
        self.canvas.set_background(Some(PageBackground {
            image,
            size: logical_size,
        }));
        self.viewport.fit_page(logical_size);
        self.push_view();
    }

    pub fn clear_background(&mut self) {
        self.canvas.set_background(None);
    }

    /// Discard every shape and rebuild from `items`.
    ///
    /// The selection survives only if its uuid is still present.
    pub fn render_all(&mut self, items: &[AnnotationItem]) {
        self.cancel_gesture();
        self.registry.clear(&mut self.canvas);
        for item in items {
            self.registry.add(&mut self.canvas, item.clone());
        }
        if self
            .selected
            .is_some_and(|uuid| self.registry.find_by_uuid(uuid).is_none())
        {
            self.set_selected(None);
        }
        debug!("Rendered {} regions", items.len());
        self.refresh_emphasis();
    }

    /// Switch the active region type (`None` for no tool).
    pub fn set_mode(&mut self, region: Option<RegionType>) {
        if self.tools.active() == region {
            return;
        }
        self.cancel_gesture();
        self.tools.set_mode(region, self.registry.items());
        debug!(
            "Tool mode {:?}, next {} {}",
            region,
            self.tools.pending_id(),
            self.tools.pending_role().display_name()
        );

        // A selection that just became non-interactive is dropped
        let stale = region.is_some_and(|active| {
            self.selected()
                .is_some_and(|item| item.region != active)
        });
        if stale {
            self.clear_selection();
        }
        self.refresh_emphasis();
        self.refresh_cursor();
    }

    /// Re-derive the pending identity from the regions now on the canvas.
    pub fn refresh_pending_identity(&mut self) {
        let active = self.tools.active();
        self.tools.set_mode(active, self.registry.items());
    }

    pub fn set_pending_identity(&mut self, id: u32, role: Role) {
        self.tools.set_pending_identity(id, role);
    }

    pub fn toggle_role(&mut self) -> bool {
        self.tools.toggle_role()
    }

    /// Select the region with `uuid` and center the view on it.
    ///
    /// Unknown uuids are ignored.
    pub fn select_by_uuid(&mut self, uuid: Uuid) -> bool {
        let Some(entry) = self.registry.find_by_uuid(uuid) else {
            debug!("select_by_uuid: {} not on canvas", uuid);
            return false;
        };
        let center = entry.item.center();
        self.set_selected(Some(uuid));
        self.viewport.center_on(center);
        self.push_view();
        true
    }

    pub fn delete_selection(&mut self) {
        if let Some(uuid) = self.selected {
            self.delete_region(uuid);
        }
    }

    pub fn clear_selection(&mut self) {
        self.set_selected(None);
    }

    /// Rewrite a region's id and role. Geometry is untouched.
    pub fn update_identity(&mut self, uuid: Uuid, id: u32, role: Role) -> bool {
        let Some(entry) = self.registry.find_by_uuid(uuid) else {
            return false;
        };
        if entry.item.id == id && entry.item.role == role {
            return false;
        }
        let Some(item) = self.registry.update_label_for(&mut self.canvas, uuid, id, role) else {
            return false;
        };
        debug!("Relabelled {} as {}", uuid, item.label_text());
        self.outbox.push(CanvasEvent::Modified(item));
        true
    }

    // ---- Raw input ----

    /// Alt pressed or released.
    pub fn set_pan_modifier(&mut self, held: bool) {
        self.pan_modifier = held;
        if !held && self.state.is_panning() {
            debug!("Pan modifier released, panning cancelled");
            self.state = InteractionState::Idle;
        }
        self.refresh_cursor();
    }

    pub fn pointer_down(&mut self, screen: Vec2, button: MouseButton) {
        if !self.state.is_idle() {
            return;
        }
        let logical = self.viewport.to_logical(screen);

        if button == MouseButton::Left && self.pan_modifier {
            self.state = InteractionState::Panning {
                last_screen: screen,
            };
            debug!("Panning from {:?}", screen);
            self.refresh_cursor();
            return;
        }

        let hit = self
            .canvas
            .hit_test(logical)
            .and_then(|handle| self.registry.uuid_for_shape(handle));

        match button {
            MouseButton::Right => {
                let Some(uuid) = hit else {
                    return;
                };
                let Some(entry) = self.registry.find_by_uuid(uuid) else {
                    return;
                };
                if self.tools.active() == Some(entry.item.region) {
                    self.delete_region(uuid);
                }
            }
            MouseButton::Left => self.primary_down(logical, hit),
            _ => {}
        }
    }

    fn primary_down(&mut self, logical: Vec2, hit: Option<Uuid>) {
        // Handles of the selected region reach slightly outside its frame
        if let Some(item) = self.selected().cloned() {
            let radius = HANDLE_SIZE / self.viewport.zoom();
            let mode = drag_mode_at(logical, item.min(), item.max(), radius);
            if mode != DragMode::None && self.is_interactive(item.uuid) {
                self.begin_transform(&item, mode, logical);
                return;
            }
        }

        if let Some(uuid) = hit {
            self.set_selected(Some(uuid));
            if let Some(item) = self.selected().cloned() {
                self.begin_transform(&item, DragMode::Move, logical);
            }
            return;
        }

        self.clear_selection();
        let Some(region) = self.tools.active() else {
            debug!("Click on empty canvas with no tool, ignored");
            return;
        };
        let mut preview = Shape::frame(logical, Vec2::ZERO, region.color());
        preview.interactive = false;
        preview.dashed = true;
        let preview = self.canvas.insert(preview);
        self.state = InteractionState::Drawing {
            anchor: logical,
            preview,
        };
        debug!("Drawing {} from {:?}", region.display_name(), logical);
    }

    fn begin_transform(&mut self, item: &AnnotationItem, mode: DragMode, start: Vec2) {
        self.state = InteractionState::Transforming {
            uuid: item.uuid,
            mode,
            start,
            original_min: item.min(),
            original_max: item.max(),
        };
        self.refresh_cursor();
    }

    pub fn pointer_move(&mut self, screen: Vec2) {
        let logical = self.viewport.to_logical(screen);
        if self.state.is_idle() {
            self.hover(logical);
            return;
        }
        match &mut self.state {
            InteractionState::Idle => {}
            InteractionState::Panning { last_screen } => {
                let delta = screen - *last_screen;
                *last_screen = screen;
                self.viewport.pan_by(delta);
                self.push_view();
            }
            InteractionState::Drawing { anchor, preview } => {
                let (min, max) = (anchor.min(logical), anchor.max(logical));
                if let Some(shape) = self.canvas.get_mut(*preview) {
                    shape.position = min;
                    shape.size = max - min;
                }
            }
            InteractionState::Transforming {
                uuid,
                mode,
                start,
                original_min,
                original_max,
            } => {
                let (min, max) = mode.apply(*original_min, *original_max, logical - *start);
                self.registry
                    .set_live_bounds(&mut self.canvas, *uuid, min, max);
            }
        }
    }

    pub fn pointer_up(&mut self, screen: Vec2) {
        let logical = self.viewport.to_logical(screen);
        match std::mem::take(&mut self.state) {
            InteractionState::Idle => {}
            InteractionState::Panning { .. } => {
                debug!("Panning finished");
            }
            InteractionState::Drawing { anchor, preview } => {
                self.canvas.remove(preview);
                self.finish_drawing(anchor, logical);
            }
            InteractionState::Transforming {
                uuid,
                original_min,
                original_max,
                ..
            } => self.finish_transform(uuid, original_min, original_max),
        }
        self.refresh_cursor();
    }

    fn finish_drawing(&mut self, anchor: Vec2, end: Vec2) {
        let size = (end - anchor).abs();
        if size.x < MIN_REGION_SIZE || size.y < MIN_REGION_SIZE {
            debug!("Discarded {:?} region below minimum size", size);
            return;
        }
        let Some(region) = self.tools.active() else {
            return;
        };

        let item = AnnotationItem::new(
            region,
            self.tools.pending_id(),
            self.tools.pending_role(),
            anchor,
            end,
        );
        debug!("Created {} {:?}", item.label_text(), item.rect);
        self.registry.add(&mut self.canvas, item.clone());
        self.tools.advance_after_create(&item, self.registry.items());
        self.outbox.push(CanvasEvent::Created(item));
        self.refresh_emphasis();
    }

    fn finish_transform(&mut self, uuid: Uuid, original_min: Vec2, original_max: Vec2) {
        let Some(live) = self
            .registry
            .find_by_uuid(uuid)
            .and_then(|entry| self.canvas.get(entry.frame))
            .map(|frame| frame.scaled_size().abs())
        else {
            return;
        };
        if live.x < MIN_REGION_SIZE || live.y < MIN_REGION_SIZE {
            debug!("Resize below minimum size reverted");
            self.registry.reset_geometry(&mut self.canvas, uuid);
            return;
        }

        let Some(item) = self.registry.commit_geometry(&mut self.canvas, uuid) else {
            return;
        };
        if item.min() != original_min || item.max() != original_max {
            debug!("Modified {} {:?}", item.label_text(), item.rect);
            self.outbox.push(CanvasEvent::Modified(item));
        }
    }

    /// Wheel zoom; only with the pan modifier held. Returns whether it zoomed.
    pub fn wheel(&mut self, screen: Vec2, delta_y: f32) -> bool {
        if !self.pan_modifier {
            return false;
        }
        self.viewport.zoom_at(screen, delta_y);
        self.push_view();
        true
    }

    pub fn handle_key(&mut self, key: KeyCode) -> KeyOutcome {
        let digit = match key {
            KeyCode::Digit1 => Some(1),
            KeyCode::Digit2 => Some(2),
            KeyCode::Digit3 => Some(3),
            KeyCode::Digit4 => Some(4),
            KeyCode::Digit5 => Some(5),
            KeyCode::Digit6 => Some(6),
            KeyCode::Digit7 => Some(7),
            KeyCode::Digit8 => Some(8),
            KeyCode::Digit9 => Some(9),
            _ => None,
        };
        if let Some(region) = digit.and_then(RegionType::from_shortcut_index) {
            self.set_mode(Some(region));
            return KeyOutcome::Handled;
        }

        match key {
            KeyCode::Delete | KeyCode::Backspace => {
                self.delete_selection();
                KeyOutcome::Handled
            }
            KeyCode::Escape => {
                if self.selected.is_some() {
                    self.clear_selection();
                } else {
                    self.set_mode(None);
                }
                KeyOutcome::Handled
            }
            KeyCode::KeyC if self.toggle_role() => KeyOutcome::Handled,
            KeyCode::ArrowLeft | KeyCode::ArrowUp | KeyCode::PageUp => {
                KeyOutcome::Navigate(PageNavigation::Previous)
            }
            KeyCode::ArrowRight | KeyCode::ArrowDown | KeyCode::PageDown | KeyCode::Space => {
                KeyOutcome::Navigate(PageNavigation::Next)
            }
            KeyCode::Home => KeyOutcome::Navigate(PageNavigation::First),
            KeyCode::End => KeyOutcome::Navigate(PageNavigation::Last),
            _ => KeyOutcome::Ignored,
        }
    }

    // ---- Internals ----

    fn delete_region(&mut self, uuid: Uuid) {
        if self.selected == Some(uuid) {
            self.set_selected(None);
        }
        if let Some(item) = self.registry.remove_by_uuid(&mut self.canvas, uuid) {
            debug!("Removed {}", item.label_text());
            self.outbox.push(CanvasEvent::Removed(item));
        }
    }

    fn set_selected(&mut self, uuid: Option<Uuid>) {
        if self.selected == uuid {
            return;
        }
        self.selected = uuid;
        let item = self.selected().cloned();
        self.outbox.push(CanvasEvent::SelectionChanged(item));
        self.refresh_emphasis();
    }

    fn is_interactive(&self, uuid: Uuid) -> bool {
        self.registry
            .find_by_uuid(uuid)
            .and_then(|entry| self.canvas.get(entry.frame))
            .is_some_and(|frame| frame.interactive)
    }

    /// Abort any in-flight gesture without emitting anything.
    fn cancel_gesture(&mut self) {
        match std::mem::take(&mut self.state) {
            InteractionState::Drawing { preview, .. } => {
                self.canvas.remove(preview);
            }
            InteractionState::Transforming { uuid, .. } => {
                self.registry.reset_geometry(&mut self.canvas, uuid);
            }
            InteractionState::Idle | InteractionState::Panning { .. } => {}
        }
    }

    fn hover(&mut self, logical: Vec2) {
        let mode = self
            .selected()
            .map(|item| {
                let radius = HANDLE_SIZE / self.viewport.zoom();
                drag_mode_at(logical, item.min(), item.max(), radius)
            })
            .unwrap_or_default();
        let cursor = match mode.cursor_icon() {
            Some(icon) if !self.pan_modifier => icon,
            _ => self.tools.cursor(self.pan_modifier, false),
        };
        self.canvas.set_cursor(cursor);
    }

    fn refresh_cursor(&mut self) {
        let cursor = match &self.state {
            InteractionState::Transforming { mode, .. } => {
                mode.cursor_icon().unwrap_or(SystemCursorIcon::Move)
            }
            state => self.tools.cursor(self.pan_modifier, state.is_panning()),
        };
        self.canvas.set_cursor(cursor);
    }

    fn refresh_emphasis(&mut self) {
        self.tools
            .apply_emphasis(&mut self.canvas, &self.registry, self.selected);
    }

    fn push_view(&mut self) {
        self.canvas.set_view(self.viewport.view());
    }
}
