use bevy::window::SystemCursorIcon;
use uuid::Uuid;

use crate::constants::{DIMMED_OPACITY, EMPHASIZED_OPACITY, FULL_OPACITY};
use crate::model::{AnnotationItem, RegionType, Role, next_free_id};

use super::canvas::CanvasSurface;
use super::registry::AnnotationRegistry;

/// Tool mode manager: the active region filter plus the identity the next
/// drawn region will receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolMode {
    active: Option<RegionType>,
    pending_id: u32,
    pending_role: Role,
}

impl Default for ToolMode {
    fn default() -> Self {
        Self {
            active: None,
            pending_id: 1,
            pending_role: Role::Body,
        }
    }
}

/// Visual state for one region under the current mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Emphasis {
    pub opacity: f32,
    pub interactive: bool,
}

impl ToolMode {
    pub fn active(&self) -> Option<RegionType> {
        self.active
    }

    pub fn pending_id(&self) -> u32 {
        self.pending_id
    }

    pub fn pending_role(&self) -> Role {
        self.pending_role
    }

    /// Switch the active type and pre-populate the pending identity from the
    /// regions currently on the page.
    pub fn set_mode<'a>(
        &mut self,
        region: Option<RegionType>,
        page_items: impl IntoIterator<Item = &'a AnnotationItem>,
    ) {
        self.active = region;
        self.pending_role = Role::Body;
        self.pending_id = region.map_or(1, |region| next_free_id(region, page_items));
    }

    pub fn set_pending_identity(&mut self, id: u32, role: Role) {
        self.pending_id = id.max(1);
        self.pending_role = role;
    }

    /// Flip Body/Caption. Ignored unless the active type has captions.
    pub fn toggle_role(&mut self) -> bool {
        match self.active {
            Some(region) if region.supports_caption() => {
                self.pending_role = self.pending_role.toggled();
                true
            }
            _ => false,
        }
    }

    /// Advance the pending identity after `created` was drawn.
    ///
    /// Caption-capable types alternate body then caption under the same id;
    /// everything else moves on to the next free id.
    pub fn advance_after_create<'a>(
        &mut self,
        created: &AnnotationItem,
        page_items: impl IntoIterator<Item = &'a AnnotationItem>,
    ) {
        if created.region.supports_caption() && created.role == Role::Body {
            self.pending_id = created.id;
            self.pending_role = Role::Caption;
        } else {
            self.pending_role = Role::Body;
            self.pending_id = next_free_id(created.region, page_items);
        }
    }

    /// Cursor for the canvas, with the pan modifier taking precedence.
    pub fn cursor(&self, pan_modifier: bool, panning: bool) -> SystemCursorIcon {
        if panning {
            SystemCursorIcon::Grabbing
        } else if pan_modifier {
            SystemCursorIcon::Grab
        } else if self.active.is_some() {
            SystemCursorIcon::Crosshair
        } else {
            SystemCursorIcon::Default
        }
    }

    pub fn emphasis(&self, region: RegionType, selected: bool) -> Emphasis {
        match self.active {
            None => Emphasis {
                opacity: FULL_OPACITY,
                interactive: true,
            },
            Some(active) if active == region => Emphasis {
                opacity: if selected {
                    FULL_OPACITY
                } else {
                    EMPHASIZED_OPACITY
                },
                interactive: true,
            },
            Some(_) => Emphasis {
                opacity: DIMMED_OPACITY,
                interactive: false,
            },
        }
    }

    /// Recompute opacity and interactivity of every registered region.
    pub fn apply_emphasis(
        &self,
        canvas: &mut impl CanvasSurface,
        registry: &AnnotationRegistry,
        selected: Option<Uuid>,
    ) {
        for entry in registry.entries() {
            let emphasis = self.emphasis(entry.item.region, selected == Some(entry.item.uuid));
            if let Some(frame) = canvas.get_mut(entry.frame) {
                frame.opacity = emphasis.opacity;
                frame.interactive = emphasis.interactive;
            }
            if let Some(label) = canvas.get_mut(entry.label) {
                label.opacity = emphasis.opacity;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::prelude::Vec2;

    use crate::editor::canvas::SceneCanvas;

    fn item(region: RegionType, id: u32, role: Role) -> AnnotationItem {
        AnnotationItem::new(region, id, role, Vec2::ZERO, Vec2::splat(20.0))
    }

    #[test]
    fn test_default_mode_has_no_tool() {
        let mode = ToolMode::default();
        assert_eq!(mode.active(), None);
        assert_eq!(mode.pending_id(), 1);
        assert_eq!(mode.pending_role(), Role::Body);
    }

    #[test]
    fn test_set_mode_prepopulates_next_id() {
        let items = vec![
            item(RegionType::Table, 1, Role::Body),
            item(RegionType::Table, 2, Role::Body),
        ];
        let mut mode = ToolMode::default();
        mode.set_mode(Some(RegionType::Table), &items);
        assert_eq!(mode.pending_id(), 3);
        mode.set_mode(Some(RegionType::Figure), &items);
        assert_eq!(mode.pending_id(), 1);
    }

    #[test]
    fn test_toggle_role_only_for_caption_types() {
        let mut mode = ToolMode::default();
        assert!(!mode.toggle_role());

        mode.set_mode(Some(RegionType::Equation), &[]);
        assert!(!mode.toggle_role());
        assert_eq!(mode.pending_role(), Role::Body);

        mode.set_mode(Some(RegionType::Algorithm), &[]);
        assert!(mode.toggle_role());
        assert_eq!(mode.pending_role(), Role::Caption);
    }

    #[test]
    fn test_advance_alternates_body_and_caption() {
        let mut mode = ToolMode::default();
        mode.set_mode(Some(RegionType::Figure), &[]);

        let body = item(RegionType::Figure, 1, Role::Body);
        mode.advance_after_create(&body, [&body]);
        assert_eq!((mode.pending_id(), mode.pending_role()), (1, Role::Caption));

        let caption = item(RegionType::Figure, 1, Role::Caption);
        mode.advance_after_create(&caption, [&body, &caption]);
        assert_eq!((mode.pending_id(), mode.pending_role()), (2, Role::Body));
    }

    #[test]
    fn test_advance_for_plain_types_uses_next_free_id() {
        let mut mode = ToolMode::default();
        mode.set_mode(Some(RegionType::Title), &[]);
        let title = item(RegionType::Title, 1, Role::Body);
        mode.advance_after_create(&title, [&title]);
        assert_eq!((mode.pending_id(), mode.pending_role()), (2, Role::Body));
    }

    #[test]
    fn test_cursor_precedence() {
        let mut mode = ToolMode::default();
        assert_eq!(mode.cursor(false, false), SystemCursorIcon::Default);
        mode.set_mode(Some(RegionType::Mask), &[]);
        assert_eq!(mode.cursor(false, false), SystemCursorIcon::Crosshair);
        assert_eq!(mode.cursor(true, false), SystemCursorIcon::Grab);
        assert_eq!(mode.cursor(true, true), SystemCursorIcon::Grabbing);
    }

    #[test]
    fn test_apply_emphasis_dims_other_types() {
        let mut canvas = SceneCanvas::default();
        let mut registry = AnnotationRegistry::default();
        let figure = item(RegionType::Figure, 1, Role::Body);
        let selected_figure = item(RegionType::Figure, 2, Role::Body);
        let table = item(RegionType::Table, 1, Role::Body);
        let selected = selected_figure.uuid;
        for entry in [figure.clone(), selected_figure, table.clone()] {
            registry.add(&mut canvas, entry);
        }

        let mut mode = ToolMode::default();
        mode.set_mode(Some(RegionType::Figure), registry.items());
        mode.apply_emphasis(&mut canvas, &registry, Some(selected));

        let frame_of = |uuid| {
            let handle = registry.find_by_uuid(uuid).unwrap().frame;
            canvas.get(handle).unwrap().clone()
        };
        let figure_frame = frame_of(figure.uuid);
        assert_eq!(figure_frame.opacity, EMPHASIZED_OPACITY);
        assert!(figure_frame.interactive);
        assert_eq!(frame_of(selected).opacity, FULL_OPACITY);
        let table_frame = frame_of(table.uuid);
        assert_eq!(table_frame.opacity, DIMMED_OPACITY);
        assert!(!table_frame.interactive);

        mode.set_mode(None, registry.items());
        mode.apply_emphasis(&mut canvas, &registry, None);
        let frame_of = |uuid| {
            let handle = registry.find_by_uuid(uuid).unwrap().frame;
            canvas.get(handle).unwrap().clone()
        };
        assert_eq!(frame_of(table.uuid).opacity, FULL_OPACITY);
        assert!(frame_of(table.uuid).interactive);
    }
}
