//! Interaction state machine states.

use bevy::prelude::*;
use uuid::Uuid;

use crate::common::DragMode;

use super::canvas::ShapeHandle;

/// Gesture in progress. Exactly one at a time.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum InteractionState {
    #[default]
    Idle,
    /// Alt + primary drag moving the view
    Panning { last_screen: Vec2 },
    /// Rubber-band drawing of a new region
    Drawing {
        /// Logical point where the drag started
        anchor: Vec2,
        preview: ShapeHandle,
    },
    /// Move or resize of the selected region
    Transforming {
        uuid: Uuid,
        mode: DragMode,
        /// Logical pointer position at pointer-down
        start: Vec2,
        original_min: Vec2,
        original_max: Vec2,
    },
}

impl InteractionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, InteractionState::Idle)
    }

    pub fn is_panning(&self) -> bool {
        matches!(self, InteractionState::Panning { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            InteractionState::Idle => "idle",
            InteractionState::Panning { .. } => "panning",
            InteractionState::Drawing { .. } => "drawing",
            InteractionState::Transforming { .. } => "transforming",
        }
    }
}

/// Which part of `min..max` sits under `point`, given a handle radius in
/// logical units. Handles win over the body.
pub fn drag_mode_at(point: Vec2, min: Vec2, max: Vec2, handle_radius: f32) -> DragMode {
    for (handle, mode) in DragMode::handles(min, max) {
        if (point - handle).abs().max_element() <= handle_radius {
            return mode;
        }
    }
    if Rect::from_corners(min, max).contains(point) {
        DragMode::Move
    } else {
        DragMode::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_idle() {
        assert!(InteractionState::default().is_idle());
        assert_eq!(InteractionState::default().name(), "idle");
    }

    #[test]
    fn test_drag_mode_at_prefers_handles() {
        let min = Vec2::new(10.0, 10.0);
        let max = Vec2::new(50.0, 40.0);
        assert_eq!(drag_mode_at(Vec2::new(11.0, 9.0), min, max, 4.0), DragMode::ResizeNW);
        assert_eq!(drag_mode_at(Vec2::new(30.0, 40.0), min, max, 4.0), DragMode::ResizeS);
        assert_eq!(drag_mode_at(Vec2::new(50.0, 25.0), min, max, 4.0), DragMode::ResizeE);
        assert_eq!(drag_mode_at(Vec2::new(30.0, 25.0), min, max, 4.0), DragMode::Move);
        assert_eq!(drag_mode_at(Vec2::new(90.0, 90.0), min, max, 4.0), DragMode::None);
    }
}
