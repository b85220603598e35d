//! Common types shared across multiple modules.

use bevy::prelude::*;
use bevy::window::SystemCursorIcon;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// User-facing status line raised by any plugin and shown by the UI.
#[derive(Message, Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

/// Drag mode for a gesture on the selected region.
///
/// Page coordinates grow downwards, so the north edge is `min.y`.
#[derive(Default, Clone, Copy, PartialEq, Eq, Debug)]
pub enum DragMode {
    #[default]
    None,
    Move,
    ResizeN,
    ResizeS,
    ResizeE,
    ResizeW,
    ResizeNE,
    ResizeNW,
    ResizeSE,
    ResizeSW,
}

impl DragMode {
    /// Get the appropriate cursor icon for this drag mode.
    pub fn cursor_icon(&self) -> Option<SystemCursorIcon> {
        match self {
            DragMode::None => None,
            DragMode::Move => Some(SystemCursorIcon::Move),
            DragMode::ResizeN | DragMode::ResizeS => Some(SystemCursorIcon::NsResize),
            DragMode::ResizeE | DragMode::ResizeW => Some(SystemCursorIcon::EwResize),
            DragMode::ResizeNE | DragMode::ResizeSW => Some(SystemCursorIcon::NeswResize),
            DragMode::ResizeNW | DragMode::ResizeSE => Some(SystemCursorIcon::NwseResize),
        }
    }

    /// Check if this is a resize mode.
    pub fn is_resize(&self) -> bool {
        !matches!(self, DragMode::None | DragMode::Move)
    }

    /// Handle positions of a rectangle, corners first so they win ties.
    pub fn handles(min: Vec2, max: Vec2) -> [(Vec2, DragMode); 8] {
        let mid = (min + max) / 2.0;
        [
            (Vec2::new(min.x, min.y), DragMode::ResizeNW),
            (Vec2::new(max.x, min.y), DragMode::ResizeNE),
            (Vec2::new(max.x, max.y), DragMode::ResizeSE),
            (Vec2::new(min.x, max.y), DragMode::ResizeSW),
            (Vec2::new(mid.x, min.y), DragMode::ResizeN),
            (Vec2::new(mid.x, max.y), DragMode::ResizeS),
            (Vec2::new(min.x, mid.y), DragMode::ResizeW),
            (Vec2::new(max.x, mid.y), DragMode::ResizeE),
        ]
    }

    /// Bounds after dragging this mode's edge(s) by `delta`.
    ///
    /// The result is re-normalized, so dragging an edge past its opposite
    /// flips the rectangle instead of producing a negative size.
    pub fn apply(&self, min: Vec2, max: Vec2, delta: Vec2) -> (Vec2, Vec2) {
        let (mut a, mut b) = (min, max);
        match self {
            DragMode::None => {}
            DragMode::Move => {
                a += delta;
                b += delta;
            }
            DragMode::ResizeN => a.y += delta.y,
            DragMode::ResizeS => b.y += delta.y,
            DragMode::ResizeW => a.x += delta.x,
            DragMode::ResizeE => b.x += delta.x,
            DragMode::ResizeNW => a += delta,
            DragMode::ResizeSE => b += delta,
            DragMode::ResizeNE => {
                a.y += delta.y;
                b.x += delta.x;
            }
            DragMode::ResizeSW => {
                a.x += delta.x;
                b.y += delta.y;
            }
        }
        (a.min(b), a.max(b))
    }
}
