//! Outbound events from the annotation core to the owning document.

use bevy::prelude::*;

use crate::model::AnnotationItem;

/// Structured notification of a committed change on the canvas.
///
/// Items are full copies; the receiver never reaches back into the canvas.
#[derive(Message, Debug, Clone, PartialEq)]
pub enum CanvasEvent {
    Created(AnnotationItem),
    Modified(AnnotationItem),
    Removed(AnnotationItem),
    SelectionChanged(Option<AnnotationItem>),
}

/// Page navigation requested from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageNavigation {
    Previous,
    Next,
    First,
    Last,
}

/// Result of routing a key press through the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// The key was consumed by the core
    Handled,
    /// The owning application should change page
    Navigate(PageNavigation),
    Ignored,
}
