//! Centralized constants used across the application.
//!
//! This module contains magic numbers and configuration values that are used
//! in multiple places or would benefit from being named constants.

/// Default window width in pixels
pub const DEFAULT_WINDOW_WIDTH: f32 = 1600.0;

/// Default window height in pixels
pub const DEFAULT_WINDOW_HEIGHT: f32 = 1000.0;

/// Drawn regions smaller than this (in logical units, either axis) are discarded
pub const MIN_REGION_SIZE: f32 = 5.0;

/// Number of page snapshots kept for undo
pub const HISTORY_CAPACITY: usize = 30;

/// Zoom limits for the page viewport
pub const MIN_ZOOM: f32 = 0.05;
pub const MAX_ZOOM: f32 = 20.0;

/// Per-unit wheel zoom base: `zoom *= ZOOM_WHEEL_BASE.powf(delta_y)`
pub const ZOOM_WHEEL_BASE: f32 = 0.999;

/// Fraction of the viewport the page occupies after fitting (5% margin)
pub const FIT_MARGIN_FACTOR: f32 = 0.95;

/// Opacity of regions outside the active tool type
pub const DIMMED_OPACITY: f32 = 0.3;

/// Opacity of regions matching the active tool type
pub const EMPHASIZED_OPACITY: f32 = 0.8;

/// Opacity of the selected region and of everything when no tool is active
pub const FULL_OPACITY: f32 = 1.0;

/// Vertical gap between a region's top edge and its label (logical units)
pub const LABEL_OFFSET: f32 = 14.0;

/// Resize handle size in screen pixels
pub const HANDLE_SIZE: f32 = 8.0;

/// Pixel scroll units per wheel line
pub const WHEEL_LINE_PIXELS: f32 = 100.0;
