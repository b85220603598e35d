//! Viewport controller: zoom/pan transform between screen pixels and page-logical units.

use bevy::prelude::*;

use crate::constants::{FIT_MARGIN_FACTOR, MAX_ZOOM, MIN_ZOOM, ZOOM_WHEEL_BASE};

/// Affine view transform: `screen = logical * scale + translation`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub scale: f32,
    pub translation: Vec2,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            translation: Vec2::ZERO,
        }
    }
}

impl ViewTransform {
    pub fn to_screen(&self, logical: Vec2) -> Vec2 {
        logical * self.scale + self.translation
    }

    pub fn to_logical(&self, screen: Vec2) -> Vec2 {
        (screen - self.translation) / self.scale
    }
}

#[derive(Debug, Clone, Default)]
pub struct Viewport {
    view: ViewTransform,
    screen_size: Vec2,
}

impl Viewport {
    pub fn view(&self) -> ViewTransform {
        self.view
    }

    pub fn zoom(&self) -> f32 {
        self.view.scale
    }

    pub fn screen_size(&self) -> Vec2 {
        self.screen_size
    }

    pub fn set_screen_size(&mut self, size: Vec2) {
        self.screen_size = size;
    }

    pub fn to_logical(&self, screen: Vec2) -> Vec2 {
        self.view.to_logical(screen)
    }

    pub fn to_screen(&self, logical: Vec2) -> Vec2 {
        self.view.to_screen(logical)
    }

    pub fn reset(&mut self) {
        self.view = ViewTransform::default();
    }

    /// Shift the view by a screen-space delta.
    pub fn pan_by(&mut self, screen_delta: Vec2) {
        self.view.translation += screen_delta;
    }

    /// Exponential wheel zoom anchored at `screen_point`.
    ///
    /// The logical point under the cursor stays at the same screen position.
    pub fn zoom_at(&mut self, screen_point: Vec2, wheel_delta_y: f32) -> f32 {
        let anchor = self.view.to_logical(screen_point);
        let zoom = (self.view.scale * ZOOM_WHEEL_BASE.powf(wheel_delta_y)).clamp(MIN_ZOOM, MAX_ZOOM);
        self.view.scale = zoom;
        self.view.translation = screen_point - anchor * zoom;
        zoom
    }

    /// Reset, then fit a page of `page_size` into the screen with a 5% margin, centered.
    pub fn fit_page(&mut self, page_size: Vec2) {
        self.reset();
        if page_size.x <= 0.0 || page_size.y <= 0.0 || self.screen_size.min_element() <= 0.0 {
            return;
        }
        let fit = (self.screen_size.x / page_size.x).min(self.screen_size.y / page_size.y);
        let scale = (fit * FIT_MARGIN_FACTOR).clamp(MIN_ZOOM, MAX_ZOOM);
        self.view.scale = scale;
        self.view.translation = (self.screen_size - page_size * scale) / 2.0;
    }

    /// Keep the zoom and move `logical` to the center of the screen.
    pub fn center_on(&mut self, logical: Vec2) {
        if self.screen_size.min_element() <= 0.0 {
            return;
        }
        self.view.translation = self.screen_size / 2.0 - logical * self.view.scale;
    }
}
