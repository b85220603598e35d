//! Canvas surface contract and the retained scene the editor draws into.
//!
//! The editor never renders anything itself. It inserts, mutates and removes
//! [`Shape`]s through [`CanvasSurface`], asks it for hit tests, and pushes the
//! current view transform, cursor and page background to it. Shapes carry no
//! domain data; the registry maps them back to annotation identities.
//!
//! [`SceneCanvas`] is the in-memory implementation. Bevy systems in
//! [`super::rendering`] draw it every frame.

use bevy::prelude::*;
use bevy::window::SystemCursorIcon;
use std::collections::BTreeMap;

use super::viewport::ViewTransform;

/// Opaque reference to a shape on a canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShapeHandle(u64);

#[derive(Debug, Clone, PartialEq)]
pub enum ShapeKind {
    /// Outlined rectangle
    Frame,
    /// Text anchored at the shape's top-left position
    Label { text: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub kind: ShapeKind,
    /// Top-left corner in page-logical units
    pub position: Vec2,
    /// Unscaled size; the drawn size is `size * scale`
    pub size: Vec2,
    pub scale: Vec2,
    pub color: Color,
    pub opacity: f32,
    /// Selectable and reported by hit tests
    pub interactive: bool,
    /// Drawn with a dashed outline (volatile previews)
    pub dashed: bool,
}

impl Shape {
    pub fn frame(position: Vec2, size: Vec2, color: Color) -> Self {
        Self {
            kind: ShapeKind::Frame,
            position,
            size,
            scale: Vec2::ONE,
            color,
            opacity: 1.0,
            interactive: true,
            dashed: false,
        }
    }

    pub fn label(text: impl Into<String>, position: Vec2, color: Color) -> Self {
        Self {
            kind: ShapeKind::Label { text: text.into() },
            position,
            size: Vec2::ZERO,
            scale: Vec2::ONE,
            color,
            opacity: 1.0,
            interactive: false,
            dashed: false,
        }
    }

    /// Rendered extent, accounting for accumulated scale.
    pub fn scaled_size(&self) -> Vec2 {
        self.size * self.scale
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_corners(self.position, self.position + self.scaled_size())
    }

    pub fn contains(&self, point: Vec2) -> bool {
        self.bounds().contains(point)
    }
}

/// Page image behind all shapes, sized in logical units.
#[derive(Debug, Clone, PartialEq)]
pub struct PageBackground {
    pub image: Option<Handle<Image>>,
    pub size: Vec2,
}

/// A generic 2-D drawing surface.
pub trait CanvasSurface {
    fn insert(&mut self, shape: Shape) -> ShapeHandle;
    fn remove(&mut self, handle: ShapeHandle) -> Option<Shape>;
    fn get(&self, handle: ShapeHandle) -> Option<&Shape>;
    fn get_mut(&mut self, handle: ShapeHandle) -> Option<&mut Shape>;
    /// Topmost interactive shape containing the logical point.
    fn hit_test(&self, point: Vec2) -> Option<ShapeHandle>;
    fn clear(&mut self);
    fn set_view(&mut self, view: ViewTransform);
    fn set_cursor(&mut self, cursor: SystemCursorIcon);
    fn set_background(&mut self, background: Option<PageBackground>);
}

/// Retained shape list in insertion (z) order.
#[derive(Debug, Clone)]
pub struct SceneCanvas {
    shapes: BTreeMap<ShapeHandle, Shape>,
    next_handle: u64,
    view: ViewTransform,
    cursor: SystemCursorIcon,
    background: Option<PageBackground>,
}

impl Default for SceneCanvas {
    fn default() -> Self {
        Self {
            shapes: BTreeMap::new(),
            next_handle: 0,
            view: ViewTransform::default(),
            cursor: SystemCursorIcon::Default,
            background: None,
        }
    }
}

impl SceneCanvas {
    /// Shapes bottom to top.
    pub fn shapes(&self) -> impl Iterator<Item = (ShapeHandle, &Shape)> {
        self.shapes.iter().map(|(handle, shape)| (*handle, shape))
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn view(&self) -> ViewTransform {
        self.view
    }

    pub fn cursor(&self) -> SystemCursorIcon {
        self.cursor
    }

    pub fn background(&self) -> Option<&PageBackground> {
        self.background.as_ref()
    }
}

impl CanvasSurface for SceneCanvas {
    fn insert(&mut self, shape: Shape) -> ShapeHandle {
        let handle = ShapeHandle(self.next_handle);
        self.next_handle += 1;
        self.shapes.insert(handle, shape);
        handle
    }

    fn remove(&mut self, handle: ShapeHandle) -> Option<Shape> {
        self.shapes.remove(&handle)
    }

    fn get(&self, handle: ShapeHandle) -> Option<&Shape> {
        self.shapes.get(&handle)
    }

    fn get_mut(&mut self, handle: ShapeHandle) -> Option<&mut Shape> {
        self.shapes.get_mut(&handle)
    }

    fn hit_test(&self, point: Vec2) -> Option<ShapeHandle> {
        self.shapes
            .iter()
            .rev()
            .find(|(_, shape)| shape.interactive && shape.contains(point))
            .map(|(handle, _)| *handle)
    }

    fn clear(&mut self) {
        self.shapes.clear();
    }

    fn set_view(&mut self, view: ViewTransform) {
        self.view = view;
    }

    fn set_cursor(&mut self, cursor: SystemCursorIcon) {
        self.cursor = cursor;
    }

    fn set_background(&mut self, background: Option<PageBackground>) {
        self.background = background;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_test_prefers_topmost_interactive() {
        let mut canvas = SceneCanvas::default();
        let bottom = canvas.insert(Shape::frame(Vec2::ZERO, Vec2::splat(100.0), Color::WHITE));
        let top = canvas.insert(Shape::frame(Vec2::splat(10.0), Vec2::splat(20.0), Color::WHITE));
        let mut passive = Shape::frame(Vec2::splat(10.0), Vec2::splat(20.0), Color::WHITE);
        passive.interactive = false;
        canvas.insert(passive);

        assert_eq!(canvas.hit_test(Vec2::splat(15.0)), Some(top));
        assert_eq!(canvas.hit_test(Vec2::splat(80.0)), Some(bottom));
        assert_eq!(canvas.hit_test(Vec2::splat(150.0)), None);
    }

    #[test]
    fn test_labels_are_not_hit() {
        let mut canvas = SceneCanvas::default();
        canvas.insert(Shape::label("Figure 1", Vec2::ZERO, Color::WHITE));
        assert_eq!(canvas.hit_test(Vec2::ZERO), None);
    }

    #[test]
    fn test_scaled_bounds() {
        let mut shape = Shape::frame(Vec2::new(10.0, 10.0), Vec2::new(40.0, 30.0), Color::WHITE);
        shape.scale = Vec2::new(2.0, 0.5);
        assert_eq!(shape.scaled_size(), Vec2::new(80.0, 15.0));
        assert!(shape.contains(Vec2::new(85.0, 20.0)));
        assert!(!shape.contains(Vec2::new(85.0, 30.0)));
    }

    #[test]
    fn test_handles_are_never_reused() {
        let mut canvas = SceneCanvas::default();
        let first = canvas.insert(Shape::frame(Vec2::ZERO, Vec2::ONE, Color::WHITE));
        canvas.clear();
        let second = canvas.insert(Shape::frame(Vec2::ZERO, Vec2::ONE, Color::WHITE));
        assert_ne!(first, second);
        assert!(canvas.get(first).is_none());
        assert_eq!(canvas.len(), 1);
    }
}
