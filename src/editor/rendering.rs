//! Draws the annotator's canvas: page sprite, gizmo frames, egui labels.

use bevy::gizmos::config::{GizmoConfigGroup, GizmoConfigStore};
use bevy::prelude::*;
use bevy_egui::{EguiContexts, egui};

use crate::common::DragMode;
use crate::constants::HANDLE_SIZE;

use super::Annotator;
use super::canvas::{CanvasSurface, ShapeKind};
use super::params::CameraParams;

/// World-space length of one dash (and gap) of a preview outline
const DASH_LENGTH: f32 = 6.0;

const HANDLE_COLOR: Color = Color::WHITE;

/// Gizmo group for region outlines
#[derive(Default, Reflect, GizmoConfigGroup)]
pub struct RegionGizmoGroup;

pub fn configure_region_gizmos(mut config_store: ResMut<GizmoConfigStore>) {
    let (config, _) = config_store.config_mut::<RegionGizmoGroup>();
    config.line.width = 2.0;
}

/// The sprite showing the current page image
#[derive(Component)]
pub struct PageSprite;

pub fn spawn_page_sprite(mut commands: Commands) {
    commands.spawn((
        Sprite::default(),
        Transform::default(),
        Visibility::Hidden,
        PageSprite,
    ));
}

pub fn sync_page_sprite(
    annotator: Res<Annotator>,
    camera: CameraParams,
    mut sprite_query: Query<(&mut Sprite, &mut Transform, &mut Visibility), With<PageSprite>>,
) {
    let Ok((mut sprite, mut transform, mut visibility)) = sprite_query.single_mut() else {
        return;
    };
    let canvas = annotator.canvas();
    let Some((image, size)) = canvas
        .background()
        .and_then(|bg| bg.image.clone().map(|image| (image, bg.size)))
    else {
        *visibility = Visibility::Hidden;
        return;
    };

    let view = canvas.view();
    let Some(center) = camera.screen_to_world(view.to_screen(size / 2.0)) else {
        return;
    };
    if sprite.image != image {
        sprite.image = image;
    }
    sprite.custom_size = Some(size * view.scale);
    transform.translation = center.extend(0.0);
    *visibility = Visibility::Visible;
}

fn outline(
    gizmos: &mut Gizmos<RegionGizmoGroup>,
    corners: [Vec2; 4],
    color: Color,
    dashed: bool,
) {
    for i in 0..4 {
        let (start, end) = (corners[i], corners[(i + 1) % 4]);
        if dashed {
            dashed_line(gizmos, start, end, color);
        } else {
            gizmos.line_2d(start, end, color);
        }
    }
}

fn dashed_line(gizmos: &mut Gizmos<RegionGizmoGroup>, start: Vec2, end: Vec2, color: Color) {
    let length = start.distance(end);
    if length <= f32::EPSILON {
        return;
    }
    let direction = (end - start) / length;
    let mut offset = 0.0;
    while offset < length {
        let dash_end = (offset + DASH_LENGTH).min(length);
        gizmos.line_2d(start + direction * offset, start + direction * dash_end, color);
        offset += DASH_LENGTH * 2.0;
    }
}

/// Convert a logical rectangle to its four world-space corners.
fn world_corners(camera: &CameraParams, annotator: &Annotator, rect: Rect) -> Option<[Vec2; 4]> {
    let view = annotator.canvas().view();
    let to_world = |logical: Vec2| camera.screen_to_world(view.to_screen(logical));
    Some([
        to_world(rect.min)?,
        to_world(Vec2::new(rect.max.x, rect.min.y))?,
        to_world(rect.max)?,
        to_world(Vec2::new(rect.min.x, rect.max.y))?,
    ])
}

pub fn draw_regions(
    mut gizmos: Gizmos<RegionGizmoGroup>,
    annotator: Res<Annotator>,
    camera: CameraParams,
) {
    for (_, shape) in annotator.canvas().shapes() {
        if shape.kind != ShapeKind::Frame {
            continue;
        }
        let Some(corners) = world_corners(&camera, &annotator, shape.bounds()) else {
            continue;
        };
        outline(
            &mut gizmos,
            corners,
            shape.color.with_alpha(shape.opacity),
            shape.dashed,
        );
    }

    // Resize handles on the selection, sized in screen pixels
    let Some(bounds) = annotator
        .selected_uuid()
        .and_then(|uuid| annotator.registry().find_by_uuid(uuid))
        .and_then(|entry| annotator.canvas().get(entry.frame))
        .map(|frame| frame.bounds())
    else {
        return;
    };
    let half = HANDLE_SIZE / annotator.viewport().zoom() / 2.0;
    for (point, _) in DragMode::handles(bounds.min, bounds.max) {
        let handle = Rect::from_center_half_size(point, Vec2::splat(half));
        if let Some(corners) = world_corners(&camera, &annotator, handle) {
            outline(&mut gizmos, corners, HANDLE_COLOR, false);
        }
    }
}

pub(crate) fn to_color32(color: Color, opacity: f32) -> egui::Color32 {
    let srgba = color.to_srgba();
    egui::Color32::from_rgba_unmultiplied(
        (srgba.red * 255.0) as u8,
        (srgba.green * 255.0) as u8,
        (srgba.blue * 255.0) as u8,
        (opacity.clamp(0.0, 1.0) * 255.0) as u8,
    )
}

/// Region labels, drawn as egui text above each frame.
pub fn draw_region_labels(mut contexts: EguiContexts, annotator: Res<Annotator>) -> Result {
    let ctx = contexts.ctx_mut()?;
    let canvas = annotator.canvas();
    let view = canvas.view();

    for (handle, shape) in canvas.shapes() {
        let ShapeKind::Label { text } = &shape.kind else {
            continue;
        };
        let screen = view.to_screen(shape.position);
        egui::Area::new(egui::Id::new(("region_label", handle)))
            .fixed_pos(egui::pos2(screen.x, screen.y))
            .order(egui::Order::Background)
            .interactable(false)
            .show(ctx, |ui| {
                ui.label(
                    egui::RichText::new(text)
                        .color(to_color32(shape.color, shape.opacity))
                        .strong(),
                );
            });
    }
    Ok(())
}
