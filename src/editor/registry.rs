//! Annotation object registry: stable identity to live canvas shapes.

use bevy::prelude::*;
use std::collections::HashMap;
use uuid::Uuid;

use crate::constants::LABEL_OFFSET;
use crate::model::{AnnotationItem, RegionType, Role};

use super::canvas::{CanvasSurface, Shape, ShapeHandle, ShapeKind};

/// The live projection of one annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredShape {
    pub frame: ShapeHandle,
    pub label: ShapeHandle,
    pub item: AnnotationItem,
}

/// Maps `uuid` to its frame/label pair. Shapes never point back at each other
/// or at the item; every association goes through this map.
#[derive(Debug, Default)]
pub struct AnnotationRegistry {
    entries: HashMap<Uuid, RegisteredShape>,
    by_frame: HashMap<ShapeHandle, Uuid>,
    /// Insertion order, for deterministic iteration
    order: Vec<Uuid>,
}

fn label_position(frame_position: Vec2) -> Vec2 {
    frame_position - Vec2::new(0.0, LABEL_OFFSET)
}

impl AnnotationRegistry {
    /// Build the shape pair for `item`, replacing any existing entry with the same uuid.
    pub fn add(&mut self, canvas: &mut impl CanvasSurface, item: AnnotationItem) {
        self.remove_by_uuid(canvas, item.uuid);

        let color = item.region.color();
        let frame = canvas.insert(Shape::frame(item.min(), item.size(), color));
        let label = canvas.insert(Shape::label(
            item.label_text(),
            label_position(item.min()),
            color,
        ));

        let uuid = item.uuid;
        self.by_frame.insert(frame, uuid);
        self.order.push(uuid);
        self.entries.insert(uuid, RegisteredShape { frame, label, item });
    }

    /// Remove both shapes. No-op when absent.
    pub fn remove_by_uuid(
        &mut self,
        canvas: &mut impl CanvasSurface,
        uuid: Uuid,
    ) -> Option<AnnotationItem> {
        let entry = self.entries.remove(&uuid)?;
        self.by_frame.remove(&entry.frame);
        self.order.retain(|u| *u != uuid);
        canvas.remove(entry.frame);
        canvas.remove(entry.label);
        Some(entry.item)
    }

    /// Drop every shape this registry owns.
    pub fn clear(&mut self, canvas: &mut impl CanvasSurface) {
        for entry in self.entries.values() {
            canvas.remove(entry.frame);
            canvas.remove(entry.label);
        }
        self.entries.clear();
        self.by_frame.clear();
        self.order.clear();
    }

    pub fn find_by_uuid(&self, uuid: Uuid) -> Option<&RegisteredShape> {
        self.entries.get(&uuid)
    }

    /// Lookup by the user-facing `(type, id)` key.
    ///
    /// Ids are not unique, so this returns the oldest match. Callers holding a
    /// uuid must use [`Self::find_by_uuid`].
    #[deprecated(note = "ids may collide; look up by uuid")]
    pub fn find_by_type_and_legacy_key(
        &self,
        region: RegionType,
        id: u32,
    ) -> Option<&RegisteredShape> {
        self.order
            .iter()
            .filter_map(|uuid| self.entries.get(uuid))
            .find(|entry| entry.item.region == region && entry.item.id == id)
    }

    /// Resolve a hit-tested frame to its annotation identity.
    pub fn uuid_for_shape(&self, handle: ShapeHandle) -> Option<Uuid> {
        self.by_frame.get(&handle).copied()
    }

    /// Items in insertion order.
    pub fn items(&self) -> impl Iterator<Item = &AnnotationItem> {
        self.order
            .iter()
            .filter_map(|uuid| self.entries.get(uuid))
            .map(|entry| &entry.item)
    }

    pub fn entries(&self) -> impl Iterator<Item = &RegisteredShape> {
        self.order.iter().filter_map(|uuid| self.entries.get(uuid))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Give a region a new id and role, rewriting only its label text.
    ///
    /// Returns the updated record, or `None` for an unknown uuid.
    pub fn update_label_for(
        &mut self,
        canvas: &mut impl CanvasSurface,
        uuid: Uuid,
        new_id: u32,
        role: Role,
    ) -> Option<AnnotationItem> {
        let entry = self.entries.get_mut(&uuid)?;
        entry.item.id = new_id;
        entry.item.role = role;
        let text = entry.item.label_text();
        if let Some(label) = canvas.get_mut(entry.label) {
            label.kind = ShapeKind::Label { text };
        }
        Some(entry.item.clone())
    }

    /// Keep the label glued above the frame's top-left corner.
    pub fn sync_geometry(&self, canvas: &mut impl CanvasSurface, uuid: Uuid) {
        let Some(entry) = self.entries.get(&uuid) else {
            return;
        };
        let Some(position) = canvas.get(entry.frame).map(|frame| frame.position) else {
            return;
        };
        if let Some(label) = canvas.get_mut(entry.label) {
            label.position = label_position(position);
        }
    }

    /// Set the frame's live geometry during a gesture, expressing size
    /// changes as scale the way an interactive canvas does.
    pub fn set_live_bounds(
        &self,
        canvas: &mut impl CanvasSurface,
        uuid: Uuid,
        min: Vec2,
        max: Vec2,
    ) {
        let Some(entry) = self.entries.get(&uuid) else {
            return;
        };
        if let Some(frame) = canvas.get_mut(entry.frame) {
            let base = frame.size.max(Vec2::splat(f32::EPSILON));
            frame.position = min;
            frame.scale = (max - min) / base;
        }
        self.sync_geometry(canvas, uuid);
    }

    /// Commit a move/resize: fold scale into absolute size, reset scale to
    /// one, and write the normalized rect back into the stored record.
    ///
    /// Returns the updated item, or `None` when absent.
    pub fn commit_geometry(
        &mut self,
        canvas: &mut impl CanvasSurface,
        uuid: Uuid,
    ) -> Option<AnnotationItem> {
        let entry = self.entries.get_mut(&uuid)?;
        let frame = canvas.get_mut(entry.frame)?;
        frame.size = frame.scaled_size().abs();
        frame.scale = Vec2::ONE;
        let (min, max) = (frame.position, frame.position + frame.size);
        entry.item.set_corners(min, max);
        let item = entry.item.clone();
        self.sync_geometry(canvas, uuid);
        Some(item)
    }

    /// Restore a frame to its stored record (e.g. after a cancelled gesture).
    pub fn reset_geometry(&self, canvas: &mut impl CanvasSurface, uuid: Uuid) {
        let Some(entry) = self.entries.get(&uuid) else {
            return;
        };
        if let Some(frame) = canvas.get_mut(entry.frame) {
            frame.position = entry.item.min();
            frame.size = entry.item.size();
            frame.scale = Vec2::ONE;
        }
        self.sync_geometry(canvas, uuid);
    }
}
