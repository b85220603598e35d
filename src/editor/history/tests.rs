//! Unit tests for the history module.

use bevy::prelude::*;

use super::snapshot_history::SnapshotHistory;
use crate::constants::HISTORY_CAPACITY;
use crate::model::{AnnotationItem, RegionType, Role};

fn table(id: u32) -> AnnotationItem {
    AnnotationItem::new(
        RegionType::Table,
        id,
        Role::Body,
        Vec2::ZERO,
        Vec2::splat(10.0 * id as f32),
    )
}

#[test]
fn test_snapshot_history_record() {
    let mut history = SnapshotHistory::default();
    assert!(!history.can_undo());

    history.record(0, &[table(1)]);
    assert!(history.can_undo());
    assert_eq!(history.len(), 1);
}

#[test]
fn test_snapshot_is_a_deep_copy() {
    let mut history = SnapshotHistory::default();
    let mut items = vec![table(1)];
    history.record(2, &items);

    items[0].id = 42;
    items.push(table(2));

    let snapshot = history.undo().unwrap();
    assert_eq!(snapshot.page_index, 2);
    assert_eq!(snapshot.items.len(), 1);
    assert_eq!(snapshot.items[0].id, 1);
}

#[test]
fn test_undo_is_lifo() {
    let mut history = SnapshotHistory::default();
    history.record(0, &[]);
    history.record(1, &[table(1)]);

    assert_eq!(history.undo().unwrap().page_index, 1);
    assert_eq!(history.undo().unwrap().page_index, 0);
    assert!(history.undo().is_none());
}

#[test]
fn test_snapshot_history_max_size() {
    let mut history = SnapshotHistory::default();

    for page in 0..100 {
        history.record(page, &[]);
    }

    // Oldest snapshots are evicted first
    assert_eq!(history.len(), HISTORY_CAPACITY);
    let mut newest = None;
    let mut oldest = None;
    while let Some(snapshot) = history.undo() {
        newest.get_or_insert(snapshot.page_index);
        oldest = Some(snapshot.page_index);
    }
    assert_eq!(newest, Some(99));
    assert_eq!(oldest, Some(100 - HISTORY_CAPACITY));
}

#[test]
fn test_n_undos_restore_initial_list() {
    let mut history = SnapshotHistory::default();
    let initial = vec![table(1), table(2)];
    let mut current = initial.clone();

    for id in 3..8 {
        history.record(0, &current);
        current.push(table(id));
    }
    history.record(0, &current);
    current.remove(0);

    while let Some(snapshot) = history.undo() {
        current = snapshot.items;
    }
    assert_eq!(current, initial);
}

#[test]
fn test_zero_capacity_still_keeps_one() {
    let mut history = SnapshotHistory::with_capacity(0);
    history.record(0, &[]);
    history.record(1, &[]);
    assert_eq!(history.capacity(), 1);
    assert_eq!(history.len(), 1);
}
