//! Bounded stack of per-page snapshots.

use std::collections::VecDeque;

use crate::constants::HISTORY_CAPACITY;
use crate::model::AnnotationItem;

/// Deep copy of one page's item list.
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySnapshot {
    pub page_index: usize,
    pub items: Vec<AnnotationItem>,
}

/// Undo stack; the oldest snapshot is evicted once capacity is reached.
#[derive(Debug, Clone)]
pub struct SnapshotHistory {
    /// Oldest first, most recent last
    stack: VecDeque<HistorySnapshot>,
    capacity: usize,
}

impl Default for SnapshotHistory {
    fn default() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }
}

impl SnapshotHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            stack: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a copy of `items` as they are right now on `page_index`.
    pub fn record(&mut self, page_index: usize, items: &[AnnotationItem]) {
        if self.stack.len() == self.capacity {
            self.stack.pop_front();
        }
        self.stack.push_back(HistorySnapshot {
            page_index,
            items: items.to_vec(),
        });
    }

    /// Pop the most recent snapshot.
    pub fn undo(&mut self) -> Option<HistorySnapshot> {
        self.stack.pop_back()
    }

    pub fn can_undo(&self) -> bool {
        !self.stack.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.stack.clear();
    }
}
