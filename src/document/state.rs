use bevy::prelude::*;

use crate::constants::HISTORY_CAPACITY;
use crate::editor::{CanvasEvent, HistorySnapshot, PageNavigation, SnapshotHistory};
use crate::model::{AnnotationItem, IdCollision, PageLayouts, find_id_collisions};

/// What the canvas needs after an event was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Nothing changed
    Unchanged,
    /// The list changed in step with the canvas
    Applied,
    /// The list changed in a way the canvas has not seen; rebuild it
    Rerender,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoStep {
    Nothing,
    /// The current page's list was reinstated; rebuild the canvas
    Restored,
    /// The snapshot belongs to another page. Load it, then call
    /// [`Document::page_loaded`].
    Navigate(usize),
}

/// What showing a freshly loaded page did to a pending undo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLoaded {
    Shown,
    /// The pending undo targeted this page and was reinstated
    UndoApplied,
    /// A pending undo still waits for another page, which must be requested again
    UndoWaiting(usize),
}

/// The paper being annotated and its authoritative per-page lists.
#[derive(Debug, Clone)]
pub struct Document {
    paper: Option<String>,
    page: usize,
    page_count: usize,
    layouts: PageLayouts,
    history: SnapshotHistory,
    pending_undo: Option<HistorySnapshot>,
    /// Bumped by every mutation, so a finished save knows what it wrote
    revision: u64,
    dirty: bool,
}

impl Default for Document {
    fn default() -> Self {
        Self::with_history_capacity(HISTORY_CAPACITY)
    }
}

impl Document {
    pub fn with_history_capacity(capacity: usize) -> Self {
        Self {
            paper: None,
            page: 0,
            page_count: 0,
            layouts: PageLayouts::default(),
            history: SnapshotHistory::with_capacity(capacity),
            pending_undo: None,
            revision: 0,
            dirty: false,
        }
    }

    pub fn paper(&self) -> Option<&str> {
        self.paper.as_deref()
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn layouts(&self) -> &PageLayouts {
        &self.layouts
    }

    pub fn history(&self) -> &SnapshotHistory {
        &self.history
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo() && self.pending_undo.is_none()
    }

    pub fn current_items(&self) -> &[AnnotationItem] {
        self.layouts.page(self.page)
    }

    /// Start editing `paper` with its saved layout. History is per paper.
    pub fn open(&mut self, paper: impl Into<String>, layouts: PageLayouts) {
        self.paper = Some(paper.into());
        self.page = 0;
        self.page_count = 0;
        self.layouts = layouts;
        self.history.clear();
        self.pending_undo = None;
        self.revision += 1;
        self.dirty = false;
    }

    pub fn set_page_count(&mut self, count: usize) {
        self.page_count = count;
    }

    /// A save of `revision` finished. Later edits keep the document dirty.
    pub fn mark_saved(&mut self, revision: u64) {
        if revision == self.revision {
            self.dirty = false;
        }
    }

    /// Page index a navigation request leads to, if it leaves the current page.
    pub fn navigation_target(&self, navigation: PageNavigation) -> Option<usize> {
        if self.page_count == 0 {
            return None;
        }
        let last = self.page_count - 1;
        let target = match navigation {
            PageNavigation::Previous => self.page.checked_sub(1)?,
            PageNavigation::Next => self.page + 1,
            PageNavigation::First => 0,
            PageNavigation::Last => last,
        };
        (target <= last && target != self.page).then_some(target)
    }

    /// Apply one canvas event to the current page, recording a snapshot first.
    pub fn apply_event(&mut self, event: &CanvasEvent) -> ApplyOutcome {
        match event {
            CanvasEvent::Created(item) => {
                self.record();
                let page = self.page;
                let items = self.layouts.page_mut(page);
                let before = items.len();
                if item.region.is_page_singleton() {
                    items.retain(|existing| existing.region != item.region);
                }
                let replaced = before - items.len();
                items.push(item.clone());
                self.touch();
                if replaced > 0 {
                    debug!(
                        "{} replaced {} earlier region(s) on page {}",
                        item.label_text(),
                        replaced,
                        page
                    );
                    ApplyOutcome::Rerender
                } else {
                    ApplyOutcome::Applied
                }
            }
            CanvasEvent::Modified(item) => {
                let Some(index) = self.position_of(item) else {
                    debug!("Modified region {} is not on page {}", item.uuid, self.page);
                    return ApplyOutcome::Unchanged;
                };
                if self.current_items()[index] == *item {
                    return ApplyOutcome::Unchanged;
                }
                self.record();
                let page = self.page;
                self.layouts.page_mut(page)[index] = item.clone();
                self.touch();
                ApplyOutcome::Applied
            }
            CanvasEvent::Removed(item) => {
                let Some(index) = self.position_of(item) else {
                    return ApplyOutcome::Unchanged;
                };
                self.record();
                let page = self.page;
                self.layouts.page_mut(page).remove(index);
                self.touch();
                ApplyOutcome::Applied
            }
            CanvasEvent::SelectionChanged(_) => ApplyOutcome::Unchanged,
        }
    }

    /// Pop the newest snapshot.
    pub fn begin_undo(&mut self) -> UndoStep {
        if self.pending_undo.is_some() {
            return UndoStep::Nothing;
        }
        let Some(snapshot) = self.history.undo() else {
            return UndoStep::Nothing;
        };
        if snapshot.page_index == self.page {
            self.reinstate(snapshot);
            UndoStep::Restored
        } else {
            let page = snapshot.page_index;
            debug!("Undo targets page {}, navigating first", page);
            self.pending_undo = Some(snapshot);
            UndoStep::Navigate(page)
        }
    }

    /// The background of `page` is ready and it becomes the current page.
    pub fn page_loaded(&mut self, page: usize) -> PageLoaded {
        self.page = page;
        match self.pending_undo.take() {
            Some(snapshot) if snapshot.page_index == page => {
                self.reinstate(snapshot);
                PageLoaded::UndoApplied
            }
            Some(snapshot) => {
                let target = snapshot.page_index;
                debug!("Page {} shown while undo waits for page {}", page, target);
                self.pending_undo = Some(snapshot);
                PageLoaded::UndoWaiting(target)
            }
            None => PageLoaded::Shown,
        }
    }

    /// Page the pending undo is waiting for.
    pub fn pending_undo_page(&self) -> Option<usize> {
        self.pending_undo.as_ref().map(|snapshot| snapshot.page_index)
    }

    /// Forget an undo whose page could not be loaded. The snapshot is lost.
    pub fn abandon_pending_undo(&mut self) -> bool {
        self.pending_undo.take().is_some()
    }

    /// Id collisions on the current page.
    pub fn collisions(&self) -> Vec<IdCollision> {
        find_id_collisions(self.current_items())
    }

    fn position_of(&self, item: &AnnotationItem) -> Option<usize> {
        self.current_items()
            .iter()
            .position(|existing| existing.uuid == item.uuid)
    }

    fn touch(&mut self) {
        self.revision += 1;
        self.dirty = true;
    }

    fn record(&mut self) {
        self.history.record(self.page, self.layouts.page(self.page));
    }

    fn reinstate(&mut self, snapshot: HistorySnapshot) {
        debug!(
            "Undo restores {} region(s) on page {}",
            snapshot.items.len(),
            snapshot.page_index
        );
        self.layouts.set_page(snapshot.page_index, snapshot.items);
        self.touch();
    }
}
