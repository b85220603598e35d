//! Undo history for annotation edits.
//!
//! Every mutating operation (create, delete, geometry commit, id/role edit)
//! records a full copy of the affected page's item list *before* the change.
//! Undo pops the newest copy and the owning document reinstates it wholesale,
//! navigating to the snapshot's page first when needed.
//!
//! ## Usage
//!
//! - **Ctrl+Z**: Undo the last edit
//!
//! ## Module Structure
//!
//! - [`snapshot_history`] - Bounded snapshot stack

mod snapshot_history;

#[cfg(test)]
mod tests;

pub use snapshot_history::{HistorySnapshot, SnapshotHistory};
