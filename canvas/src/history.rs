//! Undo/redo history as a log of full object-list snapshots.
//!
//! The log always holds at least one snapshot (the state the engine started
//! from or last imported), so the index is valid for the lifetime of the log.
//! Committing after an undo truncates the redo branch. When a cap is set the
//! oldest snapshots are dropped once the log grows past it.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use crate::doc::CanvasObject;

pub type Snapshot = Vec<CanvasObject>;

#[derive(Debug, Clone)]
pub struct History {
    snapshots: Vec<Snapshot>,
    index: usize,
    cap: Option<usize>,
}

impl History {
    /// Start a log at `initial`. A cap below one is treated as one.
    #[must_use]
    pub fn new(initial: Snapshot, cap: Option<usize>) -> Self {
        Self { snapshots: vec![initial], index: 0, cap: cap.map(|c| c.max(1)) }
    }

    /// Append `snapshot` after the current index, discarding any redo branch.
    pub fn commit(&mut self, snapshot: Snapshot) {
        self.snapshots.truncate(self.index + 1);
        self.snapshots.push(snapshot);
        self.index = self.snapshots.len() - 1;
        if let Some(cap) = self.cap {
            let overflow = self.snapshots.len().saturating_sub(cap);
            if overflow > 0 {
                self.snapshots.drain(..overflow);
                self.index -= overflow;
            }
        }
    }

    /// Step back one snapshot. `None` at the oldest retained snapshot.
    pub fn undo(&mut self) -> Option<&Snapshot> {
        if !self.can_undo() {
            return None;
        }
        self.index -= 1;
        self.snapshots.get(self.index)
    }

    /// Step forward one snapshot. `None` at the tip.
    pub fn redo(&mut self) -> Option<&Snapshot> {
        if !self.can_redo() {
            return None;
        }
        self.index += 1;
        self.snapshots.get(self.index)
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.snapshots.len()
    }

    /// Drop every snapshot and restart the log at `initial`.
    pub fn reset(&mut self, initial: Snapshot) {
        self.snapshots.clear();
        self.snapshots.push(initial);
        self.index = 0;
    }

    /// Snapshot at the current index.
    #[must_use]
    pub fn current(&self) -> &[CanvasObject] {
        self.snapshots.get(self.index).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn snapshot_at(&self, index: usize) -> Option<&[CanvasObject]> {
        self.snapshots.get(index).map(Vec::as_slice)
    }

    /// Number of retained snapshots, including the initial one.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Never true: the log always holds its initial snapshot.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn cap(&self) -> Option<usize> {
        self.cap
    }
}
