//! Undo history.
//!
//! Every entry is a full snapshot of the canvas at a commit point. Snapshots
//! are reference counted and never mutated after they are recorded: the live
//! canvas goes through [`Arc::make_mut`], which clones the sequence the first
//! time it is edited while a snapshot still shares it.

use crate::shapes::Shape;
use std::sync::Arc;

/// An immutable snapshot of the canvas.
pub type Snapshot = Arc<Vec<Shape>>;

/// Append-only snapshot log with undo.
#[derive(Debug, Clone, Default)]
pub struct History {
    /// State restored once every entry has been undone.
    base: Snapshot,
    entries: Vec<Snapshot>,
}

impl History {
    /// Create an empty history whose floor is the empty canvas.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a commit.
    pub fn commit(&mut self, snapshot: Snapshot) {
        self.entries.push(snapshot);
    }

    /// Drop the latest entry and return the state that now applies.
    ///
    /// Undoing past the first entry is a no-op that keeps returning the floor.
    pub fn undo(&mut self) -> Snapshot {
        self.entries.pop();
        self.latest()
    }

    /// The state after the most recent commit (or the floor).
    pub fn latest(&self) -> Snapshot {
        self.entries.last().unwrap_or(&self.base).clone()
    }

    /// Forget every entry and start over from `base`.
    pub fn reset(&mut self, base: Snapshot) {
        self.entries.clear();
        self.base = base;
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty()
    }

    /// Recorded entries, oldest first.
    pub fn entries(&self) -> &[Snapshot] {
        &self.entries
    }
}
