//! Bounded undo/redo history of whole snapshots.

use std::collections::VecDeque;
use std::sync::Arc;

/// Maximum number of snapshots kept by default.
pub const HISTORY_CAPACITY: usize = 50;

/// Undo/redo history over immutable snapshots.
///
/// Holds an ordered sequence of snapshots and a cursor at the active one.
/// Invariants: `cursor < len` whenever the store is non-empty, and
/// `len <= capacity`. Snapshots are shared as `Arc<T>` so `undo` followed by
/// `redo` hands back the very same allocation that was current before.
#[derive(Debug, Clone)]
pub struct SnapshotStore<T> {
    entries: VecDeque<Arc<T>>,
    cursor: usize,
    capacity: usize,
}

impl<T> SnapshotStore<T> {
    /// Create an empty store with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    /// Create an empty store holding at most `capacity` snapshots (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            cursor: 0,
            capacity: capacity.max(1),
        }
    }

    /// Create a store whose history starts with `initial`.
    pub fn with_initial(initial: impl Into<Arc<T>>) -> Self {
        let mut store = Self::new();
        store.push(initial);
        store
    }

    /// Record a new snapshot.
    ///
    /// Drops every entry after the cursor, appends `snapshot` and moves the
    /// cursor onto it. When the history outgrows its capacity the oldest entry
    /// is evicted and the cursor shifts down with it, so the pushed snapshot
    /// stays last.
    pub fn push(&mut self, snapshot: impl Into<Arc<T>>) -> Arc<T> {
        let snapshot = snapshot.into();

        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }
        self.entries.push_back(Arc::clone(&snapshot));
        self.cursor = self.entries.len() - 1;

        if self.entries.len() > self.capacity {
            self.entries.pop_front();
            self.cursor -= 1;
        }

        snapshot
    }

    /// Step back one snapshot. Returns `None` when there is nothing to undo.
    pub fn undo(&mut self) -> Option<Arc<T>> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor).cloned()
    }

    /// Step forward one snapshot. Returns `None` when there is nothing to redo.
    pub fn redo(&mut self) -> Option<Arc<T>> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor).cloned()
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// The active snapshot, if any has been pushed.
    pub fn current(&self) -> Option<&Arc<T>> {
        self.entries.get(self.cursor)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Snapshots from oldest to newest.
    pub fn entries(&self) -> impl Iterator<Item = &Arc<T>> {
        self.entries.iter()
    }
}

impl<T> Default for SnapshotStore<T> {
    fn default() -> Self {
        Self::new()
    }
}
