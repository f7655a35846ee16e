//! Snapshot history and durable storage for the lander editor.
//!
//! The history knows nothing about rendering or transport; it only tracks
//! whole snapshots and a cursor into them.

pub mod history;
pub mod storage;

pub use history::{SnapshotStore, HISTORY_CAPACITY};
pub use storage::{DurableSlots, FileStore, KeyValueStore, MemoryStore, StorageError, STORAGE_KEY};
