//! One editing session.

use std::sync::Arc;

use lander_config::{
    resolve_json, ConfigDocument, ConfigError, ConfigSnapshot, IdAllocator, ItemList, Section,
};
use lander_preview::{DeviceMode, PreviewChannel, ReloadDecision, Transport};
use lander_store::{DurableSlots, SnapshotStore, StorageError};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("No item {id} in {list}")]
    UnknownItem { list: ItemList, id: u32 },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Editor flags shown next to the form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub can_undo: bool,
    pub can_redo: bool,
    pub unsaved: bool,
    pub device: DeviceMode,
    pub generation: u64,
    pub history: usize,
}

/// The editor side of the system.
///
/// Every change produces a new snapshot which is pushed onto the history,
/// mirrored into both durable slots and broadcast to the rendering context.
/// Undo and redo move through the history and propagate the same way.
#[derive(Debug)]
pub struct EditorSession<T: Transport> {
    store: SnapshotStore<ConfigSnapshot>,
    channel: PreviewChannel<T>,
    slots: DurableSlots,
    ids: IdAllocator,
    unsaved: bool,
}

impl<T: Transport> EditorSession<T> {
    /// Start a session from durable storage, falling back to the defaults.
    pub fn open(channel: PreviewChannel<T>, slots: DurableSlots) -> Self {
        let initial = match slots.load::<ConfigDocument>() {
            Some(stored) => {
                tracing::info!("Restored configuration from storage");
                stored.resolve(ConfigSnapshot::default())
            }
            None => ConfigSnapshot::default(),
        };

        let session = Self {
            store: SnapshotStore::with_initial(initial),
            channel,
            slots,
            ids: IdAllocator::new(),
            unsaved: false,
        };
        session.sync();
        session
    }

    pub fn current(&self) -> Arc<ConfigSnapshot> {
        self.store.current().cloned().unwrap_or_default()
    }

    /// Replace one top-level section with `value`.
    pub fn update_section(
        &mut self,
        section: Section,
        value: serde_json::Value,
    ) -> Result<Arc<ConfigSnapshot>, SessionError> {
        let next = self.current().with_section(section, value)?;
        Ok(self.commit(next))
    }

    /// Append a placeholder item to `list`. Returns the new snapshot and the
    /// item's id.
    pub fn add_item(
        &mut self,
        list: ItemList,
    ) -> Result<(Arc<ConfigSnapshot>, u32), SessionError> {
        let current = self.current();
        let id = self.ids.allocate(&current, list)?;
        let snapshot = self.commit(current.with_item_added(list, id));
        Ok((snapshot, id))
    }

    pub fn remove_item(
        &mut self,
        list: ItemList,
        id: u32,
    ) -> Result<Arc<ConfigSnapshot>, SessionError> {
        let next = self
            .current()
            .with_item_removed(list, id)
            .ok_or(SessionError::UnknownItem { list, id })?;
        Ok(self.commit(next))
    }

    pub fn undo(&mut self) -> Option<Arc<ConfigSnapshot>> {
        let snapshot = self.store.undo()?;
        self.unsaved = true;
        self.sync();
        Some(snapshot)
    }

    pub fn redo(&mut self) -> Option<Arc<ConfigSnapshot>> {
        let snapshot = self.store.redo()?;
        self.unsaved = true;
        self.sync();
        Some(snapshot)
    }

    /// Import a configuration document. A complete document is taken as is,
    /// a partial one is merged onto the defaults.
    ///
    /// A malformed document leaves the session untouched.
    pub fn import_json(&mut self, source: &str) -> Result<Arc<ConfigSnapshot>, ConfigError> {
        let imported = resolve_json(ConfigSnapshot::default(), source)?;
        Ok(self.commit(imported))
    }

    pub fn export_json(&self) -> Result<String, ConfigError> {
        self.current().to_json_pretty()
    }

    /// Persist the current snapshot into the cross-session slot.
    pub fn save(&mut self) -> Result<(), SessionError> {
        self.slots.save(self.current().as_ref())?;
        self.unsaved = false;
        Ok(())
    }

    /// The rendering context reported it finished loading.
    pub fn preview_ready(&mut self) {
        let current = self.current();
        self.channel.on_ready(&current);
    }

    pub fn mount_preview(&mut self) {
        self.channel.mount();
    }

    pub fn set_device(&mut self, device: DeviceMode) -> ReloadDecision {
        self.channel.set_device(device)
    }

    pub fn preview_url(&self, base: &str) -> String {
        self.channel.frame_url(base)
    }

    pub fn state(&self) -> SessionState {
        SessionState {
            can_undo: self.store.can_undo(),
            can_redo: self.store.can_redo(),
            unsaved: self.unsaved,
            device: self.channel.frame().device(),
            generation: self.channel.frame().generation(),
            history: self.store.len(),
        }
    }

    pub fn channel(&self) -> &PreviewChannel<T> {
        &self.channel
    }

    pub fn slots(&self) -> &DurableSlots {
        &self.slots
    }

    fn commit(&mut self, next: ConfigSnapshot) -> Arc<ConfigSnapshot> {
        let snapshot = self.store.push(next);
        self.unsaved = true;
        self.sync();
        snapshot
    }

    fn sync(&self) {
        let current = self.current();
        self.slots.mirror(current.as_ref());
        self.channel.broadcast(&current);
    }
}
