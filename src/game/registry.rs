//! Authoritative group → active spawn mapping.
//!
//! The registry writes straight through to the record store so a spawn that was
//! active before a restart is still claimable afterwards. It only guarantees
//! per-key atomicity on its own; [`GameEngine`](super::GameEngine) calls it under
//! the group's lock, which is what makes a group's reads and writes linearizable.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::types::{ActiveSpawn, CatchRecord, Collectible, GroupId};
use crate::storage::{RecordStore, StoreError};

#[derive(Clone)]
pub struct GroupSpawnRegistry {
    store: Arc<dyn RecordStore>,
}

impl GroupSpawnRegistry {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub fn get(&self, group: GroupId) -> Result<Option<ActiveSpawn>, StoreError> {
        self.store.load_spawn(group)
    }

    /// Publish `collectible` as the group's spawn, replacing whatever was there.
    pub fn set(
        &self,
        group: GroupId,
        collectible: Collectible,
        spawned_at: DateTime<Utc>,
    ) -> Result<ActiveSpawn, StoreError> {
        let spawn = ActiveSpawn::new(group, collectible, spawned_at);
        self.store.save_spawn(&spawn)?;
        Ok(spawn)
    }

    pub fn clear(&self, group: GroupId) -> Result<(), StoreError> {
        self.store.delete_spawn(group)
    }

    /// Clear `spawn` only if it is still the group's current spawn, recording the
    /// catch and winner in the same transaction.
    pub fn claim(&self, spawn: &ActiveSpawn, record: &CatchRecord) -> Result<bool, StoreError> {
        self.store.commit_catch(spawn, record)
    }

    pub fn last_winner(&self, group: GroupId) -> Result<Option<String>, StoreError> {
        self.store.last_winner(group)
    }
}
