use std::sync::Arc;

use chrono::Utc;
use log::{info, warn};

use super::registry::GroupSpawnRegistry;
use super::types::{GroupId, SkipReason, SpawnOutcome};
use crate::logutil::escape_log;
use crate::storage::{RecordStore, StoreError};

/// Picks a collectible at random and makes it the group's active spawn.
///
/// Announcing the spawn is left to the caller; nothing here talks to the chat.
#[derive(Clone)]
pub struct SpawnSelector {
    store: Arc<dyn RecordStore>,
    registry: GroupSpawnRegistry,
}

impl SpawnSelector {
    pub fn new(store: Arc<dyn RecordStore>, registry: GroupSpawnRegistry) -> Self {
        Self { store, registry }
    }

    pub fn try_spawn(&self, group: GroupId) -> Result<SpawnOutcome, StoreError> {
        if let Some(active) = self.registry.get(group)? {
            warn!(
                "spawn skipped in group {}: '{}' still active since {}",
                group,
                escape_log(&active.collectible.name),
                active.spawned_at
            );
            return Ok(SpawnOutcome::Skipped(SkipReason::AlreadyActive));
        }

        let Some(collectible) = self.store.random_collectible()? else {
            warn!(
                "no collectibles in the catalogue; group {} reached its spawn trigger with nothing to spawn",
                group
            );
            return Ok(SpawnOutcome::NoCollectiblesAvailable);
        };

        self.registry.set(group, collectible.clone(), Utc::now())?;
        info!(
            "spawned '{}' ({}) in group {}",
            escape_log(&collectible.name),
            collectible.rarity,
            group
        );
        Ok(SpawnOutcome::Spawned(collectible))
    }
}
