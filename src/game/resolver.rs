use chrono::Utc;
use log::{debug, info};

use super::registry::GroupSpawnRegistry;
use super::types::{CatchOutcome, CatchRecord, Claimer, GroupId};
use crate::logutil::escape_log;
use crate::storage::StoreError;

/// Claim state machine for a group's active spawn.
///
/// `Idle` (no spawn) and `Spawned` are not stored separately: the registry entry
/// is the state. A correct guess moves `Spawned` back to `Idle` through
/// [`GroupSpawnRegistry::claim`], which only succeeds for the spawn that was read.
#[derive(Clone)]
pub struct CatchResolver {
    registry: GroupSpawnRegistry,
}

impl CatchResolver {
    pub fn new(registry: GroupSpawnRegistry) -> Self {
        Self { registry }
    }

    pub fn attempt_catch(
        &self,
        group: GroupId,
        claimer: &Claimer,
        guessed_name: &str,
    ) -> Result<CatchOutcome, StoreError> {
        let Some(spawn) = self.registry.get(group)? else {
            return self.idle_outcome(group);
        };

        if !spawn.collectible.matches_guess(guessed_name) {
            debug!(
                "wrong guess '{}' by {} in group {}",
                escape_log(guessed_name),
                claimer.id,
                group
            );
            return Ok(CatchOutcome::WrongName);
        }

        let record = CatchRecord::new(claimer, &spawn, Utc::now());
        if !self.registry.claim(&spawn, &record)? {
            // Someone else resolved this spawn between our read and the commit.
            return self.idle_outcome(group);
        }

        info!(
            "{} ({}) caught '{}' in group {}",
            escape_log(&claimer.display_name),
            claimer.id,
            escape_log(&spawn.collectible.name),
            group
        );
        Ok(CatchOutcome::Success(spawn.collectible))
    }

    fn idle_outcome(&self, group: GroupId) -> Result<CatchOutcome, StoreError> {
        Ok(match self.registry.last_winner(group)? {
            Some(winner) => CatchOutcome::AlreadyCaughtBy(winner),
            None => CatchOutcome::NothingActive,
        })
    }
}
