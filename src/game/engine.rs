use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use log::{debug, trace};

use super::counter::SpawnCounter;
use super::registry::GroupSpawnRegistry;
use super::resolver::CatchResolver;
use super::selector::SpawnSelector;
use super::throttle::ActivityThrottle;
use super::types::{
    ActiveSpawn, CatchOutcome, Claimer, GroupId, MessageOutcome, SpawnOutcome, UserId,
};
use crate::storage::{RecordStore, StoreError};

/// Tunables the engine needs from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameSettings {
    /// Consecutive messages one sender may contribute before being ignored.
    pub anti_spam_limit: u32,
    /// Admitted messages needed to trigger a spawn.
    pub spawn_threshold: u32,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            anti_spam_limit: 10,
            spawn_threshold: 50,
        }
    }
}

/// In-memory, per-group activity state. Lost on restart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupState {
    pub throttle: ActivityThrottle,
    pub counter: SpawnCounter,
}

impl GroupState {
    fn is_pristine(&self) -> bool {
        self.throttle.is_absent() && self.counter.is_zero()
    }
}

type GroupSlot = Arc<Mutex<GroupState>>;

fn lock(slot: &GroupSlot) -> MutexGuard<'_, GroupState> {
    // A panic while holding the lock leaves plain counters behind; keep going.
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Keyed table of per-group state. The outer lock is only held to find or insert
/// a slot; all game work happens under the slot's own mutex.
#[derive(Default)]
struct GroupTable {
    slots: RwLock<HashMap<GroupId, GroupSlot>>,
}

impl GroupTable {
    fn slot(&self, group: GroupId) -> GroupSlot {
        {
            let slots = self.slots.read().unwrap_or_else(|p| p.into_inner());
            if let Some(slot) = slots.get(&group) {
                return slot.clone();
            }
        }
        let mut slots = self.slots.write().unwrap_or_else(|p| p.into_inner());
        slots.entry(group).or_default().clone()
    }

    fn remove(&self, group: GroupId) {
        self.slots
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .remove(&group);
    }

    fn prune_idle(&self) -> usize {
        let mut slots = self.slots.write().unwrap_or_else(|p| p.into_inner());
        let before = slots.len();
        slots.retain(|_, slot| {
            if Arc::strong_count(slot) > 1 {
                return true;
            }
            match slot.try_lock() {
                Ok(state) => !state.is_pristine(),
                Err(_) => true,
            }
        });
        before - slots.len()
    }

    fn len(&self) -> usize {
        self.slots.read().unwrap_or_else(|p| p.into_inner()).len()
    }
}

/// # Game Engine
///
/// Owns every group's spawn-trigger and catch state and serialises access per
/// group: throttle, counter, active spawn and last winner for one group are only
/// read or written while that group's mutex is held. Different groups never wait
/// on each other.
///
/// The engine never talks to the chat. Callers turn the returned outcomes into
/// announcements and replies after the state transition has been decided.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use catchbot::game::{GameEngine, GameSettings};
/// use catchbot::game::types::{Claimer, MessageOutcome};
/// use catchbot::storage::{RecordStore, SledStore};
///
/// fn main() -> anyhow::Result<()> {
///     let store: Arc<dyn RecordStore> = Arc::new(SledStore::open("./data/catchbot.sled")?);
///     let engine = GameEngine::new(store, GameSettings::default());
///     if let MessageOutcome::Spawn(outcome) = engine.observe_message(-1001, 42)? {
///         println!("spawn attempt: {:?}", outcome);
///     }
///     let result = engine.attempt_catch(-1001, &Claimer::new(42, "Alice"), "Goku")?;
///     println!("{:?}", result);
///     Ok(())
/// }
/// ```
pub struct GameEngine {
    settings: GameSettings,
    groups: GroupTable,
    registry: GroupSpawnRegistry,
    selector: SpawnSelector,
    resolver: CatchResolver,
}

impl GameEngine {
    pub fn new(store: Arc<dyn RecordStore>, settings: GameSettings) -> Self {
        let registry = GroupSpawnRegistry::new(store.clone());
        Self {
            settings,
            groups: GroupTable::default(),
            selector: SpawnSelector::new(store, registry.clone()),
            resolver: CatchResolver::new(registry.clone()),
            registry,
        }
    }

    pub fn settings(&self) -> GameSettings {
        self.settings
    }

    fn with_group<R>(&self, group: GroupId, f: impl FnOnce(&mut GroupState) -> R) -> R {
        let slot = self.groups.slot(group);
        let mut state = lock(&slot);
        f(&mut *state)
    }

    /// Anti-spam check for one message; see [`ActivityThrottle::admit`].
    pub fn admit(&self, group: GroupId, sender: UserId) -> bool {
        let limit = self.settings.anti_spam_limit;
        self.with_group(group, |state| state.throttle.admit(sender, limit))
    }

    /// Count one admitted message. On reaching the threshold the counter and the
    /// throttle both start over and `true` is returned.
    pub fn tick(&self, group: GroupId) -> bool {
        self.with_group(group, |state| self.tick_locked(group, state))
    }

    fn tick_locked(&self, group: GroupId, state: &mut GroupState) -> bool {
        let reached = state.counter.tick(self.settings.spawn_threshold);
        if reached {
            state.throttle.reset();
            debug!("group {} reached spawn threshold {}", group, self.settings.spawn_threshold);
        }
        reached
    }

    pub fn try_spawn(&self, group: GroupId) -> Result<SpawnOutcome, StoreError> {
        self.with_group(group, |_| self.selector.try_spawn(group))
    }

    pub fn attempt_catch(
        &self,
        group: GroupId,
        claimer: &Claimer,
        guessed_name: &str,
    ) -> Result<CatchOutcome, StoreError> {
        self.with_group(group, |_| {
            self.resolver.attempt_catch(group, claimer, guessed_name)
        })
    }

    /// Run one plain group message through throttle, counter and selector as a
    /// single step. Messages are not counted while a spawn is waiting.
    pub fn observe_message(
        &self,
        group: GroupId,
        sender: UserId,
    ) -> Result<MessageOutcome, StoreError> {
        self.with_group(group, |state| -> Result<MessageOutcome, StoreError> {
            if self.registry.get(group)?.is_some() {
                return Ok(MessageOutcome::Blocked);
            }
            if !state.throttle.admit(sender, self.settings.anti_spam_limit) {
                trace!("group {}: sender {} throttled", group, sender);
                return Ok(MessageOutcome::Throttled);
            }
            if !self.tick_locked(group, state) {
                return Ok(MessageOutcome::Counted(state.counter.count()));
            }
            Ok(MessageOutcome::Spawn(self.selector.try_spawn(group)?))
        })
    }

    pub fn active_spawn(&self, group: GroupId) -> Result<Option<ActiveSpawn>, StoreError> {
        self.with_group(group, |_| self.registry.get(group))
    }

    pub fn last_winner(&self, group: GroupId) -> Result<Option<String>, StoreError> {
        self.with_group(group, |_| self.registry.last_winner(group))
    }

    /// Administrative removal of the group's spawn. Returns the spawn that was
    /// cleared, if any.
    pub fn clear_spawn(&self, group: GroupId) -> Result<Option<ActiveSpawn>, StoreError> {
        self.with_group(group, |_| -> Result<Option<ActiveSpawn>, StoreError> {
            let active = self.registry.get(group)?;
            if active.is_some() {
                self.registry.clear(group)?;
            }
            Ok(active)
        })
    }

    /// Drop in-memory activity for a group the bot left.
    pub fn forget_group(&self, group: GroupId) {
        self.groups.remove(group);
    }

    /// Retire per-group slots that hold nothing worth keeping. Returns how many
    /// were removed.
    pub fn prune_idle(&self) -> usize {
        self.groups.prune_idle()
    }

    /// Number of groups with in-memory activity state.
    pub fn tracked_groups(&self) -> usize {
        self.groups.len()
    }

    /// Snapshot of a group's in-memory state, mainly for status output and tests.
    pub fn group_state(&self, group: GroupId) -> GroupState {
        self.with_group(group, |state| *state)
    }
}
