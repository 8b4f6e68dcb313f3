//! # Storage Module - Record Store
//!
//! Durable home for everything the game must keep across restarts:
//!
//! - the collectible catalogue (admin-managed, read-only to the game core)
//! - each group's active spawn and last winner
//! - append-only catch records that make up every member's collection
//! - the list of groups the bot has joined
//!
//! The game core depends only on the [`RecordStore`] trait. [`SledStore`] is the
//! embedded implementation used by the binary and the tests.
//!
//! ## Layout
//!
//! ```text
//! <data_dir>/catchbot.sled
//! ├── collectibles   ← name_lower → Collectible
//! ├── spawns         ← group id → ActiveSpawn
//! ├── winners        ← group id → display name
//! ├── catches        ← claimer id : timestamp → CatchRecord
//! └── groups         ← group id → GroupRecord
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use catchbot::storage::{RecordStore, SledStoreBuilder};
//! use catchbot::game::types::Collectible;
//!
//! fn main() -> anyhow::Result<()> {
//!     let store = SledStoreBuilder::new("./data/catchbot.sled").open()?;
//!     store.put_collectible(Collectible::new("Goku", "https://example.org/goku.jpg", "SSR", None))?;
//!     assert!(store.random_collectible()?.is_some());
//!     Ok(())
//! }
//! ```

pub mod errors;
mod sled_store;

pub use errors::StoreError;
pub use sled_store::{SledStore, SledStoreBuilder};

use crate::game::types::{ActiveSpawn, CatchRecord, Collectible, GroupId, GroupRecord, UserId};

/// Everything the game core and the bot front-end need from persistence.
///
/// Implementations must make each method atomic per key; [`RecordStore::commit_catch`]
/// must additionally apply its three writes as one transaction.
pub trait RecordStore: Send + Sync {
    /// Insert or replace a collectible, keyed by its lowercase name.
    fn put_collectible(&self, collectible: Collectible) -> Result<(), StoreError>;

    fn collectible_by_name(&self, name: &str) -> Result<Option<Collectible>, StoreError>;

    /// Uniformly random collectible, or `None` when the catalogue is empty.
    fn random_collectible(&self) -> Result<Option<Collectible>, StoreError>;

    /// All collectible display names sorted A–Z.
    fn list_collectible_names(&self) -> Result<Vec<String>, StoreError>;

    fn collectible_count(&self) -> Result<usize, StoreError>;

    fn append_catch_record(&self, record: &CatchRecord) -> Result<(), StoreError>;

    /// Catch records for a claimer, most recent first.
    fn collection_for(&self, claimer: UserId) -> Result<Vec<CatchRecord>, StoreError>;

    /// Distinct collectibles the claimer owns in `category`. Categories compare
    /// case-insensitively and repeat catches count once.
    fn count_by_category(&self, claimer: UserId, category: &str) -> Result<usize, StoreError>;

    fn total_by_category(&self, category: &str) -> Result<usize, StoreError>;

    /// Clear player progress (catch records, active spawns, last winners).
    fn wipe_all(&self) -> Result<(), StoreError>;

    fn load_spawn(&self, group: GroupId) -> Result<Option<ActiveSpawn>, StoreError>;

    fn save_spawn(&self, spawn: &ActiveSpawn) -> Result<(), StoreError>;

    fn delete_spawn(&self, group: GroupId) -> Result<(), StoreError>;

    fn last_winner(&self, group: GroupId) -> Result<Option<String>, StoreError>;

    /// Resolve a claim: if the group still holds a spawn with `spawn.id`, remove it,
    /// append `record` and remember the winner. Returns `false` without writing
    /// anything when the spawn was already gone or replaced.
    fn commit_catch(&self, spawn: &ActiveSpawn, record: &CatchRecord) -> Result<bool, StoreError>;

    fn add_group(&self, group: GroupRecord) -> Result<(), StoreError>;

    fn remove_group(&self, group: GroupId) -> Result<(), StoreError>;

    fn list_groups(&self) -> Result<Vec<GroupRecord>, StoreError>;
}
