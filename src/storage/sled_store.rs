use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::debug;
use rand::Rng;
use sled::transaction::{
    ConflictableTransactionError, ConflictableTransactionResult, TransactionError,
};
use sled::{IVec, Transactional};

use super::{RecordStore, StoreError};
use crate::game::types::{
    ActiveSpawn, CatchRecord, Collectible, GroupId, GroupRecord, UserId, CATCH_SCHEMA_VERSION,
    COLLECTIBLE_SCHEMA_VERSION, GROUP_SCHEMA_VERSION, SPAWN_SCHEMA_VERSION,
};

const TREE_COLLECTIBLES: &str = "collectibles";
const TREE_SPAWNS: &str = "spawns";
const TREE_WINNERS: &str = "winners";
const TREE_CATCHES: &str = "catches";
const TREE_GROUPS: &str = "groups";

fn next_timestamp_nanos() -> i64 {
    let now = Utc::now();
    now.timestamp_nanos_opt()
        .unwrap_or_else(|| now.timestamp_micros() * 1000)
}

/// Helper builder so tests can easily create throwaway stores with custom paths.
pub struct SledStoreBuilder {
    path: PathBuf,
}

impl SledStoreBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn open(self) -> Result<SledStore, StoreError> {
        SledStore::open(self.path)
    }
}

/// Sled-backed record store.
#[derive(Clone)]
pub struct SledStore {
    _db: sled::Db,
    collectibles: sled::Tree,
    spawns: sled::Tree,
    winners: sled::Tree,
    catches: sled::Tree,
    groups: sled::Tree,
}

impl SledStore {
    /// Open (or create) the store rooted at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path_ref = path.as_ref();
        std::fs::create_dir_all(path_ref)?;
        let db = sled::Config::new().path(path_ref).open()?;
        let store = Self {
            collectibles: db.open_tree(TREE_COLLECTIBLES)?,
            spawns: db.open_tree(TREE_SPAWNS)?,
            winners: db.open_tree(TREE_WINNERS)?,
            catches: db.open_tree(TREE_CATCHES)?,
            groups: db.open_tree(TREE_GROUPS)?,
            _db: db,
        };
        debug!(
            "record store opened at {:?} ({} collectibles)",
            path_ref,
            store.collectibles.len()
        );
        Ok(store)
    }

    fn collectible_key(name: &str) -> Vec<u8> {
        Collectible::name_key(name).into_bytes()
    }

    fn group_key(group: GroupId) -> Vec<u8> {
        group.to_be_bytes().to_vec()
    }

    fn catches_prefix(claimer: UserId) -> Vec<u8> {
        format!("{}:", claimer).into_bytes()
    }

    fn catch_key(record: &CatchRecord) -> Vec<u8> {
        let nanos = record
            .caught_at
            .timestamp_nanos_opt()
            .unwrap_or_else(next_timestamp_nanos);
        format!("{}:{:020}:{}", record.claimer_id, nanos, record.id.simple()).into_bytes()
    }

    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
        Ok(bincode::serialize(value)?)
    }

    fn deserialize<T: serde::de::DeserializeOwned>(bytes: IVec) -> Result<T, StoreError> {
        Ok(bincode::deserialize::<T>(&bytes)?)
    }

    fn check_schema(entity: &'static str, expected: u8, found: u8) -> Result<(), StoreError> {
        if expected != found {
            return Err(StoreError::SchemaMismatch {
                entity,
                expected,
                found,
            });
        }
        Ok(())
    }

    fn decode_collectible(bytes: IVec) -> Result<Collectible, StoreError> {
        let record: Collectible = Self::deserialize(bytes)?;
        Self::check_schema("collectible", COLLECTIBLE_SCHEMA_VERSION, record.schema_version)?;
        Ok(record)
    }

    fn decode_catch(bytes: IVec) -> Result<CatchRecord, StoreError> {
        let record: CatchRecord = Self::deserialize(bytes)?;
        Self::check_schema("catch", CATCH_SCHEMA_VERSION, record.schema_version)?;
        Ok(record)
    }

    fn catches_for(
        &self,
        claimer: UserId,
    ) -> impl DoubleEndedIterator<Item = Result<CatchRecord, StoreError>> {
        self.catches
            .scan_prefix(Self::catches_prefix(claimer))
            .values()
            .map(|value| value.map_err(StoreError::from).and_then(Self::decode_catch))
    }
}

impl RecordStore for SledStore {
    fn put_collectible(&self, mut collectible: Collectible) -> Result<(), StoreError> {
        collectible.schema_version = COLLECTIBLE_SCHEMA_VERSION;
        let key = Self::collectible_key(&collectible.name);
        let bytes = Self::serialize(&collectible)?;
        self.collectibles.insert(key, bytes)?;
        self.collectibles.flush()?;
        Ok(())
    }

    fn collectible_by_name(&self, name: &str) -> Result<Option<Collectible>, StoreError> {
        self.collectibles
            .get(Self::collectible_key(name))?
            .map(Self::decode_collectible)
            .transpose()
    }

    fn random_collectible(&self) -> Result<Option<Collectible>, StoreError> {
        let len = self.collectibles.len();
        if len == 0 {
            return Ok(None);
        }
        let idx = rand::thread_rng().gen_range(0..len);
        // The tree may shrink between len() and the scan; treat that as empty.
        match self.collectibles.iter().values().nth(idx) {
            Some(bytes) => Ok(Some(Self::decode_collectible(bytes?)?)),
            None => Ok(None),
        }
    }

    fn list_collectible_names(&self) -> Result<Vec<String>, StoreError> {
        let mut names = self
            .collectibles
            .iter()
            .values()
            .map(|value| value.map_err(StoreError::from).and_then(Self::decode_collectible))
            .map(|record| record.map(|c| c.name))
            .collect::<Result<Vec<_>, _>>()?;
        names.sort_by_key(|name| name.to_lowercase());
        Ok(names)
    }

    fn collectible_count(&self) -> Result<usize, StoreError> {
        Ok(self.collectibles.len())
    }

    fn append_catch_record(&self, record: &CatchRecord) -> Result<(), StoreError> {
        let bytes = Self::serialize(record)?;
        self.catches.insert(Self::catch_key(record), bytes)?;
        self.catches.flush()?;
        Ok(())
    }

    fn collection_for(&self, claimer: UserId) -> Result<Vec<CatchRecord>, StoreError> {
        self.catches_for(claimer).rev().collect()
    }

    fn count_by_category(&self, claimer: UserId, category: &str) -> Result<usize, StoreError> {
        // Repeat catches of one character count once.
        let mut owned = HashSet::new();
        for record in self.catches_for(claimer) {
            let collectible = record?.collectible;
            if collectible.category.eq_ignore_ascii_case(category) {
                owned.insert(Collectible::name_key(&collectible.name));
            }
        }
        Ok(owned.len())
    }

    fn total_by_category(&self, category: &str) -> Result<usize, StoreError> {
        let mut count = 0;
        for value in self.collectibles.iter().values() {
            if Self::decode_collectible(value?)?
                .category
                .eq_ignore_ascii_case(category)
            {
                count += 1;
            }
        }
        Ok(count)
    }

    fn wipe_all(&self) -> Result<(), StoreError> {
        self.catches.clear()?;
        self.spawns.clear()?;
        self.winners.clear()?;
        self.catches.flush()?;
        self.spawns.flush()?;
        self.winners.flush()?;
        Ok(())
    }

    fn load_spawn(&self, group: GroupId) -> Result<Option<ActiveSpawn>, StoreError> {
        let Some(bytes) = self.spawns.get(Self::group_key(group))? else {
            return Ok(None);
        };
        let spawn: ActiveSpawn = Self::deserialize(bytes)?;
        Self::check_schema("spawn", SPAWN_SCHEMA_VERSION, spawn.schema_version)?;
        Ok(Some(spawn))
    }

    fn save_spawn(&self, spawn: &ActiveSpawn) -> Result<(), StoreError> {
        let bytes = Self::serialize(spawn)?;
        self.spawns.insert(Self::group_key(spawn.group), bytes)?;
        self.spawns.flush()?;
        Ok(())
    }

    fn delete_spawn(&self, group: GroupId) -> Result<(), StoreError> {
        self.spawns.remove(Self::group_key(group))?;
        self.spawns.flush()?;
        Ok(())
    }

    fn last_winner(&self, group: GroupId) -> Result<Option<String>, StoreError> {
        Ok(self
            .winners
            .get(Self::group_key(group))?
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
    }

    fn commit_catch(&self, spawn: &ActiveSpawn, record: &CatchRecord) -> Result<bool, StoreError> {
        let spawn_key = Self::group_key(spawn.group);
        let catch_key = Self::catch_key(record);
        let record_bytes = Self::serialize(record)?;

        let committed = (&self.spawns, &self.winners, &self.catches)
            .transaction(
                |(spawns, winners, catches)| -> ConflictableTransactionResult<bool, StoreError> {
                    let still_active = match spawns.get(spawn_key.as_slice())? {
                        Some(bytes) => bincode::deserialize::<ActiveSpawn>(&bytes)
                            .map(|current| current.id == spawn.id)
                            .map_err(|e| ConflictableTransactionError::Abort(StoreError::from(e)))?,
                        None => false,
                    };
                    if !still_active {
                        return Ok(false);
                    }
                    spawns.remove(spawn_key.as_slice())?;
                    winners.insert(spawn_key.as_slice(), record.claimer_name.as_bytes())?;
                    catches.insert(catch_key.as_slice(), record_bytes.as_slice())?;
                    Ok(true)
                },
            )
            .map_err(|e| match e {
                TransactionError::Abort(inner) => inner,
                TransactionError::Storage(inner) => StoreError::Sled(inner),
            })?;

        if committed {
            self.spawns.flush()?;
            self.winners.flush()?;
            self.catches.flush()?;
        }
        Ok(committed)
    }

    fn add_group(&self, mut group: GroupRecord) -> Result<(), StoreError> {
        group.schema_version = GROUP_SCHEMA_VERSION;
        let bytes = Self::serialize(&group)?;
        self.groups.insert(Self::group_key(group.id), bytes)?;
        self.groups.flush()?;
        Ok(())
    }

    fn remove_group(&self, group: GroupId) -> Result<(), StoreError> {
        self.groups.remove(Self::group_key(group))?;
        self.groups.flush()?;
        Ok(())
    }

    fn list_groups(&self) -> Result<Vec<GroupRecord>, StoreError> {
        let mut groups = Vec::new();
        for value in self.groups.iter().values() {
            let record: GroupRecord = Self::deserialize(value?)?;
            Self::check_schema("group", GROUP_SCHEMA_VERSION, record.schema_version)?;
            groups.push(record);
        }
        Ok(groups)
    }
}
