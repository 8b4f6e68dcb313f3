//! Test utilities & fixtures.

use std::sync::Arc;

use catchbot::config::Config;
use catchbot::game::types::Collectible;
use catchbot::game::{GameEngine, GameSettings};
use catchbot::storage::{RecordStore, SledStoreBuilder};
use tempfile::TempDir;

pub const OWNER: i64 = 1000;

/// Valid configuration whose store lives in `dir`.
#[allow(dead_code)]
pub fn test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.bot.owner_id = OWNER;
    config.storage.data_dir = dir.path().to_string_lossy().into_owned();
    config.logging.level = "error".into();
    config.logging.file = None;
    config
}

#[allow(dead_code)]
pub fn open_store(dir: &TempDir) -> Arc<dyn RecordStore> {
    Arc::new(
        SledStoreBuilder::new(dir.path().join("catchbot.sled"))
            .open()
            .expect("store"),
    )
}

#[allow(dead_code)]
pub fn engine_with(
    store: Arc<dyn RecordStore>,
    anti_spam_limit: u32,
    spawn_threshold: u32,
) -> GameEngine {
    GameEngine::new(
        store,
        GameSettings {
            anti_spam_limit,
            spawn_threshold,
        },
    )
}

/// Seed the catalogue with a single character so every spawn is predictable.
#[allow(dead_code)]
pub fn seed_goku(store: &dyn RecordStore) -> Collectible {
    let goku = Collectible::new(
        "Goku",
        "https://example.org/goku.jpg",
        "SSR",
        Some("Dragon Ball".into()),
    );
    store.put_collectible(goku.clone()).expect("seed");
    goku
}
