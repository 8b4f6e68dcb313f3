//! # Configuration Management Module
//!
//! Loads, validates and writes the bot's TOML configuration.
//!
//! ## Configuration Structure
//!
//! - [`BotConfig`] - identity, owner and membership rules
//! - [`GameConfig`] - spawn trigger and catch behaviour
//! - [`StorageConfig`] - where the record store lives
//! - [`LoggingConfig`] - log level and optional log file
//!
//! ## Usage
//!
//! ```rust,no_run
//! use catchbot::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     println!("Spawn every {} messages", config.game.spawn_threshold);
//!     Config::create_default("config.toml").await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration File Format
//!
//! ```toml
//! [bot]
//! name = "Catch Bot"
//! owner_id = 123456789
//! welcome_enabled = true
//! min_group_members = 0
//!
//! [game]
//! anti_spam_limit = 10
//! spawn_threshold = 50
//! spawn_mode = "messages"
//! hidden_name = false
//! reply_when_nothing_active = false
//!
//! [storage]
//! data_dir = "./data"
//!
//! [logging]
//! level = "info"
//! ```
//!
//! `CATCHBOT_OWNER_ID` and `CATCHBOT_DATA_DIR` override the file when set.

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;

use crate::game::GameSettings;

pub const ENV_OWNER_ID: &str = "CATCHBOT_OWNER_ID";
pub const ENV_DATA_DIR: &str = "CATCHBOT_DATA_DIR";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub bot: BotConfig,
    #[serde(default)]
    pub game: GameConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    pub name: String,
    /// User id allowed to run administrative commands. Must be set.
    pub owner_id: i64,
    #[serde(default = "default_true")]
    pub welcome_enabled: bool,
    /// Leave groups with fewer members than this when added. 0 disables the check.
    #[serde(default)]
    pub min_group_members: u32,
    /// Long listings are split into messages of at most this many characters.
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,
}

fn default_true() -> bool {
    true
}

fn default_max_message_chars() -> usize {
    3800
}

/// What drives spawning in a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SpawnMode {
    /// Count admitted messages and spawn on reaching `spawn_threshold`.
    #[default]
    Messages,
    /// Attempt a spawn in every known group each `spawn_interval_secs`.
    Interval,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default = "default_anti_spam_limit")]
    pub anti_spam_limit: u32,
    #[serde(default = "default_spawn_threshold")]
    pub spawn_threshold: u32,
    #[serde(default)]
    pub spawn_mode: SpawnMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spawn_interval_secs: Option<u64>,
    /// Announce spawns without naming the character.
    #[serde(default)]
    pub hidden_name: bool,
    /// Reply to `/catch` when nothing has spawned and nobody has won yet.
    #[serde(default)]
    pub reply_when_nothing_active: bool,
}

fn default_anti_spam_limit() -> u32 {
    10
}

fn default_spawn_threshold() -> u32 {
    50
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            anti_spam_limit: default_anti_spam_limit(),
            spawn_threshold: default_spawn_threshold(),
            spawn_mode: SpawnMode::Messages,
            spawn_interval_secs: None,
            hidden_name: false,
            reply_when_nothing_active: false,
        }
    }
}

impl GameConfig {
    pub fn settings(&self) -> GameSettings {
        GameSettings {
            anti_spam_limit: self.anti_spam_limit,
            spawn_threshold: self.spawn_threshold,
        }
    }

    /// Timer period in interval mode; `None` in message mode.
    pub fn spawn_interval(&self) -> Option<Duration> {
        match self.spawn_mode {
            SpawnMode::Messages => None,
            SpawnMode::Interval => self.spawn_interval_secs.map(Duration::from_secs),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
}

impl StorageConfig {
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("catchbot.sled")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl Config {
    /// Load configuration from a file, apply environment overrides and validate.
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let mut config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    /// Override fields from the environment. `lookup` is `std::env::var` outside tests.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(raw) = lookup(ENV_OWNER_ID) {
            self.bot.owner_id = raw
                .trim()
                .parse()
                .map_err(|e| anyhow!("{} is not a valid user id ({}): {}", ENV_OWNER_ID, raw, e))?;
        }
        if let Some(dir) = lookup(ENV_DATA_DIR) {
            if !dir.trim().is_empty() {
                self.storage.data_dir = dir.trim().to_string();
            }
        }
        Ok(())
    }

    /// Reject configurations the bot cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.bot.owner_id == 0 {
            bail!("bot.owner_id must be set (or provide {})", ENV_OWNER_ID);
        }
        if self.game.anti_spam_limit == 0 {
            bail!("game.anti_spam_limit must be a positive integer");
        }
        if self.game.spawn_threshold == 0 {
            bail!("game.spawn_threshold must be a positive integer");
        }
        if self.game.spawn_mode == SpawnMode::Interval
            && !matches!(self.game.spawn_interval_secs, Some(secs) if secs > 0)
        {
            bail!("game.spawn_interval_secs must be positive when spawn_mode = \"interval\"");
        }
        if self.storage.data_dir.trim().is_empty() {
            bail!("storage.data_dir must not be empty");
        }
        if self.bot.max_message_chars < 64 {
            bail!("bot.max_message_chars must be at least 64");
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bot: BotConfig {
                name: "Catch Bot".to_string(),
                owner_id: 0,
                welcome_enabled: true,
                min_group_members: 0,
                max_message_chars: default_max_message_chars(),
            },
            game: GameConfig::default(),
            storage: StorageConfig {
                data_dir: "./data".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file: Some("catchbot.log".to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> Config {
        let mut config = Config::default();
        config.bot.owner_id = 42;
        config
    }

    #[test]
    fn default_config_requires_owner() {
        let err = Config::default().validate().unwrap_err();
        assert!(err.to_string().contains("owner_id"));
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn zero_limits_are_rejected() {
        let mut config = valid();
        config.game.anti_spam_limit = 0;
        assert!(config.validate().is_err());

        let mut config = valid();
        config.game.spawn_threshold = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn interval_mode_needs_interval() {
        let mut config = valid();
        config.game.spawn_mode = SpawnMode::Interval;
        assert!(config.validate().is_err());
        config.game.spawn_interval_secs = Some(600);
        assert!(config.validate().is_ok());
        assert_eq!(config.game.spawn_interval(), Some(Duration::from_secs(600)));

        config.game.spawn_mode = SpawnMode::Messages;
        assert_eq!(config.game.spawn_interval(), None);
    }

    #[test]
    fn env_overrides_owner_and_data_dir() {
        let mut config = Config::default();
        config
            .apply_env_overrides(|key| match key {
                ENV_OWNER_ID => Some(" 777 ".to_string()),
                ENV_DATA_DIR => Some("/var/lib/catchbot".to_string()),
                _ => None,
            })
            .expect("overrides");
        assert_eq!(config.bot.owner_id, 777);
        assert_eq!(config.storage.data_dir, "/var/lib/catchbot");
        assert!(config.validate().is_ok());

        let mut config = Config::default();
        assert!(config
            .apply_env_overrides(|key| (key == ENV_OWNER_ID).then(|| "abc".to_string()))
            .is_err());
    }

    #[test]
    fn minimal_toml_uses_game_defaults() {
        let toml_src = r#"
            [bot]
            name = "Test"
            owner_id = 5

            [storage]
            data_dir = "./data"

            [logging]
            level = "debug"
        "#;
        let config: Config = toml::from_str(toml_src).expect("parse");
        assert_eq!(config.game.settings(), GameSettings::default());
        assert!(config.bot.welcome_enabled);
        assert!(!config.game.reply_when_nothing_active);
        assert_eq!(config.logging.file, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn spawn_mode_round_trips_lowercase() {
        let toml_src = toml::to_string_pretty(&valid()).expect("serialize");
        assert!(toml_src.contains("spawn_mode = \"messages\""));
    }
}
