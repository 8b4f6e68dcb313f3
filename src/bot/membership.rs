//! Joining and leaving groups.
//!
//! When the bot is added it either records the group and greets it, or leaves a
//! group that is too small to play in. When removed it forgets the group entirely.

use log::{info, warn};

use super::replies;
use super::transport::{ChatRef, Outgoing};
use crate::config::{BotConfig, GameConfig, SpawnMode};
use crate::game::types::{GroupId, GroupRecord};
use crate::game::GameEngine;
use crate::logutil::escape_log;
use crate::storage::{RecordStore, StoreError};

/// Rules applied when the bot is added to a chat.
#[derive(Debug, Clone)]
pub struct MembershipPolicy {
    pub bot_name: String,
    pub welcome_enabled: bool,
    pub min_group_members: u32,
    pub spawn_threshold: u32,
    /// Set in interval mode; the welcome then names the period instead of the threshold.
    pub spawn_interval_secs: Option<u64>,
}

impl MembershipPolicy {
    pub fn from_config(bot: &BotConfig, game: &GameConfig) -> Self {
        Self {
            bot_name: bot.name.clone(),
            welcome_enabled: bot.welcome_enabled,
            min_group_members: bot.min_group_members,
            spawn_threshold: game.spawn_threshold,
            spawn_interval_secs: match game.spawn_mode {
                SpawnMode::Messages => None,
                SpawnMode::Interval => game.spawn_interval_secs,
            },
        }
    }

    fn too_small(&self, member_count: u32) -> bool {
        self.min_group_members > 0 && member_count < self.min_group_members
    }

    fn welcome_text(&self) -> String {
        match self.spawn_interval_secs {
            Some(secs) => replies::interval_welcome(&self.bot_name, (secs / 60).max(1)),
            None => replies::welcome(&self.bot_name, self.spawn_threshold),
        }
    }

    /// Decide what to do for a `BotAdded` event. Only records the group when it is kept.
    pub fn on_added(
        &self,
        store: &dyn RecordStore,
        chat: &ChatRef,
        member_count: u32,
    ) -> Result<Vec<Outgoing>, StoreError> {
        if !chat.is_group() {
            return Ok(Vec::new());
        }
        if self.too_small(member_count) {
            info!(
                "Leaving group {} ('{}'): {} members, {} required",
                chat.id,
                escape_log(&chat.title),
                member_count,
                self.min_group_members
            );
            return Ok(vec![
                Outgoing::Text {
                    chat_id: chat.id,
                    text: replies::group_too_small(self.min_group_members),
                },
                Outgoing::Leave { chat_id: chat.id },
            ]);
        }

        store.add_group(GroupRecord::new(chat.id, chat.title.clone()))?;
        info!("Joined group {} ('{}')", chat.id, escape_log(&chat.title));

        let mut out = Vec::new();
        if self.welcome_enabled {
            out.push(Outgoing::Text {
                chat_id: chat.id,
                text: self.welcome_text(),
            });
        }
        Ok(out)
    }

    /// Forget a group the bot is no longer part of.
    pub fn on_removed(
        &self,
        store: &dyn RecordStore,
        engine: &GameEngine,
        chat_id: GroupId,
    ) -> Result<(), StoreError> {
        if let Err(e) = store.remove_group(chat_id) {
            warn!("Failed to remove group {} from store: {}", chat_id, e);
            return Err(e);
        }
        engine.forget_group(chat_id);
        info!("Left group {}", chat_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::storage::SledStoreBuilder;
    use tempfile::TempDir;

    fn policy(min_members: u32) -> MembershipPolicy {
        let mut config = Config::default();
        config.bot.min_group_members = min_members;
        MembershipPolicy::from_config(&config.bot, &config.game)
    }

    #[test]
    fn small_group_is_left_and_not_recorded() {
        let dir = TempDir::new().expect("tempdir");
        let store = SledStoreBuilder::new(dir.path()).open().expect("store");
        let out = policy(15)
            .on_added(&store, &ChatRef::group(-7, "tiny"), 3)
            .expect("added");
        assert_eq!(out.len(), 2);
        assert_eq!(out[1], Outgoing::Leave { chat_id: -7 });
        assert!(store.list_groups().expect("groups").is_empty());
    }

    #[test]
    fn accepted_group_gets_welcome() {
        let dir = TempDir::new().expect("tempdir");
        let store = SledStoreBuilder::new(dir.path()).open().expect("store");
        let out = policy(15)
            .on_added(&store, &ChatRef::group(-8, "big"), 40)
            .expect("added");
        match out.as_slice() {
            [Outgoing::Text { chat_id, text }] => {
                assert_eq!(*chat_id, -8);
                assert!(text.contains("50 messages"));
            }
            other => panic!("unexpected output {:?}", other),
        }
        assert_eq!(store.list_groups().expect("groups").len(), 1);
    }

    #[test]
    fn private_chat_is_ignored() {
        let dir = TempDir::new().expect("tempdir");
        let store = SledStoreBuilder::new(dir.path()).open().expect("store");
        let out = policy(0)
            .on_added(&store, &ChatRef::private(99), 1)
            .expect("added");
        assert!(out.is_empty());
        assert!(store.list_groups().expect("groups").is_empty());
    }
}
