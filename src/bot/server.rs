use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant, MissedTickBehavior};

use super::commands::{AddCharArgs, BotCommand, CommandParser};
use super::membership::MembershipPolicy;
use super::replies;
use super::transport::{ChatEvent, ChatRef, Outgoing, Sender};
use crate::config::{Config, SpawnMode};
use crate::game::types::{CatchOutcome, Collectible, GroupId, MessageOutcome, SpawnOutcome};
use crate::game::GameEngine;
use crate::logutil::{escape_log, user_label};
use crate::storage::{RecordStore, SledStoreBuilder};

const HOUSEKEEPING_PERIOD: Duration = Duration::from_secs(300);

/// # Game Server
///
/// Front-end controller that sits between the chat transport and the game core.
///
/// ```text
/// ┌─────────────────┐ ChatEvent ┌─────────────────┐    ┌─────────────────┐
/// │   Transport     │──────────→│   GameServer    │───→│   GameEngine    │
/// │   (platform)    │←──────────│                 │    │   + RecordStore │
/// └─────────────────┘ Outgoing  └─────────────────┘    └─────────────────┘
/// ```
///
/// Events are handled one at a time in arrival order. The engine decides every
/// state transition first; only then are replies formatted and queued, so a
/// failed delivery never undoes a spawn or a catch.
///
/// ## Usage
///
/// ```rust,no_run
/// use catchbot::bot::GameServer;
/// use catchbot::config::Config;
/// use tokio::sync::mpsc;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = Config::load("config.toml").await?;
///     let (out_tx, _out_rx) = mpsc::unbounded_channel();
///     let (_event_tx, event_rx) = mpsc::unbounded_channel();
///     let mut server = GameServer::open(config, out_tx)?;
///     server.run(event_rx).await
/// }
/// ```
pub struct GameServer {
    config: Config,
    store: Arc<dyn RecordStore>,
    engine: Arc<GameEngine>,
    parser: CommandParser,
    membership: MembershipPolicy,
    outgoing_tx: mpsc::UnboundedSender<Outgoing>,
}

impl GameServer {
    pub fn new(
        config: Config,
        store: Arc<dyn RecordStore>,
        outgoing_tx: mpsc::UnboundedSender<Outgoing>,
    ) -> Self {
        let engine = Arc::new(GameEngine::new(store.clone(), config.game.settings()));
        let membership = MembershipPolicy::from_config(&config.bot, &config.game);
        Self {
            config,
            store,
            engine,
            parser: CommandParser::new(),
            membership,
            outgoing_tx,
        }
    }

    /// Open the sled store named by the configuration and build a server on it.
    pub fn open(config: Config, outgoing_tx: mpsc::UnboundedSender<Outgoing>) -> Result<Self> {
        let path = config.storage.db_path();
        let store = SledStoreBuilder::new(&path)
            .open()
            .with_context(|| format!("Failed to open record store at {}", path.display()))?;
        Ok(Self::new(config, Arc::new(store), outgoing_tx))
    }

    pub fn engine(&self) -> &Arc<GameEngine> {
        &self.engine
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Process events until the inbound channel closes or Ctrl-C is received.
    pub async fn run(&mut self, mut events: mpsc::UnboundedReceiver<ChatEvent>) -> Result<()> {
        info!(
            "{} started (owner {}, spawn mode {:?}, threshold {}, anti-spam {})",
            self.config.bot.name,
            self.config.bot.owner_id,
            self.config.game.spawn_mode,
            self.config.game.spawn_threshold,
            self.config.game.anti_spam_limit
        );
        match store_status(self.store.as_ref()) {
            Ok(status) => info!("{}", status),
            Err(e) => warn!("Could not read store summary: {}", e),
        }

        let mut housekeeping =
            tokio::time::interval_at(Instant::now() + HOUSEKEEPING_PERIOD, HOUSEKEEPING_PERIOD);
        housekeeping.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let spawn_period = self.config.game.spawn_interval();
        let period = spawn_period.unwrap_or(HOUSEKEEPING_PERIOD);
        let mut spawn_timer = tokio::time::interval_at(Instant::now() + period, period);
        spawn_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                maybe_event = events.recv() => {
                    match maybe_event {
                        Some(event) => {
                            if let Err(e) = self.handle_event(event) {
                                error!("Event handling failed: {:#}", e);
                            }
                        }
                        None => {
                            info!("Event channel closed");
                            break;
                        }
                    }
                }

                _ = housekeeping.tick() => {
                    let retired = self.engine.prune_idle();
                    if retired > 0 {
                        let tracked = self.engine.tracked_groups();
                        debug!("Retired {} idle group slots ({} tracked)", retired, tracked);
                    }
                }

                _ = spawn_timer.tick(), if spawn_period.is_some() => {
                    match self.spawn_tick() {
                        Ok(spawned) => debug!("Interval tick spawned in {} groups", spawned),
                        Err(e) => error!("Interval spawn failed: {:#}", e),
                    }
                }

                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
            }
        }

        info!("{} stopped", self.config.bot.name);
        Ok(())
    }

    /// Handle one inbound event.
    pub fn handle_event(&self, event: ChatEvent) -> Result<()> {
        match event {
            ChatEvent::Text { chat, sender, text } => self.handle_text(&chat, &sender, &text),
            ChatEvent::BotAdded { chat, member_count } => {
                let out = self
                    .membership
                    .on_added(self.store.as_ref(), &chat, member_count)
                    .with_context(|| format!("Failed to record group {}", chat.id))?;
                for msg in out {
                    self.send(msg);
                }
                Ok(())
            }
            ChatEvent::BotRemoved { chat_id } => {
                self.membership
                    .on_removed(self.store.as_ref(), &self.engine, chat_id)
                    .with_context(|| format!("Failed to forget group {}", chat_id))?;
                Ok(())
            }
        }
    }

    fn handle_text(&self, chat: &ChatRef, sender: &Sender, text: &str) -> Result<()> {
        match self.parser.parse(text) {
            BotCommand::NotCommand => {
                if chat.is_group() && self.config.game.spawn_mode == SpawnMode::Messages {
                    self.observe(chat.id, sender)?;
                }
            }
            BotCommand::Start => {
                self.send_text(chat.id, replies::intro(self.config.game.spawn_threshold))
            }
            BotCommand::Catch(guess) => self.handle_catch(chat, sender, &guess)?,
            BotCommand::Harem => self.handle_harem(chat.id, sender)?,
            BotCommand::Unknown => {}
            admin => {
                if sender.id != self.config.bot.owner_id {
                    warn!(
                        "Admin command from non-owner {}: {}",
                        user_label(sender.id, &sender.display_name),
                        escape_log(text)
                    );
                    self.send_text(chat.id, replies::owner_only());
                    return Ok(());
                }
                self.handle_admin(chat.id, admin)?;
            }
        }
        Ok(())
    }

    fn observe(&self, group: GroupId, sender: &Sender) -> Result<()> {
        let outcome = self
            .engine
            .observe_message(group, sender.id)
            .with_context(|| format!("Failed to process message in group {}", group))?;
        if let MessageOutcome::Spawn(SpawnOutcome::Spawned(collectible)) = outcome {
            self.announce(group, &collectible);
        }
        Ok(())
    }

    fn announce(&self, group: GroupId, collectible: &Collectible) {
        self.send(Outgoing::Photo {
            chat_id: group,
            image_url: collectible.image_url.clone(),
            caption: replies::spawn_caption(collectible, self.config.game.hidden_name),
        });
    }

    fn handle_catch(&self, chat: &ChatRef, sender: &Sender, guess: &str) -> Result<()> {
        if !chat.is_group() {
            self.send_text(chat.id, replies::group_only());
            return Ok(());
        }
        let outcome = self
            .engine
            .attempt_catch(chat.id, &sender.as_claimer(), guess)
            .with_context(|| format!("Failed to resolve catch in group {}", chat.id))?;
        match outcome {
            CatchOutcome::Success(collectible) => {
                self.send_text(chat.id, replies::catch_success(&sender.display_name, &collectible))
            }
            CatchOutcome::WrongName => self.send_text(chat.id, replies::wrong_name()),
            CatchOutcome::AlreadyCaughtBy(winner) => {
                self.send_text(chat.id, replies::already_caught(&winner))
            }
            CatchOutcome::NothingActive => {
                if self.config.game.reply_when_nothing_active {
                    self.send_text(chat.id, replies::nothing_active());
                }
            }
        }
        Ok(())
    }

    fn handle_harem(&self, chat_id: GroupId, sender: &Sender) -> Result<()> {
        let records = self
            .store
            .collection_for(sender.id)
            .context("Failed to load collection")?;
        if records.is_empty() {
            self.send_text(chat_id, replies::empty_collection());
            return Ok(());
        }
        // Categories differing only in case are one line, named as first seen.
        let mut categories: Vec<&str> = Vec::new();
        for record in &records {
            let category = record.collectible.category.as_str();
            if !categories.iter().any(|c| c.eq_ignore_ascii_case(category)) {
                categories.push(category);
            }
        }
        let mut progress = Vec::with_capacity(categories.len());
        for category in categories {
            let owned = self.store.count_by_category(sender.id, category)?;
            let total = self.store.total_by_category(category)?;
            progress.push((category.to_string(), owned, total));
        }
        let text = replies::harem(&sender.display_name, &records, &progress);
        self.send_chunked(chat_id, &text);
        Ok(())
    }

    fn handle_admin(&self, chat_id: GroupId, command: BotCommand) -> Result<()> {
        match command {
            BotCommand::AddChar(AddCharArgs {
                rarity,
                image_url,
                name,
                category,
            }) => {
                let collectible = Collectible::new(name, image_url, rarity, category);
                self.store
                    .put_collectible(collectible.clone())
                    .context("Failed to save collectible")?;
                info!(
                    "Collectible added: {} ({}, {})",
                    escape_log(&collectible.name),
                    collectible.rarity,
                    escape_log(&collectible.category)
                );
                self.send_text(chat_id, replies::character_added(&collectible));
            }
            BotCommand::ListChars => {
                let names = self
                    .store
                    .list_collectible_names()
                    .context("Failed to list collectibles")?;
                if names.is_empty() {
                    self.send_text(chat_id, replies::empty_catalogue());
                } else {
                    self.send_chunked(chat_id, &replies::character_list(&names));
                }
            }
            BotCommand::Wipe => {
                self.store.wipe_all().context("Failed to wipe player data")?;
                info!("Player data wiped by owner");
                self.send_text(chat_id, replies::wiped());
            }
            BotCommand::ClearSpawn => {
                let cleared = self.engine.clear_spawn(chat_id)?;
                if let Some(spawn) = &cleared {
                    info!(
                        "Spawn of {} cleared in group {}",
                        escape_log(&spawn.collectible.name),
                        chat_id
                    );
                }
                let name = cleared.as_ref().map(|s| s.collectible.name.as_str());
                self.send_text(chat_id, replies::spawn_cleared(name));
            }
            BotCommand::Invalid(usage) => self.send_text(chat_id, usage),
            other => debug!("Ignoring {:?} in admin path", other),
        }
        Ok(())
    }

    /// Attempt a spawn in every recorded group. Used by the interval timer.
    /// Returns how many groups received a new spawn.
    pub fn spawn_tick(&self) -> Result<usize> {
        let groups = self.store.list_groups().context("Failed to list groups")?;
        let mut spawned = 0;
        for group in groups {
            match self.engine.try_spawn(group.id) {
                Ok(SpawnOutcome::Spawned(collectible)) => {
                    self.announce(group.id, &collectible);
                    spawned += 1;
                }
                Ok(SpawnOutcome::NoCollectiblesAvailable) => break,
                Ok(SpawnOutcome::Skipped(_)) => {}
                Err(e) => error!("Spawn in group {} failed: {}", group.id, e),
            }
        }
        Ok(spawned)
    }

    /// One-line description of the current state, for logs and the CLI.
    pub fn status_summary(&self) -> Result<String> {
        let mut summary = store_status(self.store.as_ref())?.to_string();
        let tracked = self.engine.tracked_groups();
        summary.push_str(&format!(", {} groups tracked in memory", tracked));
        if self.config.game.spawn_mode == SpawnMode::Interval {
            if let Some(secs) = self.config.game.spawn_interval_secs {
                summary.push_str(&format!(", spawning every {}s", secs));
            }
        }
        Ok(summary)
    }

    fn send_text(&self, chat_id: GroupId, text: impl Into<String>) {
        self.send(Outgoing::Text {
            chat_id,
            text: text.into(),
        });
    }

    fn send_chunked(&self, chat_id: GroupId, text: &str) {
        for chunk in replies::chunk_text(text, self.config.bot.max_message_chars) {
            self.send_text(chat_id, chunk);
        }
    }

    fn send(&self, msg: Outgoing) {
        if let Err(e) = self.outgoing_tx.send(msg) {
            warn!("Failed to deliver message to chat {}: transport closed", e.0.chat_id());
        }
    }
}

/// Catalogue and group counts straight from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStatus {
    pub collectibles: usize,
    pub groups: usize,
    pub active_spawns: usize,
}

impl std::fmt::Display for StoreStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} collectibles, {} groups, {} active spawns",
            self.collectibles, self.groups, self.active_spawns
        )
    }
}

pub fn store_status(store: &dyn RecordStore) -> Result<StoreStatus> {
    let collectibles = store.collectible_count().context("Failed to count collectibles")?;
    let groups = store.list_groups().context("Failed to list groups")?;
    let mut active_spawns = 0;
    for group in &groups {
        if store.load_spawn(group.id)?.is_some() {
            active_spawns += 1;
        }
    }
    Ok(StoreStatus {
        collectibles,
        groups: groups.len(),
        active_spawns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::types::ActiveSpawn;
    use chrono::Utc;
    use tempfile::TempDir;

    fn server(dir: &TempDir) -> (GameServer, mpsc::UnboundedReceiver<Outgoing>) {
        let mut config = Config::default();
        config.bot.owner_id = 1;
        config.game.spawn_threshold = 3;
        config.storage.data_dir = dir.path().to_string_lossy().into_owned();
        let (tx, rx) = mpsc::unbounded_channel();
        (GameServer::open(config, tx).expect("server"), rx)
    }

    fn text(chat: ChatRef, sender: i64, body: &str) -> ChatEvent {
        ChatEvent::Text {
            chat,
            sender: Sender::new(sender, format!("user{}", sender)),
            text: body.to_string(),
        }
    }

    #[test]
    fn non_owner_cannot_add() {
        let dir = TempDir::new().expect("tempdir");
        let (server, mut rx) = server(&dir);
        server
            .handle_event(text(ChatRef::private(5), 5, "/addchar SSR u Goku"))
            .expect("event");
        assert_eq!(
            rx.try_recv().expect("reply"),
            Outgoing::Text {
                chat_id: 5,
                text: replies::owner_only().to_string()
            }
        );
        assert_eq!(server.store().collectible_count().expect("count"), 0);
    }

    #[test]
    fn nothing_active_is_silent_by_default() {
        let dir = TempDir::new().expect("tempdir");
        let (server, mut rx) = server(&dir);
        server
            .handle_event(text(ChatRef::group(-1, "g"), 2, "/catch goku"))
            .expect("event");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn catch_in_private_chat_gets_notice() {
        let dir = TempDir::new().expect("tempdir");
        let (server, mut rx) = server(&dir);
        server
            .handle_event(text(ChatRef::private(2), 2, "/catch goku"))
            .expect("event");
        assert_eq!(
            rx.try_recv().expect("reply"),
            Outgoing::Text {
                chat_id: 2,
                text: replies::group_only().to_string()
            }
        );
    }

    #[test]
    fn harem_progress_counts_distinct_characters() {
        let dir = TempDir::new().expect("tempdir");
        let (server, mut rx) = server(&dir);
        let store = server.store().clone();
        let goku = Collectible::new("Goku", "u", "SSR", Some("Dragon Ball".into()));
        store.put_collectible(goku.clone()).expect("put goku");
        store
            .put_collectible(Collectible::new("Vegeta", "u", "SR", Some("Dragon Ball".into())))
            .expect("put vegeta");
        store
            .put_collectible(Collectible::new("Gohan", "u", "R", Some("dragon ball".into())))
            .expect("put gohan");

        for _ in 0..2 {
            store
                .save_spawn(&ActiveSpawn::new(-1, goku.clone(), Utc::now()))
                .expect("spawn goku");
            server
                .handle_event(text(ChatRef::group(-1, "g"), 7, "/catch goku"))
                .expect("catch");
        }
        server
            .handle_event(text(ChatRef::group(-1, "g"), 7, "/harem"))
            .expect("harem");

        let mut harem = None;
        while let Ok(msg) = rx.try_recv() {
            if let Outgoing::Text { text, .. } = msg {
                if text.contains("Harem Collection") {
                    harem = Some(text);
                }
            }
        }
        let harem = harem.expect("harem reply");
        assert!(harem.contains("📚 Dragon Ball: 1/3"), "{}", harem);
        assert_eq!(harem.matches("📚").count(), 1);
        assert!(harem.ends_with("Total: 2"));
    }

    #[test]
    fn closed_transport_does_not_undo_spawn() {
        let dir = TempDir::new().expect("tempdir");
        let (server, rx) = server(&dir);
        server
            .store()
            .put_collectible(Collectible::new("Goku", "u", "SSR", None))
            .expect("put");
        drop(rx);
        for sender in 2..5 {
            server
                .handle_event(text(ChatRef::group(-1, "g"), sender, "hello"))
                .expect("event");
        }
        assert!(server.engine().active_spawn(-1).expect("spawn").is_some());
    }
}
