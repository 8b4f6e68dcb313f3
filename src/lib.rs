//! # Catchbot - Character Spawn and Catch Game for Group Chats
//!
//! Group members chat; every so many messages a random character from the
//! catalogue appears. The first member to name it with `/catch <name>` adds it to
//! their collection.
//!
//! ## Features
//!
//! - **Spawn Trigger**: per-group message counter with a consecutive-sender anti-spam throttle, or a fixed timer.
//! - **Exactly-One Winner**: claims are resolved by a compare-and-swap on the spawn id inside a sled transaction.
//! - **Durable State**: active spawns, last winners and catch records survive restarts.
//! - **Admin Commands**: owner-only catalogue management, spawn clearing and wipes.
//! - **Transport Agnostic**: the bot speaks through channels of [`bot::transport::ChatEvent`] and [`bot::transport::Outgoing`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use catchbot::bot::GameServer;
//! use catchbot::config::Config;
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let (outgoing_tx, _outgoing_rx) = mpsc::unbounded_channel();
//!     let (_events_tx, events_rx) = mpsc::unbounded_channel();
//!     let mut server = GameServer::open(config, outgoing_tx)?;
//!     server.run(events_rx).await
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`game`] - throttle, counter, selector, resolver, registry and the engine tying them together
//! - [`storage`] - record store trait and its sled implementation
//! - [`bot`] - command parsing, replies, membership and the event loop
//! - [`config`] - configuration management and validation
//! - [`logutil`] - helpers for logging user-supplied text
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   GameServer    │ ← Commands, replies, timers
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │   GameEngine    │ ← Per-group state machine
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │   RecordStore   │ ← Catalogue, spawns, catches
//! └─────────────────┘
//! ```

pub mod bot;
pub mod config;
pub mod game;
pub mod logutil;
pub mod storage;
