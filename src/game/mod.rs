//! # Game Core - Spawn Trigger and Catch State Machine
//!
//! Plain group messages drive spawning; `/catch` commands drive claims.
//!
//! ```text
//! message ──► ActivityThrottle ──► SpawnCounter ──► SpawnSelector ──► GroupSpawnRegistry
//!                                                                          ▲
//! /catch  ──────────────────────────────────────────► CatchResolver ──────┘
//! ```
//!
//! - [`throttle`] - consecutive-sender suppression
//! - [`counter`] - per-group admitted message count
//! - [`selector`] - random pick and publish
//! - [`resolver`] - name check and claim transaction
//! - [`registry`] - durable group → active spawn mapping
//! - [`engine`] - per-group locking around all of the above
//!
//! At most one spawn exists per group. It stays until someone names it
//! correctly or an admin clears it; there is no expiry.

pub mod counter;
pub mod engine;
pub mod registry;
pub mod resolver;
pub mod selector;
pub mod throttle;
pub mod types;

pub use engine::{GameEngine, GameSettings, GroupState};
