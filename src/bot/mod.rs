//! # Bot Front-End
//!
//! Everything between the chat platform and the game core:
//!
//! - [`transport`] - inbound [`ChatEvent`](transport::ChatEvent) and outbound [`Outgoing`](transport::Outgoing) types
//! - [`commands`] - slash-command parsing
//! - [`server`] - the event loop that routes messages into the engine
//! - [`membership`] - join/leave handling
//! - [`replies`] - user-facing text
//! - `console` - stdin/stdout transport for local play (feature `console`)

pub mod commands;
#[cfg(feature = "console")]
pub mod console;
pub mod membership;
pub mod replies;
pub mod server;
pub mod transport;

pub use server::GameServer;
