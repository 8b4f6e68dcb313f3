//! Local console transport for playing without a chat platform.
//!
//! Each stdin line is one event:
//!
//! ```text
//! join  <chat_id> <member_count> [title]
//! leave <chat_id>
//! say   <chat_id> <user_id> <name>: <text>
//! ```
//!
//! Negative chat ids are groups, positive ones are private chats. Outgoing
//! messages are printed to stdout prefixed with the chat id.

use anyhow::Result;
use log::{debug, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use super::transport::{ChatEvent, ChatRef, Outgoing, Sender};
use crate::game::types::GroupId;
use crate::logutil::escape_log;

fn chat_for(id: GroupId, title: &str) -> ChatRef {
    if id < 0 {
        ChatRef::group(id, title)
    } else {
        ChatRef::private(id)
    }
}

/// Parse one console line. Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str) -> Option<ChatEvent> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    match verb.to_ascii_lowercase().as_str() {
        "join" => {
            let mut parts = rest.splitn(3, char::is_whitespace);
            let id: GroupId = parts.next()?.parse().ok()?;
            let member_count: u32 = parts.next()?.parse().ok()?;
            let title = parts.next().unwrap_or("").trim();
            Some(ChatEvent::BotAdded {
                chat: chat_for(id, title),
                member_count,
            })
        }
        "leave" => Some(ChatEvent::BotRemoved {
            chat_id: rest.parse().ok()?,
        }),
        "say" => {
            let mut parts = rest.splitn(3, char::is_whitespace);
            let id: GroupId = parts.next()?.parse().ok()?;
            let user: i64 = parts.next()?.parse().ok()?;
            let (name, text) = parts.next()?.split_once(':')?;
            Some(ChatEvent::Text {
                chat: chat_for(id, ""),
                sender: Sender::new(user, name.trim()),
                text: text.trim().to_string(),
            })
        }
        _ => None,
    }
}

/// Render an outgoing action as console text.
pub fn render(msg: &Outgoing) -> String {
    match msg {
        Outgoing::Text { chat_id, text } => format!("[{}] {}", chat_id, text),
        Outgoing::Photo {
            chat_id,
            image_url,
            caption,
        } => format!("[{}] 🖼 {}\n{}", chat_id, image_url, caption),
        Outgoing::Leave { chat_id } => format!("[{}] <bot left the chat>", chat_id),
    }
}

/// Feed stdin lines into the event channel until EOF or the server goes away.
pub async fn read_events(events_tx: mpsc::UnboundedSender<ChatEvent>) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_line(&line) {
            Some(event) => {
                if events_tx.send(event).is_err() {
                    debug!("Server stopped; console input closed");
                    break;
                }
            }
            None if !line.trim().is_empty() && !line.trim().starts_with('#') => {
                warn!("Unrecognised console line: {}", escape_log(&line));
            }
            None => {}
        }
    }
    Ok(())
}

/// Print every outgoing action until the server drops its sender.
pub async fn print_outgoing(mut outgoing_rx: mpsc::UnboundedReceiver<Outgoing>) {
    while let Some(msg) = outgoing_rx.recv().await {
        println!("{}", render(&msg));
    }
}
