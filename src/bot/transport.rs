//! Transport boundary: what the chat platform delivers and what the bot sends back.
//!
//! The server never touches a platform SDK. A transport task feeds [`ChatEvent`]s
//! into an unbounded channel and drains [`Outgoing`] messages from another one.

use crate::game::types::{Claimer, GroupId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatKind {
    Group,
    Private,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRef {
    pub id: GroupId,
    pub kind: ChatKind,
    pub title: String,
}

impl ChatRef {
    pub fn group(id: GroupId, title: impl Into<String>) -> Self {
        Self {
            id,
            kind: ChatKind::Group,
            title: title.into(),
        }
    }

    pub fn private(id: GroupId) -> Self {
        Self {
            id,
            kind: ChatKind::Private,
            title: String::new(),
        }
    }

    pub fn is_group(&self) -> bool {
        self.kind == ChatKind::Group
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub id: UserId,
    pub display_name: String,
}

impl Sender {
    pub fn new(id: UserId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
        }
    }

    pub fn as_claimer(&self) -> Claimer {
        Claimer::new(self.id, self.display_name.clone())
    }
}

/// Inbound event from the chat platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    Text {
        chat: ChatRef,
        sender: Sender,
        text: String,
    },
    /// The bot itself was added to a chat.
    BotAdded { chat: ChatRef, member_count: u32 },
    /// The bot left or was removed from a chat.
    BotRemoved { chat_id: GroupId },
}

/// Outbound action for the transport to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outgoing {
    Text {
        chat_id: GroupId,
        text: String,
    },
    Photo {
        chat_id: GroupId,
        image_url: String,
        caption: String,
    },
    Leave {
        chat_id: GroupId,
    },
}

impl Outgoing {
    pub fn chat_id(&self) -> GroupId {
        match self {
            Outgoing::Text { chat_id, .. }
            | Outgoing::Photo { chat_id, .. }
            | Outgoing::Leave { chat_id } => *chat_id,
        }
    }
}
