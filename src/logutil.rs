//! Helpers for putting chat-supplied text into log lines.
//! Names and messages come from arbitrary users; keep every log entry on one line.

use std::fmt::Write;

use crate::game::types::UserId;

const MAX_PREVIEW: usize = 200;
const MAX_NAME: usize = 48;

fn escape_into(out: &mut String, s: &str, limit: usize) {
    for (count, ch) in s.chars().enumerate() {
        if count >= limit {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
}

/// Escape control characters and cap the length of user text for single-line logging.
pub fn escape_log(s: &str) -> String {
    let mut out = String::with_capacity(s.len().min(MAX_PREVIEW) + 8);
    escape_into(&mut out, s, MAX_PREVIEW);
    out
}

/// `Name (id)` label for a chat member, with the name escaped and shortened.
pub fn user_label(id: UserId, display_name: &str) -> String {
    let mut out = String::with_capacity(display_name.len().min(MAX_NAME) + 24);
    if display_name.trim().is_empty() {
        out.push_str("<unnamed>");
    } else {
        escape_into(&mut out, display_name.trim(), MAX_NAME);
    }
    let _ = write!(out, " ({})", id);
    out
}
