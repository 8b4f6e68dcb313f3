//! User-facing text for announcements and command replies.

use crate::game::types::{CatchRecord, Collectible};

pub fn intro(threshold: u32) -> String {
    format!(
        "👋 Hi! I'm a character catching bot.\nEvery {} messages in a group a character appears.\nCatch it with /catch <name> and see your collection with /harem.",
        threshold
    )
}

pub fn welcome(bot_name: &str, threshold: u32) -> String {
    format!(
        "👋 Hello! {} here.\nA character will appear every {} messages in this group.\nUse /catch <name> to catch it!",
        bot_name, threshold
    )
}

pub fn interval_welcome(bot_name: &str, minutes: u64) -> String {
    format!(
        "👋 Hello! {} here.\nA character will appear about every {} minutes in this group.\nUse /catch <name> to catch it!",
        bot_name, minutes
    )
}

pub fn group_too_small(min_members: u32) -> String {
    format!(
        "😔 This group needs at least {} members to play. Add me again once it grows!",
        min_members
    )
}

pub fn spawn_caption(collectible: &Collectible, hidden_name: bool) -> String {
    if hidden_name {
        format!(
            "{} A CHARACTER HAS SPAWNED! 😱\n\nGuess who it is and add it to your harem with /catch <name>",
            collectible.glyph
        )
    } else {
        format!(
            "{} A CHARACTER HAS SPAWNED! 😱\n\nAdd this character to your harem using /catch {}",
            collectible.glyph, collectible.name
        )
    }
}

pub fn catch_success(claimer_name: &str, collectible: &Collectible) -> String {
    format!(
        "🎉 Gotcha! 🎉\n\n{} caught {} {} ({})!",
        claimer_name, collectible.glyph, collectible.name, collectible.rarity
    )
}

pub fn wrong_name() -> &'static str {
    "❌ Wrong name! Try again."
}

pub fn already_caught(winner: &str) -> String {
    format!("😅 Nothing to catch right now. The last one was caught by {}.", winner)
}

pub fn nothing_active() -> &'static str {
    "😅 There is no character to catch in this group right now."
}

pub fn group_only() -> &'static str {
    "❌ /catch only works in groups."
}

pub fn owner_only() -> &'static str {
    "❌ Only the bot owner can use this command."
}

pub fn empty_collection() -> &'static str {
    "You haven't caught any characters yet. 😥"
}

pub fn empty_catalogue() -> &'static str {
    "ℹ️ The character database is empty. Use /addchar first."
}

pub fn character_added(collectible: &Collectible) -> String {
    format!(
        "✅ Character added!\n\nName: {}\nRarity: {} {}\nCategory: {}",
        collectible.name, collectible.glyph, collectible.rarity, collectible.category
    )
}

pub fn spawn_cleared(name: Option<&str>) -> String {
    match name {
        Some(name) => format!("🧹 Cleared the active spawn ({}).", name),
        None => "ℹ️ There is no active spawn in this group.".to_string(),
    }
}

pub fn wiped() -> &'static str {
    "🗑️ All collections and active spawns have been wiped."
}

/// Per-category line of a collection: `(category, owned, total)`.
pub type CategoryProgress = (String, usize, usize);

/// Collection listing, most recent first, followed by per-category progress.
pub fn harem(owner_name: &str, records: &[CatchRecord], progress: &[CategoryProgress]) -> String {
    let mut out = format!("💖 {}'s Harem Collection 💖\n\n", owner_name);
    for (idx, record) in records.iter().enumerate() {
        let c = &record.collectible;
        out.push_str(&format!(
            "{}. {} {} (Rarity: {})\n",
            idx + 1,
            c.glyph,
            c.name,
            c.rarity
        ));
    }
    if !progress.is_empty() {
        out.push('\n');
        for (category, owned, total) in progress {
            out.push_str(&format!("📚 {}: {}/{}\n", category, owned, total));
        }
    }
    out.push_str(&format!("\nTotal: {}", records.len()));
    out
}

/// Numbered A–Z list of every collectible name.
pub fn character_list(names: &[String]) -> String {
    let mut out = String::from("📔 Character Database List 📔\n\n");
    for (idx, name) in names.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", idx + 1, name));
    }
    out.push_str(&format!("\n✅ {} characters in total.", names.len()));
    out
}

/// Split text into pieces of at most `max_chars` characters, preferring line breaks.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;
    for line in text.split_inclusive('\n') {
        let line_len = line.chars().count();
        if current_len + line_len > max_chars && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if line_len > max_chars {
            // A single overlong line is cut on character boundaries.
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }
        current.push_str(line);
        current_len += line_len;
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
