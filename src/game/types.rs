use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const COLLECTIBLE_SCHEMA_VERSION: u8 = 1;
pub const SPAWN_SCHEMA_VERSION: u8 = 1;
pub const CATCH_SCHEMA_VERSION: u8 = 1;
pub const GROUP_SCHEMA_VERSION: u8 = 1;

/// Opaque chat identifier as delivered by the transport.
pub type GroupId = i64;
/// Opaque user identifier as delivered by the transport.
pub type UserId = i64;

/// Category assigned when an admin adds a collectible without naming one.
pub const DEFAULT_CATEGORY: &str = "Unsorted";

/// Decorative glyph shown next to a collectible, derived from its rarity tier.
pub fn glyph_for_rarity(rarity: &str) -> &'static str {
    match rarity.to_ascii_uppercase().as_str() {
        "C" | "COMMON" => "⚪",
        "R" | "RARE" => "🔵",
        "SR" | "EPIC" => "🟣",
        "SSR" | "LEGENDARY" => "🟡",
        "UR" | "MYTHIC" => "🔴",
        _ => "✨",
    }
}

/// A named character that can be spawned in a group and caught.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collectible {
    pub name: String,
    pub image_url: String,
    pub rarity: String,
    pub category: String,
    pub glyph: String,
    pub schema_version: u8,
}

impl Collectible {
    /// Build a collectible, upper-casing the rarity and deriving its glyph.
    pub fn new(
        name: impl Into<String>,
        image_url: impl Into<String>,
        rarity: impl Into<String>,
        category: Option<String>,
    ) -> Self {
        let rarity = rarity.into().trim().to_uppercase();
        let glyph = glyph_for_rarity(&rarity).to_string();
        let category = category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
        Self {
            name: name.into().trim().to_string(),
            image_url: image_url.into().trim().to_string(),
            rarity,
            category,
            glyph,
            schema_version: COLLECTIBLE_SCHEMA_VERSION,
        }
    }

    /// Lookup key: names are unique ignoring case.
    pub fn name_key(name: &str) -> String {
        name.trim().to_lowercase()
    }

    /// Case-insensitive exact comparison against a guess. Only surrounding whitespace
    /// is ignored.
    pub fn matches_guess(&self, guess: &str) -> bool {
        let guess = guess.trim();
        !guess.is_empty() && guess.to_lowercase() == self.name.to_lowercase()
    }
}

/// The collectible currently claimable in a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveSpawn {
    pub id: Uuid,
    pub group: GroupId,
    pub collectible: Collectible,
    pub spawned_at: DateTime<Utc>,
    pub schema_version: u8,
}

impl ActiveSpawn {
    pub fn new(group: GroupId, collectible: Collectible, spawned_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            group,
            collectible,
            spawned_at,
            schema_version: SPAWN_SCHEMA_VERSION,
        }
    }
}

/// Who is claiming: the id keys the collection, the name is shown to the group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claimer {
    pub id: UserId,
    pub display_name: String,
}

impl Claimer {
    pub fn new(id: UserId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
        }
    }
}

/// Append-only fact: this claimer owns a snapshot of this collectible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatchRecord {
    pub id: Uuid,
    pub claimer_id: UserId,
    pub claimer_name: String,
    pub group: GroupId,
    pub collectible: Collectible,
    pub caught_at: DateTime<Utc>,
    pub schema_version: u8,
}

impl CatchRecord {
    pub fn new(claimer: &Claimer, spawn: &ActiveSpawn, caught_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            claimer_id: claimer.id,
            claimer_name: claimer.display_name.clone(),
            group: spawn.group,
            collectible: spawn.collectible.clone(),
            caught_at,
            schema_version: CATCH_SCHEMA_VERSION,
        }
    }
}

/// A chat the bot has been added to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRecord {
    pub id: GroupId,
    pub title: String,
    pub joined_at: DateTime<Utc>,
    pub schema_version: u8,
}

impl GroupRecord {
    pub fn new(id: GroupId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            joined_at: Utc::now(),
            schema_version: GROUP_SCHEMA_VERSION,
        }
    }
}

/// Why a spawn attempt did nothing even though collectibles exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AlreadyActive,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::AlreadyActive => write!(f, "already active"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpawnOutcome {
    Spawned(Collectible),
    Skipped(SkipReason),
    NoCollectiblesAvailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatchOutcome {
    Success(Collectible),
    WrongName,
    NothingActive,
    AlreadyCaughtBy(String),
}

/// Result of feeding one plain group message through the spawn pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    /// A spawn is already waiting to be caught; the message was not counted.
    Blocked,
    /// Sender hit the consecutive-message limit.
    Throttled,
    /// Counted; carries the group's running total.
    Counted(u32),
    /// Threshold reached and a spawn was attempted.
    Spawn(SpawnOutcome),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guess_matching_is_case_insensitive_and_exact() {
        let goku = Collectible::new("Goku", "https://img/goku.jpg", "ssr", None);
        assert!(goku.matches_guess("goku"));
        assert!(goku.matches_guess("  GOKU "));
        assert!(!goku.matches_guess("Gok"));
        assert!(!goku.matches_guess("Goku!"));
        assert!(!goku.matches_guess(""));
    }

    #[test]
    fn rarity_is_normalised_and_glyph_derived() {
        let c = Collectible::new("Violet Evergarden", "u", " ssr ", Some("  ".into()));
        assert_eq!(c.rarity, "SSR");
        assert_eq!(c.glyph, "🟡");
        assert_eq!(c.category, DEFAULT_CATEGORY);
        assert_eq!(glyph_for_rarity("whatever"), "✨");
    }

    #[test]
    fn accents_are_not_folded() {
        let c = Collectible::new("Chloé", "u", "R", None);
        assert!(c.matches_guess("CHLOÉ"));
        assert!(!c.matches_guess("Chloe"));
    }
}
