//! Slash-command parser for group and private chat text.
//!
//! Commands look like `/catch Violet Evergarden` or `/catch@SomeBot Violet Evergarden`.
//! Matching on the command word is case-insensitive; everything after the first run of
//! whitespace is the argument string, passed through untouched apart from trimming.
//! Text that does not start with `/` is not a command and feeds the spawn counter.
use log::trace;

/// Arguments for `/addchar <RARITY> <IMAGE_URL> <Name…> [| <Category>]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddCharArgs {
    pub rarity: String,
    pub image_url: String,
    pub name: String,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    /// Claim attempt; the guess may be empty.
    Catch(String),
    Harem,
    AddChar(AddCharArgs),
    ListChars,
    Wipe,
    ClearSpawn,
    /// Recognised command with unusable arguments; carries a usage hint.
    Invalid(String),
    /// Slash command this bot does not handle.
    Unknown,
    /// Plain conversation.
    NotCommand,
}

pub const ADDCHAR_USAGE: &str =
    "Usage: /addchar <Rarity> <Image_URL> <Name> [| <Category>]\nExample: /addchar SSR https://i.imgur.com/link.jpg Violet Evergarden | Violet Evergarden";

/// Minimal chat command parser
pub struct CommandParser;

impl CommandParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, raw: &str) -> BotCommand {
        let trimmed = raw.trim();
        let Some(body) = trimmed.strip_prefix('/') else {
            return BotCommand::NotCommand;
        };
        let (word, args) = match body.find(char::is_whitespace) {
            Some(idx) => (&body[..idx], body[idx..].trim()),
            None => (body, ""),
        };
        // Drop an @botname suffix on the command word.
        let word = word.split('@').next().unwrap_or_default();
        let command = match word.to_ascii_lowercase().as_str() {
            "start" | "help" => BotCommand::Start,
            "catch" | "guess" => BotCommand::Catch(args.to_string()),
            "harem" | "collection" => BotCommand::Harem,
            "addchar" => Self::parse_addchar(args),
            "wang" | "chars" => BotCommand::ListChars,
            "wipe" => BotCommand::Wipe,
            "clearspawn" => BotCommand::ClearSpawn,
            _ => BotCommand::Unknown,
        };
        trace!("Parsed {:?} from '{}'", command, raw);
        command
    }

    fn parse_addchar(args: &str) -> BotCommand {
        let (main, category) = match args.split_once('|') {
            Some((main, category)) => (main.trim(), Some(category.trim().to_string())),
            None => (args, None),
        };
        let mut parts = main.split_whitespace();
        let (Some(rarity), Some(image_url)) = (parts.next(), parts.next()) else {
            return BotCommand::Invalid(ADDCHAR_USAGE.into());
        };
        let name = parts.collect::<Vec<_>>().join(" ");
        if name.is_empty() {
            return BotCommand::Invalid(ADDCHAR_USAGE.into());
        }
        BotCommand::AddChar(AddCharArgs {
            rarity: rarity.to_uppercase(),
            image_url: image_url.to_string(),
            name,
            category: category.filter(|c| !c.is_empty()),
        })
    }
}

impl Default for CommandParser {
    fn default() -> Self {
        Self::new()
    }
}
