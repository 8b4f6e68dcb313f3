//! Binary entrypoint for the catchbot CLI.
//!
//! Commands:
//! - `start` - run the bot; with the `console` feature stdin/stdout act as the chat
//! - `init` - write a starter `config.toml`
//! - `status` - print catalogue and group counts
//! - `add-char` - add or replace a collectible in the catalogue
//! - `list-chars` - list every collectible name
//! - `wipe --yes` - clear all collections and active spawns
//!
//! See the library crate docs for module-level details: `catchbot::`.
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use tokio::sync::mpsc;

use catchbot::bot::server::store_status;
use catchbot::bot::GameServer;
use catchbot::config::Config;
use catchbot::game::types::Collectible;
use catchbot::storage::{RecordStore, SledStore, SledStoreBuilder};

#[derive(Parser)]
#[command(name = "catchbot")]
#[command(about = "Character spawn and catch game for group chats")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot
    Start,
    /// Write a default configuration file
    Init,
    /// Show catalogue and group statistics
    Status {
        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },
    /// Add or replace a collectible
    AddChar {
        /// Rarity tier, e.g. SSR
        #[arg(short, long)]
        rarity: String,
        /// Image shown when the character spawns
        #[arg(short, long)]
        image_url: String,
        /// Category used for collection progress
        #[arg(long)]
        category: Option<String>,
        /// Character name (may contain spaces)
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },
    /// List all collectible names A-Z
    ListChars,
    /// Clear every collection, active spawn and last winner
    Wipe {
        /// Confirm the wipe
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Init = cli.command {
        init_logging(None, cli.verbose);
        if std::path::Path::new(&cli.config).exists() {
            bail!("{} already exists; remove it first", cli.config);
        }
        Config::create_default(&cli.config).await?;
        info!("Configuration file created at {}", cli.config);
        println!(
            "Wrote {}. Set bot.owner_id (or CATCHBOT_OWNER_ID) before starting.",
            cli.config
        );
        return Ok(());
    }

    let config = Config::load(&cli.config).await?;
    init_logging(Some(&config), cli.verbose);

    match cli.command {
        Commands::Init => {}
        Commands::Start => {
            info!("Starting catchbot v{}", env!("CARGO_PKG_VERSION"));
            tokio::fs::create_dir_all(&config.storage.data_dir)
                .await
                .with_context(|| format!("Failed to create {}", config.storage.data_dir))?;
            let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
            let (events_tx, events_rx) = mpsc::unbounded_channel();
            let mut server = GameServer::open(config, outgoing_tx)?;

            #[cfg(feature = "console")]
            {
                use catchbot::bot::console;
                tokio::spawn(console::print_outgoing(outgoing_rx));
                tokio::spawn(async move {
                    if let Err(e) = console::read_events(events_tx).await {
                        warn!("Console input failed: {}", e);
                    }
                });
            }
            #[cfg(not(feature = "console"))]
            let _idle_transport = {
                warn!("No transport compiled in; running timers until shutdown");
                (events_tx, outgoing_rx)
            };

            server.run(events_rx).await?;
        }
        Commands::Status { json } => {
            let store = open_store(&config)?;
            let status = store_status(&store)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&status)?);
                return Ok(());
            }
            println!("{}: {}", config.bot.name, status);
            for group in store.list_groups()? {
                let active = store
                    .load_spawn(group.id)?
                    .map(|s| s.collectible.name)
                    .unwrap_or_else(|| "-".to_string());
                println!("  {} '{}' active: {}", group.id, group.title, active);
            }
        }
        Commands::AddChar {
            rarity,
            image_url,
            category,
            name,
        } => {
            let store = open_store(&config)?;
            let collectible = Collectible::new(name.join(" "), image_url, rarity, category);
            if collectible.name.is_empty() {
                bail!("Character name must not be empty");
            }
            store.put_collectible(collectible.clone())?;
            info!("Collectible added: {}", collectible.name);
            println!(
                "Added {} {} ({}, {})",
                collectible.glyph, collectible.name, collectible.rarity, collectible.category
            );
        }
        Commands::ListChars => {
            let store = open_store(&config)?;
            let names = store.list_collectible_names()?;
            for (idx, name) in names.iter().enumerate() {
                println!("{}. {}", idx + 1, name);
            }
            println!("{} characters in total.", names.len());
        }
        Commands::Wipe { yes } => {
            if !yes {
                bail!("Refusing to wipe without --yes");
            }
            let store = open_store(&config)?;
            store.wipe_all()?;
            warn!("All collections and active spawns wiped from the command line");
            println!("Wiped.");
        }
    }

    Ok(())
}

fn open_store(config: &Config) -> Result<SledStore> {
    let path = config.storage.db_path();
    SledStoreBuilder::new(&path)
        .open()
        .with_context(|| format!("Failed to open record store at {}", path.display()))
}

fn init_logging(config: Option<&Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    let configured = config
        .and_then(|cfg| cfg.logging.level.parse::<log::LevelFilter>().ok())
        .unwrap_or(log::LevelFilter::Info);
    // CLI verbosity overrides the configured level
    let base_level = match verbosity {
        0 => configured,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config
        .and_then(|cfg| cfg.logging.file.as_ref())
        .and_then(|file| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(file)
                .ok()
        });

    match log_file {
        Some(f) => {
            let file = std::sync::Mutex::new(f);
            // Echo to the console only when someone is watching it
            let is_tty = atty::is(atty::Stream::Stderr);
            builder.format(move |fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                let line = format!("{} [{}] {}", ts, record.level(), record.args());
                if let Ok(mut guard) = file.lock() {
                    let _ = writeln!(guard, "{}", line);
                }
                if is_tty {
                    writeln!(fmt, "{}", line)
                } else {
                    Ok(())
                }
            });
        }
        None => {
            builder.format(|fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
            });
        }
    }
    let _ = builder.try_init();
}
