mod common;

use catchbot::bot::transport::{ChatEvent, ChatRef, Outgoing, Sender};
use catchbot::bot::GameServer;
use catchbot::config::{Config, SpawnMode};
use common::{test_config, OWNER};
use tempfile::TempDir;
use tokio::sync::mpsc;

const GROUP: i64 = -5005;

fn say(chat: ChatRef, user: i64, name: &str, text: &str) -> ChatEvent {
    ChatEvent::Text {
        chat,
        sender: Sender::new(user, name),
        text: text.to_string(),
    }
}

fn group() -> ChatRef {
    ChatRef::group(GROUP, "Anime Club")
}

/// Feed every event, close the inbound channel and collect what the bot sent.
async fn run_script(config: Config, events: Vec<ChatEvent>) -> Vec<Outgoing> {
    let (out_tx, mut out_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let mut server = GameServer::open(config, out_tx).expect("server");
    for event in events {
        event_tx.send(event).expect("queue event");
    }
    drop(event_tx);
    server.run(event_rx).await.expect("run");
    drop(server);

    let mut sent = Vec::new();
    while let Some(msg) = out_rx.recv().await {
        sent.push(msg);
    }
    sent
}

fn texts(sent: &[Outgoing]) -> Vec<&str> {
    sent.iter()
        .filter_map(|m| match m {
            Outgoing::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn spawn_catch_and_collection_flow() {
    let dir = TempDir::new().expect("tempdir");
    let mut config = test_config(&dir);
    config.game.spawn_threshold = 4;

    let mut events = vec![
        ChatEvent::BotAdded {
            chat: group(),
            member_count: 20,
        },
        say(
            ChatRef::private(OWNER),
            OWNER,
            "Owner",
            "/addchar ssr https://example.org/violet.jpg Violet Evergarden | Violet Evergarden",
        ),
    ];
    for i in 0..4 {
        events.push(say(group(), 10 + i, "member", "hello"));
    }
    events.push(say(group(), 20, "Bob", "/catch Violet"));
    events.push(say(group(), 21, "Alice", "/catch violet evergarden"));
    events.push(say(group(), 20, "Bob", "/catch Violet Evergarden"));
    events.push(say(group(), 21, "Alice", "/harem"));

    let sent = run_script(config, events).await;

    let photos: Vec<_> = sent
        .iter()
        .filter_map(|m| match m {
            Outgoing::Photo {
                chat_id,
                image_url,
                caption,
            } => Some((*chat_id, image_url.as_str(), caption.as_str())),
            _ => None,
        })
        .collect();
    assert_eq!(photos.len(), 1);
    assert_eq!(photos[0].0, GROUP);
    assert_eq!(photos[0].1, "https://example.org/violet.jpg");
    assert!(photos[0].2.contains("/catch Violet Evergarden"));

    let replies = texts(&sent);
    assert!(replies.iter().any(|t| t.contains("A character will appear every 4 messages")));
    assert!(replies.iter().any(|t| t.contains("Character added")));
    assert!(replies.iter().any(|t| t.contains("Wrong name")));
    assert!(replies.iter().any(|t| t.contains("Alice caught")));
    assert!(replies.iter().any(|t| t.contains("caught by Alice")));
    let harem = replies
        .iter()
        .find(|t| t.contains("Harem Collection"))
        .expect("harem reply");
    assert!(harem.contains("Violet Evergarden"));
    assert!(harem.contains("Violet Evergarden: 1/1"));
}

#[tokio::test]
async fn hidden_name_caption_and_informative_idle_reply() {
    let dir = TempDir::new().expect("tempdir");
    let mut config = test_config(&dir);
    config.game.spawn_threshold = 2;
    config.game.hidden_name = true;
    config.game.reply_when_nothing_active = true;

    let events = vec![
        say(group(), 3, "Carol", "/catch anyone"),
        say(ChatRef::private(OWNER), OWNER, "Owner", "/addchar R https://x/m.png Mikasa"),
        say(group(), 1, "a", "hi"),
        say(group(), 2, "b", "hi"),
    ];
    let sent = run_script(config, events).await;

    assert!(texts(&sent)
        .iter()
        .any(|t| t.contains("no character to catch")));
    let caption = sent
        .iter()
        .find_map(|m| match m {
            Outgoing::Photo { caption, .. } => Some(caption.clone()),
            _ => None,
        })
        .expect("spawn announced");
    assert!(!caption.contains("Mikasa"));
}

#[tokio::test]
async fn owner_commands_and_gating() {
    let dir = TempDir::new().expect("tempdir");
    let mut config = test_config(&dir);
    config.bot.min_group_members = 10;
    config.bot.max_message_chars = 200;

    let mut events = vec![ChatEvent::BotAdded {
        chat: ChatRef::group(-77, "Tiny"),
        member_count: 3,
    }];
    for i in 0..30 {
        events.push(say(
            ChatRef::private(OWNER),
            OWNER,
            "Owner",
            &format!("/addchar C https://x/{}.png Character {:02}", i, i),
        ));
    }
    events.push(say(ChatRef::private(OWNER), OWNER, "Owner", "/wang"));
    events.push(say(ChatRef::private(5), 5, "Mallory", "/wipe"));

    let sent = run_script(config.clone(), events).await;

    assert!(sent.contains(&Outgoing::Leave { chat_id: -77 }));
    let listing: Vec<&str> = texts(&sent)
        .into_iter()
        .filter(|t| !t.contains("Character added"))
        .filter(|t| t.contains("Character "))
        .collect();
    assert!(listing.len() > 1, "listing should be chunked: {:?}", listing);
    assert!(listing.iter().all(|t| t.chars().count() <= 200));
    assert!(texts(&sent).iter().any(|t| t.contains("Only the bot owner")));

    let store = common::open_store(&dir);
    assert!(store.list_groups().expect("groups").is_empty());
    assert_eq!(store.collectible_count().expect("count"), 30);
}

#[tokio::test]
async fn interval_mode_spawns_in_known_groups() {
    let dir = TempDir::new().expect("tempdir");
    let mut config = test_config(&dir);
    config.game.spawn_mode = SpawnMode::Interval;
    config.game.spawn_interval_secs = Some(3600);

    let (out_tx, mut out_rx) = mpsc::unbounded_channel();
    let server = GameServer::open(config, out_tx).expect("server");
    server
        .handle_event(ChatEvent::BotAdded {
            chat: group(),
            member_count: 5,
        })
        .expect("added");
    server
        .handle_event(say(
            ChatRef::private(OWNER),
            OWNER,
            "Owner",
            "/addchar UR https://x/g.png Gojo",
        ))
        .expect("addchar");

    assert_eq!(server.spawn_tick().expect("tick"), 1);
    assert_eq!(server.spawn_tick().expect("tick again"), 0);
    assert!(server.status_summary().expect("status").contains("1 active spawns"));

    drop(server);
    let mut photos = 0;
    while let Some(msg) = out_rx.recv().await {
        if let Outgoing::Photo { chat_id, .. } = msg {
            assert_eq!(chat_id, GROUP);
            photos += 1;
        }
    }
    assert_eq!(photos, 1);
}
