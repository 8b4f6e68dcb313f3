use catchbot::config::{Config, SpawnMode};
use tempfile::TempDir;

#[test]
fn default_file_round_trips_after_setting_owner() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("config.toml");
    let path_str = path.to_str().expect("utf8 path").to_string();

    tokio_test::block_on(Config::create_default(&path_str)).expect("write default");

    // The default has no owner and must be rejected until one is set.
    let err = tokio_test::block_on(Config::load(&path_str)).unwrap_err();
    assert!(err.to_string().contains("owner_id"), "{}", err);

    let content = std::fs::read_to_string(&path).expect("read");
    let content = content.replace("owner_id = 0", "owner_id = 4242");
    std::fs::write(&path, content).expect("rewrite");

    let config = tokio_test::block_on(Config::load(&path_str)).expect("load");
    assert_eq!(config.bot.owner_id, 4242);
    assert_eq!(config.game.spawn_threshold, 50);
    assert_eq!(config.game.anti_spam_limit, 10);
    assert_eq!(config.game.spawn_mode, SpawnMode::Messages);
}

#[tokio::test]
async fn interval_mode_from_file() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[bot]
name = "Catch Bot"
owner_id = 9

[game]
spawn_mode = "interval"
spawn_interval_secs = 900
hidden_name = true

[storage]
data_dir = "./data"

[logging]
level = "warn"
"#,
    )
    .expect("write");

    let config = Config::load(path.to_str().expect("utf8")).await.expect("load");
    assert_eq!(config.game.spawn_mode, SpawnMode::Interval);
    assert_eq!(
        config.game.spawn_interval(),
        Some(std::time::Duration::from_secs(900))
    );
    assert!(config.game.hidden_name);
}

#[tokio::test]
async fn missing_file_is_an_error() {
    let dir = TempDir::new().expect("tempdir");
    let missing = dir.path().join("nope.toml");
    let err = Config::load(missing.to_str().expect("utf8")).await.unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}
