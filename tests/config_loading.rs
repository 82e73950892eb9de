//! Config file round trip through tokio::fs.

use snakeladder::config::{Config, StorageBackend};
use tempfile::tempdir;

#[tokio::test]
async fn create_default_then_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    let path = path.to_str().unwrap();

    Config::create_default(path).await.unwrap();
    let config = Config::load(path).await.unwrap();
    assert_eq!(config.storage.backend, StorageBackend::Files);
    assert_eq!(config.storage.retention_days, 30);
    assert!(config.auth.seed_demo_account);
    assert_eq!(config.logging.file.as_deref(), Some("snakeladder.log"));
}

#[tokio::test]
async fn load_custom_sections() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("custom.toml");
    tokio::fs::write(
        &path,
        r#"
[game]
title = "Змеи и лестницы"

[storage]
data_dir = "/var/lib/snakeladder"
backend = "memory"
retention_days = 7

[logging]
level = "debug"
"#,
    )
    .await
    .unwrap();

    let config = Config::load(path.to_str().unwrap()).await.unwrap();
    assert_eq!(config.game.title, "Змеи и лестницы");
    assert_eq!(config.storage.backend, StorageBackend::Memory);
    assert_eq!(config.storage.retention_days, 7);
    assert_eq!(config.logging.level, "debug");
    assert!(config.logging.file.is_none());
}

#[tokio::test]
async fn missing_or_broken_file_is_an_error() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope.toml");
    assert!(Config::load(missing.to_str().unwrap()).await.is_err());

    let broken = dir.path().join("broken.toml");
    tokio::fs::write(&broken, "[storage\nbackend = ").await.unwrap();
    let err = Config::load(broken.to_str().unwrap()).await.unwrap_err();
    assert!(err.to_string().contains("Failed to parse"));
}
