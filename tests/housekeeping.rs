//! Startup retention cleanup over a real data directory.

mod common;

use chrono::{Duration, Utc};
use snakeladder::app::{App, Command};
use snakeladder::config::StorageBackend;
use snakeladder::storage::{FileStore, KvStore};
use tempfile::tempdir;

fn stamped_game(days_ago: i64, position: u8) -> String {
    let ts = Utc::now() - Duration::days(days_ago);
    format!(
        "{{\"position\":{},\"rollCount\":2,\"moveCount\":2,\"_savedAt\":\"{}\",\"_version\":\"1.0\"}}",
        position,
        ts.to_rfc3339()
    )
}

#[test]
fn stale_records_removed_at_startup() {
    let dir = tempdir().unwrap();
    {
        let mut store = FileStore::open(dir.path()).unwrap();
        store.set("game_old", &stamped_game(31, 70)).unwrap();
        store.set("game_guest", &stamped_game(29, 20)).unwrap();
        store.set("users", "[]").unwrap();
        store.set("settings_old", "{broken").unwrap();
    }

    let app = common::file_app(dir.path());
    assert!(app.storage().get_raw("game_old").is_none());
    assert!(app.storage().get_raw("users").is_some());
    assert!(app.storage().get_raw("settings_old").is_some());
    assert_eq!(app.game().state().position, 20);
}

#[test]
fn zero_retention_disables_startup_purge() {
    let dir = tempdir().unwrap();
    {
        let mut store = FileStore::open(dir.path()).unwrap();
        store.set("game_guest", &stamped_game(400, 55)).unwrap();
    }
    let mut config = common::config_for(dir.path(), StorageBackend::Files, false);
    config.storage.retention_days = 0;
    let app = App::start(config);
    assert_eq!(app.game().state().position, 55);
}

#[test]
fn manual_housekeep_reports_counts() {
    let dir = tempdir().unwrap();
    let mut config = common::config_for(dir.path(), StorageBackend::Files, false);
    config.storage.retention_days = 0;
    {
        let mut store = FileStore::open(dir.path()).unwrap();
        store.set("game_guest", &stamped_game(45, 55)).unwrap();
        store.set("comments_guest", &stamped_game(1, 1)).unwrap();
    }
    let mut app = App::start(config);
    assert_eq!(app.game().state().position, 55);

    let mut config = app.config().clone();
    config.storage.retention_days = 30;
    drop(app);
    let mut app = App::start(config);
    // Startup already purged the 45-day game; a second pass finds nothing
    assert_eq!(app.game().state().position, 1);
    let stats = app.housekeep();
    assert_eq!(stats.purged, 0);
    assert_eq!(stats.kept, 1);
}

#[test]
fn zero_retention_disables_manual_housekeep() {
    let dir = tempdir().unwrap();
    let mut config = common::config_for(dir.path(), StorageBackend::Files, false);
    config.storage.retention_days = 0;
    let mut app = App::start(config);
    assert!(app.dispatch(Command::MoveToCell(40)).success);

    let stats = app.housekeep();
    assert_eq!(stats.purged, 0);
    assert_eq!(stats.scanned, 0);
    assert_eq!(app.game().state().position, 40);
    assert!(app.storage().get_raw("game_guest").is_some());
    assert!(app.storage().get_raw("comments_guest").is_some());
}

#[test]
fn huge_retention_keeps_everything() {
    let dir = tempdir().unwrap();
    {
        let mut store = FileStore::open(dir.path()).unwrap();
        store.set("game_guest", &stamped_game(3650, 64)).unwrap();
    }
    let mut config = common::config_for(dir.path(), StorageBackend::Files, false);
    config.storage.retention_days = 200_000_000;
    let mut app = App::start(config);
    assert_eq!(app.game().state().position, 64);

    let stats = app.housekeep();
    assert_eq!(stats.purged, 0);
    assert_eq!(stats.kept, 1);
    assert_eq!(app.game().state().position, 64);
}
