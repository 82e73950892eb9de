//! Shared fixtures for integration tests.

use std::path::Path;

use snakeladder::app::App;
use snakeladder::auth::LaunchFlags;
use snakeladder::config::{Config, StorageBackend};
use snakeladder::storage::Storage;

/// Config pointing the given backend at `dir`, demo seeding off unless asked.
pub fn config_for(dir: &Path, backend: StorageBackend, seed_demo: bool) -> Config {
    let mut config = Config::default();
    config.storage.data_dir = dir.to_string_lossy().into_owned();
    config.storage.backend = backend;
    config.auth.seed_demo_account = seed_demo;
    config.logging.file = None;
    config.logging.security_file = None;
    config
}

/// App over the file backend rooted at `dir`.
#[allow(dead_code)]
pub fn file_app(dir: &Path) -> App {
    App::start(config_for(dir, StorageBackend::Files, false))
}

/// App over a fresh in-memory store.
#[allow(dead_code)]
pub fn memory_app() -> App {
    let mut config = Config::default();
    config.auth.seed_demo_account = false;
    App::with_storage(config, Storage::memory(), LaunchFlags::default())
}
