//! Directory-of-JSON-files backend.
//!
//! Each key maps to `<data_dir>/<safe_filename(key)>.json`. Writes go to a
//! unique temp file in the same directory and are renamed over the target, so
//! a crash never leaves a half-written record behind. Writers and removers of
//! one key serialize on an exclusive `fs2` lock over a sidecar
//! `.<file>.lock` that is never renamed or deleted; locking the record itself
//! would not exclude anyone once the rename swaps its inode.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use super::{KvStore, StoreError};
use crate::validation::{key_from_filename, safe_filename};

const EXT: &str = "json";

pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (creating if needed) the store rooted at `dir`.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(FileStore { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", safe_filename(key), EXT))
    }

    /// Take the exclusive lock guarding `path`. Released when the file drops.
    fn lock_record(path: &Path) -> Result<File, StoreError> {
        let lock_file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(lock_path_for(path))?;
        lock_file.lock_exclusive()?;
        Ok(lock_file)
    }

    fn write_file_locked(path: &Path, content: &str) -> Result<(), StoreError> {
        let lock_file = Self::lock_record(path)?;

        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let base = record_base(path);
        let mut counter = 0u32;
        let tmp_path = loop {
            let candidate = dir.join(format!(".{}.tmp-{}-{}", base, std::process::id(), counter));
            match OpenOptions::new().write(true).create_new(true).open(&candidate) {
                Ok(mut tmp) => {
                    tmp.write_all(content.as_bytes())?;
                    tmp.flush()?;
                    let _ = tmp.sync_all();
                    break candidate;
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    counter = counter.saturating_add(1);
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        };

        fs::rename(&tmp_path, path)?;
        // Persist the rename (best-effort)
        if let Ok(dir_file) = File::open(dir) {
            let _ = dir_file.sync_all();
        }
        drop(lock_file);
        Ok(())
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key);
        match fs::read(&path) {
            Ok(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|_| StoreError::Utf8(key.to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        Self::write_file_locked(&self.path_for(key), value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let _lock = Self::lock_record(&path)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let mut out = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            // Skip lock files and temp files from interrupted writes
            if name.starts_with('.') {
                continue;
            }
            let Some(stem) = name.strip_suffix(".json") else { continue };
            if let Some(key) = key_from_filename(stem) {
                out.push(key);
            }
        }
        out.sort();
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "files"
    }
}

fn record_base(path: &Path) -> &str {
    path.file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("record.json")
}

fn lock_path_for(path: &Path) -> PathBuf {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    dir.join(format!(".{}.lock", record_base(path)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn set_get_remove_and_list() {
        let tmp = tempdir().unwrap();
        let mut store = FileStore::open(tmp.path().join("data")).unwrap();
        assert_eq!(store.get("users").unwrap(), None);

        store.set("users", "[]").unwrap();
        store.set("game_abc", "{\"position\":4}").unwrap();
        assert_eq!(store.get("users").unwrap().as_deref(), Some("[]"));
        assert_eq!(
            store.keys().unwrap(),
            vec!["game_abc".to_string(), "users".to_string()]
        );

        store.remove("users").unwrap();
        store.remove("users").unwrap();
        assert_eq!(store.get("users").unwrap(), None);
    }

    #[test]
    fn lock_lives_beside_the_record() {
        let tmp = tempdir().unwrap();
        let mut store = FileStore::open(tmp.path()).unwrap();
        store.set("game_guest", "{\"position\":3}").unwrap();
        let record = store.path_for("game_guest");
        let lock = lock_path_for(&record);
        assert_ne!(lock, record);
        assert!(lock.exists());

        // The lock survives the rename, so a second writer waits on the same inode
        let held = FileStore::lock_record(&record).unwrap();
        assert!(File::open(&lock).unwrap().try_lock_exclusive().is_err());
        drop(held);

        store.set("game_guest", "{\"position\":9}").unwrap();
        assert_eq!(
            store.get("game_guest").unwrap().as_deref(),
            Some("{\"position\":9}")
        );
        assert_eq!(store.keys().unwrap(), vec!["game_guest".to_string()]);

        store.remove("game_guest").unwrap();
        assert!(store.keys().unwrap().is_empty());
    }

    #[test]
    fn odd_keys_stay_inside_dir() {
        let tmp = tempdir().unwrap();
        let mut store = FileStore::open(tmp.path()).unwrap();
        store.set("../escape", "1").unwrap();
        assert!(!tmp.path().parent().unwrap().join("escape.json").exists());
        assert_eq!(store.keys().unwrap(), vec!["../escape".to_string()]);
    }
}
