use std::path::Path;

use super::{KvStore, StoreError};

const TREE_RECORDS: &str = "snakeladder_records";

/// Sled-backed key-value store. Values are UTF-8 JSON documents.
pub struct SledStore {
    _db: sled::Db,
    records: sled::Tree,
}

impl SledStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path_ref = path.as_ref();
        std::fs::create_dir_all(path_ref)?;
        let db = sled::open(path_ref)?;
        let records = db.open_tree(TREE_RECORDS)?;
        Ok(SledStore { _db: db, records })
    }
}

impl KvStore for SledStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self.records.get(key.as_bytes())? {
            Some(bytes) => String::from_utf8(bytes.to_vec())
                .map(Some)
                .map_err(|_| StoreError::Utf8(key.to_string())),
            None => Ok(None),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.records.insert(key.as_bytes(), value.as_bytes())?;
        self.records.flush()?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.records.remove(key.as_bytes())?;
        self.records.flush()?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let mut out = Vec::new();
        for item in self.records.iter() {
            let (k, _) = item?;
            match String::from_utf8(k.to_vec()) {
                Ok(s) => out.push(s),
                Err(_) => log::warn!("sled store: skipping non-utf8 key"),
            }
        }
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "sled"
    }
}
