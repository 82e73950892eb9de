//! Per-identity export, import and wipe, plus whole-store statistics.
//!
//! An export bundle is the pretty-printed JSON document
//!
//! ```text
//! { "game": {...} | null, "comments": {...} | null,
//!   "settings": {...} | null, "exportedAt": "<rfc3339>" }
//! ```
//!
//! Import writes every present section on its own: a section that fails to
//! decode is skipped and reported, the others still land.

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::retention::SAVED_AT_FIELD;
use super::{keys, Storage};
use crate::error::{GameError, GameResult};
use crate::game::comments::{decode_comments, CommentsRecord};
use crate::game::state::GameRecord;

/// Nominal quota of the browser store this format was designed around.
pub const STORAGE_LIMIT_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    #[serde(default)]
    pub game: Option<Value>,
    #[serde(default)]
    pub comments: Option<Value>,
    #[serde(default)]
    pub settings: Option<Value>,
    #[serde(default)]
    pub exported_at: Option<DateTime<Utc>>,
}

impl ExportBundle {
    pub fn is_empty(&self) -> bool {
        self.game.is_none() && self.comments.is_none() && self.settings.is_none()
    }

    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data.trim_start_matches('\0'))
    }
}

/// Which sections an import wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub game: bool,
    pub comments: bool,
    pub settings: bool,
    /// Sections that were present but could not be decoded.
    pub rejected: Vec<&'static str>,
    /// False if any write stayed in memory only.
    pub persisted: bool,
}

impl ImportSummary {
    pub fn imported(&self) -> usize {
        [self.game, self.comments, self.settings]
            .iter()
            .filter(|b| **b)
            .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StorageStats {
    pub item_count: usize,
    /// Key plus value length in UTF-16 code units, summed over all keys.
    pub total_size: u64,
    /// `total_size * 2 / 1024`
    pub estimated_kib: f64,
    pub limit_bytes: u64,
}

pub fn export_identity(storage: &Storage, identity_id: &str, now: DateTime<Utc>) -> ExportBundle {
    ExportBundle {
        game: storage.load_json(&keys::game(identity_id)),
        comments: storage.load_json(&keys::comments(identity_id)),
        settings: storage.load_json(&keys::settings(identity_id)),
        exported_at: Some(now),
    }
}

pub fn import_identity(
    storage: &mut Storage,
    identity_id: &str,
    bundle: ExportBundle,
    now: DateTime<Utc>,
) -> GameResult<ImportSummary> {
    if bundle.is_empty() {
        return Err(GameError::Validation("Nothing to import".to_string()));
    }
    let mut summary = ImportSummary {
        persisted: true,
        ..ImportSummary::default()
    };

    if let Some(game) = bundle.game {
        match serde_json::from_value::<GameRecord>(game) {
            Ok(record) => {
                let record = record.restamped(now);
                summary.persisted &= storage.save_json(&keys::game(identity_id), &record);
                summary.game = true;
            }
            Err(e) => {
                warn!("import: game section rejected: {}", e);
                summary.rejected.push("game");
            }
        }
    }

    if let Some(comments) = bundle.comments {
        match decode_comments(comments) {
            Ok(book) => {
                let record = CommentsRecord::new(book, now);
                summary.persisted &= storage.save_json(&keys::comments(identity_id), &record);
                summary.comments = true;
            }
            Err(e) => {
                warn!("import: comments section rejected: {}", e);
                summary.rejected.push("comments");
            }
        }
    }

    if let Some(settings) = bundle.settings {
        match settings {
            Value::Object(mut map) => {
                map.insert(SAVED_AT_FIELD.to_string(), Value::String(now.to_rfc3339()));
                summary.persisted &=
                    storage.save_json(&keys::settings(identity_id), &Value::Object(map));
                summary.settings = true;
            }
            _ => {
                warn!("import: settings section is not an object");
                summary.rejected.push("settings");
            }
        }
    }

    info!(
        "import: '{}' received {} section(s), {} rejected",
        identity_id,
        summary.imported(),
        summary.rejected.len()
    );
    Ok(summary)
}

/// Remove game, comments and settings for `identity_id`. Returns whether
/// every removal reached the backend.
pub fn clear_identity(storage: &mut Storage, identity_id: &str) -> bool {
    let mut ok = true;
    for key in [
        keys::game(identity_id),
        keys::comments(identity_id),
        keys::settings(identity_id),
    ] {
        ok &= storage.remove(&key);
    }
    info!("storage: cleared data for '{}'", identity_id);
    ok
}

pub fn stats(storage: &Storage) -> StorageStats {
    let mut item_count = 0;
    let mut total_size: u64 = 0;
    for key in storage.keys() {
        let value_len = storage
            .get_raw(&key)
            .map(|v| v.encode_utf16().count())
            .unwrap_or(0);
        total_size += (key.encode_utf16().count() + value_len) as u64;
        item_count += 1;
    }
    StorageStats {
        item_count,
        total_size,
        estimated_kib: (total_size * 2) as f64 / 1024.0,
        limit_bytes: STORAGE_LIMIT_BYTES,
    }
}
