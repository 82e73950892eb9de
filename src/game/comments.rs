//! Per-cell text annotations.
//!
//! Comments are keyed by cell number. The persisted form is either the
//! current wrapped document `{"comments": {...}, "_savedAt": ..., "_version": ...}`
//! or a bare `{"<cell>": {...}}` mapping written by older clients; both load.

use std::collections::BTreeMap;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use super::state::RECORD_VERSION;
use crate::error::{GameError, GameResult};
use crate::validation::{normalize_comment_text, validate_cell};

/// Display format for comment timestamps (local time).
pub const DATE_FORMAT: &str = "%d.%m.%Y, %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub text: String,
    pub date: String,
    pub cell: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentBook {
    entries: BTreeMap<u8, Comment>,
}

impl CommentBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the comment on `cell`, stamped with the current
    /// local time.
    pub fn upsert(&mut self, cell: u32, text: &str) -> GameResult<&Comment> {
        let date = Local::now().format(DATE_FORMAT).to_string();
        self.upsert_dated(cell, text, date)
    }

    pub fn upsert_dated(&mut self, cell: u32, text: &str, date: String) -> GameResult<&Comment> {
        let cell = validate_cell(cell)
            .ok_or_else(|| GameError::Validation(format!("Cell {} is not on the board", cell)))?;
        let text = normalize_comment_text(text)
            .ok_or_else(|| GameError::Validation("Comment text is empty".to_string()))?;
        self.entries.insert(cell, Comment { text, date, cell });
        Ok(&self.entries[&cell])
    }

    /// Remove the comment on `cell`. Returns whether one was there.
    pub fn delete(&mut self, cell: u32) -> bool {
        match u8::try_from(cell) {
            Ok(c) => self.entries.remove(&c).is_some(),
            Err(_) => false,
        }
    }

    pub fn clear_all(&mut self) {
        self.entries.clear();
    }

    pub fn get(&self, cell: u8) -> Option<&Comment> {
        self.entries.get(&cell)
    }

    pub fn contains(&self, cell: u8) -> bool {
        self.entries.contains_key(&cell)
    }

    /// Comments in ascending cell order.
    pub fn list(&self) -> Vec<&Comment> {
        self.entries.values().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop entries outside the board and make each `cell` field agree with
    /// its key.
    fn normalized(mut self) -> Self {
        self.entries.retain(|k, _| validate_cell(*k as u32).is_some());
        for (k, c) in self.entries.iter_mut() {
            c.cell = *k;
        }
        self
    }
}

/// Current on-disk shape of `comments_<id>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentsRecord {
    pub comments: CommentBook,
    #[serde(rename = "_savedAt", default, skip_serializing_if = "Option::is_none")]
    pub stamp: Option<DateTime<Utc>>,
    #[serde(rename = "_version", default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl CommentsRecord {
    pub fn new(comments: CommentBook, now: DateTime<Utc>) -> Self {
        CommentsRecord {
            comments,
            stamp: Some(now),
            version: Some(RECORD_VERSION.to_string()),
        }
    }
}

/// Decode either persisted layout.
pub fn decode_comments(value: serde_json::Value) -> Result<CommentBook, serde_json::Error> {
    let wrapped = value
        .as_object()
        .map(|o| o.get("comments").map(|c| c.is_object()).unwrap_or(false))
        .unwrap_or(false);
    let book = if wrapped {
        serde_json::from_value::<CommentsRecord>(value)?.comments
    } else {
        serde_json::from_value::<CommentBook>(value)?
    };
    Ok(book.normalized())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_text_and_leaves_book_unchanged() {
        let mut book = CommentBook::new();
        book.upsert(5, "keep").unwrap();
        let before = book.clone();
        assert!(matches!(book.upsert(5, ""), Err(GameError::Validation(_))));
        assert!(matches!(book.upsert(7, "   \t"), Err(GameError::Validation(_))));
        assert_eq!(book, before);
    }

    #[test]
    fn rejects_off_board_cells() {
        let mut book = CommentBook::new();
        assert!(book.upsert(0, "x").is_err());
        assert!(book.upsert(101, "x").is_err());
        assert!(book.is_empty());
    }

    #[test]
    fn upsert_overwrites_and_trims() {
        let mut book = CommentBook::new();
        book.upsert_dated(42, "first", "a".into()).unwrap();
        book.upsert_dated(42, "  second  ", "b".into()).unwrap();
        let c = book.get(42).unwrap();
        assert_eq!(c.text, "second");
        assert_eq!(c.date, "b");
        assert_eq!(c.cell, 42);
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn delete_missing_is_noop() {
        let mut book = CommentBook::new();
        assert!(!book.delete(9));
        assert!(!book.delete(100_000));
        book.upsert(9, "x").unwrap();
        assert!(book.delete(9));
        assert!(book.is_empty());
    }

    #[test]
    fn list_is_numeric_order_after_edits() {
        let mut book = CommentBook::new();
        for cell in [100, 9, 42, 2, 10] {
            book.upsert(cell, &format!("c{}", cell)).unwrap();
        }
        book.delete(42);
        book.upsert(3, "c3").unwrap();
        let cells: Vec<u8> = book.list().iter().map(|c| c.cell).collect();
        assert_eq!(cells, vec![2, 3, 9, 10, 100]);
    }

    #[test]
    fn decodes_both_layouts() {
        let bare = serde_json::json!({
            "10": {"text": "ten", "date": "d", "cell": 10},
            "2": {"text": "two", "date": "d", "cell": 7}
        });
        let book = decode_comments(bare).unwrap();
        let cells: Vec<u8> = book.list().iter().map(|c| c.cell).collect();
        assert_eq!(cells, vec![2, 10]);

        let wrapped = serde_json::json!({
            "comments": {"5": {"text": "five", "date": "d", "cell": 5}},
            "_savedAt": "2024-01-01T00:00:00.000Z",
            "_version": "1.0"
        });
        let book = decode_comments(wrapped).unwrap();
        assert_eq!(book.get(5).map(|c| c.text.as_str()), Some("five"));

        let empty = decode_comments(serde_json::json!({})).unwrap();
        assert!(empty.is_empty());
    }
}
