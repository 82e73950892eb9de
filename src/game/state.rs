use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::board::{FINAL_CELL, FIRST_CELL};

pub const RECORD_VERSION: &str = "1.0";

/// Where the game is, derived from position and the pending die value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for a roll.
    Idle,
    /// A die value is pending; waiting for `move`.
    Rolled(u8),
    /// Token is on the final cell. Only `reset` (or a manual jump) leaves this.
    Won,
}

/// Live game state for one identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    pub position: u8,
    pub roll_count: u32,
    pub move_count: u32,
    /// Pending die value; 0 means nothing rolled. Never persisted.
    pub dice_value: u8,
}

impl Default for GameState {
    fn default() -> Self {
        GameState {
            position: FIRST_CELL,
            roll_count: 0,
            move_count: 0,
            dice_value: 0,
        }
    }
}

impl GameState {
    pub fn phase(&self) -> Phase {
        if self.is_won() {
            Phase::Won
        } else if self.dice_value > 0 {
            Phase::Rolled(self.dice_value)
        } else {
            Phase::Idle
        }
    }

    pub fn is_won(&self) -> bool {
        self.position >= FINAL_CELL
    }

    /// Destination of the pending roll. Overshoot clamps to the final cell.
    pub fn target(&self) -> Option<u8> {
        if self.dice_value == 0 {
            return None;
        }
        Some(clamped_advance(self.position, self.dice_value))
    }
}

/// `min(position + dice, 100)`
pub fn clamped_advance(position: u8, dice: u8) -> u8 {
    position.saturating_add(dice).min(FINAL_CELL)
}

/// On-disk shape of `game_<id>`.
///
/// Unknown fields are ignored and every field is optional so that records
/// written by older clients (no `_savedAt`, no `_version`) still load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    #[serde(default)]
    pub position: i64,
    #[serde(default)]
    pub roll_count: i64,
    #[serde(default)]
    pub move_count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
    #[serde(rename = "_savedAt", default, skip_serializing_if = "Option::is_none")]
    pub stamp: Option<DateTime<Utc>>,
    #[serde(rename = "_version", default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl GameRecord {
    pub fn from_state(state: &GameState, now: DateTime<Utc>) -> Self {
        GameRecord {
            position: state.position as i64,
            roll_count: state.roll_count as i64,
            move_count: state.move_count as i64,
            saved_at: Some(now),
            stamp: Some(now),
            version: Some(RECORD_VERSION.to_string()),
        }
    }

    /// Re-stamp a record (import path) without touching its contents.
    pub fn restamped(mut self, now: DateTime<Utc>) -> Self {
        self.stamp = Some(now);
        self.version = Some(RECORD_VERSION.to_string());
        self
    }

    /// Convert into live state. A zero/missing position becomes cell 1; out of
    /// range values are clamped; negative counters become 0.
    pub fn into_state(self) -> GameState {
        let position = if self.position <= 0 {
            FIRST_CELL
        } else {
            self.position.min(FINAL_CELL as i64) as u8
        };
        let counter = |v: i64| v.clamp(0, u32::MAX as i64) as u32;
        GameState {
            position,
            roll_count: counter(self.roll_count),
            move_count: counter(self.move_count),
            dice_value: 0,
        }
    }
}
