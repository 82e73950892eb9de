//! Game state controller: roll, move, jump, reset and comment edits for one
//! identity, persisting after every mutation.
//!
//! The controller never owns storage. Every mutating call takes
//! `&mut Storage`, applies the change in memory first and then writes both
//! `game_<id>` and `comments_<id>`. A failed write is reported through
//! [`Outcome::persisted`]; the in-memory state is kept either way.

use chrono::Utc;
use log::{debug, info};
use rand::Rng;

use super::board::{FINAL_CELL, FIRST_CELL};
use super::comments::{decode_comments, CommentBook, CommentsRecord};
use super::state::{clamped_advance, GameRecord, GameState, Phase};
use crate::error::{GameError, GameResult};
use crate::logutil::escape_log;
use crate::storage::{keys, Storage};
use crate::validation::validate_cell;

pub const DIE_FACES: u8 = 6;

/// Things that happened during one command, for the front end to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    Rolled { value: u8, target: u8 },
    Moved { from: u8, to: u8 },
    Won { rolls: u32, moves: u32 },
    Reset,
    CommentSaved { cell: u8 },
    CommentDeleted { cell: u8 },
    CommentsCleared,
    Saved,
}

/// Result of a successful controller call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub events: Vec<GameEvent>,
    /// Whether the change reached durable storage.
    pub persisted: bool,
}

impl Outcome {
    fn new(events: Vec<GameEvent>, persisted: bool) -> Self {
        Outcome { events, persisted }
    }
}

#[derive(Debug, Clone)]
pub struct GameController {
    identity_id: String,
    state: GameState,
    comments: CommentBook,
}

impl GameController {
    /// Fresh game for `identity_id` (nothing read from storage).
    pub fn new(identity_id: &str) -> Self {
        GameController {
            identity_id: identity_id.to_string(),
            state: GameState::default(),
            comments: CommentBook::new(),
        }
    }

    /// Load the saved game and comments for `identity_id`. Missing or
    /// malformed records fall back to a fresh game / empty comments.
    pub fn load(storage: &Storage, identity_id: &str) -> Self {
        let state = storage
            .load_json::<GameRecord>(&keys::game(identity_id))
            .map(GameRecord::into_state)
            .unwrap_or_default();
        let comments = storage
            .load_json::<serde_json::Value>(&keys::comments(identity_id))
            .and_then(|v| match decode_comments(v) {
                Ok(book) => Some(book),
                Err(e) => {
                    log::warn!("game: ignoring malformed comments for '{}': {}", identity_id, e);
                    None
                }
            })
            .unwrap_or_default();
        debug!(
            "game: loaded '{}' at cell {} ({} comments)",
            identity_id,
            state.position,
            comments.len()
        );
        GameController {
            identity_id: identity_id.to_string(),
            state,
            comments,
        }
    }

    pub fn identity_id(&self) -> &str {
        &self.identity_id
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn comments(&self) -> &CommentBook {
        &self.comments
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// Write game and comments. Returns `true` only if both writes persisted.
    pub fn save(&self, storage: &mut Storage) -> bool {
        let now = Utc::now();
        let game_ok = storage.save_json(
            &keys::game(&self.identity_id),
            &GameRecord::from_state(&self.state, now),
        );
        let comments_ok = storage.save_json(
            &keys::comments(&self.identity_id),
            &CommentsRecord::new(self.comments.clone(), now),
        );
        game_ok && comments_ok
    }

    /// Roll the die with the thread-local RNG.
    pub fn roll(&mut self, storage: &mut Storage) -> GameResult<Outcome> {
        self.roll_with(storage, &mut rand::thread_rng())
    }

    pub fn roll_with<R: Rng>(
        &mut self,
        storage: &mut Storage,
        rng: &mut R,
    ) -> GameResult<Outcome> {
        match self.state.phase() {
            Phase::Won => {
                return Err(GameError::IllegalAction(
                    "The game is over. Start a new game to roll again".into(),
                ))
            }
            Phase::Rolled(v) => {
                return Err(GameError::IllegalAction(format!(
                    "Already rolled a {}; move first",
                    v
                )))
            }
            Phase::Idle => {}
        }
        let value = rng.gen_range(1..=DIE_FACES);
        self.state.dice_value = value;
        self.state.roll_count = self.state.roll_count.saturating_add(1);
        let target = clamped_advance(self.state.position, value);
        debug!("game: '{}' rolled {} (-> {})", self.identity_id, value, target);
        let persisted = self.save(storage);
        Ok(Outcome::new(vec![GameEvent::Rolled { value, target }], persisted))
    }

    /// Apply the pending roll.
    pub fn move_token(&mut self, storage: &mut Storage) -> GameResult<Outcome> {
        let dice = match self.state.phase() {
            Phase::Rolled(v) => v,
            Phase::Idle => return Err(GameError::IllegalAction("Roll the die first".into())),
            Phase::Won => {
                return Err(GameError::IllegalAction(
                    "The game is over. Start a new game".into(),
                ))
            }
        };
        let from = self.state.position;
        let to = clamped_advance(from, dice);
        self.state.position = to;
        self.state.dice_value = 0;
        self.state.move_count = self.state.move_count.saturating_add(1);

        let mut events = vec![GameEvent::Moved { from, to }];
        self.push_win(&mut events);
        let persisted = self.save(storage);
        Ok(Outcome::new(events, persisted))
    }

    /// Jump straight to `cell`, bypassing the die. Jumping to the current cell
    /// does nothing and reports no events.
    pub fn move_to_cell(&mut self, storage: &mut Storage, cell: u32) -> GameResult<Outcome> {
        let to = validate_cell(cell).ok_or_else(|| {
            GameError::Validation(format!(
                "Cell must be between {} and {}",
                FIRST_CELL, FINAL_CELL
            ))
        })?;
        let from = self.state.position;
        if to == from {
            return Ok(Outcome::new(Vec::new(), true));
        }
        self.state.position = to;
        self.state.move_count = self.state.move_count.saturating_add(1);

        let mut events = vec![GameEvent::Moved { from, to }];
        self.push_win(&mut events);
        let persisted = self.save(storage);
        Ok(Outcome::new(events, persisted))
    }

    /// Back to cell 1 with zeroed counters. Comments are kept.
    pub fn reset(&mut self, storage: &mut Storage) -> Outcome {
        self.state = GameState::default();
        info!("game: '{}' started a new game", self.identity_id);
        let persisted = self.save(storage);
        Outcome::new(vec![GameEvent::Reset], persisted)
    }

    pub fn add_comment(
        &mut self,
        storage: &mut Storage,
        cell: u32,
        text: &str,
    ) -> GameResult<Outcome> {
        let saved = self.comments.upsert(cell, text)?;
        let cell = saved.cell;
        debug!(
            "game: '{}' comment on {}: {}",
            self.identity_id,
            cell,
            escape_log(&saved.text)
        );
        let persisted = self.save(storage);
        Ok(Outcome::new(vec![GameEvent::CommentSaved { cell }], persisted))
    }

    /// Remove the comment on `cell`; absent comments are not an error.
    pub fn delete_comment(&mut self, storage: &mut Storage, cell: u32) -> Outcome {
        if !self.comments.delete(cell) {
            return Outcome::new(Vec::new(), true);
        }
        let persisted = self.save(storage);
        // delete() only succeeds for cells that fit in u8
        let cell = cell as u8;
        Outcome::new(vec![GameEvent::CommentDeleted { cell }], persisted)
    }

    pub fn clear_comments(&mut self, storage: &mut Storage) -> Outcome {
        self.comments.clear_all();
        let persisted = self.save(storage);
        Outcome::new(vec![GameEvent::CommentsCleared], persisted)
    }

    fn push_win(&self, events: &mut Vec<GameEvent>) {
        if self.state.is_won() {
            info!(
                "game: '{}' reached cell {} ({} rolls, {} moves)",
                self.identity_id, FINAL_CELL, self.state.roll_count, self.state.move_count
            );
            events.push(GameEvent::Won {
                rolls: self.state.roll_count,
                moves: self.state.move_count,
            });
        }
    }
}
