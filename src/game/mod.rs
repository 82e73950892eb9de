//! Board game core: geometry, live state, per-cell comments and the
//! controller that ties them to storage.
//!
//! - [`board`] - zig-zag cell numbering and a text rendering
//! - [`state`] - [`GameState`], [`Phase`] and the persisted record shape
//! - [`comments`] - [`CommentBook`] annotations
//! - [`controller`] - [`GameController`] operations (roll, move, jump, reset)

pub mod board;
pub mod comments;
pub mod controller;
pub mod state;

pub use comments::{Comment, CommentBook};
pub use controller::{GameController, GameEvent, Outcome};
pub use state::{GameState, Phase};
