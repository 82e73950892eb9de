//! # Snakeladder - Single-Player Snakes & Ladders With Local Accounts
//!
//! A 100-cell snakes & ladders board played from the terminal. Progress,
//! per-cell comments and a light account system are kept in a local
//! key-value store so a game picks up where it was left.
//!
//! ## Features
//!
//! - **Board**: zig-zag numbered 10x10 grid, die rolls, manual jumps, win on cell 100
//! - **Comments**: free-text notes attached to any cell, kept across resets
//! - **Accounts**: register / login / guest play, each identity with its own game
//! - **Storage**: JSON files, an embedded sled tree, or memory only; falls back to
//!   memory when the disk stops accepting writes
//! - **Housekeeping**: stamped records older than the retention window are purged
//! - **Export / Import**: one JSON bundle per identity
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use snakeladder::app::{App, Command};
//! use snakeladder::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let mut app = App::start(config);
//!
//!     let report = app.dispatch(Command::Roll);
//!     println!("{}", report.message);
//!     println!("{}", app.render());
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`app`] - application context, typed commands and the line parser
//! - [`auth`] - accounts, sessions, guest identity and launch flags
//! - [`game`] - board geometry, game state, comments and the controller
//! - [`storage`] - key-value backends, retention and export/import
//! - [`config`] - TOML configuration
//! - [`validation`] - username, password, cell and filename checks
//! - [`error`] - error kinds shared across the crate
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  Terminal loop  │ ← parses lines into Commands
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │      App        │ ← dispatch, identity switching
//! └─────────────────┘
//!      │        │
//! ┌─────────┐ ┌──────────────┐
//! │ Session │ │ Game         │
//! │ Manager │ │ Controller   │
//! └─────────┘ └──────────────┘
//!      │        │
//! ┌─────────────────┐
//! │    Storage      │ ← files / sled / memory
//! └─────────────────┘
//! ```

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod game;
pub mod logutil;
pub mod storage;
pub mod validation;
