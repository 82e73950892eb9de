//! Application context and command dispatch.
//!
//! [`App`] owns the configuration, the storage facade, the session manager and
//! the game controller for the active identity. Front ends build a
//! [`Command`], call [`App::dispatch`] and render from the returned [`Report`]
//! plus [`App::render`]. No error crosses `dispatch`; failures come back as a
//! report with `success == false`.

pub mod command;

use chrono::Utc;
use log::{debug, info, warn};

use crate::auth::{LaunchFlags, Session, SessionManager};
use crate::config::Config;
use crate::error::{GameError, GameResult};
use crate::game::board::{render_board, FINAL_CELL};
use crate::game::{GameController, GameEvent, Outcome, Phase};
use crate::storage::retention::{purge_stale, HousekeepingStats, RetentionPolicy};
use crate::storage::transfer::{self, ExportBundle, ImportSummary, StorageStats};
use crate::storage::Storage;

pub use command::{Command, CommandParser, Input, HELP};

/// What a front end needs to show after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub success: bool,
    pub message: String,
    pub events: Vec<GameEvent>,
    /// False when the change could not be written to durable storage.
    pub persisted: bool,
}

impl Report {
    fn ok(message: impl Into<String>, outcome: Outcome) -> Self {
        Report {
            success: true,
            message: message.into(),
            events: outcome.events,
            persisted: outcome.persisted,
        }
    }

    fn plain(message: impl Into<String>) -> Self {
        Report {
            success: true,
            message: message.into(),
            events: Vec::new(),
            persisted: true,
        }
    }

    fn failed(err: &GameError) -> Self {
        Report {
            success: false,
            message: err.to_string(),
            events: Vec::new(),
            persisted: true,
        }
    }
}

pub struct App {
    config: Config,
    storage: Storage,
    sessions: SessionManager,
    game: GameController,
}

impl App {
    /// Open storage from `config` and restore the last session.
    pub fn start(config: Config) -> Self {
        Self::start_with_flags(config, LaunchFlags::default())
    }

    pub fn start_with_flags(config: Config, flags: LaunchFlags) -> Self {
        let storage = Storage::open_or_memory(&config.storage);
        Self::with_storage(config, storage, flags)
    }

    /// Startup sequence over an already opened store: housekeeping, account
    /// load, demo seeding, launch flags, then the game of the active identity.
    pub fn with_storage(config: Config, mut storage: Storage, flags: LaunchFlags) -> Self {
        let policy = RetentionPolicy {
            max_age_days: config.storage.retention_days,
        };
        purge_stale(&mut storage, &policy, Utc::now());

        let mut sessions = SessionManager::load(&storage);
        if config.auth.seed_demo_account {
            sessions.seed_demo_account(&mut storage);
        }
        sessions.apply_launch_flags(&mut storage, flags);

        let game = GameController::load(&storage, sessions.identity_id());
        info!(
            "{} ready ({} storage{})",
            config.game.title,
            storage.backend_name(),
            if storage.is_degraded() { ", memory-only" } else { "" }
        );
        App {
            config,
            storage,
            sessions,
            game,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn game(&self) -> &GameController {
        &self.game
    }

    pub fn current_session(&self) -> Option<&Session> {
        self.sessions.current_session()
    }

    pub fn dispatch(&mut self, command: Command) -> Report {
        debug!("dispatch: {:?}", redact(&command));
        match self.execute(command) {
            Ok(report) => {
                if !report.persisted {
                    warn!("dispatch: change kept in memory only");
                }
                report
            }
            Err(e) => {
                debug!("dispatch: rejected ({}): {}", e.kind(), e);
                Report::failed(&e)
            }
        }
    }

    fn execute(&mut self, command: Command) -> GameResult<Report> {
        let storage = &mut self.storage;
        match command {
            Command::Roll => {
                let out = self.game.roll(storage)?;
                let msg = match out.events.first() {
                    Some(GameEvent::Rolled { value, target }) => {
                        format!("You rolled {}. Move to cell {}", value, target)
                    }
                    _ => "Rolled".to_string(),
                };
                Ok(Report::ok(msg, out))
            }
            Command::Move => {
                let out = self.game.move_token(storage)?;
                Ok(Report::ok(describe_moves(&out), out))
            }
            Command::MoveToCell(cell) => {
                let out = self.game.move_to_cell(storage, cell)?;
                let msg = if out.events.is_empty() {
                    format!("Already on cell {}", self.game.state().position)
                } else {
                    describe_moves(&out)
                };
                Ok(Report::ok(msg, out))
            }
            Command::Reset => {
                let out = self.game.reset(storage);
                Ok(Report::ok("New game started", out))
            }
            Command::AddComment { cell, text } => {
                let out = self.game.add_comment(storage, cell, &text)?;
                Ok(Report::ok(format!("Comment saved on cell {}", cell), out))
            }
            Command::DeleteComment(cell) => {
                let out = self.game.delete_comment(storage, cell);
                let msg = if out.events.is_empty() {
                    format!("No comment on cell {}", cell)
                } else {
                    format!("Comment on cell {} removed", cell)
                };
                Ok(Report::ok(msg, out))
            }
            Command::ClearComments => {
                let out = self.game.clear_comments(storage);
                Ok(Report::ok("All comments removed", out))
            }
            Command::Save => {
                let persisted = self.game.save(storage);
                let msg = if persisted {
                    "Game saved"
                } else {
                    "Game kept in memory only; storage is unavailable"
                };
                Ok(Report::ok(msg, Outcome { events: vec![GameEvent::Saved], persisted }))
            }
            Command::Login { username, password } => {
                let session = self.sessions.login(storage, &username, &password)?;
                self.switch_identity();
                Ok(Report::plain(format!("Welcome, {}!", session.username)))
            }
            Command::Register {
                username,
                password,
                email,
            } => {
                let session =
                    self.sessions
                        .register(storage, &username, &password, email.as_deref())?;
                self.switch_identity();
                Ok(Report::plain(format!("Account created. Welcome, {}!", session.username)))
            }
            Command::EnterGuest => {
                self.sessions.enter_as_guest(storage);
                self.switch_identity();
                Ok(Report::plain(self.config.game.guest_notice.clone()))
            }
            Command::Logout => {
                let had = self.sessions.logout(storage);
                self.switch_identity();
                Ok(Report::plain(if had { "Logged out" } else { "Not logged in" }))
            }
            Command::ChangePassword {
                current,
                new_password,
            } => {
                let username = match self.sessions.current_session() {
                    Some(s) if !s.is_guest() => s.username.clone(),
                    _ => return Err(GameError::Auth("Log in to change your password".into())),
                };
                self.sessions
                    .change_password(storage, &username, &current, &new_password)?;
                Ok(Report::plain("Password changed"))
            }
        }
    }

    /// Load the game of whoever is now active.
    fn switch_identity(&mut self) {
        let id = self.sessions.identity_id();
        if id != self.game.identity_id() {
            self.game = GameController::load(&self.storage, id);
        }
    }

    pub fn housekeep(&mut self) -> HousekeepingStats {
        let policy = RetentionPolicy {
            max_age_days: self.config.storage.retention_days,
        };
        let stats = purge_stale(&mut self.storage, &policy, Utc::now());
        // The active game may have been purged
        self.game = GameController::load(&self.storage, self.sessions.identity_id());
        stats
    }

    pub fn export_current(&self) -> ExportBundle {
        transfer::export_identity(&self.storage, self.sessions.identity_id(), Utc::now())
    }

    pub fn import_current(&mut self, bundle: ExportBundle) -> GameResult<ImportSummary> {
        let id = self.sessions.identity_id().to_string();
        let summary = transfer::import_identity(&mut self.storage, &id, bundle, Utc::now())?;
        self.game = GameController::load(&self.storage, &id);
        Ok(summary)
    }

    pub fn clear_current(&mut self) -> bool {
        let id = self.sessions.identity_id().to_string();
        let ok = transfer::clear_identity(&mut self.storage, &id);
        self.game = GameController::new(&id);
        ok
    }

    pub fn stats(&self) -> StorageStats {
        transfer::stats(&self.storage)
    }

    /// Text board plus a status line.
    pub fn render(&self) -> String {
        let state = self.game.state();
        let comments = self.game.comments();
        let board = render_board(state.position, |cell| comments.contains(cell));
        let hint = match self.game.phase() {
            Phase::Idle => "roll the die".to_string(),
            Phase::Rolled(v) => format!("rolled {}, type 'move'", v),
            Phase::Won => format!("finished on {}! type 'reset' to play again", FINAL_CELL),
        };
        format!(
            "{}\n{}\nCell {} | rolls {} | moves {} | {}",
            self.config.game.title,
            board,
            state.position,
            state.roll_count,
            state.move_count,
            hint
        )
    }

    pub fn prompt(&self) -> String {
        let name = self
            .sessions
            .current_session()
            .map(|s| s.username.as_str())
            .unwrap_or("guest");
        format!("[{}@{}]> ", name, self.game.state().position)
    }
}

fn describe_moves(out: &Outcome) -> String {
    let mut parts = Vec::new();
    for event in &out.events {
        match event {
            GameEvent::Moved { from, to } => parts.push(format!("Moved from {} to {}", from, to)),
            GameEvent::Won { rolls, moves } => parts.push(format!(
                "You reached cell {}! {} rolls, {} moves",
                FINAL_CELL, rolls, moves
            )),
            _ => {}
        }
    }
    parts.join(". ")
}

/// Debug form of a command with passwords blanked.
fn redact(command: &Command) -> Command {
    match command {
        Command::Login { username, .. } => Command::Login {
            username: username.clone(),
            password: "***".into(),
        },
        Command::Register {
            username, email, ..
        } => Command::Register {
            username: username.clone(),
            password: "***".into(),
            email: email.clone(),
        },
        Command::ChangePassword { .. } => Command::ChangePassword {
            current: "***".into(),
            new_password: "***".into(),
        },
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        App::with_storage(Config::default(), Storage::memory(), LaunchFlags::default())
    }

    #[test]
    fn game_without_session_uses_guest_slot() {
        let mut app = app();
        assert!(app.current_session().is_none());
        let r = app.dispatch(Command::MoveToCell(10));
        assert!(r.success);
        assert!(app.storage().get_raw("game_guest").is_some());
    }

    #[test]
    fn errors_become_failed_reports() {
        let mut app = app();
        let r = app.dispatch(Command::Move);
        assert!(!r.success);
        assert!(r.events.is_empty());
        let r = app.dispatch(Command::MoveToCell(0));
        assert!(!r.success);
        let r = app.dispatch(Command::ChangePassword {
            current: "a".into(),
            new_password: "bbbbbb".into(),
        });
        assert!(!r.success);
    }

    #[test]
    fn login_switches_game() {
        let mut app = app();
        app.dispatch(Command::MoveToCell(30));
        let r = app.dispatch(Command::Login {
            username: "test".into(),
            password: "test123".into(),
        });
        assert!(r.success, "{}", r.message);
        assert_eq!(app.game().state().position, 1);
        app.dispatch(Command::Logout);
        assert_eq!(app.game().state().position, 30);
    }

    #[test]
    fn render_marks_token_and_comments() {
        let mut app = app();
        app.dispatch(Command::AddComment {
            cell: 5,
            text: "hi".into(),
        });
        let text = app.render();
        assert!(text.contains("[  1]"));
        assert!(text.contains("   5 *"));
        assert!(app.prompt().starts_with("[guest@1]"));
    }

    #[test]
    fn redacts_passwords() {
        let shown = format!(
            "{:?}",
            redact(&Command::Login {
                username: "u".into(),
                password: "hunter2".into()
            })
        );
        assert!(!shown.contains("hunter2"));
    }
}
