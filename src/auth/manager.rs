use chrono::Utc;
use log::{debug, info, warn};

use super::account::{password_checksum, Account};
use super::launch::LaunchFlags;
use super::session::{Session, GUEST_ID};
use crate::error::{GameError, GameResult};
use crate::logutil::escape_log;
use crate::storage::{keys, Storage};
use crate::validation::{validate_password, validate_username};

// Authentication failures go to the dedicated security log target.
macro_rules! sec_log {
    ($($arg:tt)*) => { log::warn!(target: "security", $($arg)*); };
}

pub const DEMO_USERNAME: &str = "test";
pub const DEMO_PASSWORD: &str = "test123";
pub const DEMO_EMAIL: &str = "test@example.com";

/// Account list plus the active session.
///
/// Holds no storage handle; every operation that changes persisted state
/// takes `&mut Storage` and writes through immediately. Write failures are
/// logged by the storage layer and do not fail the operation.
#[derive(Debug, Default)]
pub struct SessionManager {
    accounts: Vec<Account>,
    current: Option<Session>,
}

impl SessionManager {
    /// Read `users` and `currentUser`. Either may be missing or malformed; both
    /// fall back to empty.
    pub fn load(storage: &Storage) -> Self {
        let accounts: Vec<Account> = storage.load_json(keys::USERS).unwrap_or_default();
        let current: Option<Session> = storage.load_json(keys::CURRENT_USER);
        debug!(
            "auth: {} account(s) loaded, session: {}",
            accounts.len(),
            current
                .as_ref()
                .map(|s| escape_log(&s.username))
                .unwrap_or_else(|| "none".to_string())
        );
        SessionManager { accounts, current }
    }

    /// Create the demo account when no accounts exist. Returns whether it was
    /// created.
    pub fn seed_demo_account(&mut self, storage: &mut Storage) -> bool {
        if !self.accounts.is_empty() {
            return false;
        }
        let mut demo = Account::new(
            DEMO_USERNAME,
            DEMO_PASSWORD,
            Some(DEMO_EMAIL.to_string()),
            Utc::now(),
        );
        demo.last_login = None;
        self.accounts.push(demo);
        self.save_accounts(storage);
        info!("auth: seeded demo account '{}'", DEMO_USERNAME);
        true
    }

    pub fn register(
        &mut self,
        storage: &mut Storage,
        username: &str,
        password: &str,
        email: Option<&str>,
    ) -> GameResult<Session> {
        let username = validate_username(username)?;
        validate_password(password)?;
        if self.find_account(username).is_some() {
            return Err(GameError::Validation(format!(
                "User '{}' already exists",
                username
            )));
        }

        let email = email
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_string);
        let account = Account::new(username, password, email, Utc::now());
        let session = Session::for_account(&account);
        self.accounts.push(account);
        self.save_accounts(storage);
        self.set_session(storage, session.clone());
        info!("auth: registered '{}'", escape_log(username));
        Ok(session)
    }

    /// Log in. `guest` or an empty username always yields the guest session.
    pub fn login(
        &mut self,
        storage: &mut Storage,
        username: &str,
        password: &str,
    ) -> GameResult<Session> {
        if username.is_empty() || username == GUEST_ID {
            return Ok(self.enter_as_guest(storage));
        }

        let Some(idx) = self.accounts.iter().position(|a| a.username == username) else {
            sec_log!("login failed: unknown user '{}'", escape_log(username));
            return Err(GameError::NotFound("User not found".to_string()));
        };
        if !self.accounts[idx].password_matches(password) {
            sec_log!("login failed: wrong password for '{}'", escape_log(username));
            return Err(GameError::Auth("Wrong password".to_string()));
        }

        self.accounts[idx].last_login = Some(Utc::now());
        let session = Session::for_account(&self.accounts[idx]);
        self.save_accounts(storage);
        self.set_session(storage, session.clone());
        info!("auth: '{}' logged in", escape_log(username));
        Ok(session)
    }

    pub fn enter_as_guest(&mut self, storage: &mut Storage) -> Session {
        let session = Session::guest();
        self.set_session(storage, session.clone());
        info!("auth: guest session started");
        session
    }

    /// Clear the session. Returns whether one was active.
    pub fn logout(&mut self, storage: &mut Storage) -> bool {
        let had = self.current.take();
        storage.remove(keys::CURRENT_USER);
        if let Some(s) = &had {
            info!("auth: '{}' logged out", escape_log(&s.username));
        }
        had.is_some()
    }

    /// Replace the stored checksum after verifying the current password.
    /// The session and game records are untouched.
    pub fn change_password(
        &mut self,
        storage: &mut Storage,
        username: &str,
        current: &str,
        new_password: &str,
    ) -> GameResult<()> {
        let Some(idx) = self.accounts.iter().position(|a| a.username == username) else {
            return Err(GameError::NotFound("User not found".to_string()));
        };
        if !self.accounts[idx].password_matches(current) {
            sec_log!("password change refused for '{}'", escape_log(username));
            return Err(GameError::Auth("Wrong password".to_string()));
        }
        validate_password(new_password)?;
        self.accounts[idx].password_checksum = password_checksum(new_password);
        self.save_accounts(storage);
        info!("auth: password changed for '{}'", escape_log(username));
        Ok(())
    }

    /// Apply launch flags in order: guest first, then logout.
    pub fn apply_launch_flags(&mut self, storage: &mut Storage, flags: LaunchFlags) {
        if flags.guest {
            self.enter_as_guest(storage);
        }
        if flags.logout {
            self.logout(storage);
        }
    }

    pub fn current_session(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    pub fn is_guest(&self) -> bool {
        self.current.as_ref().map(Session::is_guest).unwrap_or(false)
    }

    /// Identity whose game records are in use. Without a session, play falls
    /// back to the shared guest slot.
    pub fn identity_id(&self) -> &str {
        self.current
            .as_ref()
            .map(|s| s.id.as_str())
            .unwrap_or(GUEST_ID)
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn find_account(&self, username: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.username == username)
    }

    fn set_session(&mut self, storage: &mut Storage, session: Session) {
        if !storage.save_json(keys::CURRENT_USER, &session) {
            warn!("auth: session for '{}' kept in memory only", escape_log(&session.username));
        }
        self.current = Some(session);
    }

    fn save_accounts(&self, storage: &mut Storage) {
        if !storage.save_json(keys::USERS, &self.accounts) {
            warn!("auth: account list kept in memory only");
        }
    }
}
