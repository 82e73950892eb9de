//! Input validation for account credentials, comment text and cell numbers.
//!
//! Username rules are fixed: 3 to 20 characters drawn from `[A-Za-z0-9_]`.
//! Lengths are counted in UTF-16 code units so that the limits line up with
//! records written by earlier browser-based versions of the game.

use crate::game::board::{FINAL_CELL, FIRST_CELL};

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 20;
pub const PASSWORD_MIN: usize = 6;

/// Username validation errors with helpful messages
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UsernameError {
    #[error("Username must be between {min} and {max} characters")]
    BadLength { min: usize, max: usize },

    #[error("Username may only contain letters, digits and underscores (found: {chars})")]
    InvalidCharacters { chars: String },
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PasswordError {
    #[error("Password must be at least {min} characters")]
    TooShort { min: usize },
}

impl From<PasswordError> for crate::error::GameError {
    fn from(e: PasswordError) -> Self {
        crate::error::GameError::Validation(e.to_string())
    }
}

fn utf16_len(s: &str) -> usize {
    s.encode_utf16().count()
}

/// Validate a username. Returns the input unchanged on success; no trimming
/// or case folding is applied, so `Alice` and `alice` are distinct accounts.
pub fn validate_username(username: &str) -> Result<&str, UsernameError> {
    let len = utf16_len(username);
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
        return Err(UsernameError::BadLength {
            min: USERNAME_MIN,
            max: USERNAME_MAX,
        });
    }

    let mut invalid: Vec<char> = username
        .chars()
        .filter(|c| !(c.is_ascii_alphanumeric() || *c == '_'))
        .collect();
    if !invalid.is_empty() {
        invalid.dedup();
        return Err(UsernameError::InvalidCharacters {
            chars: invalid.into_iter().collect(),
        });
    }
    Ok(username)
}

pub fn validate_password(password: &str) -> Result<(), PasswordError> {
    if utf16_len(password) < PASSWORD_MIN {
        return Err(PasswordError::TooShort { min: PASSWORD_MIN });
    }
    Ok(())
}

/// Trim comment text; `None` when nothing is left.
pub fn normalize_comment_text(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Check that `cell` names a board cell.
pub fn validate_cell(cell: u32) -> Option<u8> {
    if (FIRST_CELL as u32..=FINAL_CELL as u32).contains(&cell) {
        Some(cell as u8)
    } else {
        None
    }
}

/// Generate a safe filename for a storage key using percent encoding.
///
/// Keys are mostly `[A-Za-z0-9_]` already; anything else (path separators,
/// dots, non-ASCII) is escaped so a key can never leave the data directory.
pub fn safe_filename(key: &str) -> String {
    use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
    const KEY_SET: &AsciiSet = &NON_ALPHANUMERIC.remove(b'_').remove(b'-');
    utf8_percent_encode(key, KEY_SET).to_string()
}

/// Reverse of [`safe_filename`]. Returns `None` for names that do not decode
/// to valid UTF-8.
pub fn key_from_filename(name: &str) -> Option<String> {
    percent_encoding::percent_decode_str(name)
        .decode_utf8()
        .ok()
        .map(|c| c.into_owned())
}
