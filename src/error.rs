use thiserror::Error;

/// Errors surfaced by game, session and storage operations.
///
/// None of these escape [`crate::app::App::dispatch`]; the dispatcher turns
/// them into a [`crate::app::Report`] with `success = false`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    /// Bad username/password shape, empty comment text, duplicate username,
    /// out-of-range cell.
    #[error("{0}")]
    Validation(String),

    /// Unknown username on login.
    #[error("{0}")]
    NotFound(String),

    /// Wrong password.
    #[error("{0}")]
    Auth(String),

    /// Underlying store inaccessible or full.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Command not allowed in the current game phase (e.g. move without a roll).
    #[error("{0}")]
    IllegalAction(String),
}

impl GameError {
    /// Short machine-friendly kind label, used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            GameError::Validation(_) => "validation",
            GameError::NotFound(_) => "not_found",
            GameError::Auth(_) => "auth",
            GameError::StorageUnavailable(_) => "storage_unavailable",
            GameError::IllegalAction(_) => "illegal_action",
        }
    }
}

impl From<crate::validation::UsernameError> for GameError {
    fn from(e: crate::validation::UsernameError) -> Self {
        GameError::Validation(e.to_string())
    }
}

impl From<crate::storage::StoreError> for GameError {
    fn from(e: crate::storage::StoreError) -> Self {
        GameError::StorageUnavailable(e.to_string())
    }
}

pub type GameResult<T> = Result<T, GameError>;
