//! Error types for Lockbox

use thiserror::Error;

/// Result type alias using Lockbox's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Lockbox error types with helpful messages and suggestions
#[derive(Error, Debug)]
pub enum Error {
    // Entity errors (E001-E099)
    #[error("User '{0}' not found.")]
    UserNotFound(String),

    // Search errors (E100-E199)
    #[error("Search query failed: {0}")]
    QueryFailed(String),

    #[error("No previous search is stored for this session.")]
    NoLastSearch,

    // Auth errors (E200-E299)
    #[error("Directory service error: {0}")]
    DirectoryError(String),

    #[error("Mail delivery failed: {0}")]
    MailError(String),

    // Database errors (E400-E499)
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Input errors (E800-E899)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Generic errors
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::UserNotFound(_) => "E002",
            Self::QueryFailed(_) => "E100",
            Self::NoLastSearch => "E101",
            Self::DirectoryError(_) => "E200",
            Self::MailError(_) => "E201",
            Self::DatabaseError(_) => "E400",
            Self::InvalidInput(_) => "E800",
            Self::Io(_) => "E9999",
        }
    }

    /// Get suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::NoLastSearch => Some("lockbox search --user <LOGIN> --text <TERM>".to_string()),
            _ => None,
        }
    }
}
