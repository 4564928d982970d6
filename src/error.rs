//! Error types for screensaver coordination.

use thiserror::Error;

/// Primary error type for the background engine.
#[derive(Error, Debug)]
pub enum PssError {
    // Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Storage quota exceeded writing '{key}': need {needed} bytes, {available} available")]
    QuotaExceeded {
        key: String,
        needed: usize,
        available: usize,
    },

    #[error("Setting '{key}' has an unexpected value: {reason}")]
    ValueParse { key: String, reason: String },

    #[error("Unknown setting: {key}")]
    UnknownSetting { key: String },

    // Photo source errors
    #[error("Photo fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Photo source reported an error: {0}")]
    SourceError(String),

    #[error("Unknown gallery: {0}")]
    UnknownGallery(String),

    // Window / display errors
    #[error("Window operation failed: {0}")]
    Window(String),

    // General errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl PssError {
    /// Returns true if the error is recoverable by the user.
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::QuotaExceeded { .. }
                | Self::ValueParse { .. }
                | Self::UnknownSetting { .. }
                | Self::UnknownGallery(_)
        )
    }

    /// Returns a suggestion for how to fix the error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::QuotaExceeded { .. } => Some("Disable some photo sources to free storage"),
            Self::ValueParse { .. } => Some("Run: pss init --restore"),
            Self::UnknownSetting { .. } => Some("Run: pss status to list known settings"),
            Self::UnknownGallery(_) => Some("Use one of: popular, editors, fresh_yesterday"),
            Self::Fetch { .. } => Some("Check your network connection and try again"),
            _ => None,
        }
    }

    /// Returns true if this error came from exceeding storage capacity.
    pub const fn is_quota(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. })
    }
}

/// Convenience type alias for Results using PssError.
pub type Result<T> = std::result::Result<T, PssError>;

/// Extension trait for adding context to errors.
pub trait ResultExt<T> {
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T, E: std::error::Error> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| PssError::Other(format!("{}: {e}", f().into())))
    }
}

impl From<rusqlite::Error> for PssError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Storage(e.to_string())
    }
}
