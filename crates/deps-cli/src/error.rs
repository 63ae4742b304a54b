//! Error types for deps-cli

use std::path::PathBuf;

use deps_core::Failure;

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] deps_core::Error),

    #[error(transparent)]
    Catalog(#[from] deps_catalog::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("Configuration not found at {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid configuration at {path}: {message}")]
    InvalidConfig { path: PathBuf, message: String },

    #[error("Config file too large: {path} is {size} bytes (max {max})")]
    ConfigTooLarge { path: PathBuf, size: u64, max: u64 },

    /// A dependency request finished without its packages in place
    #[error("{0}")]
    Failed(Failure),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }

    /// The user already knows: they declined, or there was nobody to ask.
    /// The command fails without printing an error.
    pub fn is_silent(&self) -> bool {
        matches!(
            self,
            CliError::Failed(Failure::Declined | Failure::NoConfirmation)
        )
    }
}
