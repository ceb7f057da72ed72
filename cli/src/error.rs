//! Command error types for the outward layer
//!
//! Provides structured, type-safe errors that serialize to `{"code": "...", "message": "..."}`.

use docsort_core::{RenameError, TakeError};
use serde::Serialize;

/// Errors returned by commands
///
/// Each variant serializes with a snake_case `code` field for client matching.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum CommandError {
    // Job lookup errors
    NotFound { message: String },
    NotReady { message: String },
    JobFailed { message: String },

    // Request errors
    Configuration { message: String },

    // Operation errors
    StorageError { message: String },
    InternalError { message: String },
}

impl CommandError {
    pub fn not_found() -> Self {
        Self::NotFound {
            message: "Job not found or already retrieved".to_string(),
        }
    }

    pub fn not_ready() -> Self {
        Self::NotReady {
            message: "Job is still running".to_string(),
        }
    }

    pub fn job_failed(message: impl Into<String>) -> Self {
        Self::JobFailed {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::StorageError {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }

    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration { .. } => 2,
            _ => 1,
        }
    }
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { message } => write!(f, "{}", message),
            Self::NotReady { message } => write!(f, "{}", message),
            Self::JobFailed { message } => write!(f, "{}", message),
            Self::Configuration { message } => write!(f, "{}", message),
            Self::StorageError { message } => write!(f, "{}", message),
            Self::InternalError { message } => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for CommandError {}

impl From<RenameError> for CommandError {
    fn from(err: RenameError) -> Self {
        match err {
            RenameError::Configuration(message) => Self::configuration(message),
            RenameError::Io(_) | RenameError::Archive(_) | RenameError::Csv(_) => {
                Self::storage(err.to_string())
            }
            other => Self::internal(other.to_string()),
        }
    }
}

impl From<TakeError> for CommandError {
    fn from(err: TakeError) -> Self {
        match err {
            TakeError::NotFound => Self::not_found(),
            TakeError::NotReady => Self::not_ready(),
            TakeError::Failed { message } => Self::job_failed(message),
        }
    }
}

impl From<std::io::Error> for CommandError {
    fn from(err: std::io::Error) -> Self {
        Self::storage(err.to_string())
    }
}

/// Result type alias for commands
pub type CommandResult<T> = Result<T, CommandError>;

/// Extension trait for converting Results to CommandResult
pub trait ResultExt<T> {
    fn storage_err(self) -> CommandResult<T>;
    fn config_err(self) -> CommandResult<T>;
    fn internal_err(self) -> CommandResult<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn storage_err(self) -> CommandResult<T> {
        self.map_err(|e| CommandError::storage(e.to_string()))
    }

    fn config_err(self) -> CommandResult<T> {
        self.map_err(|e| CommandError::configuration(e.to_string()))
    }

    fn internal_err(self) -> CommandResult<T> {
        self.map_err(|e| CommandError::internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_with_code() {
        let value = serde_json::to_value(CommandError::not_found()).unwrap();
        assert_eq!(value["code"], "not_found");
        assert_eq!(value["message"], "Job not found or already retrieved");
    }

    #[test]
    fn test_from_rename_error() {
        let err: CommandError = RenameError::configuration("missing column").into();
        assert!(matches!(err, CommandError::Configuration { .. }));
        assert_eq!(err.exit_code(), 2);

        let err: CommandError = RenameError::Io(std::io::Error::other("disk full")).into();
        assert!(matches!(err, CommandError::StorageError { .. }));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_from_take_error() {
        let err: CommandError = TakeError::Failed {
            message: "batch produced no documents to export".into(),
        }
        .into();
        assert_eq!(err.to_string(), "batch produced no documents to export");
        assert!(matches!(
            CommandError::from(TakeError::NotReady),
            CommandError::NotReady { .. }
        ));
    }
}
