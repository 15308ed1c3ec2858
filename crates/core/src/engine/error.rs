//! Error types for the engine module.

use thiserror::Error;

/// Errors reported by an engine implementation.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine resources could not be fetched or initialized.
    #[error("{message}")]
    LoadFailed { message: String },

    /// An operation needed a loaded engine.
    #[error("Engine is not loaded")]
    NotLoaded,

    /// No working-storage entry with this name.
    #[error("No such file in working storage: {name}")]
    EntryNotFound { name: String },

    /// The name cannot be used in the flat working-storage namespace.
    #[error("Invalid working storage name: {name:?}")]
    InvalidName { name: String },

    /// The engine ran but did not produce a result.
    #[error("{reason}")]
    ExecFailed {
        reason: String,
        stderr: Option<String>,
    },

    /// Execution exceeded the configured timeout.
    #[error("Conversion timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// I/O error while talking to the engine or its storage.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Creates a new load failed error.
    pub fn load_failed(message: impl Into<String>) -> Self {
        Self::LoadFailed {
            message: message.into(),
        }
    }

    /// Creates a new exec failed error with captured engine output.
    pub fn exec_failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::ExecFailed {
            reason: reason.into(),
            stderr,
        }
    }

    /// Creates a new entry not found error.
    pub fn entry_not_found(name: impl Into<String>) -> Self {
        Self::EntryNotFound { name: name.into() }
    }

    /// Whether retrying the same operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::LoadFailed { .. } | Self::Timeout { .. } | Self::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_failed_message_is_verbatim() {
        let err = EngineError::load_failed("failed to fetch ffmpeg-core.wasm");
        assert_eq!(err.to_string(), "failed to fetch ffmpeg-core.wasm");
    }

    #[test]
    fn test_exec_failed_message_is_reason() {
        let err = EngineError::exec_failed("Invalid data found when processing input", None);
        assert_eq!(err.to_string(), "Invalid data found when processing input");
    }

    #[test]
    fn test_retryable() {
        assert!(EngineError::Timeout { timeout_secs: 5 }.is_retryable());
        assert!(EngineError::load_failed("network").is_retryable());
        assert!(!EngineError::NotLoaded.is_retryable());
        assert!(!EngineError::entry_not_found("input.mp4").is_retryable());
    }
}
