//! Error types for the converter module.

use thiserror::Error;

use crate::engine::EngineError;

/// Errors returned by `ConversionManager`.
///
/// Engine failures keep the engine's own message verbatim so it can be shown
/// to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    /// Loading the engine failed.
    #[error("{0}")]
    EngineLoad(String),

    /// `convert` was called before the engine finished loading.
    #[error("Conversion engine is not ready, please wait")]
    EngineNotReady,

    /// Another conversion holds the engine.
    #[error("A conversion is already in progress")]
    ConversionInProgress,

    /// Staging, running, or collecting the conversion failed.
    #[error("{0}")]
    Conversion(String),
}

impl ConvertError {
    /// Creates a conversion error from any displayable failure.
    pub fn conversion(reason: impl std::fmt::Display) -> Self {
        Self::Conversion(reason.to_string())
    }

    /// Whether the caller can simply try again later.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Conversion(_))
    }
}

impl From<EngineError> for ConvertError {
    fn from(err: EngineError) -> Self {
        Self::conversion(err)
    }
}
