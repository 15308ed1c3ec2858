//! Types shared across engine implementations.

use serde::{Deserialize, Serialize};

/// Locators for the two resources an engine needs before it can run.
///
/// `core` points at the engine's code module and `payload` at its binary
/// payload. How they are interpreted is up to the engine implementation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineResources {
    pub core: String,
    pub payload: String,
}

impl EngineResources {
    pub fn new(core: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            core: core.into(),
            payload: payload.into(),
        }
    }
}

/// A raw progress event as emitted by the engine.
///
/// Engines are not required to keep `ratio` inside `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineProgress {
    /// Estimated completion fraction.
    pub ratio: f64,
    /// Media time processed so far, in seconds.
    pub time_secs: f64,
}

/// Whether `name` is usable as a working-storage entry name.
///
/// Working storage is flat: names must be non-empty and must not contain path
/// separators or refer to the current/parent directory.
pub fn is_valid_storage_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}
