//! Trait definitions for the engine module.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::error::EngineError;
use super::types::{EngineProgress, EngineResources};

/// An embedded transcoding engine with its own working storage.
///
/// Engines are not reentrant: callers must not run two `exec` calls, or
/// interleave storage operations of two conversions, on the same instance.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Returns the name of this engine implementation.
    fn name(&self) -> &str;

    /// Fetches and initializes the engine from its resource locators.
    async fn load(&self, resources: &EngineResources) -> Result<(), EngineError>;

    /// Stores `data` in working storage under `name`, replacing any previous entry.
    async fn write_file(&self, name: &str, data: &[u8]) -> Result<(), EngineError>;

    /// Runs the engine with the given argument list.
    ///
    /// Progress events are sent on `progress_tx` without blocking; the sender
    /// is dropped when this call returns.
    async fn exec(
        &self,
        args: &[String],
        progress_tx: mpsc::Sender<EngineProgress>,
    ) -> Result<(), EngineError>;

    /// Reads the working-storage entry `name`.
    async fn read_file(&self, name: &str) -> Result<Vec<u8>, EngineError>;

    /// Removes the working-storage entry `name`.
    async fn delete_file(&self, name: &str) -> Result<(), EngineError>;
}
