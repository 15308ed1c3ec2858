//! Mock engine for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};

use crate::engine::{is_valid_storage_name, Engine, EngineError, EngineProgress, EngineResources};

/// Bytes written as the output entry unless configured otherwise.
const DEFAULT_OUTPUT: &[u8] = b"ID3\x04\x00\x00\x00\x00\x00\x00mock-mp3-frames";

/// Mock implementation of the Engine trait.
///
/// Provides controllable behavior for testing:
/// - In-memory working storage that can be inspected
/// - Load/write/exec counters and recorded exec arguments
/// - Simulated load failures and per-operation errors
/// - Scripted progress events and simulated durations
///
/// Clones share all state.
///
/// # Example
///
/// ```rust,ignore
/// use tomp3_core::testing::MockEngine;
///
/// let engine = MockEngine::new();
/// engine.set_exec_duration(Duration::from_millis(50)).await;
/// engine.set_progress_script(vec![EngineProgress { ratio: 0.5, time_secs: 1.0 }]).await;
///
/// let manager = ConversionManager::new(Arc::new(engine.clone()), resources);
/// manager.load().await?;
/// manager.convert(file).await?;
///
/// assert_eq!(engine.load_count(), 1);
/// assert!(engine.stored_names().await.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct MockEngine {
    /// Working storage entries.
    storage: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    /// Resources of the last successful load.
    loaded: Arc<RwLock<Option<EngineResources>>>,
    /// Number of `load` calls that reached the engine.
    load_count: Arc<AtomicUsize>,
    /// Number of `write_file` calls.
    write_count: Arc<AtomicUsize>,
    /// Arguments of every `exec` call.
    exec_calls: Arc<RwLock<Vec<Vec<String>>>>,
    /// If set, every load fails with this message.
    load_error: Arc<RwLock<Option<String>>>,
    /// If set, the next exec fails with this error.
    next_exec_error: Arc<RwLock<Option<EngineError>>>,
    /// If set, the next exec panics with this message.
    next_exec_panic: Arc<RwLock<Option<String>>>,
    /// If set, the next write fails with this error.
    next_write_error: Arc<RwLock<Option<EngineError>>>,
    /// If set, the next read fails with this error.
    next_read_error: Arc<RwLock<Option<EngineError>>>,
    /// Simulated load duration in milliseconds.
    load_duration_ms: Arc<RwLock<u64>>,
    /// Simulated exec duration in milliseconds.
    exec_duration_ms: Arc<RwLock<u64>>,
    /// Progress events emitted at the start of each exec.
    progress_script: Arc<RwLock<Vec<EngineProgress>>>,
    /// Bytes written to the output entry on a successful exec.
    output: Arc<RwLock<Vec<u8>>>,
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEngine {
    /// Create a new mock engine.
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(HashMap::new())),
            loaded: Arc::new(RwLock::new(None)),
            load_count: Arc::new(AtomicUsize::new(0)),
            write_count: Arc::new(AtomicUsize::new(0)),
            exec_calls: Arc::new(RwLock::new(Vec::new())),
            load_error: Arc::new(RwLock::new(None)),
            next_exec_error: Arc::new(RwLock::new(None)),
            next_exec_panic: Arc::new(RwLock::new(None)),
            next_write_error: Arc::new(RwLock::new(None)),
            next_read_error: Arc::new(RwLock::new(None)),
            load_duration_ms: Arc::new(RwLock::new(0)),
            exec_duration_ms: Arc::new(RwLock::new(0)),
            progress_script: Arc::new(RwLock::new(Vec::new())),
            output: Arc::new(RwLock::new(DEFAULT_OUTPUT.to_vec())),
        }
    }

    /// Number of load attempts that reached the engine.
    pub fn load_count(&self) -> usize {
        self.load_count.load(Ordering::SeqCst)
    }

    /// Number of write_file calls.
    pub fn write_count(&self) -> usize {
        self.write_count.load(Ordering::SeqCst)
    }

    /// Arguments of every exec call, in order.
    pub async fn exec_calls(&self) -> Vec<Vec<String>> {
        self.exec_calls.read().await.clone()
    }

    /// Resources passed to the last successful load.
    pub async fn loaded_resources(&self) -> Option<EngineResources> {
        self.loaded.read().await.clone()
    }

    /// Names currently present in working storage, sorted.
    pub async fn stored_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.storage.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Make every subsequent load fail with `message`.
    pub async fn set_load_error(&self, message: impl Into<String>) {
        *self.load_error.write().await = Some(message.into());
    }

    /// Let loads succeed again.
    pub async fn clear_load_error(&self) {
        *self.load_error.write().await = None;
    }

    /// Configure the next exec to fail with the given error.
    pub async fn set_next_exec_error(&self, error: EngineError) {
        *self.next_exec_error.write().await = Some(error);
    }

    /// Configure the next exec to panic, as a crashing engine would.
    pub async fn set_next_exec_panic(&self, message: impl Into<String>) {
        *self.next_exec_panic.write().await = Some(message.into());
    }

    /// Configure the next write to fail with the given error.
    pub async fn set_next_write_error(&self, error: EngineError) {
        *self.next_write_error.write().await = Some(error);
    }

    /// Configure the next read to fail with the given error.
    pub async fn set_next_read_error(&self, error: EngineError) {
        *self.next_read_error.write().await = Some(error);
    }

    /// Set the simulated load duration.
    pub async fn set_load_duration(&self, duration: Duration) {
        *self.load_duration_ms.write().await = duration.as_millis() as u64;
    }

    /// Set the simulated exec duration.
    pub async fn set_exec_duration(&self, duration: Duration) {
        *self.exec_duration_ms.write().await = duration.as_millis() as u64;
    }

    /// Set the progress events emitted by each exec.
    pub async fn set_progress_script(&self, events: Vec<EngineProgress>) {
        *self.progress_script.write().await = events;
    }

    /// Set the bytes produced by a successful exec.
    pub async fn set_output(&self, data: Vec<u8>) {
        *self.output.write().await = data;
    }

    async fn ensure_loaded(&self) -> Result<(), EngineError> {
        if self.loaded.read().await.is_some() {
            Ok(())
        } else {
            Err(EngineError::NotLoaded)
        }
    }

    fn check_name(name: &str) -> Result<(), EngineError> {
        if is_valid_storage_name(name) {
            Ok(())
        } else {
            Err(EngineError::InvalidName {
                name: name.to_string(),
            })
        }
    }

    async fn sleep_for(duration_ms: &RwLock<u64>) {
        let ms = *duration_ms.read().await;
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }
}

#[async_trait]
impl Engine for MockEngine {
    fn name(&self) -> &str {
        "mock"
    }

    async fn load(&self, resources: &EngineResources) -> Result<(), EngineError> {
        self.load_count.fetch_add(1, Ordering::SeqCst);
        Self::sleep_for(&self.load_duration_ms).await;

        if let Some(message) = self.load_error.read().await.clone() {
            return Err(EngineError::load_failed(message));
        }

        *self.loaded.write().await = Some(resources.clone());
        Ok(())
    }

    async fn write_file(&self, name: &str, data: &[u8]) -> Result<(), EngineError> {
        self.write_count.fetch_add(1, Ordering::SeqCst);
        self.ensure_loaded().await?;
        Self::check_name(name)?;

        if let Some(err) = self.next_write_error.write().await.take() {
            return Err(err);
        }

        self.storage
            .write()
            .await
            .insert(name.to_string(), data.to_vec());
        Ok(())
    }

    async fn exec(
        &self,
        args: &[String],
        progress_tx: mpsc::Sender<EngineProgress>,
    ) -> Result<(), EngineError> {
        self.exec_calls.write().await.push(args.to_vec());
        self.ensure_loaded().await?;

        // Like ffmpeg, fail when the input entry is missing
        let input = args
            .iter()
            .position(|arg| arg == "-i")
            .and_then(|idx| args.get(idx + 1))
            .ok_or_else(|| EngineError::exec_failed("No input specified", None))?;
        if !self.storage.read().await.contains_key(input) {
            return Err(EngineError::exec_failed(
                format!("{}: No such file or directory", input),
                None,
            ));
        }

        let script = self.progress_script.read().await.clone();
        for progress in script {
            // Non-blocking send
            let _ = progress_tx.try_send(progress);
        }

        Self::sleep_for(&self.exec_duration_ms).await;

        if let Some(message) = self.next_exec_panic.write().await.take() {
            panic!("{}", message);
        }

        if let Some(err) = self.next_exec_error.write().await.take() {
            return Err(err);
        }

        let output_name = args
            .last()
            .ok_or_else(|| EngineError::exec_failed("No output specified", None))?;
        Self::check_name(output_name)?;
        let output = self.output.read().await.clone();
        self.storage
            .write()
            .await
            .insert(output_name.clone(), output);
        Ok(())
    }

    async fn read_file(&self, name: &str) -> Result<Vec<u8>, EngineError> {
        self.ensure_loaded().await?;
        Self::check_name(name)?;

        if let Some(err) = self.next_read_error.write().await.take() {
            return Err(err);
        }

        self.storage
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::entry_not_found(name))
    }

    async fn delete_file(&self, name: &str) -> Result<(), EngineError> {
        self.ensure_loaded().await?;
        Self::check_name(name)?;

        self.storage
            .write()
            .await
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| EngineError::entry_not_found(name))
    }
}
