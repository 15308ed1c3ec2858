//! Conversion manager implementation.
//!
//! Owns the single engine instance and drives it through:
//! - Load: `Uninitialized | Failed -> Loading -> Ready | Failed`
//! - Convert: `Ready -> Converting -> Ready`, whatever the outcome
//!
//! The state lives in a `watch` channel so the check-and-transition is atomic
//! and every change is published to subscribers.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::engine::{Engine, EngineConfig, EngineError, EngineResources, FfmpegEngine};

use super::error::ConvertError;
use super::settings::{input_storage_name, output_file_name, MP3_SETTINGS, OUTPUT_STORAGE_NAME};
use super::types::{ConversionOutput, ConversionProgress, ConverterStatus, EngineState, InputFile};

/// Buffer size for engine progress events
const PROGRESS_BUFFER_SIZE: usize = 64;

struct Inner {
    engine: Arc<dyn Engine>,
    resources: EngineResources,
    status: watch::Sender<ConverterStatus>,
}

/// Handle to the conversion engine and its state machine.
///
/// Cheaply cloneable; all clones share one engine and one state.
#[derive(Clone)]
pub struct ConversionManager {
    inner: Arc<Inner>,
}

impl ConversionManager {
    /// Create a manager for `engine`, loading it from `resources` on demand.
    pub fn new(engine: Arc<dyn Engine>, resources: EngineResources) -> Self {
        let (status, _) = watch::channel(ConverterStatus::default());
        Self {
            inner: Arc::new(Inner {
                engine,
                resources,
                status,
            }),
        }
    }

    /// Create a manager backed by an `FfmpegEngine`.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            Arc::new(FfmpegEngine::new(config.clone())),
            config.resources(),
        )
    }

    /// Current status snapshot.
    pub fn status(&self) -> ConverterStatus {
        self.inner.status.borrow().clone()
    }

    /// Current engine state.
    pub fn state(&self) -> EngineState {
        self.inner.status.borrow().state.clone()
    }

    pub fn is_ready(&self) -> bool {
        self.inner.status.borrow().is_ready()
    }

    /// Subscribe to status changes. Only the latest snapshot is kept.
    pub fn subscribe(&self) -> watch::Receiver<ConverterStatus> {
        self.inner.status.subscribe()
    }

    /// Load the engine.
    ///
    /// The engine is loaded at most once: calls while loaded return `Ok`
    /// immediately, and calls during a load wait for that load's outcome.
    /// After a failed load, the next call starts a fresh attempt.
    pub async fn load(&self) -> Result<(), ConvertError> {
        let mut start = false;
        self.inner.status.send_if_modified(|status| match status.state {
            EngineState::Uninitialized | EngineState::Failed { .. } => {
                status.state = EngineState::Loading;
                status.last_error = None;
                start = true;
                true
            }
            _ => false,
        });

        if start {
            // Detached so a dropped caller cannot leave the state stuck in Loading
            let inner = Arc::clone(&self.inner);
            let task = tokio::spawn(async move { inner.run_load().await });
            if let Err(e) = task.await {
                error!("Engine load task failed: {}", e);
                self.inner.finish_load(Err(e.to_string()));
            }
        }

        self.wait_for_load().await
    }

    async fn wait_for_load(&self) -> Result<(), ConvertError> {
        let mut rx = self.inner.status.subscribe();
        let state = match rx
            .wait_for(|status| status.state != EngineState::Loading)
            .await
        {
            Ok(status) => status.state.clone(),
            Err(e) => return Err(ConvertError::EngineLoad(e.to_string())),
        };

        match state {
            EngineState::Failed { message } => Err(ConvertError::EngineLoad(message)),
            _ => Ok(()),
        }
    }

    /// Convert `file` to MP3.
    ///
    /// `file` must already have passed validation. Fails fast with
    /// `EngineNotReady` or `ConversionInProgress` without touching the
    /// engine. The conversion runs on its own task: dropping the returned
    /// future discards the result but lets the engine finish.
    pub async fn convert(&self, file: InputFile) -> Result<ConversionOutput, ConvertError> {
        let mut rejection = None;
        let mut state = "";
        self.inner.status.send_modify(|status| match status.state {
            EngineState::Ready => {
                status.state = EngineState::Converting;
                status.progress = None;
                status.last_error = None;
            }
            EngineState::Converting => {
                let err = ConvertError::ConversionInProgress;
                state = status.state.as_str();
                status.last_error = Some(err.to_string());
                rejection = Some(err);
            }
            _ => {
                let err = ConvertError::EngineNotReady;
                state = status.state.as_str();
                status.last_error = Some(err.to_string());
                rejection = Some(err);
            }
        });

        if let Some(err) = rejection {
            warn!(file = %file.name(), state, "Conversion rejected: {}", err);
            return Err(err);
        }

        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move { inner.run_conversion(file).await });
        match task.await {
            Ok(result) => result,
            Err(e) => {
                error!("Conversion task failed: {}", e);
                let err = ConvertError::conversion(e);
                // The guard has already settled the state during unwinding
                self.inner.status.send_modify(|status| {
                    status.last_error = Some(err.to_string());
                });
                Err(err)
            }
        }
    }
}

impl Inner {
    async fn run_load(&self) {
        info!(
            engine = self.engine.name(),
            state = EngineState::Loading.as_str(),
            core = %self.resources.core,
            payload = %self.resources.payload,
            "Loading conversion engine"
        );
        let start = Instant::now();

        match self.engine.load(&self.resources).await {
            Ok(()) => {
                info!(
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Conversion engine ready"
                );
                self.finish_load(Ok(()));
            }
            Err(e) => {
                error!("Failed to load conversion engine: {}", e);
                self.finish_load(Err(e.to_string()));
            }
        }
    }

    fn finish_load(&self, result: Result<(), String>) {
        self.status.send_if_modified(|status| {
            if status.state != EngineState::Loading {
                return false;
            }
            match &result {
                Ok(()) => {
                    status.state = EngineState::Ready;
                    status.last_error = None;
                }
                Err(message) => {
                    status.state = EngineState::Failed {
                        message: message.clone(),
                    };
                    status.last_error = Some(message.clone());
                }
            }
            true
        });
    }

    async fn run_conversion(&self, file: InputFile) -> Result<ConversionOutput, ConvertError> {
        let mut guard = ConvertingGuard {
            status: &self.status,
            error: None,
        };

        let input_name = input_storage_name(file.name());
        info!(
            file = %file.name(),
            size_bytes = file.size_bytes(),
            storage_name = %input_name,
            "Starting MP3 conversion"
        );
        let start = Instant::now();

        let result = self.transcode(&file, &input_name).await;

        // Best-effort on every path, so repeated failures do not leak entries
        self.remove_entry(&input_name).await;
        self.remove_entry(OUTPUT_STORAGE_NAME).await;

        match result {
            Ok(data) => {
                let output = ConversionOutput::new(data, output_file_name(file.name()));
                info!(
                    file = %file.name(),
                    output = %output.file_name(),
                    output_bytes = output.len(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    "MP3 conversion completed"
                );
                Ok(output)
            }
            Err(e) => {
                error!(file = %file.name(), "MP3 conversion failed: {}", e);
                guard.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Stage the input, run the engine, and collect the MP3 bytes.
    async fn transcode(&self, file: &InputFile, input_name: &str) -> Result<Vec<u8>, ConvertError> {
        let data = file.read_bytes().await.map_err(ConvertError::conversion)?;
        self.engine.write_file(input_name, &data).await?;
        drop(data);

        let args = MP3_SETTINGS.args(input_name, OUTPUT_STORAGE_NAME);
        let (progress_tx, mut progress_rx) = mpsc::channel(PROGRESS_BUFFER_SIZE);

        let exec = self.engine.exec(&args, progress_tx);
        tokio::pin!(exec);
        let exec_result = loop {
            tokio::select! {
                result = &mut exec => break result,
                Some(progress) = progress_rx.recv() => self.publish_progress(progress.into()),
            }
        };
        while let Ok(progress) = progress_rx.try_recv() {
            self.publish_progress(progress.into());
        }
        exec_result?;

        Ok(self.engine.read_file(OUTPUT_STORAGE_NAME).await?)
    }

    fn publish_progress(&self, progress: ConversionProgress) {
        self.status.send_if_modified(|status| {
            if status.state != EngineState::Converting {
                return false;
            }
            status.progress = Some(progress);
            true
        });
    }

    async fn remove_entry(&self, name: &str) {
        match self.engine.delete_file(name).await {
            Ok(()) => {}
            Err(EngineError::EntryNotFound { .. }) => {
                debug!(entry = name, "Working storage entry already absent");
            }
            Err(e) => warn!(entry = name, "Failed to clean up working storage: {}", e),
        }
    }
}

/// Returns the state to `Ready` when the conversion settles, even on panic.
struct ConvertingGuard<'a> {
    status: &'a watch::Sender<ConverterStatus>,
    error: Option<String>,
}

impl Drop for ConvertingGuard<'_> {
    fn drop(&mut self) {
        let error = self.error.take();
        self.status.send_modify(|status| {
            if status.state == EngineState::Converting {
                status.state = EngineState::Ready;
            }
            status.progress = None;
            status.last_error = error;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineProgress;
    use crate::testing::MockEngine;
    use std::time::Duration;

    fn manager(engine: &MockEngine) -> ConversionManager {
        ConversionManager::new(
            Arc::new(engine.clone()),
            EngineResources::new("ffmpeg-core.js", "ffmpeg-core.wasm"),
        )
    }

    fn mp4(name: &str) -> InputFile {
        InputFile::from_bytes(name, "video/mp4", b"dummy content".to_vec())
    }

    #[tokio::test]
    async fn test_initial_status() {
        let engine = MockEngine::new();
        let manager = manager(&engine);

        let status = manager.status();
        assert_eq!(status.state, EngineState::Uninitialized);
        assert!(status.progress.is_none());
        assert!(status.last_error.is_none());
        assert!(!manager.is_ready());
    }

    #[tokio::test]
    async fn test_load_then_convert() {
        let engine = MockEngine::new();
        engine.set_output(b"ID3mp3data".to_vec()).await;
        let manager = manager(&engine);

        manager.load().await.unwrap();
        assert_eq!(manager.state(), EngineState::Ready);

        let output = manager.convert(mp4("holiday.mp4")).await.unwrap();
        assert_eq!(output.data(), b"ID3mp3data");
        assert_eq!(output.file_name(), "holiday.mp3");
        assert_eq!(output.media_type(), "audio/mpeg");
        assert_eq!(manager.state(), EngineState::Ready);
    }

    #[tokio::test]
    async fn test_engine_receives_fixed_arguments() {
        let engine = MockEngine::new();
        let manager = manager(&engine);
        manager.load().await.unwrap();

        manager.convert(mp4("clip.MKV")).await.unwrap();

        let calls = engine.exec_calls().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0],
            vec!["-i", "input.MKV", "-vn", "-ar", "44100", "-ac", "2", "-b:a", "192k", "output.mp3"]
        );
        assert_eq!(
            engine.loaded_resources().await,
            Some(EngineResources::new("ffmpeg-core.js", "ffmpeg-core.wasm"))
        );
    }

    #[tokio::test]
    async fn test_load_is_idempotent() {
        let engine = MockEngine::new();
        let manager = manager(&engine);

        manager.load().await.unwrap();
        manager.load().await.unwrap();
        manager.load().await.unwrap();

        assert_eq!(engine.load_count(), 1);
    }

    #[tokio::test]
    async fn test_convert_before_load_is_rejected() {
        let engine = MockEngine::new();
        let manager = manager(&engine);

        let err = manager.convert(mp4("clip.mp4")).await.unwrap_err();
        assert_eq!(err, ConvertError::EngineNotReady);
        assert_eq!(engine.write_count(), 0);
        assert_eq!(manager.state(), EngineState::Uninitialized);
        assert_eq!(
            manager.status().last_error.as_deref(),
            Some("Conversion engine is not ready, please wait")
        );
    }

    #[tokio::test]
    async fn test_progress_is_published_and_cleared() {
        let engine = MockEngine::new();
        engine
            .set_progress_script(vec![
                EngineProgress {
                    ratio: 0.25,
                    time_secs: 1.0,
                },
                EngineProgress {
                    ratio: 1.4,
                    time_secs: 4.0,
                },
            ])
            .await;
        engine.set_exec_duration(Duration::from_millis(200)).await;
        let manager = manager(&engine);
        manager.load().await.unwrap();

        let mut rx = manager.subscribe();
        let convert = tokio::spawn({
            let manager = manager.clone();
            async move { manager.convert(mp4("clip.mp4")).await }
        });

        let progress = rx
            .wait_for(|s| s.progress.map(|p| p.time_secs) == Some(4.0))
            .await
            .unwrap()
            .progress
            .unwrap();
        // clamped into [0, 1]
        assert_eq!(progress.ratio, 1.0);

        convert.await.unwrap().unwrap();
        assert!(manager.status().progress.is_none());
    }

    #[tokio::test]
    async fn test_failure_records_error() {
        let engine = MockEngine::new();
        let manager = manager(&engine);
        manager.load().await.unwrap();

        engine
            .set_next_exec_error(EngineError::exec_failed("Conversion failed", None))
            .await;
        let err = manager.convert(mp4("clip.mp4")).await.unwrap_err();

        assert_eq!(err, ConvertError::Conversion("Conversion failed".to_string()));
        let status = manager.status();
        assert_eq!(status.state, EngineState::Ready);
        assert_eq!(status.last_error.as_deref(), Some("Conversion failed"));

        // next conversion clears the error
        manager.convert(mp4("clip.mp4")).await.unwrap();
        assert!(manager.status().last_error.is_none());
    }
}
