//! FFmpeg-based engine implementation.

use async_trait::async_trait;
use regex_lite::Regex;
use serde::Deserialize;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::{mpsc, RwLock};
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::config::EngineConfig;
use super::error::EngineError;
use super::traits::Engine;
use super::types::{is_valid_storage_name, EngineProgress, EngineResources};

/// Log lines kept for error reporting.
const STDERR_TAIL_LINES: usize = 20;

/// Executables and storage resolved by a successful load.
#[derive(Debug, Clone)]
struct LoadedEngine {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
    storage_dir: PathBuf,
}

/// FFmpeg-based engine implementation.
///
/// The `core` resource locator names the ffmpeg executable and `payload` the
/// ffprobe executable, which is used to learn the input duration so progress
/// can be reported as a ratio. Working storage is a directory created under
/// `EngineConfig::work_dir` on load and removed when the engine is dropped.
pub struct FfmpegEngine {
    config: EngineConfig,
    loaded: RwLock<Option<LoadedEngine>>,
}

impl FfmpegEngine {
    /// Creates a new FFmpeg engine with the given configuration.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            loaded: RwLock::new(None),
        }
    }

    /// Creates an engine with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(EngineConfig::default())
    }

    /// The working-storage directory, once loaded.
    pub async fn storage_dir(&self) -> Option<PathBuf> {
        self.loaded
            .read()
            .await
            .as_ref()
            .map(|engine| engine.storage_dir.clone())
    }

    async fn loaded(&self) -> Result<LoadedEngine, EngineError> {
        self.loaded.read().await.clone().ok_or(EngineError::NotLoaded)
    }

    async fn storage_path(&self, name: &str) -> Result<PathBuf, EngineError> {
        if !is_valid_storage_name(name) {
            return Err(EngineError::InvalidName {
                name: name.to_string(),
            });
        }
        Ok(self.loaded().await?.storage_dir.join(name))
    }

    /// Runs `<path> -version` to make sure the executable is usable.
    async fn check_executable(path: &Path, role: &str) -> Result<(), EngineError> {
        let output = Command::new(path)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    EngineError::load_failed(format!(
                        "Engine {} not found at path: {}",
                        role,
                        path.display()
                    ))
                } else {
                    EngineError::load_failed(format!(
                        "Failed to start engine {} {}: {}",
                        role,
                        path.display(),
                        e
                    ))
                }
            })?;

        if !output.status.success() {
            return Err(EngineError::load_failed(format!(
                "Engine {} {} exited with code: {:?}",
                role,
                path.display(),
                output.status.code()
            )));
        }

        Ok(())
    }

    /// Prepends the global options that make ffmpeg scriptable.
    fn build_args(&self, args: &[String]) -> Vec<String> {
        let mut full_args = vec![
            "-hide_banner".to_string(),
            "-nostdin".to_string(),
            "-y".to_string(), // Overwrite output
            "-loglevel".to_string(),
            self.config.log_level.clone(),
            // Progress output for parsing
            "-progress".to_string(),
            "pipe:2".to_string(),
            "-nostats".to_string(),
        ];
        full_args.extend(args.iter().cloned());
        full_args
    }

    /// The storage entry passed with `-i`, if any.
    fn input_name(args: &[String]) -> Option<&str> {
        args.iter()
            .position(|arg| arg == "-i")
            .and_then(|idx| args.get(idx + 1))
            .map(String::as_str)
    }

    /// Asks ffprobe for the duration of `path` in seconds.
    async fn probe_duration(ffprobe: &Path, path: &Path) -> Option<f64> {
        let output = Command::new(ffprobe)
            .args(["-v", "quiet", "-print_format", "json", "-show_format"])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .await
            .ok()?;

        if !output.status.success() {
            debug!(path = %path.display(), "ffprobe could not read input duration");
            return None;
        }

        parse_probe_duration(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Extracts a positive duration from ffprobe `-show_format` JSON output.
fn parse_probe_duration(output: &str) -> Option<f64> {
    #[derive(Deserialize)]
    struct ProbeOutput {
        format: ProbeFormat,
    }

    #[derive(Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }

    let probe: ProbeOutput = serde_json::from_str(output).ok()?;
    probe
        .format
        .duration?
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d > 0.0)
}

#[derive(Debug, PartialEq)]
enum ProgressLine {
    /// End of a `-progress` block.
    Tick(EngineProgress),
    /// The final `progress=end` block.
    End(EngineProgress),
    /// Any other `key=value` line of a `-progress` block.
    Field,
    /// Regular log output.
    Log,
}

/// Turns `-progress pipe:2` output into progress events.
struct ProgressParser {
    time_regex: Option<Regex>,
    field_regex: Option<Regex>,
    duration_secs: Option<f64>,
    time_secs: f64,
}

impl ProgressParser {
    fn new(duration_secs: Option<f64>) -> Self {
        Self {
            // Both keys carry microseconds.
            time_regex: Regex::new(r"^out_time_(?:us|ms)=(\d+)$").ok(),
            field_regex: Regex::new(r"^[A-Za-z0-9_]+=\S*$").ok(),
            duration_secs,
            time_secs: 0.0,
        }
    }

    fn ratio(&self) -> f64 {
        match self.duration_secs {
            Some(duration) if duration > 0.0 => self.time_secs / duration,
            _ => 0.0,
        }
    }

    fn parse(&mut self, line: &str) -> ProgressLine {
        let line = line.trim();

        if let Some(state) = line.strip_prefix("progress=") {
            if state == "end" {
                return ProgressLine::End(EngineProgress {
                    ratio: 1.0,
                    time_secs: self.time_secs,
                });
            }
            return ProgressLine::Tick(EngineProgress {
                ratio: self.ratio(),
                time_secs: self.time_secs,
            });
        }

        if let Some(ref re) = self.time_regex {
            if let Some(caps) = re.captures(line) {
                if let Some(us) = caps.get(1).and_then(|m| m.as_str().parse::<f64>().ok()) {
                    self.time_secs = us / 1_000_000.0;
                }
                return ProgressLine::Field;
            }
        }

        match self.field_regex {
            Some(ref re) if re.is_match(line) => ProgressLine::Field,
            _ => ProgressLine::Log,
        }
    }
}

fn storage_error(e: std::io::Error, name: &str) -> EngineError {
    if e.kind() == std::io::ErrorKind::NotFound {
        EngineError::entry_not_found(name)
    } else {
        EngineError::Io(e)
    }
}

#[async_trait]
impl Engine for FfmpegEngine {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn load(&self, resources: &EngineResources) -> Result<(), EngineError> {
        let mut loaded = self.loaded.write().await;
        if loaded.is_some() {
            debug!("ffmpeg engine already loaded");
            return Ok(());
        }

        let ffmpeg = PathBuf::from(&resources.core);
        let ffprobe = PathBuf::from(&resources.payload);
        Self::check_executable(&ffmpeg, "core").await?;
        Self::check_executable(&ffprobe, "payload").await?;

        let storage_dir = self
            .config
            .work_dir
            .join(format!("session-{}", Uuid::new_v4()));
        tokio::fs::create_dir_all(&storage_dir).await.map_err(|e| {
            EngineError::load_failed(format!(
                "Failed to create working storage {}: {}",
                storage_dir.display(),
                e
            ))
        })?;

        info!(
            ffmpeg = %ffmpeg.display(),
            storage = %storage_dir.display(),
            "ffmpeg engine loaded"
        );

        *loaded = Some(LoadedEngine {
            ffmpeg,
            ffprobe,
            storage_dir,
        });
        Ok(())
    }

    async fn write_file(&self, name: &str, data: &[u8]) -> Result<(), EngineError> {
        let path = self.storage_path(name).await?;
        tokio::fs::write(&path, data).await?;
        Ok(())
    }

    async fn exec(
        &self,
        args: &[String],
        progress_tx: mpsc::Sender<EngineProgress>,
    ) -> Result<(), EngineError> {
        let engine = self.loaded().await?;

        let duration_secs = match Self::input_name(args) {
            Some(name) if is_valid_storage_name(name) => {
                Self::probe_duration(&engine.ffprobe, &engine.storage_dir.join(name)).await
            }
            _ => None,
        };

        let full_args = self.build_args(args);
        debug!(args = ?full_args, duration_secs = ?duration_secs, "Running ffmpeg");

        let mut child = Command::new(&engine.ffmpeg)
            .args(&full_args)
            .current_dir(&engine.storage_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| EngineError::exec_failed("ffmpeg stderr was not captured", None))?;
        let mut reader = BufReader::new(stderr);
        let mut parser = ProgressParser::new(duration_secs);

        let timeout_duration = Duration::from_secs(self.config.timeout_secs);
        let result = timeout(timeout_duration, async {
            let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);
            let mut buf = Vec::new();

            loop {
                buf.clear();
                if reader.read_until(b'\n', &mut buf).await? == 0 {
                    break;
                }
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end();

                match parser.parse(line) {
                    ProgressLine::Tick(progress) => {
                        // Intermediate ticks may be dropped when the buffer is full
                        let _ = progress_tx.try_send(progress);
                    }
                    ProgressLine::End(progress) => {
                        // The receiver drains while we run, so this only waits for room
                        let _ = progress_tx.send(progress).await;
                    }
                    ProgressLine::Field => {}
                    ProgressLine::Log => {
                        debug!(target: "tomp3::ffmpeg", "{}", line);
                        if tail.len() == STDERR_TAIL_LINES {
                            tail.pop_front();
                        }
                        tail.push_back(line.to_string());
                    }
                }
            }

            let status = child.wait().await?;
            Ok::<_, std::io::Error>((status, tail))
        })
        .await;

        match result {
            Ok(Ok((status, tail))) => {
                if !status.success() {
                    let reason = tail.back().cloned().unwrap_or_else(|| {
                        format!("ffmpeg exited with code: {:?}", status.code())
                    });
                    let stderr = if tail.is_empty() {
                        None
                    } else {
                        Some(Vec::from(tail).join("\n"))
                    };
                    return Err(EngineError::exec_failed(reason, stderr));
                }
                Ok(())
            }
            Ok(Err(e)) => Err(EngineError::Io(e)),
            Err(_) => {
                // Kill the process on timeout
                let _ = child.kill().await;
                Err(EngineError::Timeout {
                    timeout_secs: self.config.timeout_secs,
                })
            }
        }
    }

    async fn read_file(&self, name: &str) -> Result<Vec<u8>, EngineError> {
        let path = self.storage_path(name).await?;
        tokio::fs::read(&path).await.map_err(|e| storage_error(e, name))
    }

    async fn delete_file(&self, name: &str) -> Result<(), EngineError> {
        let path = self.storage_path(name).await?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| storage_error(e, name))
    }
}

impl Drop for FfmpegEngine {
    fn drop(&mut self) {
        if let Some(engine) = self.loaded.get_mut().take() {
            if let Err(e) = std::fs::remove_dir_all(&engine.storage_dir) {
                warn!(
                    storage = %engine.storage_dir.display(),
                    "Failed to remove engine working storage: {}",
                    e
                );
            }
        }
    }
}
