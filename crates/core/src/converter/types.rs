//! Types for the converter module.

use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::engine::EngineProgress;

/// Media type tag of every conversion output.
pub const MP3_MEDIA_TYPE: &str = "audio/mpeg";

/// Where the bytes of an `InputFile` come from.
#[derive(Debug, Clone)]
enum InputSource {
    Memory(Arc<[u8]>),
    Path(PathBuf),
}

/// A file selected by the user for conversion.
///
/// Immutable once created. `media_type` is whatever the selecting surface
/// declared and may be empty or generic.
#[derive(Debug, Clone)]
pub struct InputFile {
    name: String,
    media_type: String,
    size_bytes: u64,
    source: InputSource,
}

impl InputFile {
    /// Creates an input file from bytes already in memory.
    pub fn from_bytes(
        name: impl Into<String>,
        media_type: impl Into<String>,
        data: impl Into<Arc<[u8]>>,
    ) -> Self {
        let data = data.into();
        Self {
            name: name.into(),
            media_type: media_type.into(),
            size_bytes: data.len() as u64,
            source: InputSource::Memory(data),
        }
    }

    /// Creates an input file backed by a file on disk.
    ///
    /// The size is taken from the file's metadata now; the bytes are only
    /// read when a conversion needs them.
    pub async fn from_path(
        path: impl AsRef<Path>,
        media_type: impl Into<String>,
    ) -> io::Result<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Not a regular file: {}", path.display()),
            ));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            name,
            media_type: media_type.into(),
            size_bytes: metadata.len(),
            source: InputSource::Path(path.to_path_buf()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared MIME type, possibly empty.
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Reads the file's bytes.
    pub async fn read_bytes(&self) -> io::Result<Arc<[u8]>> {
        match &self.source {
            InputSource::Memory(data) => Ok(Arc::clone(data)),
            InputSource::Path(path) => Ok(tokio::fs::read(path).await?.into()),
        }
    }
}

/// Latest progress of the running conversion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConversionProgress {
    /// Estimated completion in `[0, 1]`.
    pub ratio: f64,
    /// Media time processed so far, in seconds.
    pub time_secs: f64,
}

impl From<EngineProgress> for ConversionProgress {
    /// Clamps the engine's ratio into `[0, 1]`; NaN becomes 0.
    fn from(progress: EngineProgress) -> Self {
        let ratio = if progress.ratio.is_nan() {
            0.0
        } else {
            progress.ratio.clamp(0.0, 1.0)
        };
        Self {
            ratio,
            time_secs: progress.time_secs,
        }
    }
}

impl ConversionProgress {
    /// Completion as a whole percentage.
    pub fn percent(&self) -> u8 {
        (self.ratio * 100.0).round() as u8
    }
}

/// Lifecycle state of the engine owned by a `ConversionManager`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EngineState {
    #[default]
    Uninitialized,
    Loading,
    Ready,
    Converting,
    /// The last load attempt failed.
    Failed { message: String },
}

impl EngineState {
    /// Short name for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Converting => "converting",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Snapshot of everything a presentation layer renders.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConverterStatus {
    pub state: EngineState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<ConversionProgress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl ConverterStatus {
    pub fn is_loading(&self) -> bool {
        self.state == EngineState::Loading
    }

    pub fn is_converting(&self) -> bool {
        self.state == EngineState::Converting
    }

    pub fn is_ready(&self) -> bool {
        self.state == EngineState::Ready
    }
}

/// The MP3 produced by a successful conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionOutput {
    data: Vec<u8>,
    file_name: String,
}

impl ConversionOutput {
    pub fn new(data: Vec<u8>, file_name: impl Into<String>) -> Self {
        Self {
            data,
            file_name: file_name.into(),
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Suggested download name, `<input base name>.mp3`.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn media_type(&self) -> &'static str {
        MP3_MEDIA_TYPE
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
