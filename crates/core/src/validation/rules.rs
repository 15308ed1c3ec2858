//! Acceptance rules for input files.

use std::fmt;

use crate::converter::InputFile;

use super::messages::{DefaultMessages, MessageKey, Messages};

/// Largest accepted input: 500 MiB.
pub const MAX_FILE_SIZE: u64 = 500 * 1024 * 1024;

pub const SUPPORTED_VIDEO_TYPES: &[&str] = &[
    "video/mp4",
    "video/x-m4v",
    "video/quicktime", // MOV
    "video/x-msvideo", // AVI
    "video/webm",
    "video/x-matroska", // MKV
    "video/x-flv",
    "video/x-ms-wmv",
    "video/mpeg",
];

pub const SUPPORTED_AUDIO_TYPES: &[&str] = &[
    "audio/mpeg", // MP3
    "audio/mp4",  // M4A
    "audio/x-m4a",
    "audio/wav",
    "audio/x-wav",
    "audio/aac",
    "audio/ogg",
    "audio/webm",
    "audio/flac",
];

pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    ".mp4", ".m4v", ".m4a", ".mov", ".avi", ".webm", ".mkv", ".flv", ".wmv", ".mpeg", ".mpg",
    ".mp3", ".wav", ".aac", ".ogg", ".flac",
];

/// Why a file was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Larger than `MAX_FILE_SIZE`.
    TooLarge { size_bytes: u64 },
    /// Zero bytes.
    Empty,
    /// Neither the declared type nor the extension is supported.
    UnsupportedFormat,
}

impl ValidationError {
    /// The message for this rejection, using `messages` for the fixed text.
    pub fn message(&self, messages: &dyn Messages) -> String {
        match self {
            Self::TooLarge { size_bytes } => format!(
                "{}: {:.2}MB",
                messages.text(MessageKey::FileTooLarge),
                *size_bytes as f64 / 1024.0 / 1024.0
            ),
            Self::Empty => messages.text(MessageKey::FileEmpty),
            Self::UnsupportedFormat => format!(
                "{}: {}",
                messages.text(MessageKey::UnsupportedFormat),
                SUPPORTED_EXTENSIONS.join(", ")
            ),
        }
    }

    pub fn key(&self) -> MessageKey {
        match self {
            Self::TooLarge { .. } => MessageKey::FileTooLarge,
            Self::Empty => MessageKey::FileEmpty,
            Self::UnsupportedFormat => MessageKey::UnsupportedFormat,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message(&DefaultMessages))
    }
}

impl std::error::Error for ValidationError {}

/// Outcome of validating one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub valid: bool,
    /// User-facing message when invalid.
    pub error: Option<String>,
    /// Classification when invalid.
    pub kind: Option<ValidationError>,
}

impl ValidationResult {
    fn accepted() -> Self {
        Self {
            valid: true,
            error: None,
            kind: None,
        }
    }

    fn rejected(kind: ValidationError, messages: &dyn Messages) -> Self {
        Self {
            valid: false,
            error: Some(kind.message(messages)),
            kind: Some(kind),
        }
    }

    /// `Ok(())` when valid, the classification otherwise.
    pub fn into_result(self) -> Result<(), ValidationError> {
        match self.kind {
            Some(kind) => Err(kind),
            None => Ok(()),
        }
    }
}

/// Whether `media_type` is in the video or audio allow-list.
pub fn is_supported_media_type(media_type: &str) -> bool {
    SUPPORTED_VIDEO_TYPES
        .iter()
        .chain(SUPPORTED_AUDIO_TYPES)
        .any(|supported| *supported == media_type)
}

/// Whether the lower-cased `file_name` ends with a supported extension.
pub fn has_supported_extension(file_name: &str) -> bool {
    let file_name = file_name.to_lowercase();
    SUPPORTED_EXTENSIONS
        .iter()
        .any(|ext| file_name.ends_with(ext))
}

fn check(file_name: &str, media_type: &str, size_bytes: u64) -> Result<(), ValidationError> {
    if size_bytes > MAX_FILE_SIZE {
        return Err(ValidationError::TooLarge { size_bytes });
    }

    if size_bytes == 0 {
        return Err(ValidationError::Empty);
    }

    if !is_supported_media_type(media_type) && !has_supported_extension(file_name) {
        return Err(ValidationError::UnsupportedFormat);
    }

    Ok(())
}

/// Validate `file` with the default English messages.
pub fn validate(file: &InputFile) -> ValidationResult {
    validate_with(file, &DefaultMessages)
}

/// Validate `file`, taking message text from `messages`.
pub fn validate_with(file: &InputFile, messages: &dyn Messages) -> ValidationResult {
    match check(file.name(), file.media_type(), file.size_bytes()) {
        Ok(()) => ValidationResult::accepted(),
        Err(kind) => ValidationResult::rejected(kind, messages),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, media_type: &str) -> InputFile {
        InputFile::from_bytes(name, media_type, b"dummy content".to_vec())
    }

    #[test]
    fn test_accepts_mp4_video() {
        let result = validate(&file("test.mp4", "video/mp4"));
        assert!(result.valid);
        assert!(result.error.is_none());
        assert!(result.kind.is_none());
    }

    #[test]
    fn test_accepts_m4a_audio() {
        let result = validate(&file("test.m4a", "audio/x-m4a"));
        assert!(result.valid);
    }

    #[test]
    fn test_extension_fallback_for_generic_type() {
        assert!(validate(&file("test.mp4", "application/octet-stream")).valid);
        assert!(validate(&file("Recording.FLAC", "")).valid);
        assert!(validate(&file("CLIP.MoV", "application/octet-stream")).valid);
    }

    #[test]
    fn test_media_type_with_atypical_extension() {
        assert!(validate(&file("download.bin", "video/webm")).valid);
        assert!(validate(&file("noextension", "audio/wav")).valid);
    }

    #[test]
    fn test_rejects_text_file() {
        let result = validate(&file("test.txt", "text/plain"));
        assert!(!result.valid);
        assert_eq!(result.kind, Some(ValidationError::UnsupportedFormat));
        let error = result.error.unwrap();
        assert!(error.contains("Unsupported file format"));
        assert!(error.ends_with(&SUPPORTED_EXTENSIONS.join(", ")));
    }

    #[test]
    fn test_rejects_empty_file() {
        let result = validate(&InputFile::from_bytes("test.mp4", "video/mp4", Vec::<u8>::new()));
        assert!(!result.valid);
        assert_eq!(result.kind, Some(ValidationError::Empty));
        assert!(result.error.unwrap().contains("File size is 0"));
    }

    #[test]
    fn test_empty_wins_over_format() {
        assert_eq!(
            check("notes.txt", "text/plain", 0),
            Err(ValidationError::Empty)
        );
    }

    #[test]
    fn test_rejects_too_large() {
        let size = 501 * 1024 * 1024;
        let err = check("large.mp4", "video/mp4", size).unwrap_err();
        assert_eq!(err, ValidationError::TooLarge { size_bytes: size });
        assert_eq!(
            err.to_string(),
            "File size exceeds limit (max 500MB), current file: 501.00MB"
        );
    }

    #[test]
    fn test_size_ceiling_is_inclusive() {
        assert!(check("max.mp4", "video/mp4", MAX_FILE_SIZE).is_ok());
        assert!(matches!(
            check("max.mp4", "video/mp4", MAX_FILE_SIZE + 1),
            Err(ValidationError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_too_large_message_precision() {
        let err = ValidationError::TooLarge {
            size_bytes: MAX_FILE_SIZE + 1536 * 1024,
        };
        assert!(err.to_string().ends_with(": 501.50MB"));
    }

    #[test]
    fn test_accepts_various_video_formats() {
        let formats = [
            ("test.avi", "video/x-msvideo"),
            ("test.mov", "video/quicktime"),
            ("test.webm", "video/webm"),
            ("test.mkv", "video/x-matroska"),
        ];

        for (name, media_type) in formats {
            assert!(validate(&file(name, media_type)).valid, "{} rejected", name);
        }
    }

    #[test]
    fn test_every_extension_is_accepted() {
        for ext in SUPPORTED_EXTENSIONS {
            let name = format!("media{}", ext);
            assert!(validate(&file(&name, "")).valid, "{} rejected", name);
        }
    }

    #[test]
    fn test_custom_messages() {
        let messages = |key: MessageKey| match key {
            MessageKey::FileEmpty => "文件大小为0".to_string(),
            other => other.default_text().to_string(),
        };
        let result = validate_with(&InputFile::from_bytes("a.mp4", "", Vec::<u8>::new()), &messages);
        assert_eq!(result.error.as_deref(), Some("文件大小为0"));
    }

    #[test]
    fn test_into_result() {
        assert!(validate(&file("a.mp3", "audio/mpeg")).into_result().is_ok());
        assert_eq!(
            validate(&file("a.doc", "application/msword")).into_result(),
            Err(ValidationError::UnsupportedFormat)
        );
    }
}
