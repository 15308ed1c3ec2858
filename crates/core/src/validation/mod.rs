//! Input validation.
//!
//! Decides, before any engine work, whether a selected file may be converted:
//! size ceiling first, then empty files, then format. A file passes the
//! format check when EITHER its declared MIME type OR its extension is known,
//! because the declared type is often empty or generic for valid media.

mod messages;
mod rules;
mod size;

pub use messages::{DefaultMessages, MessageKey, Messages};
pub use rules::{
    has_supported_extension, is_supported_media_type, validate, validate_with, ValidationError,
    ValidationResult, MAX_FILE_SIZE, SUPPORTED_AUDIO_TYPES, SUPPORTED_EXTENSIONS,
    SUPPORTED_VIDEO_TYPES,
};
pub use size::format_size;
