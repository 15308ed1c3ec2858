//! Converter module: the MP3 conversion state machine.
//!
//! `ConversionManager` owns one `Engine`, loads it once, and runs one
//! conversion at a time with the fixed MP3 settings in `MP3_SETTINGS`.
//! Callers observe readiness, progress, and the last error through
//! `ConversionManager::subscribe`.
//!
//! # Example
//!
//! ```ignore
//! use tomp3_core::converter::{ConversionManager, InputFile};
//! use tomp3_core::engine::EngineConfig;
//! use tomp3_core::validation::validate;
//!
//! let manager = ConversionManager::from_config(&EngineConfig::default());
//! manager.load().await?;
//!
//! let file = InputFile::from_path("/path/to/holiday.mov", "video/quicktime").await?;
//! let check = validate(&file);
//! if !check.valid {
//!     eprintln!("{}", check.error.unwrap_or_default());
//!     return Ok(());
//! }
//!
//! let output = manager.convert(file).await?;
//! std::fs::write(output.file_name(), output.data())?;
//! ```

mod error;
mod manager;
mod settings;
mod types;

pub use error::ConvertError;
pub use manager::ConversionManager;
pub use settings::{
    input_storage_name, output_file_name, Mp3Settings, INPUT_STEM, MP3_SETTINGS,
    OUTPUT_STORAGE_NAME,
};
pub use types::{
    ConversionOutput, ConversionProgress, ConverterStatus, EngineState, InputFile, MP3_MEDIA_TYPE,
};
