//! Embedded transcoding engine.
//!
//! The `Engine` trait is the seam between the conversion manager and whatever
//! actually decodes and encodes media. An engine owns a private, flat
//! namespace of byte entries ("working storage"): callers stage input bytes
//! under a name, execute the engine with an argument list that refers to
//! those names, then read the produced entry back and delete both.
//!
//! `FfmpegEngine` drives a native ffmpeg executable, using a per-instance
//! directory as its working storage.
//!
//! # Example
//!
//! ```ignore
//! use tomp3_core::engine::{Engine, EngineConfig, FfmpegEngine};
//!
//! let config = EngineConfig::default();
//! let engine = FfmpegEngine::new(config.clone());
//! engine.load(&config.resources()).await?;
//!
//! engine.write_file("input.wav", &bytes).await?;
//! engine.exec(&args, progress_tx).await?;
//! let mp3 = engine.read_file("output.mp3").await?;
//! ```

mod config;
mod error;
mod ffmpeg;
mod traits;
mod types;

pub use config::EngineConfig;
pub use error::EngineError;
pub use ffmpeg::FfmpegEngine;
pub use traits::Engine;
pub use types::{is_valid_storage_name, EngineProgress, EngineResources};
