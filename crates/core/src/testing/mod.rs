//! Testing utilities and mock implementations.
//!
//! `MockEngine` stands in for a real transcoding engine so the conversion
//! state machine can be exercised without ffmpeg installed.
//!
//! # Example
//!
//! ```rust,ignore
//! use tomp3_core::testing::{fixtures, MockEngine};
//!
//! let engine = MockEngine::new();
//! let manager = fixtures::manager(&engine);
//! manager.load().await?;
//! let output = manager.convert(fixtures::video_file("clip.mp4")).await?;
//! ```

mod mock_engine;

pub use mock_engine::MockEngine;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::sync::Arc;

    use super::MockEngine;
    use crate::converter::{ConversionManager, InputFile};
    use crate::engine::EngineResources;

    /// Resource locators as a browser build would use them.
    pub fn resources() -> EngineResources {
        EngineResources::new(
            "https://unpkg.com/@ffmpeg/core@0.12.6/dist/esm/ffmpeg-core.js",
            "https://unpkg.com/@ffmpeg/core@0.12.6/dist/esm/ffmpeg-core.wasm",
        )
    }

    /// A manager driving `engine`.
    pub fn manager(engine: &MockEngine) -> ConversionManager {
        ConversionManager::new(Arc::new(engine.clone()), resources())
    }

    /// A small in-memory MP4 input.
    pub fn video_file(name: &str) -> InputFile {
        InputFile::from_bytes(name, "video/mp4", b"\x00\x00\x00\x18ftypmp42".to_vec())
    }

    /// A small in-memory input with no declared type.
    pub fn untyped_file(name: &str) -> InputFile {
        InputFile::from_bytes(name, "", b"RIFF\x24\x00\x00\x00WAVE".to_vec())
    }
}
