//! Configuration for the engine module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::types::EngineResources;

/// Configuration for the embedded transcoding engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Locator of the engine's code module (the ffmpeg executable).
    #[serde(default = "default_core")]
    pub core: String,

    /// Locator of the engine's binary payload (the ffprobe executable).
    #[serde(default = "default_payload")]
    pub payload: String,

    /// Root directory under which working storage is created.
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// Engine log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Timeout for a single engine execution in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_core() -> String {
    "ffmpeg".to_string()
}

fn default_payload() -> String {
    "ffprobe".to_string()
}

fn default_work_dir() -> PathBuf {
    std::env::temp_dir().join("tomp3-engine")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout() -> u64 {
    3600 // 1 hour
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            core: default_core(),
            payload: default_payload(),
            work_dir: default_work_dir(),
            log_level: default_log_level(),
            timeout_secs: default_timeout(),
        }
    }
}

impl EngineConfig {
    /// Creates a new config with custom resource locators.
    pub fn with_resources(core: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            core: core.into(),
            payload: payload.into(),
            ..Default::default()
        }
    }

    /// Sets the working-storage root.
    pub fn with_work_dir(mut self, work_dir: PathBuf) -> Self {
        self.work_dir = work_dir;
        self
    }

    /// Sets the timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// The resource locators handed to `Engine::load`.
    pub fn resources(&self) -> EngineResources {
        EngineResources::new(self.core.clone(), self.payload.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.core, "ffmpeg");
        assert_eq!(config.payload, "ffprobe");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.timeout_secs, 3600);
    }

    #[test]
    fn test_config_builder() {
        let config = EngineConfig::with_resources("/usr/local/bin/ffmpeg", "/usr/local/bin/ffprobe")
            .with_work_dir(PathBuf::from("/tmp/test"))
            .with_timeout(7200);

        assert_eq!(config.core, "/usr/local/bin/ffmpeg");
        assert_eq!(config.work_dir, PathBuf::from("/tmp/test"));
        assert_eq!(config.timeout_secs, 7200);
    }

    #[test]
    fn test_resources() {
        let config = EngineConfig::with_resources("core.js", "core.wasm");
        assert_eq!(
            config.resources(),
            EngineResources::new("core.js", "core.wasm")
        );
    }
}
