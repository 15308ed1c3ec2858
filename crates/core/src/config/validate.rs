use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Engine resource locators are not empty
/// - Engine timeout is not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let engine = &config.engine;

    if engine.core.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "engine.core cannot be empty".to_string(),
        ));
    }

    if engine.payload.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "engine.payload cannot be empty".to_string(),
        ));
    }

    if engine.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "engine.timeout_secs cannot be 0".to_string(),
        ));
    }

    Ok(())
}
