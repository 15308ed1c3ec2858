pub mod config;
pub mod converter;
pub mod engine;
pub mod testing;
pub mod validation;

pub use config::{load_config, load_config_from_str, validate_config, Config, ConfigError};
pub use converter::{
    output_file_name, ConversionManager, ConversionOutput, ConversionProgress, ConvertError,
    ConverterStatus, EngineState, InputFile,
};
pub use engine::{Engine, EngineConfig, EngineError, EngineProgress, EngineResources, FfmpegEngine};
pub use validation::{format_size, validate, validate_with, ValidationError, ValidationResult};
