//! Error types for CLI operations.

use contracts::ContractError;
use rss_sensor::SensorError;
use sinks::SinkError;
use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Configuration parsing or validation error
    #[error("Invalid configuration: {0}")]
    Config(#[from] ContractError),

    /// The sensor refused to start
    #[error("RSS sensor failed to start: {0}")]
    Sensor(#[from] SensorError),

    /// A configured sink could not be created
    #[error("Sink setup failed: {0}")]
    Sink(#[from] SinkError),

    /// Graceful shutdown error
    #[error("Error during shutdown: {message}")]
    Shutdown { message: String },
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn shutdown(message: impl Into<String>) -> Self {
        Self::Shutdown {
            message: message.into(),
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Load a blueprint, reporting a missing file distinctly
pub fn load_blueprint(path: &std::path::Path) -> Result<contracts::RssSensorBlueprint> {
    if !path.exists() {
        return Err(CliError::config_not_found(path.display().to_string()));
    }
    Ok(config_loader::ConfigLoader::load_from_path(path)?)
}
