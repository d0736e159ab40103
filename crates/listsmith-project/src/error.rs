//! Error types for listsmith-project.

use listsmith_cmake::RegistryError;
use thiserror::Error;

/// Result type for listsmith-project operations.
pub type Result<T> = std::result::Result<T, ProjectError>;

/// Errors that can occur while loading settings or generating a document.
#[derive(Error, Debug)]
pub enum ProjectError {
    /// Failed to read the settings file.
    #[error("Failed to read settings file: {0}")]
    ReadConfig(#[from] std::io::Error),

    /// Failed to parse TOML settings.
    #[error("Failed to parse TOML settings: {0}")]
    ParseToml(#[from] toml::de::Error),

    /// A custom command type could not be registered.
    #[error("Invalid custom command: {0}")]
    Registry(#[from] RegistryError),

    /// Settings validation error.
    #[error("Settings validation error: {0}")]
    Validation(String),
}
