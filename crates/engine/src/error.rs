use std::path::PathBuf;

use thiserror::Error;

/// Result type for engine construction and configuration
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors loading or validating [`crate::EngineConfig`]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors surfaced when building an [`crate::Engine`]
///
/// Gameplay itself never errors: rejected moves are reported as
/// [`blockfall_core::Step::Rejected`].
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine must be created inside a tokio runtime")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
