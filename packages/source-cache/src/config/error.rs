//! Configuration error types

use thiserror::Error;

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Unsupported version
    #[error("Unsupported configuration version {found}. Supported versions: {}", supported.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", "))]
    UnsupportedVersion { found: u32, supported: Vec<u32> },

    /// Unknown backend name
    #[error("Unknown backend '{0}'. Valid backends: memory, persistent, tiered, disabled")]
    UnknownBackend(String),

    /// Backend needs a cache directory
    #[error("Backend '{backend}' stores data on disk and requires 'cache_dir' to be set")]
    MissingCacheDir { backend: String },

    /// Backend compiled out of this build
    #[error("Backend '{backend}' is not available: built without the 'sqlite' feature")]
    BackendUnavailable { backend: String },

    /// Environment override that cannot be parsed
    #[error("Invalid value '{value}' for environment variable {var}: {reason}")]
    InvalidEnv {
        var: String,
        value: String,
        reason: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Configuration result type
pub type ConfigResult<T> = Result<T, ConfigError>;
