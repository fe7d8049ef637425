use std::path::PathBuf;

use thiserror::Error;

/// Player configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("event capacity must be positive")]
    ZeroEventCapacity,
}

pub type ConfigResult<T> = Result<T, ConfigError>;
