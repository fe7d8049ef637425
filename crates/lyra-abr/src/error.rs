use thiserror::Error;

use crate::types::PolicyKind;

/// Manifest loading and validation errors.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse manifest: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("manifest lists no bitrates")]
    NoBitrates,

    #[error("bitrates must be strictly ascending, got {0:?}")]
    UnsortedBitrates(Vec<u32>),

    #[error("segment duration must be positive, got {0} ms")]
    NonPositiveDuration(f64),

    #[error("manifest declares {declared} segments but the size table has {actual} rows")]
    SegmentCountMismatch { declared: usize, actual: usize },

    #[error("segment {segment} has {actual} sizes, expected one per bitrate ({expected})")]
    RowLength {
        segment: usize,
        expected: usize,
        actual: usize,
    },

    #[error("manifest has {actual} resolutions for {expected} bitrates")]
    ResolutionCount { expected: usize, actual: usize },
}

/// ABR engine errors.
#[derive(Debug, Error)]
pub enum AbrError {
    #[error("unknown ABR policy: {0}")]
    UnknownPolicy(String),

    #[error("invalid {policy} options: {reason}")]
    InvalidOptions { policy: PolicyKind, reason: String },

    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),
}

impl AbrError {
    pub(crate) fn invalid_options<S: Into<String>>(policy: PolicyKind, reason: S) -> Self {
        Self::InvalidOptions {
            policy,
            reason: reason.into(),
        }
    }
}

pub type ManifestResult<T> = Result<T, ManifestError>;
pub type AbrResult<T> = Result<T, AbrError>;
