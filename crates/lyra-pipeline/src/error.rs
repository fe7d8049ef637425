use std::time::Duration;

use lyra_abr::AbrError;
use thiserror::Error;

/// Segment fetch failures reported by a [`SegmentTransport`](crate::SegmentTransport).
#[derive(Clone, Debug, Error, PartialEq)]
pub enum TransportError {
    #[error("segment {segment} unavailable: {reason}")]
    Unavailable { segment: usize, reason: String },

    #[error("fetch of segment {segment} timed out after {elapsed:?}")]
    Timeout { segment: usize, elapsed: Duration },

    #[error("segment {segment} returned no data")]
    NoData { segment: usize },
}

impl TransportError {
    pub fn segment(&self) -> usize {
        match self {
            Self::Unavailable { segment, .. }
            | Self::Timeout { segment, .. }
            | Self::NoData { segment } => *segment,
        }
    }
}

/// Playback session errors.
///
/// Transport failures are not session errors: they end the fetch loop and
/// show up as an incomplete [`QoeReport`](crate::QoeReport).
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("ABR setup failed: {0}")]
    Abr(#[from] AbrError),

    #[error(
        "buffer capacity {capacity_secs}s cannot hold one {segment_secs}s segment"
    )]
    BufferTooSmall { capacity_secs: f64, segment_secs: f64 },

    #[error("ABR chose {bitrate_kbps} kbps for segment {segment}, not in the manifest")]
    UnknownBitrate { segment: usize, bitrate_kbps: u32 },

    #[error("pipeline task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type SessionResult<T> = Result<T, SessionError>;
