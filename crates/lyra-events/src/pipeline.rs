use std::time::Duration;

/// Events emitted by the fetch and playback stages.
#[derive(Clone, Debug, PartialEq)]
pub enum PipelineEvent {
    /// A segment was downloaded and counted into the buffer.
    SegmentFetched {
        segment_index: usize,
        bitrate_kbps: u32,
        bytes: u64,
        throughput_kbps: f64,
        buffer_secs: f64,
    },
    /// The transport failed; no further segments will be fetched.
    FetchFailed { segment_index: usize, error: String },
    /// The first segment reached the player.
    PlaybackStarted { startup_delay: Duration },
    /// The player waited for a segment after playback had started.
    Rebuffered { segment_index: usize, stall: Duration },
    /// The player drained the last segment.
    Finished { segments_played: usize, completed: bool },
}
