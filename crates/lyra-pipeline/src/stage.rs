use std::time::Duration;

/// One fetched segment travelling fetcher → decoder → player.
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentToken {
    pub segment_index: usize,
    pub bitrate_kbps: u32,
    pub bytes: u64,
    /// Media time the segment adds to the buffer.
    pub duration: Duration,
}

/// Hand-off queue item. `End` is always the last message on a queue.
#[derive(Clone, Debug, PartialEq)]
pub enum StageMsg {
    Segment(SegmentToken),
    End,
}

pub(crate) type StageTx = kanal::AsyncSender<StageMsg>;
pub(crate) type StageRx = kanal::AsyncReceiver<StageMsg>;

pub(crate) fn stage_channel() -> (StageTx, StageRx) {
    kanal::unbounded_async()
}
