use std::{sync::Arc, time::Duration};

use lyra_events::{EventBus, PipelineEvent};
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::{
    buffer::BufferModel,
    qoe::QoeAccumulator,
    session::PlaybackClock,
    stage::{StageMsg, StageRx},
};

/// Playback stage: measures waits, "plays" each token, drains the buffer.
pub(crate) struct Player {
    pub(crate) input: StageRx,
    pub(crate) buffer: Arc<BufferModel>,
    pub(crate) qoe: Arc<Mutex<QoeAccumulator>>,
    pub(crate) events: EventBus,
    pub(crate) clock: PlaybackClock,
    pub(crate) rebuffer_threshold: Duration,
    pub(crate) started_at: Instant,
    pub(crate) total_segments: usize,
}

impl Player {
    /// Play until `End`; returns wall-clock time since session start.
    pub(crate) async fn run(self) -> Duration {
        trace!("player started");
        let mut played = 0_usize;

        loop {
            let wait_started = Instant::now();
            let msg = self.input.recv().await;
            let waited = wait_started.elapsed();

            let token = match msg {
                Ok(StageMsg::Segment(token)) => token,
                Ok(StageMsg::End) | Err(_) => break,
            };

            if played == 0 {
                let startup_delay = self.started_at.elapsed();
                self.qoe.lock().record_startup(startup_delay);
                debug!(?startup_delay, "playback started");
                self.events
                    .publish(PipelineEvent::PlaybackStarted { startup_delay });
            } else if waited > self.rebuffer_threshold {
                let rebuffers = {
                    let mut qoe = self.qoe.lock();
                    qoe.record_rebuffer(waited);
                    qoe.rebuffer_count()
                };
                debug!(segment = token.segment_index, stall = ?waited, rebuffers, "rebuffer");
                self.events.publish(PipelineEvent::Rebuffered {
                    segment_index: token.segment_index,
                    stall: waited,
                });
            }

            if self.clock == PlaybackClock::RealTime {
                tokio::time::sleep(token.duration).await;
            }
            let level = self.buffer.drain(token.duration.as_secs_f64());
            self.qoe.lock().record_played();
            played += 1;
            trace!(segment = token.segment_index, buffer_secs = level, "played");
        }

        let elapsed = self.started_at.elapsed();
        self.events.publish(PipelineEvent::Finished {
            segments_played: played,
            completed: played == self.total_segments,
        });
        trace!(played, ?elapsed, "player stopped");
        elapsed
    }
}
