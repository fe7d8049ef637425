use std::sync::Arc;

use lyra_abr::{AbrController, Estimator, Manifest, PlaybackStats};
use lyra_events::{AbrEvent, EventBus, PipelineEvent};
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::{
    buffer::BufferModel,
    error::{SessionError, SessionResult, TransportError},
    qoe::QoeAccumulator,
    stage::{SegmentToken, StageMsg, StageTx},
    transport::SegmentTransport,
};

/// Download stage: decide, fetch, count into the buffer, hand off.
pub(crate) struct Fetcher<E: Estimator> {
    pub(crate) manifest: Arc<Manifest>,
    pub(crate) controller: AbrController<E>,
    pub(crate) transport: Arc<dyn SegmentTransport>,
    pub(crate) buffer: Arc<BufferModel>,
    pub(crate) qoe: Arc<Mutex<QoeAccumulator>>,
    pub(crate) events: EventBus,
    pub(crate) output: StageTx,
    pub(crate) initial_throughput_kbps: f64,
}

impl<E: Estimator> Fetcher<E> {
    /// Fetch every segment until done or the transport fails.
    ///
    /// `End` is sent on every exit path.
    pub(crate) async fn run(mut self) -> SessionResult<usize> {
        trace!("fetcher started");
        let result = self.fetch_all().await;
        if self.output.send(StageMsg::End).await.is_err() {
            trace!("decoder gone before end marker");
        }
        trace!(?result, "fetcher stopped");
        result
    }

    async fn fetch_all(&mut self) -> SessionResult<usize> {
        let segment_duration = self.manifest.segment_duration();
        let segment_secs = segment_duration.as_secs_f64();
        let mut last_throughput_kbps = self.initial_throughput_kbps;
        let mut fetched = 0;

        for segment_index in 0..self.manifest.total_segments() {
            let buffer_secs = self.buffer.wait_for_headroom(segment_secs).await;

            let decision = self.controller.decide(PlaybackStats {
                last_throughput_kbps,
                buffer_secs,
                segment_index,
            });
            self.events.publish(AbrEvent::Decision {
                segment_index,
                bitrate_kbps: decision.bitrate_kbps,
                predicted_kbps: decision.predicted_kbps,
                buffer_secs,
            });
            if let Some(from_kbps) = decision.previous_kbps
                && decision.changed()
            {
                self.events.publish(AbrEvent::Switched {
                    segment_index,
                    from_kbps,
                    to_kbps: decision.bitrate_kbps,
                });
            }

            let locator = self
                .manifest
                .locator(segment_index, decision.bitrate_kbps)
                .ok_or(SessionError::UnknownBitrate {
                    segment: segment_index,
                    bitrate_kbps: decision.bitrate_kbps,
                })?;

            let report = match self.transport.fetch(locator).await {
                Ok(report) if report.bytes > 0 => report,
                Ok(_) => {
                    self.fetch_failed(&TransportError::NoData {
                        segment: segment_index,
                    });
                    break;
                }
                Err(err) => {
                    self.fetch_failed(&err);
                    break;
                }
            };

            self.qoe
                .lock()
                .record_fetch(decision.bitrate_kbps, report.bytes);
            let level = self.buffer.fill(segment_secs);
            fetched += 1;

            debug!(
                segment = segment_index,
                bitrate_kbps = decision.bitrate_kbps,
                bytes = report.bytes,
                throughput_kbps = report.throughput_kbps,
                elapsed = ?report.elapsed,
                buffer_secs = level,
                "segment fetched"
            );
            self.events.publish(PipelineEvent::SegmentFetched {
                segment_index,
                bitrate_kbps: decision.bitrate_kbps,
                bytes: report.bytes,
                throughput_kbps: report.throughput_kbps,
                buffer_secs: level,
            });

            let token = SegmentToken {
                segment_index,
                bitrate_kbps: decision.bitrate_kbps,
                bytes: report.bytes,
                duration: segment_duration,
            };
            if self.output.send(StageMsg::Segment(token)).await.is_err() {
                trace!("decoder gone, fetcher stopping");
                break;
            }
            last_throughput_kbps = report.throughput_kbps;
        }

        Ok(fetched)
    }

    fn fetch_failed(&self, err: &TransportError) {
        warn!(segment = err.segment(), %err, "segment fetch failed, stopping");
        self.events.publish(PipelineEvent::FetchFailed {
            segment_index: err.segment(),
            error: err.to_string(),
        });
    }
}
