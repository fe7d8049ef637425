use std::{sync::Arc, time::Duration};

use derivative::Derivative;
use derive_setters::Setters;
use lyra_abr::{AbrController, AbrOptions, Estimator, Manifest, QoeWeights, ThroughputEstimator};
use lyra_events::EventBus;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::info;

use crate::{
    buffer::BufferModel,
    decoder::run_decoder,
    error::{SessionError, SessionResult},
    fetcher::Fetcher,
    player::Player,
    qoe::{QoeAccumulator, QoeReport},
    stage::stage_channel,
    transport::SegmentTransport,
};

/// How the player spends a segment's media time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlaybackClock {
    /// Sleep for the segment duration (on the tokio clock).
    #[default]
    RealTime,
    /// Drain immediately.
    Instant,
}

#[derive(Clone, Copy, Debug, Derivative, PartialEq, Setters, Serialize, Deserialize)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[serde(default)]
pub struct SessionOptions {
    /// Total buffer capacity. Default: 60 s.
    #[derivative(Default(value = "60.0"))]
    pub buffer_capacity_secs: f64,
    /// Player waits longer than this count as rebuffers. Default: 1 ms.
    #[derivative(Default(value = "1"))]
    pub rebuffer_threshold_ms: u64,
    pub clock: PlaybackClock,
    /// Throughput fed to the first decision, usually measured on the
    /// manifest download. Default: 0 (unknown).
    pub initial_throughput_kbps: f64,
}

impl SessionOptions {
    pub fn rebuffer_threshold(&self) -> Duration {
        Duration::from_millis(self.rebuffer_threshold_ms)
    }
}

/// One playback of one manifest.
///
/// Runs the fetcher, decoder and player as tokio tasks linked by unbounded
/// FIFO queues, then reduces the shared totals to a [`QoeReport`].
pub struct PlaybackSession<E: Estimator = ThroughputEstimator> {
    manifest: Arc<Manifest>,
    controller: AbrController<E>,
    transport: Arc<dyn SegmentTransport>,
    options: SessionOptions,
    weights: QoeWeights,
    events: EventBus,
}

impl PlaybackSession<ThroughputEstimator> {
    /// Build the ABR controller from `abr` and validate the session.
    ///
    /// # Errors
    ///
    /// [`SessionError::Abr`] if the policy rejects its options, otherwise
    /// as [`PlaybackSession::with_controller`].
    pub fn new(
        manifest: Arc<Manifest>,
        abr: &AbrOptions,
        options: SessionOptions,
        transport: Arc<dyn SegmentTransport>,
    ) -> SessionResult<Self> {
        let controller = AbrController::new(Arc::clone(&manifest), abr)?;
        Self::with_controller(controller, abr.qoe, options, transport)
    }
}

impl<E: Estimator + Send + 'static> PlaybackSession<E> {
    /// # Errors
    ///
    /// Returns [`SessionError::BufferTooSmall`] if the buffer cannot hold
    /// one segment.
    pub fn with_controller(
        controller: AbrController<E>,
        weights: QoeWeights,
        options: SessionOptions,
        transport: Arc<dyn SegmentTransport>,
    ) -> SessionResult<Self> {
        let manifest = Arc::clone(controller.manifest());
        let segment_secs = manifest.segment_duration_secs();
        if options.buffer_capacity_secs.is_nan() || options.buffer_capacity_secs < segment_secs {
            return Err(SessionError::BufferTooSmall {
                capacity_secs: options.buffer_capacity_secs,
                segment_secs,
            });
        }
        Ok(Self {
            manifest,
            controller,
            transport,
            options,
            weights,
            events: EventBus::default(),
        })
    }

    /// Publish on `events` instead of a private bus.
    #[must_use]
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn manifest(&self) -> &Arc<Manifest> {
        &self.manifest
    }

    /// Run to completion.
    ///
    /// A transport failure ends the session early with an incomplete report;
    /// it is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnknownBitrate`] if the controller picks a
    /// bitrate missing from the manifest, or [`SessionError::Task`] if a
    /// stage panics.
    pub async fn run(self) -> SessionResult<QoeReport> {
        let Self {
            manifest,
            controller,
            transport,
            options,
            weights,
            events,
        } = self;

        let started_at = Instant::now();
        let total_segments = manifest.total_segments();
        let buffer = Arc::new(BufferModel::new(options.buffer_capacity_secs));
        let qoe = Arc::new(Mutex::new(QoeAccumulator::new()));
        let (fetch_tx, decode_rx) = stage_channel();
        let (decode_tx, play_rx) = stage_channel();

        info!(
            policy = %controller.policy_kind(),
            total_segments,
            capacity_secs = options.buffer_capacity_secs,
            "playback session starting"
        );

        let fetcher = tokio::spawn(
            Fetcher {
                manifest: Arc::clone(&manifest),
                controller,
                transport,
                buffer: Arc::clone(&buffer),
                qoe: Arc::clone(&qoe),
                events: events.clone(),
                output: fetch_tx,
                initial_throughput_kbps: options.initial_throughput_kbps,
            }
            .run(),
        );
        let decoder = tokio::spawn(run_decoder(decode_rx, decode_tx));
        let player = tokio::spawn(
            Player {
                input: play_rx,
                buffer: Arc::clone(&buffer),
                qoe: Arc::clone(&qoe),
                events,
                clock: options.clock,
                rebuffer_threshold: options.rebuffer_threshold(),
                started_at,
                total_segments,
            }
            .run(),
        );

        let fetched = fetcher.await?;
        decoder.await?;
        let total_time_played = player.await?;
        let fetched = fetched?;

        let report = qoe.lock().report(weights, total_time_played, total_segments);
        info!(
            fetched,
            rebuffer_count = report.rebuffer_count,
            avg_bitrate_kbps = report.avg_bitrate_kbps,
            qoe_score = report.qoe_score,
            high_water_secs = buffer.high_water_secs(),
            completed = report.completed,
            "playback session finished"
        );
        Ok(report)
    }
}
