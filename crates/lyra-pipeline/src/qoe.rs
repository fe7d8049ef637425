use std::time::Duration;

use lyra_abr::QoeWeights;
use serde::{Deserialize, Serialize};

/// Final session metrics.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QoeReport {
    pub startup_delay_secs: f64,
    pub total_time_played_secs: f64,
    pub rebuffer_time_secs: f64,
    pub rebuffer_count: usize,
    pub avg_bitrate_kbps: f64,
    pub avg_bitrate_change_kbps: f64,
    pub change_count: usize,
    pub qoe_score: f64,
    pub segments_fetched: usize,
    pub segments_played: usize,
    pub bytes_fetched: u64,
    /// Every manifest segment was fetched.
    pub completed: bool,
}

/// Running totals, written by the fetcher and the player.
#[derive(Clone, Debug, Default)]
pub struct QoeAccumulator {
    bitrate_sum_kbps: f64,
    change_sum_kbps: f64,
    change_count: usize,
    last_bitrate_kbps: Option<u32>,
    segments_fetched: usize,
    bytes_fetched: u64,
    startup_delay: Option<Duration>,
    rebuffer_time: Duration,
    rebuffer_count: usize,
    segments_played: usize,
}

impl QoeAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a fetched segment. The first segment is never a change.
    pub fn record_fetch(&mut self, bitrate_kbps: u32, bytes: u64) {
        if let Some(prev) = self.last_bitrate_kbps
            && prev != bitrate_kbps
        {
            self.change_count += 1;
            self.change_sum_kbps += f64::from(prev.abs_diff(bitrate_kbps));
        }
        self.bitrate_sum_kbps += f64::from(bitrate_kbps);
        self.last_bitrate_kbps = Some(bitrate_kbps);
        self.segments_fetched += 1;
        self.bytes_fetched += bytes;
    }

    /// Only the first call counts.
    pub fn record_startup(&mut self, delay: Duration) {
        self.startup_delay.get_or_insert(delay);
    }

    pub fn record_rebuffer(&mut self, stall: Duration) {
        self.rebuffer_time += stall;
        self.rebuffer_count += 1;
    }

    pub fn record_played(&mut self) {
        self.segments_played += 1;
    }

    pub fn rebuffer_count(&self) -> usize {
        self.rebuffer_count
    }

    /// Reduce the totals to a report.
    ///
    /// Averages divide by the segments actually fetched (and that minus one
    /// for changes), which equals the manifest count for a complete session.
    #[expect(clippy::cast_precision_loss)]
    pub fn report(
        &self,
        weights: QoeWeights,
        total_time_played: Duration,
        total_segments: usize,
    ) -> QoeReport {
        let fetched = self.segments_fetched;
        let avg_bitrate_kbps = if fetched == 0 {
            0.0
        } else {
            self.bitrate_sum_kbps / fetched as f64
        };
        let avg_bitrate_change_kbps = if fetched < 2 {
            0.0
        } else {
            self.change_sum_kbps / (fetched - 1) as f64
        };
        let startup_delay_secs = self.startup_delay.unwrap_or_default().as_secs_f64();
        let rebuffer_time_secs = self.rebuffer_time.as_secs_f64();

        let qoe_score = avg_bitrate_kbps
            - weights.lambda * avg_bitrate_change_kbps
            - weights.mu * rebuffer_time_secs
            - weights.mu * startup_delay_secs;

        QoeReport {
            startup_delay_secs,
            total_time_played_secs: total_time_played.as_secs_f64(),
            rebuffer_time_secs,
            rebuffer_count: self.rebuffer_count,
            avg_bitrate_kbps,
            avg_bitrate_change_kbps,
            change_count: self.change_count,
            qoe_score,
            segments_fetched: fetched,
            segments_played: self.segments_played,
            bytes_fetched: self.bytes_fetched,
            completed: fetched == total_segments,
        }
    }
}
