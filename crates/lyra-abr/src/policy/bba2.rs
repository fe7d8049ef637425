use super::BitrateRule;
use crate::{
    manifest::Manifest,
    types::{Bba2Options, PlaybackStats},
};

/// Step-up threshold as a fraction of segment duration, buffer below
/// `reservoir + cushion`.
const STARTUP_THRESHOLD: f64 = 0.875;
/// Same, once the buffer has filled past the cushion.
const STARTUP_THRESHOLD_FULL: f64 = 0.5;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Bba2State {
    #[default]
    Startup,
    Steady,
}

/// Buffer-based adaptation with a throughput-driven startup phase.
#[derive(Clone, Debug)]
pub struct Bba2 {
    reservoir: f64,
    normal_reservoir: f64,
    cushion: f64,
    dynamic_reservoir: bool,
    reservoir_window: f64,
    reservoir_ceiling: f64,
    chunk_min: f64,
    chunk_max: f64,
    slope: f64,
    state: Bba2State,
    rate_prev: u32,
    prev_buffer: f64,
}

impl Bba2 {
    /// `options.cushion_secs` must be positive.
    #[expect(clippy::cast_precision_loss)]
    pub fn new(manifest: &Manifest, options: &Bba2Options) -> Self {
        let (min, max) = manifest.min_max_segment_size().unwrap_or_default();
        let (chunk_min, chunk_max) = (min as f64, max as f64);
        Self {
            reservoir: options.reservoir_secs,
            normal_reservoir: options.reservoir_secs,
            cushion: options.cushion_secs,
            dynamic_reservoir: options.dynamic_reservoir,
            reservoir_window: options.reservoir_window_secs,
            reservoir_ceiling: options.reservoir_ceiling_secs,
            chunk_min,
            chunk_max,
            slope: (chunk_max - chunk_min) / options.cushion_secs,
            state: Bba2State::Startup,
            rate_prev: manifest.lowest_bitrate(),
            prev_buffer: 0.0,
        }
    }

    pub fn state(&self) -> Bba2State {
        self.state
    }

    pub fn reservoir(&self) -> f64 {
        self.reservoir
    }

    pub fn cushion(&self) -> f64 {
        self.cushion
    }

    /// Target chunk size for a buffer level.
    pub fn virtual_chunk_size(&self, buffer_secs: f64) -> f64 {
        if buffer_secs < self.reservoir {
            self.chunk_min
        } else if buffer_secs > self.reservoir + self.cushion {
            self.chunk_max
        } else {
            (buffer_secs - self.reservoir) * self.slope + self.chunk_min
        }
    }

    #[expect(clippy::cast_precision_loss)]
    fn rate_from_chunk_map(&self, manifest: &Manifest, buffer_secs: f64, segment: usize) -> u32 {
        let bitrates = manifest.bitrates_kbps();
        if buffer_secs < self.reservoir {
            return manifest.lowest_bitrate();
        }
        if buffer_secs > self.reservoir + self.cushion {
            return manifest.highest_bitrate();
        }

        let sizes: Vec<f64> = manifest
            .effective_segment_sizes(segment)
            .into_iter()
            .map(|s| s as f64)
            .collect();
        let target = self.virtual_chunk_size(buffer_secs);
        let last = bitrates.len() - 1;
        let prev = manifest.representation_index(self.rate_prev).unwrap_or_default();
        let plus = (prev + 1).min(last);
        let minus = prev.saturating_sub(1);

        // At either end of the ladder there is no neighbour to move to.
        if plus > prev && target >= sizes[plus] {
            let idx = sizes.iter().rposition(|&s| s < target).unwrap_or(0);
            bitrates[idx]
        } else if minus < prev && target <= sizes[minus] {
            let idx = sizes.iter().position(|&s| s > target).unwrap_or(last);
            bitrates[idx]
        } else {
            self.rate_prev
        }
    }

    #[expect(clippy::cast_precision_loss)]
    fn startup_rate(
        &self,
        manifest: &Manifest,
        buffer_secs: f64,
        segment: usize,
        predicted_kbps: f64,
    ) -> u32 {
        if predicted_kbps <= 0.0 {
            return self.rate_prev;
        }

        let candidate = manifest
            .bitrates_kbps()
            .iter()
            .copied()
            .find(|&b| b > self.rate_prev)
            .unwrap_or_else(|| manifest.highest_bitrate());
        let idx = manifest.representation_index(candidate).unwrap_or_default();
        let size_bytes = manifest
            .effective_segment_sizes(segment)
            .get(idx)
            .copied()
            .unwrap_or_default();

        let duration = manifest.segment_duration_secs();
        let delta = duration - size_bytes as f64 * 8.0 / 1000.0 / predicted_kbps;
        let threshold = if buffer_secs >= self.reservoir + self.cushion {
            STARTUP_THRESHOLD_FULL
        } else {
            STARTUP_THRESHOLD
        };

        if delta > threshold * duration {
            candidate
        } else {
            self.rate_prev
        }
    }

    /// Re-derive the reservoir from how heavy the lowest representation is
    /// over the next window.
    #[expect(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    fn adjust_reservoir(&mut self, manifest: &Manifest, segment: usize) {
        let min_kbps = f64::from(manifest.lowest_bitrate());
        if min_kbps <= 0.0 {
            return;
        }
        let count = (self.reservoir_window / manifest.segment_duration_secs()).floor() as usize;
        let end = segment.saturating_add(count).min(manifest.total_segments());
        let real_kbits: f64 = (segment..end)
            .filter_map(|i| manifest.segment_size(i, 0))
            .map(|bytes| bytes as f64 * 8.0 / 1000.0)
            .sum();
        let expected_kbits = self.reservoir_window * min_kbps;

        let adjusted = self.normal_reservoir + (real_kbits - expected_kbits) / min_kbps;
        self.reservoir = adjusted.clamp(0.0, self.reservoir_ceiling);
        tracing::trace!(reservoir = self.reservoir, segment, "bba2 reservoir adjusted");
    }
}

impl BitrateRule for Bba2 {
    fn next_quality(&mut self, manifest: &Manifest, stats: &PlaybackStats, predicted: f64) -> u32 {
        let buffer = stats.buffer_secs;
        let segment = stats.segment_index;

        let rate = match self.state {
            Bba2State::Startup => {
                let mapped = self.rate_from_chunk_map(manifest, buffer, segment);
                let startup = self.startup_rate(manifest, buffer, segment, predicted);
                if self.prev_buffer > buffer || mapped < startup {
                    tracing::debug!(buffer, mapped, startup, "bba2 leaving startup");
                    self.state = Bba2State::Steady;
                    mapped
                } else {
                    startup
                }
            }
            Bba2State::Steady => {
                if self.dynamic_reservoir {
                    self.adjust_reservoir(manifest, segment);
                }
                self.rate_from_chunk_map(manifest, buffer, segment)
            }
        };

        self.rate_prev = rate;
        self.prev_buffer = buffer;
        rate
    }
}
