use super::BitrateRule;
use crate::{
    manifest::Manifest,
    types::{MpcOptions, MpcSizeModel, PlaybackStats, QoeWeights},
};

/// Planner phase. Both phases plan the same way; the flag is kept for
/// observability.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MpcMode {
    #[default]
    Startup,
    Steady,
}

/// Receding-horizon planner.
///
/// Scores every bitrate sequence over the lookahead horizon by simulating
/// buffer evolution, then commits only the first bitrate of the best one.
#[derive(Clone, Debug)]
pub struct Mpc {
    lookahead: usize,
    size_model: MpcSizeModel,
    nominal_size_multiplier: f64,
    weights: QoeWeights,
    prev_bitrate_kbps: u32,
    mode: MpcMode,
}

impl Mpc {
    pub fn new(options: &MpcOptions, weights: QoeWeights) -> Self {
        Self {
            lookahead: options.lookahead,
            size_model: options.size_model,
            nominal_size_multiplier: options.nominal_size_multiplier,
            weights,
            prev_bitrate_kbps: 0,
            mode: MpcMode::Startup,
        }
    }

    pub fn mode(&self) -> MpcMode {
        self.mode
    }

    /// Bitrate the switch penalty of the next plan is measured against.
    pub fn prev_bitrate_kbps(&self) -> u32 {
        self.prev_bitrate_kbps
    }

    /// Simulated QoE of `plan` (representation indices) from the current state.
    pub fn score(
        &self,
        manifest: &Manifest,
        plan: &[usize],
        buffer_secs: f64,
        predicted_kbps: f64,
        segment_index: usize,
    ) -> f64 {
        let bitrates = manifest.bitrates_kbps();
        let segment_secs = manifest.segment_duration_secs();
        let mut buffer = buffer_secs;
        let mut last_mbps = f64::from(self.prev_bitrate_kbps) * 0.001;
        let mut qoe = 0.0;

        for (step, &idx) in plan.iter().enumerate() {
            let kbps = f64::from(bitrates[idx]);
            let mbps = kbps * 0.001;
            let download_secs =
                self.download_secs(manifest, segment_index + step, idx, mbps, predicted_kbps);

            let rebuffer = (download_secs - buffer).max(0.0);
            buffer = (buffer - download_secs).max(0.0) + segment_secs;
            qoe += mbps
                - self.weights.lambda * (mbps - last_mbps).abs()
                - self.weights.mu * rebuffer;
            last_mbps = mbps;
        }
        qoe
    }

    #[expect(clippy::cast_precision_loss)]
    fn download_secs(
        &self,
        manifest: &Manifest,
        segment: usize,
        idx: usize,
        mbps: f64,
        predicted_kbps: f64,
    ) -> f64 {
        match self.size_model {
            // Size in kB over throughput in B/s, kept as the reference
            // planner computes it.
            MpcSizeModel::Nominal => {
                mbps * self.nominal_size_multiplier / (predicted_kbps * 125.0)
            }
            MpcSizeModel::Manifest => {
                let bytes = manifest
                    .effective_segment_sizes(segment)
                    .get(idx)
                    .copied()
                    .unwrap_or_default();
                bytes as f64 * 8.0 / 1000.0 / predicted_kbps
            }
        }
    }

    fn best_plan(
        &self,
        manifest: &Manifest,
        buffer_secs: f64,
        predicted_kbps: f64,
        segment_index: usize,
    ) -> Option<Vec<usize>> {
        let mut best: Option<(f64, Vec<usize>)> = None;
        for plan in Plans::new(manifest.bitrate_count(), self.lookahead) {
            let qoe = self.score(manifest, &plan, buffer_secs, predicted_kbps, segment_index);
            if best.as_ref().is_none_or(|(max, _)| qoe > *max) {
                best = Some((qoe, plan));
            }
        }
        best.map(|(_, plan)| plan)
    }
}

impl BitrateRule for Mpc {
    fn next_quality(&mut self, manifest: &Manifest, stats: &PlaybackStats, predicted: f64) -> u32 {
        let choice = if predicted > 0.0 {
            self.best_plan(manifest, stats.buffer_secs, predicted, stats.segment_index)
                .and_then(|plan| plan.first().copied())
                .map_or_else(|| manifest.lowest_bitrate(), |idx| manifest.bitrates_kbps()[idx])
        } else {
            manifest.lowest_bitrate()
        };

        tracing::trace!(
            mode = ?self.mode,
            predicted,
            buffer_secs = stats.buffer_secs,
            prev = self.prev_bitrate_kbps,
            choice,
            "mpc plan"
        );

        self.prev_bitrate_kbps = choice;
        self.mode = MpcMode::Steady;
        choice
    }
}

/// Every index sequence of length `len` over `0..base`, lexicographic.
struct Plans {
    base: usize,
    next: Option<Vec<usize>>,
}

impl Plans {
    fn new(base: usize, len: usize) -> Self {
        let next = (base > 0 && len > 0).then(|| vec![0; len]);
        Self { base, next }
    }
}

impl Iterator for Plans {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        let current = self.next.take()?;
        let mut following = current.clone();
        for digit in following.iter_mut().rev() {
            *digit += 1;
            if *digit < self.base {
                self.next = Some(following);
                return Some(current);
            }
            *digit = 0;
        }
        Some(current)
    }
}
