use super::BitrateRule;
use crate::{
    manifest::Manifest,
    types::{BolaOptions, BolaScoreSizes, PlaybackStats},
};

/// Control parameters derived from one segment's utilities.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BolaParameters {
    pub gp: f64,
    pub vp: f64,
}

/// Lyapunov utility maximisation over buffer occupancy.
///
/// Stateless between decisions.
#[derive(Clone, Debug)]
pub struct Bola {
    min_safe_buffer: f64,
    target_buffer: f64,
    score_sizes: BolaScoreSizes,
}

impl Bola {
    /// `target_buffer_secs` must differ from `min_safe_buffer_secs`.
    pub fn new(options: &BolaOptions) -> Self {
        Self {
            min_safe_buffer: options.min_safe_buffer_secs,
            target_buffer: options.target_buffer_secs,
            score_sizes: options.score_sizes.clone(),
        }
    }

    /// `ln(size / smallest)` for sizes sorted ascending.
    pub fn utilities(sorted_sizes: &[f64]) -> Vec<f64> {
        let Some(&smallest) = sorted_sizes.first() else {
            return Vec::new();
        };
        sorted_sizes.iter().map(|s| (s / smallest).ln()).collect()
    }

    pub fn parameters(&self, utilities: &[f64]) -> Option<BolaParameters> {
        let (&u_first, &u_last) = (utilities.first()?, utilities.last()?);
        let gp = 1.0 - u_first
            + (u_last - u_first) / (self.target_buffer / self.min_safe_buffer - 1.0);
        let vp = self.min_safe_buffer / (u_first + gp - 1.0);
        Some(BolaParameters { gp, vp })
    }

    fn score_size_kb(&self, position: usize, live_bytes: f64) -> f64 {
        match &self.score_sizes {
            BolaScoreSizes::FixedTable(table) => {
                table.get(position).copied().unwrap_or(live_bytes / 1000.0)
            }
            BolaScoreSizes::LiveSegment => live_bytes / 1000.0,
        }
    }
}

impl BitrateRule for Bola {
    #[expect(clippy::cast_precision_loss)]
    fn next_quality(&mut self, manifest: &Manifest, stats: &PlaybackStats, _predicted: f64) -> u32 {
        let bitrates = manifest.bitrates_kbps();
        let live: Vec<f64> = manifest
            .effective_segment_sizes(stats.segment_index)
            .into_iter()
            .map(|s| s as f64)
            .collect();
        // Rungs ordered by this segment's size; `order[q]` is the rung scored at `q`.
        let mut order: Vec<usize> = (0..live.len()).collect();
        order.sort_by(|&a, &b| live[a].total_cmp(&live[b]));
        let sizes: Vec<f64> = order.iter().map(|&i| live[i]).collect();

        let utilities = Self::utilities(&sizes);
        let degenerate = sizes.len() < 2
            || sizes[0] <= 0.0
            || utilities.last().is_none_or(|&u| u <= 0.0);
        if degenerate {
            return manifest.lowest_bitrate();
        }
        let Some(BolaParameters { gp, vp }) = self.parameters(&utilities) else {
            return manifest.lowest_bitrate();
        };

        let mut best = 0;
        let mut best_score = f64::NEG_INFINITY;
        for (q, (&u, &size)) in utilities.iter().zip(&sizes).enumerate() {
            let score = (vp * (u + gp) - stats.buffer_secs) / self.score_size_kb(q, size);
            if score >= best_score {
                best = q;
                best_score = score;
            }
        }

        let rung = order[best];
        tracing::trace!(gp, vp, rung, best_score, buffer = stats.buffer_secs, "bola score");
        bitrates[rung]
    }
}
