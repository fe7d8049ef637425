use super::BitrateRule;
use crate::{manifest::Manifest, types::PlaybackStats};

/// Highest bitrate strictly below the last observed throughput.
///
/// Falls back to the lowest bitrate when throughput is unknown or below
/// the bottom of the ladder.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThroughputRule;

impl BitrateRule for ThroughputRule {
    fn next_quality(&mut self, manifest: &Manifest, stats: &PlaybackStats, _predicted: f64) -> u32 {
        let throughput = stats.last_throughput_kbps;
        manifest
            .bitrates_kbps()
            .iter()
            .rev()
            .copied()
            .find(|&b| f64::from(b) < throughput)
            .unwrap_or_else(|| manifest.lowest_bitrate())
    }
}
