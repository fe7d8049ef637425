//! Static description of a segmented, multi-bitrate presentation.
//!
//! The JSON layout is the one written by the manifest tooling:
//!
//! ```json
//! {
//!   "start_number": 1,
//!   "total_duration": 20,
//!   "segment_duration_ms": 2000,
//!   "timescale": 1,
//!   "total_segments": 10,
//!   "bitrates_kbps": [500, 1000, 2000, 4000],
//!   "resolutions": ["360", "480", "720", "1080"],
//!   "segment_size_bytes": [[125000, 250000, 500000, 1000000], ...]
//! }
//! ```
//!
//! Bitrates may be written as floats and the size table may be keyed
//! `frame_size_bytes`.

use std::{fs, path::Path, time::Duration};

use serde::Deserialize;

use crate::error::{ManifestError, ManifestResult};

#[derive(Debug, Deserialize)]
struct RawManifest {
    bitrates_kbps: Vec<f64>,
    #[serde(alias = "frame_size_bytes")]
    segment_size_bytes: Vec<Vec<u64>>,
    segment_duration_ms: f64,
    #[serde(default = "default_timescale")]
    timescale: u32,
    total_segments: Option<usize>,
    total_duration: Option<f64>,
    #[serde(default)]
    resolutions: Vec<String>,
    #[serde(default)]
    start_number: u64,
}

fn default_timescale() -> u32 {
    1
}

/// Immutable manifest shared by the ABR engine and the pipeline.
///
/// Invariants (checked on construction): at least one bitrate, bitrates
/// strictly ascending, every size row has one entry per bitrate in the same
/// order, positive segment duration.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(try_from = "RawManifest")]
pub struct Manifest {
    bitrates_kbps: Vec<u32>,
    segment_size_bytes: Vec<Vec<u64>>,
    segment_duration_ms: f64,
    timescale: u32,
    total_duration: f64,
    resolutions: Vec<String>,
    start_number: u64,
}

impl TryFrom<RawManifest> for Manifest {
    type Error = ManifestError;

    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn try_from(raw: RawManifest) -> ManifestResult<Self> {
        let declared = raw.total_segments.unwrap_or(raw.segment_size_bytes.len());
        if declared != raw.segment_size_bytes.len() {
            return Err(ManifestError::SegmentCountMismatch {
                declared,
                actual: raw.segment_size_bytes.len(),
            });
        }

        let bitrates_kbps = raw
            .bitrates_kbps
            .iter()
            .map(|b| b.round().max(0.0) as u32)
            .collect();

        let mut manifest = Self::new(
            bitrates_kbps,
            raw.segment_size_bytes,
            Duration::from_secs_f64(raw.segment_duration_ms.max(0.0) / 1000.0),
        )?
        .with_resolutions(raw.resolutions)?
        .with_start_number(raw.start_number);
        manifest.timescale = raw.timescale;
        manifest.segment_duration_ms = raw.segment_duration_ms;
        if let Some(total) = raw.total_duration {
            manifest.total_duration = total;
        }
        manifest.validate_duration()?;
        Ok(manifest)
    }
}

impl Manifest {
    /// Build a manifest from a bitrate ladder and its segment size table.
    ///
    /// # Errors
    ///
    /// Returns error if the ladder is empty or not strictly ascending, a
    /// size row does not have one entry per bitrate, or the segment
    /// duration is not positive.
    pub fn new(
        bitrates_kbps: Vec<u32>,
        segment_size_bytes: Vec<Vec<u64>>,
        segment_duration: Duration,
    ) -> ManifestResult<Self> {
        if bitrates_kbps.is_empty() {
            return Err(ManifestError::NoBitrates);
        }
        if bitrates_kbps.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ManifestError::UnsortedBitrates(bitrates_kbps));
        }
        for (segment, row) in segment_size_bytes.iter().enumerate() {
            if row.len() != bitrates_kbps.len() {
                return Err(ManifestError::RowLength {
                    segment,
                    expected: bitrates_kbps.len(),
                    actual: row.len(),
                });
            }
        }

        let segment_duration_ms = segment_duration.as_secs_f64() * 1000.0;
        #[expect(clippy::cast_precision_loss)]
        let total_duration = segment_size_bytes.len() as f64 * segment_duration.as_secs_f64();

        let manifest = Self {
            bitrates_kbps,
            segment_size_bytes,
            segment_duration_ms,
            timescale: 1,
            total_duration,
            resolutions: Vec::new(),
            start_number: 0,
        };
        manifest.validate_duration()?;
        Ok(manifest)
    }

    /// Attach resolution labels, one per bitrate.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::ResolutionCount`] on a length mismatch.
    pub fn with_resolutions(mut self, resolutions: Vec<String>) -> ManifestResult<Self> {
        if !resolutions.is_empty() && resolutions.len() != self.bitrates_kbps.len() {
            return Err(ManifestError::ResolutionCount {
                expected: self.bitrates_kbps.len(),
                actual: resolutions.len(),
            });
        }
        self.resolutions = resolutions;
        Ok(self)
    }

    #[must_use]
    pub fn with_start_number(mut self, start_number: u64) -> Self {
        self.start_number = start_number;
        self
    }

    /// Parse and validate a manifest from JSON text.
    ///
    /// # Errors
    ///
    /// [`ManifestError::Parse`] for malformed JSON, otherwise the
    /// validation error the layout fails (see [`Manifest::new`]).
    pub fn from_json_str(json: &str) -> ManifestResult<Self> {
        let raw: RawManifest = serde_json::from_str(json)?;
        Self::try_from(raw)
    }

    /// Read, parse and validate a manifest file.
    ///
    /// # Errors
    ///
    /// [`ManifestError::Io`] if the file cannot be read, otherwise as
    /// [`Manifest::from_json_str`].
    pub fn from_path<P: AsRef<Path>>(path: P) -> ManifestResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    fn validate_duration(&self) -> ManifestResult<()> {
        if self.segment_duration_ms.is_finite() && self.segment_duration_ms > 0.0 {
            Ok(())
        } else {
            Err(ManifestError::NonPositiveDuration(self.segment_duration_ms))
        }
    }

    pub fn bitrates_kbps(&self) -> &[u32] {
        &self.bitrates_kbps
    }

    pub fn bitrate_count(&self) -> usize {
        self.bitrates_kbps.len()
    }

    pub fn lowest_bitrate(&self) -> u32 {
        self.bitrates_kbps.first().copied().unwrap_or_default()
    }

    pub fn highest_bitrate(&self) -> u32 {
        self.bitrates_kbps.last().copied().unwrap_or_default()
    }

    /// Position of `bitrate_kbps` in the ladder.
    pub fn representation_index(&self, bitrate_kbps: u32) -> Option<usize> {
        self.bitrates_kbps.iter().position(|&b| b == bitrate_kbps)
    }

    pub fn total_segments(&self) -> usize {
        self.segment_size_bytes.len()
    }

    pub fn total_duration_secs(&self) -> f64 {
        self.total_duration
    }

    pub fn segment_duration(&self) -> Duration {
        Duration::from_secs_f64(self.segment_duration_secs())
    }

    pub fn segment_duration_secs(&self) -> f64 {
        self.segment_duration_ms / 1000.0
    }

    pub fn timescale(&self) -> u32 {
        self.timescale
    }

    pub fn start_number(&self) -> u64 {
        self.start_number
    }

    pub fn resolutions(&self) -> &[String] {
        &self.resolutions
    }

    pub fn resolution(&self, representation_index: usize) -> Option<&str> {
        self.resolutions.get(representation_index).map(String::as_str)
    }

    /// Per-bitrate sizes of one segment.
    pub fn segment_sizes(&self, segment: usize) -> Option<&[u64]> {
        self.segment_size_bytes.get(segment).map(Vec::as_slice)
    }

    pub fn segment_size(&self, segment: usize, representation_index: usize) -> Option<u64> {
        self.segment_sizes(segment)?.get(representation_index).copied()
    }

    /// Sizes of `segment`, clamped to the last segment.
    ///
    /// A manifest without segments yields the nominal size of each bitrate
    /// over one segment duration.
    pub fn effective_segment_sizes(&self, segment: usize) -> Vec<u64> {
        let last = self.segment_size_bytes.len().checked_sub(1);
        match last.and_then(|last| self.segment_sizes(segment.min(last))) {
            Some(row) => row.to_vec(),
            None => self
                .bitrates_kbps
                .iter()
                .map(|&b| nominal_segment_bytes(b, self.segment_duration_secs()))
                .collect(),
        }
    }

    /// Smallest and largest size across the whole size table.
    pub fn min_max_segment_size(&self) -> Option<(u64, u64)> {
        let mut sizes = self.segment_size_bytes.iter().flatten().copied();
        let first = sizes.next()?;
        Some(sizes.fold((first, first), |(lo, hi), s| (lo.min(s), hi.max(s))))
    }

    /// Where to fetch `segment` encoded at `bitrate_kbps`.
    pub fn locator(&self, segment: usize, bitrate_kbps: u32) -> Option<SegmentLocator> {
        let representation_index = self.representation_index(bitrate_kbps)?;
        Some(SegmentLocator {
            segment_index: segment,
            segment_number: self.start_number + segment as u64,
            representation_index,
            bitrate_kbps,
            resolution: self.resolution(representation_index).map(str::to_owned),
            expected_bytes: self.segment_size(segment, representation_index),
        })
    }
}

#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn nominal_segment_bytes(bitrate_kbps: u32, duration_secs: f64) -> u64 {
    (f64::from(bitrate_kbps) * duration_secs * 125.0).round() as u64
}

/// One representation of one segment, as handed to the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SegmentLocator {
    /// Zero-based position in the presentation.
    pub segment_index: usize,
    /// `start_number + segment_index`, the number used in segment names.
    pub segment_number: u64,
    pub representation_index: usize,
    pub bitrate_kbps: u32,
    pub resolution: Option<String>,
    /// Size from the manifest, when the segment is listed.
    pub expected_bytes: Option<u64>,
}

impl SegmentLocator {
    /// Relative path in the `<quality>/segments/` layout produced by the
    /// segmenter.
    pub fn path(&self) -> String {
        let quality = self
            .resolution
            .clone()
            .unwrap_or_else(|| self.bitrate_kbps.to_string());
        format!("{quality}/segments/segment_{:03}.mp4", self.segment_number)
    }
}
