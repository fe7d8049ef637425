//! Manifest fixtures.

use std::{path::PathBuf, time::Duration};

use lyra_abr::Manifest;
use serde_json::json;
use tempfile::TempDir;

use crate::rng::TraceRng;

/// Four-rung ladder used across the workspace tests.
pub const LADDER_KBPS: [u32; 4] = [500, 1000, 2000, 4000];

/// Every segment sized exactly `kbps * secs / 8` kilobytes.
pub fn nominal_manifest(bitrates_kbps: &[u32], segments: usize, segment_secs: u64) -> Manifest {
    let row: Vec<u64> = bitrates_kbps
        .iter()
        .map(|&kbps| u64::from(kbps) * 1000 * segment_secs / 8)
        .collect();
    Manifest::new(
        bitrates_kbps.to_vec(),
        vec![row; segments],
        Duration::from_secs(segment_secs),
    )
    .unwrap()
}

/// [`LADDER_KBPS`] with `segments` two-second segments.
pub fn ladder_manifest(segments: usize) -> Manifest {
    nominal_manifest(&LADDER_KBPS, segments, 2)
}

/// Nominal sizes scaled per segment by a factor in `[1 - spread, 1 + spread)`.
///
/// One factor per segment keeps each row ascending.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn jittered_manifest(
    rng: &mut TraceRng,
    bitrates_kbps: &[u32],
    segments: usize,
    segment_secs: u64,
    spread: f64,
) -> Manifest {
    let rows = (0..segments)
        .map(|_| {
            let factor = rng.kbps(1.0 - spread, 1.0 + spread);
            bitrates_kbps
                .iter()
                .map(|&kbps| (f64::from(kbps) * 1000.0 * segment_secs as f64 / 8.0 * factor) as u64)
                .collect()
        })
        .collect();
    Manifest::new(
        bitrates_kbps.to_vec(),
        rows,
        Duration::from_secs(segment_secs),
    )
    .unwrap()
}

/// Manifest JSON in the on-disk layout for a nominal ladder.
pub fn manifest_json(bitrates_kbps: &[u32], segments: usize, segment_secs: u64) -> String {
    let row: Vec<u64> = bitrates_kbps
        .iter()
        .map(|&kbps| u64::from(kbps) * 1000 * segment_secs / 8)
        .collect();
    json!({
        "start_number": 1,
        "total_duration": segments as u64 * segment_secs,
        "segment_duration_ms": segment_secs * 1000,
        "timescale": 1,
        "total_segments": segments,
        "bitrates_kbps": bitrates_kbps,
        "segment_size_bytes": vec![row; segments],
    })
    .to_string()
}

/// Writes `contents` under a fresh temp dir. Keep the dir alive while reading.
pub fn write_temp(name: &str, contents: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    (dir, path)
}
