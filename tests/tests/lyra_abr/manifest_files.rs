use std::sync::Arc;

use lyra_abr::{AbrController, AbrOptions, Manifest, ManifestError, PlaybackStats, PolicyKind};
use lyra_test_utils::{LADDER_KBPS, ladder_manifest, manifest_json, write_temp};
use rstest::rstest;

const TOOLING_MANIFEST: &str = r#"{
    "start_number": 1,
    "total_duration": 6,
    "segment_duration_ms": 2000,
    "timescale": 1,
    "total_segments": 3,
    "bitrates_kbps": [300.0, 750.4, 1200.0],
    "resolutions": ["240", "480", "720"],
    "frame_size_bytes": [
        [70000, 180000, 310000],
        [80000, 190000, 290000],
        [75000, 185000, 300000]
    ]
}"#;

#[test]
fn tooling_manifest_loads_from_disk() {
    let (_dir, path) = write_temp("manifest.json", TOOLING_MANIFEST);
    let manifest = Manifest::from_path(&path).unwrap();

    assert_eq!(manifest.bitrates_kbps(), &[300, 750, 1200]);
    assert_eq!(manifest.total_segments(), 3);
    assert_eq!(manifest.start_number(), 1);
    assert_eq!(manifest.resolution(2), Some("720"));
    assert_eq!(manifest.segment_size(1, 2), Some(290_000));
    assert_eq!(manifest.timescale(), 1);
    assert!((manifest.total_duration_secs() - 6.0).abs() < f64::EPSILON);
    assert_eq!(manifest.resolutions().len(), 3);

    let locator = manifest.locator(1, 750).unwrap();
    assert_eq!(locator.segment_number, 2);
    assert_eq!(locator.expected_bytes, Some(190_000));
}

#[test]
fn generated_manifest_drives_a_controller() {
    let (_dir, path) = write_temp("ladder.json", &manifest_json(&LADDER_KBPS, 8, 2));
    let manifest = Arc::new(Manifest::from_path(&path).unwrap());
    let mut controller = AbrController::new(
        manifest,
        &AbrOptions::default().with_policy(PolicyKind::ThroughputRule),
    )
    .unwrap();

    let decision = controller.decide(PlaybackStats {
        last_throughput_kbps: 2500.0,
        buffer_secs: 0.0,
        segment_index: 0,
    });
    assert_eq!(decision.bitrate_kbps, 2000);
    assert_eq!(decision.representation_index, 2);
}

#[rstest]
#[case::no_bitrates(
    r#"{"segment_duration_ms": 2000, "bitrates_kbps": [], "segment_size_bytes": []}"#,
    |e: &ManifestError| matches!(e, ManifestError::NoBitrates)
)]
#[case::unsorted(
    r#"{"segment_duration_ms": 2000, "bitrates_kbps": [1000, 500], "segment_size_bytes": []}"#,
    |e: &ManifestError| matches!(e, ManifestError::UnsortedBitrates(_))
)]
#[case::zero_duration(
    r#"{"segment_duration_ms": 0, "bitrates_kbps": [500], "segment_size_bytes": [[1]]}"#,
    |e: &ManifestError| matches!(e, ManifestError::NonPositiveDuration(_))
)]
#[case::count_mismatch(
    r#"{"segment_duration_ms": 2000, "total_segments": 2, "bitrates_kbps": [500], "segment_size_bytes": [[1]]}"#,
    |e: &ManifestError| matches!(e, ManifestError::SegmentCountMismatch { declared: 2, actual: 1 })
)]
#[case::short_row(
    r#"{"segment_duration_ms": 2000, "bitrates_kbps": [500, 1000], "segment_size_bytes": [[1, 2], [3]]}"#,
    |e: &ManifestError| matches!(e, ManifestError::RowLength { segment: 1, .. })
)]
#[case::resolution_count(
    r#"{"segment_duration_ms": 2000, "bitrates_kbps": [500, 1000], "resolutions": ["360"], "segment_size_bytes": [[1, 2]]}"#,
    |e: &ManifestError| matches!(e, ManifestError::ResolutionCount { .. })
)]
fn invalid_manifest_files_report_the_violation(
    #[case] json: &str,
    #[case] is_expected: fn(&ManifestError) -> bool,
) {
    let (_dir, path) = write_temp("bad.json", json);
    let err = Manifest::from_path(&path).unwrap_err();
    assert!(is_expected(&err), "{err:?}");
}

#[test]
fn truncated_file_is_parse_error() {
    let (_dir, path) = write_temp("cut.json", r#"{"segment_duration_ms": 2000, "bitrates_kbps": [5"#);
    assert!(matches!(
        Manifest::from_path(&path),
        Err(ManifestError::Parse(_))
    ));
}

#[test]
fn missing_manifest_is_io_error() {
    assert!(matches!(
        Manifest::from_path("/nonexistent/lyra/manifest.json"),
        Err(ManifestError::Io(_))
    ));
}

#[test]
fn programmatic_and_file_manifests_agree() {
    let (_dir, path) = write_temp("ladder.json", &manifest_json(&LADDER_KBPS, 4, 2));
    let from_file = Manifest::from_path(&path).unwrap();
    let built = ladder_manifest(4);

    assert_eq!(from_file.bitrates_kbps(), built.bitrates_kbps());
    assert_eq!(from_file.segment_duration(), built.segment_duration());
    for i in 0..4 {
        assert_eq!(from_file.segment_sizes(i), built.segment_sizes(i));
    }
}
