use std::sync::Arc;

use lyra::{
    ConfigError, PlayerConfig,
    prelude::{Manifest, PlaybackClock, PolicyKind},
};
use lyra_test_utils::{LADDER_KBPS, manifest_json, write_temp};
use rstest::rstest;

#[rstest]
#[case("mpc", PolicyKind::Mpc)]
#[case("BBA2", PolicyKind::Bba2)]
#[case("tputRule", PolicyKind::ThroughputRule)]
#[case("bola", PolicyKind::Bola)]
fn policy_names_from_config_files(#[case] name: &str, #[case] expected: PolicyKind) {
    let json = format!(r#"{{ "abr": {{ "policy": "{name}" }} }}"#);
    let (_dir, path) = write_temp("player.json", &json);
    assert_eq!(PlayerConfig::from_path(&path).unwrap().abr.policy, expected);
}

#[test]
fn unknown_policy_in_file_is_rejected() {
    let (_dir, path) = write_temp("player.json", r#"{ "abr": { "policy": "festive" } }"#);
    assert!(matches!(
        PlayerConfig::from_path(&path),
        Err(ConfigError::Parse(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn files_on_disk_drive_a_full_playback() {
    let (_manifest_dir, manifest_path) =
        write_temp("manifest.json", &manifest_json(&LADDER_KBPS, 12, 2));
    let (_config_dir, config_path) = write_temp(
        "player.json",
        r#"{
            "abr": { "policy": "bola" },
            "session": { "buffer_capacity_secs": 20, "initial_throughput_kbps": 2500 },
            "link_kbps": [2500]
        }"#,
    );

    let config = PlayerConfig::from_path(&config_path).unwrap();
    assert_eq!(config.session.clock, PlaybackClock::RealTime);
    let manifest = Arc::new(Manifest::from_path(&manifest_path).unwrap());
    let transport = Arc::new(config.simulated_transport().unwrap());

    let report = config.session(manifest, transport).unwrap().run().await.unwrap();

    assert!(report.completed);
    assert_eq!(report.segments_fetched, 12);
    assert!(report.avg_bitrate_kbps >= 500.0);
    assert!(report.avg_bitrate_kbps <= 4000.0);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["segments_fetched"], 12);
    assert_eq!(json["completed"], true);
}
