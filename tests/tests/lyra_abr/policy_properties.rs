use std::sync::Arc;

use lyra_abr::{
    AbrController, AbrOptions, Bba2Options, Estimator, EstimatorOptions, MpcOptions,
    MpcSizeModel, PlaybackStats, PolicyKind, ThroughputEstimator,
};
use lyra_test_utils::{LADDER_KBPS, TraceRng, jittered_manifest, nominal_manifest};
use rstest::{fixture, rstest};

#[fixture]
fn rng() -> TraceRng {
    TraceRng::new(0x5EED)
}

fn options(policy: PolicyKind) -> AbrOptions {
    AbrOptions::default().with_policy(policy)
}

#[rstest]
#[case(options(PolicyKind::ThroughputRule))]
#[case(options(PolicyKind::Mpc))]
#[case(options(PolicyKind::Mpc).with_mpc(MpcOptions::default().with_size_model(MpcSizeModel::Manifest)))]
#[case(options(PolicyKind::Bba2))]
#[case(options(PolicyKind::Bba2).with_bba2(Bba2Options::default().with_dynamic_reservoir(true)))]
#[case(options(PolicyKind::Bola))]
fn every_decision_is_a_manifest_bitrate(mut rng: TraceRng, #[case] options: AbrOptions) {
    let manifest = Arc::new(jittered_manifest(&mut rng, &LADDER_KBPS, 120, 2, 0.4));
    let mut controller = AbrController::new(Arc::clone(&manifest), &options).unwrap();
    let history = rng.history(manifest.total_segments(), 50.0, 8000.0, 0.1);

    for (segment_index, &last_throughput_kbps) in history.iter().enumerate() {
        let buffer_secs = rng.kbps(0.0, 90.0);
        let decision = controller.decide(PlaybackStats {
            last_throughput_kbps,
            buffer_secs,
            segment_index,
        });
        assert!(
            manifest.bitrates_kbps().contains(&decision.bitrate_kbps),
            "{:?} picked {} at segment {segment_index}",
            options.policy,
            decision.bitrate_kbps
        );
        assert_eq!(
            manifest.representation_index(decision.bitrate_kbps),
            Some(decision.representation_index)
        );
    }
}

#[rstest]
fn single_rung_ladder_always_picks_it(
    #[values(PolicyKind::ThroughputRule, PolicyKind::Mpc, PolicyKind::Bba2, PolicyKind::Bola)]
    policy: PolicyKind,
    mut rng: TraceRng,
) {
    let manifest = Arc::new(nominal_manifest(&[800], 30, 2));
    let mut controller = AbrController::new(manifest, &options(policy)).unwrap();

    for segment_index in 0..30 {
        let decision = controller.decide(PlaybackStats {
            last_throughput_kbps: rng.kbps(0.0, 5000.0),
            buffer_secs: rng.kbps(0.0, 60.0),
            segment_index,
        });
        assert_eq!(decision.bitrate_kbps, 800);
        assert!(!decision.changed());
    }
}

#[rstest]
fn throughput_rule_stays_below_last_throughput(mut rng: TraceRng) {
    let manifest = Arc::new(nominal_manifest(&LADDER_KBPS, 200, 2));
    let mut controller =
        AbrController::new(manifest, &options(PolicyKind::ThroughputRule)).unwrap();

    for (segment_index, tput) in rng.history(200, 100.0, 6000.0, 0.0).into_iter().enumerate() {
        let chosen = controller
            .decide(PlaybackStats {
                last_throughput_kbps: tput,
                buffer_secs: 10.0,
                segment_index,
            })
            .bitrate_kbps;
        assert!(chosen == 500 || f64::from(chosen) < tput, "{chosen} at {tput}");
    }
}

#[rstest]
#[case(5)]
#[case(1)]
#[case(12)]
fn prediction_never_exceeds_window_maximum(mut rng: TraceRng, #[case] window: usize) {
    let mut estimator = ThroughputEstimator::new(&EstimatorOptions { window });
    let history = rng.history(300, 10.0, 10_000.0, 0.25);

    for (i, &sample) in history.iter().enumerate() {
        estimator.observe(sample);
        let prediction = estimator.predict();

        let start = (i + 1).saturating_sub(window);
        let window_max = history[start..=i].iter().copied().fold(0.0, f64::max);
        assert!(prediction >= 0.0);
        assert!(prediction <= window_max + 1e-9, "{prediction} > {window_max}");
        assert!(prediction <= estimator.harmonic_mean() + 1e-9);
    }
}

#[rstest]
fn decisions_are_deterministic(
    #[values(PolicyKind::ThroughputRule, PolicyKind::Mpc, PolicyKind::Bba2, PolicyKind::Bola)]
    policy: PolicyKind,
) {
    let run = || {
        let mut rng = TraceRng::new(99);
        let manifest = Arc::new(jittered_manifest(&mut rng, &LADDER_KBPS, 40, 2, 0.2));
        let mut controller = AbrController::new(manifest, &options(policy)).unwrap();
        (0..40)
            .map(|segment_index| {
                controller
                    .decide(PlaybackStats {
                        last_throughput_kbps: rng.kbps(200.0, 5000.0),
                        buffer_secs: rng.kbps(0.0, 60.0),
                        segment_index,
                    })
                    .bitrate_kbps
            })
            .collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}
