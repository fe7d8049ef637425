use std::{sync::Arc, time::Duration};

use lyra_abr::{AbrOptions, Manifest, PolicyKind};
use lyra_events::{Event, PipelineEvent};
use lyra_pipeline::{
    PlaybackClock, PlaybackSession, QoeReport, SegmentTransport, SessionOptions,
    SimulatedTransport, ThroughputTrace,
};
use lyra_test_utils::{
    LADDER_KBPS, ScriptedTransport, Step, TraceRng, jittered_manifest, ladder_manifest,
};
use rstest::rstest;

async fn play(
    manifest: Manifest,
    abr: &AbrOptions,
    options: SessionOptions,
    transport: Arc<dyn SegmentTransport>,
) -> QoeReport {
    let session = PlaybackSession::new(Arc::new(manifest), abr, options, transport).unwrap();
    tokio::time::timeout(Duration::from_secs(3600), session.run())
        .await
        .unwrap()
        .unwrap()
}

#[tokio::test(start_paused = true)]
async fn failure_after_three_segments_stops_everything() {
    let transport = Arc::new(ScriptedTransport::failing_after(3, 1500.0));
    let report = play(
        ladder_manifest(10),
        &AbrOptions::default(),
        SessionOptions::default().with_initial_throughput_kbps(1500.0),
        Arc::clone(&transport) as Arc<dyn SegmentTransport>,
    )
    .await;

    assert_eq!(transport.requested_bitrates(), vec![1000; 4]);
    assert_eq!(report.segments_fetched, 3);
    assert_eq!(report.segments_played, 3);
    assert_eq!(report.bytes_fetched, 750_000);
    assert!(!report.completed);
}

#[tokio::test(start_paused = true)]
async fn empty_delivery_is_a_failure() {
    let transport = Arc::new(ScriptedTransport::new([
        Step::Deliver(3000.0),
        Step::Deliver(3000.0),
        Step::Empty,
        Step::Deliver(3000.0),
    ]));
    let report = play(
        ladder_manifest(10),
        &AbrOptions::default(),
        SessionOptions::default(),
        Arc::clone(&transport) as Arc<dyn SegmentTransport>,
    )
    .await;

    // No throughput seed: the first pick is the lowest rung.
    assert_eq!(transport.requested_bitrates(), vec![500, 2000, 2000]);
    assert_eq!(report.segments_fetched, 2);
    assert_eq!(report.bytes_fetched, 125_000 + 500_000);
    assert!(!report.completed);
}

#[tokio::test(start_paused = true)]
async fn locators_follow_manifest_numbering() {
    let manifest = ladder_manifest(3).with_start_number(1);
    let transport = Arc::new(ScriptedTransport::new(vec![Step::Deliver(800.0); 3]));
    let report = play(
        manifest,
        &AbrOptions::default(),
        SessionOptions::default().with_initial_throughput_kbps(800.0),
        Arc::clone(&transport) as Arc<dyn SegmentTransport>,
    )
    .await;

    assert!(report.completed);
    let numbers: Vec<u64> = transport
        .requested()
        .iter()
        .map(|l| l.segment_number)
        .collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert!(transport.requested().iter().all(|l| l.expected_bytes == Some(125_000)));
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn every_policy_finishes_a_fluctuating_link(
    #[values(PolicyKind::ThroughputRule, PolicyKind::Mpc, PolicyKind::Bba2, PolicyKind::Bola)]
    policy: PolicyKind,
) {
    let mut rng = TraceRng::new(2024);
    let manifest = jittered_manifest(&mut rng, &LADDER_KBPS, 30, 2, 0.25);
    let trace = ThroughputTrace::Cycle(rng.link_trace(16, 600.0, 6000.0));
    let report = play(
        manifest,
        &AbrOptions::default().with_policy(policy),
        SessionOptions::default().with_initial_throughput_kbps(1500.0),
        Arc::new(SimulatedTransport::new(trace)),
    )
    .await;

    assert!(report.completed, "{policy} did not complete");
    assert_eq!(report.segments_fetched, 30);
    assert_eq!(report.segments_played, 30);
    assert!((500.0..=4000.0).contains(&report.avg_bitrate_kbps));
    assert!(report.rebuffer_time_secs >= 0.0);
    assert!(report.qoe_score.is_finite());
}

#[rstest]
#[case(PlaybackClock::RealTime)]
#[case(PlaybackClock::Instant)]
#[tokio::test(start_paused = true)]
async fn buffer_never_exceeds_capacity(#[case] clock: PlaybackClock) {
    let session = PlaybackSession::new(
        Arc::new(ladder_manifest(20)),
        &AbrOptions::default(),
        SessionOptions::default()
            .with_buffer_capacity_secs(8.0)
            .with_clock(clock),
        Arc::new(SimulatedTransport::constant(100_000.0)),
    )
    .unwrap();
    let mut rx = session.events().subscribe();
    let report = session.run().await.unwrap();
    assert!(report.completed);

    let mut levels = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let Event::Pipeline(PipelineEvent::SegmentFetched { buffer_secs, .. }) = event {
            levels.push(buffer_secs);
        }
    }
    assert_eq!(levels.len(), 20);
    assert!(levels.iter().all(|&level| level <= 8.0 + 1e-9), "{levels:?}");
}
