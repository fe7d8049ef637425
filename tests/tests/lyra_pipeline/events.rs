use std::sync::Arc;

use lyra_abr::AbrOptions;
use lyra_events::{AbrEvent, Event, EventBus, PipelineEvent};
use lyra_pipeline::{PlaybackSession, SessionOptions, SimulatedTransport, ThroughputTrace};
use lyra_test_utils::{ScriptedTransport, ladder_manifest};

fn position(events: &[Event], pred: impl Fn(&Event) -> bool) -> usize {
    events.iter().position(pred).unwrap()
}

#[tokio::test(start_paused = true)]
async fn failed_session_publishes_a_consistent_story() {
    let bus = EventBus::new(64);
    let mut rx = bus.subscribe();
    let session = PlaybackSession::new(
        Arc::new(ladder_manifest(10)),
        &AbrOptions::default(),
        SessionOptions::default().with_initial_throughput_kbps(1500.0),
        Arc::new(ScriptedTransport::failing_after(2, 1500.0)),
    )
    .unwrap()
    .with_events(bus);
    session.run().await.unwrap();

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }

    let decisions = events
        .iter()
        .filter(|e| matches!(e, Event::Abr(AbrEvent::Decision { .. })))
        .count();
    let fetched = events
        .iter()
        .filter(|e| matches!(e, Event::Pipeline(PipelineEvent::SegmentFetched { .. })))
        .count();
    assert_eq!(decisions, 3);
    assert_eq!(fetched, 2);

    let failed = position(&events, |e| {
        matches!(
            e,
            Event::Pipeline(PipelineEvent::FetchFailed {
                segment_index: 2,
                ..
            })
        )
    });
    let started = position(&events, |e| {
        matches!(e, Event::Pipeline(PipelineEvent::PlaybackStarted { .. }))
    });
    let first_fetch = position(&events, |e| {
        matches!(e, Event::Pipeline(PipelineEvent::SegmentFetched { .. }))
    });
    assert!(first_fetch < started);
    assert!(started < events.len() - 1);
    assert!(failed < events.len() - 1);
    assert_eq!(
        events.last(),
        Some(&Event::Pipeline(PipelineEvent::Finished {
            segments_played: 2,
            completed: false,
        }))
    );
}

#[tokio::test(start_paused = true)]
async fn every_decision_precedes_its_fetch() {
    let session = PlaybackSession::new(
        Arc::new(ladder_manifest(8)),
        &AbrOptions::default(),
        SessionOptions::default(),
        Arc::new(SimulatedTransport::new(ThroughputTrace::Cycle(vec![
            5000.0, 900.0,
        ]))),
    )
    .unwrap();
    let mut rx = session.events().subscribe();
    session.run().await.unwrap();

    let mut pending = None;
    let mut switches = 0;
    while let Ok(event) = rx.try_recv() {
        match event {
            Event::Abr(AbrEvent::Decision {
                segment_index,
                bitrate_kbps,
                ..
            }) => {
                assert_eq!(pending, None, "two decisions without a fetch");
                pending = Some((segment_index, bitrate_kbps));
            }
            Event::Pipeline(PipelineEvent::SegmentFetched {
                segment_index,
                bitrate_kbps,
                ..
            }) => {
                assert_eq!(pending.take(), Some((segment_index, bitrate_kbps)));
            }
            Event::Abr(AbrEvent::Switched {
                from_kbps, to_kbps, ..
            }) => {
                assert_ne!(from_kbps, to_kbps);
                switches += 1;
            }
            _ => {}
        }
    }
    assert_eq!(pending, None);
    assert!(switches > 0);
}
