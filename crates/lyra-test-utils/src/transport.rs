//! Transports with a fixed script of outcomes.

use std::{collections::VecDeque, time::Duration};

use async_trait::async_trait;
use lyra_abr::SegmentLocator;
use lyra_pipeline::{FetchReport, SegmentTransport, TransportError};
use parking_lot::Mutex;

/// Outcome of one scripted fetch.
#[derive(Clone, Debug, PartialEq)]
pub enum Step {
    /// Deliver the locator's expected bytes at this throughput.
    Deliver(f64),
    /// Report success with zero bytes.
    Empty,
    Fail(String),
}

/// Plays back [`Step`]s in order and records every requested locator.
///
/// Once the script runs out every fetch fails as unavailable.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    steps: Mutex<VecDeque<Step>>,
    requested: Mutex<Vec<SegmentLocator>>,
}

impl ScriptedTransport {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
            requested: Mutex::default(),
        }
    }

    /// `ok` deliveries at `kbps`, then one failure.
    pub fn failing_after(ok: usize, kbps: f64) -> Self {
        Self::new(
            std::iter::repeat_n(Step::Deliver(kbps), ok)
                .chain(std::iter::once(Step::Fail("scripted failure".into()))),
        )
    }

    pub fn requested(&self) -> Vec<SegmentLocator> {
        self.requested.lock().clone()
    }

    pub fn requested_bitrates(&self) -> Vec<u32> {
        self.requested.lock().iter().map(|l| l.bitrate_kbps).collect()
    }
}

#[async_trait]
impl SegmentTransport for ScriptedTransport {
    #[expect(clippy::cast_precision_loss)]
    async fn fetch(&self, locator: SegmentLocator) -> Result<FetchReport, TransportError> {
        let segment = locator.segment_index;
        let bytes = locator.expected_bytes.unwrap_or_default();
        self.requested.lock().push(locator);
        let step = self.steps.lock().pop_front();

        match step {
            Some(Step::Deliver(kbps)) if kbps > 0.0 => {
                let elapsed = Duration::from_secs_f64(bytes as f64 * 8.0 / 1000.0 / kbps);
                tokio::time::sleep(elapsed).await;
                Ok(FetchReport {
                    bytes,
                    throughput_kbps: kbps,
                    elapsed,
                })
            }
            Some(Step::Deliver(kbps)) => Err(TransportError::Unavailable {
                segment,
                reason: format!("link down ({kbps} kbps)"),
            }),
            Some(Step::Empty) => Ok(FetchReport {
                bytes: 0,
                throughput_kbps: 0.0,
                elapsed: Duration::ZERO,
            }),
            Some(Step::Fail(reason)) => Err(TransportError::Unavailable { segment, reason }),
            None => Err(TransportError::Unavailable {
                segment,
                reason: "script exhausted".into(),
            }),
        }
    }
}
