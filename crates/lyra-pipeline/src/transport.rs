use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use lyra_abr::SegmentLocator;
#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

use crate::error::TransportError;

/// What one fetch transferred.
#[derive(Clone, Debug, PartialEq)]
pub struct FetchReport {
    /// `0` means the transport delivered nothing.
    pub bytes: u64,
    pub throughput_kbps: f64,
    pub elapsed: Duration,
}

impl FetchReport {
    /// Build a report, deriving throughput from size and elapsed time.
    #[expect(clippy::cast_precision_loss)]
    pub fn measured(bytes: u64, elapsed: Duration) -> Self {
        let secs = elapsed.as_secs_f64();
        let throughput_kbps = if secs > 0.0 {
            bytes as f64 * 8.0 / 1000.0 / secs
        } else {
            0.0
        };
        Self {
            bytes,
            throughput_kbps,
            elapsed,
        }
    }
}

/// Segment download collaborator.
///
/// Each call is one attempt; the pipeline never retries.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait SegmentTransport: Send + Sync + 'static {
    async fn fetch(&self, locator: SegmentLocator) -> Result<FetchReport, TransportError>;
}

/// Link throughput over time, one value per fetch.
#[derive(Clone, Debug, PartialEq)]
pub enum ThroughputTrace {
    Constant(f64),
    /// Cycled in order, wrapping at the end.
    Cycle(Vec<f64>),
}

/// Transport that "downloads" the manifest's segment sizes over a trace.
///
/// Each fetch sleeps for `size / throughput` on the tokio clock, so tests
/// with a paused runtime complete instantly.
#[derive(Debug)]
pub struct SimulatedTransport {
    trace: ThroughputTrace,
    fetches: AtomicUsize,
}

impl SimulatedTransport {
    pub fn new(trace: ThroughputTrace) -> Self {
        Self {
            trace,
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn constant(throughput_kbps: f64) -> Self {
        Self::new(ThroughputTrace::Constant(throughput_kbps))
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Acquire)
    }

    fn throughput_at(&self, n: usize) -> f64 {
        match &self.trace {
            ThroughputTrace::Constant(kbps) => *kbps,
            ThroughputTrace::Cycle(values) if values.is_empty() => 0.0,
            ThroughputTrace::Cycle(values) => values[n % values.len()],
        }
    }
}

#[async_trait]
impl SegmentTransport for SimulatedTransport {
    #[expect(clippy::cast_precision_loss)]
    async fn fetch(&self, locator: SegmentLocator) -> Result<FetchReport, TransportError> {
        let n = self.fetches.fetch_add(1, Ordering::AcqRel);
        let throughput_kbps = self.throughput_at(n);
        let segment = locator.segment_index;

        if !(throughput_kbps.is_finite() && throughput_kbps > 0.0) {
            return Err(TransportError::Unavailable {
                segment,
                reason: format!("link down ({throughput_kbps} kbps)"),
            });
        }
        let bytes = locator
            .expected_bytes
            .ok_or(TransportError::NoData { segment })?;

        let elapsed = Duration::from_secs_f64(bytes as f64 * 8.0 / 1000.0 / throughput_kbps);
        tracing::trace!(
            segment,
            path = %locator.path(),
            bytes,
            throughput_kbps,
            ?elapsed,
            "simulated fetch"
        );
        tokio::time::sleep(elapsed).await;

        Ok(FetchReport {
            bytes,
            throughput_kbps,
            elapsed,
        })
    }
}
