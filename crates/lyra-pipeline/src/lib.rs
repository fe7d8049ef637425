//! Concurrent fetch → decode → play pipeline.
//!
//! A [`PlaybackSession`] runs three tokio tasks linked by unbounded FIFO
//! queues. The fetcher consults the ABR controller once per segment and
//! waits for buffer headroom before every fetch; the player drains the
//! buffer as it "plays" and wakes the fetcher. Totals are reduced to a
//! [`QoeReport`] when all three tasks have joined.

#![forbid(unsafe_code)]

mod buffer;
mod decoder;
mod error;
mod fetcher;
mod player;
mod qoe;
mod session;
mod stage;
mod transport;

pub use buffer::BufferModel;
pub use error::{SessionError, SessionResult, TransportError};
pub use qoe::{QoeAccumulator, QoeReport};
pub use session::{PlaybackClock, PlaybackSession, SessionOptions};
pub use stage::{SegmentToken, StageMsg};
#[cfg(any(test, feature = "test-utils"))]
pub use transport::MockSegmentTransport;
pub use transport::{FetchReport, SegmentTransport, SimulatedTransport, ThroughputTrace};
