#![forbid(unsafe_code)]
#![expect(
    clippy::unwrap_used,
    reason = "test utility crate: unwraps are acceptable"
)]
#![expect(
    clippy::missing_panics_doc,
    reason = "test utility crate: panic documentation not needed"
)]

//! Shared test utilities for the lyra workspace.

pub mod fixtures;
pub mod rng;
pub mod transport;

pub use fixtures::*;
pub use rng::TraceRng;
pub use transport::{ScriptedTransport, Step};
