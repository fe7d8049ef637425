//! All integration tests for lyra
#![expect(
    clippy::unwrap_used,
    reason = "integration test crate: unwraps are acceptable in test code"
)]

mod facade;
mod lyra_abr;
mod lyra_pipeline;
