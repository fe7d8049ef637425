//! Integration tests for lyra-pipeline

mod events;
mod session_scenarios;
