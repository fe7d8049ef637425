#![forbid(unsafe_code)]

//! # Lyra
//!
//! Facade crate for the adaptive bitrate streaming controller.
//!
//! ## Quick start
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use lyra::prelude::*;
//!
//! let config = PlayerConfig::from_path("player.json")?;
//! let manifest = Arc::new(Manifest::from_path("manifest.json")?);
//! let transport = Arc::new(SimulatedTransport::constant(1500.0));
//! let report = config.session(manifest, transport)?.run().await?;
//! println!("{}", serde_json::to_string_pretty(&report)?);
//! ```

// ── Re-export sub-crates ────────────────────────────────────────────────

pub mod abr {
    pub use lyra_abr::*;
}

pub mod events {
    pub use lyra_events::*;
}

pub mod pipeline {
    pub use lyra_pipeline::*;
}

// ── Player configuration ────────────────────────────────────────────────

mod config;
mod error;

pub use config::PlayerConfig;
pub use error::{ConfigError, ConfigResult};

// ── Prelude ─────────────────────────────────────────────────────────────

pub mod prelude {
    pub use lyra_abr::{AbrController, AbrError, AbrOptions, Manifest, PlaybackStats, PolicyKind};
    pub use lyra_events::{AbrEvent, Event, EventBus, PipelineEvent};
    pub use lyra_pipeline::{
        PlaybackClock, PlaybackSession, QoeReport, SegmentTransport, SessionError,
        SessionOptions, SimulatedTransport, ThroughputTrace,
    };

    pub use crate::{ConfigError, PlayerConfig};
}
