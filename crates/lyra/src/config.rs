//! Configuration for a simulated playback.

use std::{fs, path::Path, sync::Arc};

use derivative::Derivative;
use derive_setters::Setters;
use lyra_abr::{AbrOptions, Manifest};
use lyra_events::EventBus;
use lyra_pipeline::{
    PlaybackSession, SegmentTransport, SessionOptions, SessionResult, SimulatedTransport,
    ThroughputTrace,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};

/// Everything needed to play one manifest, loadable from JSON.
///
/// Every field is optional in the file; missing ones take their defaults.
///
/// ```json
/// {
///   "abr": { "policy": "bola", "bola": { "target_buffer_secs": 20 } },
///   "session": { "buffer_capacity_secs": 30 },
///   "link_kbps": [3000, 800, 1500]
/// }
/// ```
#[derive(Clone, Debug, Derivative, PartialEq, Setters, Serialize, Deserialize)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[serde(default)]
pub struct PlayerConfig {
    pub abr: AbrOptions,
    pub session: SessionOptions,
    /// Broadcast capacity of the session's event bus. Default: 256.
    #[derivative(Default(value = "256"))]
    pub event_capacity: usize,
    /// Per-fetch link throughput for [`SimulatedTransport`], cycled.
    /// Empty means "not configured".
    pub link_kbps: Vec<f64>,
}

impl PlayerConfig {
    /// # Errors
    ///
    /// [`ConfigError::Parse`] for malformed JSON or unknown values,
    /// [`ConfigError::ZeroEventCapacity`] for an unusable bus size.
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        if config.event_capacity == 0 {
            return Err(ConfigError::ZeroEventCapacity);
        }
        Ok(config)
    }

    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`PlayerConfig::from_json_str`].
    pub fn from_path<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loading player config");
        Self::from_json_str(&json)
    }

    /// Simulated link from `link_kbps`, if any was configured.
    pub fn simulated_transport(&self) -> Option<SimulatedTransport> {
        match self.link_kbps.as_slice() {
            [] => None,
            [kbps] => Some(SimulatedTransport::constant(*kbps)),
            trace => Some(SimulatedTransport::new(ThroughputTrace::Cycle(trace.to_vec()))),
        }
    }

    /// Validate and assemble a session publishing on a fresh bus.
    ///
    /// # Errors
    ///
    /// As [`PlaybackSession::new`].
    pub fn session(
        &self,
        manifest: Arc<Manifest>,
        transport: Arc<dyn SegmentTransport>,
    ) -> SessionResult<PlaybackSession> {
        let events = EventBus::new(self.event_capacity.max(1));
        Ok(PlaybackSession::new(manifest, &self.abr, self.session, transport)?.with_events(events))
    }
}
