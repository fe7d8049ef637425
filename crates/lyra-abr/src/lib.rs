//! Adaptive bitrate (ABR) decision engine.
//!
//! A throughput predictor plus four interchangeable bitrate selection
//! policies, driven once per segment through [`AbrController`].
//!
//! ## Policies
//!
//! - **Throughput rule**: highest bitrate below the last observed throughput
//! - **MPC**: receding-horizon search over every bitrate sequence
//! - **BBA2**: buffer-to-chunk-size map with a startup ramp
//! - **Bola**: Lyapunov utility maximisation over buffer occupancy
//!
//! ## Example
//!
//! ```rust
//! use std::{sync::Arc, time::Duration};
//!
//! use lyra_abr::{AbrController, AbrOptions, Manifest, PlaybackStats, PolicyKind};
//!
//! let manifest = Manifest::new(
//!     vec![500, 1000, 2000],
//!     vec![vec![125_000, 250_000, 500_000]; 4],
//!     Duration::from_secs(2),
//! )?;
//! let options = AbrOptions::default().with_policy(PolicyKind::Bola);
//! let mut controller = AbrController::new(Arc::new(manifest), &options)?;
//!
//! let decision = controller.decide(PlaybackStats {
//!     last_throughput_kbps: 1500.0,
//!     buffer_secs: 12.0,
//!     segment_index: 0,
//! });
//! assert!([500, 1000, 2000].contains(&decision.bitrate_kbps));
//! # Ok::<(), lyra_abr::AbrError>(())
//! ```

#![forbid(unsafe_code)]

mod controller;
mod error;
mod estimator;
mod manifest;
mod policy;
mod types;

pub use controller::{AbrController, AbrDecision, DefaultAbrController};
pub use error::{AbrError, AbrResult, ManifestError, ManifestResult};
#[cfg(any(test, feature = "test-utils"))]
pub use estimator::MockEstimator;
pub use estimator::{Estimator, ThroughputEstimator};
pub use manifest::{Manifest, SegmentLocator};
pub use policy::{
    AbrPolicy, Bba2, Bba2State, BitrateRule, Bola, BolaParameters, Mpc, MpcMode, ThroughputRule,
};
pub use types::{
    AbrOptions, BOLA_REFERENCE_SIZES_KB, Bba2Options, BolaOptions, BolaScoreSizes,
    EstimatorOptions, MpcOptions, MpcSizeModel, PlaybackStats, PolicyKind, QoeWeights,
};
