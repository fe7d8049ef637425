use std::{fmt, str::FromStr};

use derivative::Derivative;
use derive_setters::Setters;
use serde::{Deserialize, Serialize};

use crate::error::AbrError;

/// Snapshot handed to a policy for one decision.
///
/// Built fresh by the fetch loop before every segment and passed by value.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PlaybackStats {
    /// Throughput observed on the most recent fetch (0 when unknown).
    pub last_throughput_kbps: f64,
    /// Seconds of media currently buffered.
    pub buffer_secs: f64,
    /// Zero-based index of the segment about to be fetched.
    pub segment_index: usize,
}

/// Bitrate selection policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyKind {
    /// Highest bitrate below the last observed throughput.
    #[default]
    #[serde(alias = "tputRule", alias = "throughput")]
    ThroughputRule,
    /// Model-predictive control over a short lookahead horizon.
    #[serde(alias = "MPC")]
    Mpc,
    /// Buffer-based adaptation with a startup phase.
    #[serde(alias = "BBA2")]
    Bba2,
    /// Lyapunov utility maximisation over buffer occupancy.
    #[serde(alias = "Bola", alias = "BOLA")]
    Bola,
}

impl PolicyKind {
    pub const ALL: [PolicyKind; 4] = [
        PolicyKind::ThroughputRule,
        PolicyKind::Mpc,
        PolicyKind::Bba2,
        PolicyKind::Bola,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PolicyKind::ThroughputRule => "throughput-rule",
            PolicyKind::Mpc => "mpc",
            PolicyKind::Bba2 => "bba2",
            PolicyKind::Bola => "bola",
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyKind {
    type Err = AbrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "throughputrule" | "tputrule" | "throughput" => Ok(PolicyKind::ThroughputRule),
            "mpc" => Ok(PolicyKind::Mpc),
            "bba2" => Ok(PolicyKind::Bba2),
            "bola" => Ok(PolicyKind::Bola),
            _ => Err(AbrError::UnknownPolicy(s.to_owned())),
        }
    }
}

/// Weights of the QoE objective, shared by MPC and the session score.
#[derive(Clone, Copy, Debug, Derivative, PartialEq, Setters, Serialize, Deserialize)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[serde(default)]
pub struct QoeWeights {
    /// Bitrate-switch penalty. Default: 1.
    #[derivative(Default(value = "1.0"))]
    pub lambda: f64,
    /// Rebuffer (and startup delay) penalty per second. Default: 3000.
    #[derivative(Default(value = "3000.0"))]
    pub mu: f64,
}

#[derive(Clone, Copy, Debug, Derivative, PartialEq, Eq, Setters, Serialize, Deserialize)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[serde(default)]
pub struct EstimatorOptions {
    /// Number of recent samples (and prediction errors) considered. Default: 5.
    #[derivative(Default(value = "5"))]
    pub window: usize,
}

/// How MPC estimates the size of a planned segment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MpcSizeModel {
    /// `bitrate_mbps * nominal_size_multiplier`, independent of the manifest.
    ///
    /// The default multiplier bakes in a 2 s segment whatever the manifest
    /// says.
    #[default]
    Nominal,
    /// Real per-segment sizes from the manifest.
    Manifest,
}

#[derive(Clone, Copy, Debug, Derivative, PartialEq, Setters, Serialize, Deserialize)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[serde(default)]
pub struct MpcOptions {
    /// Planning horizon in segments. Default: 4.
    #[derivative(Default(value = "4"))]
    pub lookahead: usize,
    pub size_model: MpcSizeModel,
    /// Multiplier for [`MpcSizeModel::Nominal`]. Default: 250 (2 s × 125).
    #[derivative(Default(value = "250.0"))]
    pub nominal_size_multiplier: f64,
}

#[derive(Clone, Copy, Debug, Derivative, PartialEq, Setters, Serialize, Deserialize)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[serde(default)]
pub struct Bba2Options {
    /// Buffer level below which the lowest bitrate is pinned. Default: 8 s.
    #[derivative(Default(value = "8.0"))]
    pub reservoir_secs: f64,
    /// Width of the linear region above the reservoir. Default: 46 s.
    #[derivative(Default(value = "46.0"))]
    pub cushion_secs: f64,
    /// Recompute the reservoir from upcoming segment sizes in steady state.
    pub dynamic_reservoir: bool,
    /// Lookahead used by the dynamic reservoir. Default: 60 s.
    #[derivative(Default(value = "60.0"))]
    pub reservoir_window_secs: f64,
    /// Upper bound of the dynamic reservoir. Default: 140 s.
    #[derivative(Default(value = "140.0"))]
    pub reservoir_ceiling_secs: f64,
}

/// Approximate per-rung file sizes (kB) the Bola score divides by.
pub const BOLA_REFERENCE_SIZES_KB: [f64; 5] = [112.22, 256.50, 577.10, 801.49, 1234.25];

/// Denominator of the Bola score.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BolaScoreSizes {
    /// Fixed table in kB indexed by rung; rungs past its end use the live size.
    FixedTable(Vec<f64>),
    /// Live size of the current segment in kB.
    LiveSegment,
}

impl Default for BolaScoreSizes {
    fn default() -> Self {
        Self::FixedTable(BOLA_REFERENCE_SIZES_KB.to_vec())
    }
}

#[derive(Clone, Debug, Derivative, PartialEq, Setters, Serialize, Deserialize)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[serde(default)]
pub struct BolaOptions {
    /// Default: 10 s.
    #[derivative(Default(value = "10.0"))]
    pub min_safe_buffer_secs: f64,
    /// Default: 30 s. Must differ from `min_safe_buffer_secs`.
    #[derivative(Default(value = "30.0"))]
    pub target_buffer_secs: f64,
    pub score_sizes: BolaScoreSizes,
}

/// ABR engine configuration.
#[derive(Clone, Debug, Default, PartialEq, Setters, Serialize, Deserialize)]
#[setters(prefix = "with_")]
#[serde(default)]
pub struct AbrOptions {
    pub policy: PolicyKind,
    pub qoe: QoeWeights,
    pub estimator: EstimatorOptions,
    pub mpc: MpcOptions,
    pub bba2: Bba2Options,
    pub bola: BolaOptions,
}
