//! Bitrate selection policies.

mod bba2;
mod bola;
mod mpc;
mod throughput;

pub use bba2::{Bba2, Bba2State};
pub use bola::{Bola, BolaParameters};
pub use mpc::{Mpc, MpcMode};
pub use throughput::ThroughputRule;

use crate::{
    error::{AbrError, AbrResult},
    manifest::Manifest,
    types::{AbrOptions, PlaybackStats, PolicyKind},
};

/// One bitrate decision per segment.
///
/// Implementations may keep scratch state between calls but must always
/// return a bitrate listed in the manifest.
pub trait BitrateRule {
    fn next_quality(
        &mut self,
        manifest: &Manifest,
        stats: &PlaybackStats,
        predicted_kbps: f64,
    ) -> u32;
}

/// The closed set of policies, selected once per session.
#[derive(Clone, Debug)]
pub enum AbrPolicy {
    ThroughputRule(ThroughputRule),
    Mpc(Mpc),
    Bba2(Bba2),
    Bola(Bola),
}

impl AbrPolicy {
    /// Build the policy named by `kind`, validating its options.
    ///
    /// # Errors
    ///
    /// Returns [`AbrError::InvalidOptions`](crate::AbrError::InvalidOptions)
    /// if the options for `kind` cannot produce a decision.
    pub fn new(kind: PolicyKind, manifest: &Manifest, options: &AbrOptions) -> AbrResult<Self> {
        let policy = match kind {
            PolicyKind::ThroughputRule => Self::ThroughputRule(ThroughputRule),
            PolicyKind::Mpc => {
                let lookahead = options.mpc.lookahead;
                if lookahead == 0 {
                    return Err(AbrError::invalid_options(kind, "lookahead must be at least 1"));
                }
                let plan_count = u32::try_from(lookahead)
                    .ok()
                    .and_then(|exp| manifest.bitrate_count().checked_pow(exp));
                if plan_count.is_none() {
                    return Err(AbrError::invalid_options(
                        kind,
                        format!(
                            "{} bitrates over a lookahead of {lookahead} is too many plans",
                            manifest.bitrate_count()
                        ),
                    ));
                }
                Self::Mpc(Mpc::new(&options.mpc, options.qoe))
            }
            PolicyKind::Bba2 => {
                let bba2 = &options.bba2;
                if bba2.cushion_secs.is_nan() || bba2.cushion_secs <= 0.0 {
                    return Err(AbrError::invalid_options(kind, "cushion must be positive"));
                }
                if bba2.reservoir_secs.is_nan() || bba2.reservoir_secs < 0.0 {
                    return Err(AbrError::invalid_options(kind, "reservoir must not be negative"));
                }
                Self::Bba2(Bba2::new(manifest, bba2))
            }
            PolicyKind::Bola => {
                let bola = &options.bola;
                if bola.min_safe_buffer_secs.is_nan() || bola.min_safe_buffer_secs <= 0.0 {
                    return Err(AbrError::invalid_options(
                        kind,
                        "minimum safe buffer must be positive",
                    ));
                }
                if (bola.target_buffer_secs - bola.min_safe_buffer_secs).abs() < f64::EPSILON {
                    return Err(AbrError::invalid_options(
                        kind,
                        "target buffer must differ from the minimum safe buffer",
                    ));
                }
                Self::Bola(Bola::new(bola))
            }
        };
        tracing::debug!(policy = %kind, "ABR policy created");
        Ok(policy)
    }

    pub fn kind(&self) -> PolicyKind {
        match self {
            Self::ThroughputRule(_) => PolicyKind::ThroughputRule,
            Self::Mpc(_) => PolicyKind::Mpc,
            Self::Bba2(_) => PolicyKind::Bba2,
            Self::Bola(_) => PolicyKind::Bola,
        }
    }
}

impl BitrateRule for AbrPolicy {
    fn next_quality(
        &mut self,
        manifest: &Manifest,
        stats: &PlaybackStats,
        predicted_kbps: f64,
    ) -> u32 {
        match self {
            Self::ThroughputRule(rule) => rule.next_quality(manifest, stats, predicted_kbps),
            Self::Mpc(mpc) => mpc.next_quality(manifest, stats, predicted_kbps),
            Self::Bba2(bba2) => bba2.next_quality(manifest, stats, predicted_kbps),
            Self::Bola(bola) => bola.next_quality(manifest, stats, predicted_kbps),
        }
    }
}
