use std::sync::Arc;

use crate::{
    error::AbrResult,
    estimator::{Estimator, ThroughputEstimator},
    manifest::Manifest,
    policy::{AbrPolicy, BitrateRule},
    types::{AbrOptions, PlaybackStats, PolicyKind},
};

/// Outcome of one `decide` call.
#[derive(Clone, Debug, PartialEq)]
pub struct AbrDecision {
    pub segment_index: usize,
    pub bitrate_kbps: u32,
    pub representation_index: usize,
    pub predicted_kbps: f64,
    /// Bitrate chosen by the previous decision, `None` on the first.
    pub previous_kbps: Option<u32>,
}

impl AbrDecision {
    /// Whether this decision switches away from the previous bitrate.
    pub fn changed(&self) -> bool {
        self.previous_kbps.is_some_and(|prev| prev != self.bitrate_kbps)
    }
}

/// Estimator plus policy, consulted once per segment.
pub struct AbrController<E: Estimator = ThroughputEstimator> {
    manifest: Arc<Manifest>,
    policy: AbrPolicy,
    estimator: E,
    last_bitrate: Option<u32>,
}

impl<E: Estimator> AbrController<E> {
    /// # Errors
    ///
    /// Returns error if the selected policy rejects its options.
    pub fn with_estimator(
        manifest: Arc<Manifest>,
        options: &AbrOptions,
        estimator: E,
    ) -> AbrResult<Self> {
        let policy = AbrPolicy::new(options.policy, &manifest, options)?;
        Ok(Self {
            manifest,
            policy,
            estimator,
            last_bitrate: None,
        })
    }

    pub fn manifest(&self) -> &Arc<Manifest> {
        &self.manifest
    }

    pub fn policy_kind(&self) -> PolicyKind {
        self.policy.kind()
    }

    pub fn last_bitrate(&self) -> Option<u32> {
        self.last_bitrate
    }

    /// Feed the last observed throughput to the estimator and pick a bitrate
    /// for `stats.segment_index`.
    pub fn decide(&mut self, stats: PlaybackStats) -> AbrDecision {
        self.estimator.observe(stats.last_throughput_kbps);
        let predicted_kbps = self.estimator.predict();
        let bitrate_kbps = self
            .policy
            .next_quality(&self.manifest, &stats, predicted_kbps);
        let representation_index = self
            .manifest
            .representation_index(bitrate_kbps)
            .unwrap_or_default();

        let decision = AbrDecision {
            segment_index: stats.segment_index,
            bitrate_kbps,
            representation_index,
            predicted_kbps,
            previous_kbps: self.last_bitrate,
        };

        tracing::debug!(
            policy = %self.policy.kind(),
            segment = stats.segment_index,
            buffer_secs = stats.buffer_secs,
            last_throughput_kbps = stats.last_throughput_kbps,
            predicted_kbps,
            bitrate_kbps,
            changed = decision.changed(),
            "ABR decide"
        );

        self.last_bitrate = Some(bitrate_kbps);
        decision
    }
}

impl AbrController<ThroughputEstimator> {
    /// Controller with the default harmonic-mean estimator.
    ///
    /// # Errors
    ///
    /// Returns error if the selected policy rejects its options.
    pub fn new(manifest: Arc<Manifest>, options: &AbrOptions) -> AbrResult<Self> {
        let estimator = ThroughputEstimator::new(&options.estimator);
        Self::with_estimator(manifest, options, estimator)
    }
}

pub type DefaultAbrController = AbrController<ThroughputEstimator>;
