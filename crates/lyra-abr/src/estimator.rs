use std::collections::VecDeque;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

use crate::types::EstimatorOptions;

/// Throughput prediction strategy.
///
/// Allows testing `AbrController` with mock estimators.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait Estimator {
    /// Record the throughput observed on the latest fetch.
    fn observe(&mut self, throughput_kbps: f64);

    /// Predict throughput for the next fetch.
    ///
    /// Every call is remembered so the next call can measure how far off it was.
    fn predict(&mut self) -> f64;
}

/// Robust harmonic-mean predictor.
///
/// The prediction is the harmonic mean of the recent non-zero samples,
/// discounted by the worst relative error of the recent predictions:
/// `harmonic_mean / (1 + max_error)`.
#[derive(Clone, Debug)]
pub struct ThroughputEstimator {
    window: usize,
    observed: VecDeque<f64>,
    predicted: VecDeque<f64>,
    errors: VecDeque<f64>,
}

impl ThroughputEstimator {
    pub fn new(options: &EstimatorOptions) -> Self {
        let window = options.window.max(1);
        Self {
            window,
            observed: VecDeque::with_capacity(window),
            predicted: VecDeque::with_capacity(window),
            errors: VecDeque::with_capacity(window),
        }
    }

    /// Harmonic mean of the last `window` samples, zeros excluded.
    pub fn harmonic_mean(&self) -> f64 {
        let (count, reciprocal_sum) = self
            .observed
            .iter()
            .filter(|&&x| x != 0.0)
            .fold((0_u32, 0.0), |(n, sum), &x| (n + 1, sum + 1.0 / x));

        if reciprocal_sum == 0.0 {
            0.0
        } else {
            f64::from(count) / reciprocal_sum
        }
    }

    /// Worst relative prediction error within the window (0 when none).
    pub fn max_error(&self) -> f64 {
        self.errors.iter().copied().fold(0.0, f64::max)
    }

    pub fn last_prediction(&self) -> Option<f64> {
        self.predicted.back().copied()
    }

    fn push_bounded(buf: &mut VecDeque<f64>, window: usize, value: f64) {
        if buf.len() == window {
            buf.pop_front();
        }
        buf.push_back(value);
    }
}

impl Default for ThroughputEstimator {
    fn default() -> Self {
        Self::new(&EstimatorOptions::default())
    }
}

impl Estimator for ThroughputEstimator {
    fn observe(&mut self, throughput_kbps: f64) {
        let sample = if throughput_kbps.is_finite() && throughput_kbps > 0.0 {
            throughput_kbps
        } else {
            0.0
        };
        Self::push_bounded(&mut self.observed, self.window, sample);
    }

    fn predict(&mut self) -> f64 {
        let harmonic_mean = self.harmonic_mean();

        if let (Some(&observed), Some(&predicted)) = (self.observed.back(), self.predicted.back())
            && observed != 0.0
        {
            let error = (observed - predicted).abs() / observed;
            Self::push_bounded(&mut self.errors, self.window, error);
        }

        let prediction = harmonic_mean / (1.0 + self.max_error());
        Self::push_bounded(&mut self.predicted, self.window, prediction);

        tracing::trace!(
            harmonic_mean,
            max_error = self.max_error(),
            prediction,
            "throughput prediction"
        );
        prediction
    }
}
