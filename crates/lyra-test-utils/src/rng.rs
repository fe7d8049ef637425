//! Deterministic throughput traces for reproducible property tests.

/// xorshift64 generator for synthetic throughput histories.
///
/// A fixed seed yields identical traces on every run.
pub struct TraceRng(u64);

impl TraceRng {
    /// `seed` must be non-zero; zero is replaced by a fixed constant.
    pub fn new(seed: u64) -> Self {
        Self(if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed })
    }

    pub fn next_u64(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }

    /// Uniform in `[0, 1)`.
    #[expect(clippy::cast_precision_loss)]
    pub fn unit(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1_u64 << 53) as f64
    }

    /// Uniform in `[min, max)`.
    pub fn kbps(&mut self, min: f64, max: f64) -> f64 {
        min + (max - min) * self.unit()
    }

    /// `len` throughput samples in `[min, max)` kbps, each replaced by zero
    /// with probability `zero_ratio`.
    pub fn history(&mut self, len: usize, min: f64, max: f64, zero_ratio: f64) -> Vec<f64> {
        (0..len)
            .map(|_| {
                let sample = self.kbps(min, max);
                if self.unit() < zero_ratio { 0.0 } else { sample }
            })
            .collect()
    }

    /// Per-fetch link throughput for a `ThroughputTrace::Cycle`.
    pub fn link_trace(&mut self, len: usize, min: f64, max: f64) -> Vec<f64> {
        self.history(len, min, max, 0.0)
    }
}
