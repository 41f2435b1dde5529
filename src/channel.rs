//! The channel model is an external oracle: pure,
//! deterministic given its inputs, interior unspecified. `ChannelModel` is
//! the seam; `LogisticChannelModel` is only the ambient default so the
//! daemon is runnable without a real propagation model plugged in.

/// Given SNR, rate index, and payload length, returns an error probability
/// in `[0, 1]`. Implementations must be pure and deterministic.
pub trait ChannelModel: Send + Sync {
    fn error_prob(&self, snr_db: f64, rate_idx: i8, payload_len: usize) -> f64;
}

/// A logistic error curve per rate index, centered on a per-rate SNR
/// threshold: higher rates need more SNR margin to keep the same error
/// rate. This is a stand-in for a measured channel model, not a claim about
/// real hardware.
#[derive(Debug, Clone)]
pub struct LogisticChannelModel {
    /// SNR (dB) at which error probability is 0.5, per rate index.
    thresholds_db: [f64; 8],
    /// Steepness of the logistic curve; larger is a sharper cutoff.
    steepness: f64,
}

impl Default for LogisticChannelModel {
    fn default() -> Self {
        // Roughly spaced 3 dB apart, rising with rate index.
        Self {
            thresholds_db: [2.0, 5.0, 8.0, 11.0, 14.0, 17.0, 20.0, 23.0],
            steepness: 0.8,
        }
    }
}

impl ChannelModel for LogisticChannelModel {
    fn error_prob(&self, snr_db: f64, rate_idx: i8, _payload_len: usize) -> f64 {
        let threshold = match usize::try_from(rate_idx) {
            Ok(idx) => match self.thresholds_db.get(idx) {
                Some(t) => *t,
                None => return 1.0,
            },
            Err(_) => return 1.0,
        };
        let x = self.steepness * (threshold - snr_db);
        1.0 / (1.0 + (-x).exp())
    }
}

/// A fixed-probability model for tests: always returns the configured
/// value regardless of inputs.
#[derive(Debug, Clone, Copy)]
pub struct FixedChannelModel(pub f64);

impl ChannelModel for FixedChannelModel {
    fn error_prob(&self, _snr_db: f64, _rate_idx: i8, _payload_len: usize) -> f64 {
        self.0
    }
}

/// A per-rate-index model for tests that need different attempts to behave
/// differently (e.g. MRR fallback scenarios).
#[derive(Debug, Clone)]
pub struct PerRateChannelModel {
    pub by_rate_idx: std::collections::HashMap<i8, f64>,
    pub default: f64,
}

impl ChannelModel for PerRateChannelModel {
    fn error_prob(&self, _snr_db: f64, rate_idx: i8, _payload_len: usize) -> f64 {
        self.by_rate_idx.get(&rate_idx).copied().unwrap_or(self.default)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn logistic_is_monotonic_in_snr() {
        let model = LogisticChannelModel::default();
        let weak = model.error_prob(-10.0, 0, 100);
        let strong = model.error_prob(40.0, 0, 100);
        assert!(weak > strong);
    }

    #[test]
    fn logistic_out_of_range_index_always_errors() {
        let model = LogisticChannelModel::default();
        assert_eq!(model.error_prob(100.0, 8, 100), 1.0);
    }

    #[test]
    fn fixed_model_ignores_inputs() {
        let model = FixedChannelModel(0.25);
        assert_eq!(model.error_prob(-5.0, 3, 9999), 0.25);
        assert_eq!(model.error_prob(99.0, 0, 1), 0.25);
    }
}
