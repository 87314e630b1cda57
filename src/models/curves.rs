//! Discount-curve abstraction consumed by the operator coefficients.

/// Continuously compounded discount curve.
///
/// Only [`RateCurve::discount`] is required; forward rates default to finite
/// differences of log-discount factors.
pub trait RateCurve: std::fmt::Debug + Send + Sync {
    /// Discount factor `P(0, t)`.
    fn discount(&self, t: f64) -> f64;

    /// Continuously compounded forward rate over `[t1, t2]`.
    fn forward_rate(&self, t1: f64, t2: f64) -> f64 {
        if (t2 - t1).abs() < 1.0e-12 {
            return self.instantaneous_forward(t1);
        }
        (self.discount(t1).ln() - self.discount(t2).ln()) / (t2 - t1)
    }

    /// Instantaneous forward rate `f(0, t)`.
    fn instantaneous_forward(&self, t: f64) -> f64 {
        const H: f64 = 1.0e-4;
        let t1 = (t - 0.5 * H).max(0.0);
        self.forward_rate(t1, t1 + H)
    }
}

/// Flat continuously compounded rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatRate {
    /// Continuously compounded rate.
    pub rate: f64,
}

impl FlatRate {
    /// Creates a flat curve.
    pub fn new(rate: f64) -> Self {
        Self { rate }
    }
}

impl RateCurve for FlatRate {
    fn discount(&self, t: f64) -> f64 {
        (-self.rate * t).exp()
    }

    fn forward_rate(&self, _t1: f64, _t2: f64) -> f64 {
        self.rate
    }

    fn instantaneous_forward(&self, _t: f64) -> f64 {
        self.rate
    }
}

/// Zero curve with linear interpolation of zero rates and flat extrapolation.
#[derive(Debug, Clone, PartialEq)]
pub struct ZeroCurve {
    times: Vec<f64>,
    zero_rates: Vec<f64>,
}

impl ZeroCurve {
    /// Builds a curve from pillar times and zero rates.
    ///
    /// Returns `None` when the inputs are empty, of different lengths, or the
    /// times are not strictly increasing.
    pub fn new(times: Vec<f64>, zero_rates: Vec<f64>) -> Option<Self> {
        if times.is_empty()
            || times.len() != zero_rates.len()
            || times.windows(2).any(|w| w[1] <= w[0])
        {
            return None;
        }
        Some(Self { times, zero_rates })
    }

    fn zero_rate(&self, t: f64) -> f64 {
        let n = self.times.len();
        if t <= self.times[0] {
            return self.zero_rates[0];
        }
        if t >= self.times[n - 1] {
            return self.zero_rates[n - 1];
        }
        let hi = self.times.partition_point(|x| *x < t);
        let lo = hi - 1;
        let w = (t - self.times[lo]) / (self.times[hi] - self.times[lo]);
        (1.0 - w) * self.zero_rates[lo] + w * self.zero_rates[hi]
    }
}

impl RateCurve for ZeroCurve {
    fn discount(&self, t: f64) -> f64 {
        (-self.zero_rate(t) * t).exp()
    }
}
