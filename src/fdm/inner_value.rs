//! Payoff evaluation on grid points.

use crate::core::OptionType;
use crate::fdm::meshers::{FdmMesherComposite, MeshPoint};

/// Exercise value of the contract at a grid point.
pub trait InnerValueCalculator: Send + Sync {
    /// Value at `point` and time `t`.
    fn inner_value(&self, point: &MeshPoint, t: f64) -> f64;

    /// Value averaged over the grid cell around `point`, used to seed the
    /// terminal condition. Defaults to [`InnerValueCalculator::inner_value`].
    fn avg_inner_value(&self, mesher: &FdmMesherComposite, point: &MeshPoint, t: f64) -> f64 {
        let _ = mesher;
        self.inner_value(point, t)
    }
}

impl<F> InnerValueCalculator for F
where
    F: Fn(&MeshPoint, f64) -> f64 + Send + Sync,
{
    fn inner_value(&self, point: &MeshPoint, t: f64) -> f64 {
        self(point, t)
    }
}

/// Vanilla payoff on `S = e^x`, where `x` is the coordinate along `axis`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VanillaLogInnerValue {
    /// Call or put.
    pub option_type: OptionType,
    /// Strike in spot units.
    pub strike: f64,
    /// Log-spot axis.
    pub axis: usize,
}

impl VanillaLogInnerValue {
    /// Payoff on the log-spot axis `axis`.
    pub fn new(option_type: OptionType, strike: f64, axis: usize) -> Self {
        Self {
            option_type,
            strike,
            axis,
        }
    }

    /// `∫_a^b payoff(e^y) dy`.
    fn integrated_payoff(&self, a: f64, b: f64) -> f64 {
        let k = self.strike;
        let ln_k = k.ln();
        match self.option_type {
            OptionType::Call => {
                let lo = a.max(ln_k);
                if b <= lo {
                    0.0
                } else {
                    b.exp() - lo.exp() - k * (b - lo)
                }
            }
            OptionType::Put => {
                let hi = b.min(ln_k);
                if hi <= a {
                    0.0
                } else {
                    k * (hi - a) - (hi.exp() - a.exp())
                }
            }
        }
    }
}

impl InnerValueCalculator for VanillaLogInnerValue {
    fn inner_value(&self, point: &MeshPoint, _t: f64) -> f64 {
        self.option_type
            .intrinsic(point.locations[self.axis].exp(), self.strike)
    }

    fn avg_inner_value(&self, mesher: &FdmMesherComposite, point: &MeshPoint, t: f64) -> f64 {
        let x = point.locations[self.axis];
        let hm = mesher.dminus(point.index, self.axis);
        let hp = mesher.dplus(point.index, self.axis);
        let a = if hm.is_nan() { x } else { x - 0.5 * hm };
        let b = if hp.is_nan() { x } else { x + 0.5 * hp };
        if b - a <= 0.0 {
            return self.inner_value(point, t);
        }
        self.integrated_payoff(a, b) / (b - a)
    }
}
