//! Parameter sets for the diffusion models whose backward PDEs the engine solves.
//!
//! These are thin carriers of drift/diffusion inputs; calibration and path
//! simulation live elsewhere.

use std::fmt;
use std::sync::Arc;

use crate::core::FdmError;

use super::curves::{FlatRate, RateCurve};

/// Local volatility `σ(t, S)`.
pub trait LocalVolSurface: Send + Sync {
    /// Local volatility at time `t` and spot level `spot`.
    fn local_vol(&self, t: f64, spot: f64) -> f64;
}

impl<F> LocalVolSurface for F
where
    F: Fn(f64, f64) -> f64 + Send + Sync,
{
    fn local_vol(&self, t: f64, spot: f64) -> f64 {
        self(t, spot)
    }
}

fn check(cond: bool, msg: &str) -> Result<(), FdmError> {
    if cond {
        Ok(())
    } else {
        Err(FdmError::configuration(msg))
    }
}

/// Geometric Brownian motion `dS = (r - q) S dt + σ(t, S) S dW`.
#[derive(Clone)]
pub struct BlackScholesProcess {
    /// Spot level.
    pub spot: f64,
    /// Risk-free curve.
    pub risk_free: Arc<dyn RateCurve>,
    /// Dividend-yield curve.
    pub dividend: Arc<dyn RateCurve>,
    /// Constant volatility, used when no local volatility is set and for grid sizing.
    pub vol: f64,
    /// Optional local volatility surface.
    pub local_vol: Option<Arc<dyn LocalVolSurface>>,
}

impl fmt::Debug for BlackScholesProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlackScholesProcess")
            .field("spot", &self.spot)
            .field("risk_free", &self.risk_free)
            .field("dividend", &self.dividend)
            .field("vol", &self.vol)
            .field("local_vol", &self.local_vol.is_some())
            .finish()
    }
}

impl BlackScholesProcess {
    /// Flat-rate, constant-volatility process.
    pub fn new(spot: f64, rate: f64, dividend_yield: f64, vol: f64) -> Self {
        Self {
            spot,
            risk_free: Arc::new(FlatRate::new(rate)),
            dividend: Arc::new(FlatRate::new(dividend_yield)),
            vol,
            local_vol: None,
        }
    }

    /// Replaces both discount curves.
    pub fn with_curves(
        mut self,
        risk_free: Arc<dyn RateCurve>,
        dividend: Arc<dyn RateCurve>,
    ) -> Self {
        self.risk_free = risk_free;
        self.dividend = dividend;
        self
    }

    /// Installs a local volatility surface.
    pub fn with_local_vol(mut self, surface: Arc<dyn LocalVolSurface>) -> Self {
        self.local_vol = Some(surface);
        self
    }

    /// Validates spot and volatility.
    pub fn validate(&self) -> Result<(), FdmError> {
        check(self.spot.is_finite() && self.spot > 0.0, "spot must be finite and > 0")?;
        check(
            self.vol.is_finite() && self.vol > 0.0,
            "volatility must be finite and > 0",
        )
    }
}

/// Heston stochastic volatility `dv = κ(θ - v) dt + σ √v dW_v`, `d⟨W_S, W_v⟩ = ρ dt`.
#[derive(Debug, Clone)]
pub struct HestonProcess {
    /// Spot level.
    pub spot: f64,
    /// Risk-free curve.
    pub risk_free: Arc<dyn RateCurve>,
    /// Dividend-yield curve.
    pub dividend: Arc<dyn RateCurve>,
    /// Initial variance.
    pub v0: f64,
    /// Mean reversion speed.
    pub kappa: f64,
    /// Long-run variance.
    pub theta: f64,
    /// Volatility of variance.
    pub sigma: f64,
    /// Spot/variance correlation.
    pub rho: f64,
}

impl HestonProcess {
    /// Flat-rate process with the given variance dynamics.
    pub fn new(spot: f64, rate: f64, dividend_yield: f64) -> Self {
        Self {
            spot,
            risk_free: Arc::new(FlatRate::new(rate)),
            dividend: Arc::new(FlatRate::new(dividend_yield)),
            v0: 0.04,
            kappa: 1.0,
            theta: 0.04,
            sigma: 0.3,
            rho: -0.5,
        }
    }

    /// Sets `(v0, κ, θ, σ, ρ)`.
    pub fn with_variance_dynamics(
        mut self,
        v0: f64,
        kappa: f64,
        theta: f64,
        sigma: f64,
        rho: f64,
    ) -> Self {
        self.v0 = v0;
        self.kappa = kappa;
        self.theta = theta;
        self.sigma = sigma;
        self.rho = rho;
        self
    }

    /// Validates the parameter set.
    pub fn validate(&self) -> Result<(), FdmError> {
        check(self.spot.is_finite() && self.spot > 0.0, "spot must be finite and > 0")?;
        check(self.v0 >= 0.0 && self.theta >= 0.0, "variances must be >= 0")?;
        check(self.kappa > 0.0, "kappa must be > 0")?;
        check(self.sigma >= 0.0, "vol of variance must be >= 0")?;
        check(self.rho > -1.0 && self.rho < 1.0, "rho must be in (-1, 1)")
    }
}

/// Hull-White short rate `r(t) = x(t) + φ(t)`, `dx = -a x dt + σ dW`, fitted to `curve`.
#[derive(Debug, Clone)]
pub struct HullWhiteProcess {
    /// Initial term structure.
    pub curve: Arc<dyn RateCurve>,
    /// Mean reversion.
    pub a: f64,
    /// Short-rate volatility.
    pub sigma: f64,
}

impl HullWhiteProcess {
    /// Creates a process fitted to `curve`.
    pub fn new(curve: Arc<dyn RateCurve>, a: f64, sigma: f64) -> Self {
        Self { curve, a, sigma }
    }

    /// Deterministic shift `φ(t) = f(0,t) + σ²/(2a²)(1 - e^{-at})²`.
    pub fn phi(&self, t: f64) -> f64 {
        let b = bond_b(self.a, t);
        self.curve.instantaneous_forward(t) + 0.5 * self.sigma * self.sigma * b * b
    }

    /// Variance of `x(t)` given `x(0) = 0`.
    pub fn x_variance(&self, t: f64) -> f64 {
        ou_variance(self.a, self.sigma, t)
    }

    /// Validates the parameter set.
    pub fn validate(&self) -> Result<(), FdmError> {
        check(self.a.is_finite() && self.a > 0.0, "mean reversion must be > 0")?;
        check(self.sigma.is_finite() && self.sigma > 0.0, "rate volatility must be > 0")
    }
}

/// Two-factor Gaussian model `r = x + y + φ(t)`.
#[derive(Debug, Clone)]
pub struct G2Process {
    /// Initial term structure.
    pub curve: Arc<dyn RateCurve>,
    /// Mean reversion of `x`.
    pub a: f64,
    /// Volatility of `x`.
    pub sigma: f64,
    /// Mean reversion of `y`.
    pub b: f64,
    /// Volatility of `y`.
    pub eta: f64,
    /// Correlation of the two factors.
    pub rho: f64,
}

impl G2Process {
    /// Deterministic shift fitting the initial curve.
    pub fn phi(&self, t: f64) -> f64 {
        let ba = bond_b(self.a, t);
        let bb = bond_b(self.b, t);
        self.curve.instantaneous_forward(t)
            + 0.5 * self.sigma * self.sigma * ba * ba
            + 0.5 * self.eta * self.eta * bb * bb
            + self.rho * self.sigma * self.eta * ba * bb
    }

    /// Validates the parameter set.
    pub fn validate(&self) -> Result<(), FdmError> {
        check(self.a > 0.0 && self.b > 0.0, "mean reversions must be > 0")?;
        check(self.sigma > 0.0 && self.eta > 0.0, "factor volatilities must be > 0")?;
        check(self.rho > -1.0 && self.rho < 1.0, "rho must be in (-1, 1)")
    }
}

/// Constant elasticity of variance forward `dF = α F^β dW`, discounted at `rate`.
#[derive(Debug, Clone)]
pub struct CevProcess {
    /// Forward level.
    pub forward: f64,
    /// Volatility level.
    pub alpha: f64,
    /// Elasticity.
    pub beta: f64,
    /// Discount curve.
    pub risk_free: Arc<dyn RateCurve>,
}

impl CevProcess {
    /// Flat-rate CEV process.
    pub fn new(forward: f64, alpha: f64, beta: f64, rate: f64) -> Self {
        Self {
            forward,
            alpha,
            beta,
            risk_free: Arc::new(FlatRate::new(rate)),
        }
    }

    /// Validates the parameter set.
    pub fn validate(&self) -> Result<(), FdmError> {
        check(self.forward > 0.0, "forward must be > 0")?;
        check(self.alpha > 0.0, "alpha must be > 0")?;
        check(self.beta.is_finite(), "beta must be finite")
    }
}

/// `(1 - e^{-at}) / a`, with the `a → 0` limit.
#[inline]
fn bond_b(a: f64, t: f64) -> f64 {
    if a.abs() < 1.0e-12 {
        t
    } else {
        (1.0 - (-a * t).exp()) / a
    }
}

/// Variance at `t` of an Ornstein-Uhlenbeck process started at a point.
#[inline]
pub(crate) fn ou_variance(a: f64, sigma: f64, t: f64) -> f64 {
    if a.abs() < 1.0e-12 {
        sigma * sigma * t
    } else {
        0.5 * sigma * sigma / a * (1.0 - (-2.0 * a * t).exp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn hull_white_phi_starts_on_curve() {
        let hw = HullWhiteProcess::new(Arc::new(FlatRate::new(0.02)), 0.1, 0.01);
        assert_relative_eq!(hw.phi(0.0), 0.02, epsilon = 1.0e-12);
        assert!(hw.phi(5.0) > 0.02);
        assert_relative_eq!(
            hw.x_variance(1.0),
            0.5 * 1.0e-4 / 0.1 * (1.0 - (-0.2_f64).exp()),
            epsilon = 1.0e-15
        );
    }

    #[test]
    fn heston_validation_rejects_bad_correlation() {
        let p = HestonProcess::new(100.0, 0.0, 0.0)
            .with_variance_dynamics(0.04, 1.0, 0.04, 0.3, 1.0);
        assert!(matches!(p.validate(), Err(FdmError::Configuration(_))));
    }

    #[test]
    fn closures_are_local_vol_surfaces() {
        let lv = |_t: f64, s: f64| 0.2 * (100.0 / s).sqrt();
        assert_relative_eq!(lv.local_vol(0.5, 100.0), 0.2, epsilon = 1.0e-15);
    }
}
