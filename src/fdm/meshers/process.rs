//! Axis builders sized from the distribution of a model state variable.

use statrs::distribution::{ContinuousCDF, Gamma, Normal};

use crate::core::FdmError;
use crate::models::processes::ou_variance;
use crate::models::{BlackScholesProcess, HestonProcess};

use super::mesher1d::Fdm1dMesher;

fn inverse_normal(p: f64) -> f64 {
    Normal::standard().inverse_cdf(p)
}

fn check_eps(eps: f64) -> Result<(), FdmError> {
    if eps > 0.0 && eps < 0.5 {
        Ok(())
    } else {
        Err(FdmError::configuration("quantile eps must be in (0, 0.5)"))
    }
}

/// Log-spot axis for a Black-Scholes process.
///
/// Covers `±Φ⁻¹(1-eps)·σ√T·scale` around both today's log-spot and the
/// log-forward at `maturity`, optionally concentrated at `(level, density)`
/// given in spot units.
pub fn black_scholes_log_spot(
    process: &BlackScholesProcess,
    maturity: f64,
    size: usize,
    eps: f64,
    scale: f64,
    concentration: Option<(f64, f64)>,
) -> Result<Fdm1dMesher, FdmError> {
    process.validate()?;
    check_eps(eps)?;
    if !(maturity > 0.0) {
        return Err(FdmError::configuration("maturity must be > 0"));
    }
    let ln_spot = process.spot.ln();
    let ln_fwd = ln_spot
        + (process.dividend.discount(maturity) / process.risk_free.discount(maturity)).ln();
    let half_width = inverse_normal(1.0 - eps) * process.vol * maturity.sqrt() * scale;

    let x_min = ln_spot.min(ln_fwd) - half_width;
    let x_max = ln_spot.max(ln_fwd) + half_width;
    let concentration = match concentration {
        Some((level, density)) if level > 0.0 => Some((level.ln(), density)),
        Some(_) => return Err(FdmError::configuration("concentration level must be > 0")),
        None => None,
    };
    Fdm1dMesher::concentrating(x_min, x_max, size, concentration, concentration.is_some())
}

/// Uniform axis for an Ornstein-Uhlenbeck factor `dx = -a x dt + σ dW`, `x(0) = 0`.
///
/// The window is `±Φ⁻¹(1-eps)` terminal standard deviations wide.
pub fn ornstein_uhlenbeck(
    a: f64,
    sigma: f64,
    maturity: f64,
    size: usize,
    eps: f64,
) -> Result<Fdm1dMesher, FdmError> {
    check_eps(eps)?;
    if !(sigma > 0.0 && maturity > 0.0) {
        return Err(FdmError::configuration(
            "factor volatility and maturity must be > 0",
        ));
    }
    let sd = ou_variance(a, sigma, maturity).sqrt();
    let half_width = inverse_normal(1.0 - eps) * sd;
    Fdm1dMesher::uniform(-half_width, half_width, size)
}

/// Variance axis on `[0, v_max]` for a Heston process, concentrated around `v0`.
///
/// `v_max` is the `1-eps` quantile of a gamma law matching the first two
/// moments of `v(maturity)`, and never below twice the larger of `v0` and `θ`.
pub fn heston_variance(
    process: &HestonProcess,
    maturity: f64,
    size: usize,
    eps: f64,
) -> Result<Fdm1dMesher, FdmError> {
    process.validate()?;
    check_eps(eps)?;
    if !(maturity > 0.0) {
        return Err(FdmError::configuration("maturity must be > 0"));
    }
    let HestonProcess {
        v0,
        kappa,
        theta,
        sigma,
        ..
    } = *process;

    let decay = (-kappa * maturity).exp();
    let mean = theta + (v0 - theta) * decay;
    let var = v0 * sigma * sigma / kappa * (decay - decay * decay)
        + theta * sigma * sigma / (2.0 * kappa) * (1.0 - decay) * (1.0 - decay);

    let quantile = if var > 1.0e-14 && mean > 0.0 {
        let shape = mean * mean / var;
        let rate = mean / var;
        Gamma::new(shape, rate)
            .map_err(|e| FdmError::configuration(format!("variance quantile: {e}")))?
            .inverse_cdf(1.0 - eps)
    } else {
        mean
    };
    let v_max = quantile.max(2.0 * v0.max(theta)).max(1.0e-4);
    let concentration = (v0 > 0.0).then_some((v0, 0.1));
    Fdm1dMesher::concentrating(0.0, v_max, size, concentration, false)
}
