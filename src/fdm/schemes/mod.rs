//! Time-stepping schemes advancing the value array one step backward in time.
//!
//! A scheme borrows the operator and the boundary-condition set for the
//! duration of a rollback. [`FdmSchemeDesc`] is the serialisable description
//! from which [`build_scheme`] creates one.

mod craig_sneyd;
mod crank_nicolson;
mod douglas;
mod explicit_euler;
mod hundsdorfer;
mod implicit_euler;
mod method_of_lines;
mod modified_craig_sneyd;

pub use craig_sneyd::CraigSneydScheme;
pub use crank_nicolson::CrankNicolsonScheme;
pub use douglas::DouglasScheme;
pub use explicit_euler::ExplicitEulerScheme;
pub use hundsdorfer::HundsdorferScheme;
pub use implicit_euler::ImplicitEulerScheme;
pub use method_of_lines::MethodOfLinesScheme;
pub use modified_craig_sneyd::ModifiedCraigSneydScheme;

use serde::{Deserialize, Serialize};

use crate::core::{FdmError, TIME_TOLERANCE, ensure_size};
use crate::fdm::boundary::FdmBoundaryConditionSet;
use crate::fdm::operators::LinearOpComposite;

/// A backward time-stepping scheme.
pub trait FdmScheme {
    /// Sets the step size used by subsequent calls to [`FdmScheme::step`].
    fn set_step(&mut self, dt: f64);

    /// Advances `a` from time `t` to `t - dt`.
    fn step(&mut self, a: &mut [f64], t: f64) -> Result<(), FdmError>;
}

/// Scheme family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemeKind {
    /// Douglas ADI.
    Douglas,
    /// Craig-Sneyd ADI.
    CraigSneyd,
    /// Modified Craig-Sneyd ADI.
    ModifiedCraigSneyd,
    /// Hundsdorfer-Verwer ADI.
    Hundsdorfer,
    /// Hundsdorfer-Verwer with `θ = 1 − √2/2`.
    ModifiedHundsdorfer,
    /// Forward Euler.
    ExplicitEuler,
    /// Backward Euler.
    ImplicitEuler,
    /// Theta-weighted Crank-Nicolson.
    CrankNicolson,
    /// Adaptive Runge-Kutta on the semi-discrete system.
    MethodOfLines,
}

/// Scheme family plus its two parameters.
///
/// For [`SchemeKind::MethodOfLines`], `theta` holds the integrator accuracy and
/// `mu` the initial step relative to `dt`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FdmSchemeDesc {
    /// Scheme family.
    pub kind: SchemeKind,
    /// Implicitness weight.
    pub theta: f64,
    /// Weight of the corrector stage.
    pub mu: f64,
}

impl Default for FdmSchemeDesc {
    fn default() -> Self {
        Self::douglas()
    }
}

impl FdmSchemeDesc {
    /// Douglas, `θ = ½`.
    pub fn douglas() -> Self {
        Self {
            kind: SchemeKind::Douglas,
            theta: 0.5,
            mu: 0.0,
        }
    }

    /// Craig-Sneyd, `θ = μ = ½`.
    pub fn craig_sneyd() -> Self {
        Self {
            kind: SchemeKind::CraigSneyd,
            theta: 0.5,
            mu: 0.5,
        }
    }

    /// Modified Craig-Sneyd, `θ = μ = ⅓`.
    pub fn modified_craig_sneyd() -> Self {
        Self {
            kind: SchemeKind::ModifiedCraigSneyd,
            theta: 1.0 / 3.0,
            mu: 1.0 / 3.0,
        }
    }

    /// Hundsdorfer-Verwer, `θ = ½ + √3/6`, `μ = ½`.
    pub fn hundsdorfer() -> Self {
        Self {
            kind: SchemeKind::Hundsdorfer,
            theta: 0.5 + 3.0_f64.sqrt() / 6.0,
            mu: 0.5,
        }
    }

    /// Hundsdorfer-Verwer, `θ = 1 − √2/2`, `μ = ½`.
    pub fn modified_hundsdorfer() -> Self {
        Self {
            kind: SchemeKind::ModifiedHundsdorfer,
            theta: 1.0 - 2.0_f64.sqrt() / 2.0,
            mu: 0.5,
        }
    }

    /// Forward Euler.
    pub fn explicit_euler() -> Self {
        Self {
            kind: SchemeKind::ExplicitEuler,
            theta: 0.0,
            mu: 0.0,
        }
    }

    /// Backward Euler.
    pub fn implicit_euler() -> Self {
        Self {
            kind: SchemeKind::ImplicitEuler,
            theta: 0.0,
            mu: 0.0,
        }
    }

    /// Crank-Nicolson, `θ = ½`.
    pub fn crank_nicolson() -> Self {
        Self {
            kind: SchemeKind::CrankNicolson,
            theta: 0.5,
            mu: 0.0,
        }
    }

    /// Method of lines with accuracy `1e-3` and initial step `1e-3·dt`.
    pub fn method_of_lines() -> Self {
        Self::method_of_lines_with(1.0e-3, 1.0e-3)
    }

    /// Method of lines with explicit accuracy and relative initial step.
    pub fn method_of_lines_with(eps: f64, rel_init_step: f64) -> Self {
        Self {
            kind: SchemeKind::MethodOfLines,
            theta: eps,
            mu: rel_init_step,
        }
    }

    /// Overrides `θ`.
    pub fn with_theta(mut self, theta: f64) -> Self {
        self.theta = theta;
        self
    }

    /// Overrides `μ`.
    pub fn with_mu(mut self, mu: f64) -> Self {
        self.mu = mu;
        self
    }

    /// Validates the parameters for the scheme family.
    pub fn validate(&self) -> Result<(), FdmError> {
        if !(self.theta.is_finite() && self.mu.is_finite()) {
            return Err(FdmError::configuration("scheme parameters must be finite"));
        }
        match self.kind {
            SchemeKind::MethodOfLines => {
                if self.theta <= 0.0 || self.mu <= 0.0 {
                    return Err(FdmError::configuration(
                        "method of lines needs eps > 0 and a positive initial step",
                    ));
                }
            }
            SchemeKind::ExplicitEuler | SchemeKind::ImplicitEuler => {}
            _ => {
                if !(0.0..=1.0).contains(&self.theta) {
                    return Err(FdmError::configuration(format!(
                        "theta must be in [0, 1], got {}",
                        self.theta
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Creates the scheme described by `desc` over `map` and `bc_set`.
pub fn build_scheme<'a>(
    desc: &FdmSchemeDesc,
    map: &'a mut dyn LinearOpComposite,
    bc_set: &'a mut FdmBoundaryConditionSet,
) -> Result<Box<dyn FdmScheme + 'a>, FdmError> {
    desc.validate()?;
    bc_set.check_grid_size(map.mesher().size())?;
    Ok(match desc.kind {
        SchemeKind::Douglas => Box::new(DouglasScheme::new(desc.theta, map, bc_set)),
        SchemeKind::CraigSneyd => {
            Box::new(CraigSneydScheme::new(desc.theta, desc.mu, map, bc_set))
        }
        SchemeKind::ModifiedCraigSneyd => {
            Box::new(ModifiedCraigSneydScheme::new(desc.theta, desc.mu, map, bc_set))
        }
        SchemeKind::Hundsdorfer | SchemeKind::ModifiedHundsdorfer => {
            Box::new(HundsdorferScheme::new(desc.theta, desc.mu, map, bc_set))
        }
        SchemeKind::ExplicitEuler => Box::new(ExplicitEulerScheme::new(map, bc_set)),
        SchemeKind::ImplicitEuler => Box::new(ImplicitEulerScheme::new(map, bc_set)),
        SchemeKind::CrankNicolson => Box::new(CrankNicolsonScheme::new(desc.theta, map, bc_set)),
        SchemeKind::MethodOfLines => {
            Box::new(MethodOfLinesScheme::new(desc.theta, desc.mu, map, bc_set))
        }
    })
}

/// Validates the step and moves operator and boundary conditions to `[t - dt, t]`.
pub(crate) fn begin_step(
    map: &mut dyn LinearOpComposite,
    bc_set: &mut FdmBoundaryConditionSet,
    a: &[f64],
    t: f64,
    dt: f64,
) -> Result<(), FdmError> {
    if t - dt < -TIME_TOLERANCE {
        return Err(FdmError::numerical(format!(
            "a step of {dt} from t={t} passes the valuation date"
        ))
        .at_time(t));
    }
    ensure_size("value array", a.len(), map.mesher().size())?;
    let t0 = (t - dt).max(0.0);
    map.set_time(t0, t)?;
    bc_set.set_time(t0);
    Ok(())
}

/// End of the previous step; a march may not skip part of the time axis.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct StepClock {
    expected: Option<f64>,
}

impl StepClock {
    /// Fails unless `t` is the end of the previous step.
    ///
    /// Starting below it skips part of the march; starting above it steps
    /// back over time already committed.
    pub(crate) fn check(&self, t: f64) -> Result<(), FdmError> {
        match self.expected {
            Some(expected) if t < expected - TIME_TOLERANCE => Err(FdmError::numerical(format!(
                "step from t={t} skips the interval below the previous step end t={expected}"
            ))
            .at_time(t)),
            Some(expected) if t > expected + TIME_TOLERANCE => Err(FdmError::numerical(format!(
                "step from t={t} starts later than the last committed time t={expected}"
            ))
            .at_time(t)),
            _ => Ok(()),
        }
    }

    /// Records a completed step from `t` of size `dt`.
    pub(crate) fn advance(&mut self, t: f64, dt: f64) {
        self.expected = Some(t - dt);
    }
}

/// `out = x + s·y`.
#[inline]
pub(crate) fn axpy(x: &[f64], s: f64, y: &[f64]) -> Vec<f64> {
    x.iter().zip(y).map(|(xi, yi)| xi + s * yi).collect()
}

/// `x - y`.
#[inline]
pub(crate) fn diff(x: &[f64], y: &[f64]) -> Vec<f64> {
    x.iter().zip(y).map(|(xi, yi)| xi - yi).collect()
}

/// One implicit sweep per axis: `y ← (I − θdt·L_i)⁻¹ (y − θdt·L_i(base))`.
pub(crate) fn directional_sweeps(
    map: &dyn LinearOpComposite,
    mut y: Vec<f64>,
    base: &[f64],
    theta_dt: f64,
) -> Result<Vec<f64>, FdmError> {
    for axis in 0..map.mesher().ndim() {
        let rhs = axpy(&y, -theta_dt, &map.apply_direction(axis, base)?);
        y = map.solve_splitting(axis, &rhs, -theta_dt)?;
    }
    Ok(y)
}

/// Explicit Euler step with weight `theta`.
pub(crate) fn explicit_step(
    map: &mut dyn LinearOpComposite,
    bc_set: &mut FdmBoundaryConditionSet,
    a: &mut [f64],
    t: f64,
    dt: f64,
    theta: f64,
) -> Result<(), FdmError> {
    begin_step(map, bc_set, a, t, dt)?;
    bc_set.apply_before_applying(map);
    let la = map.apply(a)?;
    for (ai, li) in a.iter_mut().zip(&la) {
        *ai += theta * dt * li;
    }
    bc_set.apply_after_applying(a);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fdm::meshers::{Fdm1dMesher, FdmMesherComposite};
    use crate::fdm::operators::FdmBlackScholesOp;
    use crate::models::BlackScholesProcess;

    fn driftless_op() -> FdmBlackScholesOp {
        let mesher =
            FdmMesherComposite::shared(vec![Fdm1dMesher::uniform(3.0, 6.0, 31).unwrap()]).unwrap();
        FdmBlackScholesOp::new(mesher, BlackScholesProcess::new(100.0, 0.0, 0.0, 0.2), 0).unwrap()
    }

    fn all_schemes() -> Vec<FdmSchemeDesc> {
        vec![
            FdmSchemeDesc::douglas(),
            FdmSchemeDesc::craig_sneyd(),
            FdmSchemeDesc::modified_craig_sneyd(),
            FdmSchemeDesc::hundsdorfer(),
            FdmSchemeDesc::modified_hundsdorfer(),
            FdmSchemeDesc::explicit_euler(),
            FdmSchemeDesc::implicit_euler(),
            FdmSchemeDesc::crank_nicolson(),
            FdmSchemeDesc::method_of_lines(),
        ]
    }

    #[test]
    fn every_scheme_preserves_constants_without_discounting() {
        for desc in all_schemes() {
            let mut op = driftless_op();
            let mut bcs = FdmBoundaryConditionSet::new();
            let mut scheme = build_scheme(&desc, &mut op, &mut bcs).unwrap();
            scheme.set_step(0.1);
            let mut a = vec![3.0; 31];
            scheme.step(&mut a, 1.0).unwrap();
            for v in &a {
                assert!((v - 3.0).abs() < 1.0e-9, "{:?}: {v}", desc.kind);
            }
        }
    }

    #[test]
    fn stepping_past_the_valuation_date_fails() {
        let mut op = driftless_op();
        let mut bcs = FdmBoundaryConditionSet::new();
        let mut scheme = build_scheme(&FdmSchemeDesc::douglas(), &mut op, &mut bcs).unwrap();
        scheme.set_step(0.5);
        let mut a = vec![1.0; 31];
        let err = scheme.step(&mut a, 0.25).unwrap_err();
        assert!(matches!(err, FdmError::Numerical { time: Some(t), .. } if t == 0.25));
    }

    #[test]
    fn skipping_part_of_the_march_fails() {
        let mut op = driftless_op();
        let mut bcs = FdmBoundaryConditionSet::new();
        let mut scheme = build_scheme(&FdmSchemeDesc::craig_sneyd(), &mut op, &mut bcs).unwrap();
        scheme.set_step(0.1);
        let mut a = vec![1.0; 31];
        scheme.step(&mut a, 1.0).unwrap();
        scheme.step(&mut a, 0.9).unwrap();
        let err = scheme.step(&mut a, 0.5).unwrap_err();
        assert!(matches!(err, FdmError::Numerical { time: Some(t), .. } if t == 0.5));
    }

    #[test]
    fn stepping_back_up_in_time_fails() {
        let mut op = driftless_op();
        let mut bcs = FdmBoundaryConditionSet::new();
        let mut scheme = build_scheme(&FdmSchemeDesc::douglas(), &mut op, &mut bcs).unwrap();
        scheme.set_step(0.1);
        let mut a = vec![1.0; 31];
        scheme.step(&mut a, 0.5).unwrap();
        let err = scheme.step(&mut a, 2.0).unwrap_err();
        assert!(matches!(err, FdmError::Numerical { time: Some(t), .. } if t == 2.0));
        scheme.step(&mut a, 0.4).unwrap();
    }

    #[test]
    fn value_array_size_is_checked() {
        let mut op = driftless_op();
        let mut bcs = FdmBoundaryConditionSet::new();
        let mut scheme = build_scheme(&FdmSchemeDesc::implicit_euler(), &mut op, &mut bcs).unwrap();
        scheme.set_step(0.1);
        let mut a = vec![1.0; 30];
        assert!(scheme.step(&mut a, 1.0).is_err());
    }

    #[test]
    fn presets_carry_documented_parameters() {
        let hv = FdmSchemeDesc::hundsdorfer();
        assert!((hv.theta - 0.788_675_134_594_812_9).abs() < 1.0e-15);
        assert_eq!(FdmSchemeDesc::default(), FdmSchemeDesc::douglas());
        let mol = FdmSchemeDesc::method_of_lines();
        assert_eq!((mol.theta, mol.mu), (1.0e-3, 1.0e-3));
        assert_eq!(FdmSchemeDesc::craig_sneyd().with_mu(0.25).mu, 0.25);
    }

    #[test]
    fn validation_rejects_out_of_range_theta() {
        assert!(FdmSchemeDesc::douglas().with_theta(1.5).validate().is_err());
        assert!(FdmSchemeDesc::method_of_lines_with(0.0, 1.0e-3).validate().is_err());
        assert!(FdmSchemeDesc::implicit_euler().validate().is_ok());
    }

    #[test]
    fn desc_round_trips_through_json() {
        let desc = FdmSchemeDesc::modified_craig_sneyd();
        let json = serde_json::to_string(&desc).unwrap();
        let back: FdmSchemeDesc = serde_json::from_str(&json).unwrap();
        assert_eq!(back, desc);
    }
}
