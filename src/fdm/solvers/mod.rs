//! Dimensional solvers: seed, roll back and interpolate the grid at `t = 0`.
//!
//! A solver runs its backward march eagerly on construction. The finished
//! object holds only spline data and is `Send + Sync`, so it can be queried
//! from many threads.

pub mod black_scholes;
pub mod desc;
pub mod fdm_1d;
pub mod fdm_2d;
pub mod fdm_3d;
pub mod heston;
pub mod heston_hull_white;

pub use black_scholes::FdmBlackScholesSolver;
pub use desc::FdmSolverDesc;
pub use fdm_1d::Fdm1DimSolver;
pub use fdm_2d::Fdm2DimSolver;
pub use fdm_3d::Fdm3DimSolver;
pub use heston::FdmHestonSolver;
pub use heston_hull_white::FdmHestonHullWhiteSolver;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::core::{FdmError, TIME_TOLERANCE, ensure_size};
use crate::fdm::backward_solver::FdmBackwardSolver;
use crate::fdm::operators::LinearOpComposite;
use crate::fdm::schemes::FdmSchemeDesc;
use crate::fdm::step_conditions::{FdmSnapshotCondition, FdmStepConditionComposite, StepCondition};

/// Grid values at `t = 0` plus the snapshot used for theta.
#[derive(Debug, Clone)]
pub(crate) struct GridValues {
    pub(crate) values: Vec<f64>,
    pub(crate) theta_values: Vec<f64>,
    pub(crate) theta_time: f64,
}

/// Time of the theta snapshot: inside the first day and before the first
/// positive stopping time, so no exercise or dividend event falls between
/// the snapshot and `t = 0`.
pub(crate) fn theta_snapshot_time(maturity: f64, stopping_times: &[f64]) -> f64 {
    let horizon = stopping_times
        .iter()
        .copied()
        .find(|&t| t > TIME_TOLERANCE)
        .map_or(maturity, |first| first.min(maturity));
    0.99 * (1.0 / 365.0_f64).min(horizon)
}

/// Seeds the payoff, rolls back to zero and returns values and the theta snapshot.
pub(crate) fn roll_back_grid(
    desc: FdmSolverDesc,
    scheme: &FdmSchemeDesc,
    op: &mut dyn LinearOpComposite,
    ndim: usize,
) -> Result<GridValues, FdmError> {
    desc.validate(ndim)?;
    scheme.validate()?;
    ensure_size("operator grid", op.mesher().size(), desc.mesher.size())?;

    let FdmSolverDesc {
        mesher,
        mut bc_set,
        condition,
        calculator,
        maturity,
        time_steps,
        damping_steps,
    } = desc;

    let mut values: Vec<f64> = mesher
        .iter()
        .map(|point| calculator.avg_inner_value(&mesher, &point, maturity))
        .collect();

    let theta_time = theta_snapshot_time(maturity, condition.stopping_times());
    let mut conditions: Vec<Box<dyn StepCondition>> =
        vec![Box::new(FdmSnapshotCondition::new(theta_time))];
    conditions.extend(condition.into_conditions());
    let mut condition = FdmStepConditionComposite::from_conditions(conditions);
    debug!(
        grid_size = mesher.size(),
        maturity,
        time_steps,
        damping_steps,
        stopping_times = ?condition.stopping_times(),
        "solving grid"
    );

    FdmBackwardSolver::new(op, &mut bc_set, &mut condition, *scheme).rollback(
        &mut values,
        maturity,
        0.0,
        time_steps,
        damping_steps,
    )?;

    let theta_values = condition
        .snapshot()
        .map(|(_, v)| v.to_vec())
        .ok_or_else(|| FdmError::numerical("theta snapshot was not recorded"))?;

    let non_finite = values.iter().filter(|v| !v.is_finite()).count();
    if non_finite > 0 {
        warn!(non_finite, "grid contains non-finite values at t = 0");
    }

    Ok(GridValues {
        values,
        theta_values,
        theta_time,
    })
}

/// Evaluates `query` at every point, in parallel with the `parallel` feature.
pub fn interpolate_many<P, F>(points: &[P], query: F) -> Result<Vec<f64>, FdmError>
where
    P: Sync,
    F: Fn(&P) -> Result<f64, FdmError> + Sync + Send,
{
    #[cfg(feature = "parallel")]
    let out = points.par_iter().map(&query).collect();
    #[cfg(not(feature = "parallel"))]
    let out = points.iter().map(&query).collect();
    out
}
