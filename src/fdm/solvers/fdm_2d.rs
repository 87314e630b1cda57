use crate::core::FdmError;
use crate::fdm::operators::LinearOpComposite;
use crate::fdm::schemes::FdmSchemeDesc;
use crate::math::BicubicSpline;

use super::{FdmSolverDesc, roll_back_grid};

/// Solver on a two-dimensional grid; results are bicubic splines in `(x, y)`.
#[derive(Debug, Clone)]
pub struct Fdm2DimSolver {
    values: BicubicSpline,
    theta: BicubicSpline,
    grid_values: Vec<f64>,
    theta_time: f64,
}

impl Fdm2DimSolver {
    /// Rolls the payoff in `desc` back to `t = 0` with `op` and `scheme`.
    pub fn new(
        desc: FdmSolverDesc,
        scheme: FdmSchemeDesc,
        op: &mut dyn LinearOpComposite,
    ) -> Result<Self, FdmError> {
        let (x, y) = match desc.mesher.meshers() {
            [mx, my] => (mx.locations().to_vec(), my.locations().to_vec()),
            _ => {
                return Err(FdmError::configuration(format!(
                    "two-dimensional solver got a {}-dimensional grid",
                    desc.mesher.ndim()
                )));
            }
        };
        let grid = roll_back_grid(desc, &scheme, op, 2)?;
        Ok(Self {
            values: BicubicSpline::new(x.clone(), y.clone(), &grid.values)?,
            theta: BicubicSpline::new(x, y, &grid.theta_values)?,
            grid_values: grid.values,
            theta_time: grid.theta_time,
        })
    }

    /// Allows queries outside the grid rectangle.
    pub fn with_extrapolation(mut self, extrapolate: bool) -> Self {
        self.values = self.values.with_extrapolation(extrapolate);
        self.theta = self.theta.with_extrapolation(extrapolate);
        self
    }

    /// Values on the grid at `t = 0`, `x` fastest.
    pub fn grid_values(&self) -> &[f64] {
        &self.grid_values
    }

    /// Value at `(x, y)`.
    pub fn interpolate_at(&self, x: f64, y: f64) -> Result<f64, FdmError> {
        self.values.value(x, y)
    }

    /// `∂V/∂t` at `(x, y)`.
    pub fn theta_at(&self, x: f64, y: f64) -> Result<f64, FdmError> {
        Ok((self.theta.value(x, y)? - self.values.value(x, y)?) / self.theta_time)
    }

    /// `∂V/∂x`.
    pub fn derivative_x(&self, x: f64, y: f64) -> Result<f64, FdmError> {
        self.values.derivative_x(x, y)
    }

    /// `∂V/∂y`.
    pub fn derivative_y(&self, x: f64, y: f64) -> Result<f64, FdmError> {
        self.values.derivative_y(x, y)
    }

    /// `∂²V/∂x²`.
    pub fn derivative_xx(&self, x: f64, y: f64) -> Result<f64, FdmError> {
        self.values.second_derivative_x(x, y)
    }

    /// `∂²V/∂y²`.
    pub fn derivative_yy(&self, x: f64, y: f64) -> Result<f64, FdmError> {
        self.values.second_derivative_y(x, y)
    }

    /// `∂²V/∂x∂y`.
    pub fn derivative_xy(&self, x: f64, y: f64) -> Result<f64, FdmError> {
        self.values.derivative_xy(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fdm::meshers::{Fdm1dMesher, FdmMesherComposite, MeshPoint};
    use crate::fdm::operators::FdmHestonOp;
    use crate::models::HestonProcess;
    use approx::assert_relative_eq;
    use std::sync::Arc;

    const KAPPA: f64 = 2.0;
    const THETA: f64 = 0.05;

    // a claim paying the variance level: V(v) = θ + (v - θ)e^{-κτ} with zero rates
    fn solve_variance_claim() -> Fdm2DimSolver {
        let mesher = FdmMesherComposite::shared(vec![
            Fdm1dMesher::uniform(3.6, 5.6, 21).unwrap(),
            Fdm1dMesher::uniform(0.0, 0.3, 16).unwrap(),
        ])
        .unwrap();
        let process = HestonProcess::new(100.0, 0.0, 0.0)
            .with_variance_dynamics(0.04, KAPPA, THETA, 0.3, -0.5);
        let mut op = FdmHestonOp::new(Arc::clone(&mesher), process).unwrap();
        let payoff = |p: &MeshPoint, _t: f64| p.locations[1];
        let desc = FdmSolverDesc::new(mesher, Arc::new(payoff), 0.5, 50);
        Fdm2DimSolver::new(desc, FdmSchemeDesc::douglas(), &mut op).unwrap()
    }

    #[test]
    fn variance_claim_reverts_to_the_mean() {
        let solver = solve_variance_claim();
        let decay = (-KAPPA * 0.5_f64).exp();
        for v in [0.02, 0.1, 0.25] {
            assert_relative_eq!(
                solver.interpolate_at(4.6, v).unwrap(),
                THETA + (v - THETA) * decay,
                epsilon = 1.0e-5
            );
        }
        assert_relative_eq!(solver.derivative_y(4.6, 0.1).unwrap(), decay, epsilon = 1.0e-5);
        assert!(solver.derivative_x(4.6, 0.1).unwrap().abs() < 1.0e-8);
        assert!(solver.derivative_xy(4.6, 0.1).unwrap().abs() < 1.0e-8);
        assert_relative_eq!(
            solver.theta_at(4.6, 0.1).unwrap(),
            KAPPA * (0.1 - THETA) * decay,
            max_relative = 1.0e-2
        );
    }

    #[test]
    fn grid_rectangle_bounds_queries() {
        let solver = solve_variance_claim();
        assert!(matches!(solver.interpolate_at(4.6, 0.4), Err(FdmError::Domain(_))));
        assert!(matches!(solver.interpolate_at(3.0, 0.1), Err(FdmError::Domain(_))));
        assert_eq!(solver.grid_values().len(), 21 * 16);
    }
}
