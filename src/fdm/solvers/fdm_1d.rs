use crate::core::FdmError;
use crate::fdm::operators::LinearOpComposite;
use crate::fdm::schemes::FdmSchemeDesc;
use crate::math::CubicNaturalSpline;

use super::{FdmSolverDesc, roll_back_grid};

/// Solver on a one-dimensional grid; results are natural cubic splines in `x`.
#[derive(Debug, Clone)]
pub struct Fdm1DimSolver {
    values: CubicNaturalSpline,
    theta: CubicNaturalSpline,
    theta_time: f64,
}

impl Fdm1DimSolver {
    /// Rolls the payoff in `desc` back to `t = 0` with `op` and `scheme`.
    pub fn new(
        desc: FdmSolverDesc,
        scheme: FdmSchemeDesc,
        op: &mut dyn LinearOpComposite,
    ) -> Result<Self, FdmError> {
        let x = desc.mesher.meshers()[0].locations().to_vec();
        let grid = roll_back_grid(desc, &scheme, op, 1)?;
        Ok(Self {
            values: CubicNaturalSpline::new(x.clone(), grid.values)?,
            theta: CubicNaturalSpline::new(x, grid.theta_values)?,
            theta_time: grid.theta_time,
        })
    }

    /// Allows queries outside the grid.
    pub fn with_extrapolation(mut self, extrapolate: bool) -> Self {
        self.values = self.values.with_extrapolation(extrapolate);
        self.theta = self.theta.with_extrapolation(extrapolate);
        self
    }

    /// Grid coordinates.
    pub fn x(&self) -> &[f64] {
        self.values.x()
    }

    /// Values on the grid at `t = 0`.
    pub fn grid_values(&self) -> &[f64] {
        self.values.y()
    }

    /// Value at `x`.
    pub fn interpolate_at(&self, x: f64) -> Result<f64, FdmError> {
        self.values.value(x)
    }

    /// `∂V/∂t` at `x`, from the snapshot taken just before `t = 0`.
    pub fn theta_at(&self, x: f64) -> Result<f64, FdmError> {
        Ok((self.theta.value(x)? - self.values.value(x)?) / self.theta_time)
    }

    /// `∂V/∂x`.
    pub fn derivative_x(&self, x: f64) -> Result<f64, FdmError> {
        self.values.derivative(x)
    }

    /// `∂²V/∂x²`.
    pub fn derivative_xx(&self, x: f64) -> Result<f64, FdmError> {
        self.values.second_derivative(x)
    }
}
