use crate::core::FdmError;
use crate::fdm::operators::LinearOpComposite;
use crate::fdm::schemes::FdmSchemeDesc;
use crate::math::{BicubicSpline, CubicNaturalSpline};

use super::{FdmSolverDesc, roll_back_grid};

/// One bicubic spline per `z` layer, joined by a natural cubic spline in `z`.
#[derive(Debug, Clone)]
struct LayeredSpline {
    z: Vec<f64>,
    layers: Vec<BicubicSpline>,
    extrapolate: bool,
}

impl LayeredSpline {
    fn new(x: &[f64], y: &[f64], z: Vec<f64>, values: &[f64]) -> Result<Self, FdmError> {
        let layer_size = x.len() * y.len();
        let layers = values
            .chunks(layer_size)
            .map(|layer| BicubicSpline::new(x.to_vec(), y.to_vec(), layer))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            z,
            layers,
            extrapolate: false,
        })
    }

    fn with_extrapolation(self, extrapolate: bool) -> Self {
        Self {
            layers: self
                .layers
                .into_iter()
                .map(|l| l.with_extrapolation(extrapolate))
                .collect(),
            extrapolate,
            ..self
        }
    }

    /// Spline in `z` through one per-layer query at `(x, y)`.
    fn column<F>(&self, f: F) -> Result<CubicNaturalSpline, FdmError>
    where
        F: Fn(&BicubicSpline) -> Result<f64, FdmError>,
    {
        let values = self.layers.iter().map(f).collect::<Result<Vec<_>, _>>()?;
        Ok(CubicNaturalSpline::new(self.z.clone(), values)?.with_extrapolation(self.extrapolate))
    }

    fn value(&self, x: f64, y: f64, z: f64) -> Result<f64, FdmError> {
        self.column(|l| l.value(x, y))?.value(z)
    }
}

/// Solver on a three-dimensional grid.
#[derive(Debug, Clone)]
pub struct Fdm3DimSolver {
    values: LayeredSpline,
    theta: LayeredSpline,
    grid_values: Vec<f64>,
    theta_time: f64,
}

impl Fdm3DimSolver {
    /// Rolls the payoff in `desc` back to `t = 0` with `op` and `scheme`.
    pub fn new(
        desc: FdmSolverDesc,
        scheme: FdmSchemeDesc,
        op: &mut dyn LinearOpComposite,
    ) -> Result<Self, FdmError> {
        let (x, y, z) = match desc.mesher.meshers() {
            [mx, my, mz] => (
                mx.locations().to_vec(),
                my.locations().to_vec(),
                mz.locations().to_vec(),
            ),
            _ => {
                return Err(FdmError::configuration(format!(
                    "three-dimensional solver got a {}-dimensional grid",
                    desc.mesher.ndim()
                )));
            }
        };
        let grid = roll_back_grid(desc, &scheme, op, 3)?;
        Ok(Self {
            values: LayeredSpline::new(&x, &y, z.clone(), &grid.values)?,
            theta: LayeredSpline::new(&x, &y, z, &grid.theta_values)?,
            grid_values: grid.values,
            theta_time: grid.theta_time,
        })
    }

    /// Allows queries outside the grid box.
    pub fn with_extrapolation(mut self, extrapolate: bool) -> Self {
        self.values = self.values.with_extrapolation(extrapolate);
        self.theta = self.theta.with_extrapolation(extrapolate);
        self
    }

    /// Values on the grid at `t = 0`, `x` fastest then `y`.
    pub fn grid_values(&self) -> &[f64] {
        &self.grid_values
    }

    /// Value at `(x, y, z)`.
    pub fn interpolate_at(&self, x: f64, y: f64, z: f64) -> Result<f64, FdmError> {
        self.values.value(x, y, z)
    }

    /// `∂V/∂t` at `(x, y, z)`.
    pub fn theta_at(&self, x: f64, y: f64, z: f64) -> Result<f64, FdmError> {
        Ok((self.theta.value(x, y, z)? - self.values.value(x, y, z)?) / self.theta_time)
    }

    /// `∂V/∂x`.
    pub fn derivative_x(&self, x: f64, y: f64, z: f64) -> Result<f64, FdmError> {
        self.values.column(|l| l.derivative_x(x, y))?.value(z)
    }

    /// `∂V/∂y`.
    pub fn derivative_y(&self, x: f64, y: f64, z: f64) -> Result<f64, FdmError> {
        self.values.column(|l| l.derivative_y(x, y))?.value(z)
    }

    /// `∂V/∂z`.
    pub fn derivative_z(&self, x: f64, y: f64, z: f64) -> Result<f64, FdmError> {
        self.values.column(|l| l.value(x, y))?.derivative(z)
    }

    /// `∂²V/∂x²`.
    pub fn derivative_xx(&self, x: f64, y: f64, z: f64) -> Result<f64, FdmError> {
        self.values
            .column(|l| l.second_derivative_x(x, y))?
            .value(z)
    }

    /// `∂²V/∂y²`.
    pub fn derivative_yy(&self, x: f64, y: f64, z: f64) -> Result<f64, FdmError> {
        self.values
            .column(|l| l.second_derivative_y(x, y))?
            .value(z)
    }

    /// `∂²V/∂z²`.
    pub fn derivative_zz(&self, x: f64, y: f64, z: f64) -> Result<f64, FdmError> {
        self.values.column(|l| l.value(x, y))?.second_derivative(z)
    }
}
