//! Natural cubic and bicubic splines used to read prices and Greeks off a grid.
//!
//! Both splines reject queries outside the node range unless extrapolation is
//! enabled, in which case the outermost cubic segment is extended.

use crate::core::FdmError;

#[inline]
fn segment(x: &[f64], xq: f64) -> usize {
    let n = x.len();
    x.partition_point(|v| *v <= xq).clamp(1, n - 1) - 1
}

fn validate_nodes(x: &[f64], len: usize) -> Result<(), FdmError> {
    if x.len() != len {
        return Err(FdmError::configuration(
            "spline abscissas and ordinates must have the same length",
        ));
    }
    if x.len() < 2 {
        return Err(FdmError::configuration("spline needs at least two nodes"));
    }
    if x.iter().any(|v| !v.is_finite()) || x.windows(2).any(|w| w[1] <= w[0]) {
        return Err(FdmError::configuration(
            "spline abscissas must be finite and strictly increasing",
        ));
    }
    Ok(())
}

/// Natural cubic spline (`y'' = 0` at both ends).
#[derive(Debug, Clone)]
pub struct CubicNaturalSpline {
    x: Vec<f64>,
    y: Vec<f64>,
    y2: Vec<f64>,
    extrapolate: bool,
}

impl CubicNaturalSpline {
    /// Fits the spline through `(x, y)`.
    ///
    /// Ordinates are not checked for finiteness: non-finite grid values propagate
    /// into the interpolant instead of being masked.
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Result<Self, FdmError> {
        validate_nodes(&x, y.len())?;

        let n = x.len();
        let mut y2 = vec![0.0_f64; n];
        let mut u = vec![0.0_f64; n];

        for i in 1..(n - 1) {
            let sig = (x[i] - x[i - 1]) / (x[i + 1] - x[i - 1]);
            let p = sig.mul_add(y2[i - 1], 2.0);
            y2[i] = (sig - 1.0) / p;
            let ddydx =
                (y[i + 1] - y[i]) / (x[i + 1] - x[i]) - (y[i] - y[i - 1]) / (x[i] - x[i - 1]);
            u[i] = (6.0 * ddydx / (x[i + 1] - x[i - 1]) - sig * u[i - 1]) / p;
        }

        y2[n - 1] = 0.0;
        for k in (0..(n - 1)).rev() {
            y2[k] = y2[k].mul_add(y2[k + 1], u[k]);
        }
        y2[0] = 0.0;

        Ok(Self {
            x,
            y,
            y2,
            extrapolate: false,
        })
    }

    /// Enables or disables evaluation outside `[x_0, x_{n-1}]`.
    pub fn with_extrapolation(mut self, extrapolate: bool) -> Self {
        self.extrapolate = extrapolate;
        self
    }

    /// Node abscissas.
    pub fn x(&self) -> &[f64] {
        &self.x
    }

    /// Node ordinates.
    pub fn y(&self) -> &[f64] {
        &self.y
    }

    fn check_range(&self, xq: f64) -> Result<(), FdmError> {
        let lo = self.x[0];
        let hi = self.x[self.x.len() - 1];
        if !self.extrapolate && !(lo..=hi).contains(&xq) {
            return Err(FdmError::domain(format!(
                "query {xq} outside spline support [{lo}, {hi}]"
            )));
        }
        Ok(())
    }

    #[inline]
    fn weights(&self, xq: f64) -> (usize, f64, f64, f64) {
        let lo = segment(&self.x, xq);
        let h = self.x[lo + 1] - self.x[lo];
        let a = (self.x[lo + 1] - xq) / h;
        let b = (xq - self.x[lo]) / h;
        (lo, h, a, b)
    }

    /// Spline value at `xq`.
    pub fn value(&self, xq: f64) -> Result<f64, FdmError> {
        self.check_range(xq)?;
        let (lo, h, a, b) = self.weights(xq);
        Ok(a * self.y[lo]
            + b * self.y[lo + 1]
            + ((a * a * a - a) * self.y2[lo] + (b * b * b - b) * self.y2[lo + 1]) * (h * h)
                / 6.0)
    }

    /// First derivative at `xq`.
    pub fn derivative(&self, xq: f64) -> Result<f64, FdmError> {
        self.check_range(xq)?;
        let (lo, h, a, b) = self.weights(xq);
        Ok((self.y[lo + 1] - self.y[lo]) / h - (3.0 * a * a - 1.0) / 6.0 * h * self.y2[lo]
            + (3.0 * b * b - 1.0) / 6.0 * h * self.y2[lo + 1])
    }

    /// Second derivative at `xq`.
    pub fn second_derivative(&self, xq: f64) -> Result<f64, FdmError> {
        self.check_range(xq)?;
        let (lo, _, a, b) = self.weights(xq);
        Ok(a * self.y2[lo] + b * self.y2[lo + 1])
    }
}

/// Tensor-product natural cubic spline on a rectangular grid.
///
/// `z` is laid out with `x` varying fastest: `z[i + nx * j] = f(x_i, y_j)`.
#[derive(Debug, Clone)]
pub struct BicubicSpline {
    y: Vec<f64>,
    rows: Vec<CubicNaturalSpline>,
    extrapolate: bool,
}

impl BicubicSpline {
    /// Fits one natural spline per `y` row.
    pub fn new(x: Vec<f64>, y: Vec<f64>, z: &[f64]) -> Result<Self, FdmError> {
        let nx = x.len();
        validate_nodes(&y, y.len())?;
        if z.len() != nx * y.len() {
            return Err(FdmError::configuration(
                "bicubic spline values must have len(x) * len(y) entries",
            ));
        }
        let rows = z
            .chunks(nx)
            .map(|row| CubicNaturalSpline::new(x.clone(), row.to_vec()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            y,
            rows,
            extrapolate: false,
        })
    }

    /// Enables or disables evaluation outside the node rectangle.
    pub fn with_extrapolation(mut self, extrapolate: bool) -> Self {
        self.extrapolate = extrapolate;
        self.rows = self
            .rows
            .into_iter()
            .map(|r| r.with_extrapolation(extrapolate))
            .collect();
        self
    }

    fn column<F>(&self, f: F) -> Result<CubicNaturalSpline, FdmError>
    where
        F: Fn(&CubicNaturalSpline) -> Result<f64, FdmError>,
    {
        let values = self.rows.iter().map(f).collect::<Result<Vec<_>, _>>()?;
        Ok(CubicNaturalSpline::new(self.y.clone(), values)?.with_extrapolation(self.extrapolate))
    }

    /// `f(x, y)`.
    pub fn value(&self, x: f64, y: f64) -> Result<f64, FdmError> {
        self.column(|r| r.value(x))?.value(y)
    }

    /// `∂f/∂x`.
    pub fn derivative_x(&self, x: f64, y: f64) -> Result<f64, FdmError> {
        self.column(|r| r.derivative(x))?.value(y)
    }

    /// `∂f/∂y`.
    pub fn derivative_y(&self, x: f64, y: f64) -> Result<f64, FdmError> {
        self.column(|r| r.value(x))?.derivative(y)
    }

    /// `∂²f/∂x²`.
    pub fn second_derivative_x(&self, x: f64, y: f64) -> Result<f64, FdmError> {
        self.column(|r| r.second_derivative(x))?.value(y)
    }

    /// `∂²f/∂y²`.
    pub fn second_derivative_y(&self, x: f64, y: f64) -> Result<f64, FdmError> {
        self.column(|r| r.value(x))?.second_derivative(y)
    }

    /// `∂²f/∂x∂y`.
    pub fn derivative_xy(&self, x: f64, y: f64) -> Result<f64, FdmError> {
        self.column(|r| r.derivative(x))?.derivative(y)
    }
}
