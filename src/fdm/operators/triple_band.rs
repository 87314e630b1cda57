//! Tridiagonal operator acting along one grid axis.

use std::sync::Arc;

use nalgebra::DMatrix;

use crate::core::{FdmError, ensure_size};
use crate::fdm::meshers::FdmMesherComposite;
use crate::math::TridiagonalWorkspace;

/// Banded operator coupling each point to its two neighbours along `direction`.
///
/// Row `i` computes `lower[i]·u[i0[i]] + diag[i]·u[i] + upper[i]·u[i2[i]]`,
/// where `i0`/`i2` are the reflected neighbours of `i`.
#[derive(Debug, Clone)]
pub struct TripleBandLinearOp {
    direction: usize,
    mesher: Arc<FdmMesherComposite>,
    i0: Arc<[usize]>,
    i2: Arc<[usize]>,
    pub(super) lower: Vec<f64>,
    pub(super) diag: Vec<f64>,
    pub(super) upper: Vec<f64>,
}

/// Broadcasts a scalar-or-vector coefficient.
#[inline]
pub(super) fn coeff(values: &[f64], i: usize) -> f64 {
    match values.len() {
        0 => 0.0,
        1 => values[0],
        _ => values[i],
    }
}

pub(super) fn check_coeff_len(what: &str, values: &[f64], n: usize) -> Result<(), FdmError> {
    if values.len() > 1 {
        ensure_size(what, values.len(), n)?;
    }
    Ok(())
}

impl TripleBandLinearOp {
    /// Zero operator along `direction`.
    pub fn new(direction: usize, mesher: Arc<FdmMesherComposite>) -> Result<Self, FdmError> {
        mesher.check_axis(direction)?;
        let layout = mesher.layout();
        let n = layout.size();
        let mut i0 = Vec::with_capacity(n);
        let mut i2 = Vec::with_capacity(n);
        for (_, coords) in layout.iter() {
            i0.push(layout.neighbourhood(&coords, direction, -1));
            i2.push(layout.neighbourhood(&coords, direction, 1));
        }
        Ok(Self {
            direction,
            mesher,
            i0: i0.into(),
            i2: i2.into(),
            lower: vec![0.0; n],
            diag: vec![0.0; n],
            upper: vec![0.0; n],
        })
    }

    /// Axis the operator acts along.
    pub fn direction(&self) -> usize {
        self.direction
    }

    /// Shared grid.
    pub fn mesher(&self) -> &Arc<FdmMesherComposite> {
        &self.mesher
    }

    /// Number of rows.
    pub fn size(&self) -> usize {
        self.diag.len()
    }

    /// Sub-diagonal coefficients.
    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    /// Diagonal coefficients.
    pub fn diag(&self) -> &[f64] {
        &self.diag
    }

    /// Super-diagonal coefficients.
    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    /// Applies the operator to `r`.
    pub fn apply(&self, r: &[f64]) -> Result<Vec<f64>, FdmError> {
        ensure_size("operand", r.len(), self.size())?;
        Ok((0..r.len())
            .map(|i| {
                self.lower[i] * r[self.i0[i]] + self.diag[i] * r[i] + self.upper[i] * r[self.i2[i]]
            })
            .collect())
    }

    /// Scales row `i` by `u[i]` (or every row by `u[0]`).
    pub fn mult(&self, u: &[f64]) -> Result<Self, FdmError> {
        check_coeff_len("row scaling", u, self.size())?;
        let mut out = self.clone();
        for i in 0..out.size() {
            let s = coeff(u, i);
            out.lower[i] *= s;
            out.diag[i] *= s;
            out.upper[i] *= s;
        }
        Ok(out)
    }

    /// Sum of two operators along the same axis.
    pub fn add(&self, other: &Self) -> Result<Self, FdmError> {
        self.check_compatible(other)?;
        let mut out = self.clone();
        for i in 0..out.size() {
            out.lower[i] += other.lower[i];
            out.diag[i] += other.diag[i];
            out.upper[i] += other.upper[i];
        }
        Ok(out)
    }

    /// Adds `u[i]` (or `u[0]`) to the diagonal.
    pub fn add_to_diagonal(&self, u: &[f64]) -> Result<Self, FdmError> {
        check_coeff_len("diagonal shift", u, self.size())?;
        let mut out = self.clone();
        for (i, d) in out.diag.iter_mut().enumerate() {
            *d += coeff(u, i);
        }
        Ok(out)
    }

    /// Overwrites `self` with `a·x + y + b·I`, row-wise.
    ///
    /// `a` and `b` may be empty (zero), a single scalar or one value per row.
    pub fn axpyb(&mut self, a: &[f64], x: &Self, y: &Self, b: &[f64]) -> Result<(), FdmError> {
        self.check_compatible(x)?;
        self.check_compatible(y)?;
        check_coeff_len("axpyb slope", a, self.size())?;
        check_coeff_len("axpyb shift", b, self.size())?;
        for i in 0..self.size() {
            let s = coeff(a, i);
            self.lower[i] = y.lower[i] + s * x.lower[i];
            self.diag[i] = y.diag[i] + s * x.diag[i] + coeff(b, i);
            self.upper[i] = y.upper[i] + s * x.upper[i];
        }
        Ok(())
    }

    /// Zeroes the given rows.
    pub fn freeze_rows(&mut self, rows: &[usize]) {
        for &i in rows {
            if i < self.size() {
                self.lower[i] = 0.0;
                self.diag[i] = 0.0;
                self.upper[i] = 0.0;
            }
        }
    }

    /// Solves `(a·I + b·Op)·x = r` line by line along the operator's axis.
    ///
    /// Reflected neighbours are folded into the line so the result inverts
    /// `a·r + b·apply(r)` exactly.
    pub fn solve_splitting(&self, r: &[f64], a: f64, b: f64) -> Result<Vec<f64>, FdmError> {
        ensure_size("right-hand side", r.len(), self.size())?;
        let layout = self.mesher.layout();
        let n = layout.dim()[self.direction];
        let stride = layout.spacing()[self.direction];
        let mut ws = TridiagonalWorkspace::new(n);
        let mut x = vec![0.0; r.len()];

        for (start, coords) in layout.iter() {
            if coords[self.direction] != 0 {
                continue;
            }
            for k in 0..n {
                let i = start + k * stride;
                let (mut lo, mut up) = (b * self.lower[i], b * self.upper[i]);
                if k == 0 {
                    up += lo;
                    lo = 0.0;
                } else if k == n - 1 {
                    lo += up;
                    up = 0.0;
                }
                ws.lower[k] = lo;
                ws.diag[k] = a + b * self.diag[i];
                ws.upper[k] = up;
                ws.rhs[k] = r[i];
            }
            ws.solve().map_err(|e| e.on_axis(self.direction))?;
            for k in 0..n {
                x[start + k * stride] = ws.out[k];
            }
        }
        Ok(x)
    }

    /// Dense matrix view.
    pub fn to_matrix(&self) -> DMatrix<f64> {
        let n = self.size();
        let mut m = DMatrix::zeros(n, n);
        for i in 0..n {
            m[(i, self.i0[i])] += self.lower[i];
            m[(i, i)] += self.diag[i];
            m[(i, self.i2[i])] += self.upper[i];
        }
        m
    }

    fn check_compatible(&self, other: &Self) -> Result<(), FdmError> {
        if other.direction != self.direction {
            return Err(FdmError::configuration(format!(
                "cannot combine operators along axes {} and {}",
                self.direction, other.direction
            )));
        }
        ensure_size("operator", other.size(), self.size())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fdm::meshers::Fdm1dMesher;
    use approx::assert_relative_eq;

    fn mesher_2d() -> Arc<FdmMesherComposite> {
        FdmMesherComposite::shared(vec![
            Fdm1dMesher::predefined(vec![0.0, 0.3, 0.5, 1.2]).unwrap(),
            Fdm1dMesher::uniform(0.0, 1.0, 3).unwrap(),
        ])
        .unwrap()
    }

    fn sample_op(direction: usize) -> TripleBandLinearOp {
        let mut op = TripleBandLinearOp::new(direction, mesher_2d()).unwrap();
        for i in 0..op.size() {
            op.lower[i] = 0.4 + 0.01 * i as f64;
            op.diag[i] = -1.0 - 0.02 * i as f64;
            op.upper[i] = 0.3;
        }
        op
    }

    #[test]
    fn splitting_solve_inverts_shifted_apply() {
        for direction in 0..2 {
            let op = sample_op(direction);
            let u: Vec<f64> = (0..op.size()).map(|i| (i as f64 * 0.7).sin() + 2.0).collect();
            let (a, b) = (1.0, -0.35);
            let au = op.apply(&u).unwrap();
            let rhs: Vec<f64> = u.iter().zip(&au).map(|(ui, li)| a * ui + b * li).collect();
            let x = op.solve_splitting(&rhs, a, b).unwrap();
            for (xi, ui) in x.iter().zip(&u) {
                assert_relative_eq!(*xi, *ui, epsilon = 1.0e-12);
            }
        }
    }

    #[test]
    fn dense_view_matches_apply() {
        let op = sample_op(1);
        let u: Vec<f64> = (0..op.size()).map(|i| i as f64).collect();
        let dense = op.to_matrix() * nalgebra::DVector::from_vec(u.clone());
        let banded = op.apply(&u).unwrap();
        for (d, b) in dense.iter().zip(&banded) {
            assert_relative_eq!(*d, *b, epsilon = 1.0e-12);
        }
    }

    #[test]
    fn axpyb_and_freeze() {
        let x = sample_op(0);
        let y = sample_op(0).mult(&[2.0]).unwrap();
        let mut z = TripleBandLinearOp::new(0, mesher_2d()).unwrap();
        z.axpyb(&[0.5], &x, &y, &[-0.1]).unwrap();
        assert_relative_eq!(z.diag()[3], 2.5 * x.diag()[3] - 0.1, epsilon = 1.0e-15);
        z.freeze_rows(&[3]);
        assert_eq!((z.lower()[3], z.diag()[3], z.upper()[3]), (0.0, 0.0, 0.0));

        let other_axis = sample_op(1);
        assert!(matches!(x.add(&other_axis), Err(FdmError::Configuration(_))));
    }

    #[test]
    fn singular_line_reports_axis() {
        let op = TripleBandLinearOp::new(1, mesher_2d()).unwrap();
        let err = op.solve_splitting(&[1.0; 12], 0.0, 1.0).unwrap_err();
        assert!(matches!(err, FdmError::Numerical { axis: Some(1), .. }));
    }
}
