//! Nine-point operator coupling two grid axes.

use std::sync::Arc;

use nalgebra::DMatrix;

use crate::core::{FdmError, ensure_size};
use crate::fdm::meshers::FdmMesherComposite;

use super::triple_band::{check_coeff_len, coeff};

/// Slot of the point itself in a stencil row.
const CENTRE: usize = 4;

/// Stencil over the 3×3 neighbourhood spanned by axes `d0` and `d1`.
///
/// Entry `k = 3·(o1+1) + (o0+1)` of a row refers to the neighbour at offset
/// `o0 ∈ {-1,0,1}` along `d0` and `o1` along `d1`.
#[derive(Debug, Clone)]
pub struct NinePointLinearOp {
    d0: usize,
    d1: usize,
    mesher: Arc<FdmMesherComposite>,
    index: Arc<[[usize; 9]]>,
    pub(super) coeff: Vec<[f64; 9]>,
}

impl NinePointLinearOp {
    /// Zero operator over axes `(d0, d1)`.
    pub fn new(d0: usize, d1: usize, mesher: Arc<FdmMesherComposite>) -> Result<Self, FdmError> {
        mesher.check_axis(d0)?;
        mesher.check_axis(d1)?;
        if d0 == d1 {
            return Err(FdmError::configuration(
                "a nine-point operator needs two distinct axes",
            ));
        }
        let layout = mesher.layout();
        let index: Vec<[usize; 9]> = layout
            .iter()
            .map(|(_, coords)| {
                let mut row = [0usize; 9];
                for (k, slot) in row.iter_mut().enumerate() {
                    let o0 = (k % 3) as isize - 1;
                    let o1 = (k / 3) as isize - 1;
                    *slot = layout.neighbourhood2(&coords, d0, o0, d1, o1);
                }
                row
            })
            .collect();
        let n = index.len();
        Ok(Self {
            d0,
            d1,
            mesher,
            index: index.into(),
            coeff: vec![[0.0; 9]; n],
        })
    }

    /// Coupled axes.
    pub fn axes(&self) -> (usize, usize) {
        (self.d0, self.d1)
    }

    /// Shared grid.
    pub fn mesher(&self) -> &Arc<FdmMesherComposite> {
        &self.mesher
    }

    /// Number of rows.
    pub fn size(&self) -> usize {
        self.coeff.len()
    }

    /// Stencil weights of row `i`.
    pub fn row(&self, i: usize) -> &[f64; 9] {
        &self.coeff[i]
    }

    /// Applies the operator to `r`.
    pub fn apply(&self, r: &[f64]) -> Result<Vec<f64>, FdmError> {
        ensure_size("operand", r.len(), self.size())?;
        Ok(self
            .coeff
            .iter()
            .zip(self.index.iter())
            .map(|(c, idx)| c.iter().zip(idx).map(|(w, &j)| w * r[j]).sum())
            .collect())
    }

    /// Scales row `i` by `u[i]`, or every row by `u[0]`.
    pub fn mult(&self, u: &[f64]) -> Result<Self, FdmError> {
        check_coeff_len("row scaling", u, self.size())?;
        let mut out = self.clone();
        for (i, row) in out.coeff.iter_mut().enumerate() {
            let s = coeff(u, i);
            row.iter_mut().for_each(|w| *w *= s);
        }
        Ok(out)
    }

    /// Adds `u[i]` (or `u[0]`) to the centre weight of each row.
    pub fn add_to_diagonal(&self, u: &[f64]) -> Result<Self, FdmError> {
        check_coeff_len("diagonal shift", u, self.size())?;
        let mut out = self.clone();
        for (i, row) in out.coeff.iter_mut().enumerate() {
            row[CENTRE] += coeff(u, i);
        }
        Ok(out)
    }

    /// Overwrites `self` with `a·x + y + b·I`, row-wise.
    ///
    /// `a` and `b` may be empty (zero), a single scalar or one value per row.
    pub fn axpyb(&mut self, a: &[f64], x: &Self, y: &Self, b: &[f64]) -> Result<(), FdmError> {
        for other in [x, y] {
            if other.axes() != self.axes() {
                return Err(FdmError::configuration(
                    "axpyb needs nine-point operators over the same axes",
                ));
            }
            ensure_size("operator", other.size(), self.size())?;
        }
        check_coeff_len("axpyb slope", a, self.size())?;
        check_coeff_len("axpyb shift", b, self.size())?;
        for (i, row) in self.coeff.iter_mut().enumerate() {
            let s = coeff(a, i);
            for (k, w) in row.iter_mut().enumerate() {
                *w = y.coeff[i][k] + s * x.coeff[i][k];
            }
            row[CENTRE] += coeff(b, i);
        }
        Ok(())
    }

    /// Sum of two operators over the same axes.
    pub fn add(&self, other: &Self) -> Result<Self, FdmError> {
        if other.axes() != self.axes() {
            return Err(FdmError::configuration(
                "cannot add nine-point operators over different axes",
            ));
        }
        ensure_size("operator", other.size(), self.size())?;
        let mut out = self.clone();
        for (row, o) in out.coeff.iter_mut().zip(&other.coeff) {
            for (w, v) in row.iter_mut().zip(o) {
                *w += v;
            }
        }
        Ok(out)
    }

    /// Zeroes the given rows.
    pub fn freeze_rows(&mut self, rows: &[usize]) {
        for &i in rows {
            if let Some(row) = self.coeff.get_mut(i) {
                *row = [0.0; 9];
            }
        }
    }

    /// Dense matrix view.
    pub fn to_matrix(&self) -> DMatrix<f64> {
        let n = self.size();
        let mut m = DMatrix::zeros(n, n);
        for (i, (c, idx)) in self.coeff.iter().zip(self.index.iter()).enumerate() {
            for (w, &j) in c.iter().zip(idx) {
                m[(i, j)] += w;
            }
        }
        m
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fdm::meshers::Fdm1dMesher;
    use crate::fdm::operators::mixed_derivative;
    use approx::assert_relative_eq;

    fn mesher() -> Arc<FdmMesherComposite> {
        FdmMesherComposite::shared(vec![
            Fdm1dMesher::predefined(vec![0.0, 0.3, 0.5, 1.2]).unwrap(),
            Fdm1dMesher::uniform(0.0, 1.0, 3).unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn same_axis_twice_is_rejected() {
        assert!(NinePointLinearOp::new(1, 1, mesher()).is_err());
    }

    #[test]
    fn diagonal_shift_matches_dense_identity() {
        let m = mesher();
        let op = mixed_derivative(0, 1, &m).unwrap();
        let shifted = op.add_to_diagonal(&[2.5]).unwrap();
        let expected = op.to_matrix() + DMatrix::identity(12, 12) * 2.5;
        assert_relative_eq!(shifted.to_matrix(), expected, epsilon = 1.0e-12);
    }

    #[test]
    fn axpyb_combines_rows() {
        let m = mesher();
        let x = mixed_derivative(0, 1, &m).unwrap();
        let y = x.mult(&[0.5]).unwrap();
        let mut out = NinePointLinearOp::new(0, 1, Arc::clone(&m)).unwrap();
        out.axpyb(&[2.0], &x, &y, &[1.0]).unwrap();
        let expected = x.to_matrix() * 2.5 + DMatrix::identity(12, 12);
        assert_relative_eq!(out.to_matrix(), expected, epsilon = 1.0e-12);

        out.axpyb(&[], &x, &y, &[]).unwrap();
        assert_relative_eq!(out.to_matrix(), y.to_matrix(), epsilon = 1.0e-12);
    }

    #[test]
    fn frozen_rows_apply_to_zero() {
        let m = mesher();
        let mut op = mixed_derivative(0, 1, &m).unwrap();
        op.freeze_rows(&[5]);
        let r: Vec<f64> = (0..12).map(|i| (i * i) as f64).collect();
        assert_eq!(op.apply(&r).unwrap()[5], 0.0);
    }
}
