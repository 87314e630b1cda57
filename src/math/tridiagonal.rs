//! Thomas algorithm for tridiagonal systems.

use crate::core::FdmError;

const PIVOT_EPS: f64 = 1.0e-300;

/// Reusable scratch buffers for repeated tridiagonal solves of the same length.
#[derive(Debug, Clone, Default)]
pub struct TridiagonalWorkspace {
    pub(crate) lower: Vec<f64>,
    pub(crate) diag: Vec<f64>,
    pub(crate) upper: Vec<f64>,
    pub(crate) rhs: Vec<f64>,
    pub(crate) out: Vec<f64>,
    c_star: Vec<f64>,
    d_star: Vec<f64>,
}

impl TridiagonalWorkspace {
    /// Creates buffers for systems of length `n`.
    pub fn new(n: usize) -> Self {
        Self {
            lower: vec![0.0; n],
            diag: vec![0.0; n],
            upper: vec![0.0; n],
            rhs: vec![0.0; n],
            out: vec![0.0; n],
            c_star: vec![0.0; n],
            d_star: vec![0.0; n],
        }
    }

    /// Solves the system currently loaded into `lower`/`diag`/`upper`/`rhs` into `out`.
    pub(crate) fn solve(&mut self) -> Result<(), FdmError> {
        solve_tridiagonal_inplace(
            &self.lower,
            &self.diag,
            &self.upper,
            &self.rhs,
            &mut self.c_star,
            &mut self.d_star,
            &mut self.out,
        )
    }
}

/// In-place tridiagonal solve using pre-allocated scratch buffers.
///
/// `lower[0]` and `upper[n-1]` are ignored. Writes the solution into `x`;
/// `c_star` and `d_star` are scratch space. A vanishing pivot is reported as
/// [`FdmError::Numerical`].
pub fn solve_tridiagonal_inplace(
    lower: &[f64],
    diag: &[f64],
    upper: &[f64],
    rhs: &[f64],
    c_star: &mut [f64],
    d_star: &mut [f64],
    x: &mut [f64],
) -> Result<(), FdmError> {
    let n = diag.len();
    if n == 0 {
        return Ok(());
    }
    if lower.len() != n
        || upper.len() != n
        || rhs.len() != n
        || c_star.len() != n
        || d_star.len() != n
        || x.len() != n
    {
        return Err(FdmError::configuration(
            "tridiagonal input lengths must match",
        ));
    }

    if diag[0].abs() <= PIVOT_EPS || !diag[0].is_finite() {
        return Err(FdmError::numerical("tridiagonal solver singular matrix"));
    }
    let inv_denom0 = 1.0 / diag[0];
    c_star[0] = if n > 1 { upper[0] * inv_denom0 } else { 0.0 };
    d_star[0] = rhs[0] * inv_denom0;

    for i in 1..n {
        let denom = (-lower[i]).mul_add(c_star[i - 1], diag[i]);
        if denom.abs() <= PIVOT_EPS || !denom.is_finite() {
            return Err(FdmError::numerical("tridiagonal solver singular matrix"));
        }
        let inv_denom = 1.0 / denom;
        c_star[i] = if i < n - 1 { upper[i] * inv_denom } else { 0.0 };
        d_star[i] = (-lower[i]).mul_add(d_star[i - 1], rhs[i]) * inv_denom;
    }

    x[n - 1] = d_star[n - 1];
    for i in (0..n - 1).rev() {
        x[i] = (-c_star[i]).mul_add(x[i + 1], d_star[i]);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn solves_diagonally_dominant_system() {
        let lower = [0.0, -1.0, -1.0, -1.0];
        let diag = [4.0, 4.0, 4.0, 4.0];
        let upper = [-1.0, -1.0, -1.0, 0.0];
        let expected = [1.0, 2.0, 3.0, 4.0];
        let rhs: Vec<f64> = (0..4)
            .map(|i| {
                let mut r = diag[i] * expected[i];
                if i > 0 {
                    r += lower[i] * expected[i - 1];
                }
                if i < 3 {
                    r += upper[i] * expected[i + 1];
                }
                r
            })
            .collect();

        let mut c = [0.0; 4];
        let mut d = [0.0; 4];
        let mut x = [0.0; 4];
        solve_tridiagonal_inplace(&lower, &diag, &upper, &rhs, &mut c, &mut d, &mut x).unwrap();
        for (got, want) in x.iter().zip(expected) {
            assert_relative_eq!(*got, want, epsilon = 1.0e-12);
        }
    }

    #[test]
    fn zero_pivot_is_numerical_error() {
        let mut c = [0.0; 2];
        let mut d = [0.0; 2];
        let mut x = [0.0; 2];
        let err = solve_tridiagonal_inplace(
            &[0.0, 1.0],
            &[0.0, 1.0],
            &[1.0, 0.0],
            &[1.0, 1.0],
            &mut c,
            &mut d,
            &mut x,
        )
        .unwrap_err();
        assert!(matches!(err, FdmError::Numerical { .. }));
    }
}
