//! Preconditioned BiCGStab for the fully coupled implicit step.
//!
//! The matrix is only available through its action `A(x)`, and the
//! preconditioner through `M⁻¹(x)`; both may fail.

use crate::core::FdmError;

/// Outcome of a converged BiCGStab solve.
#[derive(Debug, Clone, PartialEq)]
pub struct BiCgStabResult {
    /// Iterations performed.
    pub iterations: usize,
    /// Final relative residual `|b - Ax| / |b|`.
    pub error: f64,
    /// Solution.
    pub x: Vec<f64>,
}

#[inline]
fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[inline]
fn norm2(a: &[f64]) -> f64 {
    dot(a, a).sqrt()
}

/// Bi-conjugate gradient stabilised solver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiCgStab {
    /// Iteration cap.
    pub max_iterations: usize,
    /// Relative residual target.
    pub rel_tol: f64,
}

impl BiCgStab {
    /// Creates a solver with an iteration cap and relative tolerance.
    pub fn new(max_iterations: usize, rel_tol: f64) -> Self {
        Self {
            max_iterations,
            rel_tol,
        }
    }

    /// Solves `A x = b` starting from `x0` (zero when `None`).
    pub fn solve<A, M>(
        &self,
        mut a: A,
        mut precond: M,
        b: &[f64],
        x0: Option<&[f64]>,
    ) -> Result<BiCgStabResult, FdmError>
    where
        A: FnMut(&[f64]) -> Result<Vec<f64>, FdmError>,
        M: FnMut(&[f64]) -> Result<Vec<f64>, FdmError>,
    {
        let n = b.len();
        let bnorm2 = norm2(b);
        if bnorm2 == 0.0 {
            return Ok(BiCgStabResult {
                iterations: 0,
                error: 0.0,
                x: vec![0.0; n],
            });
        }

        let mut x = x0.map_or_else(|| vec![0.0; n], <[f64]>::to_vec);
        let ax = a(&x)?;
        let mut r: Vec<f64> = b.iter().zip(&ax).map(|(bi, ai)| bi - ai).collect();
        let r_tld = r.clone();

        let mut p = vec![0.0; n];
        let mut v = vec![0.0; n];
        let mut omega = 1.0;
        let mut rho_tld = 1.0;
        let mut alpha = 0.0;
        let mut error = norm2(&r) / bnorm2;

        let mut iterations = 0;
        while iterations < self.max_iterations && error >= self.rel_tol {
            let rho = dot(&r_tld, &r);
            if rho == 0.0 || omega == 0.0 {
                break;
            }

            if iterations > 0 {
                let beta = (rho / rho_tld) * (alpha / omega);
                for i in 0..n {
                    p[i] = r[i] + beta * (p[i] - omega * v[i]);
                }
            } else {
                p.copy_from_slice(&r);
            }

            let p_tld = precond(&p)?;
            v = a(&p_tld)?;
            alpha = rho / dot(&r_tld, &v);

            let s: Vec<f64> = r.iter().zip(&v).map(|(ri, vi)| ri - alpha * vi).collect();
            if norm2(&s) < self.rel_tol * bnorm2 {
                for i in 0..n {
                    x[i] += alpha * p_tld[i];
                }
                error = norm2(&s) / bnorm2;
                iterations += 1;
                break;
            }

            let s_tld = precond(&s)?;
            let t = a(&s_tld)?;
            omega = dot(&t, &s) / dot(&t, &t);

            for i in 0..n {
                x[i] += alpha * p_tld[i] + omega * s_tld[i];
                r[i] = s[i] - omega * t[i];
            }
            error = norm2(&r) / bnorm2;
            rho_tld = rho;
            iterations += 1;
        }

        if !(error < self.rel_tol) {
            return Err(FdmError::numerical(format!(
                "bicgstab could not converge: relative residual {error:.3e} after {iterations} iterations"
            )));
        }
        Ok(BiCgStabResult {
            iterations,
            error,
            x,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn apply_matrix(m: &[[f64; 3]; 3], x: &[f64]) -> Vec<f64> {
        m.iter().map(|row| dot(row, x)).collect()
    }

    #[test]
    fn solves_small_nonsymmetric_system() {
        let m = [[4.0, 1.0, 0.5], [-1.0, 3.0, 0.2], [0.3, -0.4, 5.0]];
        let expected = [1.0, -2.0, 0.5];
        let b = apply_matrix(&m, &expected);

        let res = BiCgStab::new(50, 1.0e-12)
            .solve(|x| Ok(apply_matrix(&m, x)), |x| Ok(x.to_vec()), &b, None)
            .unwrap();
        for (got, want) in res.x.iter().zip(expected) {
            assert_relative_eq!(*got, want, epsilon = 1.0e-9);
        }
    }

    #[test]
    fn zero_rhs_returns_zero() {
        let res = BiCgStab::new(5, 1.0e-8)
            .solve(|x| Ok(x.to_vec()), |x| Ok(x.to_vec()), &[0.0, 0.0], None)
            .unwrap();
        assert_eq!(res.x, vec![0.0, 0.0]);
        assert_eq!(res.iterations, 0);
    }

    #[test]
    fn iteration_cap_is_numerical_error() {
        let m = [[4.0, 1.0, 0.5], [-1.0, 3.0, 0.2], [0.3, -0.4, 5.0]];
        let err = BiCgStab::new(0, 1.0e-12)
            .solve(
                |x| Ok(apply_matrix(&m, x)),
                |x| Ok(x.to_vec()),
                &[1.0, 2.0, 3.0],
                None,
            )
            .unwrap_err();
        assert!(matches!(err, FdmError::Numerical { .. }));
    }
}
