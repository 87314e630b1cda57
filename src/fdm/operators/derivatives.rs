//! Finite-difference derivative stencils on non-uniform grids.

use std::sync::Arc;

use crate::core::FdmError;
use crate::fdm::meshers::FdmMesherComposite;

use super::nine_point::NinePointLinearOp;
use super::triple_band::TripleBandLinearOp;

/// Weights `(lower, diag, upper)` of `∂/∂x` given the backward and forward spacings.
///
/// A `NaN` spacing marks a missing neighbour; the row then falls back to a
/// one-sided difference.
#[inline]
pub(crate) fn first_derivative_weights(hm: f64, hp: f64) -> [f64; 3] {
    if hm.is_nan() {
        [0.0, -1.0 / hp, 1.0 / hp]
    } else if hp.is_nan() {
        [-1.0 / hm, 1.0 / hm, 0.0]
    } else {
        [
            -hp / (hm * (hm + hp)),
            (hp - hm) / (hm * hp),
            hm / (hp * (hm + hp)),
        ]
    }
}

/// Weights of `∂²/∂x²`; edge rows are zero.
#[inline]
pub(crate) fn second_derivative_weights(hm: f64, hp: f64) -> [f64; 3] {
    if hm.is_nan() || hp.is_nan() {
        [0.0; 3]
    } else {
        [
            2.0 / (hm * (hm + hp)),
            -2.0 / (hm * hp),
            2.0 / (hp * (hm + hp)),
        ]
    }
}

fn banded(
    direction: usize,
    mesher: &Arc<FdmMesherComposite>,
    weights: fn(f64, f64) -> [f64; 3],
) -> Result<TripleBandLinearOp, FdmError> {
    let mut op = TripleBandLinearOp::new(direction, Arc::clone(mesher))?;
    for i in 0..op.size() {
        let [l, d, u] = weights(mesher.dminus(i, direction), mesher.dplus(i, direction));
        op.lower[i] = l;
        op.diag[i] = d;
        op.upper[i] = u;
    }
    Ok(op)
}

/// Central first derivative along `direction`, one-sided at the edges.
pub fn first_derivative(
    direction: usize,
    mesher: &Arc<FdmMesherComposite>,
) -> Result<TripleBandLinearOp, FdmError> {
    banded(direction, mesher, first_derivative_weights)
}

/// Second derivative along `direction`.
pub fn second_derivative(
    direction: usize,
    mesher: &Arc<FdmMesherComposite>,
) -> Result<TripleBandLinearOp, FdmError> {
    banded(direction, mesher, second_derivative_weights)
}

/// Cross derivative `∂²/∂x_{d0}∂x_{d1}` as the tensor product of first-derivative stencils.
pub fn mixed_derivative(
    d0: usize,
    d1: usize,
    mesher: &Arc<FdmMesherComposite>,
) -> Result<NinePointLinearOp, FdmError> {
    let mut op = NinePointLinearOp::new(d0, d1, Arc::clone(mesher))?;
    for i in 0..op.size() {
        let w0 = first_derivative_weights(mesher.dminus(i, d0), mesher.dplus(i, d0));
        let w1 = first_derivative_weights(mesher.dminus(i, d1), mesher.dplus(i, d1));
        let row = &mut op.coeff[i];
        for (k, slot) in row.iter_mut().enumerate() {
            *slot = w0[k % 3] * w1[k / 3];
        }
    }
    Ok(op)
}
