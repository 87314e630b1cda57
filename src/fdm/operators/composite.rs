//! The operator contract the time-stepping schemes are written against.

use std::sync::Arc;

use crate::core::{FdmError, ensure_size};
use crate::fdm::meshers::FdmMesherComposite;

use super::nine_point::NinePointLinearOp;
use super::triple_band::TripleBandLinearOp;

/// Spatial operator `L` of a backward PDE `∂V/∂t + L V = 0`, split by axis.
///
/// `apply(r) = Σ_axis apply_direction(axis, r) + apply_mixed(r)`.
/// Coefficients are only recomputed in [`LinearOpComposite::set_time`], which
/// must run before any apply or solve.
pub trait LinearOpComposite: Send {
    /// Grid the operator is discretised on.
    fn mesher(&self) -> &Arc<FdmMesherComposite>;

    /// Number of axes the operator couples.
    fn size(&self) -> usize;

    /// Recomputes the coefficients for the interval `[t1, t2]`.
    fn set_time(&mut self, t1: f64, t2: f64) -> Result<(), FdmError>;

    /// Applies the full operator.
    fn apply(&self, r: &[f64]) -> Result<Vec<f64>, FdmError>;

    /// Applies the part acting along `axis` only.
    fn apply_direction(&self, axis: usize, r: &[f64]) -> Result<Vec<f64>, FdmError>;

    /// Applies the cross-derivative part; zero when there is none.
    fn apply_mixed(&self, r: &[f64]) -> Result<Vec<f64>, FdmError>;

    /// Solves `(I + a·L_axis)·x = r`.
    fn solve_splitting(&self, axis: usize, r: &[f64], a: f64) -> Result<Vec<f64>, FdmError>;

    /// Approximate inverse of `I + dt·L` used to precondition Krylov solves.
    fn preconditioner(&self, r: &[f64], dt: f64) -> Result<Vec<f64>, FdmError> {
        self.solve_splitting(0, r, dt)
    }

    /// Zeroes the given rows in every stored operator.
    fn freeze_rows(&mut self, rows: &[usize]);
}

/// Borrows operator state that only exists after `set_time`.
pub(crate) fn require_time<T>(slot: Option<T>) -> Result<T, FdmError> {
    slot.ok_or_else(|| {
        FdmError::configuration("set_time must be called before applying or solving the operator")
    })
}

/// Element-wise `acc += other`.
#[inline]
pub(crate) fn add_assign(acc: &mut [f64], other: &[f64]) {
    acc.iter_mut().zip(other).for_each(|(a, b)| *a += b);
}

/// Time-dependent discretisation of an operator: one tridiagonal map per
/// axis plus any cross-derivative terms.
#[derive(Debug, Clone, Default)]
pub struct SplitMaps {
    /// Tridiagonal maps, at most one per axis.
    pub axes: Vec<TripleBandLinearOp>,
    /// Cross-derivative terms.
    pub mixed: Vec<NinePointLinearOp>,
}

impl SplitMaps {
    /// Applies every stored map.
    pub fn apply(&self, r: &[f64]) -> Result<Vec<f64>, FdmError> {
        let mut out = self.apply_mixed(r)?;
        for op in &self.axes {
            add_assign(&mut out, &op.apply(r)?);
        }
        Ok(out)
    }

    /// Applies the map along `axis`; zero if there is none.
    pub fn apply_direction(&self, axis: usize, r: &[f64]) -> Result<Vec<f64>, FdmError> {
        match self.axes.iter().find(|op| op.direction() == axis) {
            Some(op) => op.apply(r),
            None => Ok(vec![0.0; r.len()]),
        }
    }

    /// Applies the cross terms.
    pub fn apply_mixed(&self, r: &[f64]) -> Result<Vec<f64>, FdmError> {
        let mut out = vec![0.0; r.len()];
        for op in &self.mixed {
            add_assign(&mut out, &op.apply(r)?);
        }
        Ok(out)
    }

    /// Solves `(I + a·L_axis)·x = r`; the identity when `axis` carries no map.
    pub fn solve_splitting(&self, axis: usize, r: &[f64], a: f64) -> Result<Vec<f64>, FdmError> {
        match self.axes.iter().find(|op| op.direction() == axis) {
            Some(op) => op.solve_splitting(r, 1.0, a),
            None => Ok(r.to_vec()),
        }
    }

    /// Zeroes rows in every map.
    pub fn freeze_rows(&mut self, rows: &[usize]) {
        self.axes.iter_mut().for_each(|op| op.freeze_rows(rows));
        self.mixed.iter_mut().for_each(|op| op.freeze_rows(rows));
    }
}

/// Operator assembled from [`SplitMaps`] rebuilt at every `set_time`.
///
/// Implementing this trait is enough to obtain a [`LinearOpComposite`].
pub trait SplitOperator: Send {
    /// Grid the maps live on.
    fn grid(&self) -> &Arc<FdmMesherComposite>;

    /// Number of coupled axes.
    fn axis_count(&self) -> usize;

    /// Discretises the operator over `[t1, t2]`.
    fn build_maps(&self, t1: f64, t2: f64) -> Result<SplitMaps, FdmError>;

    /// Maps built by the last `set_time`, if any.
    fn maps(&self) -> Option<&SplitMaps>;

    /// Mutable access to the current maps.
    fn maps_mut(&mut self) -> Option<&mut SplitMaps>;

    /// Stores freshly built maps.
    fn store_maps(&mut self, maps: SplitMaps);
}

impl<T: SplitOperator> LinearOpComposite for T {
    fn mesher(&self) -> &Arc<FdmMesherComposite> {
        self.grid()
    }

    fn size(&self) -> usize {
        self.axis_count()
    }

    fn set_time(&mut self, t1: f64, t2: f64) -> Result<(), FdmError> {
        let maps = self.build_maps(t1, t2)?;
        self.store_maps(maps);
        Ok(())
    }

    fn apply(&self, r: &[f64]) -> Result<Vec<f64>, FdmError> {
        ensure_size("operand", r.len(), self.grid().size())?;
        require_time(self.maps())?.apply(r)
    }

    fn apply_direction(&self, axis: usize, r: &[f64]) -> Result<Vec<f64>, FdmError> {
        ensure_size("operand", r.len(), self.grid().size())?;
        require_time(self.maps())?.apply_direction(axis, r)
    }

    fn apply_mixed(&self, r: &[f64]) -> Result<Vec<f64>, FdmError> {
        ensure_size("operand", r.len(), self.grid().size())?;
        require_time(self.maps())?.apply_mixed(r)
    }

    fn solve_splitting(&self, axis: usize, r: &[f64], a: f64) -> Result<Vec<f64>, FdmError> {
        ensure_size("right-hand side", r.len(), self.grid().size())?;
        require_time(self.maps())?.solve_splitting(axis, r, a)
    }

    fn freeze_rows(&mut self, rows: &[usize]) {
        if let Some(maps) = self.maps_mut() {
            maps.freeze_rows(rows);
        }
    }
}
