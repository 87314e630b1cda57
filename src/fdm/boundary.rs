//! Boundary conditions and the hook protocol schemes drive them through.
//!
//! Every scheme step calls, in order: `set_time`, then either
//! `before_applying → apply → after_applying` or
//! `before_solving → solve → after_solving` (or both). Each hook is
//! idempotent within a step.

use std::fmt;
use std::sync::Arc;

use crate::core::{FdmError, Side, ensure_size};
use crate::fdm::meshers::FdmMesherComposite;
use crate::fdm::operators::LinearOpComposite;

/// Time-dependent boundary value `g(t)`.
pub type TimeFunction = Arc<dyn Fn(f64) -> f64 + Send + Sync>;

/// Boundary target, constant or a function of time.
#[derive(Clone)]
pub enum BoundaryValue {
    /// Fixed value.
    Constant(f64),
    /// Value re-evaluated at every `set_time`.
    TimeDependent(TimeFunction),
}

impl BoundaryValue {
    fn at(&self, t: f64) -> f64 {
        match self {
            Self::Constant(v) => *v,
            Self::TimeDependent(f) => f(t),
        }
    }
}

impl fmt::Debug for BoundaryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(v) => f.debug_tuple("Constant").field(v).finish(),
            Self::TimeDependent(_) => f.write_str("TimeDependent(..)"),
        }
    }
}

/// Kind of a boundary condition.
#[derive(Debug, Clone)]
pub enum BoundaryKind {
    /// `V = g(t)` on the boundary.
    Dirichlet(BoundaryValue),
    /// `∂V/∂x = g(t)` on the boundary, along the condition's axis.
    Neumann(BoundaryValue),
}

/// Condition on one face of the grid.
#[derive(Debug, Clone)]
pub struct FdmBoundaryCondition {
    axis: usize,
    side: Side,
    kind: BoundaryKind,
    grid_size: usize,
    indices: Vec<usize>,
    neighbours: Vec<usize>,
    spacings: Vec<f64>,
    value: f64,
}

impl FdmBoundaryCondition {
    /// Condition of `kind` on the `side` face of `axis`.
    pub fn new(
        mesher: &FdmMesherComposite,
        axis: usize,
        side: Side,
        kind: BoundaryKind,
    ) -> Result<Self, FdmError> {
        mesher.check_axis(axis)?;
        let layout = mesher.layout();
        let edge = match side {
            Side::Lower => 0,
            Side::Upper => layout.dim()[axis] - 1,
        };
        let inward: isize = match side {
            Side::Lower => 1,
            Side::Upper => -1,
        };

        let mut indices = Vec::new();
        let mut neighbours = Vec::new();
        let mut spacings = Vec::new();
        for (i, coords) in layout.iter() {
            if coords[axis] != edge {
                continue;
            }
            indices.push(i);
            neighbours.push(layout.neighbourhood(&coords, axis, inward));
            spacings.push(match side {
                Side::Lower => mesher.dplus(i, axis),
                Side::Upper => mesher.dminus(i, axis),
            });
        }

        let value = match &kind {
            BoundaryKind::Dirichlet(v) | BoundaryKind::Neumann(v) => v.at(0.0),
        };
        Ok(Self {
            axis,
            side,
            kind,
            grid_size: layout.size(),
            indices,
            neighbours,
            spacings,
            value,
        })
    }

    /// Constant Dirichlet condition.
    pub fn dirichlet(
        mesher: &FdmMesherComposite,
        axis: usize,
        side: Side,
        value: f64,
    ) -> Result<Self, FdmError> {
        Self::new(mesher, axis, side, BoundaryKind::Dirichlet(BoundaryValue::Constant(value)))
    }

    /// Time-dependent Dirichlet condition.
    pub fn time_dependent_dirichlet(
        mesher: &FdmMesherComposite,
        axis: usize,
        side: Side,
        value: TimeFunction,
    ) -> Result<Self, FdmError> {
        Self::new(mesher, axis, side, BoundaryKind::Dirichlet(BoundaryValue::TimeDependent(value)))
    }

    /// Constant Neumann condition.
    pub fn neumann(
        mesher: &FdmMesherComposite,
        axis: usize,
        side: Side,
        derivative: f64,
    ) -> Result<Self, FdmError> {
        Self::new(mesher, axis, side, BoundaryKind::Neumann(BoundaryValue::Constant(derivative)))
    }

    /// Axis the condition lives on.
    pub fn axis(&self) -> usize {
        self.axis
    }

    /// Face of the axis.
    pub fn side(&self) -> Side {
        self.side
    }

    /// Linear indices of the boundary points.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Target evaluated at the last `set_time`.
    pub fn current_value(&self) -> f64 {
        self.value
    }

    fn is_dirichlet(&self) -> bool {
        matches!(self.kind, BoundaryKind::Dirichlet(_))
    }

    /// Evaluates the target at `t`.
    pub fn set_time(&mut self, t: f64) {
        self.value = match &self.kind {
            BoundaryKind::Dirichlet(v) | BoundaryKind::Neumann(v) => v.at(t),
        };
    }

    /// Freezes Dirichlet rows before an explicit application.
    pub fn before_applying(&self, op: &mut dyn LinearOpComposite) {
        if self.is_dirichlet() {
            op.freeze_rows(&self.indices);
        }
    }

    /// Freezes Dirichlet rows and writes the target into the right-hand side.
    pub fn before_solving(&self, op: &mut dyn LinearOpComposite, rhs: &mut [f64]) {
        if self.is_dirichlet() {
            op.freeze_rows(&self.indices);
            for &i in &self.indices {
                rhs[i] = self.value;
            }
        }
    }

    /// Enforces the condition on the result of an explicit application.
    pub fn after_applying(&self, a: &mut [f64]) {
        self.enforce(a);
    }

    /// Enforces the condition on the result of a solve.
    pub fn after_solving(&self, a: &mut [f64]) {
        self.enforce(a);
    }

    fn enforce(&self, a: &mut [f64]) {
        match self.kind {
            BoundaryKind::Dirichlet(_) => {
                for &i in &self.indices {
                    a[i] = self.value;
                }
            }
            BoundaryKind::Neumann(_) => {
                let sign = match self.side {
                    Side::Lower => -1.0,
                    Side::Upper => 1.0,
                };
                for ((&i, &n), &h) in self
                    .indices
                    .iter()
                    .zip(&self.neighbours)
                    .zip(&self.spacings)
                {
                    a[i] = a[n] + sign * self.value * h;
                }
            }
        }
    }
}

/// Ordered list of boundary conditions; hooks fan out in list order.
#[derive(Debug, Clone, Default)]
pub struct FdmBoundaryConditionSet {
    conditions: Vec<FdmBoundaryCondition>,
}

impl FdmBoundaryConditionSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a condition.
    pub fn push(&mut self, condition: FdmBoundaryCondition) {
        self.conditions.push(condition);
    }

    /// Builder-style [`FdmBoundaryConditionSet::push`].
    pub fn with(mut self, condition: FdmBoundaryCondition) -> Self {
        self.push(condition);
        self
    }

    /// Conditions in application order.
    pub fn conditions(&self) -> &[FdmBoundaryCondition] {
        &self.conditions
    }

    /// `true` when there are no conditions.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Fails unless every condition was built for a grid of `size` points.
    pub fn check_grid_size(&self, size: usize) -> Result<(), FdmError> {
        self.conditions
            .iter()
            .try_for_each(|c| ensure_size("boundary condition grid", c.grid_size, size))
    }

    /// Evaluates every target at `t`.
    pub fn set_time(&mut self, t: f64) {
        self.conditions.iter_mut().for_each(|c| c.set_time(t));
    }

    /// Runs every `before_applying` hook.
    pub fn apply_before_applying(&self, op: &mut dyn LinearOpComposite) {
        self.conditions.iter().for_each(|c| c.before_applying(op));
    }

    /// Runs every `before_solving` hook.
    pub fn apply_before_solving(&self, op: &mut dyn LinearOpComposite, rhs: &mut [f64]) {
        self.conditions.iter().for_each(|c| c.before_solving(op, rhs));
    }

    /// Runs every `after_applying` hook.
    pub fn apply_after_applying(&self, a: &mut [f64]) {
        self.conditions.iter().for_each(|c| c.after_applying(a));
    }

    /// Runs every `after_solving` hook.
    pub fn apply_after_solving(&self, a: &mut [f64]) {
        self.conditions.iter().for_each(|c| c.after_solving(a));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fdm::meshers::Fdm1dMesher;
    use approx::assert_relative_eq;

    fn mesher() -> FdmMesherComposite {
        FdmMesherComposite::new(vec![
            Fdm1dMesher::uniform(0.0, 1.0, 5).unwrap(),
            Fdm1dMesher::uniform(0.0, 2.0, 3).unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn dirichlet_faces_select_edge_points() {
        let m = mesher();
        let lower = FdmBoundaryCondition::dirichlet(&m, 0, Side::Lower, 1.0).unwrap();
        assert_eq!(lower.indices(), &[0, 5, 10]);
        let upper = FdmBoundaryCondition::dirichlet(&m, 1, Side::Upper, 1.0).unwrap();
        assert_eq!(upper.indices(), &[10, 11, 12, 13, 14]);
    }

    #[test]
    fn neumann_matches_prescribed_slope() {
        let m = mesher();
        let mut set = FdmBoundaryConditionSet::new()
            .with(FdmBoundaryCondition::neumann(&m, 0, Side::Lower, 2.0).unwrap())
            .with(
                FdmBoundaryCondition::new(
                    &m,
                    0,
                    Side::Upper,
                    BoundaryKind::Neumann(BoundaryValue::TimeDependent(Arc::new(|t: f64| -t))),
                )
                .unwrap(),
            );
        set.set_time(4.0);
        let mut a = vec![1.0; 15];
        set.apply_after_solving(&mut a);
        // (a[1] - a[0]) / h = 2 and (a[4] - a[3]) / h = -4
        assert_relative_eq!((a[1] - a[0]) / 0.25, 2.0, epsilon = 1.0e-12);
        assert_relative_eq!((a[9] - a[8]) / 0.25, -4.0, epsilon = 1.0e-12);
    }

    #[test]
    fn out_of_range_axis_is_configuration_error() {
        let m = mesher();
        assert!(matches!(
            FdmBoundaryCondition::dirichlet(&m, 2, Side::Lower, 0.0),
            Err(FdmError::Configuration(_))
        ));
    }

    #[test]
    fn grid_size_is_checked() {
        let m = mesher();
        let set = FdmBoundaryConditionSet::new()
            .with(FdmBoundaryCondition::dirichlet(&m, 0, Side::Lower, 0.0).unwrap());
        assert!(set.check_grid_size(15).is_ok());
        assert!(set.check_grid_size(16).is_err());
    }
}
