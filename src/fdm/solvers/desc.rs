use std::fmt;
use std::sync::Arc;

use crate::core::FdmError;
use crate::fdm::boundary::FdmBoundaryConditionSet;
use crate::fdm::inner_value::InnerValueCalculator;
use crate::fdm::meshers::FdmMesherComposite;
use crate::fdm::step_conditions::FdmStepConditionComposite;

/// Everything a dimensional solver needs besides the operator and the scheme.
pub struct FdmSolverDesc {
    /// Grid shared with the operator.
    pub mesher: Arc<FdmMesherComposite>,
    /// Boundary conditions.
    pub bc_set: FdmBoundaryConditionSet,
    /// Step conditions; a theta snapshot is added by the solver.
    pub condition: FdmStepConditionComposite,
    /// Payoff used to seed the terminal values.
    pub calculator: Arc<dyn InnerValueCalculator>,
    /// Time to maturity.
    pub maturity: f64,
    /// Number of scheme steps.
    pub time_steps: usize,
    /// Number of implicit Euler damping steps taken first.
    pub damping_steps: usize,
}

impl fmt::Debug for FdmSolverDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FdmSolverDesc")
            .field("grid_size", &self.mesher.size())
            .field("bc_set", &self.bc_set)
            .field("condition", &self.condition)
            .field("maturity", &self.maturity)
            .field("time_steps", &self.time_steps)
            .field("damping_steps", &self.damping_steps)
            .finish()
    }
}

impl FdmSolverDesc {
    /// Description with no boundary or step conditions.
    pub fn new(
        mesher: Arc<FdmMesherComposite>,
        calculator: Arc<dyn InnerValueCalculator>,
        maturity: f64,
        time_steps: usize,
    ) -> Self {
        Self {
            mesher,
            bc_set: FdmBoundaryConditionSet::new(),
            condition: FdmStepConditionComposite::new(),
            calculator,
            maturity,
            time_steps,
            damping_steps: 0,
        }
    }

    /// Sets the boundary conditions.
    pub fn with_boundary_conditions(mut self, bc_set: FdmBoundaryConditionSet) -> Self {
        self.bc_set = bc_set;
        self
    }

    /// Sets the step conditions.
    pub fn with_conditions(mut self, condition: FdmStepConditionComposite) -> Self {
        self.condition = condition;
        self
    }

    /// Sets the number of damping steps.
    pub fn with_damping_steps(mut self, damping_steps: usize) -> Self {
        self.damping_steps = damping_steps;
        self
    }

    /// Validates maturity, step count and grid dimension.
    pub fn validate(&self, ndim: usize) -> Result<(), FdmError> {
        if !(self.maturity.is_finite() && self.maturity > 0.0) {
            return Err(FdmError::configuration(format!(
                "maturity must be positive and finite, got {}",
                self.maturity
            )));
        }
        if self.time_steps == 0 {
            return Err(FdmError::configuration("time_steps must be at least 1"));
        }
        if self.mesher.ndim() != ndim {
            return Err(FdmError::configuration(format!(
                "solver expects a {ndim}-dimensional grid, got {} dimensions",
                self.mesher.ndim()
            )));
        }
        self.bc_set.check_grid_size(self.mesher.size())
    }
}
