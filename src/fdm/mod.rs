//! Finite-difference engine: grids, operators, conditions, schemes and solvers.
//!
//! A pricing run assembles an [`meshers::FdmMesherComposite`], a model
//! operator from [`operators`], optional boundary and step conditions, and
//! hands them to a solver in [`solvers`], which marches the payoff back to
//! `t = 0` with a scheme from [`schemes`].

pub mod backward_solver;
pub mod boundary;
pub mod inner_value;
pub mod meshers;
pub mod operators;
pub mod schemes;
pub mod solvers;
pub mod step_conditions;

pub use backward_solver::FdmBackwardSolver;
pub use boundary::{BoundaryKind, BoundaryValue, FdmBoundaryCondition, FdmBoundaryConditionSet};
pub use inner_value::{InnerValueCalculator, VanillaLogInnerValue};
pub use schemes::{FdmScheme, FdmSchemeDesc, SchemeKind, build_scheme};
pub use step_conditions::{
    ConditionTimes, FdmAmericanStepCondition, FdmBermudanStepCondition, FdmDividendHandler,
    FdmSnapshotCondition, FdmStepConditionComposite, StepCondition,
};
