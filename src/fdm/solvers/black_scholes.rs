//! Vanilla options under Black-Scholes (optionally local volatility) on a log-spot grid.

use std::sync::Arc;

use crate::core::{FdmError, OptionType};
use crate::fdm::inner_value::VanillaLogInnerValue;
use crate::fdm::meshers::{FdmMesherComposite, black_scholes_log_spot};
use crate::fdm::operators::FdmBlackScholesOp;
use crate::fdm::schemes::FdmSchemeDesc;
use crate::fdm::step_conditions::{
    FdmAmericanStepCondition, FdmDividendHandler, FdmStepConditionComposite,
};
use crate::models::BlackScholesProcess;

use super::{Fdm1DimSolver, FdmSolverDesc};

/// Tail probability cut off on each side of the log-spot grid.
const GRID_EPS: f64 = 1.0e-4;
/// Widening factor applied to the log-spot window.
const GRID_SCALE: f64 = 1.5;
/// Density of the grid concentration at the strike.
const STRIKE_DENSITY: f64 = 0.1;

/// Configuration for [`FdmBlackScholesSolver`].
#[derive(Debug, Clone)]
pub struct FdmBlackScholesSolverBuilder {
    process: BlackScholesProcess,
    option_type: OptionType,
    strike: f64,
    maturity: f64,
    time_steps: usize,
    x_grid: usize,
    damping_steps: usize,
    scheme: FdmSchemeDesc,
    american: bool,
    dividends: Vec<(f64, f64)>,
}

impl FdmBlackScholesSolverBuilder {
    /// Number of time steps (default 100).
    pub fn with_time_steps(mut self, time_steps: usize) -> Self {
        self.time_steps = time_steps;
        self
    }

    /// Number of log-spot points (default 100).
    pub fn with_x_grid(mut self, x_grid: usize) -> Self {
        self.x_grid = x_grid;
        self
    }

    /// Implicit Euler damping steps (default 0).
    pub fn with_damping_steps(mut self, damping_steps: usize) -> Self {
        self.damping_steps = damping_steps;
        self
    }

    /// Time-stepping scheme (default Douglas).
    pub fn with_scheme(mut self, scheme: FdmSchemeDesc) -> Self {
        self.scheme = scheme;
        self
    }

    /// Early exercise at every step.
    pub fn with_american_exercise(mut self) -> Self {
        self.american = true;
        self
    }

    /// Discrete cash dividends as `(time, amount)`.
    pub fn with_dividends(mut self, dividends: Vec<(f64, f64)>) -> Self {
        self.dividends = dividends;
        self
    }

    /// Builds the grid and solves.
    pub fn solve(self) -> Result<FdmBlackScholesSolver, FdmError> {
        if !(self.strike.is_finite() && self.strike > 0.0) {
            return Err(FdmError::configuration("strike must be positive"));
        }
        let axis = black_scholes_log_spot(
            &self.process,
            self.maturity,
            self.x_grid,
            GRID_EPS,
            GRID_SCALE,
            Some((self.strike, STRIKE_DENSITY)),
        )?;
        let mesher = FdmMesherComposite::shared(vec![axis])?;
        let calculator = Arc::new(VanillaLogInnerValue::new(self.option_type, self.strike, 0));

        let mut conditions = FdmStepConditionComposite::new();
        if !self.dividends.is_empty() {
            conditions = conditions.with(FdmDividendHandler::new(
                Arc::clone(&mesher),
                0,
                self.dividends,
            )?);
        }
        if self.american {
            conditions = conditions.with(FdmAmericanStepCondition::new(
                Arc::clone(&mesher),
                calculator.clone(),
            ));
        }

        let mut op = FdmBlackScholesOp::new(Arc::clone(&mesher), self.process.clone(), 0)?;
        let desc = FdmSolverDesc::new(mesher, calculator, self.maturity, self.time_steps)
            .with_conditions(conditions)
            .with_damping_steps(self.damping_steps);
        let solver = Fdm1DimSolver::new(desc, self.scheme, &mut op)?;
        Ok(FdmBlackScholesSolver {
            solver,
            spot: self.process.spot,
        })
    }
}

/// Finished Black-Scholes grid with queries in spot units.
#[derive(Debug, Clone)]
pub struct FdmBlackScholesSolver {
    solver: Fdm1DimSolver,
    spot: f64,
}

impl FdmBlackScholesSolver {
    /// Starts configuring a solver for a vanilla option.
    pub fn builder(
        process: BlackScholesProcess,
        option_type: OptionType,
        strike: f64,
        maturity: f64,
    ) -> FdmBlackScholesSolverBuilder {
        FdmBlackScholesSolverBuilder {
            process,
            option_type,
            strike,
            maturity,
            time_steps: 100,
            x_grid: 100,
            damping_steps: 0,
            scheme: FdmSchemeDesc::douglas(),
            american: false,
            dividends: Vec::new(),
        }
    }

    /// Underlying log-spot solver.
    pub fn grid_solver(&self) -> &Fdm1DimSolver {
        &self.solver
    }

    /// Price at today's spot.
    pub fn value(&self) -> Result<f64, FdmError> {
        self.value_at(self.spot)
    }

    /// Price at `spot`.
    pub fn value_at(&self, spot: f64) -> Result<f64, FdmError> {
        self.solver.interpolate_at(log_spot(spot)?)
    }

    /// `∂V/∂S` at `spot`.
    pub fn delta_at(&self, spot: f64) -> Result<f64, FdmError> {
        Ok(self.solver.derivative_x(log_spot(spot)?)? / spot)
    }

    /// `∂²V/∂S²` at `spot`.
    pub fn gamma_at(&self, spot: f64) -> Result<f64, FdmError> {
        let x = log_spot(spot)?;
        Ok((self.solver.derivative_xx(x)? - self.solver.derivative_x(x)?) / (spot * spot))
    }

    /// `∂V/∂t` at `spot`.
    pub fn theta_at(&self, spot: f64) -> Result<f64, FdmError> {
        self.solver.theta_at(log_spot(spot)?)
    }
}

pub(super) fn log_spot(spot: f64) -> Result<f64, FdmError> {
    if spot > 0.0 && spot.is_finite() {
        Ok(spot.ln())
    } else {
        Err(FdmError::domain(format!("spot must be positive, got {spot}")))
    }
}
