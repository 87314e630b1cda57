//! Vanilla options under Heston (optionally with a leverage function) on a `(ln S, v)` grid.

use std::sync::Arc;

use crate::core::{FdmError, OptionType};
use crate::fdm::inner_value::VanillaLogInnerValue;
use crate::fdm::meshers::{FdmMesherComposite, black_scholes_log_spot, heston_variance};
use crate::fdm::operators::FdmHestonOp;
use crate::fdm::schemes::FdmSchemeDesc;
use crate::fdm::step_conditions::{FdmAmericanStepCondition, FdmStepConditionComposite};
use crate::models::{BlackScholesProcess, HestonProcess, LocalVolSurface};

use super::black_scholes::log_spot;
use super::{Fdm2DimSolver, FdmSolverDesc};

const GRID_EPS: f64 = 1.0e-4;
const GRID_SCALE: f64 = 1.5;
const STRIKE_DENSITY: f64 = 0.1;

/// Configuration for [`FdmHestonSolver`].
#[derive(Clone)]
pub struct FdmHestonSolverBuilder {
    process: HestonProcess,
    option_type: OptionType,
    strike: f64,
    maturity: f64,
    time_steps: usize,
    x_grid: usize,
    v_grid: usize,
    damping_steps: usize,
    scheme: FdmSchemeDesc,
    american: bool,
    leverage: Option<Arc<dyn LocalVolSurface>>,
}

impl std::fmt::Debug for FdmHestonSolverBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FdmHestonSolverBuilder")
            .field("process", &self.process)
            .field("option_type", &self.option_type)
            .field("strike", &self.strike)
            .field("maturity", &self.maturity)
            .field("time_steps", &self.time_steps)
            .field("x_grid", &self.x_grid)
            .field("v_grid", &self.v_grid)
            .field("scheme", &self.scheme)
            .field("american", &self.american)
            .field("leverage", &self.leverage.is_some())
            .finish()
    }
}

impl FdmHestonSolverBuilder {
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

    /// Number of variance points (default 50).
    pub fn with_v_grid(mut self, v_grid: usize) -> Self {
        self.v_grid = v_grid;
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

    /// Leverage function `L(t, S)` scaling the instantaneous volatility.
    pub fn with_leverage(mut self, leverage: Arc<dyn LocalVolSurface>) -> Self {
        self.leverage = Some(leverage);
        self
    }

    /// Builds the grid and solves.
    pub fn solve(self) -> Result<FdmHestonSolver, FdmError> {
        if !(self.strike.is_finite() && self.strike > 0.0) {
            return Err(FdmError::configuration("strike must be positive"));
        }
        let p = &self.process;
        let equity = BlackScholesProcess::new(p.spot, 0.0, 0.0, p.v0.max(p.theta).sqrt())
            .with_curves(Arc::clone(&p.risk_free), Arc::clone(&p.dividend));
        let x_axis = black_scholes_log_spot(
            &equity,
            self.maturity,
            self.x_grid,
            GRID_EPS,
            GRID_SCALE,
            Some((self.strike, STRIKE_DENSITY)),
        )?;
        let v_axis = heston_variance(p, self.maturity, self.v_grid, GRID_EPS)?;
        let mesher = FdmMesherComposite::shared(vec![x_axis, v_axis])?;
        let calculator = Arc::new(VanillaLogInnerValue::new(self.option_type, self.strike, 0));

        let mut conditions = FdmStepConditionComposite::new();
        if self.american {
            conditions = conditions.with(FdmAmericanStepCondition::new(
                Arc::clone(&mesher),
                calculator.clone(),
            ));
        }

        let mut op = FdmHestonOp::new(Arc::clone(&mesher), self.process.clone())?;
        if let Some(leverage) = self.leverage {
            op = op.with_leverage(leverage);
        }
        let desc = FdmSolverDesc::new(mesher, calculator, self.maturity, self.time_steps)
            .with_conditions(conditions)
            .with_damping_steps(self.damping_steps);
        let solver = Fdm2DimSolver::new(desc, self.scheme, &mut op)?;
        Ok(FdmHestonSolver {
            solver,
            spot: self.process.spot,
            v0: self.process.v0,
        })
    }
}

/// Finished Heston grid with queries at `(S, v)`.
#[derive(Debug, Clone)]
pub struct FdmHestonSolver {
    solver: Fdm2DimSolver,
    spot: f64,
    v0: f64,
}

impl FdmHestonSolver {
    /// Starts configuring a solver for a vanilla option.
    pub fn builder(
        process: HestonProcess,
        option_type: OptionType,
        strike: f64,
        maturity: f64,
    ) -> FdmHestonSolverBuilder {
        FdmHestonSolverBuilder {
            process,
            option_type,
            strike,
            maturity,
            time_steps: 100,
            x_grid: 100,
            v_grid: 50,
            damping_steps: 0,
            scheme: FdmSchemeDesc::douglas(),
            american: false,
            leverage: None,
        }
    }

    /// Underlying `(ln S, v)` solver.
    pub fn grid_solver(&self) -> &Fdm2DimSolver {
        &self.solver
    }

    /// Price at today's spot and variance.
    pub fn value(&self) -> Result<f64, FdmError> {
        self.value_at(self.spot, self.v0)
    }

    /// Price at `(spot, v)`.
    pub fn value_at(&self, spot: f64, v: f64) -> Result<f64, FdmError> {
        self.solver.interpolate_at(log_spot(spot)?, v)
    }

    /// `∂V/∂S`.
    pub fn delta_at(&self, spot: f64, v: f64) -> Result<f64, FdmError> {
        Ok(self.solver.derivative_x(log_spot(spot)?, v)? / spot)
    }

    /// `∂²V/∂S²`.
    pub fn gamma_at(&self, spot: f64, v: f64) -> Result<f64, FdmError> {
        let x = log_spot(spot)?;
        Ok((self.solver.derivative_xx(x, v)? - self.solver.derivative_x(x, v)?) / (spot * spot))
    }

    /// `∂V/∂t`.
    pub fn theta_at(&self, spot: f64, v: f64) -> Result<f64, FdmError> {
        self.solver.theta_at(log_spot(spot)?, v)
    }
}
