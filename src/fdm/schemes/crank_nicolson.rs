use crate::core::FdmError;
use crate::fdm::boundary::FdmBoundaryConditionSet;
use crate::fdm::operators::LinearOpComposite;

use super::implicit_euler::implicit_step;
use super::{FdmScheme, StepClock, explicit_step};

/// Theta scheme: an explicit step weighted `1 − θ` followed by an implicit step weighted `θ`.
pub struct CrankNicolsonScheme<'a> {
    theta: f64,
    map: &'a mut dyn LinearOpComposite,
    bc_set: &'a mut FdmBoundaryConditionSet,
    dt: f64,
    clock: StepClock,
}

impl<'a> CrankNicolsonScheme<'a> {
    /// Creates the scheme; `θ = ½` is classical Crank-Nicolson.
    pub fn new(
        theta: f64,
        map: &'a mut dyn LinearOpComposite,
        bc_set: &'a mut FdmBoundaryConditionSet,
    ) -> Self {
        Self {
            theta,
            map,
            bc_set,
            dt: 0.0,
            clock: StepClock::default(),
        }
    }

    fn step_impl(&mut self, a: &mut [f64], t: f64) -> Result<(), FdmError> {
        if self.theta != 1.0 {
            explicit_step(self.map, self.bc_set, a, t, self.dt, 1.0 - self.theta)?;
        }
        if self.theta != 0.0 {
            implicit_step(self.map, self.bc_set, a, t, self.dt, self.theta)?;
        }
        Ok(())
    }
}

impl FdmScheme for CrankNicolsonScheme<'_> {
    fn set_step(&mut self, dt: f64) {
        self.dt = dt;
    }

    fn step(&mut self, a: &mut [f64], t: f64) -> Result<(), FdmError> {
        self.clock.check(t)?;
        self.step_impl(a, t).map_err(|e| e.at_time(t))?;
        self.clock.advance(t, self.dt);
        Ok(())
    }
}
