use crate::core::FdmError;
use crate::fdm::boundary::FdmBoundaryConditionSet;
use crate::fdm::operators::LinearOpComposite;

use super::{FdmScheme, StepClock, axpy, begin_step, diff, directional_sweeps};

/// Craig-Sneyd ADI: Douglas predictor, then a correction of the mixed
/// derivative term weighted `μ` and a second round of axis sweeps.
pub struct CraigSneydScheme<'a> {
    theta: f64,
    mu: f64,
    map: &'a mut dyn LinearOpComposite,
    bc_set: &'a mut FdmBoundaryConditionSet,
    dt: f64,
    clock: StepClock,
}

impl<'a> CraigSneydScheme<'a> {
    /// Creates the scheme.
    pub fn new(
        theta: f64,
        mu: f64,
        map: &'a mut dyn LinearOpComposite,
        bc_set: &'a mut FdmBoundaryConditionSet,
    ) -> Self {
        Self {
            theta,
            mu,
            map,
            bc_set,
            dt: 0.0,
            clock: StepClock::default(),
        }
    }

    fn step_impl(&mut self, a: &mut [f64], t: f64) -> Result<(), FdmError> {
        let theta_dt = self.theta * self.dt;
        begin_step(self.map, self.bc_set, a, t, self.dt)?;

        self.bc_set.apply_before_applying(self.map);
        let mut y0 = axpy(a, self.dt, &self.map.apply(a)?);
        self.bc_set.apply_after_applying(&mut y0);
        let y = directional_sweeps(self.map, y0.clone(), a, theta_dt)?;

        self.bc_set.apply_before_applying(self.map);
        let mut yt = axpy(&y0, self.mu * self.dt, &self.map.apply_mixed(&diff(&y, a))?);
        self.bc_set.apply_after_applying(&mut yt);

        let mut yt = directional_sweeps(self.map, yt, a, theta_dt)?;
        self.bc_set.apply_after_solving(&mut yt);
        a.copy_from_slice(&yt);
        Ok(())
    }
}

impl FdmScheme for CraigSneydScheme<'_> {
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
