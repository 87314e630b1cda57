use crate::core::FdmError;
use crate::fdm::boundary::FdmBoundaryConditionSet;
use crate::fdm::operators::LinearOpComposite;

use super::{FdmScheme, StepClock, axpy, begin_step, directional_sweeps};

/// Douglas ADI: explicit predictor followed by one implicit correction per axis.
pub struct DouglasScheme<'a> {
    theta: f64,
    map: &'a mut dyn LinearOpComposite,
    bc_set: &'a mut FdmBoundaryConditionSet,
    dt: f64,
    clock: StepClock,
}

impl<'a> DouglasScheme<'a> {
    /// Creates the scheme.
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
        begin_step(self.map, self.bc_set, a, t, self.dt)?;
        self.bc_set.apply_before_applying(self.map);
        let mut y = axpy(a, self.dt, &self.map.apply(a)?);
        self.bc_set.apply_after_applying(&mut y);

        let mut y = directional_sweeps(self.map, y, a, self.theta * self.dt)?;
        self.bc_set.apply_after_solving(&mut y);
        a.copy_from_slice(&y);
        Ok(())
    }
}

impl FdmScheme for DouglasScheme<'_> {
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
