use crate::core::FdmError;
use crate::fdm::boundary::FdmBoundaryConditionSet;
use crate::fdm::operators::LinearOpComposite;

use super::{FdmScheme, StepClock, explicit_step};

/// Forward Euler: `a ← a + θ·dt·L(a)`.
///
/// Only conditionally stable; mainly useful as the explicit half of
/// [`super::CrankNicolsonScheme`].
pub struct ExplicitEulerScheme<'a> {
    map: &'a mut dyn LinearOpComposite,
    bc_set: &'a mut FdmBoundaryConditionSet,
    dt: f64,
    clock: StepClock,
}

impl<'a> ExplicitEulerScheme<'a> {
    /// Creates the scheme.
    pub fn new(
        map: &'a mut dyn LinearOpComposite,
        bc_set: &'a mut FdmBoundaryConditionSet,
    ) -> Self {
        Self {
            map,
            bc_set,
            dt: 0.0,
            clock: StepClock::default(),
        }
    }

    /// Step with explicit weight `theta`.
    pub fn step_with_theta(&mut self, a: &mut [f64], t: f64, theta: f64) -> Result<(), FdmError> {
        self.clock.check(t)?;
        explicit_step(self.map, self.bc_set, a, t, self.dt, theta).map_err(|e| e.at_time(t))?;
        self.clock.advance(t, self.dt);
        Ok(())
    }
}

impl FdmScheme for ExplicitEulerScheme<'_> {
    fn set_step(&mut self, dt: f64) {
        self.dt = dt;
    }

    fn step(&mut self, a: &mut [f64], t: f64) -> Result<(), FdmError> {
        self.step_with_theta(a, t, 1.0)
    }
}
