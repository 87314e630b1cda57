use crate::core::FdmError;
use crate::fdm::boundary::FdmBoundaryConditionSet;
use crate::fdm::operators::LinearOpComposite;
use crate::math::AdaptiveRungeKutta;

use super::{FdmScheme, StepClock, begin_step};

/// Width of the coefficient window used for each right-hand side evaluation.
const RHS_TIME_WINDOW: f64 = 1.0e-4;

/// Integrates the semi-discrete system `du/dτ = −L(τ)·u` from `t` down to
/// `t − dt` with an adaptive Cash-Karp Runge-Kutta method.
pub struct MethodOfLinesScheme<'a> {
    eps: f64,
    rel_init_step: f64,
    map: &'a mut dyn LinearOpComposite,
    bc_set: &'a mut FdmBoundaryConditionSet,
    dt: f64,
    clock: StepClock,
}

impl<'a> MethodOfLinesScheme<'a> {
    /// Creates the scheme with integrator accuracy `eps` and initial step `rel_init_step·dt`.
    pub fn new(
        eps: f64,
        rel_init_step: f64,
        map: &'a mut dyn LinearOpComposite,
        bc_set: &'a mut FdmBoundaryConditionSet,
    ) -> Self {
        Self {
            eps,
            rel_init_step,
            map,
            bc_set,
            dt: 0.0,
            clock: StepClock::default(),
        }
    }

    fn step_impl(&mut self, a: &mut [f64], t: f64) -> Result<(), FdmError> {
        begin_step(self.map, self.bc_set, a, t, self.dt)?;
        let t_end = (t - self.dt).max(0.0);

        let map = &mut *self.map;
        let bc_set = &*self.bc_set;
        let rk = AdaptiveRungeKutta::new(self.eps, self.rel_init_step * self.dt);
        let mut u = rk.integrate(
            |tau, r| {
                map.set_time(tau, tau + RHS_TIME_WINDOW)?;
                bc_set.apply_before_applying(&mut *map);
                let mut dudt = map.apply(r)?;
                dudt.iter_mut().for_each(|v| *v = -*v);
                Ok(dudt)
            },
            a.to_vec(),
            t,
            t_end,
        )?;

        self.bc_set.apply_after_solving(&mut u);
        a.copy_from_slice(&u);
        Ok(())
    }
}

impl FdmScheme for MethodOfLinesScheme<'_> {
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
