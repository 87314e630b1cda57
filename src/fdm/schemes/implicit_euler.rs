use tracing::debug;

use crate::core::FdmError;
use crate::fdm::boundary::FdmBoundaryConditionSet;
use crate::fdm::operators::LinearOpComposite;
use crate::math::BiCgStab;

use super::{FdmScheme, StepClock, begin_step};

const BICGSTAB_MAX_ITERATIONS: usize = 100;
const BICGSTAB_REL_TOL: f64 = 1.0e-8;

/// Implicit step with weight `theta`: solves `(I − θ·dt·L)·x = a`.
///
/// One-dimensional grids use the tridiagonal solve directly; otherwise a
/// BiCGStab iteration preconditioned by the first-axis splitting solve.
pub(crate) fn implicit_step(
    map: &mut dyn LinearOpComposite,
    bc_set: &mut FdmBoundaryConditionSet,
    a: &mut [f64],
    t: f64,
    dt: f64,
    theta: f64,
) -> Result<(), FdmError> {
    begin_step(map, bc_set, a, t, dt)?;
    bc_set.apply_before_solving(map, a);

    let theta_dt = theta * dt;
    let x = if map.mesher().ndim() == 1 {
        map.solve_splitting(0, a, -theta_dt)?
    } else {
        let op: &dyn LinearOpComposite = map;
        let result = BiCgStab::new(BICGSTAB_MAX_ITERATIONS, BICGSTAB_REL_TOL).solve(
            |x| {
                let lx = op.apply(x)?;
                Ok(x.iter().zip(&lx).map(|(xi, li)| xi - theta_dt * li).collect())
            },
            |r| op.preconditioner(r, -theta_dt),
            &*a,
            Some(&*a),
        )?;
        debug!(
            iterations = result.iterations,
            error = result.error,
            t,
            "implicit step converged"
        );
        result.x
    };
    a.copy_from_slice(&x);
    bc_set.apply_after_solving(a);
    Ok(())
}

/// Backward Euler: `(I − θ·dt·L)·a_new = a`.
pub struct ImplicitEulerScheme<'a> {
    map: &'a mut dyn LinearOpComposite,
    bc_set: &'a mut FdmBoundaryConditionSet,
    dt: f64,
    clock: StepClock,
}

impl<'a> ImplicitEulerScheme<'a> {
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

    /// Step with implicit weight `theta`.
    pub fn step_with_theta(&mut self, a: &mut [f64], t: f64, theta: f64) -> Result<(), FdmError> {
        self.clock.check(t)?;
        implicit_step(self.map, self.bc_set, a, t, self.dt, theta).map_err(|e| e.at_time(t))?;
        self.clock.advance(t, self.dt);
        Ok(())
    }
}

impl FdmScheme for ImplicitEulerScheme<'_> {
    fn set_step(&mut self, dt: f64) {
        self.dt = dt;
    }

    fn step(&mut self, a: &mut [f64], t: f64) -> Result<(), FdmError> {
        self.step_with_theta(a, t, 1.0)
    }
}
