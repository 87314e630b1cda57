//! Backward time marching with stopping times and damping steps.

use tracing::{debug, trace};

use crate::core::{FdmError, TIME_TOLERANCE};
use crate::fdm::boundary::FdmBoundaryConditionSet;
use crate::fdm::operators::LinearOpComposite;
use crate::fdm::schemes::{FdmScheme, FdmSchemeDesc, SchemeKind, build_scheme};
use crate::fdm::step_conditions::FdmStepConditionComposite;

/// Rolls a value array back in time with a chosen scheme.
///
/// The solver borrows the operator, boundary conditions and step conditions
/// for its lifetime; independent runs need independent instances.
pub struct FdmBackwardSolver<'a> {
    map: &'a mut dyn LinearOpComposite,
    bc_set: &'a mut FdmBoundaryConditionSet,
    condition: &'a mut FdmStepConditionComposite,
    scheme: FdmSchemeDesc,
}

impl<'a> FdmBackwardSolver<'a> {
    /// Creates a solver over `map`.
    pub fn new(
        map: &'a mut dyn LinearOpComposite,
        bc_set: &'a mut FdmBoundaryConditionSet,
        condition: &'a mut FdmStepConditionComposite,
        scheme: FdmSchemeDesc,
    ) -> Self {
        Self {
            map,
            bc_set,
            condition,
            scheme,
        }
    }

    /// Scheme used for the non-damping steps.
    pub fn scheme(&self) -> &FdmSchemeDesc {
        &self.scheme
    }

    /// Rolls `a` back from `from` to `to`.
    ///
    /// The first `damping_steps` steps (of `steps + damping_steps` equal
    /// steps in total) use implicit Euler to smooth payoff kinks.
    pub fn rollback(
        &mut self,
        a: &mut [f64],
        from: f64,
        to: f64,
        steps: usize,
        damping_steps: usize,
    ) -> Result<(), FdmError> {
        if !(from.is_finite() && to.is_finite()) || from < to {
            return Err(FdmError::configuration(format!(
                "rollback needs finite times with from >= to, got from={from} to={to}"
            )));
        }
        if steps == 0 {
            return Err(FdmError::configuration("rollback needs at least one time step"));
        }

        let all_steps = steps + damping_steps;
        let damping_to = from - (from - to) * damping_steps as f64 / all_steps as f64;
        debug!(
            from,
            to,
            steps,
            damping_steps,
            scheme = ?self.scheme.kind,
            "backward rollback"
        );

        let (start, main_steps) = if damping_steps == 0 {
            (from, steps)
        } else if self.scheme.kind == SchemeKind::ImplicitEuler {
            (from, all_steps)
        } else {
            let damping = FdmSchemeDesc::implicit_euler();
            let mut scheme = build_scheme(&damping, self.map, self.bc_set)?;
            march(scheme.as_mut(), self.condition, a, from, damping_to, damping_steps)?;
            (damping_to, steps)
        };

        let mut scheme = build_scheme(&self.scheme, self.map, self.bc_set)?;
        march(scheme.as_mut(), self.condition, a, start, to, main_steps)
    }
}

/// Equal steps from `from` to `to`, cut at every stopping time in between.
fn march(
    scheme: &mut dyn FdmScheme,
    condition: &mut FdmStepConditionComposite,
    a: &mut [f64],
    from: f64,
    to: f64,
    steps: usize,
) -> Result<(), FdmError> {
    let dt = (from - to) / steps as f64;
    scheme.set_step(dt);

    let stopping_times = condition.stopping_times().to_vec();
    if stopping_times
        .last()
        .is_some_and(|&last| (last - from).abs() <= TIME_TOLERANCE)
    {
        condition.apply_to(a, from)?;
    }

    let mut t = from;
    for i in 0..steps {
        let mut now = t;
        let next = if i + 1 == steps || (to - (t - dt)).abs() < TIME_TOLERANCE {
            to
        } else {
            t - dt
        };

        let mut hit = false;
        for &stop in stopping_times.iter().rev() {
            if next <= stop && stop < now - TIME_TOLERANCE {
                hit = true;
                scheme.set_step(now - stop);
                scheme.step(a, now)?;
                condition.apply_to(a, stop)?;
                trace!(t = stop, "stopping time");
                now = stop;
            }
        }

        if hit {
            if now - next > TIME_TOLERANCE {
                scheme.set_step(now - next);
                scheme.step(a, now)?;
                condition.apply_to(a, next)?;
            }
            scheme.set_step(dt);
        } else {
            scheme.set_step(now - next);
            scheme.step(a, now)?;
            condition.apply_to(a, next)?;
            scheme.set_step(dt);
        }
        trace!(t = next, "step done");
        t = next;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fdm::meshers::{Fdm1dMesher, FdmMesherComposite};
    use crate::fdm::operators::FdmBlackScholesOp;
    use crate::fdm::step_conditions::{ConditionTimes, StepCondition};
    use crate::models::BlackScholesProcess;
    use std::sync::{Arc, Mutex};

    struct Recorder {
        times: ConditionTimes,
        seen: Arc<Mutex<Vec<f64>>>,
    }

    impl StepCondition for Recorder {
        fn times(&self) -> ConditionTimes {
            self.times.clone()
        }

        fn apply_to(&mut self, _a: &mut [f64], t: f64) -> Result<(), FdmError> {
            self.seen.lock().unwrap().push(t);
            Ok(())
        }
    }

    fn op(rate: f64) -> FdmBlackScholesOp {
        let mesher =
            FdmMesherComposite::shared(vec![Fdm1dMesher::uniform(3.0, 6.0, 21).unwrap()]).unwrap();
        FdmBlackScholesOp::new(mesher, BlackScholesProcess::new(100.0, rate, 0.0, 0.2), 0).unwrap()
    }

    #[test]
    fn stopping_times_split_steps_and_fire_conditions() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut conditions = FdmStepConditionComposite::new().with(Recorder {
            times: ConditionTimes::At(vec![0.35, 1.0]),
            seen: Arc::clone(&seen),
        });
        let mut map = op(0.0);
        let mut bcs = FdmBoundaryConditionSet::new();
        let mut solver =
            FdmBackwardSolver::new(&mut map, &mut bcs, &mut conditions, FdmSchemeDesc::douglas());
        let mut a = vec![1.0; 21];
        solver.rollback(&mut a, 1.0, 0.0, 4, 0).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![1.0, 0.35]);
    }

    #[test]
    fn every_step_conditions_see_each_sub_step() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut conditions = FdmStepConditionComposite::new().with(Recorder {
            times: ConditionTimes::EveryStep,
            seen: Arc::clone(&seen),
        });
        let mut map = op(0.0);
        let mut bcs = FdmBoundaryConditionSet::new();
        let mut solver = FdmBackwardSolver::new(
            &mut map,
            &mut bcs,
            &mut conditions,
            FdmSchemeDesc::crank_nicolson(),
        );
        let mut a = vec![1.0; 21];
        solver.rollback(&mut a, 1.0, 0.0, 3, 2).unwrap();
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 5);
        assert_eq!(*seen.last().unwrap(), 0.0);
        assert!(seen.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn discounting_a_constant_matches_the_rate() {
        let mut conditions = FdmStepConditionComposite::new();
        let mut map = op(0.05);
        let mut bcs = FdmBoundaryConditionSet::new();
        let mut solver =
            FdmBackwardSolver::new(&mut map, &mut bcs, &mut conditions, FdmSchemeDesc::douglas());
        let mut a = vec![1.0; 21];
        solver.rollback(&mut a, 1.0, 0.0, 50, 0).unwrap();
        for v in a {
            assert!((v - (-0.05_f64).exp()).abs() < 1.0e-4);
        }
    }

    #[test]
    fn inverted_interval_is_rejected() {
        let mut conditions = FdmStepConditionComposite::new();
        let mut map = op(0.0);
        let mut bcs = FdmBoundaryConditionSet::new();
        let mut solver =
            FdmBackwardSolver::new(&mut map, &mut bcs, &mut conditions, FdmSchemeDesc::douglas());
        let mut a = vec![1.0; 21];
        assert!(matches!(
            solver.rollback(&mut a, 0.0, 1.0, 10, 0),
            Err(FdmError::Configuration(_))
        ));
    }
}
