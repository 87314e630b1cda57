use std::sync::Arc;

use approx::assert_relative_eq;
use ferric_fdm::core::FdmError;
use ferric_fdm::fdm::meshers::{Fdm1dMesher, FdmMesherComposite};
use ferric_fdm::fdm::operators::{
    FdmHestonOp, LinearOpComposite, ModelOperator, first_derivative, second_derivative,
};
use ferric_fdm::models::HestonProcess;
use nalgebra::DVector;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn heston_mesher() -> Arc<FdmMesherComposite> {
    FdmMesherComposite::shared(vec![
        Fdm1dMesher::concentrating(3.5, 5.5, 25, Some((4.6, 0.2)), true).expect("valid axis"),
        Fdm1dMesher::concentrating(0.0, 0.5, 15, Some((0.04, 0.2)), false).expect("valid axis"),
    ])
    .expect("valid mesher")
}

fn heston_op() -> FdmHestonOp {
    let process =
        HestonProcess::new(100.0, 0.04, 0.01).with_variance_dynamics(0.04, 2.0, 0.05, 0.5, -0.7);
    FdmHestonOp::new(heston_mesher(), process).expect("operator")
}

fn random_array(rng: &mut StdRng, n: usize) -> Vec<f64> {
    (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect()
}

#[test]
fn full_application_is_sum_of_directional_and_mixed_parts() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut op = heston_op();
    op.set_time(0.25, 0.5).expect("set_time");
    let n = op.mesher().size();
    for _ in 0..5 {
        let r = random_array(&mut rng, n);
        let full = op.apply(&r).expect("apply");
        let mut parts = op.apply_mixed(&r).expect("mixed");
        for axis in 0..2 {
            let d = op.apply_direction(axis, &r).expect("direction");
            parts.iter_mut().zip(&d).for_each(|(p, di)| *p += di);
        }
        for (f, p) in full.iter().zip(&parts) {
            assert_relative_eq!(*f, *p, epsilon = 1.0e-10, max_relative = 1.0e-12);
        }
    }
}

#[test]
fn splitting_solve_inverts_shifted_directional_operator() {
    let mut rng = StdRng::seed_from_u64(11);
    let mut op = heston_op();
    op.set_time(0.0, 0.1).expect("set_time");
    let n = op.mesher().size();
    for axis in 0..2 {
        let r = random_array(&mut rng, n);
        let a = -0.05;
        let x = op.solve_splitting(axis, &r, a).expect("solve");
        let lx = op.apply_direction(axis, &x).expect("direction");
        for i in 0..n {
            assert_relative_eq!(x[i] + a * lx[i], r[i], epsilon = 1.0e-9);
        }
    }
}

#[test]
fn operator_must_be_timed_before_use() {
    let op = heston_op();
    let r = vec![0.0; op.mesher().size()];
    assert!(matches!(op.apply(&r), Err(FdmError::Configuration(_))));
    let mut op = ModelOperator::from(heston_op());
    op.set_time(0.0, 0.1).expect("set_time");
    assert!(op.apply(&r).is_ok());
}

#[test]
fn banded_application_matches_dense_matrix() {
    let mut rng = StdRng::seed_from_u64(3);
    let mesher = heston_mesher();
    let n = mesher.size();
    for axis in 0..2 {
        let dx = first_derivative(axis, &mesher).expect("dx");
        let dxx = second_derivative(axis, &mesher).expect("dxx");
        let op = dx.add(&dxx).expect("same axis");
        let r = random_array(&mut rng, n);
        let banded = op.apply(&r).expect("apply");
        let dense = op.to_matrix() * DVector::from_vec(r);
        for i in 0..n {
            assert_relative_eq!(banded[i], dense[i], epsilon = 1.0e-9);
        }
    }
}

#[test]
fn size_mismatch_is_a_configuration_error() {
    let mut op = heston_op();
    op.set_time(0.0, 0.1).expect("set_time");
    assert!(matches!(
        op.apply(&[1.0, 2.0]),
        Err(FdmError::Configuration(_))
    ));
}
