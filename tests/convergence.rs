use std::sync::Arc;

use ferric_fdm::fdm::meshers::{Fdm1dMesher, FdmMesherComposite, MeshPoint};
use ferric_fdm::fdm::operators::{FdmBlackScholesOp, FdmHestonOp};
use ferric_fdm::fdm::solvers::{Fdm1DimSolver, Fdm2DimSolver, FdmSolverDesc};
use ferric_fdm::fdm::FdmSchemeDesc;
use ferric_fdm::models::{BlackScholesProcess, HestonProcess};

const CENTRE: f64 = 4.605_170_185_988_091; // ln 100

/// Smooth bump payoff, so that time discretisation dominates the error.
fn bump(p: &MeshPoint, _t: f64) -> f64 {
    let d = p.locations[0] - CENTRE;
    10.0 * (-d * d / 0.05).exp()
}

fn solve(scheme: FdmSchemeDesc, steps: usize) -> Vec<f64> {
    let mesher = FdmMesherComposite::shared(vec![
        Fdm1dMesher::uniform(CENTRE - 1.5, CENTRE + 1.5, 121).expect("valid axis"),
    ])
    .expect("valid mesher");
    let process = BlackScholesProcess::new(100.0, 0.05, 0.02, 0.3);
    let mut op = FdmBlackScholesOp::new(Arc::clone(&mesher), process, 0).expect("operator");
    let desc = FdmSolverDesc::new(mesher, Arc::new(bump), 1.0, steps);
    Fdm1DimSolver::new(desc, scheme, &mut op)
        .expect("solver runs")
        .grid_values()
        .to_vec()
}

fn max_diff(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).abs()).fold(0.0, f64::max)
}

fn observed_ratio(scheme: FdmSchemeDesc) -> f64 {
    let reference = solve(FdmSchemeDesc::crank_nicolson(), 2_560);
    let coarse = max_diff(&solve(scheme, 20), &reference);
    let fine = max_diff(&solve(scheme, 40), &reference);
    coarse / fine
}

#[test]
fn implicit_euler_converges_at_first_order() {
    let ratio = observed_ratio(FdmSchemeDesc::implicit_euler());
    assert!((1.7..2.4).contains(&ratio), "ratio={ratio}");
}

#[test]
fn crank_nicolson_and_douglas_converge_at_second_order() {
    for scheme in [FdmSchemeDesc::crank_nicolson(), FdmSchemeDesc::douglas()] {
        let ratio = observed_ratio(scheme);
        assert!((3.3..4.8).contains(&ratio), "{:?} ratio={ratio}", scheme.kind);
    }
}

#[test]
fn hundsdorfer_converges_at_second_order() {
    let ratio = observed_ratio(FdmSchemeDesc::hundsdorfer());
    assert!((3.0..5.0).contains(&ratio), "ratio={ratio}");
}

/// Bump in both log-spot and variance, kept away from the `v = 0` edge.
fn heston_bump(p: &MeshPoint, _t: f64) -> f64 {
    let dx = p.locations[0] - CENTRE;
    let dv = p.locations[1] - 0.15;
    10.0 * (-dx * dx / 0.05 - dv * dv / 0.005).exp()
}

fn solve_heston(scheme: FdmSchemeDesc, steps: usize) -> Vec<f64> {
    let mesher = FdmMesherComposite::shared(vec![
        Fdm1dMesher::uniform(CENTRE - 1.5, CENTRE + 1.5, 41).expect("valid axis"),
        Fdm1dMesher::uniform(0.0, 0.4, 21).expect("valid axis"),
    ])
    .expect("valid mesher");
    let process =
        HestonProcess::new(100.0, 0.03, 0.0).with_variance_dynamics(0.15, 1.5, 0.1, 0.5, -0.7);
    let mut op = FdmHestonOp::new(Arc::clone(&mesher), process).expect("operator");
    let desc = FdmSolverDesc::new(mesher, Arc::new(heston_bump), 0.5, steps);
    Fdm2DimSolver::new(desc, scheme, &mut op)
        .expect("solver runs")
        .grid_values()
        .to_vec()
}

#[test]
fn adi_schemes_with_correlation_converge_at_second_order() {
    for scheme in [
        FdmSchemeDesc::craig_sneyd(),
        FdmSchemeDesc::modified_craig_sneyd(),
        FdmSchemeDesc::hundsdorfer(),
    ] {
        let reference = solve_heston(scheme, 640);
        let coarse = max_diff(&solve_heston(scheme, 20), &reference);
        let fine = max_diff(&solve_heston(scheme, 40), &reference);
        let ratio = coarse / fine;
        assert!((2.8..5.6).contains(&ratio), "{:?} ratio={ratio}", scheme.kind);
    }
}
