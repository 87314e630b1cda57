use std::sync::Arc;

use approx::assert_relative_eq;
use ferric_fdm::core::OptionType;
use ferric_fdm::fdm::meshers::{Fdm1dMesher, FdmMesherComposite, MeshPoint, ornstein_uhlenbeck};
use ferric_fdm::fdm::operators::{FdmCevOp, FdmG2Op, FdmHullWhiteOp};
use ferric_fdm::fdm::solvers::{
    Fdm1DimSolver, Fdm2DimSolver, FdmBlackScholesSolver, FdmHestonSolver, FdmSolverDesc,
};
use ferric_fdm::fdm::FdmSchemeDesc;
use ferric_fdm::models::{
    BlackScholesProcess, CevProcess, G2Process, HestonProcess, HullWhiteProcess, RateCurve,
    ZeroCurve,
};
use statrs::distribution::{Continuous, ContinuousCDF, Normal};

fn upward_curve() -> Arc<dyn RateCurve> {
    Arc::new(
        ZeroCurve::new(vec![0.5, 1.0, 2.0, 5.0], vec![0.02, 0.025, 0.03, 0.035])
            .expect("valid pillars"),
    )
}

fn unit_payoff(_p: &MeshPoint, _t: f64) -> f64 {
    1.0
}

#[test]
fn hull_white_zero_bond_reprices_the_curve() {
    let curve = upward_curve();
    let process = HullWhiteProcess::new(Arc::clone(&curve), 0.1, 0.01);
    let axis = ornstein_uhlenbeck(0.1, 0.01, 2.0, 41, 1.0e-5).expect("valid axis");
    let mesher = FdmMesherComposite::shared(vec![axis]).expect("valid mesher");
    let mut op = FdmHullWhiteOp::new(Arc::clone(&mesher), process, 0).expect("operator");
    let desc = FdmSolverDesc::new(mesher, Arc::new(unit_payoff), 2.0, 100);
    let solver = Fdm1DimSolver::new(desc, FdmSchemeDesc::douglas(), &mut op).expect("solver runs");
    assert_relative_eq!(
        solver.interpolate_at(0.0).expect("inside grid"),
        curve.discount(2.0),
        max_relative = 1.0e-3
    );
}

#[test]
fn g2_zero_bond_reprices_the_curve() {
    let curve = upward_curve();
    let process = G2Process {
        curve: Arc::clone(&curve),
        a: 0.2,
        sigma: 0.01,
        b: 0.05,
        eta: 0.008,
        rho: -0.6,
    };
    let mesher = FdmMesherComposite::shared(vec![
        ornstein_uhlenbeck(0.2, 0.01, 2.0, 21, 1.0e-5).expect("valid axis"),
        ornstein_uhlenbeck(0.05, 0.008, 2.0, 21, 1.0e-5).expect("valid axis"),
    ])
    .expect("valid mesher");
    let mut op = FdmG2Op::new(Arc::clone(&mesher), process, 0, 1).expect("operator");
    let desc = FdmSolverDesc::new(mesher, Arc::new(unit_payoff), 2.0, 50);
    let solver = Fdm2DimSolver::new(desc, FdmSchemeDesc::hundsdorfer(), &mut op)
        .expect("solver runs");
    assert_relative_eq!(
        solver.interpolate_at(0.0, 0.0).expect("inside grid"),
        curve.discount(2.0),
        max_relative = 2.0e-3
    );
}

#[test]
fn cev_with_unit_elasticity_is_black_76() {
    let (forward, strike, vol, rate, t) = (100.0, 100.0, 0.2, 0.03, 1.0);
    let process = CevProcess::new(forward, vol, 1.0, rate);
    let axis = Fdm1dMesher::concentrating(1.0, 400.0, 301, Some((strike, 0.1)), true)
        .expect("valid axis");
    let mesher = FdmMesherComposite::shared(vec![axis]).expect("valid mesher");
    let mut op = FdmCevOp::new(Arc::clone(&mesher), process, 0).expect("operator");
    let payoff = move |p: &MeshPoint, _t: f64| (p.locations[0] - strike).max(0.0);
    let desc = FdmSolverDesc::new(mesher, Arc::new(payoff), t, 100).with_damping_steps(2);
    let solver = Fdm1DimSolver::new(desc, FdmSchemeDesc::douglas(), &mut op).expect("solver runs");

    let n = Normal::standard();
    let d1 = 0.5 * vol * t.sqrt();
    let black = (-rate * t).exp() * (forward * n.cdf(d1) - strike * n.cdf(-d1));
    assert_relative_eq!(
        solver.interpolate_at(forward).expect("inside grid"),
        black,
        max_relative = 5.0e-3
    );
}

#[test]
fn heston_with_vanishing_vol_of_vol_matches_closed_form_black_scholes() {
    let heston =
        HestonProcess::new(100.0, 0.03, 0.01).with_variance_dynamics(0.04, 1.0, 0.04, 1.0e-3, 0.0);
    let price = FdmHestonSolver::builder(heston, OptionType::Put, 105.0, 1.0)
        .with_x_grid(120)
        .with_v_grid(15)
        .with_time_steps(50)
        .with_damping_steps(2)
        .solve()
        .expect("solver runs")
        .value()
        .expect("inside grid");

    let n = Normal::standard();
    let (s, k, r, q, vol, t) = (100.0_f64, 105.0, 0.03, 0.01, 0.2, 1.0_f64);
    let d1 = ((s / k).ln() + (r - q + 0.5 * vol * vol) * t) / (vol * t.sqrt());
    let d2 = d1 - vol * t.sqrt();
    let put = k * (-r * t).exp() * n.cdf(-d2) - s * (-q * t).exp() * n.cdf(-d1);
    assert_relative_eq!(price, put, max_relative = 1.0e-2);
}

#[test]
fn black_scholes_greeks_match_closed_form() {
    let (s, k, r, vol, t) = (100.0_f64, 95.0, 0.04, 0.3, 0.75_f64);
    let solver = FdmBlackScholesSolver::builder(
        BlackScholesProcess::new(s, r, 0.0, vol),
        OptionType::Call,
        k,
        t,
    )
    .with_x_grid(250)
    .with_time_steps(150)
    .with_damping_steps(2)
    .solve()
    .expect("solver runs");

    let n = Normal::standard();
    let d1 = ((s / k).ln() + (r + 0.5 * vol * vol) * t) / (vol * t.sqrt());
    let d2 = d1 - vol * t.sqrt();
    let delta = n.cdf(d1);
    let gamma = n.pdf(d1) / (s * vol * t.sqrt());
    let theta = -s * n.pdf(d1) * vol / (2.0 * t.sqrt()) - r * k * (-r * t).exp() * n.cdf(d2);

    assert_relative_eq!(solver.delta_at(s).expect("delta"), delta, max_relative = 5.0e-3);
    assert_relative_eq!(solver.gamma_at(s).expect("gamma"), gamma, max_relative = 2.0e-2);
    assert_relative_eq!(solver.theta_at(s).expect("theta"), theta, max_relative = 5.0e-2);
}

#[test]
fn constant_local_volatility_reproduces_flat_volatility() {
    let flat = BlackScholesProcess::new(100.0, 0.02, 0.0, 0.25);
    let local = flat.clone().with_local_vol(Arc::new(|_t: f64, _s: f64| 0.25));
    let price = |process| {
        FdmBlackScholesSolver::builder(process, OptionType::Call, 110.0, 0.5)
            .with_x_grid(120)
            .with_time_steps(60)
            .solve()
            .expect("solver runs")
            .value()
            .expect("inside grid")
    };
    assert_relative_eq!(price(local), price(flat), max_relative = 1.0e-12);
}
