//! Model inputs consumed by the PDE operators: discount curves, local volatility
//! and the parameter sets of the supported diffusion families.

pub mod curves;
pub mod processes;

pub use curves::{FlatRate, RateCurve, ZeroCurve};
pub use processes::{
    BlackScholesProcess, CevProcess, G2Process, HestonProcess, HullWhiteProcess, LocalVolSurface,
};
