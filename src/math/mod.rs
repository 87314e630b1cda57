//! Numerical kernels used by the finite-difference engine: banded solves,
//! Krylov iteration, adaptive ODE integration and spline interpolation.

pub mod bicgstab;
pub mod ode;
pub mod spline;
pub mod tridiagonal;

pub use bicgstab::{BiCgStab, BiCgStabResult};
pub use ode::AdaptiveRungeKutta;
pub use spline::{BicubicSpline, CubicNaturalSpline};
pub use tridiagonal::{TridiagonalWorkspace, solve_tridiagonal_inplace};
