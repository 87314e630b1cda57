//! Grid construction: index layout, one-dimensional axes and their tensor product.

pub mod composite;
pub mod layout;
pub mod mesher1d;
pub mod process;

pub use composite::{Coordinates64, FdmMesherComposite, MeshIter, MeshPoint};
pub use layout::{Coordinates, FdmLinearOpLayout, LayoutIter};
pub use mesher1d::{Fdm1dMesher, MIN_AXIS_POINTS};
pub use process::{black_scholes_log_spot, heston_variance, ornstein_uhlenbeck};
