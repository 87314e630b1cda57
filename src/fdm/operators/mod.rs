//! Banded differential operators and the model generators built from them.

pub mod black_scholes;
pub mod cev;
pub mod composite;
pub mod derivatives;
pub mod g2;
pub mod heston;
pub mod heston_hull_white;
pub mod hull_white;
pub mod model;
pub mod nine_point;
pub mod triple_band;

pub use black_scholes::FdmBlackScholesOp;
pub use cev::FdmCevOp;
pub use composite::{LinearOpComposite, SplitMaps, SplitOperator};
pub use derivatives::{first_derivative, mixed_derivative, second_derivative};
pub use g2::FdmG2Op;
pub use heston::FdmHestonOp;
pub use heston_hull_white::FdmHestonHullWhiteOp;
pub use hull_white::FdmHullWhiteOp;
pub use model::ModelOperator;
pub use nine_point::NinePointLinearOp;
pub use triple_band::TripleBandLinearOp;
