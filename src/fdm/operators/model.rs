use std::sync::Arc;

use crate::core::FdmError;
use crate::fdm::meshers::FdmMesherComposite;

use super::black_scholes::FdmBlackScholesOp;
use super::cev::FdmCevOp;
use super::composite::{SplitMaps, SplitOperator};
use super::g2::FdmG2Op;
use super::heston::FdmHestonOp;
use super::heston_hull_white::FdmHestonHullWhiteOp;
use super::hull_white::FdmHullWhiteOp;

/// Closed set of the built-in model operators.
#[derive(Debug, Clone)]
pub enum ModelOperator {
    /// Black-Scholes / local volatility in log-spot.
    BlackScholes(FdmBlackScholesOp),
    /// Constant elasticity of variance on the forward.
    Cev(FdmCevOp),
    /// One-factor Hull-White.
    HullWhite(FdmHullWhiteOp),
    /// Two-factor Gaussian short rate.
    G2(FdmG2Op),
    /// Heston stochastic volatility.
    Heston(FdmHestonOp),
    /// Heston with a Hull-White short rate.
    HestonHullWhite(FdmHestonHullWhiteOp),
}

macro_rules! dispatch {
    ($self:expr, $op:ident => $body:expr) => {
        match $self {
            ModelOperator::BlackScholes($op) => $body,
            ModelOperator::Cev($op) => $body,
            ModelOperator::HullWhite($op) => $body,
            ModelOperator::G2($op) => $body,
            ModelOperator::Heston($op) => $body,
            ModelOperator::HestonHullWhite($op) => $body,
        }
    };
}

impl SplitOperator for ModelOperator {
    fn grid(&self) -> &Arc<FdmMesherComposite> {
        dispatch!(self, op => op.grid())
    }

    fn axis_count(&self) -> usize {
        dispatch!(self, op => op.axis_count())
    }

    fn build_maps(&self, t1: f64, t2: f64) -> Result<SplitMaps, FdmError> {
        dispatch!(self, op => op.build_maps(t1, t2))
    }

    fn maps(&self) -> Option<&SplitMaps> {
        dispatch!(self, op => op.maps())
    }

    fn maps_mut(&mut self) -> Option<&mut SplitMaps> {
        dispatch!(self, op => op.maps_mut())
    }

    fn store_maps(&mut self, maps: SplitMaps) {
        dispatch!(self, op => op.store_maps(maps))
    }
}

impl From<FdmBlackScholesOp> for ModelOperator {
    fn from(op: FdmBlackScholesOp) -> Self {
        Self::BlackScholes(op)
    }
}

impl From<FdmCevOp> for ModelOperator {
    fn from(op: FdmCevOp) -> Self {
        Self::Cev(op)
    }
}

impl From<FdmHullWhiteOp> for ModelOperator {
    fn from(op: FdmHullWhiteOp) -> Self {
        Self::HullWhite(op)
    }
}

impl From<FdmG2Op> for ModelOperator {
    fn from(op: FdmG2Op) -> Self {
        Self::G2(op)
    }
}

impl From<FdmHestonOp> for ModelOperator {
    fn from(op: FdmHestonOp) -> Self {
        Self::Heston(op)
    }
}

impl From<FdmHestonHullWhiteOp> for ModelOperator {
    fn from(op: FdmHestonHullWhiteOp) -> Self {
        Self::HestonHullWhite(op)
    }
}
