use std::sync::Arc;

use crate::core::FdmError;
use crate::fdm::meshers::FdmMesherComposite;
use crate::models::{HestonProcess, HullWhiteProcess};

use super::composite::{SplitMaps, SplitOperator};
use super::derivatives::mixed_derivative;
use super::heston::FdmHestonOp;
use super::hull_white::FdmHullWhiteOp;
use super::nine_point::NinePointLinearOp;

/// Heston equity/variance dynamics with a Hull-White short rate on axes
/// `(ln S, v, x_r)`.
///
/// The equity drift uses the stochastic short rate `x_r + φ(t)`, which also
/// discounts on the rate axis. Cross terms are `ρ_xv σ v ∂xv` and
/// `ρ_xr σ_r √v ∂xr`; variance and rate are uncorrelated.
#[derive(Debug, Clone)]
pub struct FdmHestonHullWhiteOp {
    mesher: Arc<FdmMesherComposite>,
    heston: FdmHestonOp,
    hull_white: FdmHullWhiteOp,
    corr_xr: NinePointLinearOp,
    maps: Option<SplitMaps>,
}

impl FdmHestonHullWhiteOp {
    /// Operator on a three-dimensional `(ln S, v, x_r)` mesher.
    pub fn new(
        mesher: Arc<FdmMesherComposite>,
        heston: HestonProcess,
        hull_white: HullWhiteProcess,
        rho_xr: f64,
    ) -> Result<Self, FdmError> {
        if mesher.ndim() != 3 {
            return Err(FdmError::configuration(
                "the Heston-Hull-White operator needs a (ln S, v, r) grid",
            ));
        }
        if !(rho_xr > -1.0 && rho_xr < 1.0) {
            return Err(FdmError::configuration("equity/rate correlation must be in (-1, 1)"));
        }
        let weights: Vec<f64> = mesher
            .locations(1)
            .iter()
            .map(|v| rho_xr * hull_white.sigma * v.max(0.0).sqrt())
            .collect();
        let corr_xr = mixed_derivative(0, 2, &mesher)?.mult(&weights)?;
        Ok(Self {
            heston: FdmHestonOp::new(Arc::clone(&mesher), heston)?,
            hull_white: FdmHullWhiteOp::new(Arc::clone(&mesher), hull_white, 2)?,
            mesher,
            corr_xr,
            maps: None,
        })
    }
}

impl SplitOperator for FdmHestonHullWhiteOp {
    fn grid(&self) -> &Arc<FdmMesherComposite> {
        &self.mesher
    }

    fn axis_count(&self) -> usize {
        3
    }

    fn build_maps(&self, t1: f64, t2: f64) -> Result<SplitMaps, FdmError> {
        let q = self.heston.process().dividend.forward_rate(t1, t2);
        let drift_rate: Vec<f64> = self
            .hull_white
            .short_rates(t1, t2)
            .iter()
            .map(|r| r - q)
            .collect();
        let variance = self.mesher.locations(1);

        let map_x = self.heston.equity_map(&drift_rate, &variance, &[])?;
        let map_v = self.heston.variance_map().clone();
        let map_r = self
            .hull_white
            .build_maps(t1, t2)?
            .axes
            .pop()
            .ok_or_else(|| FdmError::configuration("short-rate operator produced no map"))?;

        Ok(SplitMaps {
            axes: vec![map_x, map_v, map_r],
            mixed: vec![self.heston.correlation_map(&variance)?, self.corr_xr.clone()],
        })
    }

    fn maps(&self) -> Option<&SplitMaps> {
        self.maps.as_ref()
    }

    fn maps_mut(&mut self) -> Option<&mut SplitMaps> {
        self.maps.as_mut()
    }

    fn store_maps(&mut self, maps: SplitMaps) {
        self.maps = Some(maps);
    }
}
