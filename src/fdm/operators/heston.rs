use std::fmt;
use std::sync::Arc;

use crate::core::FdmError;
use crate::fdm::meshers::FdmMesherComposite;
use crate::models::{HestonProcess, LocalVolSurface};

use super::composite::{SplitMaps, SplitOperator};
use super::derivatives::{first_derivative, mixed_derivative, second_derivative};
use super::nine_point::NinePointLinearOp;
use super::triple_band::TripleBandLinearOp;

/// Heston generator on axis 0 = `ln S` and axis 1 = `v`.
///
/// Equity part `½vL²∂xx + (r − q − ½vL²)∂x − ½r`, variance part
/// `½σ²v∂vv + κ(θ − v)∂v − ½r` and cross term `ρσvL∂xv`, with `L ≡ 1` unless
/// a leverage function is installed.
#[derive(Clone)]
pub struct FdmHestonOp {
    mesher: Arc<FdmMesherComposite>,
    process: HestonProcess,
    leverage: Option<Arc<dyn LocalVolSurface>>,
    x: Vec<f64>,
    v: Vec<f64>,
    dx: TripleBandLinearOp,
    dxx: TripleBandLinearOp,
    map_v: TripleBandLinearOp,
    dxv: NinePointLinearOp,
    maps: Option<SplitMaps>,
}

impl fmt::Debug for FdmHestonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FdmHestonOp")
            .field("process", &self.process)
            .field("leverage", &self.leverage.is_some())
            .field("size", &self.mesher.size())
            .finish()
    }
}

impl FdmHestonOp {
    /// Operator on a two-dimensional `(ln S, v)` mesher.
    pub fn new(mesher: Arc<FdmMesherComposite>, process: HestonProcess) -> Result<Self, FdmError> {
        process.validate()?;
        if mesher.ndim() < 2 {
            return Err(FdmError::configuration(
                "the Heston operator needs a (ln S, v) grid",
            ));
        }
        let x = mesher.locations(0);
        let v = mesher.locations(1);

        let dx = first_derivative(0, &mesher)?;
        let dxx = second_derivative(0, &mesher)?;

        let var_drift: Vec<f64> = v.iter().map(|v| process.kappa * (process.theta - v)).collect();
        let var_diffusion: Vec<f64> = v
            .iter()
            .map(|v| 0.5 * process.sigma * process.sigma * v)
            .collect();
        let mut map_v = TripleBandLinearOp::new(1, Arc::clone(&mesher))?;
        map_v.axpyb(
            &var_drift,
            &first_derivative(1, &mesher)?,
            &second_derivative(1, &mesher)?.mult(&var_diffusion)?,
            &[],
        )?;
        let dxv = mixed_derivative(0, 1, &mesher)?;

        Ok(Self {
            mesher,
            process,
            leverage: None,
            x,
            v,
            dx,
            dxx,
            map_v,
            dxv,
            maps: None,
        })
    }

    /// Installs a leverage function `L(t, S)` scaling the equity volatility.
    pub fn with_leverage(mut self, leverage: Arc<dyn LocalVolSurface>) -> Self {
        self.leverage = Some(leverage);
        self
    }

    /// The underlying process.
    pub fn process(&self) -> &HestonProcess {
        &self.process
    }

    fn effective_variance(&self, t_mid: f64) -> Vec<f64> {
        match &self.leverage {
            Some(l) => self
                .x
                .iter()
                .zip(&self.v)
                .map(|(x, v)| {
                    let lev = l.local_vol(t_mid, x.exp());
                    v * lev * lev
                })
                .collect(),
            None => self.v.clone(),
        }
    }

    /// Equity map for the given rates and effective variance.
    pub(crate) fn equity_map(
        &self,
        drift_rate: &[f64],
        variance: &[f64],
        discount: &[f64],
    ) -> Result<TripleBandLinearOp, FdmError> {
        let drift: Vec<f64> = variance
            .iter()
            .enumerate()
            .map(|(i, v)| drift_rate[i.min(drift_rate.len() - 1)] - 0.5 * v)
            .collect();
        let half_var: Vec<f64> = variance.iter().map(|v| 0.5 * v).collect();
        let mut map = TripleBandLinearOp::new(0, Arc::clone(&self.mesher))?;
        map.axpyb(&drift, &self.dx, &self.dxx.mult(&half_var)?, discount)?;
        Ok(map)
    }

    /// Cross term `ρσ√(v·var_eff)∂xv`, which reduces to `ρσvL∂xv`.
    pub(crate) fn correlation_map(&self, variance: &[f64]) -> Result<NinePointLinearOp, FdmError> {
        let rho_sigma = self.process.rho * self.process.sigma;
        let weights: Vec<f64> = variance
            .iter()
            .zip(&self.v)
            .map(|(ve, v)| rho_sigma * (ve * v).max(0.0).sqrt())
            .collect();
        self.dxv.mult(&weights)
    }

    pub(crate) fn variance_map(&self) -> &TripleBandLinearOp {
        &self.map_v
    }
}

impl SplitOperator for FdmHestonOp {
    fn grid(&self) -> &Arc<FdmMesherComposite> {
        &self.mesher
    }

    fn axis_count(&self) -> usize {
        2
    }

    fn build_maps(&self, t1: f64, t2: f64) -> Result<SplitMaps, FdmError> {
        let r = self.process.risk_free.forward_rate(t1, t2);
        let q = self.process.dividend.forward_rate(t1, t2);
        let variance = self.effective_variance(0.5 * (t1 + t2));

        let map_x = self.equity_map(&[r - q], &variance, &[-0.5 * r])?;
        let map_v = self.map_v.add_to_diagonal(&[-0.5 * r])?;
        Ok(SplitMaps {
            axes: vec![map_x, map_v],
            mixed: vec![self.correlation_map(&variance)?],
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
