use std::sync::Arc;

use crate::core::FdmError;
use crate::fdm::meshers::FdmMesherComposite;
use crate::models::BlackScholesProcess;

use super::composite::{SplitMaps, SplitOperator};
use super::derivatives::{first_derivative, second_derivative};
use super::triple_band::TripleBandLinearOp;

/// Black-Scholes generator in log-spot `x = ln S`:
/// `½σ²∂xx + (r − q − ½σ²)∂x − r`.
///
/// With a local volatility surface, `σ` is evaluated per grid point at the
/// middle of the step.
#[derive(Debug, Clone)]
pub struct FdmBlackScholesOp {
    mesher: Arc<FdmMesherComposite>,
    process: BlackScholesProcess,
    direction: usize,
    x: Vec<f64>,
    dx: TripleBandLinearOp,
    dxx: TripleBandLinearOp,
    maps: Option<SplitMaps>,
}

impl FdmBlackScholesOp {
    /// Operator on the log-spot axis `direction` of `mesher`.
    pub fn new(
        mesher: Arc<FdmMesherComposite>,
        process: BlackScholesProcess,
        direction: usize,
    ) -> Result<Self, FdmError> {
        process.validate()?;
        let dx = first_derivative(direction, &mesher)?;
        let dxx = second_derivative(direction, &mesher)?;
        let x = mesher.locations(direction);
        Ok(Self {
            mesher,
            process,
            direction,
            x,
            dx,
            dxx,
            maps: None,
        })
    }

    /// The underlying process.
    pub fn process(&self) -> &BlackScholesProcess {
        &self.process
    }
}

impl SplitOperator for FdmBlackScholesOp {
    fn grid(&self) -> &Arc<FdmMesherComposite> {
        &self.mesher
    }

    fn axis_count(&self) -> usize {
        1
    }

    fn build_maps(&self, t1: f64, t2: f64) -> Result<SplitMaps, FdmError> {
        let r = self.process.risk_free.forward_rate(t1, t2);
        let q = self.process.dividend.forward_rate(t1, t2);

        let variance: Vec<f64> = match &self.process.local_vol {
            Some(surface) => {
                let t_mid = 0.5 * (t1 + t2);
                self.x
                    .iter()
                    .map(|x| {
                        let sigma = surface.local_vol(t_mid, x.exp());
                        sigma * sigma
                    })
                    .collect()
            }
            None => vec![self.process.vol * self.process.vol],
        };

        let drift: Vec<f64> = variance.iter().map(|v| r - q - 0.5 * v).collect();
        let half_var: Vec<f64> = variance.iter().map(|v| 0.5 * v).collect();

        let mut map = TripleBandLinearOp::new(self.direction, Arc::clone(&self.mesher))?;
        map.axpyb(&drift, &self.dx, &self.dxx.mult(&half_var)?, &[-r])?;
        Ok(SplitMaps {
            axes: vec![map],
            mixed: Vec::new(),
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
