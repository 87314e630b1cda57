use std::sync::Arc;

use crate::core::FdmError;
use crate::fdm::meshers::FdmMesherComposite;
use crate::models::HullWhiteProcess;

use super::composite::{SplitMaps, SplitOperator};
use super::derivatives::{first_derivative, second_derivative};
use super::triple_band::TripleBandLinearOp;

/// Hull-White generator on `x = r − φ(t)`: `½σ²∂xx − a x ∂x − (x + φ(t))`.
///
/// `φ` is averaged over the step.
#[derive(Debug, Clone)]
pub struct FdmHullWhiteOp {
    mesher: Arc<FdmMesherComposite>,
    process: HullWhiteProcess,
    direction: usize,
    x: Vec<f64>,
    map_base: TripleBandLinearOp,
    maps: Option<SplitMaps>,
}

/// Time-independent part `½σ²∂xx − a x ∂x` of an Ornstein-Uhlenbeck factor.
pub(crate) fn ou_generator(
    mesher: &Arc<FdmMesherComposite>,
    direction: usize,
    a: f64,
    sigma: f64,
) -> Result<TripleBandLinearOp, FdmError> {
    let drift: Vec<f64> = mesher.locations(direction).iter().map(|x| -a * x).collect();
    let dx = first_derivative(direction, mesher)?;
    let dxx = second_derivative(direction, mesher)?.mult(&[0.5 * sigma * sigma])?;
    let mut map = TripleBandLinearOp::new(direction, Arc::clone(mesher))?;
    map.axpyb(&drift, &dx, &dxx, &[])?;
    Ok(map)
}

impl FdmHullWhiteOp {
    /// Operator on the short-rate factor axis `direction` of `mesher`.
    pub fn new(
        mesher: Arc<FdmMesherComposite>,
        process: HullWhiteProcess,
        direction: usize,
    ) -> Result<Self, FdmError> {
        process.validate()?;
        let map_base = ou_generator(&mesher, direction, process.a, process.sigma)?;
        let x = mesher.locations(direction);
        Ok(Self {
            mesher,
            process,
            direction,
            x,
            map_base,
            maps: None,
        })
    }

    /// Short rate `x + φ̄` at every grid point for the step `[t1, t2]`.
    pub fn short_rates(&self, t1: f64, t2: f64) -> Vec<f64> {
        let phi = 0.5 * (self.process.phi(t1) + self.process.phi(t2));
        self.x.iter().map(|x| x + phi).collect()
    }

    /// Axis carrying the factor.
    pub fn direction(&self) -> usize {
        self.direction
    }
}

impl SplitOperator for FdmHullWhiteOp {
    fn grid(&self) -> &Arc<FdmMesherComposite> {
        &self.mesher
    }

    fn axis_count(&self) -> usize {
        1
    }

    fn build_maps(&self, t1: f64, t2: f64) -> Result<SplitMaps, FdmError> {
        let discount: Vec<f64> = self.short_rates(t1, t2).iter().map(|r| -r).collect();
        Ok(SplitMaps {
            axes: vec![self.map_base.add_to_diagonal(&discount)?],
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fdm::meshers::process::ornstein_uhlenbeck;
    use crate::fdm::operators::LinearOpComposite;
    use crate::models::FlatRate;
    use approx::assert_relative_eq;

    #[test]
    fn constant_is_discounted_at_short_rate() {
        let process = HullWhiteProcess::new(Arc::new(FlatRate::new(0.03)), 0.1, 0.01);
        let axis = ornstein_uhlenbeck(0.1, 0.01, 5.0, 41, 1.0e-4).unwrap();
        let mesher = FdmMesherComposite::shared(vec![axis]).unwrap();
        let mut op = FdmHullWhiteOp::new(mesher, process.clone(), 0).unwrap();
        op.set_time(1.0, 1.1).unwrap();
        let lu = op.apply(&vec![1.0; 41]).unwrap();
        let x = op.mesher().locations(0);
        let phi = 0.5 * (process.phi(1.0) + process.phi(1.1));
        for i in 0..41 {
            assert_relative_eq!(lu[i], -(x[i] + phi), epsilon = 1.0e-12);
        }
    }
}
