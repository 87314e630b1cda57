use std::sync::Arc;

use crate::core::FdmError;
use crate::fdm::meshers::FdmMesherComposite;
use crate::models::CevProcess;

use super::composite::{SplitMaps, SplitOperator};
use super::derivatives::second_derivative;
use super::triple_band::TripleBandLinearOp;

/// CEV generator on the forward axis: `½α²f^{2β}∂ff − r`.
#[derive(Debug, Clone)]
pub struct FdmCevOp {
    mesher: Arc<FdmMesherComposite>,
    process: CevProcess,
    dff_scaled: TripleBandLinearOp,
    maps: Option<SplitMaps>,
}

impl FdmCevOp {
    /// Operator on the forward axis `direction` of `mesher`.
    pub fn new(
        mesher: Arc<FdmMesherComposite>,
        process: CevProcess,
        direction: usize,
    ) -> Result<Self, FdmError> {
        process.validate()?;
        let diffusion: Vec<f64> = mesher
            .locations(direction)
            .iter()
            .map(|f| 0.5 * process.alpha * process.alpha * f.abs().powf(2.0 * process.beta))
            .collect();
        let dff_scaled = second_derivative(direction, &mesher)?.mult(&diffusion)?;
        Ok(Self {
            mesher,
            process,
            dff_scaled,
            maps: None,
        })
    }
}

impl SplitOperator for FdmCevOp {
    fn grid(&self) -> &Arc<FdmMesherComposite> {
        &self.mesher
    }

    fn axis_count(&self) -> usize {
        1
    }

    fn build_maps(&self, t1: f64, t2: f64) -> Result<SplitMaps, FdmError> {
        let r = self.process.risk_free.forward_rate(t1, t2);
        Ok(SplitMaps {
            axes: vec![self.dff_scaled.add_to_diagonal(&[-r])?],
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
    use crate::fdm::meshers::Fdm1dMesher;
    use crate::fdm::operators::LinearOpComposite;
    use approx::assert_relative_eq;

    #[test]
    fn lognormal_limit_on_quadratic() {
        // β = 1: ½α²f²∂ff(f²) = α²f²
        let mesher =
            FdmMesherComposite::shared(vec![Fdm1dMesher::uniform(0.5, 2.0, 31).unwrap()]).unwrap();
        let mut op = FdmCevOp::new(mesher, CevProcess::new(1.0, 0.3, 1.0, 0.0), 0).unwrap();
        op.set_time(0.0, 1.0).unwrap();
        let f = op.mesher().locations(0);
        let u: Vec<f64> = f.iter().map(|f| f * f).collect();
        let lu = op.apply(&u).unwrap();
        for i in 1..30 {
            assert_relative_eq!(lu[i], 0.09 * f[i] * f[i], epsilon = 1.0e-10);
        }
    }

    #[test]
    fn forward_axis_can_be_any_grid_axis() {
        let mesher = FdmMesherComposite::shared(vec![
            Fdm1dMesher::uniform(0.0, 1.0, 5).unwrap(),
            Fdm1dMesher::uniform(0.5, 2.0, 31).unwrap(),
        ])
        .unwrap();
        let mut op = FdmCevOp::new(Arc::clone(&mesher), CevProcess::new(1.0, 0.3, 1.0, 0.0), 1)
            .unwrap();
        op.set_time(0.0, 1.0).unwrap();
        let u: Vec<f64> = mesher
            .iter()
            .map(|p| p.locations[1] * p.locations[1])
            .collect();
        let along_forward = op.apply_direction(1, &u).unwrap();
        assert_eq!(along_forward, op.apply(&u).unwrap());
        assert!(op.apply_direction(0, &u).unwrap().iter().all(|v| *v == 0.0));
    }
}
