use std::sync::Arc;

use crate::core::FdmError;
use crate::fdm::meshers::FdmMesherComposite;
use crate::models::G2Process;

use super::composite::{SplitMaps, SplitOperator};
use super::derivatives::mixed_derivative;
use super::hull_white::ou_generator;
use super::nine_point::NinePointLinearOp;
use super::triple_band::TripleBandLinearOp;

/// Two-factor Gaussian short-rate generator on axes `(x, y)`.
///
/// The discount term `−(x + y + φ)` is split evenly between the two axes.
#[derive(Debug, Clone)]
pub struct FdmG2Op {
    mesher: Arc<FdmMesherComposite>,
    process: G2Process,
    x: Vec<f64>,
    y: Vec<f64>,
    map_x: TripleBandLinearOp,
    map_y: TripleBandLinearOp,
    corr: NinePointLinearOp,
    maps: Option<SplitMaps>,
}

impl FdmG2Op {
    /// Operator with factor `x` on `direction0` and `y` on `direction1`.
    pub fn new(
        mesher: Arc<FdmMesherComposite>,
        process: G2Process,
        direction0: usize,
        direction1: usize,
    ) -> Result<Self, FdmError> {
        process.validate()?;
        let map_x = ou_generator(&mesher, direction0, process.a, process.sigma)?;
        let map_y = ou_generator(&mesher, direction1, process.b, process.eta)?;
        let corr = mixed_derivative(direction0, direction1, &mesher)?
            .mult(&[process.rho * process.sigma * process.eta])?;
        let x = mesher.locations(direction0);
        let y = mesher.locations(direction1);
        Ok(Self {
            mesher,
            process,
            x,
            y,
            map_x,
            map_y,
            corr,
            maps: None,
        })
    }
}

impl SplitOperator for FdmG2Op {
    fn grid(&self) -> &Arc<FdmMesherComposite> {
        &self.mesher
    }

    fn axis_count(&self) -> usize {
        2
    }

    fn build_maps(&self, t1: f64, t2: f64) -> Result<SplitMaps, FdmError> {
        let half_phi = 0.25 * (self.process.phi(t1) + self.process.phi(t2));
        let shift_x: Vec<f64> = self.x.iter().map(|x| -(x + half_phi)).collect();
        let shift_y: Vec<f64> = self.y.iter().map(|y| -(y + half_phi)).collect();
        Ok(SplitMaps {
            axes: vec![
                self.map_x.add_to_diagonal(&shift_x)?,
                self.map_y.add_to_diagonal(&shift_y)?,
            ],
            mixed: vec![self.corr.clone()],
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
