use std::sync::Arc;

use crate::core::FdmError;

use super::layout::{Coordinates, FdmLinearOpLayout, LayoutIter};
use super::mesher1d::Fdm1dMesher;

/// Tensor product of one-dimensional meshers.
///
/// Immutable once built; a run shares it as `Arc<FdmMesherComposite>`.
#[derive(Debug, Clone, PartialEq)]
pub struct FdmMesherComposite {
    layout: FdmLinearOpLayout,
    meshers: Vec<Fdm1dMesher>,
}

/// One grid point as seen while iterating a mesher.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshPoint {
    /// Linear index.
    pub index: usize,
    /// Multi-index.
    pub coordinates: Coordinates,
    /// Physical coordinates, one per axis.
    pub locations: Coordinates64,
}

/// Physical coordinates of a grid point.
pub type Coordinates64 = smallvec::SmallVec<[f64; 3]>;

impl FdmMesherComposite {
    /// Builds the composite; axis `k` of the grid is `meshers[k]`.
    pub fn new(meshers: Vec<Fdm1dMesher>) -> Result<Self, FdmError> {
        let layout = FdmLinearOpLayout::new(meshers.iter().map(Fdm1dMesher::size).collect())?;
        Ok(Self { layout, meshers })
    }

    /// Builds the composite and wraps it for sharing.
    pub fn shared(meshers: Vec<Fdm1dMesher>) -> Result<Arc<Self>, FdmError> {
        Self::new(meshers).map(Arc::new)
    }

    /// Index layout.
    pub fn layout(&self) -> &FdmLinearOpLayout {
        &self.layout
    }

    /// Per-axis meshers.
    pub fn meshers(&self) -> &[Fdm1dMesher] {
        &self.meshers
    }

    /// Number of axes.
    pub fn ndim(&self) -> usize {
        self.meshers.len()
    }

    /// Total number of grid points.
    pub fn size(&self) -> usize {
        self.layout.size()
    }

    /// Fails unless `axis` names an axis of this grid.
    pub fn check_axis(&self, axis: usize) -> Result<(), FdmError> {
        if axis >= self.meshers.len() {
            return Err(FdmError::configuration(format!(
                "axis {axis} out of range for a {}-dimensional grid",
                self.meshers.len()
            )));
        }
        Ok(())
    }

    #[inline]
    fn coord(&self, index: usize, axis: usize) -> usize {
        (index / self.layout.spacing()[axis]) % self.layout.dim()[axis]
    }

    /// Forward spacing at linear index `index` along `axis`.
    #[inline]
    pub fn dplus(&self, index: usize, axis: usize) -> f64 {
        self.meshers[axis].dplus()[self.coord(index, axis)]
    }

    /// Backward spacing at linear index `index` along `axis`.
    #[inline]
    pub fn dminus(&self, index: usize, axis: usize) -> f64 {
        self.meshers[axis].dminus()[self.coord(index, axis)]
    }

    /// Coordinate of linear index `index` along `axis`.
    #[inline]
    pub fn location(&self, index: usize, axis: usize) -> f64 {
        self.meshers[axis].locations()[self.coord(index, axis)]
    }

    /// Coordinate along `axis` for every linear index.
    pub fn locations(&self, axis: usize) -> Vec<f64> {
        (0..self.size()).map(|i| self.location(i, axis)).collect()
    }

    /// Iterates every grid point.
    pub fn iter(&self) -> MeshIter<'_> {
        MeshIter {
            mesher: self,
            inner: self.layout.iter(),
        }
    }
}

/// Iterator over the points of a [`FdmMesherComposite`].
#[derive(Debug, Clone)]
pub struct MeshIter<'a> {
    mesher: &'a FdmMesherComposite,
    inner: LayoutIter<'a>,
}

impl Iterator for MeshIter<'_> {
    type Item = MeshPoint;

    fn next(&mut self) -> Option<MeshPoint> {
        let (index, coordinates) = self.inner.next()?;
        let locations = coordinates
            .iter()
            .zip(&self.mesher.meshers)
            .map(|(&c, m)| m.locations()[c])
            .collect();
        Some(MeshPoint {
            index,
            coordinates,
            locations,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for MeshIter<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_exposes_axis_locations() {
        let m = FdmMesherComposite::new(vec![
            Fdm1dMesher::uniform(0.0, 2.0, 3).unwrap(),
            Fdm1dMesher::predefined(vec![10.0, 20.0, 40.0]).unwrap(),
        ])
        .unwrap();
        assert_eq!(m.size(), 9);
        assert_eq!(m.locations(0), vec![0.0, 1.0, 2.0, 0.0, 1.0, 2.0, 0.0, 1.0, 2.0]);
        assert_eq!(m.location(5, 1), 20.0);
        assert_eq!(m.dplus(4, 1), 20.0);
        assert_eq!(m.dminus(7, 1), 20.0);
        assert!(m.dminus(1, 1).is_nan());

        let points: Vec<MeshPoint> = m.iter().collect();
        assert_eq!(points.len(), 9);
        assert_eq!(points[8].locations.as_slice(), &[2.0, 40.0]);
    }

    #[test]
    fn axis_check() {
        let m = FdmMesherComposite::new(vec![Fdm1dMesher::uniform(0.0, 1.0, 3).unwrap()]).unwrap();
        assert!(m.check_axis(0).is_ok());
        assert!(matches!(m.check_axis(1), Err(FdmError::Configuration(_))));
    }
}
