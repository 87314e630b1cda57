//! Linear indexing over a tensor-product grid.

use smallvec::SmallVec;

use crate::core::FdmError;

/// Multi-index of a grid point, one coordinate per axis.
pub type Coordinates = SmallVec<[usize; 3]>;

/// Bidirectional map between multi-indices and linear indices.
///
/// Axis 0 varies fastest. Neighbour lookups that fall outside the grid are
/// reflected about the edge, so the neighbour of node `0` at offset `-1` is
/// node `1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FdmLinearOpLayout {
    dim: Vec<usize>,
    spacing: Vec<usize>,
    size: usize,
}

impl FdmLinearOpLayout {
    /// Builds the layout for the given number of points per axis.
    pub fn new(dim: Vec<usize>) -> Result<Self, FdmError> {
        if dim.is_empty() {
            return Err(FdmError::configuration("layout needs at least one axis"));
        }
        if dim.iter().any(|&d| d == 0) {
            return Err(FdmError::configuration("layout axes must be non-empty"));
        }
        let mut spacing = Vec::with_capacity(dim.len());
        let mut size = 1usize;
        for &d in &dim {
            spacing.push(size);
            size = size
                .checked_mul(d)
                .ok_or_else(|| FdmError::configuration("grid size overflows usize"))?;
        }
        Ok(Self { dim, spacing, size })
    }

    /// Points per axis.
    pub fn dim(&self) -> &[usize] {
        &self.dim
    }

    /// Stride of each axis in the linear index.
    pub fn spacing(&self) -> &[usize] {
        &self.spacing
    }

    /// Total number of grid points.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of axes.
    pub fn ndim(&self) -> usize {
        self.dim.len()
    }

    /// Linear index of `coords`.
    #[inline]
    pub fn index(&self, coords: &[usize]) -> usize {
        coords
            .iter()
            .zip(&self.spacing)
            .map(|(c, s)| c * s)
            .sum()
    }

    /// Multi-index of linear index `index`.
    pub fn coordinates(&self, mut index: usize) -> Coordinates {
        let mut coords = Coordinates::with_capacity(self.dim.len());
        for &d in &self.dim {
            coords.push(index % d);
            index /= d;
        }
        coords
    }

    #[inline]
    fn reflect(&self, coord: usize, axis: usize, offset: isize) -> usize {
        let n = self.dim[axis] as isize;
        let mut c = coord as isize + offset;
        if c < 0 {
            c = -c;
        } else if c >= n {
            c = 2 * (n - 1) - c;
        }
        c.clamp(0, n - 1) as usize
    }

    /// Linear index of the point `offset` steps away from `coords` along `axis`.
    #[inline]
    pub fn neighbourhood(&self, coords: &[usize], axis: usize, offset: isize) -> usize {
        let index = self.index(coords);
        let shifted = self.reflect(coords[axis], axis, offset);
        index - coords[axis] * self.spacing[axis] + shifted * self.spacing[axis]
    }

    /// Linear index of the point shifted along two axes at once.
    #[inline]
    pub fn neighbourhood2(
        &self,
        coords: &[usize],
        axis0: usize,
        offset0: isize,
        axis1: usize,
        offset1: isize,
    ) -> usize {
        let mut index = self.index(coords);
        let c0 = self.reflect(coords[axis0], axis0, offset0);
        index = index - coords[axis0] * self.spacing[axis0] + c0 * self.spacing[axis0];
        let c1 = self.reflect(coords[axis1], axis1, offset1);
        index - coords[axis1] * self.spacing[axis1] + c1 * self.spacing[axis1]
    }

    /// Iterates `(index, coordinates)` in linear order.
    pub fn iter(&self) -> LayoutIter<'_> {
        LayoutIter {
            layout: self,
            index: 0,
            coords: std::iter::repeat_n(0, self.dim.len()).collect(),
        }
    }
}

/// Iterator over every grid point of a [`FdmLinearOpLayout`].
#[derive(Debug, Clone)]
pub struct LayoutIter<'a> {
    layout: &'a FdmLinearOpLayout,
    index: usize,
    coords: Coordinates,
}

impl Iterator for LayoutIter<'_> {
    type Item = (usize, Coordinates);

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.layout.size {
            return None;
        }
        let item = (self.index, self.coords.clone());
        self.index += 1;
        for (c, &d) in self.coords.iter_mut().zip(&self.layout.dim) {
            *c += 1;
            if *c < d {
                break;
            }
            *c = 0;
        }
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rest = self.layout.size - self.index.min(self.layout.size);
        (rest, Some(rest))
    }
}

impl ExactSizeIterator for LayoutIter<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_and_coordinates_are_inverse() {
        let layout = FdmLinearOpLayout::new(vec![4, 3, 2]).unwrap();
        assert_eq!(layout.size(), 24);
        assert_eq!(layout.spacing(), &[1, 4, 12]);
        for (i, coords) in layout.iter() {
            assert_eq!(layout.index(&coords), i);
            assert_eq!(layout.coordinates(i), coords);
        }
        assert_eq!(layout.iter().len(), 24);
    }

    #[test]
    fn neighbours_reflect_at_edges() {
        let layout = FdmLinearOpLayout::new(vec![5, 3]).unwrap();
        let first = [0, 1];
        assert_eq!(layout.neighbourhood(&first, 0, -1), layout.index(&[1, 1]));
        let last = [4, 2];
        assert_eq!(layout.neighbourhood(&last, 0, 1), layout.index(&[3, 2]));
        assert_eq!(layout.neighbourhood(&last, 1, 1), layout.index(&[4, 1]));
        assert_eq!(
            layout.neighbourhood2(&[2, 0], 0, 1, 1, -1),
            layout.index(&[3, 1])
        );
    }

    #[test]
    fn empty_axis_is_rejected() {
        assert!(matches!(
            FdmLinearOpLayout::new(vec![3, 0]),
            Err(FdmError::Configuration(_))
        ));
    }
}
