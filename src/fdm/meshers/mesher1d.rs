//! One-dimensional grids.

use crate::core::FdmError;

/// Minimum number of nodes on any axis.
pub const MIN_AXIS_POINTS: usize = 3;

const GLUE_TOLERANCE: f64 = 1.0e-12;

/// Ordered coordinates of one grid axis with cached spacings.
///
/// `dplus[i] = x[i+1] - x[i]` and `dminus[i] = x[i] - x[i-1]`; the entry
/// without a neighbour is `NaN`.
#[derive(Debug, Clone, PartialEq)]
pub struct Fdm1dMesher {
    locations: Vec<f64>,
    dplus: Vec<f64>,
    dminus: Vec<f64>,
}

impl Fdm1dMesher {
    /// Uses the given nodes as-is.
    pub fn predefined(locations: Vec<f64>) -> Result<Self, FdmError> {
        if locations.len() < MIN_AXIS_POINTS {
            return Err(FdmError::configuration(format!(
                "a grid axis needs at least {MIN_AXIS_POINTS} points, got {}",
                locations.len()
            )));
        }
        if locations.iter().any(|x| !x.is_finite()) {
            return Err(FdmError::configuration("grid nodes must be finite"));
        }
        if let Some(w) = locations.windows(2).find(|w| w[1] <= w[0]) {
            return Err(FdmError::configuration(format!(
                "grid nodes must be strictly increasing ({} followed by {})",
                w[0], w[1]
            )));
        }

        let n = locations.len();
        let mut dplus = vec![f64::NAN; n];
        let mut dminus = vec![f64::NAN; n];
        for i in 0..n - 1 {
            let h = locations[i + 1] - locations[i];
            dplus[i] = h;
            dminus[i + 1] = h;
        }
        Ok(Self {
            locations,
            dplus,
            dminus,
        })
    }

    /// Equally spaced nodes on `[start, end]`.
    pub fn uniform(start: f64, end: f64, size: usize) -> Result<Self, FdmError> {
        if size < MIN_AXIS_POINTS {
            return Err(FdmError::configuration(format!(
                "a grid axis needs at least {MIN_AXIS_POINTS} points, got {size}"
            )));
        }
        let dx = (end - start) / (size - 1) as f64;
        let mut locations: Vec<f64> = (0..size).map(|i| start + i as f64 * dx).collect();
        locations[size - 1] = end;
        Self::predefined(locations)
    }

    /// Nodes on `[start, end]` clustered around `c` by an `asinh` stretch.
    ///
    /// `density` is relative to the width of the interval; smaller values
    /// concentrate harder. With `require_c_point`, the node nearest to `c` is
    /// moved onto `c`. Without a concentration point the grid is uniform.
    pub fn concentrating(
        start: f64,
        end: f64,
        size: usize,
        concentration: Option<(f64, f64)>,
        require_c_point: bool,
    ) -> Result<Self, FdmError> {
        let Some((c, density)) = concentration else {
            return Self::uniform(start, end, size);
        };
        if size < MIN_AXIS_POINTS {
            return Err(FdmError::configuration(format!(
                "a grid axis needs at least {MIN_AXIS_POINTS} points, got {size}"
            )));
        }
        if !(end > start) {
            return Err(FdmError::configuration("grid end must exceed grid start"));
        }
        if !(density.is_finite() && density > 0.0) {
            return Err(FdmError::configuration("concentration density must be > 0"));
        }

        let d = density * (end - start);
        let c1 = ((start - c) / d).asinh();
        let c2 = ((end - c) / d).asinh();
        let last = (size - 1) as f64;

        let mut locations: Vec<f64> = (0..size)
            .map(|i| {
                let u = i as f64 / last;
                c + d * (c1 * (1.0 - u) + c2 * u).sinh()
            })
            .collect();
        locations[0] = start;
        locations[size - 1] = end;

        if require_c_point && c > start && c < end {
            let nearest = (1..size - 1)
                .min_by(|&a, &b| {
                    (locations[a] - c)
                        .abs()
                        .total_cmp(&(locations[b] - c).abs())
                })
                .unwrap_or(1);
            if c > locations[nearest - 1] && c < locations[nearest + 1] {
                locations[nearest] = c;
            }
        }
        Self::predefined(locations)
    }

    /// Joins two meshers sharing their boundary node.
    pub fn glued(left: &Self, right: &Self) -> Result<Self, FdmError> {
        let joint_l = left.locations[left.locations.len() - 1];
        let joint_r = right.locations[0];
        let scale = joint_l.abs().max(joint_r.abs()).max(1.0);
        if (joint_l - joint_r).abs() > GLUE_TOLERANCE * scale {
            return Err(FdmError::configuration(format!(
                "glued meshers must share their joint node: left ends at {joint_l}, right starts at {joint_r}"
            )));
        }
        let mut locations = left.locations.clone();
        locations.extend_from_slice(&right.locations[1..]);
        Self::predefined(locations)
    }

    /// Node coordinates.
    pub fn locations(&self) -> &[f64] {
        &self.locations
    }

    /// Forward spacings.
    pub fn dplus(&self) -> &[f64] {
        &self.dplus
    }

    /// Backward spacings.
    pub fn dminus(&self) -> &[f64] {
        &self.dminus
    }

    /// Number of nodes.
    pub fn size(&self) -> usize {
        self.locations.len()
    }
}
