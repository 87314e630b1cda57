use serde::{Deserialize, Serialize};

/// Tolerance for backward time ordering: a step to `t` is rejected when `t - dt < -TIME_TOLERANCE`.
pub const TIME_TOLERANCE: f64 = 1.0e-8;

/// Tolerance used to match a step-condition time against the current solver time.
pub const CONDITION_TIME_TOLERANCE: f64 = 1.0e-10;

/// Plain-vanilla option side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionType {
    /// Call option payoff profile.
    Call,
    /// Put option payoff profile.
    Put,
}

impl OptionType {
    /// Returns +1.0 for calls and -1.0 for puts.
    pub fn sign(self) -> f64 {
        match self {
            Self::Call => 1.0,
            Self::Put => -1.0,
        }
    }

    /// Intrinsic value at `spot`.
    #[inline]
    pub fn intrinsic(self, spot: f64, strike: f64) -> f64 {
        match self {
            Self::Call => (spot - strike).max(0.0),
            Self::Put => (strike - spot).max(0.0),
        }
    }
}

/// Edge of a grid axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// First node along the axis.
    Lower,
    /// Last node along the axis.
    Upper,
}

/// Returns `true` when `a` and `b` agree within [`CONDITION_TIME_TOLERANCE`], scaled by magnitude.
#[inline]
pub fn close_times(a: f64, b: f64) -> bool {
    (a - b).abs() <= CONDITION_TIME_TOLERANCE * a.abs().max(b.abs()).max(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intrinsic_matches_payoff_profile() {
        assert_eq!(OptionType::Call.intrinsic(110.0, 100.0), 10.0);
        assert_eq!(OptionType::Put.intrinsic(110.0, 100.0), 0.0);
        assert_eq!(OptionType::Put.sign(), -1.0);
    }

    #[test]
    fn close_times_uses_relative_tolerance() {
        assert!(close_times(1.0, 1.0 + 1.0e-12));
        assert!(!close_times(1.0, 1.0 + 1.0e-6));
        assert!(close_times(0.0, 0.0));
    }

    #[test]
    fn side_round_trips_through_json() {
        let json = serde_json::to_string(&Side::Upper).unwrap();
        assert_eq!(serde_json::from_str::<Side>(&json).unwrap(), Side::Upper);
    }
}
