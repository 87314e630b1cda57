//! Core domain types and the library-wide error structure.

pub mod types;

pub use types::*;

/// Errors surfaced by meshers, operators, schemes and solvers.
///
/// Configuration errors are raised eagerly at construction and never retried.
/// Numerical errors abort the current backward run; there is no partial result.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FdmError {
    /// Invalid grid, size mismatch, out-of-range axis or missing `set_time`.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Failure inside a time step or a splitting solve.
    #[error("numerical error: {message}{}", numerical_context(.time, .axis))]
    Numerical {
        /// Description of the failure.
        message: String,
        /// Backward time at which the failure happened, when known.
        time: Option<f64>,
        /// Axis of the failing splitting solve, when known.
        axis: Option<usize>,
    },
    /// Query outside the grid support with extrapolation disabled.
    #[error("domain error: {0}")]
    Domain(String),
}

fn numerical_context(time: &Option<f64>, axis: &Option<usize>) -> String {
    match (time, axis) {
        (Some(t), Some(a)) => format!(" (t={t}, axis {a})"),
        (Some(t), None) => format!(" (t={t})"),
        (None, Some(a)) => format!(" (axis {a})"),
        (None, None) => String::new(),
    }
}

impl FdmError {
    /// Builds a [`FdmError::Configuration`].
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Builds a [`FdmError::Numerical`] without time/axis context.
    pub fn numerical(message: impl Into<String>) -> Self {
        Self::Numerical {
            message: message.into(),
            time: None,
            axis: None,
        }
    }

    /// Builds a [`FdmError::Domain`].
    pub fn domain(message: impl Into<String>) -> Self {
        Self::Domain(message.into())
    }

    /// Attaches the failing time to a numerical error; other variants pass through.
    pub fn at_time(self, t: f64) -> Self {
        match self {
            Self::Numerical { message, axis, .. } => Self::Numerical {
                message,
                time: Some(t),
                axis,
            },
            other => other,
        }
    }

    /// Attaches the failing axis to a numerical error unless one is already set.
    pub fn on_axis(self, axis: usize) -> Self {
        match self {
            Self::Numerical {
                message,
                time,
                axis: None,
            } => Self::Numerical {
                message,
                time,
                axis: Some(axis),
            },
            other => other,
        }
    }
}

/// Fails with [`FdmError::Configuration`] when `actual != expected`.
#[inline]
pub(crate) fn ensure_size(what: &str, actual: usize, expected: usize) -> Result<(), FdmError> {
    if actual != expected {
        return Err(FdmError::configuration(format!(
            "inconsistent size of {what}: got {actual}, grid has {expected} points"
        )));
    }
    Ok(())
}
