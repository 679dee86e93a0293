//! Error types for the reverb engine.

use thiserror::Error;

/// Errors reported by [`Reverb`](crate::Reverb) and
/// [`ReverbControl`](crate::ReverbControl).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReverbError {
    /// A setting was outside its valid range. The rejected value was not
    /// stored; processing continues with the previous value.
    #[error("invalid {name} = {value}: {reason}")]
    InvalidParameter {
        /// Name of the rejected setting.
        name: &'static str,
        /// The rejected value.
        value: f64,
        /// What the valid range is.
        reason: &'static str,
    },

    /// Delay-line storage for a structural change could not be allocated.
    #[error("failed to allocate {requested_samples} samples of delay storage")]
    AllocationFailure {
        /// Total samples requested across all delay lines.
        requested_samples: usize,
    },
}

impl ReverbError {
    /// Create an invalid parameter error.
    pub fn invalid(name: &'static str, value: impl Into<f64>, reason: &'static str) -> Self {
        Self::InvalidParameter {
            name,
            value: value.into(),
            reason,
        }
    }

    /// Create an allocation failure error.
    pub fn allocation(requested_samples: usize) -> Self {
        Self::AllocationFailure { requested_samples }
    }

    /// Name of the rejected setting, if this is a parameter error.
    pub fn parameter_name(&self) -> Option<&'static str> {
        match self {
            Self::InvalidParameter { name, .. } => Some(name),
            Self::AllocationFailure { .. } => None,
        }
    }
}
