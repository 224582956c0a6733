//! Structured error classification for the library.
//!
//! Every fallible entry point returns [`Result`]; there is no panicking
//! public API and no internal retry. Builder errors may leave an MDP
//! partially auto-extended (see [`crate::mdp`]), but that extension is
//! always a benign empty-slot one.
use thiserror::Error;

/// Crate-wide error type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A value function, policy, or dense matrix has the wrong length/shape.
    #[error("shape mismatch in {what}: expected {expected}, got {actual}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A base distribution does not sum to 1 (within tolerance) or has negative entries.
    #[error("invalid distribution: sums to {sum} (expected 1.0 within tolerance)")]
    InvalidDistribution { sum: f64 },

    /// An out-of-domain scalar parameter (discount, threshold, probability, mode name, ...).
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// A state/action/outcome/sample identifier refers to a slot that cannot be auto-created.
    #[error("{what} index {index} out of range (have {len})")]
    OutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    /// A transition's probabilities sum to neither 0 nor 1 at a point where that is required.
    #[error("transition is not normalized: probabilities sum to {sum}")]
    NotNormalized { sum: f64 },

    /// An operation that requires a uniform action (or outcome) count was called on a ragged MDP.
    #[error("{0} requires a uniform action count per state")]
    Unsupported(&'static str),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn shape(what: &'static str, expected: usize, actual: usize) -> Self {
        Error::ShapeMismatch {
            what,
            expected,
            actual,
        }
    }

    pub(crate) fn out_of_range(what: &'static str, index: usize, len: usize) -> Self {
        Error::OutOfRange { what, index, len }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_are_informative() {
        let e = Error::shape("value function", 3, 2);
        assert_eq!(
            e.to_string(),
            "shape mismatch in value function: expected 3, got 2"
        );
        let e = Error::out_of_range("state", 5, 3);
        assert_eq!(e.to_string(), "state index 5 out of range (have 3)");
    }
}
