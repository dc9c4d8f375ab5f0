use thiserror::Error;

/// Error taxonomy for the assembler core, matching the four fatal
/// categories named in the spec's error-handling design. Warnings are not
/// modeled as errors: they go through `tracing::warn!` and execution
/// continues.
#[derive(Debug, Error)]
pub enum OversetError {
    /// Wrong node count, mismatched ghost sync, non-terminal status at
    /// termination, a cell referencing an invalid node id.
    #[error("invariant violation: {message} (ids: {ids:?})")]
    InvariantViolation {
        message: String,
        ids: Vec<u64>,
    },

    /// Inverse-mapping Newton iteration failed to converge, or computed
    /// weights do not reproduce the query point within tolerance.
    #[error("weight non-convergence at query point {query:?}: {message}")]
    WeightNonConvergence {
        message: String,
        query: [f64; 3],
        donor_stencil: Vec<[f64; 3]>,
    },

    /// Unknown keyword or missing argument in `yoga.config` or the
    /// boundary-condition script.
    #[error("configuration error: {0}")]
    Config(String),

    /// Out-of-range local id, or a missing global id in the
    /// global-to-local index.
    #[error("domain error: {0}")]
    Domain(String),
}

impl OversetError {
    pub fn invariant(message: impl Into<String>) -> Self {
        OversetError::InvariantViolation {
            message: message.into(),
            ids: Vec::new(),
        }
    }

    pub fn invariant_with_ids(message: impl Into<String>, ids: impl Into<Vec<u64>>) -> Self {
        OversetError::InvariantViolation {
            message: message.into(),
            ids: ids.into(),
        }
    }

    pub fn domain(message: impl Into<String>) -> Self {
        OversetError::Domain(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        OversetError::Config(message.into())
    }
}

pub type OversetResult<T> = Result<T, OversetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invariant_violation_carries_ids() {
        let err = OversetError::invariant_with_ids("ghost mismatch", vec![1, 2, 3]);
        match err {
            OversetError::InvariantViolation { ids, .. } => assert_eq!(ids, vec![1, 2, 3]),
            _ => panic!("expected InvariantViolation"),
        }
    }

    #[test]
    fn display_is_human_readable() {
        let err = OversetError::config("unknown keyword 'frobnicate'");
        assert!(err.to_string().contains("frobnicate"));
    }
}
