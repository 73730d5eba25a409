//! Error types for evaluation
//!
//! Level 4 - Utilities

use std::path::PathBuf;

/// Invalid or unreadable configuration. Fatal at setup time.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field} {radius} exceeds the maximum of {max}")]
    Radius {
        field: &'static str,
        radius: u32,
        max: u32,
    },

    #[error("capacity radius {capacity} is smaller than window radius {window}")]
    Capacity { window: u32, capacity: u32 },

    #[error("action table repeats direction {0:?}")]
    DuplicateAction(gridrun_core::Direction),

    #[error("frame delay {0} ms exceeds the 10000 ms limit")]
    FrameDelay(u64),
}

/// Failure while evaluating a single candidate.
///
/// Any of these fails the whole candidate; the batch carries on.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("controller unavailable: {0}")]
    ControllerUnavailable(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("no action selected from {outputs} controller outputs")]
    NoActionSelected { outputs: usize },

    #[error("controller produced {got} outputs, decoder needs {expected}")]
    OutputShape { expected: usize, got: usize },

    #[error("environment fault: {0}")]
    Environment(String),

    /// A controller or environment panicked mid-trial
    #[error("trial panicked: {0}")]
    Panicked(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl EvalError {
    /// Contract breach between encoder, controller and decoder
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            EvalError::NoActionSelected { .. } | EvalError::OutputShape { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invariant_classification() {
        assert!(EvalError::NoActionSelected { outputs: 4 }.is_invariant_violation());
        let err = EvalError::OutputShape {
            expected: 4,
            got: 2,
        };
        assert!(err.is_invariant_violation());
        assert!(!EvalError::Inference("boom".into()).is_invariant_violation());
    }

    #[test]
    fn test_messages() {
        let err = EvalError::OutputShape {
            expected: 4,
            got: 3,
        };
        assert_eq!(err.to_string(), "controller produced 3 outputs, decoder needs 4");
        let err = ConfigError::Zero {
            field: "num_trials",
        };
        assert_eq!(err.to_string(), "num_trials must be greater than zero");
        let err = ConfigError::Radius {
            field: "window_radius",
            radius: 65,
            max: 64,
        };
        assert_eq!(err.to_string(), "window_radius 65 exceeds the maximum of 64");
        let err = EvalError::Panicked("boom".into());
        assert!(!err.is_invariant_violation());
        assert_eq!(err.to_string(), "trial panicked: boom");
    }
}
