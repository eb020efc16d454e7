//! Error types for the Leabra core engine

use thiserror::Error;

/// Result type for core engine operations
pub type Result<T> = std::result::Result<T, LeabraError>;

/// Errors that can occur while configuring or driving the network
#[derive(Error, Debug)]
pub enum LeabraError {
    /// A name lookup (layer or path) failed
    #[error("{kind} {name:?} not found")]
    NotFound {
        /// "layer" or "path"
        kind: &'static str,
        /// Name that was looked up
        name: String,
    },

    /// Invalid network configuration surfaced at `Build`/`ApplyParams` time
    #[error("invalid network configuration: {reason}")]
    InvalidConfiguration {
        /// Reason for invalid configuration
        reason: String,
    },

    /// Reciprocal path required for `InitWtSym` was missing
    #[error("no reciprocal path from {recv} to {send} for weight symmetry")]
    MissingReciprocalPath {
        /// Requested sending layer
        send: String,
        /// Requested receiving layer
        recv: String,
    },

    /// `ApplyExt` was called with a tensor whose shape doesn't match the layer
    #[error("shape mismatch applying external input to layer {layer}: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Target layer name
        layer: String,
        /// Layer's own shape
        expected: Vec<usize>,
        /// Shape of the tensor that was passed in
        got: Vec<usize>,
    },

    /// Invalid parameter value
    #[error("invalid parameter {parameter}: {value} (expected {constraint})")]
    InvalidParameter {
        /// Parameter name
        parameter: String,
        /// Invalid value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// Weight-file load/save failure; network state is left unmodified
    #[error("weight I/O error: {reason}")]
    WeightIo {
        /// Reason for the I/O failure
        reason: String,
    },
}

impl LeabraError {
    /// Layer-name lookup failure
    pub fn layer_not_found(name: impl Into<String>) -> Self {
        Self::NotFound { kind: "layer", name: name.into() }
    }

    /// Path-name lookup failure
    pub fn path_not_found(name: impl Into<String>) -> Self {
        Self::NotFound { kind: "path", name: name.into() }
    }

    /// Invalid configuration error
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration { reason: reason.into() }
    }

    /// Invalid parameter error
    pub fn invalid_parameter(
        parameter: impl Into<String>,
        value: impl Into<String>,
        constraint: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            value: value.into(),
            constraint: constraint.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LeabraError::layer_not_found("Hidden");
        let msg = format!("{}", err);
        assert!(msg.contains("Hidden"));
    }

    #[test]
    fn test_shape_mismatch_display() {
        let err = LeabraError::ShapeMismatch {
            layer: "Input".into(),
            expected: vec![4, 1],
            got: vec![2, 2],
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Input"));
    }
}
