//! Typed errors for the classification engine.
//!
//! Orchestration code (config files, recordings, the CLI) works in
//! `anyhow::Result`; these enums cover the contract violations the engine
//! itself can detect.

use thiserror::Error;

/// Errors produced when validating a [`Config`](crate::config::Config).
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// A field has an out-of-range value.
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue {
        /// Dotted path of the field, e.g. `smoothing.quorum`.
        field: &'static str,
        /// Human-readable reason.
        reason: String,
    },

    /// The clock anchor could not be assembled from its parts.
    #[error("invalid clock anchor `{input}`: {reason}")]
    InvalidAnchor { input: String, reason: String },
}

impl ConfigError {
    pub fn invalid_value<S: Into<String>>(field: &'static str, reason: S) -> Self {
        ConfigError::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

/// Errors raised by the pose collaborator boundary.
#[derive(Debug, Error, PartialEq)]
pub enum KeypointError {
    /// The pose model returned a topology other than the fixed 33 landmarks.
    #[error("malformed keypoint set: expected {expected} landmarks, got {actual}")]
    MalformedSet { expected: usize, actual: usize },
}
