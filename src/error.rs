// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

use thiserror::Error;

/// Result type for cutwork operations
pub type Result<T> = std::result::Result<T, CutError>;

/// Errors that can occur while describing or evaluating cuts
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CutError {
    #[error("Boolean operation failed: {0}")]
    Boolean(String),

    #[error("Merge failed: {0}")]
    Merge(String),

    #[error("CSG backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Unknown operation kind `{0}`")]
    UnknownKind(String),

    #[error("Unknown primitive `{0}`")]
    UnknownPrimitive(String),

    #[error("Counterbore stages disagree on direction: first `{first}`, second `{second}`")]
    MismatchedDirection { first: String, second: String },

    #[error("Unknown counterbore profile `{0}`")]
    UnknownProfile(String),
}

impl CutError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Reject non-finite and non-positive dimensions
pub(crate) fn ensure_positive(name: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(CutError::invalid(name, format!("must be a positive number, got {}", value)))
    }
}
