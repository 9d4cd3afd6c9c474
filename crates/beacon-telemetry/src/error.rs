//! Error types for the telemetry client.
//!
//! Tracking operations never return these; they are produced only by the
//! strict entry points (`try_track_exception`) and configuration loading.

use thiserror::Error;

/// Errors reported by strict tracking entry points.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TelemetryError {
    /// The operation's required field was absent or empty.
    #[error("required field `{field}` is missing or empty")]
    MissingField {
        /// Name of the required field.
        field: &'static str,
    },

    /// The exception input was neither an error nor a message.
    #[error("unsupported exception input of type {kind}")]
    UnsupportedException {
        /// JSON type of the rejected input.
        kind: &'static str,
    },
}

impl TelemetryError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TelemetryError::MissingField { .. } => "telemetry_missing_field",
            TelemetryError::UnsupportedException { .. } => "telemetry_unsupported_exception",
        }
    }
}
