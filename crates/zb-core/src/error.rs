//! Validation errors for event records.

use thiserror::Error;

use crate::field::{Field, UnknownField};

/// Errors raised while building or normalizing an event.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EventError {
    /// A key outside the recognized field set.
    #[error(transparent)]
    UnknownField(#[from] UnknownField),

    /// The `timestamp` value had an unsupported shape.
    #[error(
        "timestamp must be a string, a date-time or a non-empty list of strings/date-times, got {found}"
    )]
    TimestampType { found: &'static str },

    /// A `weight` or `volume` value was not `{value, unit}`.
    #[error("invalid {field}: {reason}")]
    InvalidMeasure { field: Field, reason: String },

    /// A unit that looks like a mis-decoded micro sign.
    #[error("suspicious unit {unit:?}: looks like a mis-decoded micro sign")]
    SuspiciousUnit { unit: String },

    /// An offset string that could not be parsed.
    #[error("invalid UTC offset: {0}")]
    InvalidZone(String),
}
