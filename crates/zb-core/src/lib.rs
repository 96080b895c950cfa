//! Core domain logic for the Zenobase uploader.
//!
//! This crate contains the fundamental types and logic for:
//! - Fields: the closed set of semantic fields an event may carry
//! - Events: validated, normalized records ready for submission
//! - Timestamps: the fixed wire format for date-times

mod error;
pub mod event;
pub mod field;
pub mod measure;
pub mod timestamp;

pub use error::EventError;
pub use event::{Event, EventBuilder, NormalizeOptions};
pub use field::{Field, UnknownField};
pub use measure::Measure;
pub use timestamp::{
    DateTimeValue, Timestamp, TimestampInput, TimestampPart, format_timestamp, parse_utc_offset,
};
