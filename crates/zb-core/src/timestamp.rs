//! Timestamp values and the fixed wire format.
//!
//! The event store expects second precision, a literal `.000` millisecond
//! field and a numeric offset: `2021-03-05T14:30:00.000+0100`.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::error::EventError;

const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S.000%z";

/// A date-time that has not been formatted yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateTimeValue {
    /// No zone attached; localized to the target zone when formatted.
    Naive(NaiveDateTime),
    /// Zone-aware; converted into the target zone when formatted.
    Zoned(DateTime<FixedOffset>),
}

impl From<NaiveDateTime> for DateTimeValue {
    fn from(value: NaiveDateTime) -> Self {
        Self::Naive(value)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for DateTimeValue {
    fn from(value: DateTime<Tz>) -> Self {
        Self::Zoned(value.fixed_offset())
    }
}

/// Formats a date-time in the wire format, expressed in `zone`.
///
/// Naive values are interpreted as local time in `zone`.
pub fn format_timestamp(value: &DateTimeValue, zone: &FixedOffset) -> String {
    let localized = match value {
        DateTimeValue::Naive(naive) => DateTime::from_naive_utc_and_offset(*naive - *zone, *zone),
        DateTimeValue::Zoned(zoned) => zoned.with_timezone(zone),
    };
    localized.format(WIRE_FORMAT).to_string()
}

/// Parses a UTC offset such as `+01:00`, `-0530` or `UTC`.
pub fn parse_utc_offset(s: &str) -> Result<FixedOffset, EventError> {
    let trimmed = s.trim();
    if trimmed.eq_ignore_ascii_case("utc") || trimmed == "Z" {
        return Ok(Utc.fix());
    }
    trimmed
        .parse::<FixedOffset>()
        .map_err(|_| EventError::InvalidZone(s.to_string()))
}

/// One element of a timestamp as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimestampPart {
    /// Already formatted; passed through untouched.
    Text(String),
    /// Formatted during normalization.
    At(DateTimeValue),
}

impl From<&str> for TimestampPart {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for TimestampPart {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<NaiveDateTime> for TimestampPart {
    fn from(value: NaiveDateTime) -> Self {
        Self::At(value.into())
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for TimestampPart {
    fn from(value: DateTime<Tz>) -> Self {
        Self::At(value.into())
    }
}

/// A `timestamp` value before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimestampInput {
    One(TimestampPart),
    Many(Vec<TimestampPart>),
}

impl TimestampInput {
    /// Reads a timestamp from a loosely-typed JSON value.
    ///
    /// JSON has no date-time type, so only strings and non-empty arrays of
    /// strings are accepted.
    pub fn from_json(value: Value) -> Result<Self, EventError> {
        match value {
            Value::String(text) => Ok(Self::One(TimestampPart::Text(text))),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(text) => Ok(TimestampPart::Text(text)),
                    other => Err(EventError::TimestampType {
                        found: list_of(&other),
                    }),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Many),
            other => Err(EventError::TimestampType {
                found: json_kind(&other),
            }),
        }
    }

    /// Formats every date-time part into the wire format.
    pub fn normalize(self, zone: &FixedOffset) -> Result<Timestamp, EventError> {
        match self {
            Self::One(part) => Ok(Timestamp::One(normalize_part(part, zone))),
            Self::Many(parts) if parts.is_empty() => Err(EventError::TimestampType {
                found: "empty list",
            }),
            Self::Many(parts) => Ok(Timestamp::Many(
                parts
                    .into_iter()
                    .map(|part| normalize_part(part, zone))
                    .collect(),
            )),
        }
    }
}

fn normalize_part(part: TimestampPart, zone: &FixedOffset) -> String {
    match part {
        TimestampPart::Text(text) => text,
        TimestampPart::At(value) => format_timestamp(&value, zone),
    }
}

impl From<TimestampPart> for TimestampInput {
    fn from(value: TimestampPart) -> Self {
        Self::One(value)
    }
}

impl From<&str> for TimestampInput {
    fn from(value: &str) -> Self {
        Self::One(value.into())
    }
}

impl From<String> for TimestampInput {
    fn from(value: String) -> Self {
        Self::One(value.into())
    }
}

impl From<NaiveDateTime> for TimestampInput {
    fn from(value: NaiveDateTime) -> Self {
        Self::One(value.into())
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for TimestampInput {
    fn from(value: DateTime<Tz>) -> Self {
        Self::One(value.into())
    }
}

impl From<Vec<TimestampPart>> for TimestampInput {
    fn from(value: Vec<TimestampPart>) -> Self {
        Self::Many(value)
    }
}

impl From<Vec<String>> for TimestampInput {
    fn from(value: Vec<String>) -> Self {
        Self::Many(value.into_iter().map(TimestampPart::Text).collect())
    }
}

impl From<Vec<NaiveDateTime>> for TimestampInput {
    fn from(value: Vec<NaiveDateTime>) -> Self {
        Self::Many(value.into_iter().map(TimestampPart::from).collect())
    }
}

/// A normalized `timestamp`: one or more wire-format strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Timestamp {
    One(String),
    Many(Vec<String>),
}

impl Timestamp {
    /// All timestamp strings, in order.
    pub fn as_strings(&self) -> Vec<&str> {
        match self {
            Self::One(text) => vec![text.as_str()],
            Self::Many(texts) => texts.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&Timestamp> for Value {
    fn from(value: &Timestamp) -> Self {
        match value {
            Timestamp::One(text) => Self::String(text.clone()),
            Timestamp::Many(texts) => texts.iter().cloned().map(Self::String).collect(),
        }
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

const fn list_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "list containing null",
        Value::Bool(_) => "list containing boolean",
        Value::Number(_) => "list containing number",
        Value::String(_) => "list containing string",
        Value::Array(_) => "list containing list",
        Value::Object(_) => "list containing object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDate;
    use serde_json::json;

    fn plus_one() -> FixedOffset {
        FixedOffset::east_opt(3600).unwrap()
    }

    fn naive(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn naive_value_is_localized_to_zone() {
        let value = DateTimeValue::from(naive(2021, 3, 5, 14, 30));
        let formatted = format_timestamp(&value, &plus_one());
        assert_eq!(formatted, "2021-03-05T14:30:00.000+0100");
    }

    #[test]
    fn every_wall_clock_time_exists_at_a_fixed_offset() {
        // 02:30 is skipped by the Central European spring-forward
        let value = DateTimeValue::from(naive(2015, 3, 29, 2, 30));
        let formatted = format_timestamp(&value, &plus_one());
        assert_eq!(formatted, "2015-03-29T02:30:00.000+0100");
    }

    #[test]
    fn zoned_value_is_converted_into_zone() {
        let utc = Utc.from_utc_datetime(&naive(2021, 3, 5, 13, 30));
        let formatted = format_timestamp(&utc.into(), &plus_one());
        assert_eq!(formatted, "2021-03-05T14:30:00.000+0100");
    }

    #[test]
    fn negative_offsets_keep_numeric_form() {
        let zone = FixedOffset::west_opt(5 * 3600).unwrap();
        let formatted = format_timestamp(&naive(2020, 12, 31, 23, 59).into(), &zone);
        assert_eq!(formatted, "2020-12-31T23:59:00.000-0500");
    }

    #[test]
    fn utc_uses_numeric_offset_not_z() {
        let formatted = format_timestamp(&naive(2014, 9, 6, 19, 35).into(), &Utc.fix());
        assert_eq!(formatted, "2014-09-06T19:35:00.000+0000");
    }

    #[test]
    fn sub_second_precision_is_dropped() {
        let value = naive(2021, 3, 5, 14, 30) + chrono::Duration::milliseconds(789);
        let formatted = format_timestamp(&value.into(), &Utc.fix());
        assert_eq!(formatted, "2021-03-05T14:30:00.000+0000");
    }

    #[test]
    fn parse_utc_offset_accepts_common_forms() {
        assert_eq!(parse_utc_offset("+01:00").unwrap(), plus_one());
        assert_eq!(parse_utc_offset("+0100").unwrap(), plus_one());
        assert_eq!(parse_utc_offset("UTC").unwrap(), Utc.fix());
        assert_eq!(parse_utc_offset("Z").unwrap(), Utc.fix());
        assert!(matches!(
            parse_utc_offset("Europe/Stockholm"),
            Err(EventError::InvalidZone(_))
        ));
    }

    #[test]
    fn json_timestamp_shapes() {
        assert!(TimestampInput::from_json(json!("2014-09-06T19:35:00.000+0200")).is_ok());
        assert!(TimestampInput::from_json(json!(["a", "b"])).is_ok());
        assert_eq!(
            TimestampInput::from_json(json!(12)).unwrap_err(),
            EventError::TimestampType { found: "number" }
        );
        assert_eq!(
            TimestampInput::from_json(json!(1.5)).unwrap_err(),
            EventError::TimestampType { found: "number" }
        );
        assert_eq!(
            TimestampInput::from_json(json!(["a", 3])).unwrap_err(),
            EventError::TimestampType {
                found: "list containing number"
            }
        );
    }

    #[test]
    fn empty_list_fails_normalization() {
        let input = TimestampInput::from_json(json!([])).unwrap();
        assert_eq!(
            input.normalize(&plus_one()).unwrap_err(),
            EventError::TimestampType {
                found: "empty list"
            }
        );
    }

    #[test]
    fn mixed_list_formats_only_date_times() {
        let input = TimestampInput::Many(vec![
            "2014-09-06T19:35:00.000+0200".into(),
            naive(2021, 3, 5, 14, 30).into(),
        ]);
        let normalized = input.normalize(&plus_one()).unwrap();
        assert_eq!(
            normalized.as_strings(),
            vec!["2014-09-06T19:35:00.000+0200", "2021-03-05T14:30:00.000+0100"]
        );
    }

    #[test]
    fn timestamp_serializes_untagged() {
        let one = serde_json::to_string(&Timestamp::One("x".to_string())).unwrap();
        assert_eq!(one, "\"x\"");
        let many =
            serde_json::to_string(&Timestamp::Many(vec!["x".to_string(), "y".to_string()]))
                .unwrap();
        assert_eq!(many, r#"["x","y"]"#);
    }
}
