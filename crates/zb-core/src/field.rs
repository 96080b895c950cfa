//! Field enum as the single source of truth for event field names.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Semantic fields recognized by the event store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Timestamp,
    Tag,
    Count,
    Weight,
    Volume,
    Temperature,
    Percentage,
    Rating,
    Note,
    Location,
    Duration,
    Distance,
    Energy,
    Frequency,
    Height,
    Humidity,
    Moon,
    Pace,
    Pressure,
    Resource,
    Sound,
    Source,
    Velocity,
    Bits,
    Concentration,
    Currency,
    DistancePerVolume,
}

impl Field {
    /// Every recognized field, in serialization order.
    pub const ALL: [Self; 27] = [
        Self::Timestamp,
        Self::Tag,
        Self::Count,
        Self::Weight,
        Self::Volume,
        Self::Temperature,
        Self::Percentage,
        Self::Rating,
        Self::Note,
        Self::Location,
        Self::Duration,
        Self::Distance,
        Self::Energy,
        Self::Frequency,
        Self::Height,
        Self::Humidity,
        Self::Moon,
        Self::Pace,
        Self::Pressure,
        Self::Resource,
        Self::Sound,
        Self::Source,
        Self::Velocity,
        Self::Bits,
        Self::Concentration,
        Self::Currency,
        Self::DistancePerVolume,
    ];

    /// Wire name of the field.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Timestamp => "timestamp",
            Self::Tag => "tag",
            Self::Count => "count",
            Self::Weight => "weight",
            Self::Volume => "volume",
            Self::Temperature => "temperature",
            Self::Percentage => "percentage",
            Self::Rating => "rating",
            Self::Note => "note",
            Self::Location => "location",
            Self::Duration => "duration",
            Self::Distance => "distance",
            Self::Energy => "energy",
            Self::Frequency => "frequency",
            Self::Height => "height",
            Self::Humidity => "humidity",
            Self::Moon => "moon",
            Self::Pace => "pace",
            Self::Pressure => "pressure",
            Self::Resource => "resource",
            Self::Sound => "sound",
            Self::Source => "source",
            Self::Velocity => "velocity",
            Self::Bits => "bits",
            Self::Concentration => "concentration",
            Self::Currency => "currency",
            Self::DistancePerVolume => "distance/volume",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}

impl Serialize for Field {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Field {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Error type for field names outside the recognized set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownField(pub String);

impl fmt::Display for UnknownField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown event field: {}", self.0)
    }
}

impl std::error::Error for UnknownField {}
