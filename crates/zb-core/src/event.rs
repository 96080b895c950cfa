//! Validated event records.
//!
//! An [`Event`] can only be obtained through [`EventBuilder::build`] or
//! [`Event::from_map`], both of which reject unknown fields, check the shape
//! of `timestamp`, `weight` and `volume`, and normalize them for the wire.

use std::collections::BTreeMap;

use chrono::{FixedOffset, Offset, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

use crate::error::EventError;
use crate::field::Field;
use crate::measure::{Measure, normalize_volume_unit, normalize_weight_unit};
use crate::timestamp::{Timestamp, TimestampInput};

/// Settings applied while normalizing an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Zone date-times are expressed in.
    pub zone: FixedOffset,
    /// Reject mis-decoded micro signs instead of accepting them.
    pub strict: bool,
}

impl NormalizeOptions {
    pub const fn new(zone: FixedOffset) -> Self {
        Self { zone, strict: true }
    }

    #[must_use]
    pub const fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self::new(Utc.fix())
    }
}

/// One observation, ready for submission to a bucket.
///
/// Serializes to a flat JSON object keyed by field name.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    timestamp: Option<Timestamp>,
    weight: Option<Measure>,
    volume: Option<Measure>,
    values: BTreeMap<Field, Value>,
}

impl Event {
    pub fn builder() -> EventBuilder {
        EventBuilder::default()
    }

    /// Builds an event from a string-keyed map, failing on the first key
    /// outside the recognized field set.
    pub fn from_map(
        map: Map<String, Value>,
        options: &NormalizeOptions,
    ) -> Result<Self, EventError> {
        let mut builder = Self::builder();
        for (key, value) in map {
            let field: Field = key.parse()?;
            builder = builder.field(field, value);
        }
        builder.build(options)
    }

    pub const fn timestamp(&self) -> Option<&Timestamp> {
        self.timestamp.as_ref()
    }

    pub const fn weight(&self) -> Option<&Measure> {
        self.weight.as_ref()
    }

    pub const fn volume(&self) -> Option<&Measure> {
        self.volume.as_ref()
    }

    /// Value of a loosely-typed field.
    ///
    /// `timestamp`, `weight` and `volume` have typed accessors and are never
    /// returned here.
    pub fn get(&self, field: Field) -> Option<&Value> {
        self.values.get(&field)
    }

    /// Fields present on this event, in serialization order.
    pub fn fields(&self) -> Vec<Field> {
        let mut fields: Vec<Field> = self.values.keys().copied().collect();
        if self.timestamp.is_some() {
            fields.push(Field::Timestamp);
        }
        if self.weight.is_some() {
            fields.push(Field::Weight);
        }
        if self.volume.is_some() {
            fields.push(Field::Volume);
        }
        fields.sort_unstable();
        fields
    }

    pub fn len(&self) -> usize {
        self.values.len()
            + usize::from(self.timestamp.is_some())
            + usize::from(self.weight.is_some())
            + usize::from(self.volume.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The wire representation as a JSON object.
    pub fn to_json(&self) -> Map<String, Value> {
        let mut map: Map<String, Value> = self
            .values
            .iter()
            .map(|(field, value)| (field.to_string(), value.clone()))
            .collect();
        if let Some(timestamp) = &self.timestamp {
            map.insert(Field::Timestamp.to_string(), timestamp.into());
        }
        if let Some(weight) = &self.weight {
            map.insert(Field::Weight.to_string(), weight.into());
        }
        if let Some(volume) = &self.volume {
            map.insert(Field::Volume.to_string(), volume.into());
        }
        map
    }
}

impl Serialize for Event {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for field in self.fields() {
            match field {
                Field::Timestamp => map.serialize_entry(field.as_str(), &self.timestamp)?,
                Field::Weight => map.serialize_entry(field.as_str(), &self.weight)?,
                Field::Volume => map.serialize_entry(field.as_str(), &self.volume)?,
                _ => map.serialize_entry(field.as_str(), &self.values[&field])?,
            }
        }
        map.end()
    }
}

/// Typed construction of an [`Event`].
///
/// Shape errors from [`EventBuilder::field`] are deferred until
/// [`EventBuilder::build`], so setters can be chained.
#[derive(Debug, Clone, Default)]
pub struct EventBuilder {
    timestamp: Option<TimestampInput>,
    weight: Option<Measure>,
    volume: Option<Measure>,
    values: BTreeMap<Field, Value>,
    error: Option<EventError>,
}

impl EventBuilder {
    #[must_use]
    pub fn timestamp(mut self, timestamp: impl Into<TimestampInput>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    #[must_use]
    pub fn weight(mut self, value: f64, unit: impl Into<String>) -> Self {
        self.weight = Some(Measure::new(value, unit));
        self
    }

    #[must_use]
    pub fn volume(mut self, value: f64, unit: impl Into<String>) -> Self {
        self.volume = Some(Measure::new(value, unit));
        self
    }

    #[must_use]
    pub fn tag(self, tag: impl Into<String>) -> Self {
        self.field(Field::Tag, Value::String(tag.into()))
    }

    #[must_use]
    pub fn tags<I, T>(self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let tags = tags.into_iter().map(|tag| Value::String(tag.into())).collect();
        self.field(Field::Tag, Value::Array(tags))
    }

    /// Sets any field from a JSON value.
    ///
    /// `timestamp`, `weight` and `volume` are shape-checked here; a failure
    /// is reported by `build`.
    #[must_use]
    pub fn field(mut self, field: Field, value: impl Into<Value>) -> Self {
        let value = value.into();
        let parsed = match field {
            Field::Timestamp => TimestampInput::from_json(value).map(|ts| {
                self.timestamp = Some(ts);
            }),
            Field::Weight => Measure::from_json(field, value).map(|m| {
                self.weight = Some(m);
            }),
            Field::Volume => Measure::from_json(field, value).map(|m| {
                self.volume = Some(m);
            }),
            _ => {
                self.values.insert(field, value);
                Ok(())
            }
        };
        if let Err(err) = parsed {
            self.error.get_or_insert(err);
        }
        self
    }

    /// Validates and normalizes the collected fields.
    pub fn build(self, options: &NormalizeOptions) -> Result<Event, EventError> {
        if let Some(err) = self.error {
            return Err(err);
        }

        let timestamp = self
            .timestamp
            .map(|ts| ts.normalize(&options.zone))
            .transpose()?;

        let weight = self
            .weight
            .map(|mut weight| {
                weight.unit = normalize_weight_unit(&weight.unit, options.strict)?;
                Ok::<_, EventError>(weight)
            })
            .transpose()?;

        let volume = self.volume.map(|mut volume| {
            volume.unit = normalize_volume_unit(&volume.unit);
            volume
        });

        Ok(Event {
            timestamp,
            weight,
            volume,
            values: self.values,
        })
    }
}
