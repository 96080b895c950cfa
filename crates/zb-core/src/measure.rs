//! Quantities with units (`weight`, `volume`) and their unit clean-up.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EventError;
use crate::field::Field;

/// Canonical microgram unit expected by the event store.
pub const MICROGRAM: &str = "ug";

/// Spellings of micrograms rewritten to [`MICROGRAM`].
const MICROGRAM_ALIASES: [&str; 3] = ["mcg", "\u{b5}g", "\u{3bc}g"];

/// A UTF-8 micro sign decoded as Latin-1.
const MANGLED_MICROGRAM: &str = "\u{c2}\u{b5}g";

/// A numeric value with a unit, e.g. `{"@value": 5, "unit": "mg"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Measure {
    #[serde(rename = "@value", alias = "value")]
    pub value: f64,
    pub unit: String,
}

impl Measure {
    pub fn new(value: f64, unit: impl Into<String>) -> Self {
        Self {
            value,
            unit: unit.into(),
        }
    }

    pub(crate) fn from_json(field: Field, value: Value) -> Result<Self, EventError> {
        serde_json::from_value(value).map_err(|err| EventError::InvalidMeasure {
            field,
            reason: err.to_string(),
        })
    }
}

impl From<&Measure> for Value {
    fn from(value: &Measure) -> Self {
        serde_json::json!({"@value": value.value, "unit": value.unit})
    }
}

/// Rewrites microgram aliases to `ug`.
///
/// A mis-decoded micro sign (`Âµg`) is rejected in strict mode and treated
/// as micrograms otherwise.
pub(crate) fn normalize_weight_unit(unit: &str, strict: bool) -> Result<String, EventError> {
    if MICROGRAM_ALIASES.contains(&unit) {
        return Ok(MICROGRAM.to_string());
    }
    if unit == MANGLED_MICROGRAM {
        if strict {
            return Err(EventError::SuspiciousUnit {
                unit: unit.to_string(),
            });
        }
        tracing::warn!(unit, "treating mis-decoded micro sign as micrograms");
        return Ok(MICROGRAM.to_string());
    }
    Ok(unit.to_string())
}

/// Upper-cases the liter sign (`ml` -> `mL`).
pub(crate) fn normalize_volume_unit(unit: &str) -> String {
    unit.replace('l', "L")
}
