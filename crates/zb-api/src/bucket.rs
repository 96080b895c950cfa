//! Bucket resources and references.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ApiError;

/// Longest label the service accepts.
pub const MAX_LABEL_LEN: usize = 20;

/// A bucket as returned by the service.
///
/// Fields other than id, label and description are kept verbatim in
/// `metadata`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    #[serde(rename = "@id")]
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

/// One page of a bucket listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BucketPage {
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub buckets: Vec<Bucket>,
}

/// The events of one bucket.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventList {
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub events: Vec<Value>,
}

/// Something that identifies a bucket: an id, a typed bucket, or a raw
/// bucket resource carrying an `@id`.
#[derive(Debug, Clone, Copy)]
pub enum BucketRef<'a> {
    Id(&'a str),
    Bucket(&'a Bucket),
    Resource(&'a Value),
}

impl<'a> BucketRef<'a> {
    /// Resolves the bucket id without touching the network.
    pub fn id(&self) -> Result<&'a str, ApiError> {
        let id = match *self {
            Self::Id(id) => id,
            Self::Bucket(bucket) => bucket.id.as_str(),
            Self::Resource(value) => value.get("@id").and_then(Value::as_str).ok_or_else(|| {
                ApiError::InvalidArgument(
                    "@id field was not in the bucket resource, are you sure you passed a bucket?"
                        .to_string(),
                )
            })?,
        };
        if id.is_empty() {
            return Err(ApiError::InvalidArgument(
                "bucket id cannot be empty".to_string(),
            ));
        }
        Ok(id)
    }
}

impl<'a> From<&'a str> for BucketRef<'a> {
    fn from(value: &'a str) -> Self {
        Self::Id(value)
    }
}

impl<'a> From<&'a String> for BucketRef<'a> {
    fn from(value: &'a String) -> Self {
        Self::Id(value.as_str())
    }
}

impl<'a> From<&'a Bucket> for BucketRef<'a> {
    fn from(value: &'a Bucket) -> Self {
        Self::Bucket(value)
    }
}

impl<'a> From<&'a Value> for BucketRef<'a> {
    fn from(value: &'a Value) -> Self {
        Self::Resource(value)
    }
}

/// Checks a bucket label: 1-20 characters from `[a-zA-Z0-9-_ ]`.
pub fn validate_label(label: &str) -> Result<(), ApiError> {
    let len = label.chars().count();
    if !(1..=MAX_LABEL_LEN).contains(&len) {
        return Err(ApiError::InvalidArgument(format!(
            "bucket label must be 1-{MAX_LABEL_LEN} chars, got {len}"
        )));
    }
    if let Some(bad) = label
        .chars()
        .find(|&c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ' ')))
    {
        return Err(ApiError::InvalidArgument(format!(
            "bucket label can only contain [a-zA-Z0-9-_ ], found {bad:?}"
        )));
    }
    Ok(())
}
