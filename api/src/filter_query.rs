//! Turns the `filter` query parameter of a list request into the query handed to storage.

use crate::query_sanitizer::{sanitize, SanitizeError, SanitizeOptions};
use botfleet_common::{decode_filter, FilterCodecError};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum FilterRejection {
    InvalidFilterEncoding(FilterCodecError),
    Rejected(SanitizeError),
}

impl std::fmt::Display for FilterRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterRejection::InvalidFilterEncoding(e) => write!(f, "{}", e),
            FilterRejection::Rejected(e) => write!(f, "Invalid filter: {}", e),
        }
    }
}

impl std::error::Error for FilterRejection {}

impl From<FilterCodecError> for FilterRejection {
    fn from(e: FilterCodecError) -> Self {
        FilterRejection::InvalidFilterEncoding(e)
    }
}

impl From<SanitizeError> for FilterRejection {
    fn from(e: SanitizeError) -> Self {
        FilterRejection::Rejected(e)
    }
}

/// Decodes and sanitizes the client filter, then applies the trusted `scope`.
///
/// A missing or blank parameter is the empty filter.
pub fn scoped_query(
    filter_param: Option<&str>,
    scope: Map<String, Value>,
    options: &SanitizeOptions,
) -> Result<Map<String, Value>, FilterRejection> {
    let sanitized = decode_filter(filter_param.unwrap_or_default())
        .map_err(FilterRejection::from)
        .and_then(|decoded| sanitize(&decoded, options).map_err(FilterRejection::from))
        .inspect_err(|e| tracing::warn!(reason = %e, "rejected list filter"))?;

    let sanitized = match sanitized {
        Value::Object(map) => map,
        // a top-level array has no field keys to query on
        _ => Map::new(),
    };
    Ok(merge_scope(sanitized, scope))
}

/// Merges trusted scope keys over the sanitized filter; scope wins on collision.
pub fn merge_scope(sanitized: Map<String, Value>, scope: Map<String, Value>) -> Map<String, Value> {
    let mut merged = sanitized;
    for (key, value) in scope {
        merged.insert(key, value);
    }
    merged
}
