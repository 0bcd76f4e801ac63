//! Trust boundary between a client-supplied filter object and the document store.
//!
//! The decoded `filter` parameter is treated as fully untrusted. Operators must be
//! explicitly allow-listed, high-risk operators are named in a deny-list, reserved
//! keys are refused at every level and nesting is capped. Any rejection aborts the
//! whole call; the only silent repair is dropping unknown top-level fields.

use serde_json::{Map, Value};
use std::collections::HashSet;

pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Operators a filter may use, grouped as comparison, logical, element, array and evaluation.
pub const ALLOWED_OPERATORS: &[&str] = &[
    "$eq",
    "$ne",
    "$gt",
    "$gte",
    "$lt",
    "$lte",
    "$in",
    "$nin",
    "$and",
    "$or",
    "$not",
    "$nor",
    "$exists",
    "$type",
    "$all",
    "$elemMatch",
    "$size",
    "$regex",
    "$options",
    "$mod",
];

/// Operators that run code, blow up evaluation cost or reach outside the predicate language.
/// Refused even when a caller lists them as extra allowed operators.
pub const DENIED_OPERATORS: &[&str] = &[
    "$where",
    "$function",
    "$accumulator",
    "$expr",
    "$jsonSchema",
    "$text",
    "$geoNear",
];

const RESERVED_KEYS: &[&str] = &["__proto__", "constructor", "prototype"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorRejection {
    DenyListed,
    NotAllowListed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SanitizeError {
    DisallowedOperator {
        operator: String,
        reason: OperatorRejection,
    },
    DisallowedKey(String),
    MaxDepthExceeded {
        max_depth: usize,
    },
    // string value starting with '$'
    InvalidValue(String),
}

impl std::fmt::Display for SanitizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SanitizeError::DisallowedOperator {
                operator,
                reason: OperatorRejection::DenyListed,
            } => write!(f, "Operator {} is not permitted", operator),
            SanitizeError::DisallowedOperator {
                operator,
                reason: OperatorRejection::NotAllowListed,
            } => write!(f, "Operator {} is not supported", operator),
            SanitizeError::DisallowedKey(key) => write!(f, "Key {} is not permitted", key),
            SanitizeError::MaxDepthExceeded { max_depth } => {
                write!(f, "Filter is nested deeper than {} levels", max_depth)
            }
            SanitizeError::InvalidValue(value) => {
                write!(f, "Filter value {:?} must not start with '$'", value)
            }
        }
    }
}

impl std::error::Error for SanitizeError {}

#[derive(Debug, Clone)]
pub struct SanitizeOptions {
    /// Operators accepted in addition to [`ALLOWED_OPERATORS`].
    pub allowed_operators: Vec<String>,
    /// Top-level field names to keep; `None` keeps every field.
    pub allowed_fields: Option<Vec<String>>,
    pub max_depth: usize,
}

impl Default for SanitizeOptions {
    fn default() -> Self {
        Self {
            allowed_operators: Vec::new(),
            allowed_fields: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl SanitizeOptions {
    pub fn with_fields(fields: &[&str]) -> Self {
        Self {
            allowed_fields: Some(fields.iter().map(|field| field.to_string()).collect()),
            ..Self::default()
        }
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn allow_operator(mut self, operator: &str) -> Self {
        self.allowed_operators.push(operator.to_string());
        self
    }
}

/// Sets composed for a single call; nothing is shared or mutated between calls.
struct Sanitizer<'a> {
    allowed_operators: HashSet<&'a str>,
    allowed_fields: Option<HashSet<&'a str>>,
    max_depth: usize,
}

impl<'a> Sanitizer<'a> {
    fn new(options: &'a SanitizeOptions) -> Self {
        let allowed_operators = ALLOWED_OPERATORS
            .iter()
            .copied()
            .chain(options.allowed_operators.iter().map(String::as_str))
            .collect();
        let allowed_fields = options
            .allowed_fields
            .as_ref()
            .map(|fields| fields.iter().map(String::as_str).collect());
        Self {
            allowed_operators,
            allowed_fields,
            max_depth: options.max_depth,
        }
    }

    fn value(&self, value: &Value, depth: usize) -> Result<Value, SanitizeError> {
        if depth > self.max_depth {
            return Err(SanitizeError::MaxDepthExceeded {
                max_depth: self.max_depth,
            });
        }
        match value {
            Value::Null | Value::Bool(_) | Value::Number(_) => Ok(value.clone()),
            Value::String(text) if text.starts_with('$') => {
                Err(SanitizeError::InvalidValue(text.clone()))
            }
            Value::String(_) => Ok(value.clone()),
            Value::Array(items) => items
                .iter()
                .map(|item| self.value(item, depth))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Value::Object(map) => self.object(map, depth).map(Value::Object),
        }
    }

    fn object(&self, map: &Map<String, Value>, depth: usize) -> Result<Map<String, Value>, SanitizeError> {
        let mut sanitized = Map::new();
        for (key, value) in map {
            if RESERVED_KEYS.contains(&key.as_str()) {
                return Err(SanitizeError::DisallowedKey(key.clone()));
            }
            if key.starts_with('$') {
                self.check_operator(key)?;
            } else if depth == 0 {
                if let Some(fields) = &self.allowed_fields {
                    if !fields.contains(key.as_str()) {
                        tracing::debug!(field = %key, "dropping filter field outside allow-list");
                        continue;
                    }
                }
            }
            sanitized.insert(key.clone(), self.value(value, depth + 1)?);
        }
        Ok(sanitized)
    }

    fn check_operator(&self, operator: &str) -> Result<(), SanitizeError> {
        let reason = if DENIED_OPERATORS.contains(&operator) {
            OperatorRejection::DenyListed
        } else if !self.allowed_operators.contains(operator) {
            OperatorRejection::NotAllowListed
        } else {
            return Ok(());
        };
        Err(SanitizeError::DisallowedOperator {
            operator: operator.to_string(),
            reason,
        })
    }
}

/// Returns a sanitized copy of `input`; the input is never modified.
///
/// Anything other than an object or array sanitizes to `{}`.
pub fn sanitize(input: &Value, options: &SanitizeOptions) -> Result<Value, SanitizeError> {
    if !(input.is_object() || input.is_array()) {
        return Ok(Value::Object(Map::new()));
    }
    Sanitizer::new(options).value(input, 0)
}

#[cfg(test)]
mod tests;
