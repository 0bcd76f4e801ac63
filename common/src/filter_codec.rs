//! Transport encoding of filter objects: standard base64 of the compact JSON text.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{Map, Value};

/// Malformed `filter` parameter. Every variant is a client error.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterCodecError {
    InvalidBase64(String),
    InvalidUtf8(String),
    InvalidJson(String),
}

impl std::fmt::Display for FilterCodecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterCodecError::InvalidBase64(err) => {
                write!(f, "Invalid filter encoding: bad base64: {}", err)
            }
            FilterCodecError::InvalidUtf8(err) => {
                write!(f, "Invalid filter encoding: bad UTF-8: {}", err)
            }
            FilterCodecError::InvalidJson(err) => {
                write!(f, "Invalid filter encoding: bad JSON: {}", err)
            }
        }
    }
}

impl std::error::Error for FilterCodecError {}

pub fn encode_filter(filter: &Value) -> String {
    BASE64.encode(filter.to_string())
}

/// Decodes a `filter` parameter. Blank input decodes to `{}`.
pub fn decode_filter(encoded: &str) -> Result<Value, FilterCodecError> {
    let encoded = encoded.trim();
    if encoded.is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    let bytes = BASE64
        .decode(encoded)
        .map_err(|e| FilterCodecError::InvalidBase64(e.to_string()))?;
    let text = String::from_utf8(bytes).map_err(|e| FilterCodecError::InvalidUtf8(e.to_string()))?;
    serde_json::from_str(&text).map_err(|e| FilterCodecError::InvalidJson(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_is_standard_base64_of_compact_json() {
        let filter = json!({"status": "ENABLED"});
        let encoded = encode_filter(&filter);
        assert_eq!(encoded, "eyJzdGF0dXMiOiJFTkFCTEVEIn0=");
        assert!(!encoded.contains('\n'));
    }

    #[test]
    fn test_decode_restores_nested_filter() {
        let filter = json!({
            "$or": [
                {"name": {"$regex": "bot", "$options": "i"}},
                {"status": {"$in": ["ENABLED", "PAUSED"]}}
            ]
        });
        assert_eq!(decode_filter(&encode_filter(&filter)).unwrap(), filter);
    }

    #[test]
    fn test_decode_blank_is_empty_object() {
        assert_eq!(decode_filter("").unwrap(), json!({}));
        assert_eq!(decode_filter("   ").unwrap(), json!({}));
    }

    #[test]
    fn test_decode_tolerates_surrounding_whitespace() {
        assert_eq!(
            decode_filter(" eyJzdGF0dXMiOiJFTkFCTEVEIn0=\n").unwrap(),
            json!({"status": "ENABLED"})
        );
    }

    #[test]
    fn test_decode_rejects_bad_base64() {
        assert!(matches!(
            decode_filter("not base64!!"),
            Err(FilterCodecError::InvalidBase64(_))
        ));
    }

    #[test]
    fn test_decode_rejects_bad_utf8() {
        let encoded = BASE64.encode([0xff, 0xfe, 0xfd]);
        assert!(matches!(
            decode_filter(&encoded),
            Err(FilterCodecError::InvalidUtf8(_))
        ));
    }

    #[test]
    fn test_decode_rejects_bad_json() {
        let encoded = BASE64.encode("{\"status\":");
        let err = decode_filter(&encoded).unwrap_err();
        assert!(matches!(err, FilterCodecError::InvalidJson(_)));
        assert!(err.to_string().starts_with("Invalid filter encoding"));
    }
}
