use botfleet_common::{
    decode_filter, default_translation, encode_filter, generate, generate_explanation,
    new_condition, parse, Condition, FieldConfig, StatusOption,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cell::Cell;
use wasm_bindgen::prelude::*;

thread_local! {
    static NEXT_CONDITION_ID: Cell<u64> = const { Cell::new(0) };
}

fn next_condition_id() -> String {
    NEXT_CONDITION_ID.with(|counter| {
        let id = counter.get() + 1;
        counter.set(id);
        format!("cond-{}", id)
    })
}

fn from_json<T: DeserializeOwned>(input: &str, what: &str) -> Result<T, String> {
    serde_json::from_str(input).map_err(|e| format!("Invalid {} JSON: {}", what, e))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("Failed to serialize result: {}", e))
}

#[wasm_bindgen]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Builds the filter object for a list of builder conditions
#[wasm_bindgen]
pub fn filter_generate(conditions: &str, fields: &str) -> Result<String, String> {
    let conditions: Vec<Condition> = from_json(conditions, "conditions")?;
    let fields: Vec<FieldConfig> = from_json(fields, "fields")?;
    to_json(&generate(&conditions, &fields))
}

/// Rebuilds builder conditions from a filter object
#[wasm_bindgen]
pub fn filter_parse(filter: &str) -> Result<String, String> {
    let filter: serde_json::Value = from_json(filter, "filter")?;
    to_json(&parse(&filter, next_condition_id))
}

/// Encodes a filter object for the `filter` query parameter
#[wasm_bindgen]
pub fn filter_encode(filter: &str) -> Result<String, String> {
    let filter: serde_json::Value = from_json(filter, "filter")?;
    Ok(encode_filter(&filter))
}

#[wasm_bindgen]
pub fn filter_decode(encoded: &str) -> Result<String, String> {
    let filter = decode_filter(encoded).map_err(|e| e.to_string())?;
    to_json(&filter)
}

/// Human-readable sentence for the active conditions, in English
#[wasm_bindgen]
pub fn filter_explain(
    conditions: &str,
    fields: &str,
    status_options: &str,
) -> Result<String, String> {
    let conditions: Vec<Condition> = from_json(conditions, "conditions")?;
    let fields: Vec<FieldConfig> = from_json(fields, "fields")?;
    let status_options: Vec<StatusOption> = from_json(status_options, "status options")?;
    Ok(generate_explanation(
        &conditions,
        &fields,
        &status_options,
        default_translation,
    ))
}

/// Fresh condition for `field` with the field type's default operator
#[wasm_bindgen]
pub fn filter_new_condition(field: &str, fields: &str) -> Result<String, String> {
    let fields: Vec<FieldConfig> = from_json(fields, "fields")?;
    to_json(&new_condition(next_condition_id(), field, &fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    const FIELDS: &str = r#"[
        {"value": "name", "label": "Name", "type": "string"},
        {"value": "status", "label": "Status", "type": "status"},
        {"value": "createdAt", "label": "Created", "type": "date"}
    ]"#;

    #[test]
    fn test_generate_from_json() {
        let conditions = json!([
            {"id": "1", "field": "status", "operator": "$eq", "value": "ENABLED", "connector": "$and"},
            {"id": "2", "field": "name", "operator": "$regex", "value": "bot", "connector": "$and"}
        ]);
        let filter = filter_generate(&conditions.to_string(), FIELDS).unwrap();
        let filter: Value = serde_json::from_str(&filter).unwrap();
        assert_eq!(
            filter,
            json!({"$and": [
                {"status": "ENABLED"},
                {"name": {"$regex": "bot", "$options": "i"}}
            ]})
        );
    }

    #[test]
    fn test_parse_assigns_sequential_ids() {
        let parsed = filter_parse(r#"{"status": "ENABLED", "name": {"$regex": "^ci"}}"#).unwrap();
        let parsed: Vec<Condition> = serde_json::from_str(&parsed).unwrap();
        assert_eq!(parsed.len(), 2);
        assert!(parsed.iter().all(|condition| condition.id.starts_with("cond-")));
        assert_ne!(parsed[0].id, parsed[1].id);
    }

    #[test]
    fn test_encode_decode() {
        let encoded = filter_encode(r#"{"status":"ENABLED"}"#).unwrap();
        assert_eq!(encoded, "eyJzdGF0dXMiOiJFTkFCTEVEIn0=");
        assert_eq!(filter_decode(&encoded).unwrap(), r#"{"status":"ENABLED"}"#);
        assert_eq!(filter_decode("").unwrap(), "{}");
        assert!(filter_decode("***").is_err());
    }

    #[test]
    fn test_explain_uses_status_labels() {
        let conditions = json!([
            {"id": "1", "field": "status", "operator": "$eq", "value": "ENABLED", "connector": "$and"}
        ]);
        let options = r#"[{"label": "Enabled", "value": "ENABLED"}]"#;
        let sentence = filter_explain(&conditions.to_string(), FIELDS, options).unwrap();
        assert_eq!(sentence, r#"Status is "Enabled""#);
    }

    #[test]
    fn test_new_condition_defaults() {
        let condition = filter_new_condition("createdAt", FIELDS).unwrap();
        let condition: Value = serde_json::from_str(&condition).unwrap();
        assert_eq!(condition["operator"], json!("$gte"));
        assert_eq!(condition["value"], json!(""));
    }

    #[test]
    fn test_invalid_input_is_reported() {
        let err = filter_generate("not json", FIELDS).unwrap_err();
        assert!(err.starts_with("Invalid conditions JSON"));
    }
}
