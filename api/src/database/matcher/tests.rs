use super::*;
use serde_json::json;

fn bot() -> Value {
    json!({
        "id": "bot-1",
        "name": "Alpha Builder",
        "description": "Runs nightly builds",
        "status": "ENABLED",
        "createdAt": 1714566600000i64,
        "retries": 7,
        "tags": ["ci", "nightly"],
        "meta": {"region": "eu-west", "owner": null},
        "runs": [{"ok": true, "ms": 120}, {"ok": false, "ms": 900}]
    })
}

fn check(query: Value) -> bool {
    compile(query.as_object().unwrap()).unwrap().matches(&bot())
}

fn fails(query: Value) -> bool {
    compile(query.as_object().unwrap()).is_err()
}

#[test]
fn test_empty_query_matches_everything() {
    assert!(check(json!({})));
}

#[test]
fn test_implicit_equality() {
    assert!(check(json!({"status": "ENABLED"})));
    assert!(!check(json!({"status": "DISABLED"})));
    assert!(check(json!({"status": "ENABLED", "id": "bot-1"})));
    assert!(!check(json!({"status": "ENABLED", "id": "bot-2"})));
}

#[test]
fn test_generated_string_predicates() {
    assert!(check(json!({"name": {"$regex": "alpha", "$options": "i"}})));
    assert!(!check(json!({"name": {"$regex": "alpha"}})));
    assert!(check(json!({"name": {"$regex": "^alp", "$options": "i"}})));
    assert!(check(json!({"name": {"$regex": "builder$", "$options": "i"}})));
    assert!(!check(json!({"name": {"$regex": "^builder", "$options": "i"}})));
}

#[test]
fn test_generated_date_range() {
    let day = json!({"createdAt": {"$gte": 1714521600000i64, "$lt": 1714608000000i64}});
    assert!(check(day));
    let next_day = json!({"createdAt": {"$gte": 1714608000000i64, "$lt": 1714694400000i64}});
    assert!(!check(next_day));
}

#[test]
fn test_exists_predicates() {
    assert!(check(json!({"description": {"$exists": true, "$ne": null}})));
    assert!(check(json!({"deletedAt": {"$exists": false}})));
    assert!(!check(json!({"deletedAt": {"$exists": true}})));
    assert!(check(json!({"meta.owner": {"$exists": true}})));
    assert!(!check(json!({"meta.owner": {"$exists": true, "$ne": null}})));
}

#[test]
fn test_null_matches_missing_field() {
    assert!(check(json!({"deletedAt": null})));
    assert!(!check(json!({"deletedAt": {"$ne": null}})));
}

#[test]
fn test_comparisons_require_same_kind() {
    assert!(check(json!({"retries": {"$gt": 5}})));
    assert!(check(json!({"retries": {"$lte": 7.0}})));
    assert!(!check(json!({"retries": {"$gt": "5"}})));
    assert!(check(json!({"name": {"$gt": "A"}})));
    assert!(!check(json!({"name": {"$lt": 10}})));
}

#[test]
fn test_in_and_nin() {
    assert!(check(json!({"status": {"$in": ["ENABLED", "PAUSED"]}})));
    assert!(!check(json!({"status": {"$nin": ["ENABLED", "PAUSED"]}})));
    assert!(check(json!({"status": {"$nin": ["DISABLED"]}})));
    assert!(check(json!({"tags": {"$in": ["nightly"]}})));
}

#[test]
fn test_logical_groups() {
    assert!(check(json!({"$or": [{"status": "DISABLED"}, {"name": {"$regex": "alpha", "$options": "i"}}]})));
    assert!(!check(json!({"$and": [{"status": "ENABLED"}, {"retries": {"$lt": 3}}]})));
    assert!(check(json!({"$nor": [{"status": "DISABLED"}, {"retries": 0}]})));
    assert!(check(json!({"retries": {"$not": {"$gt": 10}}})));
    assert!(!check(json!({"$and": [{"$or": [{"status": "PAUSED"}]}]})));
}

#[test]
fn test_array_fields() {
    assert!(check(json!({"tags": "ci"})));
    assert!(check(json!({"tags": {"$size": 2}})));
    assert!(check(json!({"tags": {"$all": ["nightly", "ci"]}})));
    assert!(!check(json!({"tags": {"$all": ["ci", "release"]}})));
    assert!(check(json!({"tags.0": "ci"})));
    assert!(check(json!({"runs.ms": {"$gt": 500}})));
    assert!(check(json!({"runs": {"$elemMatch": {"ok": false, "ms": {"$gte": 900}}}})));
    assert!(!check(json!({"runs": {"$elemMatch": {"ok": true, "ms": {"$gte": 900}}}})));
    assert!(check(json!({"tags": {"$elemMatch": {"$regex": "^night"}}})));
}

#[test]
fn test_dotted_paths() {
    assert!(check(json!({"meta.region": "eu-west"})));
    assert!(!check(json!({"meta.region.zone": "a"})));
}

#[test]
fn test_type_and_mod() {
    assert!(check(json!({"name": {"$type": "string"}})));
    assert!(check(json!({"retries": {"$type": ["string", "int"]}})));
    assert!(!check(json!({"retries": {"$type": "double"}})));
    assert!(check(json!({"retries": {"$mod": [4, 3]}})));
    assert!(!check(json!({"retries": {"$mod": [2, 0]}})));
}

#[test]
fn test_regex_options() {
    assert!(check(json!({"description": {"$regex": "NIGHTLY", "$options": "i"}})));
    assert!(check(json!({"description": {"$regex": "runs \\s nightly", "$options": "ix"}})));
}

#[test]
fn test_malformed_operators_are_errors() {
    assert!(fails(json!({"name": {"$regex": "("}})));
    assert!(fails(json!({"name": {"$regex": "a", "$options": "g"}})));
    assert!(fails(json!({"name": {"$options": "i"}})));
    assert!(fails(json!({"status": {"$in": "ENABLED"}})));
    assert!(fails(json!({"retries": {"$mod": [0, 1]}})));
    assert!(fails(json!({"retries": {"$size": -1}})));
    assert!(fails(json!({"name": {"$type": "date"}})));
    assert!(fails(json!({"$or": []})));
    assert!(fails(json!({"$where": "1"})));
    assert!(fails(json!({"name": {"$where": "1"}})));
}

#[test]
fn test_oversized_regex_is_rejected() {
    let query = json!({"name": {"$regex": "\\w{1000}\\w{1000}\\w{1000}"}});
    assert!(fails(query));
}

#[test]
fn test_errors_are_invalid_query() {
    let query = json!({"name": {"$regex": "["}});
    let err = compile(query.as_object().unwrap()).unwrap_err();
    assert!(err.is::<InvalidQuery>());
    assert!(err.to_string().starts_with("Invalid filter: Invalid regex"));
}

#[test]
fn test_mixed_operator_and_field_keys_rejected_in_any_order() {
    assert!(fails(json!({"retries": {"x": 1, "$gt": 0}})));
    assert!(fails(json!({"retries": {"$gt": 0, "x": 1}})));
    assert!(fails(json!({"retries": {"$not": {"x": 1, "$gt": 0}}})));
    assert!(fails(json!({"runs": {"$elemMatch": {"ok": true, "$gt": 0}}})));
    assert!(check(json!({"meta": {"region": "eu-west", "owner": null}})));
}

#[test]
fn test_compiled_query_is_reused_across_documents() {
    let query = json!({"name": {"$regex": "^alpha", "$options": "i"}, "retries": {"$gte": 5}});
    let compiled = compile(query.as_object().unwrap()).unwrap();
    assert!(compiled.matches(&bot()));
    assert!(!compiled.matches(&json!({"name": "Beta", "retries": 9})));
    assert!(!compiled.matches(&json!({"name": "alpha two", "retries": 1})));
    assert!(compiled.matches(&json!({"name": "ALPHA two", "retries": 5})));
}

#[test]
fn test_malformed_operator_fails_without_a_document() {
    // Validation does not depend on what the documents hold.
    assert!(fails(json!({"missing": {"$type": "date"}})));
    assert!(fails(json!({"$or": [{"status": "PAUSED"}, {"name": {"$regex": "("}}]})));
}
