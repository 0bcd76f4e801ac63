use super::*;
use serde_json::json;

fn nested(levels: usize) -> Value {
    let mut value = json!(1);
    for _ in 0..levels {
        value = json!({ "a": value });
    }
    value
}

fn defaults() -> SanitizeOptions {
    SanitizeOptions::default()
}

#[test]
fn test_passes_supported_filter_through() {
    let filter = json!({
        "$or": [
            {"name": {"$regex": "bot", "$options": "i"}},
            {"status": {"$in": ["ENABLED", "PAUSED"]}},
            {"createdAt": {"$gte": 1714521600000i64, "$lt": 1714608000000i64}},
            {"description": {"$exists": true, "$ne": null}}
        ]
    });
    assert_eq!(sanitize(&filter, &defaults()).unwrap(), filter);
}

#[test]
fn test_deny_listed_operators_reject() {
    for operator in ["$where", "$function"] {
        let filter = json!({ operator: "1" });
        assert_eq!(
            sanitize(&filter, &defaults()),
            Err(SanitizeError::DisallowedOperator {
                operator: operator.to_string(),
                reason: OperatorRejection::DenyListed,
            })
        );
    }
}

#[test]
fn test_unknown_operator_rejects_as_not_allow_listed() {
    let filter = json!({"$madeUpOperator": 1});
    assert_eq!(
        sanitize(&filter, &defaults()),
        Err(SanitizeError::DisallowedOperator {
            operator: "$madeUpOperator".to_string(),
            reason: OperatorRejection::NotAllowListed,
        })
    );
}

#[test]
fn test_operator_rejected_at_depth() {
    let filter = json!({"$and": [{"name": {"$expr": {"$gt": 1}}}]});
    assert!(matches!(
        sanitize(&filter, &defaults()),
        Err(SanitizeError::DisallowedOperator {
            reason: OperatorRejection::DenyListed,
            ..
        })
    ));
}

#[test]
fn test_caller_can_extend_allow_list() {
    let filter = json!({"tags": {"$bitsAllSet": 3}});
    assert!(sanitize(&filter, &defaults()).is_err());
    let options = defaults().allow_operator("$bitsAllSet");
    assert_eq!(sanitize(&filter, &options).unwrap(), filter);
}

#[test]
fn test_extension_cannot_unlock_deny_listed_operator() {
    let options = defaults().allow_operator("$where");
    assert!(matches!(
        sanitize(&json!({"$where": "sleep(1000)"}), &options),
        Err(SanitizeError::DisallowedOperator {
            reason: OperatorRejection::DenyListed,
            ..
        })
    ));
}

#[test]
fn test_extension_is_per_call() {
    let filter = json!({"tags": {"$bitsAllSet": 3}});
    let extended = defaults().allow_operator("$bitsAllSet");
    assert!(sanitize(&filter, &extended).is_ok());
    assert!(sanitize(&filter, &defaults()).is_err());
}

#[test]
fn test_reserved_keys_reject_at_any_depth() {
    assert_eq!(
        sanitize(&json!({"__proto__": {"x": 1}}), &defaults()),
        Err(SanitizeError::DisallowedKey("__proto__".to_string()))
    );
    assert_eq!(
        sanitize(&json!({"constructor": {}}), &defaults()),
        Err(SanitizeError::DisallowedKey("constructor".to_string()))
    );
    assert_eq!(
        sanitize(&json!({"$or": [{"name": {"prototype": 1}}]}), &defaults()),
        Err(SanitizeError::DisallowedKey("prototype".to_string()))
    );
}

#[test]
fn test_reserved_key_rejects_even_when_field_list_would_drop_it() {
    let options = SanitizeOptions::with_fields(&["name"]);
    assert_eq!(
        sanitize(&json!({"__proto__": {"polluted": true}}), &options),
        Err(SanitizeError::DisallowedKey("__proto__".to_string()))
    );
}

#[test]
fn test_depth_ceiling() {
    assert!(sanitize(&nested(10), &defaults()).is_ok());
    assert_eq!(
        sanitize(&nested(11), &defaults()),
        Err(SanitizeError::MaxDepthExceeded { max_depth: 10 })
    );
}

#[test]
fn test_custom_depth_ceiling() {
    let options = defaults().max_depth(2);
    assert!(sanitize(&nested(2), &options).is_ok());
    assert!(matches!(
        sanitize(&nested(3), &options),
        Err(SanitizeError::MaxDepthExceeded { max_depth: 2 })
    ));
}

#[test]
fn test_arrays_do_not_add_depth() {
    let filter = json!({"a": [[[[{"b": 1}]]]]});
    assert!(sanitize(&filter, &defaults().max_depth(2)).is_ok());
}

#[test]
fn test_string_value_starting_with_dollar_rejects() {
    let options = SanitizeOptions::with_fields(&["name"]);
    assert_eq!(
        sanitize(&json!({"name": "$ne"}), &options),
        Err(SanitizeError::InvalidValue("$ne".to_string()))
    );
    assert_eq!(
        sanitize(&json!({"status": {"$in": ["ENABLED", "$where"]}}), &defaults()),
        Err(SanitizeError::InvalidValue("$where".to_string()))
    );
}

#[test]
fn test_unknown_top_level_field_is_dropped_not_rejected() {
    // Unknown fields are dropped so older clients keep working when the
    // allow-list changes; unknown operators are always a hard rejection.
    let options = SanitizeOptions::with_fields(&["name", "status"]);
    let filter = json!({"name": "bot", "secretField": {"$exists": true}});
    assert_eq!(sanitize(&filter, &options).unwrap(), json!({"name": "bot"}));

    let filter = json!({"name": "bot", "$madeUp": 1});
    assert!(matches!(
        sanitize(&filter, &options),
        Err(SanitizeError::DisallowedOperator {
            reason: OperatorRejection::NotAllowListed,
            ..
        })
    ));
}

#[test]
fn test_field_allow_list_is_top_level_only() {
    let options = SanitizeOptions::with_fields(&["name"]);
    let filter = json!({"name": {"nested": {"anything": 1}}});
    assert_eq!(sanitize(&filter, &options).unwrap(), filter);

    let grouped = json!({"$or": [{"other": 1}, {"name": "x"}]});
    assert_eq!(sanitize(&grouped, &options).unwrap(), grouped);
}

#[test]
fn test_non_container_input_is_empty_object() {
    for input in [json!(null), json!(1), json!("$where"), json!(true)] {
        assert_eq!(sanitize(&input, &defaults()).unwrap(), json!({}));
    }
}

#[test]
fn test_scalars_pass_through() {
    let filter = json!({"retries": 3, "active": false, "owner": null, "ratio": 0.5});
    assert_eq!(sanitize(&filter, &defaults()).unwrap(), filter);
}

#[test]
fn test_input_is_not_mutated() {
    let filter = json!({"name": "bot", "dropped": 1});
    let before = filter.clone();
    let _ = sanitize(&filter, &SanitizeOptions::with_fields(&["name"])).unwrap();
    assert_eq!(filter, before);
}

#[test]
fn test_sanitize_is_idempotent() {
    let options = SanitizeOptions::with_fields(&["name", "status"]);
    let inputs = [
        json!({"name": "bot", "unknown": {"$gt": 1}}),
        json!({"$or": [{"status": "ENABLED"}, {"name": {"$regex": "^b"}}]}),
        json!([{"name": 1}, {"other": 2}]),
        json!("not an object"),
        nested(10),
    ];
    for input in inputs {
        let once = sanitize(&input, &options).unwrap();
        let twice = sanitize(&once, &options).unwrap();
        assert_eq!(once, twice, "input {}", input);
    }
}

#[test]
fn test_error_messages() {
    let err = sanitize(&json!({"$where": "1"}), &defaults()).unwrap_err();
    assert_eq!(err.to_string(), "Operator $where is not permitted");
    let err = sanitize(&json!({"$foo": 1}), &defaults()).unwrap_err();
    assert_eq!(err.to_string(), "Operator $foo is not supported");
    let err = sanitize(&nested(11), &defaults()).unwrap_err();
    assert_eq!(err.to_string(), "Filter is nested deeper than 10 levels");
}
