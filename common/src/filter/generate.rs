use super::{field_type_of, Condition, Connector, FieldConfig, FieldType, FilterOperator};
use crate::DAY_MILLIS;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{json, Map, Value};

/// Lowers a condition list into a filter object.
///
/// Conditions are grouped greedily left to right into runs joined by the same
/// connector. The first run adopts the connector of the second condition, so the
/// first condition's own connector never matters. Every later run takes its
/// first condition's connector and closes on the next change, even when it
/// holds a single condition. Several runs are wrapped in a top-level `$and`.
pub fn generate(conditions: &[Condition], fields: &[FieldConfig]) -> Map<String, Value> {
    let lowered: Vec<(Connector, Map<String, Value>)> = conditions
        .iter()
        .filter(|condition| condition.operator.is_existence() || !condition.value.is_empty())
        .filter_map(|condition| {
            build_condition(condition, fields).map(|predicate| (condition.connector, predicate))
        })
        .collect();

    let mut lowered = lowered.into_iter();
    let Some((_, first)) = lowered.next() else {
        return Map::new();
    };

    let mut runs: Vec<(Connector, Vec<Map<String, Value>>)> = Vec::new();
    let mut current_connector = Connector::And;
    let mut current = vec![first];

    for (connector, predicate) in lowered {
        if connector == current_connector {
            current.push(predicate);
        } else if runs.is_empty() && current.len() == 1 {
            current_connector = connector;
            current.push(predicate);
        } else {
            runs.push((current_connector, std::mem::take(&mut current)));
            current_connector = connector;
            current.push(predicate);
        }
    }
    runs.push((current_connector, current));

    let mut groups: Vec<Map<String, Value>> = runs
        .into_iter()
        .map(|(connector, mut predicates)| {
            if predicates.len() == 1 {
                predicates.remove(0)
            } else {
                group(connector, predicates)
            }
        })
        .collect();

    if groups.len() == 1 {
        groups.remove(0)
    } else {
        group(Connector::And, groups)
    }
}

fn group(connector: Connector, predicates: Vec<Map<String, Value>>) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert(
        connector.as_key().to_string(),
        Value::Array(predicates.into_iter().map(Value::Object).collect()),
    );
    map
}

/// Lowers one condition into `{ field: predicate }`.
///
/// Returns `None` when the condition carries no usable value.
pub fn build_condition(condition: &Condition, fields: &[FieldConfig]) -> Option<Map<String, Value>> {
    if !condition.operator.is_existence() && condition.value.is_empty() {
        return None;
    }

    let is_date = field_type_of(fields, &condition.field) == FieldType::Date;
    let text = condition.value.display();

    let predicate = match condition.operator {
        FilterOperator::Regex => json!({ "$regex": text, "$options": "i" }),
        FilterOperator::StartsWith => json!({ "$regex": format!("^{}", text), "$options": "i" }),
        FilterOperator::EndsWith => json!({ "$regex": format!("{}$", text), "$options": "i" }),
        FilterOperator::Exists => json!({ "$exists": true, "$ne": null }),
        FilterOperator::NotExists => json!({ "$exists": false }),
        FilterOperator::Eq if is_date => {
            let start = start_of_day_millis(&text)?;
            json!({ "$gte": start, "$lt": start + DAY_MILLIS })
        }
        FilterOperator::Eq => Value::String(text),
        FilterOperator::Ne
        | FilterOperator::Gt
        | FilterOperator::Gte
        | FilterOperator::Lt
        | FilterOperator::Lte => {
            let value = if is_date {
                Value::from(date_millis(&text)?)
            } else {
                Value::String(text)
            };
            let mut ops = Map::new();
            ops.insert(condition.operator.as_key().to_string(), value);
            Value::Object(ops)
        }
        FilterOperator::In | FilterOperator::Nin => {
            let items = condition.value.items();
            if items.is_empty() {
                return None;
            }
            let mut ops = Map::new();
            ops.insert(condition.operator.as_key().to_string(), json!(items));
            Value::Object(ops)
        }
    };

    let mut map = Map::new();
    map.insert(condition.field.clone(), predicate);
    Some(map)
}

/// Accepts epoch millis, RFC 3339, `YYYY-MM-DDTHH:MM[:SS]` and `YYYY-MM-DD`, all in UTC.
pub(crate) fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(millis) = value.parse::<i64>() {
        return DateTime::from_timestamp_millis(millis);
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Some(parsed.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|parsed| parsed.and_utc())
}

pub(crate) fn date_millis(value: &str) -> Option<i64> {
    parse_date(value).map(|parsed| parsed.timestamp_millis())
}

pub(crate) fn start_of_day_millis(value: &str) -> Option<i64> {
    let parsed = parse_date(value)?;
    parsed
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc().timestamp_millis())
}
