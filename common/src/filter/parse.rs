use super::{Condition, ConditionValue, Connector, FilterOperator};
use serde_json::{Map, Value};

/// Operator keys checked when mapping a predicate back to a condition, in priority order.
/// Only the first key present is used; co-occurring keys are ignored.
const PARSE_PRIORITY: &[&str] = &[
    "$regex", "$exists", "$in", "$nin", "$ne", "$gt", "$gte", "$lt", "$lte",
];

/// Maps a saved filter object back onto builder conditions.
///
/// Best effort: a top-level `$and`/`$or` group is opened one level deep, and any
/// fragment that does not fit a single condition is left out.
pub fn parse<F>(filter: &Value, mut next_id: F) -> Vec<Condition>
where
    F: FnMut() -> String,
{
    let Some(object) = filter.as_object() else {
        return Vec::new();
    };

    let mut conditions = Vec::new();
    for (key, value) in object {
        if let Some(connector) = Connector::from_key(key) {
            let Some(elements) = value.as_array() else {
                continue;
            };
            for (index, element) in elements.iter().enumerate() {
                let Some(element) = element.as_object() else {
                    continue;
                };
                let element_connector = if index == 0 {
                    Connector::And
                } else {
                    connector
                };
                parse_fields(element, element_connector, &mut next_id, &mut conditions);
            }
        } else {
            parse_field(key, value, Connector::And, &mut next_id, &mut conditions);
        }
    }
    conditions
}

fn parse_fields<F>(
    object: &Map<String, Value>,
    connector: Connector,
    next_id: &mut F,
    conditions: &mut Vec<Condition>,
) where
    F: FnMut() -> String,
{
    for (field, value) in object {
        parse_field(field, value, connector, next_id, conditions);
    }
}

fn parse_field<F>(
    field: &str,
    value: &Value,
    connector: Connector,
    next_id: &mut F,
    conditions: &mut Vec<Condition>,
) where
    F: FnMut() -> String,
{
    // nested groups are not opened
    if field.starts_with('$') {
        return;
    }
    if let Some((operator, value)) = parse_predicate(value) {
        conditions.push(Condition::new(next_id(), field, operator, value, connector));
    }
}

fn parse_predicate(value: &Value) -> Option<(FilterOperator, ConditionValue)> {
    let ops = match value {
        Value::Object(ops) => ops,
        Value::Null | Value::Array(_) => return None,
        scalar => return Some((FilterOperator::Eq, ConditionValue::Text(scalar_text(scalar)?))),
    };

    let key = PARSE_PRIORITY
        .iter()
        .copied()
        .find(|key| ops.contains_key(*key))?;
    let operand = &ops[key];

    match key {
        "$regex" => {
            let pattern = operand.as_str()?;
            if let Some(rest) = pattern.strip_prefix('^') {
                Some((FilterOperator::StartsWith, rest.into()))
            } else if let Some(rest) = pattern.strip_suffix('$') {
                Some((FilterOperator::EndsWith, rest.into()))
            } else {
                Some((FilterOperator::Regex, pattern.into()))
            }
        }
        "$exists" => {
            let operator = if operand.as_bool()? {
                FilterOperator::Exists
            } else {
                FilterOperator::NotExists
            };
            Some((operator, ConditionValue::default()))
        }
        "$in" | "$nin" => {
            let items = operand
                .as_array()?
                .iter()
                .filter_map(scalar_text)
                .collect::<Vec<_>>();
            let operator = if key == "$in" {
                FilterOperator::In
            } else {
                FilterOperator::Nin
            };
            Some((operator, ConditionValue::List(items)))
        }
        "$ne" => Some((FilterOperator::Ne, ConditionValue::Text(scalar_text(operand)?))),
        "$gt" => Some((FilterOperator::Gt, ConditionValue::Text(scalar_text(operand)?))),
        "$gte" => Some((FilterOperator::Gte, ConditionValue::Text(scalar_text(operand)?))),
        "$lt" => Some((FilterOperator::Lt, ConditionValue::Text(scalar_text(operand)?))),
        "$lte" => Some((FilterOperator::Lte, ConditionValue::Text(scalar_text(operand)?))),
        _ => None,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}
