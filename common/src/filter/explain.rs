use super::generate::parse_date;
use super::{find_field, Condition, ConditionValue, Connector, FieldConfig, FieldType, FilterOperator, StatusOption};

/// Message key of an operator label.
pub fn operator_message_key(operator: FilterOperator) -> &'static str {
    match operator {
        FilterOperator::Regex => "filter.operator.contains",
        FilterOperator::StartsWith => "filter.operator.startsWith",
        FilterOperator::EndsWith => "filter.operator.endsWith",
        FilterOperator::Exists => "filter.operator.exists",
        FilterOperator::NotExists => "filter.operator.notExists",
        FilterOperator::Eq => "filter.operator.eq",
        FilterOperator::Ne => "filter.operator.ne",
        FilterOperator::Gt => "filter.operator.gt",
        FilterOperator::Gte => "filter.operator.gte",
        FilterOperator::Lt => "filter.operator.lt",
        FilterOperator::Lte => "filter.operator.lte",
        FilterOperator::In => "filter.operator.in",
        FilterOperator::Nin => "filter.operator.nin",
    }
}

fn connector_message_key(connector: Connector) -> &'static str {
    match connector {
        Connector::And => "filter.connector.and",
        Connector::Or => "filter.connector.or",
    }
}

/// English labels, used when the caller has no translation table.
pub fn default_translation(key: &str) -> String {
    let text = match key {
        "filter.operator.contains" => "contains",
        "filter.operator.startsWith" => "starts with",
        "filter.operator.endsWith" => "ends with",
        "filter.operator.exists" => "is set",
        "filter.operator.notExists" => "is not set",
        "filter.operator.eq" => "is",
        "filter.operator.ne" => "is not",
        "filter.operator.gt" => "is greater than",
        "filter.operator.gte" => "is at least",
        "filter.operator.lt" => "is less than",
        "filter.operator.lte" => "is at most",
        "filter.operator.in" => "is one of",
        "filter.operator.nin" => "is none of",
        "filter.connector.and" => "and",
        "filter.connector.or" => "or",
        other => other,
    };
    text.to_string()
}

/// Human-readable sentence for one condition, e.g. `Name contains "bot"`.
///
/// Returns an empty string for a condition that would be left out of the filter.
pub fn get_condition_explanation<T>(
    condition: &Condition,
    fields: &[FieldConfig],
    status_options: &[StatusOption],
    translate: T,
) -> String
where
    T: Fn(&str) -> String,
{
    if !condition.operator.is_existence() && condition.value.is_empty() {
        return String::new();
    }

    let field = find_field(fields, &condition.field);
    let label = field
        .map(|field| field.label.as_str())
        .unwrap_or(condition.field.as_str());
    let field_type = field.map(|field| field.field_type).unwrap_or(FieldType::String);
    let operator = translate(operator_message_key(condition.operator));

    if condition.operator.is_existence() {
        return format!("{} {}", label, operator);
    }

    let shown = |raw: &str| -> String {
        match field_type {
            FieldType::Status => status_options
                .iter()
                .find(|option| option.value == raw)
                .map(|option| option.label.clone())
                .unwrap_or_else(|| raw.to_string()),
            FieldType::Date => parse_date(raw)
                .map(|date| date.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| raw.to_string()),
            FieldType::String => raw.to_string(),
        }
    };

    let value = match (&condition.operator, &condition.value) {
        (FilterOperator::In | FilterOperator::Nin, value) => value
            .items()
            .iter()
            .map(|item| format!("\"{}\"", shown(item)))
            .collect::<Vec<_>>()
            .join(", "),
        (_, ConditionValue::Text(text)) => format!("\"{}\"", shown(text)),
        (_, list) => format!("\"{}\"", list.display()),
    };

    format!("{} {} {}", label, operator, value)
}

/// Sentence for a whole condition list, joined by translated connectors.
pub fn generate_explanation<T>(
    conditions: &[Condition],
    fields: &[FieldConfig],
    status_options: &[StatusOption],
    translate: T,
) -> String
where
    T: Fn(&str) -> String,
{
    let mut sentence = String::new();
    for condition in conditions {
        let part = get_condition_explanation(condition, fields, status_options, &translate);
        if part.is_empty() {
            continue;
        }
        if !sentence.is_empty() {
            sentence.push(' ');
            sentence.push_str(&translate(connector_message_key(condition.connector)));
            sentence.push(' ');
        }
        sentence.push_str(&part);
    }
    sentence
}
