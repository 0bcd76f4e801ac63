//! Condition-builder DSL for list filters.
//!
//! The web UI edits a flat list of [`Condition`]s. [`generate`] lowers that list
//! into a MongoDB-style filter object and [`parse`] maps a saved filter object
//! back onto conditions so it can be edited again.

mod explain;
mod generate;
mod parse;

pub use explain::{
    default_translation, generate_explanation, get_condition_explanation, operator_message_key,
};
pub use generate::{build_condition, generate};
pub use parse::parse;

use serde::{Deserialize, Serialize};

/// How a condition combines with the conditions before it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Connector {
    #[default]
    #[serde(rename = "$and")]
    And,
    #[serde(rename = "$or")]
    Or,
}

impl Connector {
    pub fn as_key(&self) -> &'static str {
        match self {
            Connector::And => "$and",
            Connector::Or => "$or",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "$and" => Some(Connector::And),
            "$or" => Some(Connector::Or),
            _ => None,
        }
    }
}

/// Operators offered by the condition builder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOperator {
    #[serde(rename = "$regex")]
    Regex, // contains
    #[serde(rename = "$startsWith")]
    StartsWith, // lowered to ^value
    #[serde(rename = "$endsWith")]
    EndsWith, // lowered to value$
    #[serde(rename = "$exists")]
    Exists,
    #[serde(rename = "$notExists")]
    NotExists,
    #[serde(rename = "$eq")]
    Eq,
    #[serde(rename = "$ne")]
    Ne,
    #[serde(rename = "$gt")]
    Gt,
    #[serde(rename = "$gte")]
    Gte,
    #[serde(rename = "$lt")]
    Lt,
    #[serde(rename = "$lte")]
    Lte,
    #[serde(rename = "$in")]
    In,
    #[serde(rename = "$nin")]
    Nin,
}

impl FilterOperator {
    pub fn as_key(&self) -> &'static str {
        match self {
            FilterOperator::Regex => "$regex",
            FilterOperator::StartsWith => "$startsWith",
            FilterOperator::EndsWith => "$endsWith",
            FilterOperator::Exists => "$exists",
            FilterOperator::NotExists => "$notExists",
            FilterOperator::Eq => "$eq",
            FilterOperator::Ne => "$ne",
            FilterOperator::Gt => "$gt",
            FilterOperator::Gte => "$gte",
            FilterOperator::Lt => "$lt",
            FilterOperator::Lte => "$lte",
            FilterOperator::In => "$in",
            FilterOperator::Nin => "$nin",
        }
    }

    /// Existence checks carry no value.
    pub fn is_existence(&self) -> bool {
        matches!(self, FilterOperator::Exists | FilterOperator::NotExists)
    }
}

/// Value typed into a condition: free text or a multi-select list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionValue {
    Text(String),
    List(Vec<String>),
}

impl Default for ConditionValue {
    fn default() -> Self {
        ConditionValue::Text(String::new())
    }
}

impl ConditionValue {
    pub fn is_empty(&self) -> bool {
        match self {
            ConditionValue::Text(text) => text.is_empty(),
            ConditionValue::List(items) => items.is_empty(),
        }
    }

    /// Text form; lists are joined with ", ".
    pub fn display(&self) -> String {
        match self {
            ConditionValue::Text(text) => text.clone(),
            ConditionValue::List(items) => items.join(", "),
        }
    }

    /// List form; text is split on commas and blank items are dropped.
    pub fn items(&self) -> Vec<String> {
        let raw: Vec<&str> = match self {
            ConditionValue::Text(text) => text.split(',').collect(),
            ConditionValue::List(items) => items.iter().map(String::as_str).collect(),
        };
        raw.into_iter()
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl From<&str> for ConditionValue {
    fn from(value: &str) -> Self {
        ConditionValue::Text(value.to_string())
    }
}

impl From<Vec<String>> for ConditionValue {
    fn from(value: Vec<String>) -> Self {
        ConditionValue::List(value)
    }
}

/// One user-authored predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub id: String,
    pub field: String,
    pub operator: FilterOperator,
    #[serde(default)]
    pub value: ConditionValue,
    #[serde(default)]
    pub connector: Connector,
}

impl Condition {
    pub fn new(
        id: impl Into<String>,
        field: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<ConditionValue>,
        connector: Connector,
    ) -> Self {
        Self {
            id: id.into(),
            field: field.into(),
            operator,
            value: value.into(),
            connector,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Status,
    Date,
}

/// Per-screen description of a filterable field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldConfig {
    pub value: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

impl FieldConfig {
    pub fn new(value: &str, label: &str, field_type: FieldType) -> Self {
        Self {
            value: value.to_string(),
            label: label.to_string(),
            field_type,
        }
    }
}

/// Display label for one value of a status field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusOption {
    pub label: String,
    pub value: String,
}

pub(crate) fn find_field<'a>(fields: &'a [FieldConfig], name: &str) -> Option<&'a FieldConfig> {
    fields.iter().find(|field| field.value == name)
}

pub(crate) fn field_type_of(fields: &[FieldConfig], name: &str) -> FieldType {
    find_field(fields, name)
        .map(|field| field.field_type)
        .unwrap_or(FieldType::String)
}

/// Operator preselected when a field is picked in the builder
pub fn default_operator(field_type: FieldType) -> FilterOperator {
    match field_type {
        FieldType::String => FilterOperator::Regex,
        FieldType::Status => FilterOperator::Eq,
        FieldType::Date => FilterOperator::Gte,
    }
}

/// Fresh, empty condition for the "add condition" action
pub fn new_condition(id: impl Into<String>, field: &str, fields: &[FieldConfig]) -> Condition {
    Condition::new(
        id,
        field,
        default_operator(field_type_of(fields, field)),
        ConditionValue::default(),
        Connector::And,
    )
}
