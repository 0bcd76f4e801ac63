use crate::config::ApiConfig;
use crate::filter_query::{scoped_query, FilterRejection};
use crate::query_sanitizer::SanitizeOptions;
use crate::text_sanitizer::{sanitize_payload, DEFAULT_TEXT_FIELDS};
use poem_openapi::Object;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const BOT_FILTER_FIELDS: &[&str] = &["name", "description", "status", "createdAt", "updatedAt"];
pub const WORKER_FILTER_FIELDS: &[&str] = &[
    "name",
    "description",
    "status",
    "createdAt",
    "updatedAt",
    "botId",
];
pub const LOG_FILTER_FIELDS: &[&str] = &["level", "message", "botId", "workerId", "createdAt"];

#[derive(Debug, Serialize, Deserialize, Object)]
pub struct HealthResponse {
    pub success: bool,
    pub message: String,
    pub environment: String,
}

#[derive(Debug, Serialize, Deserialize, Object)]
#[oai(skip_serializing_if_is_none)]
pub struct ApiResponse<T: poem_openapi::types::ParseFromJSON + poem_openapi::types::ToJSON> {
    pub success: bool,
    #[oai(skip_serializing_if_is_none)]
    pub data: Option<T>,
    #[oai(skip_serializing_if_is_none)]
    pub error: Option<String>,
}

pub fn default_limit() -> i64 {
    50
}

/// Builds the storage query for a list endpoint from the raw `filter` parameter.
///
/// `scope` holds the trusted path parameters and always overrides the client filter.
pub fn list_query(
    filter: Option<&str>,
    scope: &[(&str, &str)],
    allowed_fields: &[&str],
    config: &ApiConfig,
) -> Result<Map<String, Value>, FilterRejection> {
    let scope = scope
        .iter()
        .map(|(field, value)| (field.to_string(), Value::String(value.to_string())))
        .collect();
    let options = SanitizeOptions::with_fields(allowed_fields).max_depth(config.filter_max_depth);
    scoped_query(filter, scope, &options)
}

/// Runs the text sanitizer over a request body's free-text fields.
pub fn sanitize_body<T: Serialize + DeserializeOwned>(body: T) -> anyhow::Result<T> {
    let value = serde_json::to_value(&body)
        .map_err(|e| anyhow::anyhow!("Invalid request body: {}", e))?;
    serde_json::from_value(sanitize_payload(&value, DEFAULT_TEXT_FIELDS))
        .map_err(|e| anyhow::anyhow!("Invalid request body: {}", e))
}

// Request types for bots
#[derive(Debug, Serialize, Deserialize, Object)]
pub struct CreateBotRequest {
    pub name: String,
    pub description: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Object)]
pub struct UpdateBotRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
}

// Request types for workers
#[derive(Debug, Serialize, Deserialize, Object)]
pub struct CreateWorkerRequest {
    pub name: String,
    pub description: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Object)]
pub struct UpdateWorkerRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
}

// Request types for logs
#[derive(Debug, Serialize, Deserialize, Object)]
pub struct CreateLogRequest {
    pub level: String,
    pub message: String,
}

#[derive(poem_openapi::Tags)]
pub enum ApiTags {
    /// System endpoints
    System,
    /// Bot management endpoints
    Bots,
    /// Worker management endpoints
    Workers,
    /// Worker log endpoints
    Logs,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sanitize_body_cleans_text_fields_only() {
        let body = CreateBotRequest {
            name: "  <script>x</script>Builder ".to_string(),
            description: Some("a & b".to_string()),
            status: Some("ENABLED".to_string()),
        };
        let clean = sanitize_body(body).unwrap();
        assert_eq!(clean.name, "Builder");
        assert_eq!(clean.description.as_deref(), Some("a &amp; b"));
        assert_eq!(clean.status.as_deref(), Some("ENABLED"));
    }

    #[test]
    fn test_list_query_applies_fields_and_depth() {
        let config = ApiConfig {
            filter_max_depth: 1,
            ..ApiConfig::default()
        };
        let encoded = botfleet_common::encode_filter(&json!({"secret": 1, "level": "INFO"}));
        let query = list_query(Some(&encoded), &[("workerId", "w-1")], LOG_FILTER_FIELDS, &config)
            .unwrap();
        assert_eq!(Value::Object(query), json!({"level": "INFO", "workerId": "w-1"}));

        let deep = botfleet_common::encode_filter(&json!({"level": {"$in": {"$eq": 1}}}));
        assert!(list_query(Some(&deep), &[], LOG_FILTER_FIELDS, &config).is_err());
    }
}
