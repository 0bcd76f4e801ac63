use super::common::{
    default_limit, list_query, sanitize_body, ApiResponse, ApiTags, CreateLogRequest,
    LOG_FILTER_FIELDS,
};
use crate::config::ApiConfig;
use crate::database::{Database, InvalidQuery, LogEntry, Page};
use crate::filter_query::FilterRejection;
use crate::validation::{validate_log_level, validate_message};
use poem::web::Data;
use poem_openapi::{
    param::{Path, Query},
    payload::Json,
    OpenApi,
};
use serde_json::{Map, Value};
use std::sync::Arc;

#[derive(poem_openapi::ApiResponse)]
pub enum LogListResponse {
    #[oai(status = 200)]
    Ok(Json<ApiResponse<Page<LogEntry>>>),
    #[oai(status = 400)]
    BadRequest(Json<ApiResponse<Page<LogEntry>>>),
    #[oai(status = 500)]
    InternalError(Json<ApiResponse<Page<LogEntry>>>),
}

impl LogListResponse {
    fn bad_request(message: String) -> Self {
        LogListResponse::BadRequest(Json(ApiResponse {
            success: false,
            data: None,
            error: Some(message),
        }))
    }
}

async fn list_logs(
    db: &Database,
    query: Result<Map<String, Value>, FilterRejection>,
    limit: i64,
    offset: i64,
) -> LogListResponse {
    let query = match query {
        Ok(query) => query,
        Err(e) => return LogListResponse::bad_request(e.to_string()),
    };

    match db.find_logs(&query, limit, offset).await {
        Ok(page) => LogListResponse::Ok(Json(ApiResponse {
            success: true,
            data: Some(page),
            error: None,
        })),
        Err(e) if e.is::<InvalidQuery>() => LogListResponse::bad_request(e.to_string()),
        Err(e) => {
            tracing::error!(error = %e, "failed to list logs");
            LogListResponse::InternalError(Json(ApiResponse {
                success: false,
                data: None,
                error: Some(format!("Failed to list logs: {}", e)),
            }))
        }
    }
}

fn validate_new_log(req: CreateLogRequest) -> anyhow::Result<CreateLogRequest> {
    let req = sanitize_body(req)?;
    validate_log_level(&req.level)?;
    validate_message(&req.message)?;
    Ok(req)
}

pub struct LogsApi;

#[OpenApi]
impl LogsApi {
    /// List a worker's logs
    #[oai(path = "/workers/:worker_id/logs", method = "get", tag = "ApiTags::Logs")]
    async fn list_worker_logs(
        &self,
        db: Data<&Arc<Database>>,
        config: Data<&Arc<ApiConfig>>,
        worker_id: Path<String>,
        filter: Query<Option<String>>,
        #[oai(default = "default_limit")] limit: Query<i64>,
        #[oai(default)] offset: Query<i64>,
    ) -> LogListResponse {
        let query = list_query(
            filter.0.as_deref(),
            &[("workerId", worker_id.0.as_str())],
            LOG_FILTER_FIELDS,
            &config,
        );
        list_logs(&db, query, limit.0, offset.0).await
    }

    /// List logs across all of a bot's workers
    #[oai(path = "/bots/:bot_id/logs", method = "get", tag = "ApiTags::Logs")]
    async fn list_bot_logs(
        &self,
        db: Data<&Arc<Database>>,
        config: Data<&Arc<ApiConfig>>,
        bot_id: Path<String>,
        filter: Query<Option<String>>,
        #[oai(default = "default_limit")] limit: Query<i64>,
        #[oai(default)] offset: Query<i64>,
    ) -> LogListResponse {
        let query = list_query(
            filter.0.as_deref(),
            &[("botId", bot_id.0.as_str())],
            LOG_FILTER_FIELDS,
            &config,
        );
        list_logs(&db, query, limit.0, offset.0).await
    }

    /// Append a log entry
    #[oai(path = "/workers/:worker_id/logs", method = "post", tag = "ApiTags::Logs")]
    async fn create_log(
        &self,
        db: Data<&Arc<Database>>,
        worker_id: Path<String>,
        req: Json<CreateLogRequest>,
    ) -> Json<ApiResponse<LogEntry>> {
        let req = match validate_new_log(req.0) {
            Ok(req) => req,
            Err(e) => {
                return Json(ApiResponse {
                    success: false,
                    data: None,
                    error: Some(e.to_string()),
                })
            }
        };

        match db.create_log(&worker_id.0, &req.level, &req.message).await {
            Ok(Some(entry)) => Json(ApiResponse {
                success: true,
                data: Some(entry),
                error: None,
            }),
            Ok(None) => Json(ApiResponse {
                success: false,
                data: None,
                error: Some("Worker not found".to_string()),
            }),
            Err(e) => {
                tracing::error!(worker_id = %worker_id.0, error = %e, "failed to create log entry");
                Json(ApiResponse {
                    success: false,
                    data: None,
                    error: Some(format!("Failed to create log entry: {}", e)),
                })
            }
        }
    }

    /// Get log entry
    #[oai(path = "/logs/:log_id", method = "get", tag = "ApiTags::Logs")]
    async fn get_log(
        &self,
        db: Data<&Arc<Database>>,
        log_id: Path<String>,
    ) -> Json<ApiResponse<LogEntry>> {
        match db.get_log(&log_id.0).await {
            Ok(Some(entry)) => Json(ApiResponse {
                success: true,
                data: Some(entry),
                error: None,
            }),
            Ok(None) => Json(ApiResponse {
                success: false,
                data: None,
                error: Some("Log entry not found".to_string()),
            }),
            Err(e) => Json(ApiResponse {
                success: false,
                data: None,
                error: Some(e.to_string()),
            }),
        }
    }

    /// Delete log entry
    #[oai(path = "/logs/:log_id", method = "delete", tag = "ApiTags::Logs")]
    async fn delete_log(
        &self,
        db: Data<&Arc<Database>>,
        log_id: Path<String>,
    ) -> Json<ApiResponse<String>> {
        match db.delete_log(&log_id.0).await {
            Ok(true) => Json(ApiResponse {
                success: true,
                data: Some("Log entry deleted".to_string()),
                error: None,
            }),
            Ok(false) => Json(ApiResponse {
                success: false,
                data: None,
                error: Some("Log entry not found".to_string()),
            }),
            Err(e) => {
                tracing::error!(log_id = %log_id.0, error = %e, "failed to delete log entry");
                Json(ApiResponse {
                    success: false,
                    data: None,
                    error: Some(format!("Failed to delete log entry: {}", e)),
                })
            }
        }
    }
}
