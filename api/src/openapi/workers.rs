use super::common::{
    default_limit, list_query, sanitize_body, ApiResponse, ApiTags, CreateWorkerRequest,
    UpdateWorkerRequest, WORKER_FILTER_FIELDS,
};
use crate::config::ApiConfig;
use crate::database::{Database, EntityChanges, InvalidQuery, Page, Worker};
use crate::validation::{validate_description, validate_name, validate_worker_status};
use poem::web::Data;
use poem_openapi::{
    param::{Path, Query},
    payload::Json,
    OpenApi,
};
use std::sync::Arc;

const DEFAULT_WORKER_STATUS: &str = "STOPPED";

#[derive(poem_openapi::ApiResponse)]
pub enum WorkerListResponse {
    #[oai(status = 200)]
    Ok(Json<ApiResponse<Page<Worker>>>),
    #[oai(status = 400)]
    BadRequest(Json<ApiResponse<Page<Worker>>>),
    #[oai(status = 500)]
    InternalError(Json<ApiResponse<Page<Worker>>>),
}

fn validate_new_worker(req: CreateWorkerRequest) -> anyhow::Result<(String, String, String)> {
    let req = sanitize_body(req)?;
    let name = validate_name(&req.name)?;
    let description = req.description.unwrap_or_default();
    validate_description(&description)?;
    let status = req
        .status
        .unwrap_or_else(|| DEFAULT_WORKER_STATUS.to_string());
    validate_worker_status(&status)?;
    Ok((name, description, status))
}

fn validate_worker_changes(req: UpdateWorkerRequest) -> anyhow::Result<EntityChanges> {
    let req = sanitize_body(req)?;
    let name = req.name.as_deref().map(validate_name).transpose()?;
    if let Some(description) = &req.description {
        validate_description(description)?;
    }
    if let Some(status) = &req.status {
        validate_worker_status(status)?;
    }
    Ok(EntityChanges {
        name,
        description: req.description,
        status: req.status,
    })
}

pub struct WorkersApi;

#[OpenApi]
impl WorkersApi {
    /// List a bot's workers
    ///
    /// The optional `filter` is narrowed to the bot in the path
    #[oai(path = "/bots/:bot_id/workers", method = "get", tag = "ApiTags::Workers")]
    async fn list_bot_workers(
        &self,
        db: Data<&Arc<Database>>,
        config: Data<&Arc<ApiConfig>>,
        bot_id: Path<String>,
        filter: Query<Option<String>>,
        #[oai(default = "default_limit")] limit: Query<i64>,
        #[oai(default)] offset: Query<i64>,
    ) -> WorkerListResponse {
        let query = match list_query(
            filter.0.as_deref(),
            &[("botId", bot_id.0.as_str())],
            WORKER_FILTER_FIELDS,
            &config,
        ) {
            Ok(query) => query,
            Err(e) => {
                return WorkerListResponse::BadRequest(Json(ApiResponse {
                    success: false,
                    data: None,
                    error: Some(e.to_string()),
                }))
            }
        };

        match db.find_workers(&query, limit.0, offset.0).await {
            Ok(page) => WorkerListResponse::Ok(Json(ApiResponse {
                success: true,
                data: Some(page),
                error: None,
            })),
            Err(e) if e.is::<InvalidQuery>() => WorkerListResponse::BadRequest(Json(ApiResponse {
                success: false,
                data: None,
                error: Some(e.to_string()),
            })),
            Err(e) => {
                tracing::error!(bot_id = %bot_id.0, error = %e, "failed to list workers");
                WorkerListResponse::InternalError(Json(ApiResponse {
                    success: false,
                    data: None,
                    error: Some(format!("Failed to list workers: {}", e)),
                }))
            }
        }
    }

    /// Create worker
    #[oai(path = "/bots/:bot_id/workers", method = "post", tag = "ApiTags::Workers")]
    async fn create_worker(
        &self,
        db: Data<&Arc<Database>>,
        bot_id: Path<String>,
        req: Json<CreateWorkerRequest>,
    ) -> Json<ApiResponse<Worker>> {
        let (name, description, status) = match validate_new_worker(req.0) {
            Ok(fields) => fields,
            Err(e) => {
                return Json(ApiResponse {
                    success: false,
                    data: None,
                    error: Some(e.to_string()),
                })
            }
        };

        match db
            .create_worker(&bot_id.0, &name, &description, &status)
            .await
        {
            Ok(Some(worker)) => Json(ApiResponse {
                success: true,
                data: Some(worker),
                error: None,
            }),
            Ok(None) => Json(ApiResponse {
                success: false,
                data: None,
                error: Some("Bot not found".to_string()),
            }),
            Err(e) => {
                tracing::error!(bot_id = %bot_id.0, error = %e, "failed to create worker");
                Json(ApiResponse {
                    success: false,
                    data: None,
                    error: Some(format!("Failed to create worker: {}", e)),
                })
            }
        }
    }

    /// Get worker
    #[oai(path = "/workers/:worker_id", method = "get", tag = "ApiTags::Workers")]
    async fn get_worker(
        &self,
        db: Data<&Arc<Database>>,
        worker_id: Path<String>,
    ) -> Json<ApiResponse<Worker>> {
        match db.get_worker(&worker_id.0).await {
            Ok(Some(worker)) => Json(ApiResponse {
                success: true,
                data: Some(worker),
                error: None,
            }),
            Ok(None) => Json(ApiResponse {
                success: false,
                data: None,
                error: Some("Worker not found".to_string()),
            }),
            Err(e) => Json(ApiResponse {
                success: false,
                data: None,
                error: Some(e.to_string()),
            }),
        }
    }

    /// Update worker
    #[oai(path = "/workers/:worker_id", method = "put", tag = "ApiTags::Workers")]
    async fn update_worker(
        &self,
        db: Data<&Arc<Database>>,
        worker_id: Path<String>,
        req: Json<UpdateWorkerRequest>,
    ) -> Json<ApiResponse<Worker>> {
        let changes = match validate_worker_changes(req.0) {
            Ok(changes) => changes,
            Err(e) => {
                return Json(ApiResponse {
                    success: false,
                    data: None,
                    error: Some(e.to_string()),
                })
            }
        };

        match db.update_worker(&worker_id.0, changes).await {
            Ok(Some(worker)) => Json(ApiResponse {
                success: true,
                data: Some(worker),
                error: None,
            }),
            Ok(None) => Json(ApiResponse {
                success: false,
                data: None,
                error: Some("Worker not found".to_string()),
            }),
            Err(e) => {
                tracing::error!(worker_id = %worker_id.0, error = %e, "failed to update worker");
                Json(ApiResponse {
                    success: false,
                    data: None,
                    error: Some(format!("Failed to update worker: {}", e)),
                })
            }
        }
    }

    /// Delete worker
    ///
    /// Also deletes the worker's logs
    #[oai(path = "/workers/:worker_id", method = "delete", tag = "ApiTags::Workers")]
    async fn delete_worker(
        &self,
        db: Data<&Arc<Database>>,
        worker_id: Path<String>,
    ) -> Json<ApiResponse<String>> {
        match db.delete_worker(&worker_id.0).await {
            Ok(true) => Json(ApiResponse {
                success: true,
                data: Some("Worker deleted".to_string()),
                error: None,
            }),
            Ok(false) => Json(ApiResponse {
                success: false,
                data: None,
                error: Some("Worker not found".to_string()),
            }),
            Err(e) => {
                tracing::error!(worker_id = %worker_id.0, error = %e, "failed to delete worker");
                Json(ApiResponse {
                    success: false,
                    data: None,
                    error: Some(format!("Failed to delete worker: {}", e)),
                })
            }
        }
    }
}
