use super::common::{
    default_limit, list_query, sanitize_body, ApiResponse, ApiTags, CreateBotRequest,
    UpdateBotRequest, BOT_FILTER_FIELDS,
};
use crate::config::ApiConfig;
use crate::database::{Bot, Database, EntityChanges, InvalidQuery, Page};
use crate::validation::{validate_bot_status, validate_description, validate_name};
use poem::web::Data;
use poem_openapi::{
    param::{Path, Query},
    payload::Json,
    OpenApi,
};
use std::sync::Arc;

const DEFAULT_BOT_STATUS: &str = "ENABLED";

#[derive(poem_openapi::ApiResponse)]
pub enum BotListResponse {
    #[oai(status = 200)]
    Ok(Json<ApiResponse<Page<Bot>>>),
    #[oai(status = 400)]
    BadRequest(Json<ApiResponse<Page<Bot>>>),
    #[oai(status = 500)]
    InternalError(Json<ApiResponse<Page<Bot>>>),
}

fn validate_new_bot(req: CreateBotRequest) -> anyhow::Result<(String, String, String)> {
    let req = sanitize_body(req)?;
    let name = validate_name(&req.name)?;
    let description = req.description.unwrap_or_default();
    validate_description(&description)?;
    let status = req
        .status
        .unwrap_or_else(|| DEFAULT_BOT_STATUS.to_string());
    validate_bot_status(&status)?;
    Ok((name, description, status))
}

fn validate_bot_changes(req: UpdateBotRequest) -> anyhow::Result<EntityChanges> {
    let req = sanitize_body(req)?;
    let name = req.name.as_deref().map(validate_name).transpose()?;
    if let Some(description) = &req.description {
        validate_description(description)?;
    }
    if let Some(status) = &req.status {
        validate_bot_status(status)?;
    }
    Ok(EntityChanges {
        name,
        description: req.description,
        status: req.status,
    })
}

pub struct BotsApi;

#[OpenApi]
impl BotsApi {
    /// List bots
    ///
    /// Returns a page of bots matching the optional base64-encoded `filter`
    #[oai(path = "/bots", method = "get", tag = "ApiTags::Bots")]
    async fn list_bots(
        &self,
        db: Data<&Arc<Database>>,
        config: Data<&Arc<ApiConfig>>,
        filter: Query<Option<String>>,
        #[oai(default = "default_limit")] limit: Query<i64>,
        #[oai(default)] offset: Query<i64>,
    ) -> BotListResponse {
        let query = match list_query(filter.0.as_deref(), &[], BOT_FILTER_FIELDS, &config) {
            Ok(query) => query,
            Err(e) => {
                return BotListResponse::BadRequest(Json(ApiResponse {
                    success: false,
                    data: None,
                    error: Some(e.to_string()),
                }))
            }
        };

        match db.find_bots(&query, limit.0, offset.0).await {
            Ok(page) => BotListResponse::Ok(Json(ApiResponse {
                success: true,
                data: Some(page),
                error: None,
            })),
            Err(e) if e.is::<InvalidQuery>() => {
                BotListResponse::BadRequest(Json(ApiResponse {
                    success: false,
                    data: None,
                    error: Some(e.to_string()),
                }))
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to list bots");
                BotListResponse::InternalError(Json(ApiResponse {
                    success: false,
                    data: None,
                    error: Some(format!("Failed to list bots: {}", e)),
                }))
            }
        }
    }

    /// Create bot
    #[oai(path = "/bots", method = "post", tag = "ApiTags::Bots")]
    async fn create_bot(
        &self,
        db: Data<&Arc<Database>>,
        req: Json<CreateBotRequest>,
    ) -> Json<ApiResponse<Bot>> {
        let (name, description, status) = match validate_new_bot(req.0) {
            Ok(fields) => fields,
            Err(e) => {
                return Json(ApiResponse {
                    success: false,
                    data: None,
                    error: Some(e.to_string()),
                })
            }
        };

        match db.create_bot(&name, &description, &status).await {
            Ok(bot) => Json(ApiResponse {
                success: true,
                data: Some(bot),
                error: None,
            }),
            Err(e) => {
                tracing::error!(error = %e, "failed to create bot");
                Json(ApiResponse {
                    success: false,
                    data: None,
                    error: Some(format!("Failed to create bot: {}", e)),
                })
            }
        }
    }

    /// Get bot
    #[oai(path = "/bots/:bot_id", method = "get", tag = "ApiTags::Bots")]
    async fn get_bot(&self, db: Data<&Arc<Database>>, bot_id: Path<String>) -> Json<ApiResponse<Bot>> {
        match db.get_bot(&bot_id.0).await {
            Ok(Some(bot)) => Json(ApiResponse {
                success: true,
                data: Some(bot),
                error: None,
            }),
            Ok(None) => Json(ApiResponse {
                success: false,
                data: None,
                error: Some("Bot not found".to_string()),
            }),
            Err(e) => Json(ApiResponse {
                success: false,
                data: None,
                error: Some(e.to_string()),
            }),
        }
    }

    /// Update bot
    ///
    /// Only the fields present in the body are changed
    #[oai(path = "/bots/:bot_id", method = "put", tag = "ApiTags::Bots")]
    async fn update_bot(
        &self,
        db: Data<&Arc<Database>>,
        bot_id: Path<String>,
        req: Json<UpdateBotRequest>,
    ) -> Json<ApiResponse<Bot>> {
        let changes = match validate_bot_changes(req.0) {
            Ok(changes) => changes,
            Err(e) => {
                return Json(ApiResponse {
                    success: false,
                    data: None,
                    error: Some(e.to_string()),
                })
            }
        };

        match db.update_bot(&bot_id.0, changes).await {
            Ok(Some(bot)) => Json(ApiResponse {
                success: true,
                data: Some(bot),
                error: None,
            }),
            Ok(None) => Json(ApiResponse {
                success: false,
                data: None,
                error: Some("Bot not found".to_string()),
            }),
            Err(e) => {
                tracing::error!(bot_id = %bot_id.0, error = %e, "failed to update bot");
                Json(ApiResponse {
                    success: false,
                    data: None,
                    error: Some(format!("Failed to update bot: {}", e)),
                })
            }
        }
    }

    /// Delete bot
    ///
    /// Also deletes the bot's workers and their logs
    #[oai(path = "/bots/:bot_id", method = "delete", tag = "ApiTags::Bots")]
    async fn delete_bot(
        &self,
        db: Data<&Arc<Database>>,
        bot_id: Path<String>,
    ) -> Json<ApiResponse<String>> {
        match db.delete_bot(&bot_id.0).await {
            Ok(true) => Json(ApiResponse {
                success: true,
                data: Some("Bot deleted".to_string()),
                error: None,
            }),
            Ok(false) => Json(ApiResponse {
                success: false,
                data: None,
                error: Some("Bot not found".to_string()),
            }),
            Err(e) => {
                tracing::error!(bot_id = %bot_id.0, error = %e, "failed to delete bot");
                Json(ApiResponse {
                    success: false,
                    data: None,
                    error: Some(format!("Failed to delete bot: {}", e)),
                })
            }
        }
    }
}
