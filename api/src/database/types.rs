use poem_openapi::types::{ParseFromJSON, ToJSON};
use poem_openapi::Object;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

/// Default database URL for local development
pub const DEFAULT_DATABASE_URL: &str = "sqlite:./botfleet.db?mode=rwc";

pub const MAX_PAGE_SIZE: i64 = 500;

#[derive(Clone)]
pub struct Database {
    pub(crate) pool: SqlitePool,
}

/// One page of a filtered listing. `total` counts every match, not just this page.
#[derive(Debug, Clone, Serialize, Deserialize, Object)]
pub struct Page<T: ParseFromJSON + ToJSON> {
    pub items: Vec<T>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Partial update of a bot or worker; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct EntityChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
}
