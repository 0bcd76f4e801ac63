//! Storage shared by every collection: each row carries its JSON document.

use super::matcher::compile;
use super::types::{Database, Page, MAX_PAGE_SIZE};
use anyhow::{Context, Result};
use poem_openapi::types::{ParseFromJSON, ToJSON};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::{QueryBuilder, Sqlite};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Bots,
    Workers,
    Logs,
}

impl Collection {
    pub fn table(self) -> &'static str {
        match self {
            Collection::Bots => "bots",
            Collection::Workers => "workers",
            Collection::Logs => "logs",
        }
    }

    /// Document fields mirrored into indexed columns, as (field, column).
    fn parent_columns(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Collection::Bots => &[],
            Collection::Workers => &[("botId", "bot_id")],
            Collection::Logs => &[("botId", "bot_id"), ("workerId", "worker_id")],
        }
    }
}

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub(crate) fn to_document<T: Serialize>(entity: &T) -> Result<String> {
    serde_json::to_string(entity).context("Failed to serialize document")
}

impl Database {
    pub(crate) async fn fetch_document<T: DeserializeOwned>(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<T>> {
        let sql = format!("SELECT doc FROM {} WHERE id = ?", collection.table());
        let doc: Option<String> = sqlx::query_scalar(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        doc.map(|text| serde_json::from_str(&text).context("Corrupt stored document"))
            .transpose()
    }

    pub(crate) async fn replace_document<T: Serialize>(
        &self,
        collection: Collection,
        id: &str,
        entity: &T,
    ) -> Result<()> {
        let sql = format!("UPDATE {} SET doc = ? WHERE id = ?", collection.table());
        sqlx::query(&sql)
            .bind(to_document(entity)?)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Lists documents matching a sanitized query, newest first.
    ///
    /// The query is compiled before any row is read, so an invalid query fails
    /// even on an empty collection. Parent ids pinned to a plain string are
    /// pushed down into SQL; the rest of the query is evaluated in memory. Every
    /// row that passes the pushdown is loaded and matched, so one call costs a
    /// full scan of the table (or of one parent's rows) regardless of `limit`.
    pub(crate) async fn find_documents<T>(
        &self,
        collection: Collection,
        query: &Map<String, Value>,
        limit: i64,
        offset: i64,
    ) -> Result<Page<T>>
    where
        T: DeserializeOwned + ParseFromJSON + ToJSON,
    {
        let compiled = compile(query)?;
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let offset = offset.max(0);

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT doc FROM ");
        builder.push(collection.table());
        let mut pushed = 0;
        for (field, column) in collection.parent_columns() {
            if let Some(Value::String(id)) = query.get(*field) {
                builder.push(if pushed == 0 { " WHERE " } else { " AND " });
                builder.push(*column).push(" = ").push_bind(id.clone());
                pushed += 1;
            }
        }
        builder.push(" ORDER BY created_at DESC, rowid DESC");

        let rows: Vec<String> = builder.build_query_scalar().fetch_all(&self.pool).await?;
        let scanned = rows.len();

        let mut items = Vec::new();
        let mut total: i64 = 0;
        for text in rows {
            let doc: Value = serde_json::from_str(&text).context("Corrupt stored document")?;
            if !compiled.matches(&doc) {
                continue;
            }
            if total >= offset && (items.len() as i64) < limit {
                items.push(serde_json::from_value(doc)?);
            }
            total += 1;
        }

        tracing::debug!(
            collection = collection.table(),
            pushed_down = pushed,
            scanned,
            total,
            "filtered document listing"
        );
        Ok(Page {
            items,
            total,
            limit,
            offset,
        })
    }
}
