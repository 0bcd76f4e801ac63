use super::documents::{new_id, now_millis, to_document, Collection};
use super::types::{Database, Page};
use anyhow::Result;
use poem_openapi::Object;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Serialize, Deserialize, Object)]
#[oai(rename_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: String,
    pub bot_id: String,
    pub worker_id: String,
    pub level: String,
    pub message: String,
    pub created_at: i64,
}

impl Database {
    /// Appends a log entry for `worker_id`; `None` when the worker does not exist.
    pub async fn create_log(
        &self,
        worker_id: &str,
        level: &str,
        message: &str,
    ) -> Result<Option<LogEntry>> {
        let Some(worker) = self.get_worker(worker_id).await? else {
            return Ok(None);
        };
        let entry = LogEntry {
            id: new_id(),
            bot_id: worker.bot_id,
            worker_id: worker.id,
            level: level.to_string(),
            message: message.to_string(),
            created_at: now_millis(),
        };
        sqlx::query(
            "INSERT INTO logs (id, bot_id, worker_id, created_at, doc) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&entry.id)
        .bind(&entry.bot_id)
        .bind(&entry.worker_id)
        .bind(entry.created_at)
        .bind(to_document(&entry)?)
        .execute(&self.pool)
        .await?;
        Ok(Some(entry))
    }

    pub async fn get_log(&self, log_id: &str) -> Result<Option<LogEntry>> {
        self.fetch_document(Collection::Logs, log_id).await
    }

    pub async fn delete_log(&self, log_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM logs WHERE id = ?")
            .bind(log_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn find_logs(
        &self,
        query: &Map<String, Value>,
        limit: i64,
        offset: i64,
    ) -> Result<Page<LogEntry>> {
        self.find_documents(Collection::Logs, query, limit, offset).await
    }
}
