use super::documents::{new_id, now_millis, to_document, Collection};
use super::types::{Database, EntityChanges, Page};
use anyhow::Result;
use poem_openapi::Object;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Serialize, Deserialize, Object)]
#[oai(rename_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub struct Worker {
    pub id: String,
    pub bot_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub status: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Database {
    /// Creates a worker under `bot_id`; `None` when the bot does not exist.
    pub async fn create_worker(
        &self,
        bot_id: &str,
        name: &str,
        description: &str,
        status: &str,
    ) -> Result<Option<Worker>> {
        if self.get_bot(bot_id).await?.is_none() {
            return Ok(None);
        }
        let now = now_millis();
        let worker = Worker {
            id: new_id(),
            bot_id: bot_id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            status: status.to_string(),
            created_at: now,
            updated_at: now,
        };
        sqlx::query("INSERT INTO workers (id, bot_id, created_at, doc) VALUES (?, ?, ?, ?)")
            .bind(&worker.id)
            .bind(&worker.bot_id)
            .bind(worker.created_at)
            .bind(to_document(&worker)?)
            .execute(&self.pool)
            .await?;
        tracing::info!(worker_id = %worker.id, bot_id = %bot_id, "worker created");
        Ok(Some(worker))
    }

    pub async fn get_worker(&self, worker_id: &str) -> Result<Option<Worker>> {
        self.fetch_document(Collection::Workers, worker_id).await
    }

    pub async fn update_worker(
        &self,
        worker_id: &str,
        changes: EntityChanges,
    ) -> Result<Option<Worker>> {
        let Some(mut worker) = self.get_worker(worker_id).await? else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            worker.name = name;
        }
        if let Some(description) = changes.description {
            worker.description = description;
        }
        if let Some(status) = changes.status {
            worker.status = status;
        }
        worker.updated_at = now_millis().max(worker.updated_at);
        self.replace_document(Collection::Workers, worker_id, &worker)
            .await?;
        Ok(Some(worker))
    }

    /// Deletes a worker and its logs.
    pub async fn delete_worker(&self, worker_id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        let logs = sqlx::query("DELETE FROM logs WHERE worker_id = ?")
            .bind(worker_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let deleted = sqlx::query("DELETE FROM workers WHERE id = ?")
            .bind(worker_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;

        if deleted > 0 {
            tracing::info!(worker_id = %worker_id, logs, "worker deleted");
        }
        Ok(deleted > 0)
    }

    pub async fn find_workers(
        &self,
        query: &Map<String, Value>,
        limit: i64,
        offset: i64,
    ) -> Result<Page<Worker>> {
        self.find_documents(Collection::Workers, query, limit, offset)
            .await
    }
}
