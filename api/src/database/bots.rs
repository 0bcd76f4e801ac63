use super::documents::{new_id, now_millis, to_document, Collection};
use super::types::{Database, EntityChanges, Page};
use anyhow::Result;
use poem_openapi::Object;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Serialize, Deserialize, Object)]
#[oai(rename_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub struct Bot {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub status: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Database {
    pub async fn create_bot(&self, name: &str, description: &str, status: &str) -> Result<Bot> {
        let now = now_millis();
        let bot = Bot {
            id: new_id(),
            name: name.to_string(),
            description: description.to_string(),
            status: status.to_string(),
            created_at: now,
            updated_at: now,
        };
        sqlx::query("INSERT INTO bots (id, created_at, doc) VALUES (?, ?, ?)")
            .bind(&bot.id)
            .bind(bot.created_at)
            .bind(to_document(&bot)?)
            .execute(&self.pool)
            .await?;
        tracing::info!(bot_id = %bot.id, "bot created");
        Ok(bot)
    }

    pub async fn get_bot(&self, bot_id: &str) -> Result<Option<Bot>> {
        self.fetch_document(Collection::Bots, bot_id).await
    }

    /// Applies the given changes; `None` when the bot does not exist.
    pub async fn update_bot(&self, bot_id: &str, changes: EntityChanges) -> Result<Option<Bot>> {
        let Some(mut bot) = self.get_bot(bot_id).await? else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            bot.name = name;
        }
        if let Some(description) = changes.description {
            bot.description = description;
        }
        if let Some(status) = changes.status {
            bot.status = status;
        }
        bot.updated_at = now_millis().max(bot.updated_at);
        self.replace_document(Collection::Bots, bot_id, &bot).await?;
        Ok(Some(bot))
    }

    /// Deletes a bot together with its workers and their logs.
    pub async fn delete_bot(&self, bot_id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        let logs = sqlx::query("DELETE FROM logs WHERE bot_id = ?")
            .bind(bot_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let workers = sqlx::query("DELETE FROM workers WHERE bot_id = ?")
            .bind(bot_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let deleted = sqlx::query("DELETE FROM bots WHERE id = ?")
            .bind(bot_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;

        if deleted > 0 {
            tracing::info!(bot_id = %bot_id, workers, logs, "bot deleted");
        }
        Ok(deleted > 0)
    }

    pub async fn find_bots(
        &self,
        query: &Map<String, Value>,
        limit: i64,
        offset: i64,
    ) -> Result<Page<Bot>> {
        self.find_documents(Collection::Bots, query, limit, offset).await
    }
}
