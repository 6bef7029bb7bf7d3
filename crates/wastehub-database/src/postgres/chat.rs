//! PostgreSQL chat history.

use async_trait::async_trait;
use sqlx::PgPool;

use wastehub_core::result::AppResult;
use wastehub_core::types::PageRequest;
use wastehub_entity::chat::ChatMessage;

use super::db_err;
use crate::store::ChatStore;

/// Chat history on the `chat_messages` table.
#[derive(Debug, Clone)]
pub struct PgChatStore {
    pool: PgPool,
}

impl PgChatStore {
    /// Create a new chat store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChatStore for PgChatStore {
    async fn insert(&self, m: &ChatMessage) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO chat_messages (id, room, sender_id, sender_name, sender_role, body, kind, client_id, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(m.id)
        .bind(&m.room)
        .bind(m.sender_id)
        .bind(&m.sender_name)
        .bind(m.sender_role)
        .bind(&m.body)
        .bind(m.kind)
        .bind(&m.client_id)
        .bind(m.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to store chat message"))?;
        Ok(())
    }

    async fn recent(&self, room: &str, page: &PageRequest) -> AppResult<Vec<ChatMessage>> {
        sqlx::query_as::<_, ChatMessage>(
            "SELECT * FROM chat_messages WHERE room = $1 ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
        )
        .bind(room)
        .bind(page.limit as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to load chat history"))
    }
}
