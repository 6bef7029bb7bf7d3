//! Chat message validation and history.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use wastehub_core::config::realtime::RealtimeConfig;
use wastehub_core::error::AppError;
use wastehub_core::result::AppResult;
use wastehub_core::types::{MessageId, PageRequest};
use wastehub_database::store::ChatStore;
use wastehub_entity::chat::{ChatMessage, MessageKind};

use crate::context::Actor;

/// Stores chat messages. Room membership is checked by the caller.
#[derive(Debug, Clone)]
pub struct ChatService {
    store: Arc<dyn ChatStore>,
    max_message_length: usize,
}

impl ChatService {
    /// Creates a new chat service.
    pub fn new(store: Arc<dyn ChatStore>, config: &RealtimeConfig) -> Self {
        Self {
            store,
            max_message_length: config.max_message_length,
        }
    }

    /// Validate and persist a message posted to `room`.
    pub async fn post(
        &self,
        actor: &Actor,
        room: &str,
        body: &str,
        kind: MessageKind,
        client_id: Option<String>,
    ) -> AppResult<ChatMessage> {
        let body = body.trim();
        if body.is_empty() {
            return Err(AppError::validation("Message cannot be empty"));
        }
        let length = body.chars().count();
        if length > self.max_message_length {
            return Err(AppError::validation(format!(
                "Message is {length} characters; the limit is {}",
                self.max_message_length
            )));
        }
        if kind == MessageKind::System && !actor.is_admin() {
            return Err(AppError::unauthorized("Only admins may post system messages"));
        }
        if client_id.as_ref().is_some_and(|id| id.len() > 64) {
            return Err(AppError::validation("client_id is limited to 64 bytes"));
        }

        let message = ChatMessage {
            id: MessageId::new(),
            room: room.to_string(),
            sender_id: actor.user_id,
            sender_name: actor.name.clone(),
            sender_role: actor.role,
            body: body.to_string(),
            kind,
            client_id,
            created_at: Utc::now(),
        };
        self.store.insert(&message).await?;
        debug!(room, message_id = %message.id, sender = %actor.user_id, "Chat message stored");
        Ok(message)
    }

    /// One page of a room's history in chronological order.
    ///
    /// Page 1 holds the most recent messages.
    pub async fn history(&self, room: &str, page: &PageRequest) -> AppResult<Vec<ChatMessage>> {
        let mut messages = self.store.recent(room, &(*page).normalized()).await?;
        messages.reverse();
        Ok(messages)
    }
}
