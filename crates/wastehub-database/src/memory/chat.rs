//! In-memory chat history.

use async_trait::async_trait;
use dashmap::DashMap;

use wastehub_core::result::AppResult;
use wastehub_core::types::PageRequest;
use wastehub_entity::chat::ChatMessage;

use crate::store::ChatStore;

/// Chat history keyed by room, in posting order.
#[derive(Debug, Default)]
pub struct MemoryChatStore {
    rooms: DashMap<String, Vec<ChatMessage>>,
}

impl MemoryChatStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatStore for MemoryChatStore {
    async fn insert(&self, message: &ChatMessage) -> AppResult<()> {
        self.rooms
            .entry(message.room.clone())
            .or_default()
            .push(message.clone());
        Ok(())
    }

    async fn recent(&self, room: &str, page: &PageRequest) -> AppResult<Vec<ChatMessage>> {
        Ok(self
            .rooms
            .get(room)
            .map(|messages| {
                messages
                    .iter()
                    .rev()
                    .skip(page.offset() as usize)
                    .take(page.limit as usize)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
