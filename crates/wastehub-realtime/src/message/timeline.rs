//! Client-side chat timeline with optimistic sends.
//!
//! A send is shown at once as `Pending` under a random provisional
//! `client_id`. The server echoes that id on the stored `new_message`, which
//! confirms the entry in place when the sender is this timeline's user, or on
//! an `error` frame, which marks it failed. Messages from other senders are
//! appended as they arrive.

use uuid::Uuid;
use wastehub_core::types::UserId;
use wastehub_entity::chat::ChatMessage;

use super::types::{InboundMessage, OutboundMessage};

/// Delivery state of a timeline entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryState {
    /// Shown locally, not yet acknowledged.
    Pending,
    /// Stored by the server.
    Confirmed,
    /// Rejected by the server.
    Failed {
        /// Error code.
        code: String,
    },
}

/// One line of the timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineEntry {
    /// Provisional id for own sends; `None` for other senders.
    pub client_id: Option<String>,
    /// Text as shown.
    pub body: String,
    /// The server copy once confirmed.
    pub message: Option<ChatMessage>,
    /// Delivery state.
    pub state: EntryState,
}

/// Local view of one room.
#[derive(Debug, Clone)]
pub struct ClientTimeline {
    user_id: UserId,
    room: String,
    entries: Vec<TimelineEntry>,
}

impl ClientTimeline {
    /// Empty timeline of `room` as seen by `user_id`.
    pub fn new(user_id: UserId, room: impl Into<String>) -> Self {
        Self {
            user_id,
            room: room.into(),
            entries: Vec::new(),
        }
    }

    /// Start a send: add a pending entry and return the frame to transmit.
    pub fn send(&mut self, body: impl Into<String>) -> InboundMessage {
        let body = body.into();
        let client_id = Uuid::new_v4().to_string();
        self.entries.push(TimelineEntry {
            client_id: Some(client_id.clone()),
            body: body.clone(),
            message: None,
            state: EntryState::Pending,
        });
        InboundMessage::SendMessage {
            room: self.room.clone(),
            body,
            client_id: Some(client_id),
        }
    }

    /// Apply a server frame. Returns `true` if the timeline changed.
    pub fn apply(&mut self, frame: &OutboundMessage) -> bool {
        match frame {
            OutboundMessage::NewMessage { message } if message.room == self.room => {
                let own = message.sender_id == self.user_id;
                if let Some(entry) = own
                    .then(|| self.pending_mut(message.client_id.as_deref()))
                    .flatten()
                {
                    entry.body = message.body.clone();
                    entry.message = Some(message.clone());
                    entry.state = EntryState::Confirmed;
                    return true;
                }
                if self
                    .entries
                    .iter()
                    .any(|e| e.message.as_ref().is_some_and(|m| m.id == message.id))
                {
                    return false;
                }
                self.entries.push(TimelineEntry {
                    client_id: None,
                    body: message.body.clone(),
                    message: Some(message.clone()),
                    state: EntryState::Confirmed,
                });
                true
            }
            OutboundMessage::Error {
                code,
                client_id: Some(client_id),
                ..
            } => match self.pending_mut(Some(client_id)) {
                Some(entry) => {
                    entry.state = EntryState::Failed { code: code.clone() };
                    true
                }
                None => false,
            },
            _ => false,
        }
    }

    /// Entries in display order.
    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    /// Number of unacknowledged sends.
    pub fn pending_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.state == EntryState::Pending)
            .count()
    }

    fn pending_mut(&mut self, client_id: Option<&str>) -> Option<&mut TimelineEntry> {
        let client_id = client_id?;
        self.entries.iter_mut().find(|e| {
            e.state == EntryState::Pending && e.client_id.as_deref() == Some(client_id)
        })
    }
}
