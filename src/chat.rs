// src/chat.rs
//! Push fan-out for chat messages: every room participant except the sender.

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::FeedError;
use crate::notify::{token_fingerprint, DynNotifier, PushMessage};
use crate::store::{sub_collection, DynStore, FieldValue};

pub const CHAT_ROOMS_COLLECTION: &str = "chat_rooms";
pub const MESSAGES_COLLECTION: &str = "messages";
pub const USERS_COLLECTION: &str = "users";

pub const CHAT_PUSH_TITLE: &str = "New Message";

pub fn messages_collection(room_id: &str) -> String {
    sub_collection(CHAT_ROOMS_COLLECTION, room_id, MESSAGES_COLLECTION)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChatFanout {
    /// Participants other than the sender.
    pub recipients: usize,
    /// Recipients with no stored device token.
    pub without_token: usize,
    pub delivered: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct ChatNotifier {
    store: DynStore,
    notifier: DynNotifier,
}

impl ChatNotifier {
    pub fn new(store: DynStore, notifier: DynNotifier) -> Self {
        Self { store, notifier }
    }

    /// Send `text` to the room's other participants. Only a missing room or
    /// an unreadable room document is an error; delivery failures are counted.
    pub async fn notify_room(
        &self,
        room_id: &str,
        sender: &str,
        text: &str,
    ) -> Result<ChatFanout, FeedError> {
        let room = self
            .store
            .get(CHAT_ROOMS_COLLECTION, room_id)
            .await?
            .ok_or_else(|| FeedError::RoomNotFound(room_id.to_string()))?;

        let participants: Vec<&str> = room
            .get("participants")
            .and_then(FieldValue::as_array)
            .unwrap_or_default()
            .iter()
            .filter_map(FieldValue::as_str)
            .filter(|uid| *uid != sender)
            .collect();

        let mut out = ChatFanout {
            recipients: participants.len(),
            ..ChatFanout::default()
        };

        for uid in participants {
            let token = match self.store.get(USERS_COLLECTION, uid).await {
                Ok(Some(user)) => user
                    .str_field("fcm_token")
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string),
                Ok(None) => None,
                Err(e) => {
                    warn!(target: "chat", room = room_id, uid, error = %format!("{e:#}"), "user lookup failed");
                    out.failed += 1;
                    continue;
                }
            };
            let Some(token) = token else {
                debug!(target: "chat", room = room_id, uid, "no device token");
                out.without_token += 1;
                continue;
            };

            let msg = PushMessage::new(token, CHAT_PUSH_TITLE, text);
            match self.notifier.deliver(&msg).await {
                Ok(()) => out.delivered += 1,
                Err(e) => {
                    warn!(
                        target: "chat",
                        room = room_id,
                        uid,
                        token = %token_fingerprint(&msg.token),
                        error = %format!("{e:#}"),
                        "chat push failed"
                    );
                    out.failed += 1;
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_path() {
        assert_eq!(messages_collection("abc"), "chat_rooms/abc/messages");
    }
}
