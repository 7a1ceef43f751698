use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{conversation_id, Like, LikeStatus, Message, Profile, ProfileId};
use crate::services::repository::ProfileRepository;
use crate::services::store::{
    Filter, StoreError, Table, LIKE_CONFLICT_KEYS, MESSAGE_CONFLICT_KEYS,
};

const INVALID_RECIPIENT: &str = "Cannot message profile - invalid ID format";

/// A pending like shown to its recipient as a request to chat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRequest {
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub status: LikeStatus,
    pub created_at: DateTime<Utc>,
    pub sender: Profile,
}

/// Direct messages between two persisted profiles.
///
/// Free members can reply in a conversation that already exists, or once a
/// like between the two has been accepted; starting a new one is a premium
/// feature.
#[derive(Clone)]
pub struct Messenger {
    repository: ProfileRepository,
}

impl Messenger {
    pub fn new(repository: ProfileRepository) -> Self {
        Self { repository }
    }

    pub async fn send(
        &self,
        sender: Uuid,
        recipient: &ProfileId,
        text: &str,
        image_url: Option<String>,
        is_premium: bool,
    ) -> Result<Message> {
        let recipient = messageable(recipient)?;
        if recipient == sender {
            return Err(Error::Validation("Cannot message yourself".to_string()));
        }

        let text = text.trim();
        let image_url = image_url.filter(|url| !url.trim().is_empty());
        if text.is_empty() && image_url.is_none() {
            return Err(Error::Validation("Message is empty".to_string()));
        }

        if !is_premium && !self.can_reply(sender, recipient).await? {
            tracing::debug!("Viewer {} needs premium to message {}", sender, recipient);
            return Err(Error::PremiumRequired);
        }

        let message = Message::new(sender, recipient, text.to_string(), image_url);
        let row = serde_json::to_value(&message).map_err(StoreError::from)?;

        self.repository
            .store()
            .insert(Table::Messages, row)
            .await
            .map_err(|e| store_failure("send message", e))?;

        tracing::info!("Viewer {} messaged {}", sender, recipient);
        Ok(message)
    }

    /// Messages between the viewer and `other`, oldest first.
    ///
    /// Messages addressed to the viewer are marked read on the way out; a
    /// failure to mark them is logged and otherwise ignored.
    pub async fn conversation(&self, viewer: Uuid, other: &ProfileId) -> Result<Vec<Message>> {
        let other = messageable(other)?;
        let mut messages = self.messages(viewer, other).await?;

        let store = self.repository.store();
        for message in messages.iter_mut().filter(|m| m.receiver_id == viewer && !m.read) {
            let mut row = message.clone();
            row.read = true;

            let row = serde_json::to_value(&row).map_err(StoreError::from)?;
            match store.upsert(Table::Messages, row, MESSAGE_CONFLICT_KEYS).await {
                Ok(()) => message.read = true,
                Err(e) => tracing::warn!("Failed to mark message {} as read: {}", message.id, e),
            }
        }

        Ok(messages)
    }

    /// Pending likes toward the viewer, joined with the admirer's profile
    pub async fn requests(&self, viewer: Uuid) -> Result<Vec<MessageRequest>> {
        let likes: Vec<Like> = self
            .repository
            .incoming_likes(viewer)
            .await
            .map_err(|e| store_failure("fetch message requests", e))?
            .into_iter()
            .filter(|like| like.status == LikeStatus::Pending)
            .collect();

        let ids = likes.iter().map(|like| like.user_id.to_string()).collect();
        let profiles = self
            .repository
            .profiles_by_ids(ids)
            .await
            .map_err(|e| store_failure("fetch message requests", e))?;

        // admirers without a readable profile are dropped
        Ok(likes
            .into_iter()
            .filter_map(|like| {
                let sender = profiles
                    .iter()
                    .find(|p| p.id.as_uuid() == Some(like.user_id))?
                    .clone();

                Some(MessageRequest {
                    sender_id: like.user_id,
                    receiver_id: like.liked_profile_id,
                    status: like.status,
                    created_at: like.created_at,
                    sender,
                })
            })
            .collect())
    }

    /// Accept the request from `admirer`, which lets both sides message freely
    pub async fn accept_request(&self, viewer: Uuid, admirer: &ProfileId) -> Result<Like> {
        let admirer = messageable(admirer)?;
        let store = self.repository.store();

        let rows = store
            .select(
                Table::Likes,
                &[Filter::eq("user_id", admirer), Filter::eq("liked_profile_id", viewer)],
            )
            .await
            .map_err(|e| store_failure("fetch message request", e))?;

        let mut like: Like = match rows.into_iter().next() {
            Some(row) => serde_json::from_value(row).map_err(StoreError::from)?,
            None => return Err(Error::NotFound("message request")),
        };

        if like.status == LikeStatus::Accepted {
            return Ok(like);
        }
        like.status = LikeStatus::Accepted;

        let row = serde_json::to_value(&like).map_err(StoreError::from)?;
        store
            .upsert(Table::Likes, row, LIKE_CONFLICT_KEYS)
            .await
            .map_err(|e| store_failure("accept message request", e))?;

        tracing::info!("Viewer {} accepted message request from {}", viewer, admirer);
        Ok(like)
    }

    async fn messages(&self, a: Uuid, b: Uuid) -> Result<Vec<Message>> {
        let rows = self
            .repository
            .store()
            .select(Table::Messages, &[Filter::eq("conversation_id", conversation_id(a, b))])
            .await
            .map_err(|e| store_failure("fetch messages", e))?;

        let mut messages = parse_messages(rows);
        messages.sort_by_key(|m| m.created_at);
        Ok(messages)
    }

    /// An existing conversation or an accepted like in either direction
    async fn can_reply(&self, sender: Uuid, recipient: Uuid) -> Result<bool> {
        if !self.messages(sender, recipient).await?.is_empty() {
            return Ok(true);
        }

        let pair = [sender, recipient];
        let accepted = self
            .repository
            .store()
            .select(
                Table::Likes,
                &[
                    Filter::in_list("user_id", pair),
                    Filter::in_list("liked_profile_id", pair),
                    Filter::eq("status", "accepted"),
                ],
            )
            .await
            .map_err(|e| store_failure("check message permission", e))?;

        Ok(!accepted.is_empty())
    }
}

/// Only persisted profiles can receive messages
fn messageable(id: &ProfileId) -> Result<Uuid> {
    id.as_uuid()
        .ok_or_else(|| Error::Validation(INVALID_RECIPIENT.to_string()))
}

fn parse_messages(rows: Vec<Value>) -> Vec<Message> {
    rows.into_iter()
        .filter_map(|row| match serde_json::from_value(row) {
            Ok(message) => Some(message),
            Err(e) => {
                tracing::warn!("Skipping malformed message row: {}", e);
                None
            }
        })
        .collect()
}

fn store_failure(action: &str, e: StoreError) -> Error {
    tracing::error!("Failed to {}: {}", action, e);
    Error::Store(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::memory::MemoryStore;
    use serde_json::json;
    use std::sync::Arc;

    const RAVI: &str = "11111111-1111-4111-8111-111111111111";
    const MEERA: &str = "22222222-2222-4222-8222-222222222222";

    fn id(raw: &str) -> Uuid {
        Uuid::parse_str(raw).unwrap()
    }

    fn messenger() -> Messenger {
        let store = MemoryStore::with_rows(
            Table::Profiles,
            vec![
                json!({"id": RAVI, "first_name": "Ravi", "gender": "male"}),
                json!({"id": MEERA, "first_name": "Meera", "last_name": "Perera", "gender": "female"}),
            ],
        )
        .unwrap();

        Messenger::new(ProfileRepository::new(Arc::new(store), None))
    }

    #[tokio::test]
    async fn test_premium_sender_starts_conversation() {
        let messenger = messenger();

        let sent = messenger
            .send(id(RAVI), &ProfileId::from(id(MEERA)), "  Hello Meera ", None, true)
            .await
            .unwrap();
        assert_eq!(sent.text, "Hello Meera");

        // the reply needs no premium, the conversation exists now
        messenger
            .send(id(MEERA), &ProfileId::from(id(RAVI)), "Hi!", None, false)
            .await
            .unwrap();

        let thread = messenger.conversation(id(RAVI), &ProfileId::from(id(MEERA))).await.unwrap();
        let texts: Vec<&str> = thread.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["Hello Meera", "Hi!"]);
        assert!(thread[1].read);
        assert!(!thread[0].read);
    }

    #[tokio::test]
    async fn test_free_member_cannot_start_conversation() {
        let messenger = messenger();

        let err = messenger
            .send(id(RAVI), &ProfileId::from(id(MEERA)), "Hello", None, false)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PremiumRequired));

        let thread = messenger.conversation(id(MEERA), &ProfileId::from(id(RAVI))).await.unwrap();
        assert!(thread.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_recipients_and_empty_messages() {
        let messenger = messenger();

        let err = messenger
            .send(id(RAVI), &ProfileId::parse("3").unwrap(), "Hello", None, true)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Cannot message profile - invalid ID format");

        assert!(matches!(
            messenger.send(id(RAVI), &ProfileId::from(id(RAVI)), "me", None, true).await,
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            messenger.send(id(RAVI), &ProfileId::from(id(MEERA)), "   ", None, true).await,
            Err(Error::Validation(_))
        ));

        // an image alone is a message
        let sent = messenger
            .send(id(RAVI), &ProfileId::from(id(MEERA)), "", Some("https://img/1.png".into()), true)
            .await
            .unwrap();
        assert_eq!(sent.image_url.as_deref(), Some("https://img/1.png"));
    }

    #[tokio::test]
    async fn test_accepted_request_unlocks_messaging() {
        let messenger = messenger();
        let store = messenger.repository.store();
        store
            .insert(Table::Likes, serde_json::to_value(Like::pending(id(MEERA), id(RAVI))).unwrap())
            .await
            .unwrap();

        let requests = messenger.requests(id(RAVI)).await.unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].sender_id, id(MEERA));
        assert_eq!(requests[0].sender.name, "Meera Perera");
        assert_eq!(requests[0].status, LikeStatus::Pending);

        let like = messenger.accept_request(id(RAVI), &ProfileId::from(id(MEERA))).await.unwrap();
        assert_eq!(like.status, LikeStatus::Accepted);
        assert!(messenger.requests(id(RAVI)).await.unwrap().is_empty());

        messenger
            .send(id(RAVI), &ProfileId::from(id(MEERA)), "Thanks for the like", None, false)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_accept_without_like_is_not_found() {
        let messenger = messenger();
        assert!(matches!(
            messenger.accept_request(id(RAVI), &ProfileId::from(id(MEERA))).await,
            Err(Error::NotFound(_))
        ));
    }
}
