use std::collections::HashMap;

use {
    async_trait::async_trait,
    chrono::{DateTime, Utc},
    tokio::sync::RwLock,
};

use parley_common::{ApiError, ApiResult};

use crate::{
    model::{Chat, ChatMessage, User},
    repo::{ChatRepository, ChatView, MessageRepository, MessageView, PublicUser, UserRepository},
};

/// In-process document store. Collections are plain maps behind async
/// locks; aggregation is done with explicit joins over them.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<String, User>>,
    chats: RwLock<HashMap<String, Chat>>,
    messages: RwLock<HashMap<String, ChatMessage>>,
}

impl MemoryStore {
    fn join_message(
        message: &ChatMessage,
        users: &HashMap<String, User>,
    ) -> Option<MessageView> {
        // A message whose sender document is gone cannot be projected.
        let sender = users.get(&message.sender)?;
        Some(MessageView {
            id: message.id.clone(),
            sender: PublicUser::from(sender),
            chat: message.chat.clone(),
            content: message.content.clone(),
            attachments: message.attachments.clone(),
            created_at: message.created_at,
            updated_at: message.updated_at,
        })
    }

    fn join_chat(
        chat: &Chat,
        users: &HashMap<String, User>,
        messages: &HashMap<String, ChatMessage>,
    ) -> ChatView {
        let participants = chat
            .participants
            .iter()
            .filter_map(|id| users.get(id).map(PublicUser::from))
            .collect();
        let last_message = chat
            .last_message
            .as_ref()
            .and_then(|id| messages.get(id))
            .and_then(|m| Self::join_message(m, users));
        ChatView {
            id: chat.id.clone(),
            name: chat.name.clone(),
            is_group_chat: chat.is_group_chat,
            participants,
            admin: chat.admin.clone(),
            last_message,
            created_at: chat.created_at,
            updated_at: chat.updated_at,
        }
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert(&self, user: User) -> ApiResult<()> {
        let mut users = self.users.write().await;
        let clash = users
            .values()
            .any(|u| u.username == user.username || u.email == user.email);
        if clash {
            return Err(ApiError::Conflict("username or email already exists".into()));
        }
        users.insert(user.id.clone(), user);
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> ApiResult<Option<User>> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> ApiResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> ApiResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_verification_digest(
        &self,
        digest: &str,
        now: DateTime<Utc>,
    ) -> ApiResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| {
                u.email_verification_token.as_deref() == Some(digest)
                    && u.email_verification_expiry.is_some_and(|exp| exp > now)
            })
            .cloned())
    }

    async fn find_by_reset_digest(
        &self,
        digest: &str,
        now: DateTime<Utc>,
    ) -> ApiResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| {
                u.forgot_password_token.as_deref() == Some(digest)
                    && u.forgot_password_expiry.is_some_and(|exp| exp > now)
            })
            .cloned())
    }

    async fn update(&self, user: User) -> ApiResult<()> {
        let mut users = self.users.write().await;
        if !users.contains_key(&user.id) {
            return Err(ApiError::NotFound("user not found".into()));
        }
        users.insert(user.id.clone(), user);
        Ok(())
    }

    async fn list_except(&self, user_id: &str) -> ApiResult<Vec<PublicUser>> {
        let users = self.users.read().await;
        let mut out: Vec<PublicUser> = users
            .values()
            .filter(|u| u.id != user_id)
            .map(PublicUser::from)
            .collect();
        out.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(out)
    }
}

#[async_trait]
impl ChatRepository for MemoryStore {
    async fn insert(&self, chat: Chat) -> ApiResult<()> {
        self.chats.write().await.insert(chat.id.clone(), chat);
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> ApiResult<Option<Chat>> {
        Ok(self.chats.read().await.get(id).cloned())
    }

    async fn find_direct_between(&self, a: &str, b: &str) -> ApiResult<Option<Chat>> {
        let chats = self.chats.read().await;
        Ok(chats
            .values()
            .find(|c| {
                !c.is_group_chat
                    && c.participants.len() == 2
                    && c.has_participant(a)
                    && c.has_participant(b)
            })
            .cloned())
    }

    async fn update(&self, chat: Chat) -> ApiResult<()> {
        let mut chats = self.chats.write().await;
        if !chats.contains_key(&chat.id) {
            return Err(ApiError::NotFound("chat not found".into()));
        }
        chats.insert(chat.id.clone(), chat);
        Ok(())
    }

    async fn delete(&self, id: &str) -> ApiResult<()> {
        self.chats.write().await.remove(id);
        Ok(())
    }

    async fn view(&self, id: &str) -> ApiResult<Option<ChatView>> {
        let chats = self.chats.read().await;
        let users = self.users.read().await;
        let messages = self.messages.read().await;
        Ok(chats.get(id).map(|c| Self::join_chat(c, &users, &messages)))
    }

    async fn views_for_user(&self, user_id: &str) -> ApiResult<Vec<ChatView>> {
        let chats = self.chats.read().await;
        let users = self.users.read().await;
        let messages = self.messages.read().await;
        let mut out: Vec<ChatView> = chats
            .values()
            .filter(|c| c.has_participant(user_id))
            .map(|c| Self::join_chat(c, &users, &messages))
            .collect();
        out.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(out)
    }
}

#[async_trait]
impl MessageRepository for MemoryStore {
    async fn insert(&self, message: ChatMessage) -> ApiResult<()> {
        self.messages
            .write()
            .await
            .insert(message.id.clone(), message);
        Ok(())
    }

    async fn list_for_chat(&self, chat_id: &str) -> ApiResult<Vec<ChatMessage>> {
        let messages = self.messages.read().await;
        let mut out: Vec<ChatMessage> = messages
            .values()
            .filter(|m| m.chat == chat_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(out)
    }

    async fn views_for_chat(&self, chat_id: &str) -> ApiResult<Vec<MessageView>> {
        let messages = self.messages.read().await;
        let users = self.users.read().await;
        let mut raw: Vec<&ChatMessage> = messages.values().filter(|m| m.chat == chat_id).collect();
        raw.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(raw
            .into_iter()
            .filter_map(|m| Self::join_message(m, &users))
            .collect())
    }

    async fn view(&self, id: &str) -> ApiResult<Option<MessageView>> {
        let messages = self.messages.read().await;
        let users = self.users.read().await;
        Ok(messages.get(id).and_then(|m| Self::join_message(m, &users)))
    }

    async fn delete_for_chat(&self, chat_id: &str) -> ApiResult<()> {
        self.messages.write().await.retain(|_, m| m.chat != chat_id);
        Ok(())
    }
}
