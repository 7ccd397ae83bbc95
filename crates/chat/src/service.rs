use std::sync::Arc;

use {
    chrono::Utc,
    tracing::{info, warn},
};

use {
    parley_common::{ApiError, ApiResult, new_id},
    parley_media::BlobStore,
    parley_store::{Attachment, Chat, ChatMessage, ChatView, MessageView, PublicUser, Store},
};

use crate::{EventPublisher, events};

/// Minimum total membership of a group chat at creation (creator plus
/// at least two others).
const MIN_GROUP_SIZE: usize = 3;

/// Business logic for chat and message mutations. Holds the event
/// publisher by handle; broadcasts are issued synchronously after the
/// repository write confirms, so a caller that sees the response knows
/// the events were already published.
pub struct ChatService {
    store: Store,
    blobs: Arc<BlobStore>,
    events: Arc<dyn EventPublisher>,
}

impl ChatService {
    pub fn new(store: Store, blobs: Arc<BlobStore>, events: Arc<dyn EventPublisher>) -> Self {
        Self {
            store,
            blobs,
            events,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────────────

    /// All chats the caller participates in, most recently updated first.
    pub async fn list_chats(&self, caller: &str) -> ApiResult<Vec<ChatView>> {
        self.store.chats.views_for_user(caller).await
    }

    /// Users available to start a chat with (everyone but the caller).
    pub async fn available_users(&self, caller: &str) -> ApiResult<Vec<PublicUser>> {
        self.store.users.list_except(caller).await
    }

    /// Messages of a chat, oldest first. Participant-only.
    pub async fn messages(&self, caller: &str, chat_id: &str) -> ApiResult<Vec<MessageView>> {
        let chat = self.load_chat(chat_id).await?;
        self.require_participant(&chat, caller)?;
        self.store.messages.views_for_chat(chat_id).await
    }

    /// Group details. Participant-only.
    pub async fn group_details(&self, caller: &str, chat_id: &str) -> ApiResult<ChatView> {
        let chat = self.load_chat(chat_id).await?;
        if !chat.is_group_chat {
            return Err(ApiError::NotFound("group chat not found".into()));
        }
        self.require_participant(&chat, caller)?;
        self.view(chat_id).await
    }

    // ── Direct chats ─────────────────────────────────────────────────────────

    /// Get or create the direct chat with another user. Idempotent:
    /// re-requesting the same pair returns the existing chat and emits
    /// nothing. Returns `(view, created)`.
    pub async fn get_or_create_direct(
        &self,
        caller: &str,
        other_id: &str,
    ) -> ApiResult<(ChatView, bool)> {
        if other_id == caller {
            return Err(ApiError::Validation("cannot chat with yourself".into()));
        }
        let other = self
            .store
            .users
            .find_by_id(other_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("user does not exist".into()))?;

        if let Some(existing) = self.store.chats.find_direct_between(caller, other_id).await? {
            return Ok((self.view(&existing.id).await?, false));
        }

        let now = Utc::now();
        let chat = Chat {
            id: new_id(),
            name: "One on one chat".into(),
            is_group_chat: false,
            participants: vec![caller.to_string(), other.id.clone()],
            admin: None,
            last_message: None,
            created_at: now,
            updated_at: now,
        };
        let chat_id = chat.id.clone();
        self.store.chats.insert(chat).await?;
        let view = self.view(&chat_id).await?;

        // The caller gets the chat in the response; the other side
        // learns about it on their identity room.
        self.publish_view(&other.id, events::NEW_CHAT, &view).await;
        info!(chat = %chat_id, "direct chat created");
        Ok((view, true))
    }

    /// Delete a direct chat. Any participant may do this; messages and
    /// their attachment blobs cascade.
    pub async fn delete_direct(&self, caller: &str, chat_id: &str) -> ApiResult<()> {
        let chat = self.load_chat(chat_id).await?;
        if chat.is_group_chat {
            return Err(ApiError::NotFound("direct chat not found".into()));
        }
        self.require_participant(&chat, caller)?;

        let view = self.view(chat_id).await?;
        self.cascade_delete(&chat).await?;

        for participant in chat.participants.iter().filter(|p| *p != caller) {
            self.publish_view(participant, events::LEAVE_CHAT, &view).await;
        }
        info!(chat = %chat_id, "direct chat deleted");
        Ok(())
    }

    // ── Group chats ──────────────────────────────────────────────────────────

    /// Create a group chat: the caller becomes admin; `member_ids` must
    /// name at least two other distinct existing users.
    pub async fn create_group(
        &self,
        caller: &str,
        name: &str,
        member_ids: &[String],
    ) -> ApiResult<ChatView> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::Validation("group name is required".into()));
        }
        if member_ids.iter().any(|id| id == caller) {
            return Err(ApiError::Validation(
                "participants should not contain the group creator".into(),
            ));
        }
        let mut participants = vec![caller.to_string()];
        for id in member_ids {
            if participants.iter().any(|p| p == id) {
                continue; // drop duplicates
            }
            if self.store.users.find_by_id(id).await?.is_none() {
                return Err(ApiError::NotFound(format!("user {id} does not exist")));
            }
            participants.push(id.clone());
        }
        if participants.len() < MIN_GROUP_SIZE {
            return Err(ApiError::Validation(
                "a group chat needs at least 3 members including you".into(),
            ));
        }

        let now = Utc::now();
        let chat = Chat {
            id: new_id(),
            name: name.to_string(),
            is_group_chat: true,
            participants: participants.clone(),
            admin: Some(caller.to_string()),
            last_message: None,
            created_at: now,
            updated_at: now,
        };
        let chat_id = chat.id.clone();
        self.store.chats.insert(chat).await?;
        let view = self.view(&chat_id).await?;

        for participant in participants.iter().filter(|p| *p != caller) {
            self.publish_view(participant, events::NEW_CHAT, &view).await;
        }
        info!(chat = %chat_id, members = participants.len(), "group chat created");
        Ok(view)
    }

    /// Rename a group. Admin-only.
    pub async fn rename_group(
        &self,
        caller: &str,
        chat_id: &str,
        name: &str,
    ) -> ApiResult<ChatView> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::Validation("group name is required".into()));
        }
        let mut chat = self.load_group(chat_id).await?;
        self.require_admin(&chat, caller)?;

        chat.name = name.to_string();
        chat.updated_at = Utc::now();
        self.store.chats.update(chat).await?;
        let view = self.view(chat_id).await?;

        self.publish_view(chat_id, events::UPDATE_GROUP_NAME, &view).await;
        Ok(view)
    }

    /// Delete a group and everything it owns. Admin-only.
    pub async fn delete_group(&self, caller: &str, chat_id: &str) -> ApiResult<()> {
        let chat = self.load_group(chat_id).await?;
        self.require_admin(&chat, caller)?;

        let view = self.view(chat_id).await?;
        self.cascade_delete(&chat).await?;

        for participant in chat.participants.iter().filter(|p| *p != caller) {
            self.publish_view(participant, events::LEAVE_CHAT, &view).await;
        }
        info!(chat = %chat_id, "group chat deleted");
        Ok(())
    }

    /// Add a user to a group. Admin-only; duplicates are a conflict.
    pub async fn add_participant(
        &self,
        caller: &str,
        chat_id: &str,
        participant_id: &str,
    ) -> ApiResult<ChatView> {
        let mut chat = self.load_group(chat_id).await?;
        self.require_admin(&chat, caller)?;
        if self
            .store
            .users
            .find_by_id(participant_id)
            .await?
            .is_none()
        {
            return Err(ApiError::NotFound("user does not exist".into()));
        }
        if chat.has_participant(participant_id) {
            return Err(ApiError::Conflict(
                "participant already in the group chat".into(),
            ));
        }

        chat.participants.push(participant_id.to_string());
        chat.updated_at = Utc::now();
        self.store.chats.update(chat).await?;
        let view = self.view(chat_id).await?;

        self.publish_view(participant_id, events::NEW_CHAT, &view).await;
        Ok(view)
    }

    /// Remove a user from a group. Admin-only.
    pub async fn remove_participant(
        &self,
        caller: &str,
        chat_id: &str,
        participant_id: &str,
    ) -> ApiResult<ChatView> {
        let mut chat = self.load_group(chat_id).await?;
        self.require_admin(&chat, caller)?;
        if !chat.has_participant(participant_id) {
            return Err(ApiError::NotFound(
                "participant does not exist in the group chat".into(),
            ));
        }
        // The admin stays a participant for the life of the group; the
        // only way out for them is deleting it.
        if chat.is_admin(participant_id) {
            return Err(ApiError::Forbidden(
                "the group admin cannot be removed, delete the group instead".into(),
            ));
        }

        chat.participants.retain(|p| p != participant_id);
        chat.updated_at = Utc::now();
        self.store.chats.update(chat).await?;
        let view = self.view(chat_id).await?;

        self.publish_view(participant_id, events::LEAVE_CHAT, &view).await;
        Ok(view)
    }

    /// Leave a group. The admin can never leave — they must delete the
    /// group instead.
    pub async fn leave_group(&self, caller: &str, chat_id: &str) -> ApiResult<ChatView> {
        let mut chat = self.load_group(chat_id).await?;
        if !chat.has_participant(caller) {
            return Err(ApiError::Validation(
                "you are not part of this group chat".into(),
            ));
        }
        if chat.is_admin(caller) {
            return Err(ApiError::Forbidden(
                "admin cannot leave the group, delete it instead".into(),
            ));
        }

        chat.participants.retain(|p| p != caller);
        chat.updated_at = Utc::now();
        self.store.chats.update(chat).await?;
        let view = self.view(chat_id).await?;

        // Remaining participants evict the leaver from their UI state.
        self.publish_view(chat_id, events::LEAVE_CHAT, &view).await;
        Ok(view)
    }

    // ── Messages ─────────────────────────────────────────────────────────────

    /// Send a message: text and/or attachments, at least one required.
    /// Fan-out goes to the whole chat-room, sender's connections
    /// included — clients reconcile by message id.
    pub async fn send_message(
        &self,
        caller: &str,
        chat_id: &str,
        content: Option<String>,
        attachments: Vec<Attachment>,
    ) -> ApiResult<MessageView> {
        let content = content.unwrap_or_default();
        if content.trim().is_empty() && attachments.is_empty() {
            return Err(ApiError::Validation(
                "message content or attachment is required".into(),
            ));
        }
        let mut chat = self.load_chat(chat_id).await?;
        self.require_participant(&chat, caller)?;

        let now = Utc::now();
        let message = ChatMessage {
            id: new_id(),
            sender: caller.to_string(),
            chat: chat_id.to_string(),
            content,
            attachments,
            created_at: now,
            updated_at: now,
        };
        let message_id = message.id.clone();
        self.store.messages.insert(message).await?;

        chat.last_message = Some(message_id.clone());
        chat.updated_at = now;
        self.store.chats.update(chat).await?;

        let view = self
            .store
            .messages
            .view(&message_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("message not found".into()))?;

        match serde_json::to_value(&view) {
            Ok(payload) => {
                self.events
                    .publish(chat_id, events::MESSAGE_RECEIVED, payload)
                    .await;
            },
            // Delivery is best-effort; the write already happened.
            Err(e) => warn!(message = %message_id, error = %e, "failed to serialize message event"),
        }
        Ok(view)
    }

    // ── Helpers ──────────────────────────────────────────────────────────────

    async fn load_chat(&self, chat_id: &str) -> ApiResult<Chat> {
        self.store
            .chats
            .find_by_id(chat_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("chat does not exist".into()))
    }

    async fn load_group(&self, chat_id: &str) -> ApiResult<Chat> {
        let chat = self.load_chat(chat_id).await?;
        if !chat.is_group_chat {
            return Err(ApiError::NotFound("group chat not found".into()));
        }
        Ok(chat)
    }

    fn require_participant(&self, chat: &Chat, caller: &str) -> ApiResult<()> {
        if !chat.has_participant(caller) {
            return Err(ApiError::Forbidden(
                "you are not a participant of this chat".into(),
            ));
        }
        Ok(())
    }

    fn require_admin(&self, chat: &Chat, caller: &str) -> ApiResult<()> {
        self.require_participant(chat, caller)?;
        if !chat.is_admin(caller) {
            return Err(ApiError::Forbidden("you are not the group admin".into()));
        }
        Ok(())
    }

    async fn view(&self, chat_id: &str) -> ApiResult<ChatView> {
        self.store
            .chats
            .view(chat_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("chat does not exist".into()))
    }

    async fn publish_view(&self, room: &str, event: &str, view: &ChatView) {
        match serde_json::to_value(view) {
            Ok(payload) => self.events.publish(room, event, payload).await,
            Err(e) => warn!(room, event, error = %e, "failed to serialize chat event"),
        }
    }

    /// Delete everything a chat owns, then the chat itself. Blobs
    /// first, then messages, then the chat — the store has no
    /// multi-document transactions, so the sequence is not atomic.
    async fn cascade_delete(&self, chat: &Chat) -> ApiResult<()> {
        let messages = self.store.messages.list_for_chat(&chat.id).await?;
        for message in &messages {
            for attachment in &message.attachments {
                if let Err(e) = self.blobs.delete(&attachment.local_path).await {
                    warn!(path = %attachment.local_path, error = %e, "failed to delete blob");
                }
            }
        }
        self.store.messages.delete_for_chat(&chat.id).await?;
        self.store.chats.delete(&chat.id).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use {
        async_trait::async_trait,
        parley_store::{LoginType, MemoryStore, User, UserRepository, UserRole},
    };

    use super::*;

    /// Records every publish for fan-out assertions.
    #[derive(Default)]
    struct RecordingPublisher {
        published: Mutex<Vec<(String, String, serde_json::Value)>>,
    }

    impl RecordingPublisher {
        fn events(&self) -> Vec<(String, String, serde_json::Value)> {
            self.published.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EventPublisher for RecordingPublisher {
        async fn publish(&self, room: &str, event: &str, payload: serde_json::Value) {
            self.published
                .lock()
                .unwrap()
                .push((room.to_string(), event.to_string(), payload));
        }
    }

    struct Fixture {
        service: ChatService,
        publisher: Arc<RecordingPublisher>,
        users: Vec<User>,
        _dir: tempfile::TempDir,
    }

    async fn fixture(usernames: &[&str]) -> Fixture {
        let mem = Arc::new(MemoryStore::default());
        let store = Store {
            users: Arc::clone(&mem) as Arc<dyn UserRepository>,
            chats: Arc::clone(&mem) as _,
            messages: Arc::clone(&mem) as _,
        };
        let mut users = Vec::new();
        for name in usernames {
            let now = Utc::now();
            let user = User {
                id: new_id(),
                username: (*name).to_string(),
                email: format!("{name}@example.com"),
                role: UserRole::User,
                password: "digest".into(),
                avatar: Attachment::placeholder_avatar(),
                login_type: LoginType::EmailPassword,
                is_email_verified: true,
                email_verification_token: None,
                email_verification_expiry: None,
                forgot_password_token: None,
                forgot_password_expiry: None,
                refresh_token: None,
                created_at: now,
                updated_at: now,
            };
            store.users.insert(user.clone()).await.unwrap();
            users.push(user);
        }
        let dir = tempfile::tempdir().unwrap();
        let blobs = Arc::new(BlobStore::new(dir.path(), "http://localhost").unwrap());
        let publisher = Arc::new(RecordingPublisher::default());
        let service = ChatService::new(store, blobs, Arc::clone(&publisher) as _);
        Fixture {
            service,
            publisher,
            users,
            _dir: dir,
        }
    }

    #[tokio::test]
    async fn direct_chat_is_idempotent() {
        let fx = fixture(&["a", "b"]).await;
        let (a, b) = (&fx.users[0].id, &fx.users[1].id);

        let (first, created) = fx.service.get_or_create_direct(a, b).await.unwrap();
        assert!(created);
        assert!(!first.is_group_chat);
        assert_eq!(first.participants.len(), 2);

        // Same pair from either side returns the same chat, no event.
        let (second, created) = fx.service.get_or_create_direct(b, a).await.unwrap();
        assert!(!created);
        assert_eq!(first.id, second.id);

        let events = fx.publisher.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, *b);
        assert_eq!(events[0].1, events::NEW_CHAT);
    }

    #[tokio::test]
    async fn direct_chat_with_self_is_rejected() {
        let fx = fixture(&["a"]).await;
        let a = &fx.users[0].id;
        let err = fx.service.get_or_create_direct(a, a).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn group_needs_three_members() {
        let fx = fixture(&["a", "b"]).await;
        let (a, b) = (&fx.users[0].id, &fx.users[1].id);

        let err = fx
            .service
            .create_group(a, "too small", &[b.clone()])
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert!(fx.publisher.events().is_empty());
        assert!(fx.service.list_chats(a).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn group_creation_notifies_each_other_member() {
        let fx = fixture(&["a", "b", "c"]).await;
        let ids: Vec<String> = fx.users.iter().map(|u| u.id.clone()).collect();

        let view = fx
            .service
            .create_group(&ids[0], "trio", &[ids[1].clone(), ids[2].clone()])
            .await
            .unwrap();
        assert!(view.is_group_chat);
        assert_eq!(view.participants.len(), 3);
        assert_eq!(view.admin.as_deref(), Some(ids[0].as_str()));

        let events = fx.publisher.events();
        let rooms: Vec<&str> = events.iter().map(|(r, _, _)| r.as_str()).collect();
        assert_eq!(events.len(), 2);
        assert!(rooms.contains(&ids[1].as_str()));
        assert!(rooms.contains(&ids[2].as_str()));
        assert!(events.iter().all(|(_, e, _)| e == events::NEW_CHAT));
    }

    #[tokio::test]
    async fn admin_cannot_leave_group() {
        let fx = fixture(&["a", "b", "c"]).await;
        let ids: Vec<String> = fx.users.iter().map(|u| u.id.clone()).collect();
        let view = fx
            .service
            .create_group(&ids[0], "trio", &[ids[1].clone(), ids[2].clone()])
            .await
            .unwrap();

        let err = fx.service.leave_group(&ids[0], &view.id).await.unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        // Non-admin members may leave.
        let after = fx.service.leave_group(&ids[1], &view.id).await.unwrap();
        assert_eq!(after.participants.len(), 2);
    }

    #[tokio::test]
    async fn rename_by_non_admin_is_forbidden_and_silent() {
        let fx = fixture(&["a", "b", "c"]).await;
        let ids: Vec<String> = fx.users.iter().map(|u| u.id.clone()).collect();
        let view = fx
            .service
            .create_group(&ids[0], "old name", &[ids[1].clone(), ids[2].clone()])
            .await
            .unwrap();
        let before = fx.publisher.events().len();

        let err = fx
            .service
            .rename_group(&ids[1], &view.id, "new name")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        let details = fx.service.group_details(&ids[0], &view.id).await.unwrap();
        assert_eq!(details.name, "old name");
        assert_eq!(fx.publisher.events().len(), before);
    }

    #[tokio::test]
    async fn rename_by_admin_broadcasts_to_chat_room() {
        let fx = fixture(&["a", "b", "c"]).await;
        let ids: Vec<String> = fx.users.iter().map(|u| u.id.clone()).collect();
        let view = fx
            .service
            .create_group(&ids[0], "old", &[ids[1].clone(), ids[2].clone()])
            .await
            .unwrap();

        let renamed = fx
            .service
            .rename_group(&ids[0], &view.id, "new")
            .await
            .unwrap();
        assert_eq!(renamed.name, "new");

        let last = fx.publisher.events().pop().unwrap();
        assert_eq!(last.0, view.id);
        assert_eq!(last.1, events::UPDATE_GROUP_NAME);
        assert_eq!(last.2["name"], "new");
    }

    #[tokio::test]
    async fn add_and_remove_participant() {
        let fx = fixture(&["a", "b", "c", "d"]).await;
        let ids: Vec<String> = fx.users.iter().map(|u| u.id.clone()).collect();
        let view = fx
            .service
            .create_group(&ids[0], "g", &[ids[1].clone(), ids[2].clone()])
            .await
            .unwrap();

        let after = fx
            .service
            .add_participant(&ids[0], &view.id, &ids[3])
            .await
            .unwrap();
        assert_eq!(after.participants.len(), 4);

        // Adding again conflicts.
        let err = fx
            .service
            .add_participant(&ids[0], &view.id, &ids[3])
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));

        // Non-admin cannot remove.
        let err = fx
            .service
            .remove_participant(&ids[1], &view.id, &ids[3])
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        let after = fx
            .service
            .remove_participant(&ids[0], &view.id, &ids[3])
            .await
            .unwrap();
        assert_eq!(after.participants.len(), 3);

        let events = fx.publisher.events();
        let last = events.last().unwrap();
        assert_eq!(last.0, ids[3]);
        assert_eq!(last.1, events::LEAVE_CHAT);
    }

    #[tokio::test]
    async fn admin_cannot_be_removed_even_by_themself() {
        let fx = fixture(&["a", "b", "c"]).await;
        let ids: Vec<String> = fx.users.iter().map(|u| u.id.clone()).collect();
        let view = fx
            .service
            .create_group(&ids[0], "g", &[ids[1].clone(), ids[2].clone()])
            .await
            .unwrap();
        let before = fx.publisher.events().len();

        let err = fx
            .service
            .remove_participant(&ids[0], &view.id, &ids[0])
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        // Membership and admin are untouched, and nothing was broadcast.
        let details = fx.service.group_details(&ids[0], &view.id).await.unwrap();
        assert_eq!(details.participants.len(), 3);
        assert_eq!(details.admin.as_deref(), Some(ids[0].as_str()));
        assert_eq!(fx.publisher.events().len(), before);
    }

    #[tokio::test]
    async fn send_message_updates_last_message_and_broadcasts() {
        let fx = fixture(&["a", "b"]).await;
        let (a, b) = (&fx.users[0].id, &fx.users[1].id);
        let (chat, _) = fx.service.get_or_create_direct(a, b).await.unwrap();

        let msg = fx
            .service
            .send_message(a, &chat.id, Some("hello".into()), vec![])
            .await
            .unwrap();
        assert_eq!(msg.content, "hello");
        assert_eq!(msg.sender.id, *a);

        let listed = fx.service.list_chats(b).await.unwrap();
        assert_eq!(
            listed[0].last_message.as_ref().unwrap().id,
            msg.id
        );

        let last = fx.publisher.events().pop().unwrap();
        assert_eq!(last.0, chat.id);
        assert_eq!(last.1, events::MESSAGE_RECEIVED);
        assert_eq!(last.2["content"], "hello");
    }

    #[tokio::test]
    async fn empty_message_is_rejected() {
        let fx = fixture(&["a", "b"]).await;
        let (a, b) = (&fx.users[0].id, &fx.users[1].id);
        let (chat, _) = fx.service.get_or_create_direct(a, b).await.unwrap();

        let err = fx
            .service
            .send_message(a, &chat.id, Some("   ".into()), vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn non_participant_cannot_read_or_write() {
        let fx = fixture(&["a", "b", "x"]).await;
        let (a, b, x) = (&fx.users[0].id, &fx.users[1].id, &fx.users[2].id);
        let (chat, _) = fx.service.get_or_create_direct(a, b).await.unwrap();

        let err = fx.service.messages(x, &chat.id).await.unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        let err = fx
            .service
            .send_message(x, &chat.id, Some("hi".into()), vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[tokio::test]
    async fn group_delete_cascades_messages() {
        let fx = fixture(&["a", "b", "c"]).await;
        let ids: Vec<String> = fx.users.iter().map(|u| u.id.clone()).collect();
        let view = fx
            .service
            .create_group(&ids[0], "g", &[ids[1].clone(), ids[2].clone()])
            .await
            .unwrap();
        fx.service
            .send_message(&ids[1], &view.id, Some("hi".into()), vec![])
            .await
            .unwrap();

        // Only the admin may delete.
        let err = fx.service.delete_group(&ids[1], &view.id).await.unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        fx.service.delete_group(&ids[0], &view.id).await.unwrap();
        let err = fx.service.messages(&ids[1], &view.id).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
