use {
    async_trait::async_trait,
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
};

use parley_common::ApiResult;

use crate::model::{Attachment, Chat, ChatMessage, User};

// ── Aggregated views ─────────────────────────────────────────────────────────

/// Projection of a user safe to hand to other participants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub username: String,
    pub email: String,
    pub avatar: Attachment,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            avatar: user.avatar.clone(),
        }
    }
}

/// A message with its sender joined in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub id: String,
    pub sender: PublicUser,
    pub chat: String,
    pub content: String,
    pub attachments: Vec<Attachment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A chat with participants and last message joined in — the shape
/// clients consume over REST and in push events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatView {
    pub id: String,
    pub name: String,
    pub is_group_chat: bool,
    pub participants: Vec<PublicUser>,
    pub admin: Option<String>,
    pub last_message: Option<MessageView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ── Repositories ─────────────────────────────────────────────────────────────

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user. Fails with `Conflict` on duplicate
    /// username/email (uniqueness is enforced at write time).
    async fn insert(&self, user: User) -> ApiResult<()>;

    async fn find_by_id(&self, id: &str) -> ApiResult<Option<User>>;
    async fn find_by_username(&self, username: &str) -> ApiResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> ApiResult<Option<User>>;

    /// Look up by the digest of a non-expired email-verification token.
    async fn find_by_verification_digest(
        &self,
        digest: &str,
        now: DateTime<Utc>,
    ) -> ApiResult<Option<User>>;

    /// Look up by the digest of a non-expired password-reset token.
    async fn find_by_reset_digest(
        &self,
        digest: &str,
        now: DateTime<Utc>,
    ) -> ApiResult<Option<User>>;

    /// Replace the stored document. `NotFound` if the id is absent.
    async fn update(&self, user: User) -> ApiResult<()>;

    /// Everyone except the given user, projected for client display.
    async fn list_except(&self, user_id: &str) -> ApiResult<Vec<PublicUser>>;
}

#[async_trait]
pub trait ChatRepository: Send + Sync {
    async fn insert(&self, chat: Chat) -> ApiResult<()>;
    async fn find_by_id(&self, id: &str) -> ApiResult<Option<Chat>>;

    /// The non-group chat between exactly this participant pair, if any.
    async fn find_direct_between(&self, a: &str, b: &str) -> ApiResult<Option<Chat>>;

    async fn update(&self, chat: Chat) -> ApiResult<()>;
    async fn delete(&self, id: &str) -> ApiResult<()>;

    /// Aggregated view of one chat (participants + last message joined).
    async fn view(&self, id: &str) -> ApiResult<Option<ChatView>>;

    /// Aggregated views of every chat the user participates in, most
    /// recently updated first.
    async fn views_for_user(&self, user_id: &str) -> ApiResult<Vec<ChatView>>;
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn insert(&self, message: ChatMessage) -> ApiResult<()>;

    /// Raw documents for a chat (cascade delete needs the attachment
    /// paths before the records go).
    async fn list_for_chat(&self, chat_id: &str) -> ApiResult<Vec<ChatMessage>>;

    /// Aggregated views for a chat, oldest first.
    async fn views_for_chat(&self, chat_id: &str) -> ApiResult<Vec<MessageView>>;

    /// Aggregated view of a single message.
    async fn view(&self, id: &str) -> ApiResult<Option<MessageView>>;

    async fn delete_for_chat(&self, chat_id: &str) -> ApiResult<()>;
}
