use {
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginType {
    EmailPassword,
    Google,
    Github,
}

/// A stored blob reference, embedded in users (avatar) and messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub url: String,
    pub local_path: String,
}

impl Attachment {
    /// Placeholder avatar assigned at registration.
    pub fn placeholder_avatar() -> Self {
        Self {
            url: "https://via.placeholder.com/200x200.png".into(),
            local_path: String::new(),
        }
    }
}

/// An account document. `password` holds the digest, never the secret.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub password: String,
    pub avatar: Attachment,
    pub login_type: LoginType,
    pub is_email_verified: bool,
    /// Digest of the active verification token, if one is outstanding.
    pub email_verification_token: Option<String>,
    pub email_verification_expiry: Option<DateTime<Utc>>,
    pub forgot_password_token: Option<String>,
    pub forgot_password_expiry: Option<DateTime<Utc>>,
    /// The single currently-valid refresh token.
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A chat document. `admin` is only meaningful for group chats.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: String,
    pub name: String,
    pub is_group_chat: bool,
    pub participants: Vec<String>,
    pub admin: Option<String>,
    pub last_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Chat {
    pub fn has_participant(&self, user_id: &str) -> bool {
        self.participants.iter().any(|p| p == user_id)
    }

    pub fn is_admin(&self, user_id: &str) -> bool {
        self.admin.as_deref() == Some(user_id)
    }
}

/// A message document, owned by its chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub sender: String,
    pub chat: String,
    pub content: String,
    pub attachments: Vec<Attachment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
