use serde::{Deserialize, Serialize};

use parley_store::UserRole;

/// Signed claim set carried by access and refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Unique per token, so two tokens minted in the same second for
    /// the same subject never compare equal.
    pub jti: String,
    /// Subject (user id).
    pub sub: String,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiration (unix timestamp).
    pub exp: i64,
    /// Token type: "access" or "refresh".
    pub token_type: String,
}

impl Claims {
    pub fn is_access(&self) -> bool {
        self.token_type == "access"
    }

    pub fn is_refresh(&self) -> bool {
        self.token_type == "refresh"
    }
}
