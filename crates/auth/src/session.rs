use std::sync::Arc;

use {
    parley_common::{ApiError, ApiResult},
    parley_store::UserRepository,
};

use crate::{claims::Claims, tokens::TokenKeys};

/// Validates bearer credentials for both the REST layer and the event
/// gateway. Pure verification — never renews tokens.
#[derive(Clone)]
pub struct SessionAuthenticator {
    keys: Arc<TokenKeys>,
    users: Arc<dyn UserRepository>,
}

impl SessionAuthenticator {
    pub fn new(keys: Arc<TokenKeys>, users: Arc<dyn UserRepository>) -> Self {
        Self { keys, users }
    }

    /// REST path: verify an access token from a cookie or bearer
    /// header. Signature and expiry only.
    pub fn authenticate(&self, raw: Option<&str>) -> ApiResult<Claims> {
        let token = raw.ok_or_else(|| ApiError::Unauthorized("unauthorized request".into()))?;
        self.keys.verify_access(token)
    }

    /// Handshake path: same verification, but the claimed subject must
    /// resolve to an existing account — a token for a deleted user is
    /// rejected even if cryptographically valid.
    pub async fn authenticate_handshake(&self, raw: Option<&str>) -> ApiResult<Claims> {
        let token = raw.ok_or_else(|| {
            ApiError::Unauthorized("un-authorized handshake: token is missing".into())
        })?;
        let claims = self
            .keys
            .verify_access(token)
            .map_err(|_| ApiError::Unauthorized("un-authorized handshake: token is invalid".into()))?;
        let exists = self.users.find_by_id(&claims.sub).await?.is_some();
        if !exists {
            return Err(ApiError::Unauthorized(
                "un-authorized handshake: token is invalid".into(),
            ));
        }
        Ok(claims)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use {
        chrono::Utc,
        parley_config::schema::AuthConfig,
        parley_store::{Attachment, LoginType, MemoryStore, User, UserRole},
    };

    use super::*;

    fn fixture() -> (SessionAuthenticator, Arc<TokenKeys>, User) {
        let keys = Arc::new(TokenKeys::new(&AuthConfig::default()));
        let store = Arc::new(MemoryStore::default());
        let now = Utc::now();
        let user = User {
            id: "u-1".into(),
            username: "alice".into(),
            email: "alice@example.com".into(),
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
        let auth = SessionAuthenticator::new(Arc::clone(&keys), store.clone());
        (auth, keys, user)
    }

    #[tokio::test]
    async fn handshake_rejects_token_for_missing_user() {
        let (auth, keys, user) = fixture();
        // Token is valid but the user was never inserted.
        let token = keys.issue_access(&user).unwrap();
        let err = auth.authenticate_handshake(Some(&token)).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn handshake_accepts_existing_user() {
        let keys = Arc::new(TokenKeys::new(&AuthConfig::default()));
        let store = Arc::new(MemoryStore::default());
        let (_, _, user) = fixture();
        store.insert(user.clone()).await.unwrap();
        let auth = SessionAuthenticator::new(Arc::clone(&keys), store);

        let token = keys.issue_access(&user).unwrap();
        let claims = auth.authenticate_handshake(Some(&token)).await.unwrap();
        assert_eq!(claims.sub, user.id);
    }

    #[test]
    fn missing_credential_is_unauthorized() {
        let (auth, _, _) = fixture();
        assert!(auth.authenticate(None).is_err());
    }
}
