use std::sync::Arc;

use {
    chrono::Utc,
    serde::{Deserialize, Serialize},
    subtle::ConstantTimeEq,
    tracing::{info, warn},
};

use {
    parley_common::{ApiError, ApiResult, new_id},
    parley_mail::{MailSender, email_verification_content, forgot_password_content},
    parley_store::{Attachment, LoginType, User, UserRepository, UserRole},
};

use crate::{
    password::CredentialHasher,
    tokens::{TokenKeys, digest_of, generate_temporary_token},
};

/// Account projection returned to the authenticated caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub avatar: Attachment,
    pub is_email_verified: bool,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
            avatar: user.avatar.clone(),
            is_email_verified: user.is_email_verified,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Account flows: registration, login, token refresh/rotation, email
/// verification, password reset. Mutations go through the user
/// repository; mail goes through the `MailSender` collaborator.
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn CredentialHasher>,
    keys: Arc<TokenKeys>,
    mailer: Arc<dyn MailSender>,
    public_base_url: String,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn CredentialHasher>,
        keys: Arc<TokenKeys>,
        mailer: Arc<dyn MailSender>,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            users,
            hasher,
            keys,
            mailer,
            public_base_url: public_base_url.into(),
        }
    }

    /// Register a new account and send the verification mail.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> ApiResult<CurrentUser> {
        let username = username.trim().to_lowercase();
        let email = email.trim().to_lowercase();
        if username.is_empty() || email.is_empty() || password.is_empty() {
            return Err(ApiError::Validation(
                "username, email and password are required".into(),
            ));
        }
        if !email.contains('@') {
            return Err(ApiError::Validation("invalid email address".into()));
        }

        let (unhashed, token_digest, expiry) = generate_temporary_token();
        let now = Utc::now();
        let user = User {
            id: new_id(),
            username: username.clone(),
            email: email.clone(),
            role: UserRole::User,
            password: self.hasher.hash(password)?,
            avatar: Attachment::placeholder_avatar(),
            login_type: LoginType::EmailPassword,
            is_email_verified: false,
            email_verification_token: Some(token_digest),
            email_verification_expiry: Some(expiry),
            forgot_password_token: None,
            forgot_password_expiry: None,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        };
        let current = CurrentUser::from(&user);
        // Uniqueness is enforced at write time; a duplicate surfaces
        // here as Conflict.
        self.users.insert(user).await?;

        let url = format!("{}/api/v1/users/verify-email/{unhashed}", self.public_base_url);
        self.send_mail(
            &email,
            "Verify Your Email",
            &email_verification_content(&username, &url),
        )
        .await;

        info!(username, "user registered");
        Ok(current)
    }

    /// Login with username + password. Issues and persists a fresh
    /// token pair.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> ApiResult<(CurrentUser, TokenPair)> {
        if username.is_empty() || password.is_empty() {
            return Err(ApiError::Validation("username and password are required".into()));
        }
        let mut user = self
            .users
            .find_by_username(&username.to_lowercase())
            .await?
            .ok_or_else(|| ApiError::NotFound("user does not exist".into()))?;

        if !self.hasher.verify(password, &user.password)? {
            return Err(ApiError::Unauthorized("invalid user credentials".into()));
        }

        let pair = self.issue_and_store_pair(&mut user).await?;
        Ok((CurrentUser::from(&user), pair))
    }

    /// Invalidate the stored refresh token.
    pub async fn logout(&self, user_id: &str) -> ApiResult<()> {
        let mut user = self.load(user_id).await?;
        user.refresh_token = None;
        user.updated_at = Utc::now();
        self.users.update(user).await
    }

    /// Rotate a refresh token. The presented token must equal the
    /// stored one byte-for-byte; any mismatch invalidates the session.
    pub async fn refresh(&self, presented: &str) -> ApiResult<(CurrentUser, TokenPair)> {
        let claims = self
            .keys
            .verify_refresh(presented)
            .map_err(|_| ApiError::Unauthorized("invalid refresh token".into()))?;
        let mut user = self
            .users
            .find_by_id(&claims.sub)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("invalid refresh token".into()))?;

        let stored = user.refresh_token.clone().unwrap_or_default();
        let matches: bool = stored.as_bytes().ct_eq(presented.as_bytes()).into();
        if !matches {
            warn!(user = %user.id, "refresh token reuse detected");
            return Err(ApiError::Unauthorized(
                "refresh token is expired or used".into(),
            ));
        }

        let pair = self.issue_and_store_pair(&mut user).await?;
        Ok((CurrentUser::from(&user), pair))
    }

    /// Verify an email from the unhashed mail-link token.
    pub async fn verify_email(&self, token: &str) -> ApiResult<CurrentUser> {
        let digest = digest_of(token);
        let mut user = self
            .users
            .find_by_verification_digest(&digest, Utc::now())
            .await?
            .ok_or_else(|| ApiError::Validation("invalid verification token".into()))?;

        user.is_email_verified = true;
        user.email_verification_token = None;
        user.email_verification_expiry = None;
        user.updated_at = Utc::now();
        let current = CurrentUser::from(&user);
        self.users.update(user).await?;
        Ok(current)
    }

    /// Issue a fresh verification token for an unverified account.
    pub async fn resend_email_verification(&self, user_id: &str) -> ApiResult<()> {
        let mut user = self.load(user_id).await?;
        if user.is_email_verified {
            return Err(ApiError::Conflict("email is already verified".into()));
        }
        let (unhashed, token_digest, expiry) = generate_temporary_token();
        user.email_verification_token = Some(token_digest);
        user.email_verification_expiry = Some(expiry);
        user.updated_at = Utc::now();
        let (username, email) = (user.username.clone(), user.email.clone());
        self.users.update(user).await?;

        let url = format!("{}/api/v1/users/verify-email/{unhashed}", self.public_base_url);
        self.send_mail(
            &email,
            "Verify Your Email",
            &email_verification_content(&username, &url),
        )
        .await;
        Ok(())
    }

    /// Start the password-reset flow for an email address.
    pub async fn forgot_password(&self, email: &str) -> ApiResult<()> {
        let mut user = self
            .users
            .find_by_email(&email.to_lowercase())
            .await?
            .ok_or_else(|| ApiError::NotFound("user not found".into()))?;

        let (unhashed, token_digest, expiry) = generate_temporary_token();
        user.forgot_password_token = Some(token_digest);
        user.forgot_password_expiry = Some(expiry);
        user.updated_at = Utc::now();
        let (username, email) = (user.username.clone(), user.email.clone());
        self.users.update(user).await?;

        let url = format!("{}/api/v1/users/reset-password/{unhashed}", self.public_base_url);
        self.send_mail(
            &email,
            "Reset Your Password",
            &forgot_password_content(&username, &url),
        )
        .await;
        Ok(())
    }

    /// Complete the password-reset flow.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> ApiResult<()> {
        if new_password.is_empty() {
            return Err(ApiError::Validation("new password is required".into()));
        }
        let digest = digest_of(token);
        let mut user = self
            .users
            .find_by_reset_digest(&digest, Utc::now())
            .await?
            .ok_or_else(|| ApiError::Validation("invalid reset password token".into()))?;

        user.password = self.hasher.hash(new_password)?;
        user.forgot_password_token = None;
        user.forgot_password_expiry = None;
        user.updated_at = Utc::now();
        self.users.update(user).await
    }

    /// Change password for an authenticated caller.
    pub async fn change_password(
        &self,
        user_id: &str,
        old_password: &str,
        new_password: &str,
    ) -> ApiResult<()> {
        if new_password.is_empty() {
            return Err(ApiError::Validation("new password is required".into()));
        }
        let mut user = self.load(user_id).await?;
        if !self.hasher.verify(old_password, &user.password)? {
            return Err(ApiError::Unauthorized("invalid user credentials".into()));
        }
        user.password = self.hasher.hash(new_password)?;
        user.updated_at = Utc::now();
        self.users.update(user).await
    }

    pub async fn current_user(&self, user_id: &str) -> ApiResult<CurrentUser> {
        Ok(CurrentUser::from(&self.load(user_id).await?))
    }

    async fn load(&self, user_id: &str) -> ApiResult<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("user not found".into()))
    }

    async fn issue_and_store_pair(&self, user: &mut User) -> ApiResult<TokenPair> {
        let access_token = self.keys.issue_access(user)?;
        let refresh_token = self.keys.issue_refresh(user)?;
        user.refresh_token = Some(refresh_token.clone());
        user.updated_at = Utc::now();
        self.users.update(user.clone()).await?;
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Mail delivery is best effort; registration does not roll back
    /// on a sender failure.
    async fn send_mail(&self, to: &str, subject: &str, body: &str) {
        if let Err(e) = self.mailer.send(to, subject, body).await {
            warn!(to, subject, error = %e, "failed to send mail");
        }
    }
}
