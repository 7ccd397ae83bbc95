use {
    chrono::{Duration, Utc},
    jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation},
    rand::RngCore,
    sha2::{Digest, Sha256},
};

use {
    parley_common::{ApiError, ApiResult},
    parley_config::schema::AuthConfig,
    parley_store::User,
};

use crate::claims::Claims;

/// Issues and verifies access/refresh tokens. Access and refresh use
/// separate secrets, so a refresh token never passes access
/// verification and vice versa.
pub struct TokenKeys {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenKeys {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(config.access_token_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.access_token_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.refresh_token_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.refresh_token_secret.as_bytes()),
            access_ttl: Duration::minutes(config.access_token_ttl_minutes),
            refresh_ttl: Duration::days(config.refresh_token_ttl_days),
        }
    }

    pub fn issue_access(&self, user: &User) -> ApiResult<String> {
        self.issue(user, "access", self.access_ttl, &self.access_encoding)
    }

    pub fn issue_refresh(&self, user: &User) -> ApiResult<String> {
        self.issue(user, "refresh", self.refresh_ttl, &self.refresh_encoding)
    }

    fn issue(
        &self,
        user: &User,
        token_type: &str,
        ttl: Duration,
        key: &EncodingKey,
    ) -> ApiResult<String> {
        let now = Utc::now();
        let claims = Claims {
            jti: parley_common::new_id(),
            sub: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            token_type: token_type.into(),
        };
        jsonwebtoken::encode(&Header::default(), &claims, key).map_err(ApiError::internal)
    }

    /// Verify signature + expiry of an access token.
    pub fn verify_access(&self, token: &str) -> ApiResult<Claims> {
        let claims = decode(token, &self.access_decoding)?;
        if !claims.is_access() {
            return Err(ApiError::Unauthorized("invalid access token".into()));
        }
        Ok(claims)
    }

    /// Verify signature + expiry of a refresh token.
    pub fn verify_refresh(&self, token: &str) -> ApiResult<Claims> {
        let claims = decode(token, &self.refresh_decoding)?;
        if !claims.is_refresh() {
            return Err(ApiError::Unauthorized("invalid refresh token".into()));
        }
        Ok(claims)
    }
}

fn decode(token: &str, key: &DecodingKey) -> ApiResult<Claims> {
    jsonwebtoken::decode::<Claims>(token, key, &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| ApiError::Unauthorized(e.to_string()))
}

// ── Temporary one-shot tokens ────────────────────────────────────────────────

/// Lifetime of email-verification and password-reset tokens.
pub const TEMP_TOKEN_TTL_MINUTES: i64 = 20;

/// Random one-shot token: the unhashed value goes into the mail link,
/// only the digest is persisted.
pub fn generate_temporary_token() -> (String, String, chrono::DateTime<Utc>) {
    let mut bytes = [0u8; 20];
    rand::thread_rng().fill_bytes(&mut bytes);
    let unhashed = hex::encode(bytes);
    let digest = digest_of(&unhashed);
    let expiry = Utc::now() + Duration::minutes(TEMP_TOKEN_TTL_MINUTES);
    (unhashed, digest, expiry)
}

pub fn digest_of(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
