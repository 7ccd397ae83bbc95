use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

use parley_common::{ApiError, ApiResult};

/// Password hashing seam: `hash(secret) -> digest`,
/// `verify(secret, digest) -> bool`.
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, secret: &str) -> ApiResult<String>;
    fn verify(&self, secret: &str, digest: &str) -> ApiResult<bool>;
}

/// Argon2id with default parameters.
#[derive(Debug, Default, Clone)]
pub struct Argon2Hasher;

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, secret: &str) -> ApiResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(secret.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| ApiError::Internal(Box::new(e)))
    }

    fn verify(&self, secret: &str, digest: &str) -> ApiResult<bool> {
        let parsed = PasswordHash::new(digest).map_err(|e| ApiError::Internal(Box::new(e)))?;
        Ok(Argon2::default()
            .verify_password(secret.as_bytes(), &parsed)
            .is_ok())
    }
}
