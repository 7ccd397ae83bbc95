//! Credential handling and account flows: signed access/refresh
//! tokens, password hashing, one-shot temporary tokens, the session
//! authenticator shared by the REST layer and the event gateway, and
//! the account service (register/login/refresh/verification/reset).

pub mod claims;
pub mod password;
pub mod service;
pub mod session;
pub mod tokens;

pub use {
    claims::Claims,
    password::{Argon2Hasher, CredentialHasher},
    service::{AuthService, CurrentUser, TokenPair},
    session::SessionAuthenticator,
    tokens::TokenKeys,
};
