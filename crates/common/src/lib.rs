//! Shared types used across every parley crate: ids, the error
//! taxonomy, and the REST response envelope.

pub mod envelope;
pub mod error;

pub use {
    envelope::ApiResponse,
    error::{ApiError, ApiResult},
};

/// Mint a fresh entity id.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
