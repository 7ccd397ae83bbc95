//! Chat domain service: chat/message mutations with authorization,
//! plus the event-publishing seam the gateway implements.
//!
//! Every mutation follows the same shape: load and authorize against
//! fresh state, apply the repository write, re-fetch the aggregated
//! view, then publish once per affected room before returning.

pub mod events;
pub mod service;

use async_trait::async_trait;

pub use service::ChatService;

/// Fire-and-forget push seam. A room with no current members silently
/// drops the event; delivery failure never affects the caller.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, room: &str, event: &str, payload: serde_json::Value);
}
