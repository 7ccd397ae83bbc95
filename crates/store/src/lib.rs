//! Persistence seam: document models, repository traits, and the
//! in-memory implementation used by the default wiring and the tests.
//!
//! The repository traits are the document-store boundary — a
//! driver-backed implementation slots in behind them without touching
//! the domain services.

pub mod memory;
pub mod model;
pub mod repo;

use std::sync::Arc;

pub use {
    memory::MemoryStore,
    model::{Attachment, Chat, ChatMessage, LoginType, User, UserRole},
    repo::{ChatRepository, ChatView, MessageRepository, MessageView, PublicUser, UserRepository},
};

/// Bundle of repository handles passed to the domain services.
#[derive(Clone)]
pub struct Store {
    pub users: Arc<dyn UserRepository>,
    pub chats: Arc<dyn ChatRepository>,
    pub messages: Arc<dyn MessageRepository>,
}

impl Store {
    /// All three repositories backed by one in-process store.
    pub fn in_memory() -> Self {
        let mem = Arc::new(MemoryStore::default());
        Self {
            users: Arc::clone(&mem) as Arc<dyn UserRepository>,
            chats: Arc::clone(&mem) as Arc<dyn ChatRepository>,
            messages: mem as Arc<dyn MessageRepository>,
        }
    }
}
