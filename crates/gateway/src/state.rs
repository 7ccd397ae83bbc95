use std::sync::Arc;

use {
    parley_auth::{AuthService, SessionAuthenticator},
    parley_chat::ChatService,
    parley_config::ParleyConfig,
    parley_media::BlobStore,
};

use crate::{rooms::RoomRegistry, ws::EventHandlers};

/// Shared handles for every request and socket. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ParleyConfig>,
    pub rooms: Arc<RoomRegistry>,
    pub handlers: Arc<EventHandlers>,
    pub authenticator: SessionAuthenticator,
    pub auth: Arc<AuthService>,
    pub chat: Arc<ChatService>,
    pub blobs: Arc<BlobStore>,
}
