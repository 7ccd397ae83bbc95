use std::sync::Arc;

use {
    axum::{Json, Router, routing::get},
    serde_json::json,
    tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer},
    tracing::info,
};

use {
    parley_auth::{Argon2Hasher, AuthService, SessionAuthenticator, TokenKeys},
    parley_chat::{ChatService, EventPublisher},
    parley_common::ApiResult,
    parley_config::ParleyConfig,
    parley_mail::TracingMailer,
    parley_media::BlobStore,
    parley_store::Store,
};

use crate::{rooms::RoomRegistry, routes, state::AppState, ws};

/// Wire every collaborator from configuration. The room registry
/// doubles as the chat service's event publisher, closing the loop
/// between REST mutations and socket broadcasts.
pub fn build_state(config: ParleyConfig) -> ApiResult<AppState> {
    let store = Store::in_memory();
    let keys = Arc::new(TokenKeys::new(&config.auth.clone().with_env_overrides()));
    let rooms = Arc::new(RoomRegistry::new());
    let blobs = Arc::new(BlobStore::new(
        config.media.public_dir.as_str(),
        config.server.public_base_url.clone(),
    )?);

    let auth = Arc::new(AuthService::new(
        Arc::clone(&store.users),
        Arc::new(Argon2Hasher),
        Arc::clone(&keys),
        Arc::new(TracingMailer),
        config.server.public_base_url.clone(),
    ));
    let chat = Arc::new(ChatService::new(
        store.clone(),
        Arc::clone(&blobs),
        Arc::clone(&rooms) as Arc<dyn EventPublisher>,
    ));
    let authenticator = SessionAuthenticator::new(keys, Arc::clone(&store.users));

    Ok(AppState {
        config: Arc::new(config),
        rooms,
        handlers: Arc::new(ws::EventHandlers::with_defaults()),
        authenticator,
        auth,
        chat,
        blobs,
    })
}

/// Full router: REST surface, the socket upgrade, health, and the
/// static attachment directory.
pub fn build_app(state: AppState) -> Router {
    let images_dir = state.blobs.dir().to_path_buf();
    Router::new()
        .nest("/api/v1/users", routes::auth::router())
        .nest("/api/v1/chat-app/chats", routes::chat::router())
        .route("/ws", get(ws::ws_handler))
        .route("/health", get(health))
        .nest_service("/images", ServeDir::new(images_dir))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Bind and serve until the process is stopped.
pub async fn serve(config: ParleyConfig) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.server.bind, config.server.port);
    let state = build_state(config)?;
    let app = build_app(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "gateway listening");
    axum::serve(listener, app).await?;
    Ok(())
}
