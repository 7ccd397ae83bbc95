use {
    std::{collections::HashMap, future::Future, pin::Pin, sync::Arc, time::Duration},
    tokio::sync::mpsc,
};

use {
    axum::{
        extract::{
            State, WebSocketUpgrade,
            ws::{Message, WebSocket},
        },
        response::Response,
    },
    futures::{SinkExt, StreamExt, stream::SplitStream},
    serde_json::json,
    tracing::{debug, info, warn},
};

use parley_chat::events;

use crate::{
    events::{EventFrame, HandshakePayload},
    rooms::RoomRegistry,
    state::AppState,
};

/// How long a fresh connection gets to present its handshake frame.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

// ── Event dispatch ──────────────────────────────────────────────────────────

pub struct HandlerContext {
    pub conn_id: String,
    pub user_id: String,
    pub event: String,
    pub payload: serde_json::Value,
    pub rooms: Arc<RoomRegistry>,
}

type HandlerFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
type Handler = Box<dyn Fn(HandlerContext) -> HandlerFuture + Send + Sync>;

/// Finite event-name -> handler table, populated once at startup.
/// Dispatch is a map lookup; unknown events answer with `socketError`
/// on the offending connection only.
pub struct EventHandlers {
    map: HashMap<&'static str, Handler>,
}

fn handler<F, Fut>(f: F) -> Handler
where
    F: Fn(HandlerContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Box::new(move |ctx| Box::pin(f(ctx)))
}

impl EventHandlers {
    pub fn with_defaults() -> Self {
        let mut map: HashMap<&'static str, Handler> = HashMap::new();

        map.insert(
            events::JOIN_CHAT,
            handler(|ctx| async move {
                match ctx.payload.as_str() {
                    Some(chat_id) => {
                        ctx.rooms.join(&ctx.conn_id, chat_id);
                        debug!(user = %ctx.user_id, chat = %chat_id, "joined chat room");
                    }
                    None => socket_error(&ctx, "joinChat expects a chat id"),
                }
            }),
        );

        // Typing indicators are relayed to the chat room verbatim,
        // with no participant check and no persistence.
        map.insert(events::TYPING, handler(relay_to_chat_room));
        map.insert(events::STOP_TYPING, handler(relay_to_chat_room));

        Self { map }
    }

    /// Returns false when no handler is registered for the event.
    pub async fn dispatch(&self, event: &str, ctx: HandlerContext) -> bool {
        match self.map.get(event) {
            Some(handle) => {
                handle(ctx).await;
                true
            }
            None => false,
        }
    }
}

async fn relay_to_chat_room(ctx: HandlerContext) {
    let Some(chat_id) = ctx.payload.as_str().map(str::to_string) else {
        socket_error(&ctx, "expected a chat id payload");
        return;
    };
    ctx.rooms
        .broadcast(&chat_id, &EventFrame::new(&ctx.event, ctx.payload));
}

fn socket_error(ctx: &HandlerContext, message: &str) {
    ctx.rooms.send_to_connection(
        &ctx.conn_id,
        &EventFrame::new(events::SOCKET_ERROR, json!(message)),
    );
}

// ── Connection lifecycle ────────────────────────────────────────────────────

pub async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Full lifetime of one WebSocket connection.
///
/// The first client frame must carry `{ "token": ... }`. A failed
/// handshake answers `socketError` on this socket only and closes;
/// nothing is registered, so no room ever sees the connection. A
/// successful handshake registers the connection, joins the identity
/// room, and confirms with `connected`.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sink.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    let token = first_text_frame(&mut stream)
        .await
        .and_then(|raw| serde_json::from_str::<HandshakePayload>(&raw).ok())
        .and_then(|handshake| handshake.token);

    let claims = match state.authenticator.authenticate_handshake(token.as_deref()).await {
        Ok(claims) => claims,
        Err(err) => {
            warn!(error = %err, "websocket handshake rejected");
            let frame = EventFrame::new(events::SOCKET_ERROR, json!(err.to_string()));
            if let Some(encoded) = frame.encode() {
                let _ = tx.send(encoded);
            }
            drop(tx);
            let _ = writer.await;
            return;
        }
    };

    let conn_id = state.rooms.register(&claims.sub, tx);
    state.rooms.join(&conn_id, &claims.sub);
    state.rooms.broadcast(
        &claims.sub,
        &EventFrame::new(events::CONNECTED, json!({ "userId": claims.sub })),
    );
    info!(user = %claims.sub, conn = %conn_id, "websocket connected");

    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => {
                let Ok(frame) = serde_json::from_str::<EventFrame>(&text) else {
                    state.rooms.send_to_connection(
                        &conn_id,
                        &EventFrame::new(events::SOCKET_ERROR, json!("malformed event frame")),
                    );
                    continue;
                };
                let ctx = HandlerContext {
                    conn_id: conn_id.clone(),
                    user_id: claims.sub.clone(),
                    event: frame.event.clone(),
                    payload: frame.payload,
                    rooms: Arc::clone(&state.rooms),
                };
                if !state.handlers.dispatch(&frame.event, ctx).await {
                    state.rooms.send_to_connection(
                        &conn_id,
                        &EventFrame::new(
                            events::SOCKET_ERROR,
                            json!(format!("unknown event: {}", frame.event)),
                        ),
                    );
                }
            }
            Ok(Message::Close(_)) | Err(_) => break,
            // Pings are answered by axum; binary frames are ignored.
            Ok(_) => {}
        }
    }

    // Silent departure: no event is emitted for a disconnect.
    state.rooms.remove_connection(&conn_id);
    writer.abort();
    info!(user = %claims.sub, conn = %conn_id, "websocket disconnected");
}

async fn first_text_frame(stream: &mut SplitStream<WebSocket>) -> Option<String> {
    let wait = async {
        while let Some(Ok(message)) = stream.next().await {
            if let Message::Text(text) = message {
                return Some(text.to_string());
            }
        }
        None
    };
    tokio::time::timeout(HANDSHAKE_TIMEOUT, wait).await.ok()?
}
