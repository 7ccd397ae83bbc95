//! End-to-end socket tests: a real listener, real WebSocket clients,
//! and the domain services driving broadcasts.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use {
    futures::{SinkExt, StreamExt},
    tokio::net::TcpStream,
    tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message},
};

use {
    parley_config::ParleyConfig,
    parley_gateway::{
        server::{build_app, build_state},
        state::AppState,
    },
};

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

const EVENT_WAIT: Duration = Duration::from_secs(5);
const SILENCE_WAIT: Duration = Duration::from_millis(300);

struct Harness {
    state: AppState,
    addr: String,
    _tmp: tempfile::TempDir,
}

async fn start() -> Harness {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = ParleyConfig::default();
    config.media.public_dir = tmp.path().join("images").to_string_lossy().into_owned();

    let state = build_state(config).unwrap();
    let app = build_app(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Harness {
        state,
        addr,
        _tmp: tmp,
    }
}

/// Registers and logs a user in, returning `(user_id, access_token)`.
async fn make_user(state: &AppState, username: &str) -> (String, String) {
    let email = format!("{username}@example.com");
    let user = state.auth.register(username, &email, "pw").await.unwrap();
    let (_, pair) = state.auth.login(username, "pw").await.unwrap();
    (user.id, pair.access_token)
}

async fn connect(addr: &str, token: &str) -> WsClient {
    let (mut ws, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    let handshake = serde_json::json!({ "token": token }).to_string();
    ws.send(Message::Text(handshake.into())).await.unwrap();
    ws
}

async fn next_event(ws: &mut WsClient) -> (String, serde_json::Value) {
    let frame = tokio::time::timeout(EVENT_WAIT, async {
        while let Some(Ok(message)) = ws.next().await {
            if let Message::Text(text) = message {
                return Some(text.to_string());
            }
        }
        None
    })
    .await
    .unwrap()
    .unwrap();
    let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
    (
        value["event"].as_str().unwrap().to_string(),
        value["payload"].clone(),
    )
}

/// Asserts that no frame arrives within a short window.
async fn assert_silent(ws: &mut WsClient) {
    let outcome = tokio::time::timeout(SILENCE_WAIT, ws.next()).await;
    assert!(outcome.is_err(), "expected no frame, got {outcome:?}");
}

async fn send_event(ws: &mut WsClient, event: &str, payload: serde_json::Value) {
    let frame = serde_json::json!({ "event": event, "payload": payload }).to_string();
    ws.send(Message::Text(frame.into())).await.unwrap();
}

#[tokio::test]
async fn handshake_with_valid_token_confirms_connected() {
    let h = start().await;
    let (user_id, token) = make_user(&h.state, "alice").await;

    let mut ws = connect(&h.addr, &token).await;
    let (event, payload) = next_event(&mut ws).await;
    assert_eq!(event, "connected");
    assert_eq!(payload["userId"], user_id);
}

#[tokio::test]
async fn handshake_with_invalid_token_answers_socket_error_and_closes() {
    let h = start().await;

    let mut ws = connect(&h.addr, "not-a-token").await;
    let (event, _) = next_event(&mut ws).await;
    assert_eq!(event, "socketError");

    // Nothing is registered; the server closes the stream.
    let trailing = tokio::time::timeout(EVENT_WAIT, async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(_))) => panic!("unexpected frame after rejection"),
                Some(Ok(_)) => continue,
                Some(Err(_)) | None => break,
            }
        }
    })
    .await;
    assert!(trailing.is_ok());
}

#[tokio::test]
async fn direct_chat_creation_reaches_only_the_other_identity_room() {
    let h = start().await;
    let (u1, t1) = make_user(&h.state, "alice").await;
    let (u2, t2) = make_user(&h.state, "bob").await;

    let mut ws1 = connect(&h.addr, &t1).await;
    let mut ws2 = connect(&h.addr, &t2).await;
    next_event(&mut ws1).await;
    next_event(&mut ws2).await;

    let (view, created) = h.state.chat.get_or_create_direct(&u1, &u2).await.unwrap();
    assert!(created);

    let (event, payload) = next_event(&mut ws2).await;
    assert_eq!(event, "newChat");
    assert_eq!(payload["id"], view.id);

    // The caller already has the chat in the response.
    assert_silent(&mut ws1).await;
}

#[tokio::test]
async fn messages_fan_out_to_every_joined_connection() {
    let h = start().await;
    let (u1, t1) = make_user(&h.state, "alice").await;
    let (u2, t2) = make_user(&h.state, "bob").await;

    let mut ws1 = connect(&h.addr, &t1).await;
    let mut ws2 = connect(&h.addr, &t2).await;
    next_event(&mut ws1).await;
    next_event(&mut ws2).await;

    let (view, _) = h.state.chat.get_or_create_direct(&u1, &u2).await.unwrap();
    next_event(&mut ws2).await; // newChat

    send_event(&mut ws1, "joinChat", serde_json::json!(view.id)).await;
    send_event(&mut ws2, "joinChat", serde_json::json!(view.id)).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    let message = h
        .state
        .chat
        .send_message(&u1, &view.id, Some("hello".into()), Vec::new())
        .await
        .unwrap();

    // Sender included: both members of the chat room get the event.
    for ws in [&mut ws1, &mut ws2] {
        let (event, payload) = next_event(ws).await;
        assert_eq!(event, "messageReceived");
        assert_eq!(payload["id"], message.id);
        assert_eq!(payload["content"], "hello");
    }
}

#[tokio::test]
async fn typing_indicator_is_relayed_to_the_chat_room() {
    let h = start().await;
    let (u1, t1) = make_user(&h.state, "alice").await;
    let (u2, t2) = make_user(&h.state, "bob").await;

    let mut ws1 = connect(&h.addr, &t1).await;
    let mut ws2 = connect(&h.addr, &t2).await;
    next_event(&mut ws1).await;
    next_event(&mut ws2).await;

    let (view, _) = h.state.chat.get_or_create_direct(&u1, &u2).await.unwrap();
    next_event(&mut ws2).await; // newChat

    send_event(&mut ws1, "joinChat", serde_json::json!(view.id)).await;
    send_event(&mut ws2, "joinChat", serde_json::json!(view.id)).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    send_event(&mut ws1, "typing", serde_json::json!(view.id)).await;

    let (event, payload) = next_event(&mut ws2).await;
    assert_eq!(event, "typing");
    assert_eq!(payload, serde_json::json!(view.id));
}

#[tokio::test]
async fn unknown_event_answers_socket_error_on_that_connection() {
    let h = start().await;
    let (_u1, t1) = make_user(&h.state, "alice").await;

    let mut ws = connect(&h.addr, &t1).await;
    next_event(&mut ws).await;

    send_event(&mut ws, "timeTravel", serde_json::Value::Null).await;
    let (event, payload) = next_event(&mut ws).await;
    assert_eq!(event, "socketError");
    assert!(payload.as_str().unwrap().contains("timeTravel"));
}

#[tokio::test]
async fn rest_login_sets_cookies_and_current_user_works() {
    let h = start().await;
    let client = reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .unwrap();
    let base = format!("http://{}", h.addr);

    let resp = client
        .post(format!("{base}/api/v1/users/register"))
        .json(&serde_json::json!({
            "username": "alice",
            "email": "alice@example.com",
            "password": "pw",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    let resp = client
        .post(format!("{base}/api/v1/users/login"))
        .json(&serde_json::json!({ "username": "alice", "password": "pw" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert!(body["data"]["accessToken"].as_str().is_some());

    // The cookie jar carries the access token from here on.
    let resp = client
        .get(format!("{base}/api/v1/users/current-user"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["username"], "alice");
}

#[tokio::test]
async fn rest_requests_without_credentials_are_rejected() {
    let h = start().await;
    let client = reqwest::Client::new();
    let resp = client
        .get(format!("http://{}/api/v1/chat-app/chats", h.addr))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
}
