//! Chat and message routes under `/api/v1/chat-app/chats`. All of them
//! require an authenticated caller; authorization beyond that (group
//! membership, admin) lives in the domain service.

use {
    axum::{
        Json, Router,
        extract::{Multipart, Path, State},
        http::StatusCode,
        routing::{delete, get, post},
    },
    serde::Deserialize,
};

use {
    parley_common::{ApiError, ApiResponse},
    parley_store::{Attachment, ChatView, MessageView, PublicUser},
};

use crate::{error::AppResult, extract::AuthedUser, state::AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_chats))
        .route("/users", get(available_users))
        .route("/c/{receiver_id}", post(create_or_get_direct))
        .route("/remove/{chat_id}", delete(delete_direct))
        .route("/group", post(create_group))
        .route(
            "/group/{chat_id}",
            get(group_details).patch(rename_group).delete(delete_group),
        )
        .route(
            "/group/{chat_id}/{participant_id}",
            post(add_participant).delete(remove_participant),
        )
        .route("/leave/group/{chat_id}", delete(leave_group))
        .route("/messages/{chat_id}", get(list_messages).post(send_message))
}

#[derive(Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
    pub participants: Vec<String>,
}

#[derive(Deserialize)]
pub struct RenameGroupRequest {
    pub name: String,
}

// ── Chats ───────────────────────────────────────────────────────────────────

async fn list_chats(
    State(state): State<AppState>,
    AuthedUser(claims): AuthedUser,
) -> AppResult<Json<ApiResponse<Vec<ChatView>>>> {
    let chats = state.chat.list_chats(&claims.sub).await?;
    Ok(Json(ApiResponse::ok("user chats fetched", chats)))
}

async fn available_users(
    State(state): State<AppState>,
    AuthedUser(claims): AuthedUser,
) -> AppResult<Json<ApiResponse<Vec<PublicUser>>>> {
    let users = state.chat.available_users(&claims.sub).await?;
    Ok(Json(ApiResponse::ok("users fetched", users)))
}

/// Idempotent: 201 with the new chat on first request for a pair, 200
/// with the existing chat afterwards.
async fn create_or_get_direct(
    State(state): State<AppState>,
    AuthedUser(claims): AuthedUser,
    Path(receiver_id): Path<String>,
) -> AppResult<(StatusCode, Json<ApiResponse<ChatView>>)> {
    let (view, created) = state
        .chat
        .get_or_create_direct(&claims.sub, &receiver_id)
        .await?;
    let response = if created {
        (
            StatusCode::CREATED,
            Json(ApiResponse::created("chat created", view)),
        )
    } else {
        (StatusCode::OK, Json(ApiResponse::ok("chat fetched", view)))
    };
    Ok(response)
}

async fn delete_direct(
    State(state): State<AppState>,
    AuthedUser(claims): AuthedUser,
    Path(chat_id): Path<String>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    state.chat.delete_direct(&claims.sub, &chat_id).await?;
    Ok(Json(ApiResponse::message_only("chat deleted")))
}

// ── Groups ──────────────────────────────────────────────────────────────────

async fn create_group(
    State(state): State<AppState>,
    AuthedUser(claims): AuthedUser,
    Json(body): Json<CreateGroupRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<ChatView>>)> {
    let view = state
        .chat
        .create_group(&claims.sub, &body.name, &body.participants)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::created("group chat created", view)),
    ))
}

async fn group_details(
    State(state): State<AppState>,
    AuthedUser(claims): AuthedUser,
    Path(chat_id): Path<String>,
) -> AppResult<Json<ApiResponse<ChatView>>> {
    let view = state.chat.group_details(&claims.sub, &chat_id).await?;
    Ok(Json(ApiResponse::ok("group chat fetched", view)))
}

async fn rename_group(
    State(state): State<AppState>,
    AuthedUser(claims): AuthedUser,
    Path(chat_id): Path<String>,
    Json(body): Json<RenameGroupRequest>,
) -> AppResult<Json<ApiResponse<ChatView>>> {
    let view = state
        .chat
        .rename_group(&claims.sub, &chat_id, &body.name)
        .await?;
    Ok(Json(ApiResponse::ok("group name updated", view)))
}

async fn delete_group(
    State(state): State<AppState>,
    AuthedUser(claims): AuthedUser,
    Path(chat_id): Path<String>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    state.chat.delete_group(&claims.sub, &chat_id).await?;
    Ok(Json(ApiResponse::message_only("group chat deleted")))
}

async fn add_participant(
    State(state): State<AppState>,
    AuthedUser(claims): AuthedUser,
    Path((chat_id, participant_id)): Path<(String, String)>,
) -> AppResult<Json<ApiResponse<ChatView>>> {
    let view = state
        .chat
        .add_participant(&claims.sub, &chat_id, &participant_id)
        .await?;
    Ok(Json(ApiResponse::ok("participant added", view)))
}

async fn remove_participant(
    State(state): State<AppState>,
    AuthedUser(claims): AuthedUser,
    Path((chat_id, participant_id)): Path<(String, String)>,
) -> AppResult<Json<ApiResponse<ChatView>>> {
    let view = state
        .chat
        .remove_participant(&claims.sub, &chat_id, &participant_id)
        .await?;
    Ok(Json(ApiResponse::ok("participant removed", view)))
}

async fn leave_group(
    State(state): State<AppState>,
    AuthedUser(claims): AuthedUser,
    Path(chat_id): Path<String>,
) -> AppResult<Json<ApiResponse<ChatView>>> {
    let view = state.chat.leave_group(&claims.sub, &chat_id).await?;
    Ok(Json(ApiResponse::ok("left group chat", view)))
}

// ── Messages ────────────────────────────────────────────────────────────────

async fn list_messages(
    State(state): State<AppState>,
    AuthedUser(claims): AuthedUser,
    Path(chat_id): Path<String>,
) -> AppResult<Json<ApiResponse<Vec<MessageView>>>> {
    let messages = state.chat.messages(&claims.sub, &chat_id).await?;
    Ok(Json(ApiResponse::ok("messages fetched", messages)))
}

/// Multipart body: an optional `content` text field plus any number of
/// `attachments` file fields. Blobs are written before the message is
/// persisted; a rejected message can leave orphan files behind.
async fn send_message(
    State(state): State<AppState>,
    AuthedUser(claims): AuthedUser,
    Path(chat_id): Path<String>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<ApiResponse<MessageView>>)> {
    let mut content: Option<String> = None;
    let mut attachments: Vec<Attachment> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("invalid multipart body: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("content") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::Validation(format!("invalid content field: {e}")))?;
                content = Some(text);
            }
            Some("attachments") => {
                let filename = field.file_name().unwrap_or("attachment").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Validation(format!("invalid attachment: {e}")))?;
                let blob = state.blobs.store(&bytes, &filename).await?;
                attachments.push(Attachment {
                    url: blob.url,
                    local_path: blob.local_path,
                });
            }
            _ => {}
        }
    }

    let message = state
        .chat
        .send_message(&claims.sub, &chat_id, content, attachments)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::created("message sent", message)),
    ))
}
