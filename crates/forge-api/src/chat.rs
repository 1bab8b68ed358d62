use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use forge_db::models::ChatMessageRow;
use forge_types::api::{
    ChatHistoryResponse, ConversationsResponse, MarkChatReadRequest, SendChatRequest,
    SendChatResponse,
};
use forge_types::models::{ChatMessage, Conversation};

use crate::convert::{parse_db_timestamp, parse_db_uuid, user_summary};
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::state::AppState;

const MAX_MESSAGE_LEN: usize = 2000;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub peer_id: Uuid,
    /// Polling cursor: 0 (the default) returns the full conversation,
    /// otherwise only rows with a greater id.
    #[serde(default)]
    pub last_id: i64,
}

pub async fn send(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<SendChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let text = req.message.trim().to_string();
    if text.is_empty() {
        return Err(ApiError::validation("message must not be empty"));
    }
    if text.len() > MAX_MESSAGE_LEN {
        return Err(ApiError::validation("message is too long"));
    }
    if req.receiver_id == user.id {
        return Err(ApiError::validation("cannot message yourself"));
    }

    let db = state.clone();
    let sender = user.id.to_string();
    let receiver = req.receiver_id.to_string();
    let username = user.username.clone();
    let row = tokio::task::spawn_blocking(move || {
        if db.db.get_user_by_id(&receiver)?.is_none() {
            return Ok(None);
        }
        let row = db.db.insert_chat_message(&sender, &receiver, &text)?;
        db.db.insert_notification(
            &receiver,
            "message",
            "New message",
            &format!("{username} sent you a message"),
            Some(&sender),
        )?;
        Ok::<_, anyhow::Error>(Some(row))
    })
    .await??
    .ok_or(ApiError::NotFound("user"))?;

    Ok((
        StatusCode::CREATED,
        Json(SendChatResponse {
            success: true,
            message: message_model(row),
        }),
    ))
}

pub async fn history(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<HistoryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let user_id = user.id.to_string();
    let peer_id = query.peer_id.to_string();
    let rows = tokio::task::spawn_blocking(move || {
        db.db.conversation_messages(&user_id, &peer_id, query.last_id)
    })
    .await??;

    Ok(Json(ChatHistoryResponse {
        success: true,
        messages: rows.into_iter().map(message_model).collect(),
    }))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<MarkChatReadRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let user_id = user.id.to_string();
    let peer_id = req.peer_id.to_string();
    let updated =
        tokio::task::spawn_blocking(move || db.db.mark_conversation_read(&user_id, &peer_id))
            .await??;

    Ok(Json(json!({ "success": true, "updated": updated })))
}

/// The chat sidebar: one entry per peer, newest conversation first.
pub async fn conversations(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let user_id = user.id.to_string();
    let rows = tokio::task::spawn_blocking(move || db.db.conversations_for(&user_id)).await??;

    let conversations = rows
        .into_iter()
        .map(|(conv, peer)| Conversation {
            peer: user_summary(&peer, &state.media_base),
            last_message: conv.last_message,
            last_message_at: parse_db_timestamp(&conv.last_created_at),
            unread: conv.unread,
        })
        .collect();

    Ok(Json(ConversationsResponse {
        success: true,
        conversations,
    }))
}

fn message_model(row: ChatMessageRow) -> ChatMessage {
    ChatMessage {
        id: row.id,
        sender_id: parse_db_uuid(&row.sender_id, "user"),
        receiver_id: parse_db_uuid(&row.receiver_id, "user"),
        message: row.message_text,
        is_read: row.is_read,
        created_at: parse_db_timestamp(&row.created_at),
    }
}
