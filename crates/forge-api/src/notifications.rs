use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;

use forge_types::api::{NotificationsResponse, UnreadCountResponse};
use forge_types::models::Notification;

use crate::convert::parse_db_timestamp;
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::state::AppState;

const PAGE_SIZE: u32 = 50;

pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let user_id = user.id.to_string();
    let rows =
        tokio::task::spawn_blocking(move || db.db.notifications_for(&user_id, PAGE_SIZE)).await??;

    let notifications = rows
        .into_iter()
        .map(|row| Notification {
            id: row.id,
            kind: row.kind,
            title: row.title,
            message: row.message,
            related_id: row.related_id,
            is_read: row.is_read,
            created_at: parse_db_timestamp(&row.created_at),
        })
        .collect();

    Ok(Json(NotificationsResponse {
        success: true,
        notifications,
    }))
}

/// The badge count, derived on every poll.
pub async fn unread_count(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let user_id = user.id.to_string();
    let count =
        tokio::task::spawn_blocking(move || db.db.unread_notification_count(&user_id)).await??;

    Ok(Json(UnreadCountResponse {
        success: true,
        count,
    }))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let user_id = user.id.to_string();
    let found =
        tokio::task::spawn_blocking(move || db.db.mark_notification_read(id, &user_id)).await??;

    if !found {
        return Err(ApiError::NotFound("notification"));
    }

    Ok(Json(json!({ "success": true })))
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let user_id = user.id.to_string();
    let updated =
        tokio::task::spawn_blocking(move || db.db.mark_all_notifications_read(&user_id)).await??;

    Ok(Json(json!({ "success": true, "updated": updated })))
}
