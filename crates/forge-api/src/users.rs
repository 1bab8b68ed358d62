use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;
use uuid::Uuid;

use forge_types::api::{ProfileResponse, ToggleResponse, UpdateProfileRequest, UsersResponse};

use crate::auth::initials_for;
use crate::convert::{user_profile, user_summary};
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::state::AppState;

pub async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let id = user.id.to_string();
    let row = tokio::task::spawn_blocking(move || db.db.get_user_by_id(&id))
        .await??
        .ok_or(ApiError::NotFound("user"))?;

    Ok(Json(json!({
        "success": true,
        "user": user_profile(&row, &state.media_base),
    })))
}

pub async fn update_me(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let id = user.id.to_string();
    let current = tokio::task::spawn_blocking(move || db.db.get_user_by_id(&id))
        .await??
        .ok_or(ApiError::NotFound("user"))?;

    let name = match req.name {
        Some(name) => {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(ApiError::validation("name must not be empty"));
            }
            name
        }
        None => current.name.clone(),
    };
    let email = match req.email {
        Some(email) => {
            if !email.contains('@') || email.len() > 255 {
                return Err(ApiError::validation("invalid email address"));
            }
            email
        }
        None => current.email.clone(),
    };

    let initials = initials_for(&name);

    let db = state.clone();
    let id = user.id.to_string();
    let (new_name, new_initials, new_email) = (name.clone(), initials.clone(), email.clone());
    tokio::task::spawn_blocking(move || {
        db.db
            .update_user_profile(&id, &new_name, &new_initials, &new_email)
    })
    .await??;

    let mut updated = current;
    updated.name = name;
    updated.initials = initials;
    updated.email = email;

    Ok(Json(json!({
        "success": true,
        "user": user_profile(&updated, &state.media_base),
    })))
}

/// The chat-sidebar directory: everyone but the viewer.
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let id = user.id.to_string();
    let rows = tokio::task::spawn_blocking(move || db.db.list_users_except(&id)).await??;

    Ok(Json(UsersResponse {
        success: true,
        users: rows
            .iter()
            .map(|row| user_summary(row, &state.media_base))
            .collect(),
    }))
}

pub async fn profile(
    State(state): State<AppState>,
    Extension(_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let lookup = id.to_string();
    let (row, stats) = tokio::task::spawn_blocking(move || {
        let row = db.db.get_user_by_id(&lookup)?;
        let stats = db.db.profile_stats(&lookup)?;
        Ok::<_, anyhow::Error>((row, stats))
    })
    .await??;

    let row = row.ok_or(ApiError::NotFound("user"))?;
    let (followers, following, posts) = stats;

    Ok(Json(ProfileResponse {
        success: true,
        user: user_summary(&row, &state.media_base),
        followers,
        following,
        posts,
    }))
}

pub async fn toggle_follow(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    if id == user.id {
        return Err(ApiError::validation("cannot follow yourself"));
    }

    let db = state.clone();
    let target = id.to_string();
    let follower = user.id.to_string();
    let followed = tokio::task::spawn_blocking(move || {
        if db.db.get_user_by_id(&target)?.is_none() {
            return Ok(None);
        }
        db.db.toggle_follow(&follower, &target).map(Some)
    })
    .await??
    .ok_or(ApiError::NotFound("user"))?;

    if followed {
        let db = state.clone();
        let target = id.to_string();
        let username = user.username.clone();
        let related = user.id.to_string();
        tokio::task::spawn_blocking(move || {
            db.db.insert_notification(
                &target,
                "follow",
                "New follower",
                &format!("{username} started following you"),
                Some(&related),
            )
        })
        .await??;
    }

    Ok(Json(ToggleResponse {
        success: true,
        action: if followed { "followed" } else { "unfollowed" }.to_string(),
    }))
}
