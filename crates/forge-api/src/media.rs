use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;
use tokio::io::AsyncWriteExt;
use tracing::error;
use uuid::Uuid;

use forge_types::media::media_url;

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// 5 MB upload limit for avatars
const MAX_AVATAR_SIZE: usize = 5 * 1024 * 1024;

/// POST /users/me/avatar — accepts raw image bytes, saves to
/// `{upload_dir}/avatars/{id}`, stores the relative path on the profile.
/// A file left orphaned by a failed profile update is tolerated.
pub async fn upload_avatar(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    bytes: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    if bytes.is_empty() {
        return Err(ApiError::validation("empty upload"));
    }
    if bytes.len() > MAX_AVATAR_SIZE {
        return Err(ApiError::PayloadTooLarge);
    }

    let file_id = Uuid::new_v4();
    let dir = state.upload_dir.join("avatars");

    tokio::fs::create_dir_all(&dir).await.map_err(|e| {
        error!("Failed to create upload directory {}: {}", dir.display(), e);
        ApiError::internal("upload failed")
    })?;

    let file_path = dir.join(file_id.to_string());
    let mut file = tokio::fs::File::create(&file_path).await.map_err(|e| {
        error!("Failed to create file {}: {}", file_path.display(), e);
        ApiError::internal("upload failed")
    })?;
    file.write_all(&bytes).await.map_err(|e| {
        error!("Failed to write file {}: {}", file_path.display(), e);
        ApiError::internal("upload failed")
    })?;

    let rel = format!("avatars/{file_id}");

    let db = state.clone();
    let user_id = user.id.to_string();
    let stored = rel.clone();
    tokio::task::spawn_blocking(move || db.db.set_profile_picture(&user_id, &stored)).await??;

    Ok(Json(json!({
        "success": true,
        "avatar_url": media_url(&state.media_base, &rel),
    })))
}

/// GET /media/avatars/{file_id} — streams the stored blob back.
pub async fn serve_avatar(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    // Only UUID names are ever written, so this doubles as a
    // path-traversal guard.
    let file_id: Uuid = file_id
        .parse()
        .map_err(|_| ApiError::validation("invalid file id"))?;

    let file_path = state.upload_dir.join("avatars").join(file_id.to_string());
    let bytes = tokio::fs::read(&file_path)
        .await
        .map_err(|_| ApiError::NotFound("file"))?;

    Ok((
        [(axum::http::header::CONTENT_TYPE, "application/octet-stream")],
        bytes,
    ))
}
