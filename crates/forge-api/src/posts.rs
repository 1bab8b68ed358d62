use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use uuid::Uuid;

use forge_types::api::{
    CommentsResponse, CreateCommentRequest, CreatePostRequest, FeedResponse, LikeResponse,
};
use forge_types::models::{Comment, Post};

use crate::convert::{parse_db_timestamp, parse_db_uuid, user_summary};
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::state::AppState;

const FEED_LIMIT: u32 = 50;
const MAX_POST_LEN: usize = 5000;
const MAX_COMMENT_LEN: usize = 2000;

pub async fn feed(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let viewer = user.id.to_string();
    let rows = tokio::task::spawn_blocking(move || db.db.feed(&viewer, FEED_LIMIT)).await??;

    let posts = rows
        .into_iter()
        .map(|(post, author)| Post {
            id: parse_db_uuid(&post.id, "post"),
            author: user_summary(&author, &state.media_base),
            content: post.content,
            image_url: post.image_url,
            likes_count: post.likes_count,
            comments_count: post.comments_count,
            liked_by_me: post.liked_by_me,
            created_at: parse_db_timestamp(&post.created_at),
        })
        .collect();

    Ok(Json(FeedResponse {
        success: true,
        posts,
    }))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let content = req.content.trim().to_string();
    if content.is_empty() {
        return Err(ApiError::validation("post must not be empty"));
    }
    if content.len() > MAX_POST_LEN {
        return Err(ApiError::validation("post is too long"));
    }

    let post_id = Uuid::new_v4();

    let db = state.clone();
    let id = post_id.to_string();
    let author_id = user.id.to_string();
    let body = content.clone();
    let author = tokio::task::spawn_blocking(move || {
        db.db.insert_post(&id, &author_id, &body)?;
        db.db.get_user_by_id(&author_id)
    })
    .await??
    .ok_or(ApiError::NotFound("user"))?;

    let now = chrono::Utc::now();

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "post": Post {
                id: post_id,
                author: user_summary(&author, &state.media_base),
                content,
                image_url: None,
                likes_count: 0,
                comments_count: 0,
                liked_by_me: false,
                created_at: now,
            },
        })),
    ))
}

/// Like toggle; the denormalized counter moves with the edge.
pub async fn toggle_like(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let post_id = id.to_string();
    let user_id = user.id.to_string();
    let outcome = tokio::task::spawn_blocking(move || db.db.toggle_post_like(&post_id, &user_id))
        .await??
        .ok_or(ApiError::NotFound("post"))?;

    // Only a fresh like on someone else's post notifies the author.
    if outcome.liked && outcome.owner_id != user.id.to_string() {
        let db = state.clone();
        let owner = outcome.owner_id.clone();
        let username = user.username.clone();
        let related = id.to_string();
        tokio::task::spawn_blocking(move || {
            db.db.insert_notification(
                &owner,
                "like",
                "New like",
                &format!("{username} liked your post"),
                Some(&related),
            )
        })
        .await??;
    }

    Ok(Json(LikeResponse {
        success: true,
        action: if outcome.liked { "liked" } else { "unliked" }.to_string(),
        likes_count: outcome.likes_count,
    }))
}

pub async fn comments(
    State(state): State<AppState>,
    Extension(_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let post_id = id.to_string();
    let rows = tokio::task::spawn_blocking(move || {
        if !db.db.post_exists(&post_id)? {
            return Ok(None);
        }
        db.db.comments_for_post(&post_id).map(Some)
    })
    .await??
    .ok_or(ApiError::NotFound("post"))?;

    let comments = rows
        .into_iter()
        .map(|(comment, author)| Comment {
            id: parse_db_uuid(&comment.id, "comment"),
            post_id: parse_db_uuid(&comment.post_id, "post"),
            author: user_summary(&author, &state.media_base),
            content: comment.content,
            created_at: parse_db_timestamp(&comment.created_at),
        })
        .collect();

    Ok(Json(CommentsResponse {
        success: true,
        comments,
    }))
}

pub async fn create_comment(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let content = req.content.trim().to_string();
    if content.is_empty() {
        return Err(ApiError::validation("comment must not be empty"));
    }
    if content.len() > MAX_COMMENT_LEN {
        return Err(ApiError::validation("comment is too long"));
    }

    let comment_id = Uuid::new_v4();

    let db = state.clone();
    let cid = comment_id.to_string();
    let post_id = id.to_string();
    let author_id = user.id.to_string();
    let body = content.clone();
    let (owner, author) = tokio::task::spawn_blocking(move || {
        let Some(owner) = db.db.insert_comment(&cid, &post_id, &author_id, &body)? else {
            return Ok(None);
        };
        let author = db.db.get_user_by_id(&author_id)?;
        Ok::<_, anyhow::Error>(Some((owner, author)))
    })
    .await??
    .ok_or(ApiError::NotFound("post"))?;

    let author = author.ok_or(ApiError::NotFound("user"))?;

    if owner != user.id.to_string() {
        let db = state.clone();
        let username = user.username.clone();
        let related = id.to_string();
        tokio::task::spawn_blocking(move || {
            db.db.insert_notification(
                &owner,
                "comment",
                "New comment",
                &format!("{username} commented on your post"),
                Some(&related),
            )
        })
        .await??;
    }

    let now = chrono::Utc::now();

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "comment": Comment {
                id: comment_id,
                post_id: id,
                author: user_summary(&author, &state.media_base),
                content,
                created_at: now,
            },
        })),
    ))
}
