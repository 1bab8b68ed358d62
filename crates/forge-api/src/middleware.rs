use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "forge_session";

/// The authenticated user, injected into request extensions by
/// `require_auth`.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub username: String,
    pub role: String,
}

/// The raw session token, kept around so logout can revoke it.
#[derive(Debug, Clone)]
pub struct SessionToken(pub String);

/// Resolve the session cookie (or a bearer token for non-browser clients)
/// to a user, or reject with 401.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = jar
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .or_else(|| bearer_token(&req))
        .ok_or(ApiError::Unauthorized)?;

    let db = state.clone();
    let lookup = token.clone();
    let session = tokio::task::spawn_blocking(move || db.db.get_valid_session(&lookup))
        .await??
        .ok_or(ApiError::Unauthorized)?;

    let db = state.clone();
    let user = tokio::task::spawn_blocking(move || db.db.get_user_by_id(&session.user_id))
        .await??
        .ok_or(ApiError::Unauthorized)?;

    let id: Uuid = user
        .id
        .parse()
        .map_err(|e| ApiError::Database(anyhow::anyhow!("corrupt user id '{}': {e}", user.id)))?;

    req.extensions_mut().insert(CurrentUser {
        id,
        username: user.username,
        role: user.role,
    });
    req.extensions_mut().insert(SessionToken(token));

    Ok(next.run(req).await)
}

fn bearer_token(req: &Request) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.to_string())
}
