use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use rand::RngCore;
use serde_json::json;
use uuid::Uuid;

use forge_db::models::UserRow;
use forge_types::api::{AuthResponse, LoginRequest, RegisterRequest};

use crate::convert::user_profile;
use crate::error::ApiError;
use crate::middleware::{CurrentUser, SESSION_COOKIE, SessionToken};
use crate::state::AppState;

const SESSION_TTL_DAYS: i64 = 30;

const AVATAR_COLORS: [&str; 8] = [
    "#e74c3c", "#e67e22", "#f1c40f", "#2ecc71", "#1abc9c", "#3498db", "#9b59b6", "#fd79a8",
];

pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Validate input
    if req.username.len() < 3 || req.username.len() > 32 {
        return Err(ApiError::validation("username must be 3-32 characters"));
    }
    if req.password.len() < 8 {
        return Err(ApiError::validation("password must be at least 8 characters"));
    }
    if !req.email.contains('@') || req.email.len() > 255 {
        return Err(ApiError::validation("invalid email address"));
    }
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::validation("name must not be empty"));
    }

    let db = state.clone();
    let username = req.username.clone();
    if tokio::task::spawn_blocking(move || db.db.get_user_by_username(&username))
        .await??
        .is_some()
    {
        return Err(ApiError::conflict("username already taken"));
    }

    let db = state.clone();
    let email = req.email.clone();
    if tokio::task::spawn_blocking(move || db.db.get_user_by_email(&email))
        .await??
        .is_some()
    {
        return Err(ApiError::conflict("email already registered"));
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| ApiError::Database(anyhow::anyhow!("password hashing failed: {e}")))?
        .to_string();

    let user_id = Uuid::new_v4();
    let row = UserRow {
        id: user_id.to_string(),
        username: req.username.clone(),
        email: req.email.clone(),
        password: password_hash,
        name: name.clone(),
        initials: initials_for(&name),
        avatar_color: avatar_color_for(&req.username).to_string(),
        profile_picture: None,
        role: "user".to_string(),
        status: "online".to_string(),
        created_at: String::new(),
    };

    let db = state.clone();
    let insert = row.clone();
    tokio::task::spawn_blocking(move || db.db.create_user(&insert)).await??;

    let jar = open_session(&state, &row.id, jar).await?;

    // The row's created_at came back from the database default; refetch for
    // an accurate profile.
    let db = state.clone();
    let id = row.id.clone();
    let stored = tokio::task::spawn_blocking(move || db.db.get_user_by_id(&id))
        .await??
        .ok_or(ApiError::NotFound("user"))?;

    Ok((
        StatusCode::CREATED,
        jar,
        Json(AuthResponse {
            success: true,
            user: user_profile(&stored, &state.media_base),
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let handle = req.username.clone();
    let user = tokio::task::spawn_blocking(move || {
        // The login field takes the username or the account email.
        match db.db.get_user_by_username(&handle)? {
            Some(user) => Ok(Some(user)),
            None => db.db.get_user_by_email(&handle),
        }
    })
    .await??
    .ok_or(ApiError::Unauthorized)?;

    // Verify password
    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| ApiError::Database(anyhow::anyhow!("corrupt password hash: {e}")))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthorized)?;

    let db = state.clone();
    let id = user.id.clone();
    tokio::task::spawn_blocking(move || {
        db.db.purge_expired_sessions()?;
        db.db.set_user_status(&id, "online")
    })
    .await??;

    let jar = open_session(&state, &user.id, jar).await?;

    let mut user = user;
    user.status = "online".to_string();

    Ok((
        jar,
        Json(AuthResponse {
            success: true,
            user: user_profile(&user, &state.media_base),
        }),
    ))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Extension(SessionToken(token)): Extension<SessionToken>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let id = user.id.to_string();
    tokio::task::spawn_blocking(move || {
        db.db.delete_session(&token)?;
        db.db.set_user_status(&id, "offline")
    })
    .await??;

    let jar = jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/").build());
    Ok((jar, Json(json!({ "success": true }))))
}

/// Create a session row and return the jar with the session cookie set.
async fn open_session(state: &AppState, user_id: &str, jar: CookieJar) -> Result<CookieJar, ApiError> {
    let token = new_session_token();
    let expires_at = (chrono::Utc::now() + chrono::Duration::days(SESSION_TTL_DAYS))
        .format("%Y-%m-%d %H:%M:%S")
        .to_string();

    let db = state.clone();
    let stored = token.clone();
    let uid = user_id.to_string();
    tokio::task::spawn_blocking(move || db.db.create_session(&stored, &uid, &expires_at)).await??;

    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    Ok(jar.add(cookie))
}

fn new_session_token() -> String {
    let mut raw = [0u8; 32];
    rand::rng().fill_bytes(&mut raw);
    hex::encode(raw)
}

/// First letters of the first two words of the display name, uppercased.
pub(crate) fn initials_for(name: &str) -> String {
    let initials: String = name
        .split_whitespace()
        .take(2)
        .filter_map(|word| word.chars().next())
        .flat_map(|c| c.to_uppercase())
        .collect();
    if initials.is_empty() {
        "?".to_string()
    } else {
        initials
    }
}

/// Stable palette pick keyed on the username, so the fallback avatar color
/// never changes between sessions.
fn avatar_color_for(username: &str) -> &'static str {
    let sum: usize = username.bytes().map(usize::from).sum();
    AVATAR_COLORS[sum % AVATAR_COLORS.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initials_take_the_first_two_words() {
        assert_eq!(initials_for("Alice Liddell"), "AL");
        assert_eq!(initials_for("Alice Pleasance Liddell"), "AP");
        assert_eq!(initials_for("alice"), "A");
        assert_eq!(initials_for("  "), "?");
    }

    #[test]
    fn avatar_color_is_stable_and_in_palette() {
        let first = avatar_color_for("alice");
        assert_eq!(avatar_color_for("alice"), first);
        assert!(AVATAR_COLORS.contains(&first));
    }

    #[test]
    fn session_tokens_are_long_and_unique() {
        let a = new_session_token();
        let b = new_session_token();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
    }
}
