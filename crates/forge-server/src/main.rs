use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use forge_api::middleware::require_auth;
use forge_api::state::{AppState, AppStateInner};
use forge_api::{auth, chat, meal_plans, media, notifications, posts, recipes, users};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "forge=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let host = std::env::var("FORGE_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("FORGE_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let db_path = std::env::var("FORGE_DB_PATH").unwrap_or_else(|_| "forge.db".into());
    let upload_dir: PathBuf = std::env::var("FORGE_UPLOAD_DIR")
        .unwrap_or_else(|_| "./uploads".into())
        .into();
    let media_base = std::env::var("FORGE_MEDIA_BASE").unwrap_or_else(|_| "/media".into());

    // Init database
    let db = forge_db::Database::open(&PathBuf::from(&db_path))?;

    // Shared state
    let state: AppState = Arc::new(AppStateInner {
        db,
        upload_dir,
        media_base,
    });

    // Routes
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/media/avatars/{file_id}", get(media::serve_avatar))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/users/me", get(users::me).put(users::update_me))
        .route(
            "/users/me/avatar",
            post(media::upload_avatar).layer(DefaultBodyLimit::max(8 * 1024 * 1024)),
        )
        .route("/users", get(users::list))
        .route("/users/{id}", get(users::profile))
        .route("/users/{id}/follow", post(users::toggle_follow))
        .route("/recipes", get(recipes::list).post(recipes::create))
        .route("/recipes/search", post(recipes::search))
        .route("/recipes/saved", get(recipes::saved))
        .route("/recipes/{id}", get(recipes::get))
        .route("/recipes/{id}/save", post(recipes::toggle_save))
        .route(
            "/meal-plans",
            get(meal_plans::week)
                .post(meal_plans::add)
                .delete(meal_plans::remove),
        )
        .route("/chat/messages", post(chat::send).get(chat::history))
        .route("/chat/read", post(chat::mark_read))
        .route("/chat/conversations", get(chat::conversations))
        .route("/posts", get(posts::feed).post(posts::create))
        .route("/posts/{id}/like", post(posts::toggle_like))
        .route(
            "/posts/{id}/comments",
            get(posts::comments).post(posts::create_comment),
        )
        .route("/notifications", get(notifications::list))
        .route("/notifications/count", get(notifications::unread_count))
        .route("/notifications/{id}/read", post(notifications::mark_read))
        .route("/notifications/read-all", post(notifications::mark_all_read))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Flavor Forge server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
