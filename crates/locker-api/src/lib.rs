pub mod auth;
pub mod error;
pub mod files;
pub mod middleware;
pub mod state;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
};

pub use state::{AppState, AppStateInner};

/// All routes behind the session gate. The gate only resolves identity;
/// handlers that need a user extract [`middleware::Authenticated`].
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/health", get(health));

    let protected_routes = Router::new()
        .route("/files", get(files::list_files))
        .route("/files/{filename}", post(files::upload_file))
        .route("/file/{*filepath}", get(files::download_file))
        .route("/share", post(files::share_file));

    let body_limit = state.files.max_upload_bytes();

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::session_gate,
        ))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
