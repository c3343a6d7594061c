use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use time::OffsetDateTime;
use tracing::error;

use locker_auth::{SESSION_COOKIE, SessionToken};
use locker_types::api::{LoginRequest, RegisterRequest, SessionResponse};

use crate::error::{ApiError, blocking};
use crate::state::AppState;

/// POST /auth/register: create the user and log them in.
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let token =
        blocking(move || state.credentials.register(&req.username, &req.password)).await?;

    Ok((
        StatusCode::CREATED,
        jar.add(session_cookie(&token)),
        Json(session_response(token)),
    ))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let token =
        blocking(move || state.credentials.authenticate(&req.username, &req.password)).await?;

    Ok((jar.add(session_cookie(&token)), Json(session_response(token))))
}

/// POST /auth/logout: drop every session of the cookie's user. The cookie
/// is cleared even when the delete fails.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Response {
    let token = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());
    let jar = jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/"));

    let Some(token) = token else {
        return (jar, Redirect::to("/")).into_response();
    };

    match blocking(move || state.sessions.revoke(&token)).await {
        Ok(_) => (jar, Redirect::to("/")).into_response(),
        Err(e) => {
            error!("Logout failed to delete sessions: {}", e.0);
            (StatusCode::INTERNAL_SERVER_ERROR, jar, "logout failed").into_response()
        }
    }
}

pub fn session_cookie(token: &SessionToken) -> Cookie<'static> {
    let expires = OffsetDateTime::from_unix_timestamp(token.expires_at.timestamp())
        .unwrap_or_else(|_| OffsetDateTime::now_utc());

    Cookie::build((SESSION_COOKIE, token.value.clone()))
        .expires(expires)
        .same_site(SameSite::Strict)
        .http_only(true)
        .path("/")
        .build()
}

fn session_response(token: SessionToken) -> SessionResponse {
    SessionResponse {
        username: token.username,
        expires_at: token.expires_at,
    }
}
