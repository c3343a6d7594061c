use axum::{
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use tracing::error;

use locker_auth::{Identity, SESSION_COOKIE};

use crate::state::AppState;

/// Outcome of the session gate, attached to every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticated(Identity),
}

/// Resolve the session cookie to an identity and pass the request on.
/// Never rejects: a missing, unknown or expired token just leaves the
/// request unauthenticated.
pub async fn session_gate(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let auth = match jar.get(SESSION_COOKIE) {
        Some(cookie) => {
            let token = cookie.value().to_string();
            let st = state.clone();
            match tokio::task::spawn_blocking(move || st.sessions.validate(&token)).await {
                Ok(Some(identity)) => AuthState::Authenticated(identity),
                Ok(None) => AuthState::Unauthenticated,
                Err(e) => {
                    error!("spawn_blocking join error: {}", e);
                    AuthState::Unauthenticated
                }
            }
        }
        None => AuthState::Unauthenticated,
    };

    req.extensions_mut().insert(auth);
    next.run(req).await
}

/// Extractor for routes that need a logged-in user. Rejects with 401.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Identity);

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<AuthState>() {
            Some(AuthState::Authenticated(identity)) => Ok(Self(identity.clone())),
            _ => Err(StatusCode::UNAUTHORIZED),
        }
    }
}
