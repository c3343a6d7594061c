use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use locker_auth::Error;

/// Core error rendered as a status code and a short plain-text body.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            Error::AlreadyExists => StatusCode::CONFLICT,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::InvalidCredential => StatusCode::UNAUTHORIZED,
            Error::InvalidName | Error::SelfShare => StatusCode::BAD_REQUEST,
            Error::Forbidden => StatusCode::FORBIDDEN,
            Error::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Error::Hashing(_) | Error::Persistence(_) | Error::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            // internals stay in the log
            error!("{}", self.0);
            return (status, "internal server error").into_response();
        }
        (status, self.0.to_string()).into_response()
    }
}

/// Run a blocking core call off the async runtime.
pub async fn blocking<F, T>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> locker_auth::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::Persistence(anyhow::anyhow!("spawn_blocking join error: {}", e)))?
        .map_err(ApiError::from)
}
