use axum::{
    Json,
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use bytes::Bytes;
use tokio_util::io::ReaderStream;
use tracing::info;

use locker_auth::Error;
use locker_types::api::{FileEntry, FileListResponse, ShareRequest, ShareResponse};

use crate::error::{ApiError, blocking};
use crate::middleware::Authenticated;
use crate::state::AppState;

/// POST /files/{filename}: raw body bytes become the caller's file.
pub async fn upload_file(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Path(filename): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let row = state.files.upload(&identity, &filename, &body).await?;
    Ok((StatusCode::CREATED, Json(FileEntry::from(row))))
}

/// GET /files: own files plus everything shared with the caller.
pub async fn list_files(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
) -> Result<impl IntoResponse, ApiError> {
    let username = identity.username.clone();
    let rows = blocking(move || state.files.list(&identity)).await?;

    Ok(Json(FileListResponse {
        username,
        files: rows.into_iter().map(FileEntry::from).collect(),
    }))
}

/// GET /file/{*filepath}: stream a file the caller holds a row for.
pub async fn download_file(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Path(filepath): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let st = state.clone();
    let row = blocking(move || st.files.authorize_download(&identity, &filepath)).await?;

    let file = state
        .files
        .storage()
        .open(&row.filepath)
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::NotFound,
            _ => Error::Storage(e),
        })?;
    let len = file.metadata().await.map_err(Error::Storage)?.len();

    info!("{} downloading {}", row.grantee, row.filepath);

    let body = Body::from_stream(ReaderStream::new(file));
    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_LENGTH, len.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", row.filename),
            ),
        ],
        body,
    ))
}

/// POST /share: grant another user access to one of the caller's files.
pub async fn share_file(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Json(req): Json<ShareRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let row = blocking(move || state.files.share(&identity, &req.username, &req.filename)).await?;

    Ok((
        StatusCode::CREATED,
        Json(ShareResponse {
            owner: row.owner,
            recipient: row.grantee,
            filename: row.filename,
        }),
    ))
}
