use serde::{Deserialize, Serialize};

use crate::models::FileAccessRow;

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub username: String,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

// -- Files --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    pub filename: String,
    pub owner: String,
    pub filepath: String,
    pub shared: bool,
}

impl From<FileAccessRow> for FileEntry {
    fn from(row: FileAccessRow) -> Self {
        let shared = row.is_grant();
        Self {
            filename: row.filename,
            owner: row.owner,
            filepath: row.filepath,
            shared,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FileListResponse {
    pub username: String,
    pub files: Vec<FileEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShareRequest {
    /// Recipient of the grant.
    pub username: String,
    pub filename: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShareResponse {
    pub owner: String,
    pub recipient: String,
    pub filename: String,
}
