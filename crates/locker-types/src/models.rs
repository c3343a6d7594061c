use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An authenticated caller, resolved from a valid session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub username: String,
}

impl Identity {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_digest: String,
    pub salt: String,
}

/// A stored login session. Only the SHA-256 of the bearer token is kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub username: String,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Expired sessions are those whose expiry lies strictly before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// One (owner, grantee, filename, filepath) tuple. `owner == grantee` is the
/// uploader's own copy, anything else is a sharing grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAccessRow {
    pub owner: String,
    pub grantee: String,
    pub filename: String,
    pub filepath: String,
}

impl FileAccessRow {
    pub fn is_grant(&self) -> bool {
        self.owner != self.grantee
    }
}
