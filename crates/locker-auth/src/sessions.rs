use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use locker_types::models::{Identity, Session};

use crate::error::{Error, Result};
use crate::hasher::{hash_token, random_token};
use crate::store::Store;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session_token";

/// Token length in bytes, before encoding.
const TOKEN_BYTES: usize = 16;

/// A freshly issued bearer token. The plaintext value is only ever held here
/// and in the client's cookie.
#[derive(Debug, Clone)]
pub struct SessionToken {
    pub value: String,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn Store>,
    ttl: Duration,
}

impl SessionManager {
    pub fn new(store: Arc<dyn Store>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Create and persist a new session for `username`. Existing sessions of
    /// the user are left alone.
    pub fn issue(&self, username: &str) -> Result<SessionToken> {
        let value = random_token(TOKEN_BYTES);
        // Stored at second precision; truncate here so cookie and row agree.
        let expires_at = Utc::now()
            .checked_add_signed(self.ttl)
            .and_then(|t| DateTime::from_timestamp(t.timestamp(), 0))
            .ok_or_else(|| Error::Persistence(anyhow::anyhow!("session expiry out of range")))?;

        self.store.insert_session(&Session {
            id: Uuid::new_v4(),
            username: username.to_string(),
            token_hash: hash_token(&value),
            expires_at,
        })?;

        info!("Issued session for {} (expires {})", username, expires_at);
        Ok(SessionToken {
            value,
            username: username.to_string(),
            expires_at,
        })
    }

    /// Resolve a token to an identity. Never fails: unknown, expired, or
    /// unreadable sessions all come back as `None`. Read-only.
    pub fn validate(&self, token: &str) -> Option<Identity> {
        self.validate_at(token, Utc::now())
    }

    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Option<Identity> {
        let session = match self.store.find_session(&hash_token(token)) {
            Ok(Some(session)) => session,
            Ok(None) => return None,
            Err(e) => {
                warn!("Session lookup failed: {}", e);
                return None;
            }
        };

        if session.is_expired_at(now) {
            debug!(
                "Session for {} expired at {}",
                session.username, session.expires_at
            );
            return None;
        }

        Some(Identity::new(session.username))
    }

    /// Log the token's owner out everywhere: every session of that user is
    /// deleted, not just this one. Returns the number of sessions removed.
    /// An expired token carries no identity and removes nothing.
    pub fn revoke(&self, token: &str) -> Result<usize> {
        self.revoke_at(token, Utc::now())
    }

    pub fn revoke_at(&self, token: &str, now: DateTime<Utc>) -> Result<usize> {
        let Some(session) = self.store.find_session(&hash_token(token))? else {
            return Ok(0);
        };
        if session.is_expired_at(now) {
            debug!("Ignoring logout with expired session of {}", session.username);
            return Ok(0);
        }
        let removed = self.store.delete_sessions(&session.username)?;
        info!("Revoked {} session(s) for {}", removed, session.username);
        Ok(removed)
    }
}
