use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{info, warn};
use uuid::Uuid;

use locker_types::models::User;

use crate::error::{Error, Result};
use crate::hasher::{CredentialHasher, SALT_BYTES, digests_match, random_token};
use crate::sessions::{SessionManager, SessionToken};
use crate::store::Store;

/// Usernames double as path segments of file locators.
static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,32}$").expect("static regex"));

/// Burned on unknown usernames so both failure paths cost one hash.
const DUMMY_SALT: &str = "0000000000000000";

pub fn validate_username(username: &str) -> Result<()> {
    if USERNAME_RE.is_match(username) {
        Ok(())
    } else {
        Err(Error::InvalidName)
    }
}

pub struct CredentialStore {
    store: Arc<dyn Store>,
    hasher: Arc<dyn CredentialHasher>,
    sessions: SessionManager,
}

impl CredentialStore {
    pub fn new(
        store: Arc<dyn Store>,
        hasher: Arc<dyn CredentialHasher>,
        sessions: SessionManager,
    ) -> Self {
        Self {
            store,
            hasher,
            sessions,
        }
    }

    /// Create a user and log them in.
    pub fn register(&self, username: &str, password: &str) -> Result<SessionToken> {
        validate_username(username)?;

        let salt = random_token(SALT_BYTES);
        let password_digest = self.hasher.hash(password, &salt)?;

        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_digest,
            salt,
        };

        if !self.store.insert_user(&user)? {
            return Err(Error::AlreadyExists);
        }

        info!("Registered user {}", username);
        self.sessions.issue(username)
    }

    /// Check a password and open a new session. Prior sessions stay valid.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<SessionToken> {
        let Some(user) = self.store.find_user(username)? else {
            let _ = self.hasher.hash(password, DUMMY_SALT);
            return Err(Error::NotFound);
        };

        let attempt = self.hasher.hash(password, &user.salt)?;
        if !digests_match(&attempt, &user.password_digest) {
            warn!("Failed login for {}", username);
            return Err(Error::InvalidCredential);
        }

        self.sessions.issue(&user.username)
    }
}
