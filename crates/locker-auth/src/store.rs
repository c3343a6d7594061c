use anyhow::{Context, Result, anyhow};
use chrono::DateTime;
use uuid::Uuid;

use locker_db::Database;
use locker_db::models::{FileRow, SessionRow, UserRow};
use locker_types::models::{FileAccessRow, Session, User};

/// Persistence port for the authorization core.
///
/// Each method is a single atomic statement. Check-then-act sequences are
/// expressed as conditional writes (`insert_user`, `insert_grant`) so that
/// callers never have to hold a lock across two calls.
pub trait Store: Send + Sync {
    /// Returns `false` if the username is taken.
    fn insert_user(&self, user: &User) -> Result<bool>;
    fn find_user(&self, username: &str) -> Result<Option<User>>;
    fn user_exists(&self, username: &str) -> Result<bool>;

    fn insert_session(&self, session: &Session) -> Result<()>;
    fn find_session(&self, token_hash: &str) -> Result<Option<Session>>;
    fn delete_sessions(&self, username: &str) -> Result<usize>;

    /// Returns `false` if the owner already has a row for this filename.
    fn insert_owner_row(&self, row: &FileAccessRow) -> Result<bool>;
    fn rows_for_grantee(&self, username: &str) -> Result<Vec<FileAccessRow>>;
    fn find_grant(&self, username: &str, filepath: &str) -> Result<Option<FileAccessRow>>;
    /// Copies the sender's row for `filename` to `recipient`. `None` when the
    /// sender owns no such file.
    fn insert_grant(
        &self,
        sender: &str,
        recipient: &str,
        filename: &str,
    ) -> Result<Option<FileAccessRow>>;
}

impl Store for Database {
    fn insert_user(&self, user: &User) -> Result<bool> {
        self.create_user(
            &user.id.to_string(),
            &user.username,
            &user.password_digest,
            &user.salt,
        )
    }

    fn find_user(&self, username: &str) -> Result<Option<User>> {
        self.get_user_by_username(username)?
            .map(user_from_row)
            .transpose()
    }

    fn user_exists(&self, username: &str) -> Result<bool> {
        Database::user_exists(self, username)
    }

    fn insert_session(&self, session: &Session) -> Result<()> {
        Database::insert_session(
            self,
            &session.id.to_string(),
            &session.username,
            &session.token_hash,
            session.expires_at.timestamp(),
        )
    }

    fn find_session(&self, token_hash: &str) -> Result<Option<Session>> {
        self.get_session_by_token_hash(token_hash)?
            .map(session_from_row)
            .transpose()
    }

    fn delete_sessions(&self, username: &str) -> Result<usize> {
        self.delete_sessions_for_user(username)
    }

    fn insert_owner_row(&self, row: &FileAccessRow) -> Result<bool> {
        self.insert_owner_file(&row.owner, &row.filename, &row.filepath)
    }

    fn rows_for_grantee(&self, username: &str) -> Result<Vec<FileAccessRow>> {
        Ok(self
            .files_for_grantee(username)?
            .into_iter()
            .map(access_from_row)
            .collect())
    }

    fn find_grant(&self, username: &str, filepath: &str) -> Result<Option<FileAccessRow>> {
        Ok(Database::find_grant(self, username, filepath)?.map(access_from_row))
    }

    fn insert_grant(
        &self,
        sender: &str,
        recipient: &str,
        filename: &str,
    ) -> Result<Option<FileAccessRow>> {
        Ok(self.share_file(sender, recipient, filename)?.map(access_from_row))
    }
}

fn user_from_row(row: UserRow) -> Result<User> {
    let id = row
        .id
        .parse::<Uuid>()
        .with_context(|| format!("corrupt user id '{}'", row.id))?;
    Ok(User {
        id,
        username: row.username,
        password_digest: row.password,
        salt: row.salt,
    })
}

fn session_from_row(row: SessionRow) -> Result<Session> {
    let id = row
        .id
        .parse::<Uuid>()
        .with_context(|| format!("corrupt session id '{}'", row.id))?;
    let expires_at = DateTime::from_timestamp(row.expires_at, 0)
        .ok_or_else(|| anyhow!("corrupt expires_at {} on session {}", row.expires_at, row.id))?;
    Ok(Session {
        id,
        username: row.username,
        token_hash: row.token_hash,
        expires_at,
    })
}

fn access_from_row(row: FileRow) -> FileAccessRow {
    FileAccessRow {
        owner: row.owner,
        grantee: row.username,
        filename: row.filename,
        filepath: row.filepath,
    }
}
