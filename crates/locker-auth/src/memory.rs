use std::sync::{Mutex, MutexGuard};

use anyhow::{Result, anyhow};

use locker_types::models::{FileAccessRow, Session, User};

use crate::store::Store;

/// In-memory [`Store`]. One mutex guards all three tables, which makes every
/// method as atomic as the SQLite statement it stands in for.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Tables>,
}

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    sessions: Vec<Session>,
    files: Vec<FileAccessRow>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>> {
        self.inner
            .lock()
            .map_err(|e| anyhow!("MemoryStore lock poisoned: {}", e))
    }
}

impl Store for MemoryStore {
    fn insert_user(&self, user: &User) -> Result<bool> {
        let mut t = self.tables()?;
        if t.users.iter().any(|u| u.username == user.username) {
            return Ok(false);
        }
        t.users.push(user.clone());
        Ok(true)
    }

    fn find_user(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .tables()?
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    fn user_exists(&self, username: &str) -> Result<bool> {
        Ok(self.tables()?.users.iter().any(|u| u.username == username))
    }

    fn insert_session(&self, session: &Session) -> Result<()> {
        self.tables()?.sessions.push(session.clone());
        Ok(())
    }

    fn find_session(&self, token_hash: &str) -> Result<Option<Session>> {
        Ok(self
            .tables()?
            .sessions
            .iter()
            .find(|s| s.token_hash == token_hash)
            .cloned())
    }

    fn delete_sessions(&self, username: &str) -> Result<usize> {
        let mut t = self.tables()?;
        let before = t.sessions.len();
        t.sessions.retain(|s| s.username != username);
        Ok(before - t.sessions.len())
    }

    fn insert_owner_row(&self, row: &FileAccessRow) -> Result<bool> {
        let mut t = self.tables()?;
        let exists = t.files.iter().any(|f| {
            f.owner == row.owner && f.grantee == row.owner && f.filename == row.filename
        });
        if exists {
            return Ok(false);
        }
        t.files.push(row.clone());
        Ok(true)
    }

    fn rows_for_grantee(&self, username: &str) -> Result<Vec<FileAccessRow>> {
        Ok(self
            .tables()?
            .files
            .iter()
            .filter(|f| f.grantee == username)
            .cloned()
            .collect())
    }

    fn find_grant(&self, username: &str, filepath: &str) -> Result<Option<FileAccessRow>> {
        Ok(self
            .tables()?
            .files
            .iter()
            .find(|f| f.grantee == username && f.filepath == filepath)
            .cloned())
    }

    fn insert_grant(
        &self,
        sender: &str,
        recipient: &str,
        filename: &str,
    ) -> Result<Option<FileAccessRow>> {
        let mut t = self.tables()?;
        let Some(source) = t
            .files
            .iter()
            .find(|f| f.owner == sender && f.filename == filename)
        else {
            return Ok(None);
        };
        let grant = FileAccessRow {
            owner: source.owner.clone(),
            grantee: recipient.to_string(),
            filename: source.filename.clone(),
            filepath: source.filepath.clone(),
        };
        t.files.push(grant.clone());
        Ok(Some(grant))
    }
}
