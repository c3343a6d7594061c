use crate::Database;
use crate::models::{FileRow, SessionRow, UserRow};
use anyhow::Result;
use rusqlite::{Connection, Row};

impl Database {
    // -- Users --

    /// Insert a user. Returns `false` when the username is already taken;
    /// the UNIQUE constraint is the only arbiter, so concurrent registrations
    /// of one name cannot both succeed.
    pub fn create_user(&self, id: &str, username: &str, password: &str, salt: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let result = conn.execute(
                "INSERT INTO users (id, username, password, salt) VALUES (?1, ?2, ?3, ?4)",
                (id, username, password, salt),
            );
            match result {
                Ok(_) => Ok(true),
                Err(rusqlite::Error::SqliteFailure(err, _))
                    if err.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    Ok(false)
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    pub fn user_exists(&self, username: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let found: i64 = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1)",
                [username],
                |row| row.get(0),
            )?;
            Ok(found != 0)
        })
    }

    // -- Sessions --

    pub fn insert_session(
        &self,
        id: &str,
        username: &str,
        token_hash: &str,
        expires_at: i64,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO sessions (id, username, token_hash, expires_at) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id, username, token_hash, expires_at],
            )?;
            Ok(())
        })
    }

    pub fn get_session_by_token_hash(&self, token_hash: &str) -> Result<Option<SessionRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, username, token_hash, expires_at FROM sessions WHERE token_hash = ?1",
                [token_hash],
                |row| {
                    Ok(SessionRow {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        token_hash: row.get(2)?,
                        expires_at: row.get(3)?,
                    })
                },
            )
            .optional()
        })
    }

    /// Delete every session of a user. Returns the number of rows removed.
    pub fn delete_sessions_for_user(&self, username: &str) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let n = conn.execute("DELETE FROM sessions WHERE username = ?1", [username])?;
            Ok(n)
        })
    }

    // -- Files --

    /// Insert the owner's own row unless one already exists for this
    /// (owner, filename). Returns whether a row was inserted.
    pub fn insert_owner_file(&self, owner: &str, filename: &str, filepath: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let n = conn.execute(
                "INSERT INTO files (owner, username, filename, filepath)
                 SELECT ?1, ?1, ?2, ?3
                 WHERE NOT EXISTS (
                     SELECT 1 FROM files WHERE owner = ?1 AND username = ?1 AND filename = ?2
                 )",
                (owner, filename, filepath),
            )?;
            Ok(n > 0)
        })
    }

    /// Every row granted to `username`, in storage order.
    pub fn files_for_grantee(&self, username: &str) -> Result<Vec<FileRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT owner, username, filename, filepath FROM files
                 WHERE username = ?1
                 ORDER BY rowid",
            )?;
            let rows = stmt
                .query_map([username], file_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn find_grant(&self, username: &str, filepath: &str) -> Result<Option<FileRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT owner, username, filename, filepath FROM files
                 WHERE username = ?1 AND filepath = ?2
                 LIMIT 1",
                [username, filepath],
                file_row,
            )
            .optional()
        })
    }

    /// Grant `recipient` access to the sender's file in one statement.
    /// Returns `None` when the sender owns no file by that name.
    /// Sharing twice inserts twice.
    pub fn share_file(&self, sender: &str, recipient: &str, filename: &str) -> Result<Option<FileRow>> {
        self.with_conn_mut(|conn| {
            conn.query_row(
                "INSERT INTO files (owner, username, filename, filepath)
                 SELECT owner, ?2, filename, filepath FROM files
                 WHERE owner = ?1 AND filename = ?3
                 LIMIT 1
                 RETURNING owner, username, filename, filepath",
                [sender, recipient, filename],
                file_row,
            )
            .optional()
        })
    }
}

fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let mut stmt =
        conn.prepare("SELECT id, username, password, salt FROM users WHERE username = ?1")?;

    let row = stmt
        .query_row([username], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                salt: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn file_row(row: &Row<'_>) -> rusqlite::Result<FileRow> {
    Ok(FileRow {
        owner: row.get(0)?,
        username: row.get(1)?,
        filename: row.get(2)?,
        filepath: row.get(3)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
