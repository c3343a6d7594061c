use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id          TEXT PRIMARY KEY,
                username    TEXT NOT NULL UNIQUE,
                password    TEXT NOT NULL,
                salt        TEXT NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE sessions (
                id          TEXT PRIMARY KEY,
                username    TEXT NOT NULL,
                token_hash  TEXT NOT NULL UNIQUE,
                expires_at  INTEGER NOT NULL
            );

            CREATE INDEX idx_sessions_username ON sessions(username);

            -- `username` is the grantee; owner == username marks the uploader's own row
            CREATE TABLE files (
                owner       TEXT NOT NULL,
                username    TEXT NOT NULL,
                filename    TEXT NOT NULL,
                filepath    TEXT NOT NULL
            );

            CREATE INDEX idx_files_grantee ON files(username, filepath);
            CREATE INDEX idx_files_owner ON files(owner, filename);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
