/// Database row types: these map directly to SQLite rows.
/// Distinct from locker-types domain models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub salt: String,
}

pub struct SessionRow {
    pub id: String,
    pub username: String,
    pub token_hash: String,
    /// Unix seconds.
    pub expires_at: i64,
}

pub struct FileRow {
    pub owner: String,
    /// Grantee of this row, stored in the `username` column.
    pub username: String,
    pub filename: String,
    pub filepath: String,
}
