use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("username already exists")]
    AlreadyExists,

    #[error("not found")]
    NotFound,

    #[error("incorrect password")]
    InvalidCredential,

    #[error("invalid name")]
    InvalidName,

    #[error("can't share with yourself")]
    SelfShare,

    #[error("not authorized")]
    Forbidden,

    #[error("upload exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("persistence error: {0}")]
    Persistence(#[from] anyhow::Error),

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
