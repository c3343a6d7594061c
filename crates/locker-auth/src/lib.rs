//! Authorization core: credentials, sessions and file access control.
//!
//! Every protected operation takes an explicit [`Identity`] produced by
//! [`SessionManager::validate`]. Persistence goes through the [`Store`]
//! port so the same logic runs against SQLite or the in-memory fake.

pub mod credentials;
pub mod error;
pub mod hasher;
pub mod memory;
pub mod registry;
pub mod sessions;
pub mod storage;
pub mod store;

pub use credentials::CredentialStore;
pub use error::{Error, Result};
pub use hasher::{Argon2Hasher, CredentialHasher};
pub use locker_types::models::{FileAccessRow, Identity};
pub use memory::MemoryStore;
pub use registry::FileRegistry;
pub use sessions::{SESSION_COOKIE, SessionManager, SessionToken};
pub use storage::Storage;
pub use store::Store;
