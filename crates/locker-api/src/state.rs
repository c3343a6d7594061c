use std::sync::Arc;

use locker_auth::{CredentialHasher, CredentialStore, FileRegistry, SessionManager, Storage, Store};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub credentials: CredentialStore,
    pub sessions: SessionManager,
    pub files: FileRegistry,
}

impl AppStateInner {
    /// Wire the three core components onto one store.
    pub fn new(
        store: Arc<dyn Store>,
        hasher: Arc<dyn CredentialHasher>,
        storage: Arc<Storage>,
        session_ttl: chrono::Duration,
        max_upload_bytes: usize,
    ) -> Self {
        let sessions = SessionManager::new(store.clone(), session_ttl);
        Self {
            credentials: CredentialStore::new(store.clone(), hasher, sessions.clone()),
            files: FileRegistry::new(store, storage, max_upload_bytes),
            sessions,
        }
    }
}
