use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{info, warn};

use locker_types::models::{FileAccessRow, Identity};

use crate::error::{Error, Result};
use crate::storage::Storage;
use crate::store::Store;

static FILENAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9.]{1,50}$").expect("static regex"));

/// Letters, digits and dots, 1 to 50 characters. Names made only of dots
/// (`.`, `..`) would resolve to directories and are refused.
pub fn validate_filename(filename: &str) -> Result<()> {
    if !FILENAME_RE.is_match(filename) || filename.chars().all(|c| c == '.') {
        return Err(Error::InvalidName);
    }
    Ok(())
}

/// Ownership and sharing of uploaded files.
pub struct FileRegistry {
    store: Arc<dyn Store>,
    storage: Arc<Storage>,
    max_upload_bytes: usize,
}

impl FileRegistry {
    pub fn new(store: Arc<dyn Store>, storage: Arc<Storage>, max_upload_bytes: usize) -> Self {
        Self {
            store,
            storage,
            max_upload_bytes,
        }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    /// Store `content` as `filename` in the caller's space and record the
    /// owner row. The name is checked before anything touches the disk.
    ///
    /// Disk write and row insert are not one transaction: if the insert
    /// fails the bytes stay on disk without a row pointing at them.
    pub async fn upload(
        &self,
        owner: &Identity,
        filename: &str,
        content: &[u8],
    ) -> Result<FileAccessRow> {
        validate_filename(filename)?;
        if content.is_empty() {
            return Err(Error::InvalidName);
        }
        if content.len() > self.max_upload_bytes {
            return Err(Error::TooLarge {
                limit: self.max_upload_bytes,
            });
        }

        let filepath = Storage::locator(&owner.username, filename);
        self.storage.write(&filepath, content).await?;

        let row = FileAccessRow {
            owner: owner.username.clone(),
            grantee: owner.username.clone(),
            filename: filename.to_string(),
            filepath,
        };

        let store = self.store.clone();
        let insert = row.clone();
        let inserted = tokio::task::spawn_blocking(move || store.insert_owner_row(&insert))
            .await
            .map_err(|e| Error::Persistence(anyhow::anyhow!("spawn_blocking join error: {}", e)))?
            .inspect_err(|e| warn!("Orphaned upload {}: {}", row.filepath, e))?;

        if inserted {
            info!("{} uploaded {} ({} bytes)", owner.username, filename, content.len());
        } else {
            info!("{} replaced {} ({} bytes)", owner.username, filename, content.len());
        }
        Ok(row)
    }

    /// Everything the user may download: own files and grants, storage order.
    pub fn list(&self, who: &Identity) -> Result<Vec<FileAccessRow>> {
        Ok(self.store.rows_for_grantee(&who.username)?)
    }

    /// The caller may fetch `filepath` only through a row granted to them.
    /// Whether the bytes exist on disk is irrelevant to the decision.
    pub fn authorize_download(&self, who: &Identity, filepath: &str) -> Result<FileAccessRow> {
        match self.store.find_grant(&who.username, filepath)? {
            Some(row) => Ok(row),
            None => {
                warn!("{} denied download of {}", who.username, filepath);
                Err(Error::Forbidden)
            }
        }
    }

    /// Grant `recipient` access to one of the sender's own files. Holders of
    /// a grant cannot pass it on. Repeating a share inserts another row.
    pub fn share(&self, sender: &Identity, recipient: &str, filename: &str) -> Result<FileAccessRow> {
        if sender.username == recipient {
            return Err(Error::SelfShare);
        }
        if !self.store.user_exists(recipient)? {
            return Err(Error::NotFound);
        }

        match self.store.insert_grant(&sender.username, recipient, filename)? {
            Some(row) => {
                info!("{} shared {} with {}", sender.username, filename, recipient);
                Ok(row)
            }
            None => {
                warn!("{} tried to share {} without owning it", sender.username, filename);
                Err(Error::Forbidden)
            }
        }
    }
}
