use std::io;
use std::path::PathBuf;

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::info;
use uuid::Uuid;

/// On-disk blob storage for uploaded files.
///
/// A file lives at `{dir}/{owner}/{filename}`. The relative part,
/// `{owner}/{filename}`, is the locator stored in access rows. Callers must
/// only pass validated owner and file names.
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    pub async fn new(dir: PathBuf) -> io::Result<Self> {
        fs::create_dir_all(&dir).await?;
        info!("File storage directory: {}", dir.display());
        Ok(Self { dir })
    }

    pub fn locator(owner: &str, filename: &str) -> String {
        format!("{owner}/{filename}")
    }

    /// Path on disk for a locator.
    pub fn file_path(&self, locator: &str) -> PathBuf {
        self.dir.join(locator)
    }

    /// Write the whole file, replacing any previous content. Data goes to a
    /// temporary sibling first and is renamed into place, so readers never
    /// see a half-written file.
    pub async fn write(&self, locator: &str, data: &[u8]) -> io::Result<()> {
        let path = self.file_path(locator);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // File names never contain '-', so this cannot clash with a stored file.
        let tmp = path.with_file_name(format!(".{}.part", Uuid::new_v4()));
        let result: io::Result<()> = async {
            let mut file = fs::File::create(&tmp).await?;
            file.write_all(data).await?;
            file.flush().await?;
            file.sync_all().await?;
            drop(file);
            fs::rename(&tmp, &path).await
        }
        .await;

        if result.is_err() {
            fs::remove_file(&tmp).await.ok();
        }
        result
    }

    pub async fn open(&self, locator: &str) -> io::Result<fs::File> {
        fs::File::open(self.file_path(locator)).await
    }
}
