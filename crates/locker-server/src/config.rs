use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// 50 MB upload limit for files
const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

const DEFAULT_SESSION_TTL_SECS: i64 = 24 * 3600;

/// Sessions never outlive a year.
const MAX_SESSION_TTL_SECS: i64 = 365 * 24 * 3600;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub storage_dir: PathBuf,
    pub session_ttl: chrono::Duration,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let host = var("LOCKER_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = var("LOCKER_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("LOCKER_PORT")?;
        let db_path = var("LOCKER_DB_PATH")
            .unwrap_or_else(|| "locker.db".into())
            .into();
        let storage_dir = var("LOCKER_STORAGE_DIR")
            .unwrap_or_else(|| "./files".into())
            .into();
        let ttl_secs: i64 = match var("LOCKER_SESSION_TTL_SECS") {
            Some(v) => v.parse().context("LOCKER_SESSION_TTL_SECS")?,
            None => DEFAULT_SESSION_TTL_SECS,
        };
        if ttl_secs <= 0 || ttl_secs > MAX_SESSION_TTL_SECS {
            anyhow::bail!(
                "LOCKER_SESSION_TTL_SECS must be between 1 and {}, got {}",
                MAX_SESSION_TTL_SECS,
                ttl_secs
            );
        }
        let session_ttl = chrono::Duration::try_seconds(ttl_secs)
            .context("LOCKER_SESSION_TTL_SECS out of range")?;
        let max_upload_bytes = match var("LOCKER_MAX_UPLOAD_BYTES") {
            Some(v) => v.parse().context("LOCKER_MAX_UPLOAD_BYTES")?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        Ok(Self {
            host,
            port,
            db_path,
            storage_dir,
            session_ttl,
            max_upload_bytes,
        })
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}
