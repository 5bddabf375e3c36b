use crate::error::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

pub const STAMP_FILE: &str = ".version.json";

/// Contents of the version stamp written before a headless child run.
#[derive(Debug, Serialize, Deserialize)]
pub struct VersionStamp {
    pub version: String,
    pub date: String,
    pub timestamp: i64,
}

impl VersionStamp {
    pub fn current() -> Self {
        let now = Utc::now();
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            date: now.to_rfc3339(),
            timestamp: now.timestamp(),
        }
    }
}

/// Write the version stamp into `dir`, creating the directory if needed.
///
/// The spawned child may depend on this file, so callers must await the stamp
/// before launching. Overwrites any previous stamp.
pub async fn stamp_version<P: AsRef<Path>>(dir: P) -> Result<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).await?;

    let path = dir.join(STAMP_FILE);
    let stamp = VersionStamp::current();
    let payload = serde_json::to_vec_pretty(&stamp)?;
    fs::write(&path, payload).await?;

    debug!("Version stamped at {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_stamp_writes_current_version() {
        let dir = tempdir().unwrap();
        let path = stamp_version(dir.path()).await.unwrap();
        assert_eq!(path.file_name().unwrap(), STAMP_FILE);

        let payload = tokio::fs::read(&path).await.unwrap();
        let stamp: VersionStamp = serde_json::from_slice(&payload).unwrap();
        assert_eq!(stamp.version, env!("CARGO_PKG_VERSION"));
        assert!(stamp.timestamp > 0);
    }

    #[tokio::test]
    async fn test_stamp_overwrites_previous_stamp() {
        let dir = tempdir().unwrap();
        stamp_version(dir.path()).await.unwrap();
        let path = stamp_version(dir.path()).await.unwrap();
        let payload = tokio::fs::read(&path).await.unwrap();
        assert!(serde_json::from_slice::<VersionStamp>(&payload).is_ok());
    }
}
