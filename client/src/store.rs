//! Key -> JSON document store on the local filesystem.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Serialize};
use tokio::fs;

use crate::error::{ClientError, Result};

/// In-progress game for today
pub const TODAY: &str = "today";
/// In-progress practice game
pub const PRACTICE: &str = "practice";
pub const STATS: &str = "stats";
pub const SYNC_QUEUE: &str = "sync_queue";
pub const SESSION: &str = "session";

#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let bytes = match fs::read(self.path(key)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| ClientError::Corrupt {
                key: key.to_string(),
                source,
            })
    }

    /// Like `get`, but an unreadable record is logged and treated as missing.
    pub async fn get_or_discard<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key).await {
            Err(ClientError::Corrupt { key, source }) => {
                tracing::warn!(%key, error = %source, "discarding unreadable record");
                self.delete(&key).await?;
                Ok(None)
            }
            other => other,
        }
    }

    /// Write through a temp file and rename, so a crash never leaves half a record.
    pub async fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        let tmp = self.dir.join(format!(".{}.json.tmp", key));
        fs::write(&tmp, bytes).await?;
        fs::rename(&tmp, self.path(key)).await?;
        Ok(())
    }

    /// Returns whether a record existed.
    pub async fn delete(&self, key: &str) -> Result<bool> {
        match fs::remove_file(self.path(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Record {
        name: String,
        count: u32,
    }

    #[tokio::test]
    async fn test_put_get_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path().join("nested")).await.unwrap();
        let record = Record {
            name: "streak".into(),
            count: 3,
        };

        assert_eq!(store.get::<Record>(STATS).await.unwrap(), None);
        store.put(STATS, &record).await.unwrap();
        assert_eq!(store.get::<Record>(STATS).await.unwrap(), Some(record));

        assert!(store.delete(STATS).await.unwrap());
        assert!(!store.delete(STATS).await.unwrap());
        assert_eq!(store.get::<Record>(STATS).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path()).await.unwrap();
        store.put(TODAY, &vec![1, 2, 3]).await.unwrap();
        store.put(TODAY, &vec![4]).await.unwrap();

        let mut names = Vec::new();
        let mut entries = fs::read_dir(dir.path()).await.unwrap();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        assert_eq!(names, vec!["today.json".to_string()]);
        assert_eq!(store.get::<Vec<u8>>(TODAY).await.unwrap(), Some(vec![4]));
    }

    #[tokio::test]
    async fn test_corrupt_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path()).await.unwrap();
        fs::write(dir.path().join("session.json"), b"{not json")
            .await
            .unwrap();

        assert!(matches!(
            store.get::<Record>(SESSION).await,
            Err(ClientError::Corrupt { .. })
        ));
        assert_eq!(store.get_or_discard::<Record>(SESSION).await.unwrap(), None);
        assert!(!dir.path().join("session.json").exists());
    }
}
