//! Directory-backed remote store.
//!
//! Objects live as files under `<root>/objects/`, and `<root>/index.json`
//! records their names in creation order. Pointing the root at a shared or
//! synced folder gives a remote copy without any network API.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{RemoteObject, RemoteOperation, RemoteStore};
use crate::error::{Error, Result};

const INDEX_FILE_NAME: &str = "index.json";
const OBJECTS_DIR_NAME: &str = "objects";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexEntry {
    id: String,
    name: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    trashed: bool,
}

/// A remote store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    /// Use `root` as the store. The directory is created on first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE_NAME)
    }

    fn object_path(&self, id: &str) -> PathBuf {
        self.root.join(OBJECTS_DIR_NAME).join(id)
    }

    async fn read_index(&self) -> Result<Vec<IndexEntry>> {
        match tokio::fs::read(self.index_path()).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_index(&self, entries: &[IndexEntry]) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(entries)?;
        tokio::fs::write(self.index_path(), bytes).await?;
        Ok(())
    }

    async fn ensure_layout(&self) -> Result<()> {
        let objects = self.root.join(OBJECTS_DIR_NAME);
        tokio::fs::create_dir_all(&objects)
            .await
            .map_err(|source| Error::DirectoryCreate {
                path: objects,
                source,
            })
    }

    async fn live_entry(&self, id: &str, operation: RemoteOperation) -> Result<IndexEntry> {
        self.read_index()
            .await?
            .into_iter()
            .find(|e| e.id == id && !e.trashed)
            .ok_or_else(|| Error::remote(operation, format!("no object {id}")))
    }

    /// Move an object to the trash. Its content file is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be read or written.
    pub async fn trash(&self, id: &str) -> Result<bool> {
        let mut entries = self.read_index().await?;
        let Some(entry) = entries.iter_mut().find(|e| e.id == id && !e.trashed) else {
            return Ok(false);
        };
        entry.trashed = true;
        self.write_index(&entries).await?;
        Ok(true)
    }
}

fn new_object_id(name: &str, created_at: DateTime<Utc>, ordinal: usize) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(name.as_bytes());
    hasher.update(created_at.to_rfc3339().as_bytes());
    hasher.update(&ordinal.to_le_bytes());
    hasher.finalize().to_hex().as_str()[..16].to_string()
}

#[async_trait]
impl RemoteStore for DirectoryStore {
    fn name(&self) -> &'static str {
        "directory"
    }

    async fn list(&self, name: &str) -> Result<Vec<RemoteObject>> {
        let matches = self
            .read_index()
            .await?
            .into_iter()
            .filter(|e| e.name == name && !e.trashed)
            .map(|e| RemoteObject {
                id: e.id,
                name: e.name,
            })
            .collect();
        Ok(matches)
    }

    async fn create(&self, name: &str, content: &[u8]) -> Result<String> {
        self.ensure_layout().await?;
        let mut entries = self.read_index().await?;

        let created_at = Utc::now();
        let id = new_object_id(name, created_at, entries.len());
        tokio::fs::write(self.object_path(&id), content).await?;

        entries.push(IndexEntry {
            id: id.clone(),
            name: name.to_string(),
            created_at,
            trashed: false,
        });
        self.write_index(&entries).await?;

        debug!("Created object {} for {} under {}", id, name, self.root.display());
        Ok(id)
    }

    async fn update(&self, id: &str, content: &[u8]) -> Result<()> {
        self.live_entry(id, RemoteOperation::Update).await?;
        tokio::fs::write(self.object_path(id), content).await?;
        Ok(())
    }

    async fn download(&self, id: &str) -> Result<Vec<u8>> {
        self.live_entry(id, RemoteOperation::Download).await?;
        Ok(tokio::fs::read(self.object_path(id)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_empty_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStore::new(dir.path().join("missing"));

        assert!(store.list("datos.csv").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_update_download() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStore::new(dir.path());

        let id = store.create("datos.csv", b"v1").await.unwrap();
        assert_eq!(store.download(&id).await.unwrap(), b"v1");

        store.update(&id, b"v2").await.unwrap();
        assert_eq!(store.download(&id).await.unwrap(), b"v2");

        let listed = store.list("datos.csv").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, id);
    }

    #[tokio::test]
    async fn test_duplicates_listed_in_creation_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStore::new(dir.path());

        let first = store.create("datos.csv", b"1").await.unwrap();
        let second = store.create("datos.csv", b"2").await.unwrap();
        assert_ne!(first, second);

        let listed = store.list("datos.csv").await.unwrap();
        assert_eq!(listed[0].id, first);
        assert_eq!(listed[1].id, second);
    }

    #[tokio::test]
    async fn test_trashed_object_not_listed() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStore::new(dir.path());

        let id = store.create("datos.csv", b"x").await.unwrap();
        assert!(store.trash(&id).await.unwrap());

        assert!(store.list("datos.csv").await.unwrap().is_empty());
        let err = store.download(&id).await.unwrap_err();
        assert!(err.is_remote());
    }

    #[tokio::test]
    async fn test_update_unknown_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStore::new(dir.path());

        assert!(store.update("nope", b"x").await.is_err());
    }

    #[tokio::test]
    async fn test_corrupt_index_is_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(INDEX_FILE_NAME), b"not json").unwrap();
        let store = DirectoryStore::new(dir.path());

        assert!(matches!(
            store.list("datos.csv").await.unwrap_err(),
            Error::Json(_)
        ));
    }
}
