//! In-process remote store.
//!
//! Keeps objects in memory in creation order. Supports trashing objects,
//! seeding duplicate names and making individual operations fail, so the
//! synchronizer can be exercised without a network.

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::trace;

use super::{RemoteObject, RemoteOperation, RemoteStore};
use crate::error::{Error, Result};

#[derive(Debug)]
struct StoredObject {
    id: String,
    name: String,
    content: Vec<u8>,
    trashed: bool,
}

#[derive(Debug, Default)]
struct Inner {
    objects: Vec<StoredObject>,
    next_id: u64,
    failing: HashSet<RemoteOperation>,
    calls: Vec<RemoteOperation>,
}

impl Inner {
    fn record(&mut self, operation: RemoteOperation) -> Result<()> {
        self.calls.push(operation);
        if self.failing.contains(&operation) {
            return Err(Error::remote(operation, "simulated failure"));
        }
        Ok(())
    }

    fn insert(&mut self, name: &str, content: &[u8]) -> String {
        self.next_id += 1;
        let id = format!("mem-{}", self.next_id);
        self.objects.push(StoredObject {
            id: id.clone(),
            name: name.to_string(),
            content: content.to_vec(),
            trashed: false,
        });
        id
    }

    fn live_mut(&mut self, id: &str) -> Option<&mut StoredObject> {
        self.objects.iter_mut().find(|o| o.id == id && !o.trashed)
    }
}

/// A remote store held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object directly, bypassing failure injection.
    ///
    /// Names are not checked, so this can seed duplicates.
    pub async fn seed(&self, name: &str, content: &[u8]) -> String {
        self.inner.lock().await.insert(name, content)
    }

    /// Move an object to the trash. Trashed objects are never listed.
    pub async fn trash(&self, id: &str) -> bool {
        match self.inner.lock().await.live_mut(id) {
            Some(object) => {
                object.trashed = true;
                true
            }
            None => false,
        }
    }

    /// Make every later call of `operation` fail.
    pub async fn fail_on(&self, operation: RemoteOperation) {
        self.inner.lock().await.failing.insert(operation);
    }

    /// Stop failing `operation`.
    pub async fn recover(&self, operation: RemoteOperation) {
        self.inner.lock().await.failing.remove(&operation);
    }

    /// Current content of a live object.
    pub async fn content(&self, id: &str) -> Option<Vec<u8>> {
        self.inner
            .lock()
            .await
            .live_mut(id)
            .map(|o| o.content.clone())
    }

    /// Number of live objects named `name`.
    pub async fn count_named(&self, name: &str) -> usize {
        self.inner
            .lock()
            .await
            .objects
            .iter()
            .filter(|o| o.name == name && !o.trashed)
            .count()
    }

    /// Operations called so far, oldest first.
    pub async fn calls(&self) -> Vec<RemoteOperation> {
        self.inner.lock().await.calls.clone()
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn list(&self, name: &str) -> Result<Vec<RemoteObject>> {
        let mut inner = self.inner.lock().await;
        inner.record(RemoteOperation::List)?;
        let matches = inner
            .objects
            .iter()
            .filter(|o| o.name == name && !o.trashed)
            .map(|o| RemoteObject {
                id: o.id.clone(),
                name: o.name.clone(),
            })
            .collect();
        Ok(matches)
    }

    async fn create(&self, name: &str, content: &[u8]) -> Result<String> {
        let mut inner = self.inner.lock().await;
        inner.record(RemoteOperation::Create)?;
        let id = inner.insert(name, content);
        trace!("Created in-memory object {} ({} bytes)", id, content.len());
        Ok(id)
    }

    async fn update(&self, id: &str, content: &[u8]) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.record(RemoteOperation::Update)?;
        let object = inner
            .live_mut(id)
            .ok_or_else(|| Error::remote(RemoteOperation::Update, format!("no object {id}")))?;
        object.content = content.to_vec();
        Ok(())
    }

    async fn download(&self, id: &str) -> Result<Vec<u8>> {
        let mut inner = self.inner.lock().await;
        inner.record(RemoteOperation::Download)?;
        inner
            .live_mut(id)
            .map(|o| o.content.clone())
            .ok_or_else(|| Error::remote(RemoteOperation::Download, format!("no object {id}")))
    }
}
