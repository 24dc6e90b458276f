//! Remote file resolution.
//!
//! Decides whether the remote store already holds the canonical object for a
//! logical file name. Resolution never fails: a store that cannot be reached
//! is reported as "not found" together with a warning, and the caller goes on
//! to create a new object.

use serde::Serialize;
use tracing::{debug, warn};

use crate::remote::RemoteStore;

/// Outcome of resolving a logical file name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// Identifier of the canonical remote object, if one was found.
    pub id: Option<String>,
    /// Why the store could not be consulted, if it could not.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl Resolution {
    /// A resolution that found `id`.
    #[must_use]
    pub fn found(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            warning: None,
        }
    }

    /// A resolution that found nothing.
    #[must_use]
    pub fn missing() -> Self {
        Self::default()
    }

    /// Whether a remote object exists for the name.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.id.is_some()
    }

    /// Whether the store could not be consulted.
    #[must_use]
    pub fn degraded(&self) -> bool {
        self.warning.is_some()
    }

    fn degraded_with(warning: String) -> Self {
        Self {
            id: None,
            warning: Some(warning),
        }
    }
}

/// Look up the canonical remote object for `name`.
///
/// When several non-trashed objects share the name, the first one in the
/// store's listing order wins.
pub async fn resolve(store: &dyn RemoteStore, name: &str) -> Resolution {
    if name.is_empty() {
        let message = "cannot resolve an empty file name".to_string();
        warn!("{}", message);
        return Resolution::degraded_with(message);
    }

    let objects = match store.list(name).await {
        Ok(objects) => objects,
        Err(e) => {
            let message = format!("could not check {} store for {name}: {e}", store.name());
            warn!("{}", message);
            return Resolution::degraded_with(message);
        }
    };

    match objects.as_slice() {
        [] => {
            debug!("No remote object named {}", name);
            Resolution::missing()
        }
        [only] => {
            debug!("Resolved {} to {}", name, only.id);
            Resolution::found(only.id.clone())
        }
        [first, ..] => {
            warn!(
                "{} remote objects are named {}; using the first ({})",
                objects.len(),
                name,
                first.id
            );
            Resolution::found(first.id.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{MemoryStore, RemoteOperation};

    #[tokio::test]
    async fn test_no_match() {
        let store = MemoryStore::new();
        store.seed("otro.csv", b"").await;

        let resolution = resolve(&store, "datos.csv").await;
        assert_eq!(resolution, Resolution::missing());
        assert!(!resolution.exists());
        assert!(!resolution.degraded());
    }

    #[tokio::test]
    async fn test_no_match_is_stable() {
        let store = MemoryStore::new();
        for _ in 0..3 {
            assert_eq!(resolve(&store, "datos.csv").await, Resolution::missing());
        }
    }

    #[tokio::test]
    async fn test_single_match() {
        let store = MemoryStore::new();
        let id = store.seed("datos.csv", b"").await;

        let resolution = resolve(&store, "datos.csv").await;
        assert!(resolution.exists());
        assert_eq!(resolution.id.as_deref(), Some(id.as_str()));
    }

    #[tokio::test]
    async fn test_duplicates_pick_first_listed() {
        let store = MemoryStore::new();
        let first = store.seed("datos.csv", b"1").await;
        store.seed("datos.csv", b"2").await;

        let resolution = resolve(&store, "datos.csv").await;
        assert_eq!(resolution.id, Some(first));
    }

    #[tokio::test]
    async fn test_trashed_match_ignored() {
        let store = MemoryStore::new();
        let trashed = store.seed("datos.csv", b"").await;
        store.trash(&trashed).await;
        let live = store.seed("datos.csv", b"").await;

        assert_eq!(resolve(&store, "datos.csv").await.id, Some(live));
    }

    #[tokio::test]
    async fn test_store_failure_degrades_to_missing() {
        let store = MemoryStore::new();
        store.seed("datos.csv", b"").await;
        store.fail_on(RemoteOperation::List).await;

        let resolution = resolve(&store, "datos.csv").await;
        assert!(!resolution.exists());
        assert!(resolution.degraded());
        assert!(resolution.warning.unwrap().contains("simulated failure"));
    }

    #[tokio::test]
    async fn test_empty_name_degrades() {
        let store = MemoryStore::new();
        let resolution = resolve(&store, "").await;

        assert!(!resolution.exists());
        assert!(resolution.degraded());
        assert!(store.calls().await.is_empty());
    }
}
