//! Remote object store abstraction.
//!
//! The synchronizer only needs four operations from a remote store. Any
//! object store or file-hosting API that can list by exact name, create,
//! overwrite and download satisfies [`RemoteStore`].

pub mod directory;
pub mod drive;
pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use directory::DirectoryStore;
pub use drive::DriveStore;
pub use memory::MemoryStore;

/// A non-trashed object as listed by a remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteObject {
    /// Store-assigned identifier.
    pub id: String,
    /// Logical file name.
    pub name: String,
}

/// The operations of the remote store contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteOperation {
    /// List objects by name.
    List,
    /// Create a new object.
    Create,
    /// Overwrite an existing object.
    Update,
    /// Download an object's content.
    Download,
}

impl std::fmt::Display for RemoteOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::List => write!(f, "list"),
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Download => write!(f, "download"),
        }
    }
}

/// A remote store holding serialized datasets.
///
/// Implementations must return listings in a stable, store-defined order;
/// callers treat the first entry as canonical.
#[async_trait]
pub trait RemoteStore: Send + Sync + std::fmt::Debug {
    /// A short name for logging.
    fn name(&self) -> &'static str;

    /// List non-trashed objects whose name equals `name` exactly.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached or rejects the request.
    async fn list(&self, name: &str) -> Result<Vec<RemoteObject>>;

    /// Create an object and return its identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the object cannot be created.
    async fn create(&self, name: &str, content: &[u8]) -> Result<String>;

    /// Replace the content of an existing object.
    ///
    /// # Errors
    ///
    /// Returns an error if the object does not exist or cannot be written.
    async fn update(&self, id: &str, content: &[u8]) -> Result<()>;

    /// Download an object's content.
    ///
    /// # Errors
    ///
    /// Returns an error if the object does not exist or cannot be read.
    async fn download(&self, id: &str) -> Result<Vec<u8>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_display() {
        assert_eq!(RemoteOperation::List.to_string(), "list");
        assert_eq!(RemoteOperation::Create.to_string(), "create");
        assert_eq!(RemoteOperation::Update.to_string(), "update");
        assert_eq!(RemoteOperation::Download.to_string(), "download");
    }

    #[test]
    fn test_remote_object_serialize() {
        let object = RemoteObject {
            id: "abc".to_string(),
            name: "datos.csv".to_string(),
        };
        let json = serde_json::to_string(&object).unwrap();
        assert!(json.contains("\"id\":\"abc\""));
    }
}
