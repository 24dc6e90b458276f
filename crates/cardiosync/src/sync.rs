//! The submission transaction.
//!
//! Each submission runs `resolve → fetch-or-skip → merge → persist → upload`
//! to completion before the next one starts. There are no intermediate
//! durable states: if the upload fails after the local write, the local file
//! stays updated and the remote object stays stale until a later submission
//! uploads again.
//!
//! Two processes submitting against the same logical name at once can both
//! resolve "not found" and create duplicate remote objects. The resolver then
//! keeps using whichever one the store lists first.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::reconcile::{reconcile, PriorOrigin};
use crate::record::Record;
use crate::remote::RemoteStore;
use crate::resolver::{resolve, Resolution};

/// What happened to the remote copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum UploadOutcome {
    /// A new remote object was created.
    Created {
        /// Identifier of the new object.
        id: String,
    },
    /// The resolved remote object was overwritten.
    Updated {
        /// Identifier of the updated object.
        id: String,
    },
    /// The upload failed; the local file is still up to date.
    Failed {
        /// Why the upload failed.
        message: String,
    },
}

/// Result of one submission.
#[derive(Debug, Clone, Serialize)]
pub struct SubmitReport {
    /// Remote verdict taken before anything was written.
    pub resolution: Resolution,
    /// Where the prior rows came from.
    pub origin: PriorOrigin,
    /// Rows in the dataset after the append.
    pub rows: usize,
    /// The local file that was written.
    pub local_path: PathBuf,
    /// Remote upload result.
    pub upload: UploadOutcome,
}

impl SubmitReport {
    /// Whether the remote copy now matches the local file.
    #[must_use]
    pub fn is_synced(&self) -> bool {
        !matches!(self.upload, UploadOutcome::Failed { .. })
    }
}

/// Keeps a local dataset and its remote copy in step.
#[derive(Debug, Clone)]
pub struct Synchronizer {
    store: Arc<dyn RemoteStore>,
    remote_name: String,
    local_path: PathBuf,
}

impl Synchronizer {
    /// Sync the file at `local_path` with the remote object named `remote_name`.
    #[must_use]
    pub fn new(
        store: Arc<dyn RemoteStore>,
        remote_name: impl Into<String>,
        local_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            remote_name: remote_name.into(),
            local_path: local_path.into(),
        }
    }

    /// Build a synchronizer from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote store cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        let store: Arc<dyn RemoteStore> = Arc::from(config.remote_store()?);
        Ok(Self::new(
            store,
            config.dataset.file_name.clone(),
            config.dataset_path(),
        ))
    }

    /// The local dataset path.
    #[must_use]
    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    /// The logical remote name.
    #[must_use]
    pub fn remote_name(&self) -> &str {
        &self.remote_name
    }

    /// The remote store in use.
    #[must_use]
    pub fn store(&self) -> &dyn RemoteStore {
        self.store.as_ref()
    }

    /// Resolve the remote object without changing anything.
    pub async fn resolve(&self) -> Resolution {
        resolve(self.store.as_ref(), &self.remote_name).await
    }

    /// Read the local dataset, if the file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or decoded.
    pub async fn load_local(&self) -> Result<Option<Dataset>> {
        if !tokio::fs::try_exists(&self.local_path).await? {
            return Ok(None);
        }
        let bytes = tokio::fs::read(&self.local_path).await?;
        let origin = self.local_path.display().to_string();
        Ok(Some(Dataset::from_csv(&bytes, &origin)?))
    }

    /// Append one record and sync the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the prior dataset cannot be obtained or decoded,
    /// or the local file cannot be written. Upload failures are reported in
    /// the returned [`SubmitReport`] instead.
    pub async fn submit(&self, record: &Record) -> Result<SubmitReport> {
        let new_rows = Dataset::from_records(std::slice::from_ref(record))?;

        let resolution = self.resolve().await;
        if let Some(warning) = &resolution.warning {
            warn!("Continuing with local data only: {}", warning);
        }

        let reconciled = reconcile(
            &new_rows,
            &self.local_path,
            &resolution,
            self.store.as_ref(),
        )
        .await?;

        let upload = self.upload(&resolution, &reconciled.bytes).await;
        Ok(SubmitReport {
            resolution,
            origin: reconciled.origin,
            rows: reconciled.dataset.len(),
            local_path: self.local_path.clone(),
            upload,
        })
    }

    async fn upload(&self, resolution: &Resolution, bytes: &[u8]) -> UploadOutcome {
        let result = match &resolution.id {
            Some(id) => self
                .store
                .update(id, bytes)
                .await
                .map(|()| UploadOutcome::Updated { id: id.clone() }),
            None => self
                .store
                .create(&self.remote_name, bytes)
                .await
                .map(|id| UploadOutcome::Created { id }),
        };

        match result {
            Ok(outcome) => {
                info!("Remote copy of {} synced: {:?}", self.remote_name, outcome);
                outcome
            }
            Err(e) => {
                error!("Failed to upload {}: {}", self.remote_name, e);
                UploadOutcome::Failed {
                    message: e.to_string(),
                }
            }
        }
    }
}
