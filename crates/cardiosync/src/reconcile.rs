//! Dataset reconciliation.
//!
//! Merges newly submitted records into the prior dataset and writes the
//! combined table to the local file. The prior dataset is the local file
//! when it exists, else the remote copy (materialized locally first), else
//! empty.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::remote::RemoteStore;
use crate::resolver::Resolution;

/// Where the prior dataset came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum PriorOrigin {
    /// The local file.
    Local,
    /// The remote object with this id.
    Remote {
        /// Identifier of the downloaded object.
        id: String,
    },
    /// No prior data existed.
    Empty,
}

/// The combined dataset and its serialized bytes.
#[derive(Debug, Clone)]
pub struct Reconciled {
    /// Prior rows followed by the new rows.
    pub dataset: Dataset,
    /// The bytes written to the local file.
    pub bytes: Vec<u8>,
    /// Where the prior rows came from.
    pub origin: PriorOrigin,
}

/// Decoded prior content plus the bytes it was decoded from.
struct Prior {
    dataset: Dataset,
    bytes: Option<Vec<u8>>,
    origin: PriorOrigin,
}

/// Append `new_records` to the prior dataset and persist the result.
///
/// Prior content is kept byte for byte; only the new rows are encoded, with
/// the prior file's line terminator. `resolution` is consulted only when
/// `local_path` does not exist.
///
/// # Errors
///
/// Returns an error if prior content cannot be decoded, the remote copy
/// cannot be downloaded, or the local file cannot be written.
pub async fn reconcile(
    new_records: &Dataset,
    local_path: &Path,
    resolution: &Resolution,
    store: &dyn RemoteStore,
) -> Result<Reconciled> {
    let prior = load_prior(local_path, resolution, store).await?;
    debug!(
        "Prior dataset has {} rows ({:?})",
        prior.dataset.len(),
        prior.origin
    );

    let dataset = prior.dataset.append(new_records)?;
    let bytes = match &prior.bytes {
        Some(prior_bytes) => append_rows(prior_bytes, new_records)?,
        None => dataset.to_csv()?,
    };
    write_local(local_path, &bytes).await?;

    info!("Wrote {} rows to {}", dataset.len(), local_path.display());
    Ok(Reconciled {
        dataset,
        bytes,
        origin: prior.origin,
    })
}

async fn load_prior(
    local_path: &Path,
    resolution: &Resolution,
    store: &dyn RemoteStore,
) -> Result<Prior> {
    if tokio::fs::try_exists(local_path).await? {
        let bytes = tokio::fs::read(local_path).await?;
        let dataset = Dataset::from_csv(&bytes, &local_path.display().to_string())?;
        return Ok(Prior {
            dataset,
            bytes: Some(bytes),
            origin: PriorOrigin::Local,
        });
    }

    let Some(id) = &resolution.id else {
        return Ok(Prior {
            dataset: Dataset::empty(),
            bytes: None,
            origin: PriorOrigin::Empty,
        });
    };

    info!("No local dataset; fetching remote object {}", id);
    let bytes = store.download(id).await?;
    write_local(local_path, &bytes).await?;
    let dataset = Dataset::from_csv(&bytes, &format!("{}:{id}", store.name()))?;
    Ok(Prior {
        dataset,
        bytes: Some(bytes),
        origin: PriorOrigin::Remote { id: id.clone() },
    })
}

fn append_rows(prior: &[u8], new_records: &Dataset) -> Result<Vec<u8>> {
    let terminator = line_terminator(prior);
    let rows = new_records.to_csv_rows()?;

    let mut out = Vec::with_capacity(prior.len() + rows.len() + terminator.len());
    out.extend_from_slice(prior);
    if !prior.ends_with(b"\n") {
        out.extend_from_slice(terminator);
    }
    if terminator == b"\r\n" {
        out.extend(to_crlf(&rows));
    } else {
        out.extend_from_slice(&rows);
    }
    Ok(out)
}

/// The terminator of the first line; `\n` when there is none.
fn line_terminator(bytes: &[u8]) -> &'static [u8] {
    match bytes.iter().position(|&b| b == b'\n') {
        Some(pos) if pos > 0 && bytes[pos - 1] == b'\r' => &b"\r\n"[..],
        _ => &b"\n"[..],
    }
}

/// Rewrite record terminators as CRLF. Newlines inside quoted fields are
/// field content and stay as they are.
fn to_crlf(rows: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(rows.len() + rows.len() / 32);
    let mut quoted = false;
    for &byte in rows {
        match byte {
            b'"' => quoted = !quoted,
            b'\n' if !quoted => out.push(b'\r'),
            _ => {}
        }
        out.push(byte);
    }
    out
}

async fn write_local(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !tokio::fs::try_exists(parent).await? {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
    }
    tokio::fs::write(path, bytes).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::header_line;
    use crate::record::{Gender, Record};
    use crate::remote::{MemoryStore, RemoteOperation};

    fn record(name: &str, age: u32) -> Dataset {
        let mut record = Record::new(name, age, Gender::Otro);
        record.presion_arterial = "130/85".to_string();
        record.creatinina = 0.9;
        Dataset::from_records(&[record]).unwrap()
    }

    fn lines(bytes: &[u8]) -> Vec<String> {
        String::from_utf8(bytes.to_vec())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[tokio::test]
    async fn test_empty_state_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("datos.csv");
        let store = MemoryStore::new();

        let reconciled = reconcile(&record("Ana", 45), &path, &Resolution::missing(), &store)
            .await
            .unwrap();

        assert_eq!(reconciled.origin, PriorOrigin::Empty);
        assert_eq!(reconciled.dataset.len(), 1);
        let on_disk = std::fs::read(&path).unwrap();
        assert_eq!(on_disk, reconciled.bytes);
        let lines = lines(&on_disk);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], header_line());
        assert!(lines[1].starts_with("Ana,45,"));
        assert!(store.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_local_file_rows_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("datos.csv");
        let store = MemoryStore::new();

        let prior = record("Ana", 45)
            .append(&record("Luis", 70))
            .unwrap()
            .append(&record("Marta", 58))
            .unwrap();
        let prior_bytes = prior.to_csv().unwrap();
        std::fs::write(&path, &prior_bytes).unwrap();

        let reconciled = reconcile(&record("Pedro", 81), &path, &Resolution::missing(), &store)
            .await
            .unwrap();

        assert_eq!(reconciled.origin, PriorOrigin::Local);
        let before = lines(&prior_bytes);
        let after = lines(&std::fs::read(&path).unwrap());
        assert_eq!(after.len(), 5);
        assert_eq!(after[..4], before[..]);
        assert!(after[4].starts_with("Pedro,81,"));
    }

    #[tokio::test]
    async fn test_foreign_prior_file_kept_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("datos.csv");
        let prior = format!(
            "{}\nMarta,58,Femenino,110/70,80,18,97,300,1e-05,ok\nLuis,70,Masculino,,90,20,95,800,1.20,\n",
            header_line()
        );
        std::fs::write(&path, &prior).unwrap();

        let reconciled = reconcile(
            &record("Pedro", 81),
            &path,
            &Resolution::missing(),
            &MemoryStore::new(),
        )
        .await
        .unwrap();

        let on_disk = std::fs::read(&path).unwrap();
        assert_eq!(on_disk, reconciled.bytes);
        assert!(on_disk.starts_with(prior.as_bytes()));
        assert_eq!(&on_disk[prior.len()..], b"Pedro,81,Otro,130/85,0,0,0,0,0.9,\n");
        assert_eq!(reconciled.dataset.len(), 3);
    }

    #[tokio::test]
    async fn test_crlf_prior_file_keeps_crlf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("datos.csv");
        let prior = format!(
            "{}\r\nMarta,58,Femenino,110/70,80,18,97,300,1.1,ok\r\n",
            header_line()
        );
        std::fs::write(&path, &prior).unwrap();

        reconcile(
            &record("Pedro", 81),
            &path,
            &Resolution::missing(),
            &MemoryStore::new(),
        )
        .await
        .unwrap();

        let on_disk = std::fs::read(&path).unwrap();
        assert!(on_disk.starts_with(prior.as_bytes()));
        assert_eq!(
            &on_disk[prior.len()..],
            b"Pedro,81,Otro,130/85,0,0,0,0,0.9,\r\n"
        );
    }

    #[tokio::test]
    async fn test_prior_without_final_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("datos.csv");
        let prior = format!("{}\nMarta,58,Femenino,110/70,80,18,97,300,1.1,ok", header_line());
        std::fs::write(&path, &prior).unwrap();

        reconcile(
            &record("Pedro", 81),
            &path,
            &Resolution::missing(),
            &MemoryStore::new(),
        )
        .await
        .unwrap();

        let expected = format!("{prior}\nPedro,81,Otro,130/85,0,0,0,0,0.9,\n");
        assert_eq!(std::fs::read(&path).unwrap(), expected.as_bytes());
    }

    #[test]
    fn test_to_crlf_leaves_quoted_newlines() {
        assert_eq!(
            to_crlf(b"Ana,\"tos\nfiebre\"\nLuis,\n"),
            b"Ana,\"tos\nfiebre\"\r\nLuis,\r\n"
        );
    }

    #[test]
    fn test_line_terminator_detection() {
        assert_eq!(line_terminator(b"a,b\r\n1,2\r\n"), b"\r\n");
        assert_eq!(line_terminator(b"a,b\n1,2\n"), b"\n");
        assert_eq!(line_terminator(b"a,b"), b"\n");
    }

    #[tokio::test]
    async fn test_local_file_wins_over_remote() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("datos.csv");
        std::fs::write(&path, record("Ana", 45).to_csv().unwrap()).unwrap();

        let store = MemoryStore::new();
        let id = store
            .seed("datos.csv", &record("Remoto", 1).to_csv().unwrap())
            .await;

        let reconciled = reconcile(&record("Luis", 70), &path, &Resolution::found(id), &store)
            .await
            .unwrap();

        assert_eq!(reconciled.origin, PriorOrigin::Local);
        let text = String::from_utf8(reconciled.bytes).unwrap();
        assert!(!text.contains("Remoto"));
        assert!(store.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_remote_copy_materialized_locally() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("datos.csv");

        let store = MemoryStore::new();
        let remote_bytes = record("Ana", 45).to_csv().unwrap();
        let id = store.seed("datos.csv", &remote_bytes).await;

        let reconciled = reconcile(
            &record("Luis", 70),
            &path,
            &Resolution::found(id.clone()),
            &store,
        )
        .await
        .unwrap();

        assert_eq!(reconciled.origin, PriorOrigin::Remote { id });
        let after = lines(&std::fs::read(&path).unwrap());
        assert_eq!(after.len(), 3);
        assert_eq!(after[1], lines(&remote_bytes)[1]);
        assert!(after[2].starts_with("Luis,70,"));
        assert_eq!(store.calls().await, vec![RemoteOperation::Download]);
    }

    #[tokio::test]
    async fn test_corrupt_local_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("datos.csv");
        std::fs::write(&path, b"Name,Age\nAna,45\n").unwrap();

        let err = reconcile(
            &record("Luis", 70),
            &path,
            &Resolution::missing(),
            &MemoryStore::new(),
        )
        .await
        .unwrap_err();

        assert!(err.is_malformed_data());
        assert_eq!(std::fs::read(&path).unwrap(), b"Name,Age\nAna,45\n");
    }

    #[tokio::test]
    async fn test_corrupt_remote_copy_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("datos.csv");
        let store = MemoryStore::new();
        let id = store.seed("datos.csv", b"garbage").await;

        let err = reconcile(&record("Luis", 70), &path, &Resolution::found(id), &store)
            .await
            .unwrap_err();

        assert!(err.is_malformed_data());
    }

    #[tokio::test]
    async fn test_download_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("datos.csv");
        let store = MemoryStore::new();
        let id = store.seed("datos.csv", b"").await;
        store.fail_on(RemoteOperation::Download).await;

        let err = reconcile(&record("Luis", 70), &path, &Resolution::found(id), &store)
            .await
            .unwrap_err();

        assert!(err.is_remote());
        assert!(!path.exists());
    }
}
