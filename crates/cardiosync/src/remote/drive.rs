//! Google Drive v3 remote store.
//!
//! Talks to the Drive REST API with a bearer token supplied by the caller.
//! Token acquisition is outside this module.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use tracing::debug;

use super::{RemoteObject, RemoteOperation, RemoteStore};
use crate::error::{Error, Result};

/// Default Drive metadata endpoint.
pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Default Drive media upload endpoint.
pub const DEFAULT_UPLOAD_BASE: &str = "https://www.googleapis.com/upload/drive/v3";

const CSV_MIME_TYPE: &str = "text/csv";

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
    name: String,
}

/// A remote store backed by Google Drive.
#[derive(Debug, Clone)]
pub struct DriveStore {
    client: Client,
    access_token: String,
    api_base: String,
    upload_base: String,
}

impl DriveStore {
    /// Create a store against the given metadata and upload endpoints.
    #[must_use]
    pub fn with_endpoints(
        access_token: impl Into<String>,
        api_base: impl Into<String>,
        upload_base: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            access_token: access_token.into(),
            api_base: trim_base(api_base.into()),
            upload_base: trim_base(upload_base.into()),
        }
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.bearer_auth(&self.access_token)
    }

    fn files_url(&self) -> String {
        format!("{}/files", self.api_base)
    }

    fn file_url(&self, id: &str) -> String {
        format!("{}/files/{id}", self.api_base)
    }

    fn upload_url(&self) -> String {
        format!("{}/files", self.upload_base)
    }

    fn media_url(&self, id: &str) -> String {
        format!("{}/files/{id}", self.upload_base)
    }
}

fn trim_base(mut base: String) -> String {
    while base.ends_with('/') {
        base.pop();
    }
    base
}

/// Build the `files.list` query matching one exact, non-trashed name.
#[must_use]
pub fn name_query(name: &str) -> String {
    let escaped = name.replace('\\', "\\\\").replace('\'', "\\'");
    format!("name='{escaped}' and trashed=false")
}

/// Boundary for a `multipart/related` body.
///
/// Derived from the content digest so it cannot occur inside the content.
fn multipart_boundary(content: &[u8]) -> String {
    format!("cardiosync-{}", &blake3::hash(content).to_hex().as_str()[..32])
}

/// Encode metadata and media as one `multipart/related` body.
fn multipart_body(boundary: &str, metadata: &serde_json::Value, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(content.len() + 256);
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata.to_string().as_bytes());
    body.extend_from_slice(format!("\r\n--{boundary}\r\n").as_bytes());
    body.extend_from_slice(format!("Content-Type: {CSV_MIME_TYPE}\r\n\r\n").as_bytes());
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

async fn check_status(operation: RemoteOperation, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::remote(operation, format!("HTTP {status}: {}", body.trim())))
}

#[async_trait]
impl RemoteStore for DriveStore {
    fn name(&self) -> &'static str {
        "drive"
    }

    async fn list(&self, name: &str) -> Result<Vec<RemoteObject>> {
        let query = name_query(name);
        debug!("Drive files.list q={}", query);
        let response = self
            .authorized(self.client.get(self.files_url()))
            .query(&[
                ("q", query.as_str()),
                ("spaces", "drive"),
                ("fields", "files(id,name)"),
            ])
            .send()
            .await?;
        let list: FileList = check_status(RemoteOperation::List, response)
            .await?
            .json()
            .await?;

        Ok(list
            .files
            .into_iter()
            .map(|f| RemoteObject {
                id: f.id,
                name: f.name,
            })
            .collect())
    }

    async fn create(&self, name: &str, content: &[u8]) -> Result<String> {
        let metadata = serde_json::json!({ "name": name, "mimeType": CSV_MIME_TYPE });
        let boundary = multipart_boundary(content);
        let response = self
            .authorized(self.client.post(self.upload_url()))
            .query(&[("uploadType", "multipart"), ("fields", "id,name")])
            .header(
                CONTENT_TYPE,
                format!("multipart/related; boundary={boundary}"),
            )
            .body(multipart_body(&boundary, &metadata, content))
            .send()
            .await?;
        let file: DriveFile = check_status(RemoteOperation::Create, response)
            .await?
            .json()
            .await?;
        debug!("Drive created {} as {}", file.name, file.id);
        Ok(file.id)
    }

    async fn update(&self, id: &str, content: &[u8]) -> Result<()> {
        let response = self
            .authorized(self.client.patch(self.media_url(id)))
            .query(&[("uploadType", "media")])
            .header(CONTENT_TYPE, CSV_MIME_TYPE)
            .body(content.to_vec())
            .send()
            .await?;
        check_status(RemoteOperation::Update, response).await?;
        Ok(())
    }

    async fn download(&self, id: &str) -> Result<Vec<u8>> {
        let response = self
            .authorized(self.client.get(self.file_url(id)))
            .query(&[("alt", "media")])
            .send()
            .await?;
        let bytes = check_status(RemoteOperation::Download, response)
            .await?
            .bytes()
            .await?;
        Ok(bytes.to_vec())
    }
}
