//! Document library endpoints: list, ingest and view stored PDFs.

use std::path::Path;

use futures::StreamExt;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::client::normalize_base_url;
use crate::error::{ClientError, Result, response_to_error};
use crate::http_client::build_http_client;
use crate::models::{DocumentInfo, DocumentListing, IngestResponse};

/// Client for the `/documents` endpoints.
#[derive(Debug, Clone)]
pub struct DocumentLibrary {
    http: Client,
    base_url: String,
}

impl DocumentLibrary {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self::from_parts(
            build_http_client()?,
            normalize_base_url(base_url)?,
        ))
    }

    pub(crate) fn from_parts(http: Client, base_url: String) -> Self {
        Self { http, base_url }
    }

    /// List stored documents.
    pub async fn list(&self) -> Result<Vec<DocumentInfo>> {
        let response = self
            .http
            .get(format!("{}/documents", self.base_url))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(response_to_error(response).await);
        }

        let listing: DocumentListing = response.json().await?;
        let files = listing.into_files();
        tracing::debug!(count = files.len(), "Listed documents");
        Ok(files)
    }

    /// Upload one PDF for ingestion.
    pub async fn ingest(&self, path: &Path) -> Result<IngestResponse> {
        if !path.is_file() {
            return Err(ClientError::MissingFile(path.display().to_string()));
        }

        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());
        tracing::info!(file = %file_name, bytes = bytes.len(), "Uploading document");

        let part = Part::bytes(bytes)
            .file_name(file_name.clone())
            .mime_str("application/pdf")?;
        let form = Form::new().part("file", part);

        let response = self
            .http
            .post(format!("{}/documents/ingest", self.base_url))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let err = response_to_error(response).await;
            tracing::error!(file = %file_name, error = %err, "Document ingest failed");
            return Err(err);
        }

        let ingested: IngestResponse = response.json().await?;
        tracing::info!(
            file = %file_name,
            chunks = ingested.chunks_inserted,
            "Document ingested"
        );
        Ok(ingested)
    }

    /// URL that serves the stored document for viewing.
    pub fn view_url(&self, filename: &str) -> String {
        format!(
            "{}/documents/view/{}",
            self.base_url,
            urlencoding::encode(filename)
        )
    }

    /// Stream a stored document into `writer`, returning the byte count.
    pub async fn download<W>(&self, filename: &str, writer: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        let response = self.http.get(self.view_url(filename)).send().await?;

        if !response.status().is_success() {
            return Err(response_to_error(response).await);
        }

        let mut written = 0u64;
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        writer.flush().await?;

        tracing::debug!(file = filename, bytes = written, "Downloaded document");
        Ok(written)
    }
}

/// Human-readable byte count: `0 Bytes`, `1.5 KB`, `2 MB`.
pub fn format_bytes(bytes: u64, decimals: usize) -> String {
    const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let k = 1024f64;
    let value = bytes as f64;
    let exponent = ((value.ln() / k.ln()).floor() as usize).min(UNITS.len() - 1);
    let scaled = value / k.powi(exponent as i32);

    let mut rendered = format!("{scaled:.decimals$}");
    if rendered.contains('.') {
        rendered = rendered
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string();
    }
    format!("{rendered} {}", UNITS[exponent])
}
