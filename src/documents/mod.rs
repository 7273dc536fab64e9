//! Client for the backend's document endpoints: multipart upload plus
//! delete, list, and search.
//!
//! Files are validated before any network I/O (type by extension, size
//! from metadata) and every failure maps onto a small fixed taxonomy so
//! callers only ever show a short human-readable string.
use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::chat::models::{DocumentStatus, UploadedDocument};

pub const MAX_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("File too large. Maximum size is 10MB.")]
    FileTooLarge,
    #[error("File type not supported. Please upload PDF, DOCX, or TXT files.")]
    UnsupportedType,
    #[error("The request timed out. Please try again.")]
    Timeout,
    #[error("{detail}")]
    Api { status: u16, detail: String },
    #[error("Network error. Please check your connection and try again.")]
    Transport(#[source] reqwest::Error),
    #[error("Could not read file: {0}")]
    Io(#[from] std::io::Error),
}

fn transport(e: reqwest::Error) -> DocumentError {
    if e.is_timeout() {
        DocumentError::Timeout
    } else {
        DocumentError::Transport(e)
    }
}

/// Maps a file onto one of the backend's accepted MIME types. Anything
/// else is rejected client-side.
fn content_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "pdf" => Some("application/pdf"),
        "docx" => {
            Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document")
        }
        "txt" => Some("text/plain"),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    document_id: String,
    filename: String,
    #[serde(default)]
    total_chunks: u64,
}

#[derive(Debug, Deserialize)]
pub struct DocumentList {
    pub user_id: String,
    #[serde(default)]
    pub documents: Vec<Value>,
    #[serde(default)]
    pub total_documents: u64,
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    #[serde(default)]
    pub results: Vec<Value>,
    #[serde(default)]
    pub total_results: u64,
}

#[derive(Clone, Debug)]
pub struct DocumentClient {
    base_url: String,
    http: reqwest::Client,
    timeout: Duration,
}

impl DocumentClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_timeout(base_url, Duration::from_secs(60))
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            timeout,
        }
    }

    /// Uploads a file for chunking and indexing. Validation happens
    /// before the file is even read.
    pub async fn upload(
        &self,
        path: &Path,
        user_id: &str,
    ) -> Result<UploadedDocument, DocumentError> {
        let mime = content_type_for(path).ok_or(DocumentError::UnsupportedType)?;
        let metadata = fs::metadata(path)?;
        if metadata.len() > MAX_FILE_SIZE_BYTES {
            return Err(DocumentError::FileTooLarge);
        }

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        let bytes = fs::read(path)?;

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime)
            .map_err(transport)?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("user_id", user_id.to_string());

        let url = format!("{}/api/documents/upload", self.base_url);
        let response = self
            .http
            .post(url)
            .timeout(self.timeout)
            .multipart(form)
            .send()
            .await
            .map_err(transport)?;
        let response = check_status(response).await?;
        let body: UploadResponse = response.json().await.map_err(transport)?;

        tracing::info!(
            "Uploaded {} as {} ({} chunks)",
            body.filename,
            body.document_id,
            body.total_chunks
        );

        Ok(UploadedDocument {
            id: body.document_id,
            name: body.filename,
            chunk_count: body.total_chunks,
            uploaded_at: Utc::now(),
            status: DocumentStatus::Ready,
        })
    }

    pub async fn delete(&self, document_id: &str, user_id: &str) -> Result<(), DocumentError> {
        let url = format!(
            "{}/api/documents/{}",
            self.base_url,
            urlencoding::encode(document_id)
        );
        let response = self
            .http
            .delete(url)
            .timeout(self.timeout)
            .form(&[("user_id", user_id)])
            .send()
            .await
            .map_err(transport)?;
        check_status(response).await?;
        Ok(())
    }

    pub async fn list(&self, user_id: &str) -> Result<DocumentList, DocumentError> {
        let url = format!(
            "{}/api/documents/{}",
            self.base_url,
            urlencoding::encode(user_id)
        );
        let response = self
            .http
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(transport)?;
        let response = check_status(response).await?;
        response.json().await.map_err(transport)
    }

    pub async fn search(
        &self,
        query: &str,
        user_id: &str,
        top_k: u32,
    ) -> Result<SearchResponse, DocumentError> {
        let url = format!("{}/api/documents/search", self.base_url);
        let top_k = top_k.to_string();
        let response = self
            .http
            .post(url)
            .timeout(self.timeout)
            .form(&[("query", query), ("user_id", user_id), ("top_k", &top_k)])
            .send()
            .await
            .map_err(transport)?;
        let response = check_status(response).await?;
        response.json().await.map_err(transport)
    }
}

/// Folds a non-2xx response into the error taxonomy, surfacing the
/// backend's `detail` string when it sent one.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, DocumentError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        return Err(DocumentError::FileTooLarge);
    }
    if status == StatusCode::UNSUPPORTED_MEDIA_TYPE {
        return Err(DocumentError::UnsupportedType);
    }
    let detail = response
        .json::<Value>()
        .await
        .ok()
        .and_then(|v| v["detail"].as_str().map(str::to_string))
        .unwrap_or_else(|| format!("Request failed with status {status}"));
    Err(DocumentError::Api {
        status: status.as_u16(),
        detail,
    })
}
