//! HTTP client for the backend chat endpoint.
use std::time::Duration;

use anyhow::{Error, Result};
use serde::{Deserialize, Serialize};

/// Wire shape of `POST /api/chat`. `session_id` serializes as JSON null
/// until the backend has assigned one; `document_ids` is omitted entirely
/// when no documents are attached.
#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub message: &'a str,
    pub session_id: Option<&'a str>,
    pub user_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_ids: Option<&'a [String]>,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub ai_response: String,
    pub session_id: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ChatClient {
    base_url: String,
    http: reqwest::Client,
    timeout: Duration,
}

impl ChatClient {
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

    pub async fn send_message(&self, request: &ChatRequest<'_>) -> Result<ChatResponse, Error> {
        let url = format!("{}/api/chat", self.base_url);
        let response = self
            .http
            .post(url)
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response)
    }
}
