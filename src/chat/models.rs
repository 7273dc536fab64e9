//! The core models for a stateful chat against the backend.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "ai")]
    Ai,
}

/// One entry in the transcript. Immutable once appended: the document
/// flags reflect the attached set at send time, not the current set.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    /// Monotonic per-session token assigned by the controller.
    pub id: u64,
    pub text: String,
    pub sender: Sender,
    pub has_documents: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_filename: Option<String>,
}

impl Message {
    pub fn user(id: u64, text: &str, document_filename: Option<String>) -> Self {
        Message {
            id,
            text: text.to_string(),
            sender: Sender::User,
            has_documents: document_filename.is_some(),
            document_filename,
        }
    }

    pub fn ai(id: u64, text: &str) -> Self {
        Message {
            id,
            text: text.to_string(),
            sender: Sender::Ai,
            has_documents: false,
            document_filename: None,
        }
    }
}

/// Append-only ordered list of messages for one chat session. Lives in
/// memory only; nothing beyond the session id survives the process.
#[derive(Default)]
pub struct Transcript(Vec<Message>);

impl Transcript {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn messages(&self) -> Vec<Message> {
        self.0.clone()
    }

    pub fn push(&mut self, msg: Message) {
        self.0.push(msg)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.0.iter()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentStatus {
    #[serde(rename = "uploading")]
    Uploading,
    #[serde(rename = "ready")]
    Ready,
}

/// A document the backend has chunked and indexed. Its id rides along
/// with chat requests to scope AI context.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadedDocument {
    pub id: String,
    pub name: String,
    pub chunk_count: u64,
    pub uploaded_at: DateTime<Utc>,
    pub status: DocumentStatus,
}
