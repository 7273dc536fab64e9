//! The session/message controller: the single source of truth for what
//! has been said in a chat and what request is in flight.
//!
//! Invariants it maintains:
//! - the transcript is append-only and ordered by creation;
//! - the session id, once assigned by the backend, is never overwritten;
//! - a message's document flags are frozen at send time.
//!
//! All request failures fold back into the transcript as a fixed
//! user-visible AI message; nothing here is fatal.
//!
//! Use `ChatSession::builder()` to construct a session.
use tokio_rusqlite::Connection;

use super::client::{ChatClient, ChatRequest};
use super::models::{Message, Transcript, UploadedDocument};
use crate::core::db;

pub const DEFAULT_TITLE: &str = "New Chat";
pub const FAILURE_MESSAGE: &str = "Sorry, something went wrong. Please try again.";

const TITLE_MAX_CHARS: usize = 30;

/// One-shot payload handed to a freshly built session: an opening
/// message and/or a document uploaded before the chat started. Consumed
/// by `initialize` exactly once.
#[derive(Debug, Default)]
pub struct SessionSeed {
    pub initial_message: Option<String>,
    pub document: Option<UploadedDocument>,
}

pub struct ChatSession {
    client: ChatClient,
    user_id: String,
    store: Option<Connection>,
    transcript: Transcript,
    session_id: Option<String>,
    attached: Vec<UploadedDocument>,
    title: String,
    pending: bool,
    initialized: bool,
    next_message_id: u64,
}

impl ChatSession {
    pub fn builder(client: ChatClient, user_id: &str) -> SessionBuilder {
        SessionBuilder::new(client, user_id)
    }

    /// Consumes the one-shot seed. Runs at most once per session; a
    /// second call is a no-op so double-invoked callers can't duplicate
    /// the opening turn.
    pub async fn initialize(&mut self, seed: SessionSeed) {
        if self.initialized {
            return;
        }
        self.initialized = true;

        let SessionSeed {
            initial_message,
            document,
        } = seed;

        let seeded_with_document = document.is_some();
        if let Some(doc) = document {
            self.title = format!("📄 {}", doc.name);
            self.attached.push(doc);
        }

        if let Some(text) = initial_message {
            if !seeded_with_document {
                self.title = derive_title(&text);
            }
            self.push_user_message(&text);
            self.request_response(&text).await;
        }
    }

    /// Runs one user turn: append the user message, issue exactly one
    /// chat request, fold the outcome back into the transcript. Returns
    /// the AI message that was appended.
    pub async fn send(&mut self, text: &str) -> Message {
        self.push_user_message(text);
        self.request_response(text).await
    }

    /// Registers a document uploaded mid-conversation. Only when the
    /// set was empty does the title change; past messages are untouched.
    pub fn attach_document(&mut self, doc: UploadedDocument) {
        if self.attached.is_empty() {
            self.title = doc.name.clone();
        }
        self.attached.push(doc);
    }

    /// Drops a document from the attached set. Only when the last one
    /// goes does the title reset; past messages are untouched.
    pub fn remove_document(&mut self, document_id: &str) -> bool {
        let before = self.attached.len();
        self.attached.retain(|d| d.id != document_id);
        let removed = self.attached.len() < before;
        if removed && self.attached.is_empty() {
            self.title = DEFAULT_TITLE.to_string();
        }
        removed
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn attached_documents(&self) -> &[UploadedDocument] {
        &self.attached
    }

    /// True while a chat request is outstanding. Because `send` holds
    /// `&mut self` to completion there is at most one, never a queue.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    fn next_id(&mut self) -> u64 {
        self.next_message_id += 1;
        self.next_message_id
    }

    fn push_user_message(&mut self, text: &str) {
        let document_filename = self.attached.first().map(|d| d.name.clone());
        let id = self.next_id();
        self.transcript.push(Message::user(id, text, document_filename));
    }

    async fn request_response(&mut self, text: &str) -> Message {
        self.pending = true;

        let document_ids: Vec<String> = self.attached.iter().map(|d| d.id.clone()).collect();
        let request = ChatRequest {
            message: text,
            session_id: self.session_id.as_deref(),
            user_id: &self.user_id,
            document_ids: if document_ids.is_empty() {
                None
            } else {
                Some(&document_ids)
            },
        };

        let message = match self.client.send_message(&request).await {
            Ok(response) => {
                if self.session_id.is_none()
                    && let Some(session_id) = response.session_id
                {
                    self.record_session_id(session_id).await;
                }
                let id = self.next_id();
                Message::ai(id, &response.ai_response)
            }
            Err(e) => {
                tracing::error!("Chat request failed: {e:#}");
                let id = self.next_id();
                Message::ai(id, FAILURE_MESSAGE)
            }
        };

        self.transcript.push(message.clone());
        self.pending = false;
        message
    }

    async fn record_session_id(&mut self, session_id: String) {
        if let Some(store) = &self.store
            && let Err(e) = db::kv_set(store, db::CURRENT_SESSION_ID_KEY, &session_id).await
        {
            // Best-effort cross-run memory, not a source of truth
            tracing::warn!("Failed to persist session id: {e}");
        }
        self.session_id = Some(session_id);
    }
}

pub struct SessionBuilder {
    client: ChatClient,
    user_id: String,
    store: Option<Connection>,
}

impl SessionBuilder {
    pub fn new(client: ChatClient, user_id: &str) -> Self {
        Self {
            client,
            user_id: user_id.to_string(),
            store: None,
        }
    }

    /// Wire up the kv store so the backend-assigned session id survives
    /// the process.
    pub fn store(mut self, db: &Connection) -> Self {
        self.store = Some(db.clone());
        self
    }

    pub fn build(self) -> ChatSession {
        ChatSession {
            client: self.client,
            user_id: self.user_id,
            store: self.store,
            transcript: Transcript::new(),
            session_id: None,
            attached: Vec::new(),
            title: DEFAULT_TITLE.to_string(),
            pending: false,
            initialized: false,
            next_message_id: 0,
        }
    }
}

fn derive_title(text: &str) -> String {
    if text.chars().count() > TITLE_MAX_CHARS {
        let truncated: String = text.chars().take(TITLE_MAX_CHARS).collect();
        format!("{truncated}...")
    } else {
        text.to_string()
    }
}
