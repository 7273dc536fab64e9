//! The chat input controller: draft text plus the attached-file list.
//!
//! The composer never talks to the chat endpoint itself; it hands the
//! draft and the completed attachments to its owner on submit. Each
//! attachment lives under its own temporary id so concurrent uploads
//! can't clobber each other's state.
use uuid::Uuid;

use super::models::UploadedDocument;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComposeMode {
    Idle,
    Uploading,
}

#[derive(Clone, Debug)]
enum AttachmentState {
    Uploading,
    Completed(UploadedDocument),
}

#[derive(Clone, Debug)]
pub struct Attachment {
    id: String,
    file_name: String,
    state: AttachmentState,
}

impl Attachment {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn is_uploading(&self) -> bool {
        matches!(self.state, AttachmentState::Uploading)
    }
}

/// What a successful submit hands to the owner: the draft text and the
/// documents whose uploads had completed.
#[derive(Debug)]
pub struct Submission {
    pub text: String,
    pub documents: Vec<UploadedDocument>,
}

#[derive(Default)]
pub struct Composer {
    draft: String,
    attachments: Vec<Attachment>,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn push_str(&mut self, s: &str) {
        self.draft.push_str(s);
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    pub fn mode(&self) -> ComposeMode {
        if self.attachments.iter().any(Attachment::is_uploading) {
            ComposeMode::Uploading
        } else {
            ComposeMode::Idle
        }
    }

    /// Plain enter submits; shift+enter inserts a literal newline into
    /// the draft instead.
    pub fn handle_enter(&mut self, shift_held: bool) -> Option<Submission> {
        if shift_held {
            self.draft.push('\n');
            return None;
        }
        self.submit()
    }

    /// No-op when the trimmed draft is empty. Otherwise clears the
    /// draft and the attachment list and yields the submission.
    pub fn submit(&mut self) -> Option<Submission> {
        if self.draft.trim().is_empty() {
            return None;
        }
        let text = std::mem::take(&mut self.draft);
        let documents = self
            .attachments
            .drain(..)
            .filter_map(|a| match a.state {
                AttachmentState::Completed(doc) => Some(doc),
                AttachmentState::Uploading => None,
            })
            .collect();

        Some(Submission { text, documents })
    }

    /// Registers a file whose upload just started and returns its
    /// temporary id.
    pub fn begin_upload(&mut self, file_name: &str) -> String {
        let id = Uuid::new_v4().to_string();
        self.attachments.push(Attachment {
            id: id.clone(),
            file_name: file_name.to_string(),
            state: AttachmentState::Uploading,
        });
        id
    }

    pub fn finish_upload(&mut self, temp_id: &str, document: UploadedDocument) {
        if let Some(attachment) = self.attachments.iter_mut().find(|a| a.id == temp_id) {
            attachment.state = AttachmentState::Completed(document);
        }
    }

    /// Drops a failed upload from the list. Surfacing the failure to
    /// the user is the caller's job.
    pub fn fail_upload(&mut self, temp_id: &str) {
        self.attachments.retain(|a| a.id != temp_id);
    }

    /// Removes a completed attachment. Refused while that attachment is
    /// still mid-upload.
    pub fn remove(&mut self, temp_id: &str) -> bool {
        match self.attachments.iter().position(|a| a.id == temp_id) {
            Some(i) if !self.attachments[i].is_uploading() => {
                self.attachments.remove(i);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::models::DocumentStatus;

    fn test_document(id: &str, name: &str) -> UploadedDocument {
        UploadedDocument {
            id: id.to_string(),
            name: name.to_string(),
            chunk_count: 1,
            uploaded_at: chrono::Utc::now(),
            status: DocumentStatus::Ready,
        }
    }

    #[test]
    fn test_submit_empty_draft_is_noop() {
        let mut composer = Composer::new();
        composer.push_str("   \n  ");
        assert!(composer.submit().is_none());
    }

    #[test]
    fn test_submit_clears_state() {
        let mut composer = Composer::new();
        composer.push_str("hello");
        let temp_id = composer.begin_upload("report.pdf");
        composer.finish_upload(&temp_id, test_document("doc-1", "report.pdf"));

        let submission = composer.submit().expect("Should submit");
        assert_eq!(submission.text, "hello");
        assert_eq!(submission.documents.len(), 1);
        assert_eq!(submission.documents[0].id, "doc-1");

        assert_eq!(composer.draft(), "");
        assert!(composer.attachments().is_empty());
    }

    #[test]
    fn test_shift_enter_inserts_newline() {
        let mut composer = Composer::new();
        composer.push_str("line one");
        assert!(composer.handle_enter(true).is_none());
        composer.push_str("line two");

        let submission = composer.handle_enter(false).expect("Should submit");
        assert_eq!(submission.text, "line one\nline two");
    }

    #[test]
    fn test_mode_tracks_upload_lifecycle() {
        let mut composer = Composer::new();
        assert_eq!(composer.mode(), ComposeMode::Idle);

        let temp_id = composer.begin_upload("report.pdf");
        assert_eq!(composer.mode(), ComposeMode::Uploading);

        composer.finish_upload(&temp_id, test_document("doc-1", "report.pdf"));
        assert_eq!(composer.mode(), ComposeMode::Idle);
    }

    #[test]
    fn test_failed_upload_is_dropped() {
        let mut composer = Composer::new();
        let temp_id = composer.begin_upload("report.pdf");
        composer.fail_upload(&temp_id);

        assert!(composer.attachments().is_empty());
        assert_eq!(composer.mode(), ComposeMode::Idle);
    }

    #[test]
    fn test_remove_refused_while_uploading() {
        let mut composer = Composer::new();
        let temp_id = composer.begin_upload("report.pdf");
        assert!(!composer.remove(&temp_id));
        assert_eq!(composer.attachments().len(), 1);

        composer.finish_upload(&temp_id, test_document("doc-1", "report.pdf"));
        assert!(composer.remove(&temp_id));
        assert!(composer.attachments().is_empty());
    }

    #[test]
    fn test_submit_keeps_only_completed_attachments() {
        let mut composer = Composer::new();
        composer.push_str("go");
        let done = composer.begin_upload("report.pdf");
        composer.finish_upload(&done, test_document("doc-1", "report.pdf"));
        let _still_uploading = composer.begin_upload("big.docx");

        let submission = composer.submit().expect("Should submit");
        assert_eq!(submission.documents.len(), 1);
        assert_eq!(submission.documents[0].id, "doc-1");
    }

    #[test]
    fn test_concurrent_uploads_tracked_independently() {
        let mut composer = Composer::new();
        let a = composer.begin_upload("a.pdf");
        let b = composer.begin_upload("b.pdf");
        assert_ne!(a, b);

        composer.finish_upload(&b, test_document("doc-b", "b.pdf"));
        let states: Vec<bool> = composer.attachments().iter().map(|x| x.is_uploading()).collect();
        assert_eq!(states, vec![true, false]);
    }
}
