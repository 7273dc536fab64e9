use std::path::Path;

use anyhow::{Result, bail};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio_rusqlite::Connection;

use crate::auth;
use crate::chat::client::ChatClient;
use crate::chat::compose::Composer;
use crate::chat::models::{Sender, UploadedDocument};
use crate::chat::session::{ChatSession, SessionSeed};
use crate::core::AppConfig;
use crate::core::db::{self, async_db};
use crate::documents::DocumentClient;

pub async fn run(
    initial_message: Option<String>,
    file: Option<String>,
    config: &AppConfig,
) -> Result<()> {
    let db = async_db(&config.storage_path).await?;
    let Some(user) = auth::current_user(&db).await else {
        bail!("Not signed in. Run `confer login` first.");
    };

    let documents = DocumentClient::new(&config.api_base_url);

    // Assemble the one-shot seed: an explicit --file wins, otherwise
    // pick up whatever `confer upload` left behind. Either way the
    // pending key is gone once the chat starts.
    let seeded_document = match file {
        Some(path) => Some(documents.upload(Path::new(&path), &user.user_id).await?),
        None => take_pending_document(&db).await,
    };

    let client = ChatClient::new(&config.api_base_url);
    let mut session = ChatSession::builder(client, &user.user_id)
        .store(&db)
        .build();

    session
        .initialize(SessionSeed {
            initial_message,
            document: seeded_document,
        })
        .await;

    println!("── {} ──", session.title());
    for msg in session.transcript().iter() {
        print_message(&msg.sender, &msg.text);
    }

    let mut rl = DefaultEditor::new().expect("Editor failed");
    let mut composer = Composer::new();

    loop {
        let readline = rl.readline(">>> ");
        match readline {
            Ok(line) => {
                if let Some(rest) = line.strip_prefix("/attach ") {
                    attach(&mut composer, &mut session, &documents, &user.user_id, rest.trim())
                        .await;
                    continue;
                }
                if let Some(rest) = line.strip_prefix("/detach ") {
                    detach(&mut composer, &mut session, rest.trim());
                    continue;
                }
                match line.trim() {
                    "/docs" => {
                        for doc in session.attached_documents() {
                            println!("{}  {}  ({} chunks)", doc.id, doc.name, doc.chunk_count);
                        }
                        continue;
                    }
                    "/quit" => break,
                    _ => {}
                }

                // A trailing backslash is the terminal's shift+enter:
                // keep composing instead of sending.
                let (text, shift_held) = match line.strip_suffix('\\') {
                    Some(text) => (text, true),
                    None => (line.as_str(), false),
                };
                composer.push_str(text);

                if let Some(submission) = composer.handle_enter(shift_held) {
                    // Attachments made through /attach are already
                    // registered; anything else in the submission is new.
                    for doc in submission.documents {
                        if !session.attached_documents().iter().any(|d| d.id == doc.id) {
                            session.attach_document(doc);
                        }
                    }
                    println!("...");
                    let reply = session.send(&submission.text).await;
                    print_message(&reply.sender, &reply.text);
                }
            }
            Err(ReadlineError::Interrupted) => break,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}

fn print_message(sender: &Sender, text: &str) {
    match sender {
        Sender::User => println!("you: {text}"),
        Sender::Ai => println!("ai: {text}"),
    }
}

/// Reads and clears the descriptor left behind by `confer upload`. A
/// fresh chat always starts with the pending key empty.
async fn take_pending_document(db: &Connection) -> Option<UploadedDocument> {
    let raw = match db::kv_get(db, db::PENDING_DOCUMENT_KEY).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!("Failed to read pending document: {e}");
            return None;
        }
    };
    if let Err(e) = db::kv_delete(db, db::PENDING_DOCUMENT_KEY).await {
        tracing::warn!("Failed to clear pending document: {e}");
    }

    match serde_json::from_str(&raw) {
        Ok(doc) => Some(doc),
        Err(e) => {
            tracing::warn!("Discarding unreadable pending document: {e}");
            None
        }
    }
}

async fn attach(
    composer: &mut Composer,
    session: &mut ChatSession,
    documents: &DocumentClient,
    user_id: &str,
    path: &str,
) {
    let file_name = Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path);
    let temp_id = composer.begin_upload(file_name);

    match documents.upload(Path::new(path), user_id).await {
        Ok(doc) => {
            println!("Attached {} ({} chunks)", doc.name, doc.chunk_count);
            composer.finish_upload(&temp_id, doc.clone());
            session.attach_document(doc);
        }
        Err(e) => {
            composer.fail_upload(&temp_id);
            println!("Could not attach {file_name}: {e}");
        }
    }
}

fn detach(composer: &mut Composer, session: &mut ChatSession, name: &str) {
    let Some(temp_id) = composer
        .attachments()
        .iter()
        .find(|a| a.file_name() == name)
        .map(|a| a.id().to_string())
    else {
        // Not in the composer (e.g. carried in by the seed); fall back
        // to the session's attached set by document name.
        let Some(doc_id) = session
            .attached_documents()
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.id.clone())
        else {
            println!("No attached document named {name}");
            return;
        };
        session.remove_document(&doc_id);
        println!("Removed {name}");
        return;
    };

    if !composer.remove(&temp_id) {
        println!("{name} is still uploading; try again in a moment");
        return;
    }
    if let Some(doc_id) = session
        .attached_documents()
        .iter()
        .find(|d| d.name == name)
        .map(|d| d.id.clone())
    {
        session.remove_document(&doc_id);
    }
    println!("Removed {name}");
}
