use std::path::Path;

use anyhow::{Result, bail};

use super::DocumentCommand;
use crate::auth::current_user_id;
use crate::core::AppConfig;
use crate::core::db::{PENDING_DOCUMENT_KEY, async_db, kv_set};
use crate::documents::DocumentClient;

/// Uploads a document and leaves its descriptor behind for the next
/// `chat` run to pick up.
pub async fn upload(path: &str, config: &AppConfig) -> Result<()> {
    let db = async_db(&config.storage_path).await?;
    let Some(user_id) = current_user_id(&db).await else {
        bail!("Not signed in. Run `confer login` first.");
    };

    let client = DocumentClient::new(&config.api_base_url);
    let doc = client.upload(Path::new(path), &user_id).await?;

    kv_set(&db, PENDING_DOCUMENT_KEY, &serde_json::to_string(&doc)?).await?;
    println!(
        "Uploaded {} ({} chunks). It will be attached to your next chat.",
        doc.name, doc.chunk_count
    );

    Ok(())
}

pub async fn run(command: DocumentCommand, config: &AppConfig) -> Result<()> {
    let db = async_db(&config.storage_path).await?;
    let Some(user_id) = current_user_id(&db).await else {
        bail!("Not signed in. Run `confer login` first.");
    };

    let client = DocumentClient::new(&config.api_base_url);

    match command {
        DocumentCommand::List => {
            let list = client.list(&user_id).await?;
            if list.documents.is_empty() {
                println!("No documents uploaded yet.");
                return Ok(());
            }
            for doc in &list.documents {
                println!(
                    "{}  {}  ({} chunks)",
                    doc["document_id"].as_str().unwrap_or("?"),
                    doc["filename"].as_str().unwrap_or("?"),
                    doc["total_chunks"].as_u64().unwrap_or(0),
                );
            }
            println!("{} document(s) total", list.total_documents);
        }
        DocumentCommand::Delete { document_id } => {
            client.delete(&document_id, &user_id).await?;
            println!("Deleted {document_id}");
        }
        DocumentCommand::Search { query, top_k } => {
            let response = client.search(&query, &user_id, top_k).await?;
            if response.results.is_empty() {
                println!("No results for \"{}\"", response.query);
                return Ok(());
            }
            for result in &response.results {
                println!(
                    "[{:.2}] {}: {}",
                    result["score"].as_f64().unwrap_or(0.0),
                    result["filename"].as_str().unwrap_or("?"),
                    result["text"].as_str().unwrap_or(""),
                );
            }
            println!("{} result(s)", response.total_results);
        }
    }

    Ok(())
}
