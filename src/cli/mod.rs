use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod auth;
pub mod chat;
pub mod documents;

use crate::core::AppConfig;

#[derive(Subcommand)]
enum Command {
    /// Log in and store the access token locally
    Login,
    /// Create an account and store the access token locally
    Register,
    /// Start a chat session
    Chat {
        /// Message to open the conversation with
        message: Option<String>,

        /// Upload a document and attach it to this session
        #[arg(long)]
        file: Option<String>,
    },
    /// Upload a document to attach to the next chat session
    Upload { path: String },
    /// Manage uploaded documents
    Documents {
        #[command(subcommand)]
        command: DocumentCommand,
    },
}

#[derive(Subcommand)]
pub enum DocumentCommand {
    /// List your uploaded documents
    List,
    /// Delete an uploaded document
    Delete { document_id: String },
    /// Search your documents
    Search {
        query: String,

        /// Number of results to return
        #[arg(long, default_value = "5")]
        top_k: u32,
    },
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

pub async fn run() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=warn", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Cli::parse();
    let config = AppConfig::default();

    match args.command {
        Some(Command::Login) => {
            auth::run(auth::Mode::Login, &config).await?;
        }
        Some(Command::Register) => {
            auth::run(auth::Mode::Register, &config).await?;
        }
        Some(Command::Chat { message, file }) => {
            chat::run(message, file, &config).await?;
        }
        Some(Command::Upload { path }) => {
            documents::upload(&path, &config).await?;
        }
        Some(Command::Documents { command }) => {
            documents::run(command, &config).await?;
        }
        None => {}
    }

    Ok(())
}
