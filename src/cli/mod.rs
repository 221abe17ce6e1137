use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::backend::{HttpBackend, SharedBackend};
use crate::core::AppConfig;

pub mod chat;
pub mod documents;
pub mod upload;

#[derive(Subcommand)]
enum DocumentsCommand {
    /// List every uploaded document
    List {},
    /// Show a single document
    Get { id: String },
    /// Delete a document from the backend
    Delete { id: String },
}

#[derive(Subcommand)]
enum Command {
    /// Start an interactive conversation about a document
    Chat {
        /// Upload this file before starting
        #[arg(long)]
        file: Option<PathBuf>,
        /// Start with a previously uploaded document
        #[arg(long, conflicts_with = "file")]
        document: Option<String>,
    },
    /// Upload a PDF or TXT file and print the resulting document
    Upload { path: PathBuf },
    /// Manage uploaded documents
    Documents {
        #[command(subcommand)]
        command: DocumentsCommand,
    },
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Override the backend API URL, e.g. http://localhost:5000/api
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=info", env!("CARGO_CRATE_NAME")).into()),
        )
        // Keep stdout for the conversation itself
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

pub async fn run() -> Result<()> {
    let args = Cli::parse();
    init_tracing();

    let mut config = AppConfig::default();
    if let Some(api_url) = args.api_url {
        config.api_base_path = api_url;
    }
    let backend: SharedBackend = Arc::new(HttpBackend::from_config(&config));
    tracing::debug!("Using backend at {}", config.api_base_url());

    // Handle each sub command
    match args.command {
        Some(Command::Chat { file, document }) => {
            chat::run(&config, backend, file, document).await?;
        }
        Some(Command::Upload { path }) => {
            upload::run(backend, &path).await?;
        }
        Some(Command::Documents { command }) => match command {
            DocumentsCommand::List {} => documents::list(backend).await?,
            DocumentsCommand::Get { id } => documents::get(backend, &id).await?,
            DocumentsCommand::Delete { id } => documents::delete(backend, &id).await?,
        },
        None => {}
    }

    Ok(())
}
