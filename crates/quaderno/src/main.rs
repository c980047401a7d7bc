//! Quaderno - notebook client for the lavagna dashboard backend.
//!
//! Lists and toggles the sources of a notebook, imports resources found by
//! discovery search, and asks the assistant questions scoped to the
//! selected sources.

mod api;
mod chat;
mod config;
mod optimistic;
mod selection;
mod store;
mod types;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use api::ApiClient;
use config::Config;
use optimistic::{CommitOutcome, SyncEvent};
use selection::SourceSelection;
use store::NotebookSources;
use types::SourceType;

#[derive(Parser)]
#[command(name = "quaderno")]
#[command(about = "Notebook client: sources, discovery and chat")]
#[command(version)]
struct Cli {
    /// Notebook to work on (overrides QUADERNO_NOTEBOOK)
    #[arg(long, short, global = true)]
    notebook: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the documents known to the backend
    Documents,

    /// List the notebook's sources
    Sources,

    /// Select or deselect one source
    Toggle {
        /// Source id
        id: String,
    },

    /// Select all sources, or deselect all when every source is selected
    ToggleAll,

    /// Search for resources, optionally importing them as sources
    Discover {
        /// Free-text query
        query: String,

        /// Only this kind of resource (pdf, doc, text, url)
        #[arg(long = "type")]
        resource_type: Option<SourceType>,

        /// Maximum number of results
        #[arg(long)]
        limit: Option<usize>,

        /// Add every result to the notebook's sources
        #[arg(long)]
        import: bool,
    },

    /// Ask the assistant, using the selected sources as context
    Chat {
        /// Question to ask
        message: String,

        /// Directory for image and audio replies
        /// Default: current directory
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(notebook) = cli.notebook {
        config.notebook_id = notebook;
    }
    let client = ApiClient::new(config.api_url.clone());
    info!("Using backend {} (notebook {})", client.base_url(), config.notebook_id);

    match cli.command {
        Commands::Documents => {
            let documents = client.documents().await?;
            info!("{} documents", documents.len());
            for doc in &documents {
                info!(kind = %doc.kind, "{}", doc.name);
            }
        }
        Commands::Sources => {
            let selection = open_selection(&client, &config).await?;
            print_sources(&selection);
        }
        Commands::Toggle { id } => {
            let mut selection = open_selection(&client, &config).await?;
            let events = selection.subscribe();
            let outcome = selection.toggle_one(&id).await?;
            if outcome == CommitOutcome::Unchanged {
                warn!("No source with id {}", id);
            }
            report_events(events);
            print_sources(&selection);
        }
        Commands::ToggleAll => {
            let mut selection = open_selection(&client, &config).await?;
            let events = selection.subscribe();
            selection.toggle_all().await?;
            report_events(events);
            print_sources(&selection);
        }
        Commands::Discover {
            query,
            resource_type,
            limit,
            import,
        } => {
            discover_command(&client, &config, &query, resource_type, limit, import).await?;
        }
        Commands::Chat { message, output } => {
            chat_command(&client, &config, &message, output).await?;
        }
    }

    Ok(())
}

async fn open_selection(
    client: &ApiClient,
    config: &Config,
) -> Result<SourceSelection<NotebookSources>> {
    let store = NotebookSources::new(client.clone(), config.notebook_id.clone());
    let notebook_id = store.notebook_id().to_string();
    let mut selection = SourceSelection::new(store);
    selection
        .load()
        .await
        .with_context(|| format!("Failed to load sources of notebook {notebook_id}"))?;
    Ok(selection)
}

fn print_sources(selection: &SourceSelection<NotebookSources>) {
    info!(
        "{} of {} sources selected",
        selection.selected_count(),
        selection.sources().len()
    );
    for source in selection.sources() {
        let mark = if source.selected { "[x]" } else { "[ ]" };
        info!(
            id = %source.id,
            kind = %source.source_type,
            added = %source.date_added,
            "{} {}",
            mark,
            source.title
        );
    }
}

/// Tell the user when a change did not stick
fn report_events(mut events: broadcast::Receiver<SyncEvent>) {
    while let Ok(event) = events.try_recv() {
        match event {
            SyncEvent::RolledBack { reason, restored } => {
                warn!(
                    restored,
                    "Your change could not be saved ({}); showing the notebook as stored", reason
                );
            }
            SyncEvent::ReloadFailed { reason } => {
                error!("Your change could not be saved and the notebook could not be reloaded: {}", reason);
            }
            SyncEvent::Applied { .. } | SyncEvent::Committed { .. } => {}
        }
    }
}

async fn discover_command(
    client: &ApiClient,
    config: &Config,
    query: &str,
    resource_type: Option<SourceType>,
    limit: Option<usize>,
    import: bool,
) -> Result<()> {
    let results = client.discover(query, resource_type, limit).await?;
    info!("Found {} resources for \"{}\"", results.len(), query);
    for resource in &results {
        info!(
            id = %resource.id,
            kind = %resource.resource_type,
            subject = %resource.subject,
            level = %resource.level,
            url = resource.url.as_deref().unwrap_or("-"),
            "{}",
            resource.title
        );
    }

    if !import || results.is_empty() {
        return Ok(());
    }

    let mut selection = open_selection(client, config).await?;
    let events = selection.subscribe();
    if let CommitOutcome::Committed = selection.import_resources(&results).await? {
        info!("Imported {} resources", results.len());
    }
    report_events(events);
    print_sources(&selection);
    Ok(())
}

async fn chat_command(
    client: &ApiClient,
    config: &Config,
    message: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    let selection = open_selection(client, config).await?;
    info!("Asking with {} selected sources", selection.selected_count());

    let reply = client.chat(message, &selection.selected_ids()).await?;

    if let Some(text) = reply.text() {
        info!("{}", text);
        return Ok(());
    }

    let dir = output.unwrap_or_else(|| PathBuf::from("."));
    let stem = format!("reply-{}", chrono::Utc::now().format("%Y%m%d%H%M%S"));
    if let Some(path) = reply.save_blob(&dir, &stem)? {
        info!("Reply saved to: {:?}", path);
    }
    Ok(())
}
