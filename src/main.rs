use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use subscriber_index::config::{default_database_path, LOG_ENV};
use subscriber_index::{EventQuery, IndexWatcher, SubscriberIndex};

/// Shopware init-resource subscriber index
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Workspace root to index
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,
    /// Index database, defaults to one per workspace in the user cache dir
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Index every PHP file in the workspace
    Index,
    /// Show the handlers registered for an event
    Lookup {
        /// Event identifier, e.g. Enlight_Bootstrap_InitResource_swagcoupons
        event: String,
        #[arg(long)]
        json: bool,
    },
    /// List indexed events, optionally filtered by name
    Events {
        pattern: Option<String>,
        #[arg(long, default_value_t = 50)]
        limit: usize,
        /// Only events subscribed from at least this many files
        #[arg(long)]
        min_files: Option<usize>,
    },
    /// Print index statistics
    Status,
    /// Index the workspace, then keep it current until interrupted
    Watch,
    /// Drop every indexed entry
    Clear,
}

fn init_log() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var(LOG_ENV)
                .from_env_lossy(),
        )
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    init_log();
    let cli = Cli::parse();

    let root = cli.root.canonicalize()?;
    let db_path = cli.db.unwrap_or_else(|| default_database_path(&root));
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let index = SubscriberIndex::open(root, &db_path)?;

    match cli.command {
        Command::Index => {
            let stats = index.index_workspace()?;
            println!(
                "{} files, {} indexed, {} unchanged, {} failed, {} removed, {} subscriptions ({}ms)",
                stats.files_discovered,
                stats.files_indexed,
                stats.files_unchanged,
                stats.files_failed,
                stats.files_removed,
                stats.subscriptions,
                stats.duration_ms
            );
        }
        Command::Lookup { event, json } => {
            let hits = index.lookup_by_event(&event)?;
            if json {
                let values: Vec<_> = hits
                    .iter()
                    .map(|(file, subscription)| {
                        serde_json::json!({
                            "file": file,
                            "service": subscription.service_name,
                            "key": subscription.raw_key,
                            "signature": subscription.signature,
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&values)?);
            } else if hits.is_empty() {
                println!("No handlers for {}", event);
            } else {
                for (file, subscription) in hits {
                    println!(
                        "{}\t{}\t{}",
                        subscription.service_name, subscription.signature, file
                    );
                }
            }
        }
        Command::Events {
            pattern,
            limit,
            min_files,
        } => {
            let mut query = EventQuery::text(pattern.as_deref().unwrap_or("")).with_limit(limit);
            if let Some(min) = min_files {
                query = query.with_min_files(min);
            }
            for result in index.search_events(&query)? {
                println!(
                    "{}\t{} handlers in {} files",
                    result.summary.event,
                    result.summary.subscription_count,
                    result.summary.file_count
                );
            }
        }
        Command::Status => {
            let store = index.store();
            println!("workspace:     {}", index.workspace_root().display());
            println!("database:      {}", db_path.display());
            println!("enabled:       {}", index.settings().enabled);
            println!("files:         {}", store.file_count()?);
            println!("events:        {}", store.event_count()?);
            println!("subscriptions: {}", store.count()?);
        }
        Command::Watch => {
            let index = std::sync::Arc::new(index);
            index.index_workspace()?;
            let _watcher = IndexWatcher::new(index)?;
            loop {
                std::thread::park();
            }
        }
        Command::Clear => {
            index.store().invalidate_all()?;
            println!("Index cleared");
        }
    }

    Ok(())
}
