//! Satchel - personal knowledge repository with incremental sync.
//!
//! Entry point for the `satchel` CLI.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use satchel::config::{DEFAULT_DEBOUNCE_SECS, DEFAULT_PULL_INTERVAL_SECS};
use satchel::ingest::{DocumentFilters, HeuristicPipeline, JsonDocumentStore, NullEmbedder, VectorStore};
use satchel::observability::init_tracing;
use satchel::storage::{self, Database, SyncSource};
use satchel::sync::{read_status, render_status, GitCli, Orchestrator, SyncOptions};
use satchel::watcher::{FileWatcher, Scheduler, SourceFilter};
use satchel::{Config, Result};

/// Satchel - personal knowledge repository with incremental sync.
#[derive(Parser, Debug)]
#[command(name = "satchel")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Data directory for the database, documents, and status file
    #[arg(short, long, env = "SATCHEL_DATA_DIR", default_value = "./satchel-data")]
    data_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "SATCHEL_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, env = "SATCHEL_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the data directory, database, and document store
    Init,

    /// Run one sync pass (pull, discover, ingest, push)
    Sync {
        /// Skip the remote pull before discovery
        #[arg(long)]
        no_pull: bool,

        /// Skip the commit and push after processing
        #[arg(long)]
        no_push: bool,

        /// Report discovery without ingesting or writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Watch sources and sync on changes until interrupted
    Watch {
        /// Quiet period in seconds before a change burst triggers a sync
        #[arg(long, env = "SATCHEL_DEBOUNCE_SECS", default_value_t = DEFAULT_DEBOUNCE_SECS)]
        debounce_secs: u64,

        /// Interval in seconds between periodic remote pulls
        #[arg(long, env = "SATCHEL_PULL_INTERVAL_SECS", default_value_t = DEFAULT_PULL_INTERVAL_SECS)]
        pull_interval_secs: u64,
    },

    /// Show daemon status and index counts
    Status,

    /// Manage sync sources
    Sources {
        #[command(subcommand)]
        command: SourcesCommand,
    },

    /// List ingested documents
    List {
        /// Only documents filed under this project
        #[arg(long)]
        project: Option<String>,

        /// Only documents from this source
        #[arg(long)]
        source: Option<String>,
    },

    /// Delete a document and block its content from re-ingestion
    Forget {
        /// Document id as shown by `satchel list`
        document_id: String,
    },
}

#[derive(Subcommand, Debug)]
enum SourcesCommand {
    /// Add a watched source directory
    Add {
        /// Unique source name
        name: String,

        /// Root directory to scan
        root: PathBuf,

        /// Glob pattern for files to ingest, relative to the root
        #[arg(long, default_value = "**/*.md")]
        glob: String,

        /// Project ingested documents are filed under
        #[arg(long, default_value = "default")]
        project: String,
    },

    /// List configured sources
    List,

    /// Enable a source
    Enable { name: String },

    /// Disable a source without removing it
    Disable { name: String },

    /// Remove a source (already-ingested documents are kept)
    Remove { name: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_json);

    let mut config = Config {
        data_dir: cli.data_dir,
        log_level: cli.log_level,
        ..Config::default()
    };
    if let Command::Watch {
        debounce_secs,
        pull_interval_secs,
    } = &cli.command
    {
        config.debounce_secs = *debounce_secs;
        config.pull_interval_secs = *pull_interval_secs;
    }
    config.validate()?;

    match cli.command {
        Command::Init => init(&config).await,
        Command::Sync {
            no_pull,
            no_push,
            dry_run,
        } => {
            sync(
                &config,
                SyncOptions {
                    pull: !no_pull,
                    push: !no_push,
                    dry_run,
                },
            )
            .await
        }
        Command::Watch { .. } => watch(&config).await,
        Command::Status => status(&config).await,
        Command::Sources { command } => sources(&config, command),
        Command::List { project, source } => {
            list(&config, DocumentFilters { project, source }).await
        }
        Command::Forget { document_id } => forget(&config, &document_id).await,
    }
}

fn open_database(config: &Config) -> Result<Database> {
    let db = Database::open(config.database_path())?;
    storage::init_storage(&db)?;
    Ok(db)
}

fn build_orchestrator(config: &Config, db: Database) -> Arc<Orchestrator> {
    Arc::new(Orchestrator::new(
        db,
        config.clone(),
        Arc::new(HeuristicPipeline::new()),
        Arc::new(NullEmbedder::new()),
        Arc::new(JsonDocumentStore::new(config.documents_dir())),
        Arc::new(GitCli::new()),
    ))
}

async fn init(config: &Config) -> Result<()> {
    tokio::fs::create_dir_all(&config.data_dir).await?;
    tokio::fs::create_dir_all(config.documents_dir()).await?;
    open_database(config)?;

    // The database and status file are machine-local; only documents/
    // travel through git
    let gitignore = "satchel.db\nsatchel.db-wal\nsatchel.db-shm\ndaemon-status.json\n";
    tokio::fs::write(config.data_dir.join(".gitignore"), gitignore).await?;

    if !config.data_dir.join(".git").exists() {
        match tokio::process::Command::new("git")
            .arg("init")
            .current_dir(&config.data_dir)
            .output()
            .await
        {
            Ok(output) if output.status.success() => {
                tracing::info!("Initialized git repository in data directory");
            }
            Ok(output) => {
                tracing::warn!(
                    stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                    "git init failed, continuing local-only"
                );
            }
            Err(e) => {
                tracing::warn!(error = %e, "git not available, continuing local-only");
            }
        }
    }

    println!("Initialized satchel data directory at {}", config.data_dir.display());
    println!("Add a source with: satchel sources add <name> <root>");
    Ok(())
}

async fn sync(config: &Config, options: SyncOptions) -> Result<()> {
    let db = open_database(config)?;
    let orchestrator = build_orchestrator(config, db);

    let result = orchestrator.sync(options).await?;

    if options.dry_run {
        println!("dry run: nothing written");
    }
    println!(
        "discovery: {} total, {} new, {} existing, {} blocked, {} errors",
        result.discovery.total_files,
        result.discovery.new_files,
        result.discovery.existing_files,
        result.discovery.blocked,
        result.discovery.errors,
    );
    println!(
        "processing: {} processed, {} errors",
        result.processing.processed, result.processing.errors,
    );
    for title in &result.processing.titles {
        println!("  + {title}");
    }
    if let Some(error) = &result.git_error {
        println!("git error: {error}");
    }
    Ok(())
}

async fn watch(config: &Config) -> Result<()> {
    let db = open_database(config)?;
    let orchestrator = build_orchestrator(config, db.clone());

    // Catch up before watching so the first debounce only covers new edits
    if let Err(e) = orchestrator
        .sync(SyncOptions {
            pull: true,
            push: true,
            dry_run: false,
        })
        .await
    {
        tracing::error!(error = %e, "Startup sync failed");
    }

    let sources = db.with_conn(|conn| storage::list_enabled_sources(conn))?;
    if sources.is_empty() {
        tracing::warn!("No enabled sources configured; watching nothing");
    }

    let (mut watcher, events) = FileWatcher::new()?;
    for source in &sources {
        if let Err(e) = watcher.watch(&source.root_path) {
            tracing::warn!(source = %source.name, error = %e, "Cannot watch source root");
        }
    }

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_token.cancel();
        }
    });

    let scheduler = Scheduler::new(
        orchestrator,
        events,
        SourceFilter::from_sources(&sources),
        config.debounce(),
        config.pull_interval(),
        shutdown,
    );
    scheduler.run().await;

    drop(watcher);
    Ok(())
}

async fn status(config: &Config) -> Result<()> {
    let daemon = read_status(&config.status_path()).await?;
    print!("{}", render_status(daemon.as_ref(), storage::now_unix()));

    let db = open_database(config)?;
    let (documents, blocked, sources) = db.with_conn(|conn| {
        Ok((
            storage::count_entries(conn)?,
            storage::count_blocked(conn)?,
            storage::list_sources(conn)?,
        ))
    })?;
    let enabled = sources.iter().filter(|s| s.enabled).count();
    println!(
        "index: {documents} documents, {blocked} blocked, {enabled}/{} sources enabled",
        sources.len()
    );
    Ok(())
}

fn sources(config: &Config, command: SourcesCommand) -> Result<()> {
    let db = open_database(config)?;

    match command {
        SourcesCommand::Add {
            name,
            root,
            glob,
            project,
        } => {
            // Stored absolute so watcher events and scan roots line up
            let root = std::fs::canonicalize(&root).unwrap_or(root);
            let source = SyncSource::new(
                name.clone(),
                root.to_string_lossy().to_string(),
                glob,
                project,
            );
            db.with_conn(|conn| storage::add_source(conn, &source))?;
            println!("Added source '{name}' at {}", root.display());
        }
        SourcesCommand::List => {
            let sources = db.with_conn(|conn| storage::list_sources(conn))?;
            if sources.is_empty() {
                println!("no sources configured");
            }
            for source in sources {
                println!(
                    "{} [{}] {} ({}) -> {}",
                    source.name,
                    if source.enabled { "enabled" } else { "disabled" },
                    source.root_path,
                    source.glob_pattern,
                    source.target_project,
                );
            }
        }
        SourcesCommand::Enable { name } => {
            set_enabled(&db, &name, true)?;
        }
        SourcesCommand::Disable { name } => {
            set_enabled(&db, &name, false)?;
        }
        SourcesCommand::Remove { name } => {
            let removed = db.with_conn(|conn| storage::remove_source(conn, &name))?;
            if removed {
                println!("Removed source '{name}'");
            } else {
                println!("No source named '{name}'");
            }
        }
    }
    Ok(())
}

fn set_enabled(db: &Database, name: &str, enabled: bool) -> Result<()> {
    let updated = db.with_conn(|conn| storage::set_source_enabled(conn, name, enabled))?;
    if updated {
        println!(
            "Source '{name}' {}",
            if enabled { "enabled" } else { "disabled" }
        );
    } else {
        println!("No source named '{name}'");
    }
    Ok(())
}

async fn list(config: &Config, filters: DocumentFilters) -> Result<()> {
    let store = JsonDocumentStore::new(config.documents_dir());
    let documents = store.get_all(&filters).await.map_err(satchel::Error::from)?;

    if documents.is_empty() {
        println!("no documents");
        return Ok(());
    }
    for doc in documents {
        println!(
            "{}  {}  [{}/{}]",
            doc.document_id, doc.title, doc.project, doc.source_name
        );
    }
    Ok(())
}

async fn forget(config: &Config, document_id: &str) -> Result<()> {
    let db = open_database(config)?;
    let orchestrator = build_orchestrator(config, db);

    if orchestrator.forget(document_id).await? {
        println!("Forgot document {document_id}; its content will not be re-ingested");
    } else {
        println!("No document with id {document_id}");
    }
    Ok(())
}
