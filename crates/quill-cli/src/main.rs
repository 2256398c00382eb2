//! Quill CLI - manage a personal quote collection from the terminal
//!
//! Browse random quotes, capture new ones, and keep the collection in
//! sync with the configured server.

mod error;

#[cfg(test)]
mod tests;

use std::env;
use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, shells};
use quill_core::config::SyncConfig;
use quill_core::export::{render_json_export, suggested_export_file_name};
use quill_core::import::{parse_import, ImportMode};
use quill_core::models::{Conflict, Quote, ResolutionChoice, Resolutions};
use quill_core::storage::{FileStore, KeyValueStore, MemoryStore};
use quill_core::store::{CategoryFilter, QuoteStore, SharedQuoteStore};
use quill_core::sync::{HttpRemoteFetcher, SyncOutcome, SyncScheduler, SyncService, SyncStatus};
use quill_core::util::unix_timestamp_ms;
use tokio::sync::Mutex;

use crate::error::CliError;

#[derive(Parser)]
#[command(name = "quill")]
#[command(about = "Manage a personal quote collection from the command line")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Optional directory for the local data file
    #[arg(long, value_name = "PATH", global = true)]
    data_dir: Option<PathBuf>,

    /// Override the sync server URL
    #[arg(long, value_name = "URL", global = true)]
    server_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new quote
    #[command(alias = "new")]
    Add {
        /// Quote text
        text: String,
        /// Category label
        #[arg(short, long)]
        category: String,
    },
    /// Show a random quote
    Random {
        /// Restrict the pick to one category (persisted as the active filter)
        #[arg(short, long)]
        category: Option<String>,
    },
    /// List quotes
    List {
        /// Filter by category
        #[arg(short, long)]
        category: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List known categories
    Categories,
    /// Import quotes from a JSON file
    Import {
        /// Path to a JSON array of quotes
        file: PathBuf,
        /// Replace the collection instead of merging
        #[arg(long)]
        replace: bool,
    },
    /// Export quotes as pretty-printed JSON
    Export {
        /// Output path (stdout when omitted; a directory gets a dated file name)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Sync the collection with the server once
    Sync {
        /// Resolve any conflicts with the server version without prompting
        #[arg(long)]
        prefer_server: bool,
    },
    /// Keep the collection synced on a periodic schedule
    Watch,
    /// Show storage and sync details
    Info,
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quill=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let data_dir = resolve_data_dir(cli.data_dir);
    tracing::debug!("Using data dir {}", data_dir.display());

    match cli.command {
        Some(Commands::Add { text, category }) => run_add(&text, &category, &data_dir)?,
        Some(Commands::Random { category }) => run_random(category.as_deref(), &data_dir)?,
        Some(Commands::List { category, json }) => {
            run_list(category.as_deref(), json, &data_dir)?;
        }
        Some(Commands::Categories) => run_categories(&data_dir)?,
        Some(Commands::Import { file, replace }) => run_import(&file, replace, &data_dir)?,
        Some(Commands::Export { output }) => run_export(output.as_deref(), &data_dir)?,
        Some(Commands::Sync { prefer_server }) => {
            run_sync_once(prefer_server, &data_dir, cli.server_url).await?;
        }
        Some(Commands::Watch) => run_watch(&data_dir, cli.server_url).await?,
        Some(Commands::Info) => run_info(&data_dir)?,
        Some(Commands::Completions { shell }) => run_completions(shell)?,
        None => {
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}

fn run_add(text: &str, category: &str, data_dir: &Path) -> Result<(), CliError> {
    if text.trim().is_empty() {
        return Err(CliError::EmptyText);
    }
    if category.trim().is_empty() {
        return Err(CliError::EmptyCategory);
    }

    let mut store = open_store(data_dir)?;
    let quote = store.add(text, category)?;
    store.set_selected_filter(&CategoryFilter::Category(quote.category.clone()))?;

    println!("Added {}", format_quote_line(&quote));
    Ok(())
}

fn run_random(category: Option<&str>, data_dir: &Path) -> Result<(), CliError> {
    let store = open_store(data_dir)?;
    let filter = match category {
        Some(value) => {
            let filter = CategoryFilter::parse(value);
            store.set_selected_filter(&filter)?;
            filter
        }
        None => store.selected_filter(),
    };

    let quote = store.random_quote(&filter)?;
    println!("\"{}\"", quote.text);
    println!("  - {}", quote.category);
    Ok(())
}

fn run_list(category: Option<&str>, as_json: bool, data_dir: &Path) -> Result<(), CliError> {
    let store = open_store(data_dir)?;
    let quotes = match category {
        Some(value) => store.filtered(&CategoryFilter::parse(value)),
        None => store.quotes().to_vec(),
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&quotes)?);
        return Ok(());
    }

    if quotes.is_empty() {
        println!("No quotes available in this category");
        return Ok(());
    }
    for quote in &quotes {
        println!("{}", format_quote_line(quote));
    }
    Ok(())
}

fn run_categories(data_dir: &Path) -> Result<(), CliError> {
    let store = open_store(data_dir)?;
    println!("all ({})", store.len());
    for category in store.categories() {
        let count = store
            .quotes()
            .iter()
            .filter(|quote| quote.category == category)
            .count();
        println!("{category} ({count})");
    }
    Ok(())
}

fn run_import(file: &Path, replace: bool, data_dir: &Path) -> Result<(), CliError> {
    if file.extension().and_then(|extension| extension.to_str()) != Some("json") {
        return Err(CliError::NotJsonFile(file.display().to_string()));
    }

    let payload = fs::read_to_string(file)?;
    let entries = parse_import(&payload)?;
    let mode = if replace {
        ImportMode::Replace
    } else {
        ImportMode::Merge
    };

    let mut store = open_store(data_dir)?;
    let applied = store.import(entries, mode)?;
    match mode {
        ImportMode::Replace => println!("Imported {applied} quote(s), replacing the collection"),
        ImportMode::Merge => println!("Imported {applied} new quote(s)"),
    }
    Ok(())
}

fn run_export(output: Option<&Path>, data_dir: &Path) -> Result<(), CliError> {
    let store = open_store(data_dir)?;
    let rendered = render_json_export(store.quotes())?;

    match output {
        None => println!("{rendered}"),
        Some(path) => {
            let path = if path.is_dir() {
                path.join(suggested_export_file_name(unix_timestamp_ms()))
            } else {
                path.to_path_buf()
            };
            fs::write(&path, rendered)?;
            println!("Exported {} quote(s) to {}", store.len(), path.display());
        }
    }
    Ok(())
}

async fn run_sync_once(
    prefer_server: bool,
    data_dir: &Path,
    server_url: Option<String>,
) -> Result<(), CliError> {
    let config = sync_config(server_url)?;
    let service = build_sync_service(data_dir, &config)?;

    match service.run_sync().await? {
        SyncOutcome::AlreadyInProgress => println!("Sync already in progress"),
        SyncOutcome::Completed { added } => {
            if added > 0 {
                println!("Sync complete, added {added} new quote(s) from the server");
            } else {
                println!("Sync complete, your data is up to date");
            }
        }
        SyncOutcome::ConflictsPending(conflicts) => {
            println!("Found {} conflict(s):", conflicts.len());
            for line in format_conflict_lines(&conflicts) {
                println!("  {line}");
            }

            let resolutions = if prefer_server || !io::stdin().is_terminal() {
                Resolutions::new()
            } else {
                prompt_resolutions(&conflicts)?
            };
            let summary = service.resolve_conflicts(&resolutions).await?;
            println!(
                "Resolved: kept {} local, applied {} server version(s)",
                summary.kept_local, summary.applied_server
            );
        }
    }
    Ok(())
}

async fn run_watch(data_dir: &Path, server_url: Option<String>) -> Result<(), CliError> {
    let config = sync_config(server_url)?;
    let service = build_sync_service(data_dir, &config)?;

    // Initial sync, then hand over to the periodic scheduler.
    match service.run_sync().await {
        Ok(SyncOutcome::Completed { added }) => println!("Synced, {added} new quote(s)"),
        Ok(SyncOutcome::ConflictsPending(_) | SyncOutcome::AlreadyInProgress) => {}
        Err(error) => eprintln!("Sync failed: {error} (will retry)"),
    }

    let scheduler = SyncScheduler::start(service.clone(), config.sync_interval);
    println!(
        "Syncing every {}s (Ctrl-C to stop)",
        config.sync_interval.as_secs()
    );

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                break;
            }
            () = tokio::time::sleep(Duration::from_secs(1)) => {
                // Unattended mode: conflicts fall back to server precedence.
                if service.status().await == SyncStatus::AwaitingResolution {
                    match service.resolve_conflicts(&Resolutions::new()).await {
                        Ok(summary) => println!(
                            "Auto-resolved {} conflict(s) with the server version",
                            summary.applied_server
                        ),
                        Err(error) => eprintln!("Conflict auto-resolution failed: {error}"),
                    }
                }
            }
        }
    }

    scheduler.stop().await;
    Ok(())
}

fn run_info(data_dir: &Path) -> Result<(), CliError> {
    let store = open_store(data_dir)?;
    let summary = store.storage_summary();

    println!(
        "{} quote(s) ({})",
        summary.quote_count,
        format_size_kb(summary.serialized_bytes)
    );
    println!("Filter: {}", summary.filter);
    println!("Last sync: {}", format_last_sync(summary.last_sync));
    if let Some(quote) = store.last_viewed() {
        println!("Last viewed: {}", format_quote_line(&quote));
    }
    Ok(())
}

fn run_completions(shell: CompletionShell) -> Result<(), CliError> {
    let mut command = Cli::command();
    let name = command.get_name().to_string();
    match shell {
        CompletionShell::Bash => generate(shells::Bash, &mut command, name, &mut io::stdout()),
        CompletionShell::Zsh => generate(shells::Zsh, &mut command, name, &mut io::stdout()),
        CompletionShell::Fish => generate(shells::Fish, &mut command, name, &mut io::stdout()),
    }
    Ok(())
}

fn prompt_resolutions(conflicts: &[Conflict]) -> Result<Resolutions, CliError> {
    let mut resolutions = Resolutions::new();
    let stdin = io::stdin();

    for (index, conflict) in conflicts.iter().enumerate() {
        println!();
        println!("Conflict #{} (quote {})", index + 1, conflict.id);
        println!(
            "  local:  \"{}\" [{}]",
            conflict.local.text, conflict.local.category
        );
        println!(
            "  server: \"{}\" [{}]",
            conflict.remote.text, conflict.remote.category
        );
        print!("Keep which version? [S]erver/[l]ocal: ");
        io::stdout().flush()?;

        let mut line = String::new();
        stdin.read_line(&mut line)?;
        resolutions.insert(conflict.id, parse_resolution_choice(&line));
    }

    Ok(resolutions)
}

fn build_sync_service(data_dir: &Path, config: &SyncConfig) -> Result<SyncService, CliError> {
    let store: SharedQuoteStore = Arc::new(Mutex::new(open_store(data_dir)?));
    let fetcher = Arc::new(HttpRemoteFetcher::new(config)?);
    Ok(SyncService::new(store, fetcher))
}

fn open_store(data_dir: &Path) -> Result<QuoteStore, CliError> {
    let local = Arc::new(FileStore::open(data_dir.join("store.json"))?);

    // A broken session file only loses the last-viewed quote.
    let session: Arc<dyn KeyValueStore> =
        match FileStore::open(env::temp_dir().join("quill-session.json")) {
            Ok(store) => Arc::new(store),
            Err(error) => {
                tracing::warn!("Session store unavailable ({error}), using in-memory session");
                Arc::new(MemoryStore::new())
            }
        };

    Ok(QuoteStore::open(local, session)?)
}

fn resolve_data_dir(flag: Option<PathBuf>) -> PathBuf {
    flag.unwrap_or_else(|| {
        dirs::data_dir().map_or_else(|| PathBuf::from(".quill"), |dir| dir.join("quill"))
    })
}

fn sync_config(server_url: Option<String>) -> Result<SyncConfig, CliError> {
    let config = SyncConfig::default();
    Ok(match resolve_server_url(server_url)? {
        Some(url) => config.with_server_url(url),
        None => config,
    })
}

fn resolve_server_url(flag: Option<String>) -> Result<Option<String>, CliError> {
    let Some(url) = flag.or_else(|| env::var("QUILL_SERVER_URL").ok()) else {
        return Ok(None);
    };

    let url = url.trim().to_string();
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(Some(url))
    } else {
        Err(CliError::InvalidServerUrl(url))
    }
}

fn parse_resolution_choice(input: &str) -> ResolutionChoice {
    match input.trim().to_ascii_lowercase().as_str() {
        "l" | "local" => ResolutionChoice::Local,
        _ => ResolutionChoice::Server,
    }
}

fn format_quote_line(quote: &Quote) -> String {
    format!("#{} [{}] \"{}\"", quote.id, quote.category, quote.text)
}

fn format_conflict_lines(conflicts: &[Conflict]) -> Vec<String> {
    conflicts
        .iter()
        .map(|conflict| {
            format!(
                "quote {}: local \"{}\" [{}] vs server \"{}\" [{}]",
                conflict.id,
                conflict.local.text,
                conflict.local.category,
                conflict.remote.text,
                conflict.remote.category
            )
        })
        .collect()
}

fn format_last_sync(timestamp_ms: Option<i64>) -> String {
    timestamp_ms.map_or_else(|| "Never".to_string(), format_sync_timestamp)
}

fn format_sync_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::<chrono::Utc>::from_timestamp_millis(timestamp_ms)
        .unwrap_or_default()
        .format("%Y-%m-%d %H:%M:%S UTC")
        .to_string()
}

#[allow(clippy::cast_precision_loss)] // display only
fn format_size_kb(bytes: usize) -> String {
    format!("{:.2} KB", bytes as f64 / 1024.0)
}
