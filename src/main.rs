//! Place Ingestion Service
//! Public open-data place harvesting into the place catalog
//!
//! Features:
//! - Three upstream sources (KTO pet travel, data.go.kr, Seoul open API)
//! - Bounded pagination with a polite inter-page delay
//! - Batched existence lookup and per-record upserts
//! - Graceful shutdown with SIGTERM handling

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use place_ingestion::{
    Config, Harvester, HttpClientConfig, MemoryPlaceStore, PageFetcher, PgPlaceStore, PlaceStore,
    RunReport, SourceApi, SourceConfig, StopHandle,
};

/// Place Ingestion Service - public open-data place harvesting
#[derive(Parser, Debug)]
#[command(name = "place-ingestion")]
#[command(author = "Place Catalog Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Harvests public open-data places into the place catalog")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, default_value = "false", global = true)]
    json_logs: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Harvest one or all configured sources
    Run {
        /// Source to harvest (kor-pet-tour, data.go.kr, seoul-open-api, all)
        #[arg(short, long, default_value = "all")]
        source: String,

        /// Page ceiling per source
        #[arg(long)]
        max_pages: Option<u32>,

        /// Items requested per page
        #[arg(long)]
        page_size: Option<u32>,

        /// Delay between pages (e.g., "500ms", "2s")
        #[arg(long)]
        page_delay: Option<String>,

        /// Write to an in-memory catalog instead of the database
        #[arg(long, default_value = "false")]
        dry_run: bool,

        /// Output format (summary, json)
        #[arg(short, long, default_value = "summary")]
        output: String,
    },

    /// Show configured sources and catalog size
    Status,
}

/// Sets up structured logging with tracing
fn setup_logging(log_level: &str, json_output: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    if json_output {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }
}

/// Stops the harvest on SIGTERM/SIGINT
async fn shutdown_signal(stop: StopHandle) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, finishing current page and stopping...");
        }
        _ = terminate => {
            info!("Received SIGTERM, finishing current page and stopping...");
        }
    }

    stop.stop();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(&cli.log_level, cli.json_logs);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting Place Ingestion Service");

    let config = Config::load()?;
    config.validate()?;

    info!(
        sources = config.source_configs().len(),
        database = config.has_database(),
        page_delay_ms = config.page_delay_ms,
        "Configuration loaded"
    );

    match cli.command {
        Commands::Run { source, max_pages, page_size, page_delay, dry_run, output } => {
            run_harvest(config, &source, max_pages, page_size, page_delay, dry_run, &output).await?;
        }

        Commands::Status => {
            show_status(config).await?;
        }
    }

    Ok(())
}

/// Opens the catalog store; falls back to memory for dry runs or when no
/// database is configured
async fn open_store(config: &Config, dry_run: bool) -> Result<Arc<dyn PlaceStore>> {
    match config.database_url.as_deref() {
        Some(url) if !dry_run => {
            let store = PgPlaceStore::connect(url).await.context("failed to connect to database")?;
            store.ensure_schema().await?;
            Ok(Arc::new(store))
        }
        Some(_) => {
            info!("Dry run: writing to an in-memory catalog");
            Ok(Arc::new(MemoryPlaceStore::new()))
        }
        None => {
            warn!("No database URL configured - running against an in-memory catalog");
            Ok(Arc::new(MemoryPlaceStore::new()))
        }
    }
}

/// Resolves `--source` into source configurations
fn select_sources(config: &Config, source: &str) -> Result<Vec<SourceConfig>> {
    if source == "all" {
        for api in SourceApi::ALL {
            if config.credential(api).is_none() {
                warn!(source = %api, "No credential configured, skipping source");
            }
        }
        return Ok(config.source_configs());
    }

    let api: SourceApi = source.parse()?;
    Ok(vec![config.source_config(api)?])
}

/// Runs one harvest from the command line
async fn run_harvest(
    config: Config,
    source: &str,
    max_pages: Option<u32>,
    page_size: Option<u32>,
    page_delay: Option<String>,
    dry_run: bool,
    output_format: &str,
) -> Result<()> {
    let page_delay = match page_delay {
        Some(raw) => humantime::parse_duration(&raw)
            .with_context(|| format!("invalid --page-delay: {raw}"))?,
        None => config.page_delay(),
    };

    let mut sources = select_sources(&config, source)?;
    for source in sources.iter_mut() {
        if let Some(max_pages) = max_pages {
            source.max_pages = max_pages;
        }
        if let Some(page_size) = page_size {
            source.page_size = page_size;
        }
    }

    if sources.is_empty() {
        anyhow::bail!("no sources configured; set at least one source API key");
    }

    info!(
        sources = sources.len(),
        page_delay = %humantime::format_duration(page_delay),
        dry_run,
        "Starting harvest"
    );

    let store = open_store(&config, dry_run).await?;
    let fetcher = PageFetcher::new(HttpClientConfig::from_config(&config))?;
    let harvester = Harvester::new(fetcher, store.clone(), page_delay, config.source_delay());

    tokio::spawn(shutdown_signal(harvester.stop_handle()));

    let report = harvester.run(&sources).await;
    let catalog_size = store.count().await?;

    match output_format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => print_summary(&report, catalog_size),
    }

    Ok(())
}

fn print_summary(report: &RunReport, catalog_size: u64) {
    println!(
        "\n{:<16} {:>9} {:>6} {:>8} {:>8} {:>8}  {}",
        "Source", "Collected", "Pages", "Added", "Updated", "Skipped", "Stop"
    );
    println!("{}", "-".repeat(72));
    for source in &report.sources {
        let stop = match (&source.stop_reason, &source.error) {
            (_, Some(error)) => format!("error: {error}"),
            (Some(reason), None) => reason.to_string(),
            (None, None) => "-".to_string(),
        };
        println!(
            "{:<16} {:>9} {:>6} {:>8} {:>8} {:>8}  {}",
            source.api.as_str(),
            source.collected,
            source.pages_fetched,
            source.summary.added,
            source.summary.updated,
            source.summary.skipped,
            stop
        );
    }
    println!("{}", "-".repeat(72));
    println!(
        "{:<16} {:>9} {:>6} {:>8} {:>8} {:>8}",
        "total",
        report.collected(),
        "",
        report.total.added,
        report.total.updated,
        report.total.skipped
    );
    println!("\nCatalog size: {catalog_size}");
}

/// Shows configured sources and catalog size
async fn show_status(config: Config) -> Result<()> {
    println!("\nPlace Ingestion Status");
    println!("======================\n");

    println!("Sources:");
    for api in SourceApi::ALL {
        let state = if config.credential(api).is_some() { "configured" } else { "missing credential" };
        println!("  {:<16} {}", api.as_str(), state);
    }

    println!();
    match config.database_url.as_deref() {
        Some(url) => {
            let store = PgPlaceStore::connect(url).await.context("failed to connect to database")?;
            println!("Catalog size: {}", store.count().await?);
        }
        None => println!("Database: not configured"),
    }

    Ok(())
}
