//! Catalog-Harvest main entry point
//!
//! This is the command-line interface for the Catalog-Harvest downloader.

use anyhow::Context;
use catalog_harvest::config::{load_config_with_hash, Config};
use catalog_harvest::orchestrator::Orchestrator;
use catalog_harvest::output::{load_statistics, print_statistics, print_summary};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Catalog-Harvest: a resumable catalog downloader
///
/// Catalog-Harvest crawls a paginated catalog, follows every listed item
/// through its landing pages to the final download address, and saves the
/// resource locally. Completed items are checkpointed so interrupted runs
/// resume where they stopped.
#[derive(Parser, Debug)]
#[command(name = "catalog-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A resumable catalog downloader", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Crawl the catalog again and replace the saved link list
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    rediscover: bool,

    /// Validate config and show what would be harvested without any network access
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show progress from the state files and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_harvest(config, cli.rediscover).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("catalog_harvest=info,warn"),
            1 => EnvFilter::new("catalog_harvest=debug,info"),
            2 => EnvFilter::new("catalog_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the validated configuration
fn handle_dry_run(config: &Config) {
    println!("=== Catalog-Harvest Dry Run ===\n");

    println!("HTTP:");
    println!("  User agent: {}", config.http.user_agent);
    if let Some(referer) = &config.http.referer {
        println!("  Referer: {}", referer);
    }
    println!("  Page timeout: {}s", config.http.timeout_secs);
    println!("  Download timeout: {}s", config.http.download_timeout_secs);
    println!("  Delay between requests: {}ms", config.http.request_delay_ms);
    println!("  Fallback encoding: {}", config.http.encoding);

    println!("\nCatalog roots ({}):", config.catalog.roots.len());
    for root in &config.catalog.roots {
        println!("  - {}", root);
    }
    if !config.catalog.item_href_contains.is_empty() {
        println!(
            "  Item links must contain: {}",
            config.catalog.item_href_contains.join(", ")
        );
    }

    println!("\nSelectors:");
    println!("  Item: {}", config.catalog.item_selector);
    println!("  Pagination: {}", config.catalog.pagination_selector);
    println!("  Title: {}", config.catalog.title_selector);
    println!("  Download entry: {}", config.catalog.entry_selector);
    println!("  Trigger: {}", config.catalog.trigger_selector);
    println!("  Resource: {}", config.catalog.resource_selector);

    println!("\nOutput:");
    println!("  Downloads: {}", config.output.download_dir);
    println!("  Link list: {}", config.output.link_list_path);
    println!("  Checkpoint: {}", config.output.checkpoint_path);
    println!("  Failure log: {}", config.output.failure_log_path);

    println!("\n✓ Configuration is valid");
    if std::path::Path::new(&config.output.link_list_path).exists() {
        println!("✓ Would resume from the saved link list");
    } else {
        println!(
            "✓ Would discover items from {} catalog roots",
            config.catalog.roots.len()
        );
    }
}

/// Handles the --stats mode: shows progress recorded in the state files
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Link list: {}", config.output.link_list_path);
    println!("Checkpoint: {}\n", config.output.checkpoint_path);

    let stats = load_statistics(&config.output).context("Failed to read state files")?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main harvest run, stopping cleanly on Ctrl-C
async fn handle_harvest(config: Config, rediscover: bool) -> anyhow::Result<()> {
    let output = config.output.clone();
    let orchestrator =
        Orchestrator::new(config, rediscover).context("Failed to initialize harvest")?;

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::warn!("Interrupt received, stopping after cleanup");
    };

    let summary = orchestrator
        .run_until(shutdown)
        .await
        .context("Harvest aborted")?;

    print_summary(&summary, &output);
    Ok(())
}
