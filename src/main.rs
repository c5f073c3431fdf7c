//! Taxocrawl main entry point

use clap::Parser;
use std::path::{Path, PathBuf};
use taxocrawl::config::load_config_with_hash;
use taxocrawl::crawl::run_crawl;
use tracing_subscriber::EnvFilter;

/// Taxocrawl: an incremental taxonomy-tree crawler
///
/// Crawls the BioLib taxonomy tree view, persisting discovered taxa in a
/// local SQLite database. Runs are resumable: the work frontier survives
/// interruptions and the iteration cap in a queue file.
#[derive(Parser, Debug)]
#[command(name = "taxocrawl")]
#[command(version)]
#[command(about = "Incremental taxonomy-tree crawler", long_about = None)]
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

    /// Show database statistics and exit
    #[arg(long)]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)?;
    tracing::debug!(%config_hash, "configuration loaded");

    if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(config).await?;
    }

    Ok(())
}

/// Sets up the tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("taxocrawl=info,warn"),
            1 => EnvFilter::new("taxocrawl=debug,info"),
            2 => EnvFilter::new("taxocrawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Handles the --stats mode: prints store counts and exits
fn handle_stats(config: &taxocrawl::Config) -> anyhow::Result<()> {
    use taxocrawl::{SqliteStore, Store};

    let store = SqliteStore::new(Path::new(&config.output.database_path))?;

    println!("Database: {}", config.output.database_path);
    println!("Taxa stored:   {}", store.count_taxa()?);
    println!("Still pending: {}", store.count_pending()?);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: taxocrawl::Config) -> anyhow::Result<()> {
    tracing::info!(
        base_url = %config.site.base_url,
        seed = config.site.seed_taxon_id,
        max_iterations = config.crawler.max_iterations,
        "starting crawl"
    );

    let summary = run_crawl(config).await?;

    tracing::info!(
        pages = summary.pages_fetched,
        taxa = summary.taxa_merged,
        iterations = summary.iterations,
        "done: {:?}",
        summary.reason
    );
    Ok(())
}
