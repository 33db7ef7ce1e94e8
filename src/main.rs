//! Paper-Harvest main entry point
//!
//! This is the command-line interface for the Paper-Harvest corpus crawler.

use anyhow::Context;
use clap::Parser;
use paper_harvest::config::{load_config_with_hash, Config};
use paper_harvest::crawler::{crawl, crawl_many, CrawlReport};
use paper_harvest::{ConfigError, HarvestError};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Exit status for configuration errors, kept apart from crawl failures
const CONFIG_ERROR_EXIT: u8 = 2;

/// Paper-Harvest: a bibliographic corpus crawler
///
/// Paper-Harvest crawls the proceedings pages of a fixed set of academic
/// venues and stores the title, authors and abstract of every paper in a
/// venue/year-partitioned corpus.
#[derive(Parser, Debug)]
#[command(name = "paper-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A bibliographic corpus crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG", required_unless_present = "list_venues")]
    config: Option<PathBuf>,

    /// Venue to crawl (see --list-venues)
    #[arg(
        value_name = "VENUE",
        required_unless_present_any = ["list_venues", "stats", "export"]
    )]
    venue: Option<String>,

    /// Year(s) to crawl; several years are crawled concurrently
    #[arg(value_name = "YEAR", requires = "venue")]
    years: Vec<u16>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// List the registered venues and their years, then exit
    #[arg(long, conflicts_with_all = ["stats", "export"])]
    list_venues: bool,

    /// Show statistics from the corpus database and exit
    #[arg(long, conflicts_with_all = ["list_venues", "export"])]
    stats: bool,

    /// Export every partition as JSON into DIR (default: output.export-dir) and exit
    #[arg(long, value_name = "DIR", num_args = 0..=1, conflicts_with_all = ["list_venues", "stats"])]
    export: Option<Option<PathBuf>>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            if is_configuration_error(&e) {
                ExitCode::from(CONFIG_ERROR_EXIT)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    if cli.list_venues {
        handle_list_venues();
        return Ok(ExitCode::SUCCESS);
    }

    let config_path = cli
        .config
        .as_deref()
        .context("a configuration file is required")?;

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", config_path.display());
    let (config, config_hash) = load_config_with_hash(config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    // Handle different modes
    if cli.stats {
        handle_stats(&config)?;
        return Ok(ExitCode::SUCCESS);
    }
    if let Some(dir) = cli.export {
        let dir = dir.unwrap_or_else(|| PathBuf::from(&config.output.export_dir));
        handle_export(&config, &dir)?;
        return Ok(ExitCode::SUCCESS);
    }

    let venue = cli.venue.context("a venue is required")?;
    if cli.years.is_empty() {
        return Err(ConfigError::Validation(format!("no year given for {}", venue)).into());
    }

    handle_crawl(&config, &config_hash, &venue, &cli.years).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("paper_harvest=info,warn"),
            1 => EnvFilter::new("paper_harvest=debug,info"),
            2 => EnvFilter::new("paper_harvest=trace,debug"),
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

/// Configuration problems, including unknown venues and years, exit distinctly
fn is_configuration_error(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        cause.is::<ConfigError>()
            || cause
                .downcast_ref::<HarvestError>()
                .is_some_and(HarvestError::is_configuration_error)
    })
}

/// Handles the --list-venues mode
fn handle_list_venues() {
    println!("=== Registered Venues ===\n");
    for (name, years) in paper_harvest::venues::registry_table() {
        let years: Vec<String> = years.iter().map(u16::to_string).collect();
        println!("  {:<12} {}", name, years.join(", "));
    }
}

/// Handles the --stats mode: shows statistics from the corpus database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    use paper_harvest::output::{load_statistics, print_statistics};
    use paper_harvest::storage::open_corpus;

    println!("Database: {}\n", config.output.database_path);

    let corpus = open_corpus(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&corpus)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --export mode: writes one JSON file per partition
fn handle_export(config: &Config, dir: &Path) -> anyhow::Result<()> {
    use paper_harvest::output::{export_all, ExportOutcome};
    use paper_harvest::storage::open_corpus;

    println!("=== Exporting Corpus ===\n");
    println!("Database: {}", config.output.database_path);
    println!("Output: {}", dir.display());
    println!();

    let corpus = open_corpus(Path::new(&config.output.database_path))?;
    let outcomes = export_all(&corpus, dir)?;

    for outcome in &outcomes {
        match outcome {
            ExportOutcome::Written { path, records } => {
                println!("✓ {} ({} records)", path.display(), records)
            }
            ExportOutcome::Unchanged { path, records } => {
                println!("- {} unchanged ({} records)", path.display(), records)
            }
        }
    }
    if outcomes.is_empty() {
        println!("No partitions to export.");
    }

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: &Config,
    config_hash: &str,
    venue: &str,
    years: &[u16],
) -> anyhow::Result<ExitCode> {
    tracing::info!(
        "Detail concurrency: {}, minimum request interval: {}ms",
        config.crawler.detail_concurrency,
        config.crawler.minimum_request_interval
    );

    if let [year] = years {
        let report = crawl(config, config_hash, venue, *year).await?;
        print_report(&report);
        return Ok(ExitCode::SUCCESS);
    }

    let targets: Vec<(String, u16)> = years.iter().map(|year| (venue.to_string(), *year)).collect();
    let results = crawl_many(config, config_hash, &targets).await?;

    let mut errors = Vec::new();
    for ((venue, year), result) in targets.iter().zip(results) {
        match result {
            Ok(report) => print_report(&report),
            Err(e) => {
                tracing::error!("{} {} failed: {}", venue, year, e);
                errors.push(e);
            }
        }
    }

    Ok(ExitCode::from(batch_exit_status(&errors)))
}

/// Exit status for a batch of crawls, given the ones that failed
fn batch_exit_status(errors: &[HarvestError]) -> u8 {
    if errors.iter().any(HarvestError::is_configuration_error) {
        CONFIG_ERROR_EXIT
    } else if errors.is_empty() {
        0
    } else {
        1
    }
}

fn print_report(report: &CrawlReport) {
    println!("=== {} ===", report.partition);
    println!("  Final state: {}", report.state);
    println!("  Listing pages: {}", report.listing_pages);
    println!("  Detail pages dispatched: {}", report.details_dispatched);
    println!("  Duplicates skipped: {}", report.duplicates_skipped);
    println!("  Records written: {}", report.records_emitted);
    println!("  Records already stored: {}", report.records_existing);
    println!("  Records dropped: {}", report.records_dropped);
    println!("  Fetch failures: {}", report.fetch_failures);
}
