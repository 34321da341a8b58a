//! Linkpatrol main entry point
//!
//! This is the command-line interface for the linkpatrol link checker.

use clap::Parser;
use linkpatrol::config::load_config;
use linkpatrol::crawler::{crawl, CrawlOptions};
use linkpatrol::output::{build_report, print_report};
use linkpatrol::url::{canonicalize, UrlSkipper};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Linkpatrol: a link-checking crawler
///
/// Linkpatrol crawls a site from its seed URLs, follows links one hop
/// across the site boundary when asked to, and reports which links are
/// broken. It respects robots.txt and paces requests per host.
#[derive(Parser, Debug)]
#[command(name = "linkpatrol")]
#[command(version)]
#[command(about = "A link-checking crawler", long_about = None)]
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

    /// Check external links (one hop) even if the config does not
    #[arg(long)]
    external: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    let seeds: Vec<Url> = config
        .crawler
        .seeds
        .iter()
        .map(|seed| canonicalize(seed))
        .collect::<Result<_, _>>()?;
    let host_patterns = config.host_patterns();
    let skipper = UrlSkipper::new(&config.crawler.skip)?;
    let should_check_external = config.crawler.check_external || cli.external;
    let options = CrawlOptions {
        user_agent: config.user_agent.user_agent_string(),
        min_request_gap: Duration::from_millis(config.crawler.min_request_gap_ms),
        request_timeout: Duration::from_secs(config.crawler.request_timeout_secs),
    };

    // Wire ctrl-c to the coordinator's stop signal.
    let (stop_tx, stop_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, stopping crawl");
            let _ = stop_tx.send(true);
        }
    });

    let result = crawl(
        seeds,
        &host_patterns,
        should_check_external,
        skipper,
        cli.verbose > 0,
        stop_rx,
        options,
    )
    .await?;

    let report = build_report(&result);
    print_report(&report);

    // Link-checker convention: a non-zero exit when broken links exist.
    if !report.broken_links.is_empty() {
        std::process::exit(1);
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("linkpatrol=info,warn"),
            1 => EnvFilter::new("linkpatrol=debug,info"),
            2 => EnvFilter::new("linkpatrol=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &linkpatrol::config::Config) {
    println!("=== Linkpatrol Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Check external: {}", config.crawler.check_external);
    println!(
        "  Min request gap: {}ms",
        config.crawler.min_request_gap_ms
    );
    println!(
        "  Request timeout: {}s",
        config.crawler.request_timeout_secs
    );

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.user_agent_string());

    println!("\nSeeds ({}):", config.crawler.seeds.len());
    for seed in &config.crawler.seeds {
        println!("  - {}", seed);
    }

    println!("\nInternal host patterns:");
    for pattern in config.host_patterns() {
        println!("  - {}", pattern);
    }

    if !config.crawler.skip.is_empty() {
        println!("\nSkip patterns ({}):", config.crawler.skip.len());
        for pattern in &config.crawler.skip {
            println!("  - {}", pattern);
        }
    }

    println!("\n✓ Configuration is valid");
}
