//! # Person Search
//!
//! Collects public information about one person from several independent
//! sources and folds it into a single report.
//!
//! ## Features
//!
//! - Academic papers from Google Scholar (profile or publication search) and arXiv
//! - News from SerpAPI (or a basic Google News scrape) and university news sites
//! - Web results from Tavily (or a basic Google scrape): general, news,
//!   academic, podcasts and interviews, and optional social platforms
//! - Per-source failure isolation: one broken source never hides the others
//! - Console summary and details, a JSON file, and an optional Markdown report
//!
//! ## Usage
//!
//! ```sh
//! person_search "Jane Doe" -u columbia --social
//! ```
//!
//! ## Architecture
//!
//! 1. **Providers** fetch and normalize records from one access path each
//! 2. **Sources** chain providers with fallback (API first, scrape second)
//! 3. **Adapters** run the sources of one category (papers, news, web)
//! 4. **Aggregator** runs the categories in order and assembles the report
//! 5. **Outputs** render and persist the finished report

use clap::Parser;
use std::error::Error;
use std::path::Path;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod adapters;
mod aggregator;
mod cli;
mod config;
mod error;
mod http;
mod models;
mod outputs;
mod pacing;
mod providers;
mod report;
mod retry;
mod sources;
mod utils;

use aggregator::{Aggregator, SearchRequest};
use cli::Cli;
use config::{Config, Credentials};
use outputs::{console, json, markdown};
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // Keys in a local .env are picked up by clap's env fallbacks.
    dotenvy::dotenv().ok();

    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("person_search starting up");

    let args = Cli::parse();
    debug!(name = %args.name, university = ?args.university, max_results = args.max_results, "Parsed CLI arguments");

    let config = Config::load(args.config.as_deref())
        .inspect_err(|e| error!(error = %e, "Failed to load config"))?
        .with_credentials(Credentials {
            tavily_api_key: args.tavily_api_key.clone(),
            serpapi_key: args.serpapi_key.clone(),
        });
    if config.credentials.tavily_api_key.is_none() {
        warn!("No TAVILY_API_KEY set; web search falls back to basic scraping with limited results");
    }
    if config.credentials.serpapi_key.is_none() {
        info!("No SERPAPI_KEY set; news search uses the basic Google News scrape");
    }

    let aggregator = Aggregator::new(&config).inspect_err(|e| error!(error = %e, "Invalid configuration"))?;
    let request = SearchRequest::new(args.name.clone())
        .and_then(|r| r.limit(args.max_results))
        .inspect_err(|e| error!(error = %e, "Invalid search request"))?
        .university(args.university.clone())
        .social(args.social)
        .categories(!args.no_papers, !args.no_news, !args.no_web);

    let report = aggregator.search(&request).await;

    println!("{}", console::render_summary(&report));
    println!("{}", console::render_details(&report, args.max_display));

    save_outputs(&report, &args).await;

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Search complete"
    );

    Ok(())
}

/// Persist the report. Failures are logged; the results were already printed.
#[instrument(level = "info", skip_all, fields(output_dir = %args.output_dir))]
async fn save_outputs(report: &report::Report, args: &Cli) {
    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        error!(
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return;
    }

    let json_path = match json::write_report(report, Path::new(&args.output_dir), args.output_file.as_deref()).await {
        Ok(path) => {
            println!("Results saved to: {}", path.display());
            path
        }
        Err(e) => {
            error!(error = %e, "Failed to save JSON results");
            return;
        }
    };

    if args.markdown {
        match markdown::write_markdown(report, &json_path.with_extension("md")).await {
            Ok(path) => println!("Markdown report saved to: {}", path.display()),
            Err(e) => error!(error = %e, "Failed to save Markdown report"),
        }
    }
}
