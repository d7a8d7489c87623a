//! A3S WebSearch CLI - paginating web search from the command line.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use a3s_websearch::{
    engines,
    output::{OutputMode, Report},
    SearchConfig, SearchQuery, SearchResponse, WebSearch,
};

/// A3S WebSearch - paginating web search CLI
#[derive(Parser)]
#[command(name = "a3s-websearch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Search one provider
    Search(SearchArgs),

    /// List available search engines
    Engines,
}

#[derive(Parser)]
struct SearchArgs {
    /// Search query
    #[arg(required = true, num_args = 1..)]
    query: Vec<String>,

    /// JSON configuration file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Search engine (bing, brave, duckduckgo, baidu, sogou)
    #[arg(short, long)]
    engine: Option<String>,

    /// Maximum number of result pages
    #[arg(short, long)]
    pages: Option<usize>,

    /// Maximum number of results
    #[arg(short = 'n', long)]
    results: Option<usize>,

    /// Search operators (comma-separated): url, title, text, host
    #[arg(short, long)]
    filter: Option<String>,

    /// Collect only unique links
    #[arg(long)]
    unique_urls: bool,

    /// Collect only one result per host
    #[arg(long)]
    unique_hosts: bool,

    /// Skip fetching result pages for article text
    #[arg(long)]
    no_enrich: bool,

    /// Use plain HTTP requests instead of a headless browser
    #[arg(long)]
    http: bool,

    /// Reports to produce (comma-separated): print, html, csv, json
    #[arg(short, long, default_value = "print")]
    output: String,

    /// Directory for html/csv/json reports
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Console format for the print report
    #[arg(short = 'F', long, default_value = "text")]
    format: OutputFormat,

    /// Proxy URL (e.g., http://127.0.0.1:8080 or socks5://127.0.0.1:1080)
    #[arg(long)]
    proxy: Option<String>,

    /// Navigation timeout in seconds
    #[arg(short, long)]
    timeout: Option<u64>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON envelope: {code, msg, data}
    Json,
    /// Compact single-line output
    Compact,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Search(args) => run_search(args).await,
        Commands::Engines => list_engines(),
    }
}

fn list_engines() -> Result<()> {
    println!("Available search engines:\n");
    for (id, name) in engines::available() {
        println!("  {:<12} - {}", id, name);
    }
    println!();
    println!("Usage: a3s-websearch search \"query\" -e duckduckgo -p 2");
    Ok(())
}

fn build_config(args: &SearchArgs) -> Result<SearchConfig> {
    let mut config = match &args.config {
        Some(path) => SearchConfig::from_file(path)?,
        None => SearchConfig::default(),
    };

    if let Some(engine) = &args.engine {
        config.engine = engine.clone();
    }
    if let Some(pages) = args.pages {
        config.max_pages = pages;
    }
    if let Some(results) = args.results {
        config.max_results = results;
    }
    if let Some(filter) = &args.filter {
        config.filters = Some(filter.clone());
    }
    if let Some(proxy) = &args.proxy {
        config.proxy = Some(proxy.clone());
    }
    if let Some(timeout) = args.timeout {
        config.timeout_ms = timeout * 1000;
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    config.unique_urls |= args.unique_urls;
    config.unique_hosts |= args.unique_hosts;
    if args.no_enrich {
        config.enrich = false;
    }

    config.validate()?;
    Ok(config)
}

#[cfg(feature = "headless")]
fn build_service(config: SearchConfig, http: bool) -> Result<WebSearch> {
    if http {
        Ok(WebSearch::http(config)?)
    } else {
        Ok(WebSearch::browser(config)?)
    }
}

#[cfg(not(feature = "headless"))]
fn build_service(config: SearchConfig, _http: bool) -> Result<WebSearch> {
    Ok(WebSearch::http(config)?)
}

async fn run_search(args: SearchArgs) -> Result<()> {
    let modes = OutputMode::parse_list(&args.output)?;
    if modes.is_empty() {
        anyhow::bail!("No output mode specified");
    }

    let config = build_config(&args)?;
    let query = SearchQuery::from_config(args.query.join(" "), &config);
    let output_dir = config.output_dir.clone();
    let service = build_service(config, args.http)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping after the current page");
            on_interrupt.cancel();
        }
    });

    let outcome = service.run(&query, &cancel).await;
    service.shutdown().await;
    info!(
        "{} result(s) from {} page(s): {}",
        outcome.records.len(),
        outcome.pages_fetched,
        outcome.stop_reason
    );
    if outcome.is_banned() {
        warn!("The provider appears to be rate limiting this client");
    } else if outcome.is_failure() {
        warn!("Search stopped early ({}), results may be incomplete", outcome.stop_reason);
    }

    let engine = service.orchestrator().adapter().name().to_string();
    let report = Report::new(&query.text, &engine, &outcome.records);

    let mut stdout = std::io::stdout().lock();
    if modes.contains(&OutputMode::Print) {
        match args.format {
            OutputFormat::Text => write!(stdout, "{}", report.to_text())?,
            OutputFormat::Json => {
                let response = SearchResponse::success(outcome.records.clone());
                writeln!(stdout, "{}", serde_json::to_string_pretty(&response)?)?;
            }
            OutputFormat::Compact => {
                for record in &outcome.records {
                    writeln!(stdout, "{}\t{}", record.title, record.link)?;
                }
            }
        }
    }

    let files: Vec<OutputMode> = modes
        .into_iter()
        .filter(|m| *m != OutputMode::Print)
        .collect();
    for path in report.emit(&files, &output_dir, &mut stdout)? {
        eprintln!("Saved {}", path.display());
    }
    Ok(())
}
