use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::warn;

use scheme_scraper::config::{CrawlConfig, DEFAULT_REQUEST_DELAY_MS};
use scheme_scraper::crawler;
use scheme_scraper::fetch::HttpFetcher;
use scheme_scraper::progress::ConsoleProgress;
use scheme_scraper::slugs;
use scheme_scraper::store;

#[derive(Parser)]
#[command(
    name = "scheme_scraper",
    about = "Government scheme catalogue scraper (myscheme.gov.in)"
)]
struct Cli {
    /// Directory for per-scheme and aggregate JSON output
    #[arg(long, default_value = "results")]
    output_dir: PathBuf,

    /// Local slug list consulted before the sitemap
    #[arg(long, default_value = "slugs.txt")]
    slug_file: PathBuf,

    /// Delay between consecutive API requests, in milliseconds
    #[arg(long, default_value_t = DEFAULT_REQUEST_DELAY_MS)]
    delay_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the slug source and report what would be crawled
    Slugs,
    /// Fetch every scheme record and write per-item + aggregate JSON
    Crawl {
        /// Max slugs to fetch (default: all)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// External discovery, crawl, external DB save, in one pipeline
    Run {
        /// Max slugs to fetch (default: all)
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// External command run before the crawl to refresh the slug list
        #[arg(long)]
        discover_cmd: Option<String>,

        /// External command run after a successful crawl to save records
        #[arg(long)]
        save_cmd: Option<String>,
    },
    /// Show output directory statistics
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let config = CrawlConfig {
        output_dir: cli.output_dir.clone(),
        local_slug_path: cli.slug_file.clone(),
        request_delay: Duration::from_millis(cli.delay_ms),
        ..CrawlConfig::default()
    };

    let result = match cli.command {
        Commands::Slugs => {
            let fetcher = HttpFetcher::new(&config)?;
            let slugs = slugs::resolve(&config, &fetcher).await?;
            if slugs.is_empty() {
                println!(
                    "No slugs found. Provide {} or a sitemap.",
                    config.local_slug_path.display()
                );
            } else {
                println!("Resolved {} slugs (first: {})", slugs.len(), slugs[0]);
            }
            Ok(())
        }
        Commands::Crawl { limit } => crawl_command(&config, limit).await,
        Commands::Run {
            limit,
            discover_cmd,
            save_cmd,
        } => {
            if let Some(cmd) = discover_cmd {
                if let Err(e) = run_external("discovery", &cmd).await {
                    warn!("Discovery step failed ({e:#}); proceeding with existing slug sources");
                }
            }
            match crawl_command(&config, limit).await {
                Ok(()) => {
                    if let Some(cmd) = save_cmd {
                        run_external("save", &cmd).await?;
                    }
                    Ok(())
                }
                Err(e) => {
                    warn!("Crawl failed; skipping save step");
                    Err(e)
                }
            }
        }
        Commands::Stats => {
            let stats = store::collect_stats(&config.output_dir)?;
            println!("Scheme files: {}", stats.scheme_files);
            match stats.aggregate_records {
                Some(n) => println!("Aggregate:    {} records", n),
                None => println!("Aggregate:    not written"),
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

async fn crawl_command(config: &CrawlConfig, limit: Option<usize>) -> Result<()> {
    let fetcher = HttpFetcher::new(config)?;

    let mut slugs = slugs::resolve(config, &fetcher).await?;
    if slugs.is_empty() {
        println!("No slugs found. Nothing to crawl.");
        return Ok(());
    }
    if let Some(n) = limit {
        slugs.truncate(n);
    }

    println!("Crawling {} schemes...", slugs.len());
    let mut progress = ConsoleProgress::new();
    let stats = crawler::crawl(config, &fetcher, &slugs, &mut progress).await?;
    println!(
        "Done: {}/{} schemes fetched ({} skipped).",
        stats.ok, stats.total, stats.errors
    );
    Ok(())
}

async fn run_external(step: &str, cmd: &str) -> Result<()> {
    let mut parts = cmd.split_whitespace();
    let Some(program) = parts.next() else {
        anyhow::bail!("Empty {step} command");
    };

    println!("Running {step} step: {cmd}");
    let status = tokio::process::Command::new(program)
        .args(parts)
        .status()
        .await
        .with_context(|| format!("Failed to launch {step} command"))?;

    if !status.success() {
        anyhow::bail!("{step} command exited with {status}");
    }
    Ok(())
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
