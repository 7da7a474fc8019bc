use anisink::config::{
    load_config_with_hash, Config, CrawlMode, ProviderEntry, StoragePaths,
};
use anisink::crawler::{
    build_http_client, AlreadyDownloadedFinder, CrawlSession, DownloadTally, HttpDownloader,
    HttpPageFetcher, JsonAnimeConverter, PaginationCrawler, RangeCrawler, RegexEntryExtractor,
    RegexHighestIdDetector,
};
use anisink::cursor::{LastPageMemorizer, LastPageStore, NumericPages, SeasonYear};
use anisink::dcs::{DcsScheduler, DcsStore};
use anisink::dead_entries::{ConfiguredProviders, DeadEntriesRegistry};
use anisink::selector::{IntRangeSelector, PaginationSelector};
use anisink::Provider;
use anyhow::Context;
use clap::Parser;
use regex::Regex;
use reqwest::Client;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "anisink", version, about = "Crawls anime metadata providers into durable per-provider state")]
struct Cli {
    /// Path to the TOML configuration file
    config: PathBuf,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease log verbosity (-q for warnings only, -qq for errors only)
    #[arg(short, long, action = clap::ArgAction::Count)]
    quiet: u8,

    /// Validate the configuration and list the providers without crawling
    #[arg(long)]
    dry_run: bool,
}

fn setup_logging(verbose: u8, quiet: u8) {
    let directive = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "anisink=warn"
    } else {
        match verbose {
            0 => "anisink=info,warn",
            1 => "anisink=debug,info",
            _ => "anisink=trace,debug",
        }
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Loaded configuration {} ({})", cli.config.display(), hash);

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(&config).await
}

fn handle_dry_run(config: &Config) {
    println!("Configuration is valid.");
    println!();
    println!("{:<30} {:<14} {:<10}", "hostname", "kind", "crawl");
    for entry in &config.providers {
        println!("{:<30} {:<14} {:<10}", entry.hostname, entry.kind, entry.crawl);
    }
}

async fn handle_crawl(config: &Config) -> anyhow::Result<()> {
    let paths = StoragePaths::from_config(&config.storage);
    let client = build_http_client(&config.http.user_agent, config.http.timeout_secs)?;

    let providers: Vec<Arc<Provider>> = config
        .providers
        .iter()
        .map(|entry| entry.to_provider().map(Arc::new))
        .collect::<Result<_, _>>()?;

    let dcs_store = Arc::new(DcsStore::new(&paths.dcs_dir));
    let dead_entries = Arc::new(DeadEntriesRegistry::new(
        paths.dead_entries_dir(),
        dcs_store.clone(),
        Box::new(ConfiguredProviders(providers.clone())),
    ));
    let schedule = Arc::new(DcsScheduler::new(dcs_store.clone()));

    let mut handles = Vec::new();
    for (entry, provider) in config.providers.iter().zip(providers.iter()) {
        let session = CrawlSession::new(
            provider.clone(),
            paths.clone(),
            Box::new(HttpDownloader::new(client.clone(), provider.clone())),
            Box::new(JsonAnimeConverter),
            dcs_store.clone(),
            dead_entries.clone(),
            schedule.clone(),
        );
        let hostname = provider.hostname.clone();

        match entry.crawl_mode()? {
            CrawlMode::IdRange => {
                let selector = IntRangeSelector::new(
                    provider.clone(),
                    Box::new(highest_id_detector(&client, entry)?),
                    schedule.clone(),
                    dead_entries.clone(),
                    AlreadyDownloadedFinder::new(paths.clone()),
                );
                let crawler = RangeCrawler::new(session, selector);
                handles.push(tokio::spawn(async move {
                    (hostname, crawler.run().await)
                }));
            }
            CrawlMode::Pages => {
                let memorizer: Arc<dyn LastPageStore> = Arc::new(
                    LastPageMemorizer::<u32>::new(
                        &paths.working_dir(provider),
                        provider.hostname.clone(),
                    ),
                );
                let strategy = NumericPages::new(provider.hostname.clone());
                let crawler = PaginationCrawler::new(
                    session,
                    pagination_selector(&client, entry, provider, &paths, schedule.clone(), dead_entries.clone())?,
                    memorizer,
                    Box::new(strategy),
                    Box::new(highest_id_detector(&client, entry)?),
                );
                handles.push(tokio::spawn(async move {
                    (hostname, crawler.run().await)
                }));
            }
            CrawlMode::Seasons => {
                let memorizer: Arc<dyn LastPageStore> = Arc::new(
                    LastPageMemorizer::<String>::new(
                        &paths.working_dir(provider),
                        provider.hostname.clone(),
                    ),
                );
                let first_year = entry
                    .first_year
                    .with_context(|| format!("{}: first-year is required", entry.hostname))?;
                let strategy =
                    SeasonYear::new(provider.hostname.clone(), first_year, entry.include_tba);
                let crawler = PaginationCrawler::new(
                    session,
                    pagination_selector(&client, entry, provider, &paths, schedule.clone(), dead_entries.clone())?,
                    memorizer,
                    Box::new(strategy),
                    Box::new(highest_id_detector(&client, entry)?),
                );
                handles.push(tokio::spawn(async move {
                    (hostname, crawler.run().await)
                }));
            }
        }
    }

    let mut total = DownloadTally::default();
    let mut failures = 0usize;
    for handle in handles {
        let (hostname, outcome) = handle.await?;
        match outcome {
            Ok(tally) => {
                total.saved += tally.saved;
                total.dead += tally.dead;
                total.empty += tally.empty;
            }
            Err(error) => {
                failures += 1;
                tracing::error!("Crawl of {} failed: {}", hostname, error);
            }
        }
    }

    tracing::info!(
        "All providers finished: {} saved, {} dead, {} blank, {} failed",
        total.saved,
        total.dead,
        total.empty,
        failures
    );

    if failures > 0 {
        anyhow::bail!("{} provider crawl(s) failed", failures);
    }
    Ok(())
}

fn highest_id_detector(
    client: &Client,
    entry: &ProviderEntry,
) -> anyhow::Result<RegexHighestIdDetector> {
    let probe = entry
        .newest_probe_link
        .as_deref()
        .with_context(|| format!("{}: newest-probe-link is required", entry.hostname))?;
    let pattern = entry
        .highest_id_pattern
        .as_deref()
        .with_context(|| format!("{}: highest-id-pattern is required", entry.hostname))?;

    Ok(RegexHighestIdDetector::new(
        client.clone(),
        Url::parse(probe)?,
        Regex::new(pattern)?,
    ))
}

fn pagination_selector(
    client: &Client,
    entry: &ProviderEntry,
    provider: &Arc<Provider>,
    paths: &StoragePaths,
    schedule: Arc<DcsScheduler>,
    dead_entries: Arc<DeadEntriesRegistry>,
) -> anyhow::Result<PaginationSelector> {
    let pattern = entry
        .entry_pattern
        .as_deref()
        .with_context(|| format!("{}: entry-pattern is required", entry.hostname))?;

    Ok(PaginationSelector::new(
        provider.clone(),
        Box::new(HttpPageFetcher::new(client.clone())),
        Box::new(RegexEntryExtractor::new(Regex::new(pattern)?)),
        schedule,
        dead_entries,
        AlreadyDownloadedFinder::new(paths.clone()),
    ))
}
