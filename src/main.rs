//! Keiba Archive main entry point
//!
//! Command-line interface for the netkeiba page harvester. A run resolves a
//! crawl span from flags, environment variables, or the config file,
//! refreshes the leading boards, then walks the span's meeting days within
//! the daily request budget.

use chrono::{Local, NaiveDate};
use clap::Parser;
use keiba_archive::config::{load_config_with_hash, Config};
use keiba_archive::dates::{parse_date_token, parse_month_token};
use keiba_archive::output::{print_budget, print_statistics};
use keiba_archive::{Coordinator, CrawlOptions, CrawlOutcome, CrawlSpan, Endpoints};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Keiba Archive: an incremental netkeiba page harvester
///
/// Collects raw race, horse, and leading-board pages into a local file
/// store. Pages already on disk are never fetched again, so interrupted runs
/// can simply be restarted.
#[derive(Parser, Debug)]
#[command(name = "keiba-archive")]
#[command(version = "1.0.0")]
#[command(about = "Incremental netkeiba page harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults to ./config.toml when present)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// First date to crawl (YYYY-MM-DD, YYYYMMDD, today, yesterday,
    /// last_week, last_month, or offsets like -7days)
    #[arg(long, env = "SCRAPER_START_DATE", allow_hyphen_values = true)]
    start_date: Option<String>,

    /// Last date to crawl, inclusive
    #[arg(long, env = "SCRAPER_END_DATE", allow_hyphen_values = true)]
    end_date: Option<String>,

    /// First month to crawl (YYYY-MM, YYYY/MM, YYYYMM)
    #[arg(long, env = "SCRAPER_START_MONTH")]
    start_month: Option<String>,

    /// Last month to crawl, inclusive
    #[arg(long, env = "SCRAPER_END_MONTH")]
    end_month: Option<String>,

    /// Crawl the month containing the day one week back
    #[arg(long)]
    last_week: bool,

    /// Skip horse result pages
    #[arg(long)]
    no_horses: bool,

    /// Skip pedigree pages
    #[arg(long)]
    no_peds: bool,

    /// Skip the daily leading-board refresh
    #[arg(long)]
    no_leading: bool,

    /// Crawl today's meeting too instead of leaving it to settle
    #[arg(long)]
    include_today: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load_configuration(&cli)?;

    let today = Local::now().date_naive();
    let span = resolve_span(&cli, &config, today)?;
    tracing::info!("crawl span: {}", span);

    let options = CrawlOptions {
        fetch_horses: !cli.no_horses,
        fetch_pedigrees: !cli.no_peds,
        skip_today: !cli.include_today,
    };

    let mut coordinator = Coordinator::new(&config, Endpoints::default(), options)?;

    // Preflight: a run that cannot issue a single request should say so now.
    let status = coordinator.budget_status().await;
    print_budget(&status);
    if status.remaining() == 0 {
        anyhow::bail!("daily request budget already exhausted, try again tomorrow");
    }

    if !cli.no_leading {
        let refreshed = coordinator.refresh_leading().await?;
        tracing::info!("{} leading boards refreshed", refreshed);
    }

    let report = coordinator.run(&span).await?;

    println!();
    print_statistics(&report.stats);
    println!();
    print_budget(&report.budget);

    if report.outcome == CrawlOutcome::BudgetExhausted {
        println!("\nStopped early: daily request budget exhausted.");
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("keiba_archive=info,warn"),
            1 => EnvFilter::new("keiba_archive=debug,info"),
            2 => EnvFilter::new("keiba_archive=trace,debug"),
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

/// Loads the configuration named on the command line, or `./config.toml`
/// when present, or the built-in defaults.
fn load_configuration(cli: &Cli) -> anyhow::Result<Config> {
    let path = match &cli.config {
        Some(path) => path.clone(),
        None => {
            let default_path = PathBuf::from("config.toml");
            if !default_path.exists() {
                tracing::info!("no configuration file found, using built-in defaults");
                return Ok(Config::default());
            }
            default_path
        }
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(&path)?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);
    Ok(config)
}

/// Resolves the crawl span.
///
/// Precedence: `--last-week`, then a month pair, then a date pair (flags and
/// their environment variables are equivalent), then the config file's
/// `[scraper]` section, then the month containing last week. Giving only one
/// half of a pair is an error rather than a silent fall-through.
fn resolve_span(cli: &Cli, config: &Config, today: NaiveDate) -> anyhow::Result<CrawlSpan> {
    if cli.last_week {
        return Ok(CrawlSpan::last_week(today));
    }

    match (&cli.start_month, &cli.end_month) {
        (Some(start), Some(end)) => {
            let start = parse_month_token(start)?;
            let end = parse_month_token(end)?;
            return Ok(CrawlSpan::between_months(start, end)?);
        }
        (None, None) => {}
        _ => anyhow::bail!("--start-month and --end-month must be given together"),
    }

    match (&cli.start_date, &cli.end_date) {
        (Some(start), Some(end)) => {
            let start = parse_date_token(start, today)?;
            let end = parse_date_token(end, today)?;
            return Ok(CrawlSpan::between_dates(start, end)?);
        }
        (None, None) => {}
        _ => anyhow::bail!("--start-date and --end-date must be given together"),
    }

    if let (Some(start), Some(end)) = (&config.scraper.start_month, &config.scraper.end_month) {
        let start = parse_month_token(start)?;
        let end = parse_month_token(end)?;
        return Ok(CrawlSpan::between_months(start, end)?);
    }

    if let (Some(start), Some(end)) = (&config.scraper.start_date, &config.scraper.end_date) {
        let start = parse_date_token(start, today)?;
        let end = parse_date_token(end, today)?;
        return Ok(CrawlSpan::between_dates(start, end)?);
    }

    tracing::info!("no crawl span configured, defaulting to last week's month");
    Ok(CrawlSpan::last_week(today))
}
