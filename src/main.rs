use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chess_dash::api::{build_router, state::AppState};
use chess_dash::cache::DatasetStore;
use chess_dash::calculate::{format_kpi, RatingSummary};
use chess_dash::config::AppConfig;
use chess_dash::filter::{self, FilterSpec, RankLimit, Selection};
use chess_dash::models::{RatingKind, ResolvedPlayerRecord};
use chess_dash::resolve;

#[derive(Parser)]
#[command(name = "chess-dash")]
#[command(about = "Chess ranking dashboard: freshest snapshot per player, KPIs and charts")]
#[command(version)]
struct Cli {
    /// Path to configuration file (optional unless given explicitly)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Rankings CSV, overrides `data_file` from the config
    #[arg(long)]
    data: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error), overrides the config
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the dashboard API server
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Port number
        #[arg(long)]
        port: Option<u16>,
    },

    /// Print player counts and mean ratings
    Summary {
        /// Comma-separated countries, or "all"
        #[arg(long)]
        countries: Option<String>,

        /// Comma-separated titles, or "all"
        #[arg(long)]
        titles: Option<String>,
    },

    /// Print the filtered player table
    Players {
        /// Comma-separated countries, or "all"
        #[arg(long)]
        countries: Option<String>,

        /// Comma-separated titles, or "all"
        #[arg(long)]
        titles: Option<String>,

        /// Only players ranked at or above this rank
        #[arg(long)]
        top_n: Option<u32>,

        /// Maximum rows to print
        #[arg(long, default_value = "50")]
        limit: usize,
    },

    /// Load and resolve the source, then report what was dropped
    Check,
}

const DEFAULT_CONFIG: &str = "./chess-dash.toml";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref(), Path::new(DEFAULT_CONFIG))
        .context("Failed to load configuration")?;
    if let Some(data) = &cli.data {
        config.data_file = data.clone();
    }

    init_tracing(cli.log_level.as_deref().unwrap_or(&config.log_level), cli.json_logs);
    tracing::info!("Starting chess-dash v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            config.validate().context("Invalid configuration")?;

            let store = open_store(&config.data_file)?;
            let addr = format!("{}:{}", config.server.host, config.server.port);
            let app = build_router(AppState::new(config, store));

            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("Failed to bind {}", addr))?;
            tracing::info!("Dashboard API: http://{}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Summary { countries, titles } => {
            let spec = cli_filter(countries.as_deref(), titles.as_deref(), None);
            let mut store = open_store(&config.data_file)?;
            let snapshot = store.snapshot(resolve::today());
            let players = &snapshot.resolution.players;
            let subset = filter::apply(players, &spec);

            let global = RatingSummary::compute(players);
            let filtered = RatingSummary::compute(&subset);

            println!("\n=== Summary ===");
            println!("Rows loaded:      {}", snapshot.dataset.len());
            println!("Players:          {}", global.players);
            println!("Matching filter:  {}", filtered.players);
            println!();
            println!("{:<12} {:>10} {:>10}", "Rating", "All", "Filtered");
            for kind in RatingKind::ALL {
                println!(
                    "{:<12} {:>10} {:>10}",
                    kind.label(),
                    format_kpi(global.get(kind)),
                    format_kpi(filtered.get(kind))
                );
            }
        }
        Commands::Players {
            countries,
            titles,
            top_n,
            limit,
        } => {
            let spec = cli_filter(countries.as_deref(), titles.as_deref(), top_n);
            let mut store = open_store(&config.data_file)?;
            let snapshot = store.snapshot(resolve::today());
            let mut rows = filter::apply(&snapshot.resolution.players, &spec);
            rows.sort_by_key(|p| (p.rank().unwrap_or(u32::MAX), p.name().to_string()));

            if rows.is_empty() {
                println!("{}", chess_dash::charts::NO_MATCHES);
                return Ok(());
            }

            println!(
                "{:>5}  {:<28} {:<4} {:<4} {:>9} {:>7} {:>7}  {}",
                "Rank", "Name", "Ctry", "Titl", "Classical", "Rapid", "Blitz", "Updated"
            );
            for p in rows.iter().take(limit) {
                print_row(p);
            }
            if rows.len() > limit {
                println!("... {} more", rows.len() - limit);
            }
        }
        Commands::Check => {
            let store = open_store(&config.data_file)?;
            let dataset = store.dataset();
            let resolution = resolve::resolve(&dataset.records, resolve::today());
            let report = &resolution.report;

            println!("\n=== Check ===");
            println!("Source:           {}", config.data_file.display());
            println!("Fingerprint:      {}", dataset.id);
            println!("Rows:             {}", report.input_rows);
            println!("Players:          {}", resolution.len());
            println!("Superseded:       {}", report.superseded);
            println!("Unparseable date: {}", report.dropped_unparseable);
            println!(
                "Date sources:     {} primary, {} fallback, {} structured",
                report.primary_parsed, report.fallback_parsed, report.structured
            );
            if report.dropped_unparseable > 0 {
                tracing::warn!(
                    "{} rows were dropped because lastupdated could not be parsed",
                    report.dropped_unparseable
                );
            }
        }
    }

    Ok(())
}

fn init_tracing(level: &str, json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn open_store(path: &Path) -> Result<DatasetStore> {
    DatasetStore::open(path).with_context(|| format!("Failed to load {}", path.display()))
}

fn cli_filter(countries: Option<&str>, titles: Option<&str>, top_n: Option<u32>) -> FilterSpec {
    FilterSpec::all()
        .with_countries(Selection::parse(countries))
        .with_titles(Selection::parse(titles))
        .with_max_rank(RankLimit::from(top_n))
}

fn print_row(p: &ResolvedPlayerRecord) {
    let num = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{:.0}", v));
    println!(
        "{:>5}  {:<28} {:<4} {:<4} {:>9} {:>7} {:>7}  {}",
        p.rank().map_or_else(|| "-".to_string(), |r| r.to_string()),
        p.name(),
        p.country().unwrap_or("-"),
        p.title().unwrap_or("-"),
        num(p.rating(RatingKind::Classical)),
        num(p.rating(RatingKind::Rapid)),
        num(p.rating(RatingKind::Blitz)),
        p.updated_on(),
    );
}
