use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use battle_rank::config::AppConfig;
use battle_rank::normalize::normalize_all;
use battle_rank::pipeline::{compute, rebuild, RebuildSummary};
use battle_rank::source::{FileSource, GithubIssuesSource, RecordSource};
use battle_rank::storage::{EntitySink, JsonDirSink, MemorySink, StorageConfig};

#[derive(Parser)]
#[command(name = "battle-rank")]
#[command(about = "Aggregate match results into player, race and region statistics")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Output directory (overrides config)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
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
    /// Recompute every statistic and rewrite the output directory
    Rebuild {
        /// Read payloads from a local file instead of the issue tracker
        #[arg(long)]
        input: Option<PathBuf>,

        /// Compute everything but don't write to disk
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate a payload file and report how many records would be used
    Check {
        /// Path to a JSON array or JSON Lines file
        path: PathBuf,
    },

    /// Print the leaderboard for a payload file without writing anything
    Leaderboard {
        /// Path to a JSON array or JSON Lines file
        path: PathBuf,

        /// Number of rows to show
        #[arg(long, default_value = "20")]
        limit: usize,

        /// Also report this player's rank
        #[arg(long)]
        player: Option<String>,
    },
}

fn init_tracing(level: &str, json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn print_summary(summary: &RebuildSummary, dry_run: bool) {
    println!("\n=== Rebuild Results ===");
    println!("Payloads:         {}", summary.payloads);
    println!("Accepted:         {}", summary.accepted);
    println!("Skipped:          {}", summary.skipped);
    println!("Players:          {}", summary.players);
    println!("Races:            {}", summary.races);
    println!("Regions:          {}", summary.regions);
    println!("Documents:        {}", summary.documents);
    if dry_run {
        println!("\n(dry run - no data written to disk)");
    }
}

async fn read_file_payloads(path: PathBuf) -> Result<Vec<battle_rank::RawPayload>> {
    let source = FileSource::new(&path);
    source
        .fetch_all()
        .await
        .with_context(|| format!("Failed to read payloads from {:?}", path))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config from {:?}", cli.config))?;
    if let Some(output) = cli.output {
        config.output_dir = output;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    init_tracing(&config.log_level, cli.json_logs);
    tracing::info!("Starting battle-rank v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Rebuild { input, dry_run } => {
            let source: Box<dyn RecordSource> = match input {
                Some(path) => Box::new(FileSource::new(path)),
                None => Box::new(
                    GithubIssuesSource::new(config.source.clone())
                        .context("Failed to create issue tracker client")?,
                ),
            };

            let mut sink: Box<dyn EntitySink> = if dry_run {
                Box::new(MemorySink::new())
            } else {
                Box::new(JsonDirSink::new(StorageConfig::new(
                    config.output_dir.clone(),
                )))
            };

            let summary = rebuild(source.as_ref(), sink.as_mut(), Utc::now())
                .await
                .context("Rebuild failed")?;
            print_summary(&summary, dry_run);
        }
        Commands::Check { path } => {
            let payloads = read_file_payloads(path).await?;
            let report = normalize_all(&payloads);

            println!("\n=== Check Results ===");
            println!("Payloads:         {}", payloads.len());
            println!("Accepted:         {}", report.accepted());
            println!("Skipped:          {}", report.skipped_count());
            if !report.skipped.is_empty() {
                println!("\nSkipped payloads:");
                for (id, reason) in &report.skipped {
                    println!("  - #{}: {}", id, reason);
                }
            }
        }
        Commands::Leaderboard {
            path,
            limit,
            player,
        } => {
            let payloads = read_file_payloads(path).await?;
            let computed = compute(&payloads, Utc::now());

            println!(
                "\n{:>4}  {:<24} {:>6} {:>6} {:>6} {:>8}",
                "Rank", "Player", "Games", "Wins", "Losses", "Win rate"
            );
            for (i, row) in computed.leaderboard.top(limit).iter().enumerate() {
                println!(
                    "{:>4}  {:<24} {:>6} {:>6} {:>6} {:>8.3}",
                    i + 1,
                    row.player,
                    row.stats.total,
                    row.stats.wins,
                    row.stats.losses,
                    row.stats.win_rate
                );
            }

            if let Some(player) = player {
                match computed.leaderboard.rank_of(&player) {
                    Some(rank) => println!(
                        "\n{} is ranked {} of {}",
                        player,
                        rank,
                        computed.leaderboard.players.len()
                    ),
                    None => println!("\n{} has no recorded matches", player),
                }
            }
        }
    }

    Ok(())
}
