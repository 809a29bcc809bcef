//! Main entry point for the Duel Arena command line tool
//!
//! `simulate` drives a full topic through the arena service with a noisy
//! simulated judge and prints the resulting leaderboard; `check-config`
//! validates the configuration and exits.

use anyhow::Result;
use clap::{Args as ClapArgs, Parser, Subcommand};
use duel_arena::config::{validate_config, AppConfig};
use duel_arena::metrics::MetricsCollector;
use duel_arena::{ArenaService, InMemoryItemRepository, LeaderboardEntry, VoteRequest};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Duel Arena - pairwise comparison ranking with TrueSkill
#[derive(Parser)]
#[command(
    name = "duel-arena",
    version,
    about = "Rank items from head-to-head votes",
    long_about = "Duel Arena ranks the items of a topic from pairwise votes. Each vote updates \
                  a TrueSkill estimate per item, items are ranked by a conservative score, and \
                  the next pair is sampled to favour uncertain items and close contests."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        global = true,
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        global = true,
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a simulated topic end to end and print the leaderboard
    Simulate(SimulateArgs),
    /// Validate configuration and exit
    CheckConfig,
}

#[derive(ClapArgs)]
struct SimulateArgs {
    /// Number of items in the simulated topic
    #[arg(long, default_value_t = 12)]
    items: usize,

    /// Number of votes to cast
    #[arg(long, default_value_t = 300)]
    votes: usize,

    /// Seed for matchmaking and the simulated judge
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Judge noise as a fraction of the hidden skill spread
    #[arg(long, default_value_t = 0.15)]
    noise: f64,

    /// Print the leaderboard as JSON
    #[arg(long)]
    json: bool,

    /// Print Prometheus metrics after the run
    #[arg(long)]
    metrics: bool,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Load and merge configuration from file, environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if let Command::Simulate(simulate) = &args.command {
        if let Some(seed) = simulate.seed {
            config.matchmaking.seed = Some(seed);
        }
    }

    // CLI overrides get the same checks as file and environment values
    validate_config(&config)?;

    Ok(config)
}

/// Display configuration summary
fn display_config(config: &AppConfig) {
    info!("Duel Arena {}", duel_arena::VERSION);
    info!("   Service: {}", config.service.name);
    info!("   Log level: {}", config.service.log_level);
    info!(
        "   Prior: mu0={} sigma0={:.4} beta={:.4} draw_probability={}",
        config.rating.mu0, config.rating.sigma0, config.rating.beta, config.rating.draw_probability
    );
    info!(
        "   Pools: uncertainty={} closeness={} seed={:?}",
        config.matchmaking.uncertainty_pool,
        config.matchmaking.closeness_pool,
        config.matchmaking.seed
    );
}

#[derive(Serialize)]
struct SimulatedRow<'a> {
    rank: usize,
    id: &'a str,
    title: &'a str,
    hidden_skill: f64,
    mu: f64,
    sigma: f64,
    score: f64,
    matches: u64,
}

/// How well the model's view of each pair matched the judge
#[derive(Debug, Default)]
struct PredictionStats {
    pairs: usize,
    quality_sum: f64,
    decisive: usize,
    predicted: usize,
}

impl PredictionStats {
    /// Record the match quality of a served pair
    fn observe_pair(&mut self, quality: f64) {
        self.pairs += 1;
        self.quality_sum += quality;
    }

    /// Record the pre-vote win probability the model gave the actual winner
    fn observe_decisive(&mut self, p_winner: f64) {
        self.decisive += 1;
        if p_winner > 0.5 {
            self.predicted += 1;
        }
    }

    fn mean_quality(&self) -> f64 {
        if self.pairs == 0 {
            0.0
        } else {
            self.quality_sum / self.pairs as f64
        }
    }

    fn accuracy(&self) -> f64 {
        if self.decisive == 0 {
            0.0
        } else {
            self.predicted as f64 / self.decisive as f64
        }
    }
}

#[derive(Serialize)]
struct SimulationReport<'a> {
    leaderboard: Vec<SimulatedRow<'a>>,
    mean_match_quality: f64,
    prediction_accuracy: f64,
}

/// Drive a simulated topic through the arena service
async fn run_simulation(config: AppConfig, args: &SimulateArgs) -> Result<()> {
    let topic_id = "simulation";
    let repository = Arc::new(InMemoryItemRepository::new());
    let metrics = Arc::new(MetricsCollector::new()?);
    let service = ArenaService::new(&config, repository)?.with_metrics(metrics.clone());

    let mut judge = match config.matchmaking.seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
        None => StdRng::from_os_rng(),
    };

    // Hidden skills are evenly spread over [0, 1]; the ranking should recover their order
    let mut hidden = HashMap::new();
    for i in 0..args.items {
        let item = service
            .create_item(topic_id, &format!("Item {:02}", i + 1))
            .await?;
        let skill = if args.items > 1 {
            i as f64 / (args.items - 1) as f64
        } else {
            0.5
        };
        hidden.insert(item.id.clone(), skill);
    }

    info!(items = args.items, votes = args.votes, "Starting simulation");

    let mut cast = 0;
    let mut stats = PredictionStats::default();
    for _ in 0..args.votes {
        let pair = match service.next_pair(topic_id).await {
            Ok(pair) => pair,
            Err(e) => {
                warn!(error = %e, "Stopping simulation early");
                break;
            }
        };

        let skill_a = hidden.get(&pair.item_a.id).copied().unwrap_or(0.5);
        let skill_b = hidden.get(&pair.item_b.id).copied().unwrap_or(0.5);
        let perf_a = skill_a + args.noise * (judge.random::<f64>() - 0.5);
        let perf_b = skill_b + args.noise * (judge.random::<f64>() - 0.5);

        let is_draw = (perf_a - perf_b).abs() < args.noise * 0.05;
        let (winner, loser) = if perf_a >= perf_b {
            (&pair.item_a, &pair.item_b)
        } else {
            (&pair.item_b, &pair.item_a)
        };

        stats.observe_pair(
            service
                .model()
                .match_quality(&pair.item_a.skill, &pair.item_b.skill),
        );
        if !is_draw {
            let (p_winner, _) = service
                .model()
                .expected_score(&winner.skill, &loser.skill);
            stats.observe_decisive(p_winner);
        }

        let vote = VoteRequest {
            topic_id: topic_id.to_string(),
            winner_id: winner.id.clone(),
            loser_id: loser.id.clone(),
            is_draw,
            voter_id: Some("simulated-judge".to_string()),
        };

        match service.submit_vote(&vote).await {
            Ok(_) => cast += 1,
            Err(e) => error!(error = %e, "Simulated vote failed"),
        }
    }

    let board = service.leaderboard(topic_id).await?;
    info!(
        votes = cast,
        mean_match_quality = stats.mean_quality(),
        prediction_accuracy = stats.accuracy(),
        "Simulation finished"
    );

    print_report(&board, &hidden, &stats, args.json)?;

    if args.metrics {
        println!("{}", metrics.gather_text()?);
    }

    Ok(())
}

fn print_report(
    board: &[LeaderboardEntry],
    hidden: &HashMap<String, f64>,
    stats: &PredictionStats,
    json: bool,
) -> Result<()> {
    let rows: Vec<SimulatedRow> = board
        .iter()
        .map(|entry| SimulatedRow {
            rank: entry.rank,
            id: &entry.item.id,
            title: &entry.item.title,
            hidden_skill: hidden.get(&entry.item.id).copied().unwrap_or_default(),
            mu: entry.item.skill.mu,
            sigma: entry.item.skill.sigma,
            score: entry.score,
            matches: entry.item.record.match_count,
        })
        .collect();

    if json {
        let report = SimulationReport {
            leaderboard: rows,
            mean_match_quality: stats.mean_quality(),
            prediction_accuracy: stats.accuracy(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{:>4}  {:<10} {:>7} {:>8} {:>7} {:>8} {:>7}",
        "rank", "title", "hidden", "mu", "sigma", "score", "matches"
    );
    for row in rows {
        println!(
            "{:>4}  {:<10} {:>7.3} {:>8.3} {:>7.3} {:>8.3} {:>7}",
            row.rank, row.title, row.hidden_skill, row.mu, row.sigma, row.score, row.matches
        );
    }
    println!();
    println!("mean match quality:  {:.3}", stats.mean_quality());
    println!(
        "prediction accuracy: {:.3} ({} of {} decisive votes)",
        stats.accuracy(),
        stats.predicted,
        stats.decisive
    );

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {:#}", e);
        std::process::exit(1);
    });

    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    match &args.command {
        Command::CheckConfig => {
            display_config(&config);
            info!("Configuration validation successful");
            Ok(())
        }
        Command::Simulate(simulate) => {
            display_config(&config);
            if let Err(e) = run_simulation(config, simulate).await {
                error!("Simulation failed: {:#}", e);
                std::process::exit(1);
            }
            Ok(())
        }
    }
}
