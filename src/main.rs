use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, warn};

mod aggregate;
mod categories;
mod config;
mod db;
mod enrich;
mod keywords;
mod models;
mod pipeline;
mod report;
mod telemetry;
mod validation;
mod weighting;
mod winners;

use config::PegConfig;
use models::PersonSummary;
use pipeline::CycleSnapshot;

#[derive(Parser)]
#[command(name = "peg-cycle")]
#[command(about = "Peer recognition pegs: cycle winners and results", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load a small demo workspace
    Seed,
    /// Import pegs from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Record a peg from one person to another
    Give {
        #[arg(long)]
        sender: String,
        #[arg(long)]
        receiver: String,
        #[arg(long)]
        comment: String,
        #[arg(long, default_value_t = 7)]
        cycle_days: i64,
    },
    /// Store a named setting
    Set {
        #[arg(long)]
        name: String,
        #[arg(long)]
        value: String,
    },
    /// Select the winners of the current cycle
    Winners {
        #[arg(long, default_value_t = 7)]
        cycle_days: i64,
        #[arg(long)]
        json: bool,
    },
    /// Show per-person results for the current cycle
    Results {
        #[arg(long, default_value_t = 7)]
        cycle_days: i64,
        #[arg(long, default_value_t = 20)]
        limit: usize,
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown report
    Report {
        #[arg(long, default_value_t = 7)]
        cycle_days: i64,
        #[arg(long, default_value = "pegs.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init()?;

    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} pegs from {}.", csv.display());
        }
        Commands::Give {
            sender,
            receiver,
            comment,
            cycle_days,
        } => {
            if sender == receiver {
                bail!("a peg cannot be given to yourself");
            }
            let config = load_config(&pool).await?;
            let since = pipeline::cycle_start(cycle_days)?;

            let mut tx = pool.begin().await?;
            db::lock_sender(&mut tx, &sender).await?;
            let already_given = db::count_pegs_given(&mut tx, &sender, since).await?;
            if !validation::can_give(
                already_given,
                config.peg_limit_per_cycle,
                &comment,
                &config.keywords,
                &config.penalty_keywords,
            ) {
                bail!(
                    "{sender} has already given {already_given} pegs this cycle (limit {})",
                    config.peg_limit_per_cycle.unwrap_or_default()
                );
            }
            let id = db::insert_peg(&mut tx, &sender, &receiver, &comment).await?;
            tx.commit().await?;

            let is_valid = validation::is_valid(
                &comment,
                config.require_keywords,
                &config.keywords,
                &config.penalty_keywords,
            );
            info!(%id, %sender, %receiver, is_valid, "peg recorded");
            if is_valid {
                println!("Peg recorded.");
            } else {
                println!("Peg recorded as a penalty.");
            }
        }
        Commands::Set { name, value } => {
            db::upsert_setting(&pool, &name, &value).await?;
            if let Err(err) = load_config(&pool).await {
                warn!(error = %err, "settings are not usable yet");
            }
            println!("Stored {name}.");
        }
        Commands::Winners { cycle_days, json } => {
            let outcome = pipeline::run(&load_snapshot(&pool, cycle_days).await?);

            if json {
                println!("{}", serde_json::to_string_pretty(&outcome.winners)?);
                return Ok(());
            }
            if outcome.winners.is_empty() {
                println!("No winners this cycle.");
                return Ok(());
            }

            println!("Winners since {}:", outcome.cycle_start.date_naive());
            for winner in outcome.winners.iter() {
                println!(
                    "- {} ({}) weighted score {:.1} across {} pegs",
                    winner.person_name(),
                    winner.person_id(),
                    winner.weighted_pegs_received(),
                    winner.valid_pegs_received().len()
                );
            }
        }
        Commands::Results {
            cycle_days,
            limit,
            json,
        } => {
            let outcome = pipeline::run(&load_snapshot(&pool, cycle_days).await?);
            let ranked = report::rank_results(&outcome.results);

            if json {
                let top: Vec<_> = ranked.into_iter().take(limit).collect();
                println!("{}", serde_json::to_string_pretty(&top)?);
                return Ok(());
            }
            if ranked.is_empty() {
                println!("No pegs given this cycle.");
                return Ok(());
            }

            println!("Results since {}:", outcome.cycle_start.date_naive());
            for result in ranked.iter().take(limit) {
                println!(
                    "- {} received {} pegs, gave {} penalties, total {}",
                    result.person_name(),
                    result.valid_pegs_received().len(),
                    result.penalty_pegs_given().len(),
                    result.net_peg_count()
                );
            }
        }
        Commands::Report { cycle_days, out } => {
            let outcome = pipeline::run(&load_snapshot(&pool, cycle_days).await?);
            let report = report::build_report(&outcome);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

async fn load_config(pool: &PgPool) -> anyhow::Result<PegConfig> {
    let settings = db::fetch_settings(pool).await?;
    let locations = db::fetch_locations(pool).await?;
    PegConfig::from_settings(&settings, &locations.names).context("invalid peg settings")
}

// Sequential reads: the run never sees settings or locations change under it.
async fn load_snapshot(pool: &PgPool, cycle_days: i64) -> anyhow::Result<CycleSnapshot> {
    let cycle_start = pipeline::cycle_start(cycle_days)?;
    let events = db::fetch_cycle_pegs(pool, cycle_start).await?;
    let settings = db::fetch_settings(pool).await?;
    let locations = db::fetch_locations(pool).await?;
    let config =
        PegConfig::from_settings(&settings, &locations.names).context("invalid peg settings")?;

    Ok(CycleSnapshot {
        cycle_start,
        events,
        config,
        locations,
    })
}
