use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use colored::*;
use std::fs;
use std::path::PathBuf;

use recoveryrs::aggregator::{aggregate, RecoveryInput};
use recoveryrs::config::AppConfig;
use recoveryrs::display;
use recoveryrs::error::{IngestionError, RecoveryRsError};
use recoveryrs::logging::{init_logging, LogLevel};
use recoveryrs::models::ExerciseCategory;
use recoveryrs::numeric::{parse_timestamp_strict, Numeric};
use recoveryrs::rest_timer::RestTimer;

/// RecoveryRS - muscle recovery and rest timing
///
/// Estimates per-muscle and CNS recovery from workout timestamps and
/// classifies rest between sets.
#[derive(Parser)]
#[command(name = "recoveryrs")]
#[command(author = "RecoveryRS Contributors")]
#[command(version)]
#[command(about = "Recovery and rest timing calculator", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show recovery status from a JSON payload of fatigue sources
    Recovery {
        /// JSON file with `muscles` and optional `cns`
        #[arg(short, long)]
        input: PathBuf,

        /// Evaluate at this instant instead of now (RFC 3339)
        #[arg(long)]
        now: Option<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Include CNS even if disabled in the config
        #[arg(long)]
        cns: bool,
    },

    /// Classify rest time for an exercise category
    Rest {
        /// compound or isolation
        #[arg(short = 'k', long, default_value = "compound")]
        category: String,

        /// Elapsed rest in seconds
        #[arg(short, long, conflicts_with = "since")]
        elapsed: Option<f64>,

        /// Time the last set was completed (RFC 3339)
        #[arg(short, long)]
        since: Option<String>,

        /// Evaluate at this instant instead of now (RFC 3339)
        #[arg(long)]
        now: Option<String>,
    },

    /// Configure application settings
    Config {
        /// Print the active configuration
        #[arg(short, long)]
        list: bool,

        /// Write a default configuration file
        #[arg(long)]
        init: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(AppConfig::default_config_path);
    // An explicit --config must exist unless it is about to be written
    let config = match &cli.config {
        Some(path) if !matches!(cli.command, Commands::Config { init: true, .. }) => {
            AppConfig::load_from_file(path)?
        }
        _ => AppConfig::load_or_default(&config_path)?,
    };

    let mut log_config = config.logging.clone();
    if cli.verbose > 0 {
        log_config.level = LogLevel::from_verbosity(cli.verbose);
    }
    init_logging(&log_config)?;

    match cli.command {
        Commands::Recovery {
            input,
            now,
            json,
            cns,
        } => {
            let now = resolve_now(now.as_deref())?;
            let raw = fs::read_to_string(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let mut payload = RecoveryInput::from_json(&raw).map_err(report)?;

            for muscle in payload.muscles.iter_mut() {
                config.recovery.apply_muscle_default(muscle);
            }
            if let Some(cns_wire) = payload.cns.as_mut() {
                config.recovery.apply_cns_default(cns_wire);
            }

            let (muscles, cns_source) = payload
                .into_sources()
                .map_err(|e| report(e.into()))?;
            let cns_source = cns_source.filter(|_| cns || config.recovery.cns_tracking_enabled);
            let status = aggregate(&muscles, cns_source.as_ref(), now);

            if json {
                println!("{}", serde_json::to_string_pretty(&status.to_wire())?);
            } else {
                println!("{}", display::recovery_table(&status));
                if status.fully_recovered() {
                    println!("{}", "✓ Fully recovered".green().bold());
                } else if let Some(at) = status.next_recovered_at() {
                    println!(
                        "{}",
                        format!("Next recovery: {}", at.format("%Y-%m-%d %H:%M UTC")).yellow()
                    );
                }
            }
        }

        Commands::Rest {
            category,
            elapsed,
            since,
            now,
        } => {
            let category: ExerciseCategory = category
                .parse()
                .map_err(|e: IngestionError| report(e.into()))?;
            let now = resolve_now(now.as_deref())?;

            let mut timer = RestTimer::new();
            match (elapsed, since) {
                (Some(secs), _) => timer.start_with_elapsed(now, Numeric::from_f64(secs), category),
                (None, Some(ts)) => {
                    let since = parse_timestamp_strict("since", &ts).map_err(|e| report(e.into()))?;
                    timer.start(since, category)
                }
                (None, None) => bail!("Either --elapsed or --since is required"),
            }

            let status = timer.status(now, &config.rest);
            println!("{}", display::rest_line(timer.elapsed_seconds(now), &status));
            println!(
                "  goal {}s, max {}s ({})",
                status.goal, status.max_goal, category
            );
        }

        Commands::Config { list, init } => {
            if init {
                let mut fresh = AppConfig::default();
                fresh.save_to_file(&config_path)?;
                println!(
                    "{}",
                    format!("✓ Wrote default configuration to {}", config_path.display()).green()
                );
            } else if list {
                println!("{}", format!("# {}", config_path.display()).dimmed());
                println!("{}", toml::to_string_pretty(&config)?);
            } else {
                println!("Config file: {}", config_path.display());
            }
        }
    }

    Ok(())
}

/// Log a library error at its severity and turn it into a user-facing message
fn report(err: RecoveryRsError) -> anyhow::Error {
    err.log();
    anyhow::anyhow!(err.user_message())
}

fn resolve_now(raw: Option<&str>) -> Result<DateTime<Utc>> {
    match raw {
        Some(ts) => parse_timestamp_strict("now", ts).map_err(|e| report(e.into())),
        None => Ok(Utc::now()),
    }
}
