//! DrillWatch - drilling operations monitor
//!
//! Command-line front end over the record database: import records, run
//! anomaly detection for a daily report, print the cost dashboard, and manage
//! the problem register. Results are printed to stdout as JSON; logs go to
//! stderr.
//!
//! # Usage
//!
//! ```bash
//! drillwatch import records.json
//! drillwatch detect --report 12 --operations 40,41
//! drillwatch dashboard --today 2024-03-01
//! drillwatch problems --status open
//! drillwatch resolve 7 --by 3
//! ```
//!
//! # Environment Variables
//!
//! - `DRILLWATCH_CONFIG`: Path to the TOML config file
//! - `DRILLWATCH_DATA_DIR`: Record database directory (same as `--data-dir`)
//! - `DRILLWATCH_LOG_JSON`: Emit logs as JSON lines (same as `--log-json`)
//! - `RUST_LOG`: Logging level (default: info)

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};

use drillwatch::config::{self, MonitorConfig};
use drillwatch::storage::{RecordBundle, Repositories};
use drillwatch::{DashboardEngine, DetectionError, DetectionService, ProblemService};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "drillwatch")]
#[command(about = "Drilling operations anomaly detection and cost reporting")]
#[command(version)]
struct CliArgs {
    /// Path to a TOML config file (overrides DRILLWATCH_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the record database directory
    #[arg(long, global = true, env = "DRILLWATCH_DATA_DIR")]
    data_dir: Option<String>,

    /// Emit logs as JSON lines instead of text
    #[arg(long, global = true, env = "DRILLWATCH_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Load users, phases, daily reports, operations and problems from JSON
    Import {
        /// Path to the JSON bundle
        bundle: PathBuf,
    },

    /// Run anomaly detection for a saved daily report
    Detect {
        /// Daily report id
        #[arg(long)]
        report: u64,
        /// Operations updated with the report (default: all attached to it)
        #[arg(long, value_delimiter = ',')]
        operations: Option<Vec<u64>>,
    },

    /// Print the cost and schedule dashboard
    Dashboard {
        /// Date used for open phases (YYYY-MM-DD, default: today)
        #[arg(long)]
        today: Option<NaiveDate>,
    },

    /// List problems, optionally filtered by status label
    Problems {
        #[arg(long)]
        status: Option<String>,
    },

    /// Mark a problem resolved
    Resolve {
        id: u64,
        /// Resolving user id
        #[arg(long)]
        by: Option<u64>,
    },

    /// Mark a problem closed
    Close { id: u64 },
}

// ============================================================================
// Main
// ============================================================================

fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(args.log_json);

    let mut monitor_config = match &args.config {
        Some(path) => MonitorConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => MonitorConfig::load(),
    };
    if let Some(dir) = args.data_dir {
        monitor_config.storage.data_dir = dir;
    }
    config::init(monitor_config);
    let cfg = config::get();

    info!(
        well = %cfg.well.name,
        currency = %cfg.reporting.currency,
        data_dir = %cfg.storage.data_dir,
        "DrillWatch starting"
    );

    let repos = Repositories::open_sled(&cfg.storage.data_dir)
        .with_context(|| format!("Failed to open record database at {}", cfg.storage.data_dir))?;

    let result = run(args.command, &repos, cfg);
    repos.flush().context("Failed to flush record database")?;
    result
}

fn run(command: SubCommand, repos: &Repositories, cfg: &MonitorConfig) -> Result<()> {
    match command {
        SubCommand::Import { bundle } => {
            let records = RecordBundle::load_from_file(&bundle)
                .with_context(|| format!("Failed to read bundle {}", bundle.display()))?;
            let summary = records.import_into(repos).context("Import failed")?;
            print_json(&summary)
        }

        SubCommand::Detect { report, operations } => {
            let service = DetectionService::new(repos.clone(), cfg);
            match service.detect_problems_from_daily_report(report, operations.as_deref()) {
                Ok(outcome) => {
                    if !outcome.is_clean() {
                        warn!(failed = outcome.failures.len(), "Some findings could not be recorded");
                    }
                    print_json(&outcome)
                }
                Err(DetectionError::ReportNotFound(id)) => {
                    anyhow::bail!("Daily report {id} not found")
                }
                Err(e) => Err(e).context("Detection failed"),
            }
        }

        SubCommand::Dashboard { today } => {
            let engine = DashboardEngine::new(
                repos.phases.clone(),
                repos.operations.clone(),
                cfg.dashboard.top_operation_types,
            );
            let snapshot = match today {
                Some(date) => engine.compute_dashboard_at(date),
                None => engine.compute_dashboard(),
            }
            .context("Failed to compute dashboard")?;
            print_json(&snapshot)
        }

        SubCommand::Problems { status } => {
            let service = ProblemService::new(repos);
            let problems = match status {
                Some(label) => service.find_by_status_label(&label)?,
                None => service.find_all()?,
            };
            print_json(&problems)
        }

        SubCommand::Resolve { id, by } => {
            let service = ProblemService::new(repos);
            let problem = service
                .resolve(id, by)?
                .with_context(|| format!("Problem {id} not found"))?;
            print_json(&problem)
        }

        SubCommand::Close { id } => {
            let service = ProblemService::new(repos);
            let problem = service
                .close(id)?
                .with_context(|| format!("Problem {id} not found"))?;
            print_json(&problem)
        }
    }
}

/// Logs on stderr so stdout stays machine-readable.
fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}
