use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use authwatch::config::Config;
use authwatch::detect::engine::run_scan;
use authwatch::detect::trend::{aggregate_daily, moving_average, TrendError};
use authwatch::detect::classify;
use authwatch::parser::summary::{collect_reports, SummaryError};
use authwatch::source::{FileSource, JournalSource, LogSource};
use authwatch::status::history::HistoryStore;

#[derive(Parser)]
#[command(
    name = "authwatch",
    about = "Host-level SSH authentication anomaly detection",
    version,
    long_about = None
)]
struct Cli {
    /// Optional TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the daemon (API server + scan scheduler)
    Serve {
        /// Bind address
        #[arg(long, default_value = "0.0.0.0:8080")]
        bind: String,
    },

    /// Run one detection scan over the auth log or journal
    Scan {
        /// Auth log file to scan (defaults to the configured path)
        #[arg(long)]
        log: Option<PathBuf>,

        /// Read the systemd journal instead of a file
        #[arg(long)]
        journal: bool,
    },

    /// Trend report over daily summary extracts (auth_summary_*.csv)
    Report {
        /// Directory holding the summary CSVs
        #[arg(long)]
        reports_dir: Option<PathBuf>,
    },

    /// Show the latest run snapshot
    Status {
        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },

    /// Show recent run snapshots, newest first
    History {
        /// Maximum entries to show
        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Toggle periodic scans
    Automation {
        #[command(subcommand)]
        action: AutomationAction,
    },
}

#[derive(Subcommand)]
enum AutomationAction {
    /// Enable periodic scans
    Enable,
    /// Disable periodic scans
    Disable,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { bind } => {
            tracing::info!(%bind, "Starting AuthWatch daemon");
            authwatch::serve(&bind, config).await?;
        }
        Commands::Scan { log, journal } => {
            let source: Box<dyn LogSource> = if journal {
                Box::new(JournalSource::new(config.scan.unit.clone()))
            } else {
                let path = log.unwrap_or_else(|| PathBuf::from(&config.scan.log_path));
                Box::new(FileSource::new(path))
            };

            let pool = authwatch::storage::open_pool(&config.db_path)?;
            let (report, _) = run_scan(&pool, &config, source.as_ref()).await?;
            print!("{}", report.summary_text());

            let engine = authwatch::detect::engine::ScanEngine::new(config);
            let code = engine.exit_code(&report);
            if code != 0 {
                std::process::exit(code);
            }
        }
        Commands::Report { reports_dir } => {
            let dir = reports_dir.unwrap_or_else(|| PathBuf::from(&config.reports_dir));
            run_report(&dir, &config)?;
        }
        Commands::Status { json } => {
            let pool = authwatch::storage::open_pool(&config.db_path)?;
            let store = HistoryStore::new(pool, config.history_capacity);
            match store.latest()? {
                Some(snapshot) if json => {
                    println!("{}", serde_json::to_string_pretty(&snapshot)?);
                }
                Some(snapshot) => {
                    let status = snapshot
                        .status
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "UNKNOWN".to_string());
                    let dash = match snapshot.dashboard_ok {
                        Some(true) => "OK",
                        Some(false) => "FAIL",
                        None => "N/A",
                    };
                    println!("Status     : {status}");
                    println!("Timestamp  : {}", snapshot.timestamp.to_rfc3339());
                    println!(
                        "Runner RC  : {}",
                        snapshot
                            .runner_rc
                            .map(|rc| rc.to_string())
                            .unwrap_or_else(|| "N/A".to_string())
                    );
                    println!("Dashboard  : {dash}");
                }
                None if json => println!("null"),
                None => println!("No status available yet. Run a scan first."),
            }
        }
        Commands::History { limit } => {
            let pool = authwatch::storage::open_pool(&config.db_path)?;
            let store = HistoryStore::new(pool, config.history_capacity);
            let records = store.recent(limit)?;
            if records.is_empty() {
                println!("No runs recorded yet.");
            }
            for record in records {
                println!("{}", record.describe());
            }
        }
        Commands::Automation { action } => {
            let pool = authwatch::storage::open_pool(&config.db_path)?;
            let enabled = matches!(action, AutomationAction::Enable);
            authwatch::storage::set_automation_enabled(&pool, enabled)?;
            println!(
                "Automation {}.",
                if enabled { "enabled" } else { "disabled" }
            );
        }
    }

    Ok(())
}

/// Aggregate summary extracts, smooth, and classify the latest day. The
/// "no files" and "files but no valid rows" cases get distinct messages.
fn run_report(dir: &std::path::Path, config: &Config) -> Result<()> {
    let rows = match collect_reports(dir) {
        Ok(rows) => rows,
        Err(SummaryError::NoReports { dir }) => {
            println!("No CSV summaries found at: {}", dir.display());
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let daily = match aggregate_daily(&rows) {
        Ok(daily) => daily,
        Err(TrendError::NoRows) | Err(TrendError::NoValidRows) => {
            println!("CSV files found, but no valid rows with date format YYYY-MM-DD.");
            return Ok(());
        }
    };

    let series: Vec<f64> = daily.values().map(|&c| c as f64).collect();
    let smoothed = moving_average(&series, config.smoothing_window);

    println!(
        "{:<12} | {:>8} | {:>10}",
        "Date", "Failures", "Avg"
    );
    println!("{:-<12}-|-{:-<8}-|-{:-<10}", "", "", "");
    for ((date, count), avg) in daily.iter().zip(&smoothed) {
        println!("{:<12} | {:>8} | {:>10.2}", date.to_string(), count, avg);
    }

    if let Some((date, count)) = daily.iter().next_back() {
        let severity = classify(*count, &config.thresholds);
        println!("\nLatest day {date}: {count} failures ({severity})");
    }

    Ok(())
}
