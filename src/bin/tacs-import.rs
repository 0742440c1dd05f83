use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tacs_import::helpers::time::parse_changes_since;
use tacs_import::observability::export;
use tacs_import::sinks::{build_sink, SinkKind};
use tacs_import::traversal::{build_engine, SyncReport, TraversalEngine};
use tacs_import::utils::config_loader;
use tacs_import::utils::logging;
use tacs_import::utils::logging::LogLevel;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "CONFIG", default_value = "tacs-import.yaml")]
    config: String,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import every catalog, organisation and employment
    Full,
    /// Import the employment assignments only
    Employments,
    /// Import everything changed since a date (YYYY-MM-DD)
    Changes {
        #[arg(long, value_parser = parse_since)]
        since: NaiveDate,
    },
    /// Full import, employment assignments, then an incremental import
    Demo {
        #[arg(long, value_parser = parse_since, default_value = "2016-05-15")]
        since: NaiveDate,
    },
}

fn parse_since(raw: &str) -> Result<NaiveDate, String> {
    parse_changes_since(raw).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // -------------------------------
    // 1. Load YAML config, start logging
    // -------------------------------

    let args = Args::parse();
    let service_config = config_loader::run(&args.config).await?;
    logging::run(&service_config, args.log_level).await?;

    // -------------------------------
    // 2. Cancellation on ctrl-c / SIGTERM
    // -------------------------------

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_shutdown(cancel.clone()));

    // -------------------------------
    // 3. Sink and engine
    // -------------------------------

    let sink = Arc::new(build_sink(&service_config.sink)?);
    let engine = build_engine(&service_config, sink, cancel)?;

    // -------------------------------
    // 4. Run the requested import
    // -------------------------------

    info!(config = %args.config, "import starting...");
    let outcome = run_command(&engine, &args.command).await;

    // -------------------------------
    // 5. Export metrics, regardless of the outcome
    // -------------------------------

    if let Err(e) = export::write_textfile(&service_config.settings.metrics).await {
        warn!(error = %e, "could not write metrics");
    }

    match outcome {
        Ok(reports) if reports.iter().any(SyncReport::has_errors) => Ok(ExitCode::from(2)),
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            error!(error = %e, "import failed");
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn run_command(
    engine: &TraversalEngine<SinkKind>,
    command: &Command,
) -> Result<Vec<SyncReport>> {
    let reports = match command {
        Command::Full => vec![engine.full_import().await?],
        Command::Employments => vec![engine.import_employment_assignments().await?],
        Command::Changes { since } => vec![engine.import_changes_since(*since).await?],
        Command::Demo { since } => vec![
            engine.full_import().await?,
            engine.import_employment_assignments().await?,
            engine.import_changes_since(*since).await?,
        ],
    };

    for report in &reports {
        for failure in &report.errors {
            warn!(mode = %report.mode, branch = %failure.branch, error = %failure.error, "branch error");
        }
        info!(report = %serde_json::to_string(report)?, "import report");
    }
    Ok(reports)
}

async fn cancel_on_shutdown(cancel: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    warn!("shutdown requested, letting in-flight requests finish");
    cancel.cancel();
}
