//! State Migrator - Main entry point
//!
//! Paginated backup/restore pipeline for remote stateful services.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use state_migrator::backup::{self, BackupOptions};
use state_migrator::client::{HttpStateService, StateService};
use state_migrator::config::Config;
use state_migrator::report::RunReport;
use state_migrator::store::ChunkStore;
use state_migrator::{jobs, restore, utils};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Capture pending ranges of one job, or of every enumerated job
    Backup {
        /// Restrict to a single job
        #[arg(short, long)]
        job: Option<String>,
    },
    /// Replay pending chunks of one job, or of every job with pending chunks
    Restore {
        /// Restrict to a single job
        #[arg(short, long)]
        job: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = if let Some(config_path) = args.config {
        Config::from_file(&config_path)?
    } else {
        Config::default()
    };
    config.validate()?;

    // Initialize logging
    let log_level = args.log_level.as_deref().unwrap_or(&config.log.level);
    utils::logger::init(log_level)?;

    let run_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(
        "Starting state-migrator v{} (run_id: {}, service: {})",
        env!("CARGO_PKG_VERSION"),
        run_id,
        config.service.url
    );

    let client: Arc<dyn StateService> = Arc::new(HttpStateService::new(
        config.service.url.clone(),
        config.service.token.clone(),
    ));
    let store = ChunkStore::new(config.storage.data_dir.clone());
    let mut report = RunReport::new(run_id);

    match args.command {
        Command::Backup { job } => {
            let opts = BackupOptions {
                step: config.migration.step,
                workers: config.migration.backup_workers,
            };
            run_backup(client, &store, &opts, job, &mut report).await?;
        }
        Command::Restore { job } => {
            run_restore(client.as_ref(), &store, job, &mut report).await?;
        }
    }

    report.finish();
    report.log_summary();

    if !report.success() {
        tracing::warn!("Run finished with unresolved ranges; re-run the same command to resume");
        std::process::exit(1);
    }

    tracing::info!("Run complete: all requested jobs reached their goal state");
    Ok(())
}

async fn run_backup(
    client: Arc<dyn StateService>,
    store: &ChunkStore,
    opts: &BackupOptions,
    job_filter: Option<String>,
    report: &mut RunReport,
) -> Result<()> {
    // A failed enumeration aborts the whole run: planning needs a consistent
    // amount per job, and there is no partial list to proceed with.
    let mut enumerated = client.list_jobs().await?;

    if let Some(name) = &job_filter {
        enumerated.retain(|j| j.name == *name);
        if enumerated.is_empty() {
            bail!("job '{}' is not enumerated by the source service", name);
        }
    }

    for job in enumerated {
        let spec = jobs::lookup(&job.name);
        let job_report = backup::backup_job(Arc::clone(&client), store, &spec, job.amount, opts).await;
        report.backups.push(job_report);
    }
    Ok(())
}

async fn run_restore(
    client: &dyn StateService,
    store: &ChunkStore,
    job_filter: Option<String>,
    report: &mut RunReport,
) -> Result<()> {
    let names = match job_filter {
        Some(name) => vec![name],
        None => store.jobs_with_pending()?,
    };

    if names.is_empty() {
        tracing::info!("Nothing to restore: no pending chunks found");
        return Ok(());
    }

    for name in names {
        let spec = jobs::lookup(&name);
        let job_report = restore::restore_job(client, store, &spec).await;
        report.restores.push(job_report);
    }
    Ok(())
}
