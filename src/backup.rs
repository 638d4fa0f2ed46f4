//! Backup executor: walk planned ranges, fetch missing chunks, persist them.
//!
//! Ranges are independent (distinct reads, distinct artifact paths), so
//! missing ranges are fetched under a bounded worker pool. A failed range is
//! recorded and the rest of the job continues; re-running the command is the
//! only retry mechanism, with already-written chunks skipped by the
//! existence check.

use crate::client::StateService;
use crate::jobs::{JobKind, JobSpec};
use crate::range::{self, Range};
use crate::report::{JobBackupReport, RangeFailure};
use crate::store::ChunkStore;
use crate::utils::errors::Result;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct BackupOptions {
    /// Records per chunk.
    pub step: u64,
    /// Maximum concurrent range fetches.
    pub workers: usize,
}

/// Back up one job. Never returns an error: per-range failures are recorded
/// in the report and the caller decides what the run's exit status is.
pub async fn backup_job(
    client: Arc<dyn StateService>,
    store: &ChunkStore,
    spec: &JobSpec,
    amount: u64,
    opts: &BackupOptions,
) -> JobBackupReport {
    match spec.kind {
        JobKind::WholeDataset => backup_whole(client, store, &spec.name).await,
        JobKind::Ranged => backup_ranged(client, store, &spec.name, amount, opts).await,
    }
}

/// Whole-dataset jobs export one blob, stored as a single implicit chunk
/// starting at 0; the enumerated amount is ignored.
async fn backup_whole(
    client: Arc<dyn StateService>,
    store: &ChunkStore,
    job: &str,
) -> JobBackupReport {
    let mut report = JobBackupReport::new(job, 1);

    if store.exists(job, 0) {
        debug!("Skipping '{}': export already captured", job);
        report.skipped = 1;
        return report;
    }

    match export_and_write(client.as_ref(), store, job).await {
        Ok(bytes) => {
            info!("Captured whole-dataset export of '{}' ({} bytes)", job, bytes);
            report.completed = 1;
        }
        Err(e) => {
            warn!("Export of '{}' failed: {}", job, e);
            report.failed.push(RangeFailure {
                start: 0,
                reason: e.to_string(),
            });
        }
    }
    report
}

async fn export_and_write(
    client: &dyn StateService,
    store: &ChunkStore,
    job: &str,
) -> Result<usize> {
    let payload = client.export_all(job).await?;
    store.write(job, 0, &payload)?;
    Ok(payload.len())
}

async fn backup_ranged(
    client: Arc<dyn StateService>,
    store: &ChunkStore,
    job: &str,
    amount: u64,
    opts: &BackupOptions,
) -> JobBackupReport {
    let ranges = range::plan(amount, opts.step);
    let mut report = JobBackupReport::new(job, ranges.len());

    let mut missing: Vec<Range> = Vec::new();
    for r in ranges {
        if store.exists(job, r.start) {
            report.skipped += 1;
        } else {
            missing.push(r);
        }
    }

    // Artifacts past the current amount mean the source shrank since a
    // previous run; they are left in place, never pruned.
    if let Ok(pending) = store.pending(job) {
        if pending.iter().any(|&s| s >= amount) {
            debug!("Job '{}' has stale artifacts beyond amount {}", job, amount);
        }
    }

    info!(
        "Backing up '{}': {} ranges planned, {} already satisfied, {} to fetch",
        job,
        report.planned,
        report.skipped,
        missing.len()
    );

    let semaphore = Arc::new(Semaphore::new(opts.workers));
    let mut handles = Vec::with_capacity(missing.len());

    for r in missing {
        let sem = Arc::clone(&semaphore);
        let client = Arc::clone(&client);
        let store = store.clone();
        let job = job.to_string();

        let handle = tokio::spawn(async move {
            let _permit = match sem.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return (r.start, Err("worker pool closed".to_string())),
            };
            let result = fetch_and_write(client.as_ref(), &store, &job, r).await;
            (r.start, result.map_err(|e| e.to_string()))
        });
        handles.push(handle);
    }

    for handle in handles {
        match handle.await {
            Ok((_, Ok(()))) => report.completed += 1,
            Ok((start, Err(reason))) => {
                warn!("Range start {} of '{}' failed: {}", start, job, reason);
                report.failed.push(RangeFailure { start, reason });
            }
            Err(e) => {
                warn!("Fetch task for '{}' panicked: {}", job, e);
                report.failed.push(RangeFailure {
                    start: 0,
                    reason: format!("task panicked: {e}"),
                });
            }
        }
    }

    report
}

async fn fetch_and_write(
    client: &dyn StateService,
    store: &ChunkStore,
    job: &str,
    r: Range,
) -> Result<()> {
    let payload = client.fetch_range(job, r).await?;
    store.write(job, r.start, &payload)?;
    debug!("Captured '{}' {} ({} bytes)", job, r, payload.len());
    Ok(())
}
