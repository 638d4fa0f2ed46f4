//! Per-job and per-run outcome reporting.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One range that failed during backup, with the reason.
#[derive(Debug, Clone, Serialize)]
pub struct RangeFailure {
    pub start: u64,
    pub reason: String,
}

/// Outcome of `backup(job)`.
#[derive(Debug, Serialize)]
pub struct JobBackupReport {
    pub job: String,
    pub planned: usize,
    /// Ranges whose artifact already existed (satisfied by a previous run).
    pub skipped: usize,
    /// Ranges newly fetched and persisted by this run.
    pub completed: usize,
    pub failed: Vec<RangeFailure>,
}

impl JobBackupReport {
    pub fn new(job: &str, planned: usize) -> Self {
        Self {
            job: job.to_string(),
            planned,
            skipped: 0,
            completed: 0,
            failed: Vec::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.skipped + self.completed == self.planned
    }
}

/// Outcome of `restore(job)`.
#[derive(Debug, Serialize)]
pub struct JobRestoreReport {
    pub job: String,
    /// Chunks replayed and marked done by this run.
    pub replayed: usize,
    /// Chunks still pending when the run stopped.
    pub pending_left: usize,
    /// First (and only) failure; processing stops there.
    pub error: Option<String>,
}

impl JobRestoreReport {
    pub fn is_complete(&self) -> bool {
        self.error.is_none() && self.pending_left == 0
    }
}

/// Aggregate outcome of one CLI invocation.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub started: DateTime<Utc>,
    pub finished: Option<DateTime<Utc>>,
    pub backups: Vec<JobBackupReport>,
    pub restores: Vec<JobRestoreReport>,
}

impl RunReport {
    pub fn new(run_id: String) -> Self {
        Self {
            run_id,
            started: Utc::now(),
            finished: None,
            backups: Vec::new(),
            restores: Vec::new(),
        }
    }

    pub fn finish(&mut self) {
        self.finished = Some(Utc::now());
    }

    /// True iff every processed job reached its goal state.
    pub fn success(&self) -> bool {
        self.backups.iter().all(JobBackupReport::is_complete)
            && self.restores.iter().all(JobRestoreReport::is_complete)
    }

    pub fn log_summary(&self) {
        for b in &self.backups {
            tracing::info!(
                "Backup summary for '{}': {} planned, {} skipped, {} completed, {} failed",
                b.job,
                b.planned,
                b.skipped,
                b.completed,
                b.failed.len()
            );
            for failure in &b.failed {
                tracing::warn!(
                    "  failed range start {} of '{}': {}",
                    failure.start,
                    b.job,
                    failure.reason
                );
            }
        }
        for r in &self.restores {
            match &r.error {
                None => tracing::info!(
                    "Restore summary for '{}': {} replayed, {} pending",
                    r.job,
                    r.replayed,
                    r.pending_left
                ),
                Some(e) => tracing::warn!(
                    "Restore summary for '{}': {} replayed, {} pending, stopped: {}",
                    r.job,
                    r.replayed,
                    r.pending_left,
                    e
                ),
            }
        }
    }
}
