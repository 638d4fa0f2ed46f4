//! Restore executor: replay pending chunks into the target service, in order.
//!
//! Later ranges may reference entities inserted by earlier ones, so replay
//! within a job is strictly ascending by range start and stops at the first
//! failure, leaving that chunk and everything after it pending. Marking a
//! chunk done happens only after the target accepted it, which gives
//! at-least-once delivery per range: a crash between acceptance and the
//! rename resubmits that one chunk on the next run.

use crate::client::StateService;
use crate::jobs::{JobKind, JobSpec};
use crate::report::JobRestoreReport;
use crate::store::ChunkStore;
use crate::transform;
use crate::utils::errors::Result;
use serde_json::Value;
use tracing::{debug, error, info};

/// Restore one job from its pending chunks. Never returns an error: the
/// first failure is recorded in the report and processing stops there.
pub async fn restore_job(
    client: &dyn StateService,
    store: &ChunkStore,
    spec: &JobSpec,
) -> JobRestoreReport {
    let job = spec.name.as_str();
    let mut report = JobRestoreReport {
        job: job.to_string(),
        replayed: 0,
        pending_left: 0,
        error: None,
    };

    let pending = match store.pending(job) {
        Ok(pending) => pending,
        Err(e) => {
            error!("Cannot enumerate pending chunks of '{}': {}", job, e);
            report.error = Some(e.to_string());
            return report;
        }
    };

    report.pending_left = pending.len();
    info!("Restoring '{}': {} pending chunks", job, pending.len());

    for start in pending {
        match replay_chunk(client, store, spec, start).await {
            Ok(()) => {
                debug!("Replayed chunk start {} of '{}'", start, job);
                report.replayed += 1;
                report.pending_left -= 1;
            }
            Err(e) => {
                error!(
                    "Restore of '{}' stopped at chunk start {}: {}",
                    job, start, e
                );
                report.error = Some(e.to_string());
                break;
            }
        }
    }

    report
}

async fn replay_chunk(
    client: &dyn StateService,
    store: &ChunkStore,
    spec: &JobSpec,
    start: u64,
) -> Result<()> {
    let payload = store.read(&spec.name, start)?;

    match (spec.kind, &spec.schema) {
        (JobKind::WholeDataset, _) => {
            client.import_all(&spec.name, &payload).await?;
        }
        (JobKind::Ranged, Some(schema)) => {
            let records = transform::transform_payload(&payload, schema)?;
            client.submit_batch(&spec.name, &records).await?;
        }
        (JobKind::Ranged, None) => {
            let records: Vec<Value> = serde_json::from_slice(&payload)?;
            client.submit_batch(&spec.name, &records).await?;
        }
    }

    store.mark_done(&spec.name, start)
}
