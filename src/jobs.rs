//! Job model and the per-job transformation registry.

use crate::transform::{FieldRule, RecordSchema};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// A named, countable dataset exposed by the source service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub name: String,
    /// Total logical records currently available; read once per backup run
    /// and treated as fixed for its duration. Meaningless for whole-dataset
    /// jobs.
    pub amount: u64,
}

/// Failure granularity of a job's fetch/submit calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    /// Paginated per-range fetch and submit.
    Ranged,
    /// One atomic export/import blob, treated as a single implicit chunk.
    WholeDataset,
}

/// How one job is migrated: its call granularity and, for ranged jobs whose
/// records need rewriting, the transformation rule set.
#[derive(Debug, Clone)]
pub struct JobSpec {
    pub name: String,
    pub kind: JobKind,
    /// `None` means the payload passes through untouched.
    pub schema: Option<RecordSchema>,
}

/// Registry of known jobs and their rule sets.
pub fn registry() -> Vec<JobSpec> {
    vec![
        JobSpec {
            name: "developers".to_string(),
            kind: JobKind::Ranged,
            schema: Some(developer_schema()),
        },
        JobSpec {
            name: "apps".to_string(),
            kind: JobKind::Ranged,
            schema: Some(app_schema()),
        },
        JobSpec {
            name: "vault".to_string(),
            kind: JobKind::WholeDataset,
            schema: None,
        },
    ]
}

/// Resolve a job name to its spec. Jobs the service enumerates without a
/// registry entry are migrated as ranged passthrough, so a dataset added on
/// the source is still captured.
pub fn lookup(name: &str) -> JobSpec {
    registry()
        .into_iter()
        .find(|spec| spec.name == name)
        .unwrap_or_else(|| JobSpec {
            name: name.to_string(),
            kind: JobKind::Ranged,
            schema: None,
        })
}

fn developer_schema() -> RecordSchema {
    RecordSchema::new()
        .field("principal", FieldRule::Principal)
        .field("role", FieldRule::Tag(vec!["System", "Vault", "Operator"]))
        .field("website", FieldRule::Optional)
        .field("last_updated", FieldRule::Backfill(json!(0)))
}

fn app_schema() -> RecordSchema {
    let release_schema = RecordSchema::new()
        .field("status", FieldRule::Tag(vec!["Published", "Retired"]))
        .field("checksum", FieldRule::Optional)
        .field("last_updated", FieldRule::Backfill(json!(0)));

    RecordSchema::new()
        .field("publisher", FieldRule::Principal)
        .field("category", FieldRule::Tag(vec!["Featured", "Community", "System"]))
        .field("description", FieldRule::Optional)
        .field("last_updated", FieldRule::Backfill(json!(0)))
        .field("releases", FieldRule::Nested(release_schema))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registered_job_has_schema() {
        let spec = lookup("developers");
        assert_eq!(spec.kind, JobKind::Ranged);
        assert!(spec.schema.is_some());
    }

    #[test]
    fn test_whole_dataset_job() {
        let spec = lookup("vault");
        assert_eq!(spec.kind, JobKind::WholeDataset);
        assert!(spec.schema.is_none());
    }

    #[test]
    fn test_unregistered_job_defaults_to_ranged_passthrough() {
        let spec = lookup("telemetry");
        assert_eq!(spec.name, "telemetry");
        assert_eq!(spec.kind, JobKind::Ranged);
        assert!(spec.schema.is_none());
    }
}
