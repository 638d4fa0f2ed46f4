//! Remote service boundary.
//!
//! The source/target service is a black-box RPC surface: enumerate jobs,
//! read a record range, replay a batch, plus whole-dataset export/import for
//! jobs migrated as a single blob. [`StateService`] is the seam the
//! executors run against; [`HttpStateService`] is the production
//! implementation, tests substitute an in-memory one.

use crate::jobs::Job;
use crate::range::Range;
use crate::utils::errors::{MigrationError, Result};
use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait StateService: Send + Sync {
    /// All job names and current record amounts, in one call. No retry:
    /// a failure here aborts the whole run.
    async fn list_jobs(&self) -> Result<Vec<Job>>;

    /// Export-shaped payload for records `[range.start, range.end)` of a job.
    async fn fetch_range(&self, job: &str, range: Range) -> Result<Vec<u8>>;

    /// Whole-dataset export blob.
    async fn export_all(&self, job: &str) -> Result<Vec<u8>>;

    /// Replay one batch of submit-shaped records.
    async fn submit_batch(&self, job: &str, records: &[Value]) -> Result<()>;

    /// Whole-dataset import of a previously exported blob.
    async fn import_all(&self, job: &str, payload: &[u8]) -> Result<()>;
}

/// HTTP/JSON implementation of the service boundary.
pub struct HttpStateService {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpStateService {
    pub fn new(base_url: String, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn post(&self, endpoint: &str) -> reqwest::RequestBuilder {
        let mut request = self.client.post(format!("{}/{}", self.base_url, endpoint));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        request
    }
}

/// Response body text for error reporting, best effort.
async fn response_reason(resp: reqwest::Response) -> String {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    if body.is_empty() {
        format!("status {status}")
    } else {
        format!("status {status}: {body}")
    }
}

#[async_trait]
impl StateService for HttpStateService {
    async fn list_jobs(&self) -> Result<Vec<Job>> {
        let resp = self
            .post("backup_job_list")
            .send()
            .await
            .map_err(|e| MigrationError::Enumeration(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(MigrationError::Enumeration(response_reason(resp).await));
        }

        resp.json::<Vec<Job>>()
            .await
            .map_err(|e| MigrationError::Enumeration(format!("invalid job list: {e}")))
    }

    async fn fetch_range(&self, job: &str, range: Range) -> Result<Vec<u8>> {
        let fetch_err = |reason: String| MigrationError::Fetch {
            job: job.to_string(),
            start: range.start,
            end: range.end,
            reason,
        };

        let resp = self
            .post("job_data_backup")
            .json(&serde_json::json!({
                "job": job,
                "start": range.start,
                "end": range.end,
            }))
            .send()
            .await
            .map_err(|e| fetch_err(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(fetch_err(response_reason(resp).await));
        }

        let bytes = resp.bytes().await.map_err(|e| fetch_err(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    async fn export_all(&self, job: &str) -> Result<Vec<u8>> {
        let fetch_err = |reason: String| MigrationError::Fetch {
            job: job.to_string(),
            start: 0,
            end: 0,
            reason,
        };

        let resp = self
            .post("admin_export")
            .json(&serde_json::json!({ "job": job }))
            .send()
            .await
            .map_err(|e| fetch_err(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(fetch_err(response_reason(resp).await));
        }

        let bytes = resp.bytes().await.map_err(|e| fetch_err(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    async fn submit_batch(&self, job: &str, records: &[Value]) -> Result<()> {
        let submit_err = |reason: String| MigrationError::Submit {
            job: job.to_string(),
            reason,
        };

        let resp = self
            .post("job_data_restore")
            .json(&serde_json::json!({
                "job": job,
                "records": records,
            }))
            .send()
            .await
            .map_err(|e| submit_err(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(submit_err(response_reason(resp).await));
        }
        Ok(())
    }

    async fn import_all(&self, job: &str, payload: &[u8]) -> Result<()> {
        let submit_err = |reason: String| MigrationError::Submit {
            job: job.to_string(),
            reason,
        };

        let resp = self
            .post("admin_import")
            .header("x-job", job)
            .header("content-type", "application/octet-stream")
            .body(payload.to_vec())
            .send()
            .await
            .map_err(|e| submit_err(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(submit_err(response_reason(resp).await));
        }
        Ok(())
    }
}
