//! Typed access to the screening backend.
//!
//! Every call is a single HTTP round trip: no retries, no caching, no timeout
//! beyond the transport default. Response bodies decode leniently; a non-2xx
//! status is always an error.

mod http;
mod wire;

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::{Record, RecordId, RecordStatus, Report, ReportId};
use crate::items::QueryItem;

pub use http::HttpScreeningClient;
pub use wire::{
    JobSnapshot, JobTicket, PageDescriptor, PageOutcome, RecordFilters, ReportFilters, ReportMeta,
    SubmitOptions,
};

/// Failure of one backend call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    #[error("backend returned HTTP {status}{}", describe_body(.body))]
    Http { status: u16, body: Value },
    #[error("network failure: {0}")]
    Network(String),
    #[error("invalid request url: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Short form of an error body: the backend's `detail`/`error`/`message`
/// field when present, the raw text otherwise.
fn describe_body(body: &Value) -> String {
    let text = match body {
        Value::Null => return String::new(),
        Value::String(text) => text.trim().to_string(),
        Value::Object(map) => ["detail", "error", "message"]
            .iter()
            .find_map(|key| map.get(*key))
            .map(|value| match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            })
            .unwrap_or_else(|| body.to_string()),
        other => other.to_string(),
    };
    if text.is_empty() {
        String::new()
    } else {
        format!(": {text}")
    }
}

/// Operations the dashboard needs from the backend.
#[async_trait]
pub trait ScreeningApi: Send + Sync {
    async fn submit_job(
        &self,
        items: &[QueryItem],
        options: &SubmitOptions,
    ) -> Result<JobTicket, ApiError>;

    async fn job_status(&self, job_id: &str) -> Result<JobSnapshot, ApiError>;

    async fn list_records(&self, filters: &RecordFilters) -> Result<Vec<Record>, ApiError>;

    /// Returns the updated record when the backend echoes one back.
    async fn update_record_status(
        &self,
        id: &RecordId,
        status: RecordStatus,
        error_message: Option<&str>,
    ) -> Result<Option<Record>, ApiError>;

    async fn list_reports(&self, filters: &ReportFilters) -> Result<Vec<Report>, ApiError>;

    async fn report_by_job(&self, job_id: &str) -> Result<Option<Report>, ApiError>;

    async fn list_record_reports(&self, id: &RecordId) -> Result<Vec<Report>, ApiError>;

    async fn list_pages(&self) -> Result<Vec<PageDescriptor>, ApiError>;

    async fn download_report(&self, id: &ReportId) -> Result<Vec<u8>, ApiError>;

    /// Download link for a report. No network call.
    fn download_report_url(&self, id: &ReportId) -> String;
}

/// Page list from the backend, or the local catalog when it cannot be fetched.
pub async fn pages_or_catalog<A: ScreeningApi + ?Sized>(api: &A) -> Vec<PageDescriptor> {
    match api.list_pages().await {
        Ok(pages) if !pages.is_empty() => pages,
        Ok(_) => PageDescriptor::catalog(),
        Err(err) => {
            tracing::warn!(error = %err, "page list unavailable; using local catalog");
            PageDescriptor::catalog()
        }
    }
}
