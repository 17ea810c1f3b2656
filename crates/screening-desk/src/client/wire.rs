use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::criteria::Criterion;
use crate::domain::{Record, RecordStatus};
use crate::items::QueryItem;

/// Flags sent with a job submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmitOptions {
    pub headless: bool,
    pub generate_report: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_meta: Option<ReportMeta>,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            headless: false,
            generate_report: true,
            report_meta: None,
        }
    }
}

/// Metadata printed on the generated report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportMeta {
    pub tipo_alerta: String,
    pub monto_usd: Option<f64>,
    pub fecha_alerta: Option<NaiveDate>,
}

impl ReportMeta {
    pub fn from_record(record: &Record) -> Self {
        Self {
            tipo_alerta: record
                .alert_type
                .clone()
                .unwrap_or_else(|| "Alerta".to_string()),
            monto_usd: record.amount,
            fecha_alerta: record.event_date,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmitBody<'a> {
    pub(crate) items: &'a [QueryItem],
    pub(crate) mode: &'static str,
    #[serde(flatten)]
    pub(crate) options: &'a SubmitOptions,
}

#[derive(Debug, Serialize)]
pub(crate) struct StatusUpdateBody<'a> {
    pub(crate) estado: RecordStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) mensaje_error: Option<&'a str>,
}

/// Backend acknowledgement of a submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct JobTicket {
    #[serde(default)]
    pub job_id: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Per-page outcome inside a finished job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageOutcome {
    #[serde(default)]
    pub screenshot_path: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Decoded job status. Internal code never looks at the raw payload.
#[derive(Debug, Clone, PartialEq)]
pub enum JobSnapshot {
    Queued,
    Running,
    Done {
        results: BTreeMap<String, PageOutcome>,
    },
    Failed {
        message: String,
    },
}

impl JobSnapshot {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobSnapshot::Done { .. } | JobSnapshot::Failed { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            JobSnapshot::Queued => "queued",
            JobSnapshot::Running => "running",
            JobSnapshot::Done { .. } => "done",
            JobSnapshot::Failed { .. } => "error",
        }
    }

    /// Unknown or missing states are treated as still queued.
    pub(crate) fn from_payload(payload: Value) -> Self {
        let status = payload
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match status.as_str() {
            "running" => JobSnapshot::Running,
            "done" => {
                let results = match payload.get("data") {
                    Some(Value::Object(map)) => map
                        .iter()
                        .map(|(key, value)| {
                            let outcome =
                                serde_json::from_value(value.clone()).unwrap_or_default();
                            (key.clone(), outcome)
                        })
                        .collect(),
                    _ => BTreeMap::new(),
                };
                JobSnapshot::Done { results }
            }
            "error" => {
                let message = payload
                    .get("error")
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|message| !message.is_empty())
                    .unwrap_or("Job failed")
                    .to_string();
                JobSnapshot::Failed { message }
            }
            _ => JobSnapshot::Queued,
        }
    }
}

/// Page descriptor as published by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageDescriptor {
    pub codigo: String,
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub descripcion: String,
    #[serde(default)]
    pub url: Option<String>,
}

impl PageDescriptor {
    /// Local catalog used when the backend list cannot be fetched.
    pub fn catalog() -> Vec<PageDescriptor> {
        Criterion::ALL
            .into_iter()
            .map(|criterion| PageDescriptor {
                codigo: criterion.key().to_string(),
                nombre: criterion.label().to_string(),
                descripcion: criterion.description().to_string(),
                url: None,
            })
            .collect()
    }
}

/// Record list filters. `None` leaves a filter off.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilters {
    pub status: Option<RecordStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub query: Option<String>,
}

impl RecordFilters {
    pub(crate) fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(status) = self.status {
            pairs.push(("estado", status.label().to_string()));
        }
        if let Some(from) = self.from {
            pairs.push(("fecha_desde", from.format("%Y-%m-%d").to_string()));
        }
        if let Some(to) = self.to {
            pairs.push(("fecha_hasta", to.format("%Y-%m-%d").to_string()));
        }
        if let Some(query) = self.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            pairs.push(("q", query.to_string()));
        }
        pairs
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportFilters {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl ReportFilters {
    pub(crate) fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(from) = self.from {
            pairs.push(("fecha_desde", from.format("%Y-%m-%d").to_string()));
        }
        if let Some(to) = self.to {
            pairs.push(("fecha_hasta", to.format("%Y-%m-%d").to_string()));
        }
        pairs
    }
}

/// Decode a JSON array element by element, dropping entries that do not fit.
/// Anything that is not an array decodes as an empty list.
pub(crate) fn decode_list<T: DeserializeOwned>(operation: &'static str, payload: Value) -> Vec<T> {
    let Value::Array(entries) = payload else {
        if !payload.is_null() {
            warn!(operation, "expected a JSON array; treating as empty");
        }
        return Vec::new();
    };

    entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value(entry) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(operation, error = %err, "dropping malformed entry");
                None
            }
        })
        .collect()
}

pub(crate) fn decode_optional<T: DeserializeOwned>(payload: Value) -> Option<T> {
    if payload.is_null() {
        return None;
    }
    serde_json::from_value(payload).ok()
}
