use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::client::{
    ApiError, JobSnapshot, JobTicket, PageDescriptor, PageOutcome, RecordFilters, ReportFilters,
    ScreeningApi, SubmitOptions,
};
use crate::criteria::Criterion;
use crate::domain::{Record, RecordId, RecordStatus, Report, ReportId};
use crate::items::QueryItem;
use crate::jobs::PollSchedule;

/// One call observed by [`ScriptedApi`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Submit { items: usize },
    Status(String),
    ListRecords(RecordFilters),
    UpdateRecord {
        id: RecordId,
        status: RecordStatus,
        message: Option<String>,
    },
    ReportByJob(String),
    Other(&'static str),
}

/// Backend fake replaying scripted job statuses. Once the script runs out,
/// every status check reports `running`.
#[derive(Default)]
pub(crate) struct ScriptedApi {
    ticket: Mutex<Option<Result<JobTicket, ApiError>>>,
    statuses: Mutex<VecDeque<Result<JobSnapshot, ApiError>>>,
    report: Mutex<Option<Result<Option<Report>, ApiError>>>,
    records: Mutex<Vec<Record>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedApi {
    pub(crate) fn with_statuses(statuses: Vec<JobSnapshot>) -> Self {
        let api = Self::default();
        *api.statuses.lock().expect("status mutex poisoned") =
            statuses.into_iter().map(Ok).collect();
        api
    }

    pub(crate) fn push_status(&self, status: Result<JobSnapshot, ApiError>) {
        self.statuses
            .lock()
            .expect("status mutex poisoned")
            .push_back(status);
    }

    pub(crate) fn fail_submission(&self, err: ApiError) {
        *self.ticket.lock().expect("ticket mutex poisoned") = Some(Err(err));
    }

    pub(crate) fn set_report(&self, report: Result<Option<Report>, ApiError>) {
        *self.report.lock().expect("report mutex poisoned") = Some(report);
    }

    pub(crate) fn set_records(&self, records: Vec<Record>) {
        *self.records.lock().expect("records mutex poisoned") = records;
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("call mutex poisoned").clone()
    }

    pub(crate) fn status_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::Status(_)))
            .count()
    }

    pub(crate) fn list_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::ListRecords(_)))
            .count()
    }

    pub(crate) fn record_updates(&self) -> Vec<(RecordStatus, Option<String>)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::UpdateRecord {
                    status, message, ..
                } => Some((status, message)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().expect("call mutex poisoned").push(call);
    }
}

#[async_trait]
impl ScreeningApi for ScriptedApi {
    async fn submit_job(
        &self,
        items: &[QueryItem],
        _options: &SubmitOptions,
    ) -> Result<JobTicket, ApiError> {
        self.record(Call::Submit { items: items.len() });
        self.ticket
            .lock()
            .expect("ticket mutex poisoned")
            .clone()
            .unwrap_or_else(|| {
                Ok(JobTicket {
                    job_id: "job-1".to_string(),
                    status: Some("queued".to_string()),
                })
            })
    }

    async fn job_status(&self, job_id: &str) -> Result<JobSnapshot, ApiError> {
        self.record(Call::Status(job_id.to_string()));
        self.statuses
            .lock()
            .expect("status mutex poisoned")
            .pop_front()
            .unwrap_or(Ok(JobSnapshot::Running))
    }

    async fn list_records(&self, filters: &RecordFilters) -> Result<Vec<Record>, ApiError> {
        self.record(Call::ListRecords(filters.clone()));
        Ok(self.records.lock().expect("records mutex poisoned").clone())
    }

    async fn update_record_status(
        &self,
        id: &RecordId,
        status: RecordStatus,
        error_message: Option<&str>,
    ) -> Result<Option<Record>, ApiError> {
        self.record(Call::UpdateRecord {
            id: id.clone(),
            status,
            message: error_message.map(str::to_string),
        });
        let mut records = self.records.lock().expect("records mutex poisoned");
        let updated = records.iter_mut().find(|record| &record.id == id).map(|record| {
            record.status = status;
            record.error_message = error_message.map(str::to_string);
            record.clone()
        });
        Ok(updated)
    }

    async fn list_reports(&self, _filters: &ReportFilters) -> Result<Vec<Report>, ApiError> {
        self.record(Call::Other("list_reports"));
        Ok(Vec::new())
    }

    async fn report_by_job(&self, job_id: &str) -> Result<Option<Report>, ApiError> {
        self.record(Call::ReportByJob(job_id.to_string()));
        self.report
            .lock()
            .expect("report mutex poisoned")
            .clone()
            .unwrap_or(Ok(None))
    }

    async fn list_record_reports(&self, _id: &RecordId) -> Result<Vec<Report>, ApiError> {
        self.record(Call::Other("list_record_reports"));
        Ok(Vec::new())
    }

    async fn list_pages(&self) -> Result<Vec<PageDescriptor>, ApiError> {
        self.record(Call::Other("list_pages"));
        Ok(Vec::new())
    }

    async fn download_report(&self, _id: &ReportId) -> Result<Vec<u8>, ApiError> {
        self.record(Call::Other("download_report"));
        Ok(Vec::new())
    }

    fn download_report_url(&self, id: &ReportId) -> String {
        format!("http://backend.test/reports/{id}/download")
    }
}

pub(crate) fn schedule() -> PollSchedule {
    PollSchedule::fixed(Duration::from_secs(3))
}

pub(crate) fn items() -> Vec<QueryItem> {
    vec![QueryItem::new(Criterion::TaxRegistry, "1790012345001")]
}

pub(crate) fn done_with_screenshot() -> JobSnapshot {
    let mut results = BTreeMap::new();
    results.insert(
        "ruc".to_string(),
        PageOutcome {
            screenshot_path: Some("/x".to_string()),
            ..PageOutcome::default()
        },
    );
    JobSnapshot::Done { results }
}

pub(crate) fn report(job_id: &str) -> Report {
    Report {
        id: ReportId::from("r-1"),
        job_id: Some(job_id.to_string()),
        ..Report::default()
    }
}

pub(crate) fn pending_record(id: &str) -> Record {
    Record {
        id: RecordId::from(id),
        first_name: "Jose Adolfo".to_string(),
        last_name: "Macias Villamar".to_string(),
        national_id: "0912345678".to_string(),
        tax_id: "0912345678001".to_string(),
        ..Record::default()
    }
}
