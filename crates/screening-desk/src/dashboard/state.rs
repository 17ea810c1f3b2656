use std::collections::BTreeMap;

use serde::Serialize;

use crate::client::{PageOutcome, RecordFilters, ReportMeta, SubmitOptions};
use crate::criteria::{Criterion, SelectionState};
use crate::domain::{Record, RecordId, RecordStatus, Report};
use crate::items::{ItemBuildError, ItemBuilder, QueryItem, UnsatisfiedPolicy};
use crate::jobs::{JobFailure, JobPhase};

/// Number of records per status in the current list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub total: usize,
    pub pending: usize,
    pub processing: usize,
    pub processed: usize,
    pub error: usize,
}

impl StatusCounts {
    pub fn tally(records: &[Record]) -> Self {
        records.iter().fold(
            Self {
                total: records.len(),
                ..Self::default()
            },
            |mut counts, record| {
                match record.status {
                    RecordStatus::Pending => counts.pending += 1,
                    RecordStatus::Processing => counts.processing += 1,
                    RecordStatus::Processed => counts.processed += 1,
                    RecordStatus::Error => counts.error += 1,
                }
                counts
            },
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Select,
    Processing,
    Summary,
    Error,
}

/// Modal detail view for one record.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailView {
    Select {
        record: Record,
        selection: SelectionState,
        available: Vec<Criterion>,
        error: Option<String>,
    },
    Processing {
        record: Record,
        phase: JobPhase,
    },
    Summary {
        record: Record,
        results: BTreeMap<String, PageOutcome>,
        report: Option<Report>,
    },
    Error {
        record: Record,
        message: String,
    },
}

impl DetailView {
    pub fn kind(&self) -> ViewKind {
        match self {
            DetailView::Select { .. } => ViewKind::Select,
            DetailView::Processing { .. } => ViewKind::Processing,
            DetailView::Summary { .. } => ViewKind::Summary,
            DetailView::Error { .. } => ViewKind::Error,
        }
    }

    pub fn record(&self) -> &Record {
        match self {
            DetailView::Select { record, .. }
            | DetailView::Processing { record, .. }
            | DetailView::Summary { record, .. }
            | DetailView::Error { record, .. } => record,
        }
    }

    fn select(record: Record) -> Self {
        let available = Criterion::ALL
            .into_iter()
            .filter(|criterion| criterion.is_available_for(&record))
            .collect();
        DetailView::Select {
            record,
            selection: SelectionState::new(),
            available,
            error: None,
        }
    }
}

/// Everything needed to start a job for the confirmed selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub record: RecordId,
    pub items: Vec<QueryItem>,
    pub options: SubmitOptions,
}

/// Record list, counters, filters and the open detail view.
#[derive(Debug, Clone)]
pub struct DashboardState {
    records: Vec<Record>,
    filters: RecordFilters,
    counts: StatusCounts,
    view: Option<DetailView>,
    banner: Option<String>,
    builder: ItemBuilder,
    headless: bool,
    generate_report: bool,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new(UnsatisfiedPolicy::Skip)
    }
}

impl DashboardState {
    pub fn new(policy: UnsatisfiedPolicy) -> Self {
        Self {
            records: Vec::new(),
            filters: RecordFilters::default(),
            counts: StatusCounts::default(),
            view: None,
            banner: None,
            builder: ItemBuilder::new(policy),
            headless: false,
            generate_report: true,
        }
    }

    pub fn with_submit_flags(mut self, headless: bool, generate_report: bool) -> Self {
        self.headless = headless;
        self.generate_report = generate_report;
        self
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn counts(&self) -> StatusCounts {
        self.counts
    }

    pub fn filters(&self) -> &RecordFilters {
        &self.filters
    }

    pub fn set_filters(&mut self, filters: RecordFilters) {
        self.filters = filters;
    }

    pub fn view(&self) -> Option<&DetailView> {
        self.view.as_ref()
    }

    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub fn record(&self, id: &RecordId) -> Option<&Record> {
        self.records.iter().find(|record| &record.id == id)
    }

    /// Replace the list with a fresh backend page and recount.
    pub fn apply_records(&mut self, records: Vec<Record>) {
        self.counts = StatusCounts::tally(&records);
        self.records = records;
    }

    /// Open the detail view matching the record's status.
    pub fn open_details(&mut self, id: &RecordId) -> Option<ViewKind> {
        let record = self.record(id)?.clone();
        let view = match record.status {
            RecordStatus::Pending => DetailView::select(record),
            RecordStatus::Processing => DetailView::Processing {
                record,
                phase: JobPhase::Idle,
            },
            RecordStatus::Processed => DetailView::Summary {
                record,
                results: BTreeMap::new(),
                report: None,
            },
            RecordStatus::Error => {
                let message = record
                    .error_message
                    .clone()
                    .filter(|message| !message.trim().is_empty())
                    .unwrap_or_else(|| "Unknown error".to_string());
                DetailView::Error { record, message }
            }
        };
        let kind = view.kind();
        self.view = Some(view);
        Some(kind)
    }

    /// Error view back to a fresh selection for the same record.
    pub fn retry(&mut self) -> bool {
        match self.view.take() {
            Some(DetailView::Error { record, .. }) => {
                self.view = Some(DetailView::select(record));
                true
            }
            other => {
                self.view = other;
                false
            }
        }
    }

    pub fn selection_mut(&mut self) -> Option<&mut SelectionState> {
        match self.view.as_mut() {
            Some(DetailView::Select { selection, .. }) => Some(selection),
            _ => None,
        }
    }

    /// Build items for the open selection. On success the view switches to
    /// processing and the record is shown as processing; on failure the
    /// message is kept inline in the selection view.
    pub fn confirm(&mut self) -> Result<Submission, ItemBuildError> {
        let Some(DetailView::Select {
            record,
            selection,
            error,
            ..
        }) = self.view.as_mut()
        else {
            return Err(ItemBuildError::NothingToSubmit);
        };

        let items = match self
            .builder
            .build(record, selection.flags(), selection.values())
        {
            Ok(items) => items,
            Err(err) => {
                *error = Some(err.to_string());
                return Err(err);
            }
        };

        let record = record.clone();
        let submission = Submission {
            record: record.id.clone(),
            items,
            options: SubmitOptions {
                headless: self.headless,
                generate_report: self.generate_report,
                report_meta: Some(ReportMeta::from_record(&record)),
            },
        };
        self.set_local_status(&record.id, RecordStatus::Processing, None);
        self.view = Some(DetailView::Processing {
            record,
            phase: JobPhase::Submitting,
        });
        Ok(submission)
    }

    /// Fold a job phase into the view. Returns the new view kind when the
    /// phase moved the view to a different kind.
    pub fn on_job_phase(&mut self, id: &RecordId, phase: JobPhase) -> Option<ViewKind> {
        match &phase {
            JobPhase::Idle => return None,
            JobPhase::Done { .. } | JobPhase::Finishing { .. } => {
                self.set_local_status(id, RecordStatus::Processed, None)
            }
            JobPhase::Failed { failure, .. } => {
                self.set_local_status(id, RecordStatus::Error, Some(failure.to_string()))
            }
            _ => {}
        }

        let record = match self.view.as_ref() {
            Some(DetailView::Processing { record, .. }) if &record.id == id => record.clone(),
            _ => {
                if let JobPhase::Failed {
                    failure: JobFailure::Submission(err),
                    ..
                } = &phase
                {
                    self.banner = Some(format!("Submission failed: {err}"));
                }
                return None;
            }
        };

        let next = match phase {
            JobPhase::Done {
                results, report, ..
            } => DetailView::Summary {
                record,
                results,
                report,
            },
            JobPhase::Failed { failure, .. } => {
                if let JobFailure::Submission(err) = &failure {
                    self.banner = Some(format!("Submission failed: {err}"));
                }
                DetailView::Error {
                    record,
                    message: failure.to_string(),
                }
            }
            phase => DetailView::Processing { record, phase },
        };
        let kind = next.kind();
        self.view = Some(next);
        (kind != ViewKind::Processing).then_some(kind)
    }

    /// Attach the most recent report to an open summary.
    pub fn attach_report(&mut self, id: &RecordId, latest: Option<Report>) {
        if let Some(DetailView::Summary { record, report, .. }) = self.view.as_mut() {
            if &record.id == id && report.is_none() {
                *report = latest;
            }
        }
    }

    pub fn close_modal(&mut self) {
        self.view = None;
    }

    pub fn dismiss_banner(&mut self) {
        self.banner = None;
    }

    fn set_local_status(&mut self, id: &RecordId, status: RecordStatus, message: Option<String>) {
        if let Some(record) = self.records.iter_mut().find(|record| &record.id == id) {
            record.status = status;
            record.error_message = message;
        }
        self.counts = StatusCounts::tally(&self.records);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ApiError;

    fn record(id: &str, status: RecordStatus) -> Record {
        Record {
            id: RecordId::from(id),
            first_name: "Jose Adolfo".to_string(),
            last_name: "Macias Villamar".to_string(),
            national_id: "0912345678".to_string(),
            tax_id: "0912345678001".to_string(),
            status,
            ..Record::default()
        }
    }

    fn state_with(records: Vec<Record>) -> DashboardState {
        let mut state = DashboardState::default();
        state.apply_records(records);
        state
    }

    #[test]
    fn counts_follow_record_statuses() {
        let state = state_with(vec![
            record("1", RecordStatus::Pending),
            record("2", RecordStatus::Pending),
            record("3", RecordStatus::Error),
            record("4", RecordStatus::Processed),
        ]);
        assert_eq!(
            state.counts(),
            StatusCounts {
                total: 4,
                pending: 2,
                processing: 0,
                processed: 1,
                error: 1
            }
        );
    }

    #[test]
    fn details_open_by_status() {
        let mut state = state_with(vec![
            record("1", RecordStatus::Pending),
            record("2", RecordStatus::Processing),
            record("3", RecordStatus::Processed),
            Record {
                error_message: Some("timeout".to_string()),
                ..record("4", RecordStatus::Error)
            },
        ]);
        assert_eq!(state.open_details(&"1".into()), Some(ViewKind::Select));
        assert_eq!(state.open_details(&"2".into()), Some(ViewKind::Processing));
        assert_eq!(state.open_details(&"3".into()), Some(ViewKind::Summary));
        assert_eq!(state.open_details(&"4".into()), Some(ViewKind::Error));
        assert!(matches!(
            state.view(),
            Some(DetailView::Error { message, .. }) if message == "timeout"
        ));
        assert_eq!(state.open_details(&"missing".into()), None);
    }

    #[test]
    fn retry_returns_to_selection() {
        let mut state = state_with(vec![record("4", RecordStatus::Error)]);
        state.open_details(&"4".into());
        assert!(state.retry());
        assert_eq!(state.view().map(DetailView::kind), Some(ViewKind::Select));
        assert!(!state.retry());
    }

    #[test]
    fn confirm_skips_unsatisfiable_criteria() {
        let mut state = state_with(vec![Record {
            national_id: String::new(),
            ..record("1", RecordStatus::Pending)
        }]);
        state.open_details(&"1".into());
        let selection = state.selection_mut().expect("selection open");
        selection.set_selected(Criterion::TaxRegistry, true);
        selection.set_selected(Criterion::CorporateRegistry, true);

        let submission = state.confirm().expect("tax registry survives");
        assert_eq!(submission.items.len(), 1);
        assert_eq!(submission.items[0].criterion, Criterion::TaxRegistry);
        assert_eq!(
            submission.options.report_meta.as_ref().map(|m| m.tipo_alerta.as_str()),
            Some("Alerta")
        );
        assert_eq!(state.counts().processing, 1);
        assert!(matches!(
            state.view(),
            Some(DetailView::Processing { phase: JobPhase::Submitting, .. })
        ));
    }

    #[test]
    fn confirm_drops_malformed_typed_values() {
        let mut state = state_with(vec![record("1", RecordStatus::Pending)]);
        state.open_details(&"1".into());
        let selection = state.selection_mut().expect("selection open");
        selection.set_selected(Criterion::TaxRegistry, true);
        selection.set_selected(Criterion::DebtRegistry, true);
        selection.set_value("deudas", "12345");

        let submission = state.confirm().expect("tax registry survives");
        let criteria: Vec<Criterion> = submission.items.iter().map(|i| i.criterion).collect();
        assert_eq!(criteria, vec![Criterion::TaxRegistry]);
    }

    #[test]
    fn confirm_with_nothing_buildable_stays_on_selection() {
        let mut state = state_with(vec![Record {
            tax_id: String::new(),
            ..record("1", RecordStatus::Pending)
        }]);
        state.open_details(&"1".into());
        state
            .selection_mut()
            .expect("selection open")
            .set_selected(Criterion::TaxRegistry, true);

        assert_eq!(state.confirm(), Err(ItemBuildError::NothingToSubmit));
        assert!(matches!(
            state.view(),
            Some(DetailView::Select { error: Some(message), .. })
                if message == "no page selected or all selections unsatisfiable"
        ));
        assert_eq!(state.counts().pending, 1);
    }

    #[test]
    fn job_phases_drive_the_view() {
        let mut state = state_with(vec![record("1", RecordStatus::Pending)]);
        let id = RecordId::from("1");
        state.open_details(&id);
        state
            .selection_mut()
            .expect("selection open")
            .set_selected(Criterion::TaxRegistry, true);
        state.confirm().expect("submission");

        assert_eq!(state.on_job_phase(&id, JobPhase::Idle), None);
        assert!(matches!(
            state.view(),
            Some(DetailView::Processing { phase: JobPhase::Submitting, .. })
        ));

        let polling = JobPhase::Polling {
            job_id: "job-1".to_string(),
            attempts: 1,
        };
        assert_eq!(state.on_job_phase(&id, polling), None);

        let done = JobPhase::Done {
            job_id: "job-1".to_string(),
            results: BTreeMap::new(),
            report: None,
        };
        assert_eq!(state.on_job_phase(&id, done.clone()), Some(ViewKind::Summary));
        assert_eq!(state.on_job_phase(&id, done), None);
        assert_eq!(state.counts().processed, 1);
    }

    #[test]
    fn submission_failure_sets_banner_and_error_view() {
        let mut state = state_with(vec![record("1", RecordStatus::Pending)]);
        let id = RecordId::from("1");
        state.open_details(&id);
        state
            .selection_mut()
            .expect("selection open")
            .set_selected(Criterion::TaxRegistry, true);
        state.confirm().expect("submission");

        let failed = JobPhase::Failed {
            job_id: None,
            failure: JobFailure::Submission(ApiError::Network("offline".to_string())),
        };
        assert_eq!(state.on_job_phase(&id, failed), Some(ViewKind::Error));
        assert_eq!(
            state.banner(),
            Some("Submission failed: network failure: offline")
        );
        assert_eq!(state.counts().error, 1);

        state.dismiss_banner();
        assert_eq!(state.banner(), None);
        assert!(state.retry());
    }
}
