use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use super::refresher::{refresh_once, RecordRefresher};
use super::{lock, DashboardState, ViewKind};
use crate::client::{ApiError, RecordFilters, ScreeningApi};
use crate::config::PollingConfig;
use crate::domain::RecordId;
use crate::items::ItemBuildError;
use crate::jobs::{JobRunner, JobSlot};

/// Notification emitted when a job moves the open view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardNotice {
    ViewChanged { record: RecordId, view: ViewKind },
}

/// A mounted dashboard: the record refresher, the job slot and the shared
/// view state. Tearing it down (or dropping it) stops every timer it owns.
pub struct DashboardSession<A: ScreeningApi + ?Sized + 'static> {
    api: Arc<A>,
    runner: JobRunner<A>,
    state: Arc<Mutex<DashboardState>>,
    refresher: Option<RecordRefresher>,
    jobs: JobSlot,
    forwarder: Option<JoinHandle<()>>,
    notices_tx: mpsc::UnboundedSender<DashboardNotice>,
    notices_rx: Option<mpsc::UnboundedReceiver<DashboardNotice>>,
}

impl<A: ScreeningApi + ?Sized + 'static> DashboardSession<A> {
    /// Mount the dashboard and start the record refresh timer.
    pub fn start(api: Arc<A>, state: DashboardState, polling: &PollingConfig) -> Self {
        let state = Arc::new(Mutex::new(state));
        let runner = JobRunner::new(Arc::clone(&api), polling.schedule, polling.report_grace);
        let refresher =
            RecordRefresher::spawn(Arc::clone(&api), Arc::clone(&state), polling.record_refresh);
        let (notices_tx, notices_rx) = mpsc::unbounded_channel();

        Self {
            api,
            runner,
            state,
            refresher: Some(refresher),
            jobs: JobSlot::new(),
            forwarder: None,
            notices_tx,
            notices_rx: Some(notices_rx),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> DashboardState {
        lock(&self.state).clone()
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&mut DashboardState) -> R) -> R {
        f(&mut lock(&self.state))
    }

    /// Receiver for view notices. Only the first caller gets it.
    pub fn take_notices(&mut self) -> Option<mpsc::UnboundedReceiver<DashboardNotice>> {
        self.notices_rx.take()
    }

    pub async fn refresh_now(&self) {
        refresh_once(self.api.as_ref(), &self.state).await;
    }

    pub async fn set_filters(&self, filters: RecordFilters) {
        lock(&self.state).set_filters(filters);
        self.refresh_now().await;
    }

    /// Open a record's details; a processed record also gets its latest report.
    pub async fn open_details(&self, id: &RecordId) -> Result<Option<ViewKind>, ApiError> {
        let kind = lock(&self.state).open_details(id);
        if kind == Some(ViewKind::Summary) {
            let reports = self.api.list_record_reports(id).await?;
            let latest = reports.into_iter().max_by(|a, b| a.created_at.cmp(&b.created_at));
            lock(&self.state).attach_report(id, latest);
        }
        Ok(kind)
    }

    /// Confirm the open selection and start its job, replacing any job still
    /// running in this dashboard.
    pub fn confirm(&mut self) -> Result<(), ItemBuildError> {
        let submission = lock(&self.state).confirm()?;
        info!(
            record_id = %submission.record,
            items = submission.items.len(),
            "submitting selection"
        );

        if let Some(previous) = self.forwarder.take() {
            previous.abort();
        }
        let record = submission.record.clone();
        let handle = self.jobs.start(self.runner.spawn(
            Some(submission.record),
            submission.items,
            submission.options,
        ));
        let mut phases = handle.subscribe();

        let api = Arc::clone(&self.api);
        let state = Arc::clone(&self.state);
        let notices = self.notices_tx.clone();
        self.forwarder = Some(tokio::spawn(async move {
            loop {
                let phase = phases.borrow_and_update().clone();
                let terminal = phase.is_terminal();
                let moved = lock(&state).on_job_phase(&record, phase);
                if let Some(view) = moved {
                    let _ = notices.send(DashboardNotice::ViewChanged {
                        record: record.clone(),
                        view,
                    });
                }
                if terminal {
                    break;
                }
                if phases.changed().await.is_err() {
                    return;
                }
            }
            refresh_once(api.as_ref(), &state).await;
        }));
        Ok(())
    }

    pub fn is_job_running(&self) -> bool {
        self.jobs.is_busy()
    }

    /// Stop the refresher and any job poll. Idempotent.
    pub fn teardown(&mut self) {
        if let Some(refresher) = self.refresher.take() {
            refresher.stop();
        }
        self.jobs.clear();
        if let Some(forwarder) = self.forwarder.take() {
            forwarder.abort();
        }
    }
}

impl<A: ScreeningApi + ?Sized + 'static> Drop for DashboardSession<A> {
    fn drop(&mut self) {
        self.teardown();
    }
}
