use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{JobAction, JobEvent, JobMachine, JobPhase, PollSchedule};
use crate::client::{ScreeningApi, SubmitOptions};
use crate::domain::RecordId;
use crate::items::QueryItem;

/// Spawns job lifecycles against a backend.
pub struct JobRunner<A: ?Sized> {
    api: Arc<A>,
    schedule: PollSchedule,
    report_grace: Duration,
}

impl<A: ?Sized> Clone for JobRunner<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            schedule: self.schedule,
            report_grace: self.report_grace,
        }
    }
}

impl<A> JobRunner<A>
where
    A: ScreeningApi + ?Sized + 'static,
{
    pub fn new(api: Arc<A>, schedule: PollSchedule, report_grace: Duration) -> Self {
        Self {
            api,
            schedule,
            report_grace,
        }
    }

    pub fn schedule(&self) -> &PollSchedule {
        &self.schedule
    }

    /// Submit `items` and poll until a terminal phase, on a background task.
    /// Dropping the returned handle stops the task.
    pub fn spawn(
        &self,
        record: Option<RecordId>,
        items: Vec<QueryItem>,
        options: SubmitOptions,
    ) -> JobHandle {
        let (phase_tx, phase_rx) = watch::channel(JobPhase::Idle);
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let machine = JobMachine::new(record, self.schedule, self.report_grace);
        let api = Arc::clone(&self.api);

        let task = tokio::spawn(drive(
            api,
            machine,
            JobEvent::Confirmed { items, options },
            phase_tx,
            cancel_rx,
        ));

        JobHandle {
            phase: phase_rx,
            cancel: cancel_tx,
            task,
        }
    }
}

/// Handle to a running job. Cancels the job when dropped.
#[derive(Debug)]
pub struct JobHandle {
    phase: watch::Receiver<JobPhase>,
    cancel: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl JobHandle {
    pub fn phase(&self) -> JobPhase {
        self.phase.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<JobPhase> {
        self.phase.clone()
    }

    /// Stop polling. A request already in flight completes but its result is
    /// discarded.
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the job to reach a terminal phase, or for its task to stop.
    pub async fn wait(&mut self) -> JobPhase {
        loop {
            {
                let phase = self.phase.borrow_and_update();
                if phase.is_terminal() {
                    return phase.clone();
                }
            }
            if self.phase.changed().await.is_err() {
                return self.phase.borrow().clone();
            }
        }
    }
}

impl Drop for JobHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn drive<A>(
    api: Arc<A>,
    mut machine: JobMachine,
    first: JobEvent,
    phase_tx: watch::Sender<JobPhase>,
    mut cancel: watch::Receiver<bool>,
) where
    A: ScreeningApi + ?Sized,
{
    let mut pending = VecDeque::new();
    let mut event = Some(first);

    loop {
        if let Some(next) = event.take() {
            for action in machine.handle(next) {
                match action {
                    JobAction::MarkRecord {
                        id,
                        status,
                        message,
                    } => {
                        if let Err(err) = api
                            .update_record_status(&id, status, message.as_deref())
                            .await
                        {
                            warn!(record_id = %id, %status, error = %err, "record status update failed");
                        }
                    }
                    other => pending.push_back(other),
                }
            }
            phase_tx.send_replace(machine.phase().clone());
        }

        let Some(action) = pending.pop_front() else {
            return;
        };
        if is_cancelled(&cancel) {
            debug!(phase = machine.phase().label(), "job polling cancelled");
            return;
        }

        let outcome = match action {
            JobAction::SubmitJob { items, options } => {
                JobEvent::Submitted(api.submit_job(&items, &options).await)
            }
            JobAction::SchedulePoll { job_id, delay } => {
                if sleep_or_cancel(delay, &mut cancel).await {
                    debug!(%job_id, "job polling cancelled");
                    return;
                }
                JobEvent::Polled(api.job_status(&job_id).await)
            }
            JobAction::FetchReport { job_id, delay } => {
                if sleep_or_cancel(delay, &mut cancel).await {
                    debug!(%job_id, "report fetch cancelled");
                    return;
                }
                JobEvent::ReportFetched(api.report_by_job(&job_id).await)
            }
            JobAction::MarkRecord { .. } => continue,
        };

        if is_cancelled(&cancel) {
            debug!(phase = machine.phase().label(), "discarding result after cancel");
            return;
        }
        event = Some(outcome);
    }
}

fn is_cancelled(cancel: &watch::Receiver<bool>) -> bool {
    *cancel.borrow()
}

/// Sleep for `delay`; returns true when cancelled first.
async fn sleep_or_cancel(delay: Duration, cancel: &mut watch::Receiver<bool>) -> bool {
    if is_cancelled(cancel) {
        return true;
    }
    tokio::select! {
        _ = tokio::time::sleep(delay) => is_cancelled(cancel),
        changed = cancel.changed() => changed.is_err() || is_cancelled(cancel),
    }
}
