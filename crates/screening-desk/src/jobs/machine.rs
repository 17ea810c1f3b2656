use std::collections::BTreeMap;
use std::time::Duration;

use tracing::{debug, info};

use super::{JobFailure, PollSchedule};
use crate::client::{ApiError, JobSnapshot, JobTicket, PageOutcome, SubmitOptions};
use crate::domain::{RecordId, RecordStatus, Report};
use crate::items::QueryItem;

/// Where a submitted job stands, as seen by the operator.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum JobPhase {
    #[default]
    Idle,
    Submitting,
    Polling {
        job_id: String,
        attempts: u32,
    },
    /// Backend finished; the report is being fetched.
    Finishing {
        job_id: String,
        results: BTreeMap<String, PageOutcome>,
    },
    Done {
        job_id: String,
        results: BTreeMap<String, PageOutcome>,
        report: Option<Report>,
    },
    Failed {
        job_id: Option<String>,
        failure: JobFailure,
    },
}

impl JobPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobPhase::Done { .. } | JobPhase::Failed { .. })
    }

    pub fn job_id(&self) -> Option<&str> {
        match self {
            JobPhase::Idle | JobPhase::Submitting => None,
            JobPhase::Polling { job_id, .. }
            | JobPhase::Finishing { job_id, .. }
            | JobPhase::Done { job_id, .. } => Some(job_id),
            JobPhase::Failed { job_id, .. } => job_id.as_deref(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            JobPhase::Idle => "idle",
            JobPhase::Submitting => "submitting",
            JobPhase::Polling { .. } => "polling",
            JobPhase::Finishing { .. } => "finishing",
            JobPhase::Done { .. } => "done",
            JobPhase::Failed { .. } => "failed",
        }
    }
}

/// Inputs to the job state machine.
#[derive(Debug, Clone)]
pub enum JobEvent {
    Confirmed {
        items: Vec<QueryItem>,
        options: SubmitOptions,
    },
    Submitted(Result<JobTicket, ApiError>),
    Polled(Result<JobSnapshot, ApiError>),
    ReportFetched(Result<Option<Report>, ApiError>),
}

/// Side effects requested by the state machine. The runner executes them.
#[derive(Debug, Clone, PartialEq)]
pub enum JobAction {
    SubmitJob {
        items: Vec<QueryItem>,
        options: SubmitOptions,
    },
    SchedulePoll {
        job_id: String,
        delay: Duration,
    },
    FetchReport {
        job_id: String,
        delay: Duration,
    },
    MarkRecord {
        id: RecordId,
        status: RecordStatus,
        message: Option<String>,
    },
}

/// Pure job lifecycle: `Idle → Submitting → Polling → Finishing → Done`,
/// with `Failed` reachable from every non-terminal phase.
#[derive(Debug, Clone)]
pub struct JobMachine {
    record: Option<RecordId>,
    schedule: PollSchedule,
    report_grace: Duration,
    fetch_report: bool,
    phase: JobPhase,
}

impl JobMachine {
    pub fn new(record: Option<RecordId>, schedule: PollSchedule, report_grace: Duration) -> Self {
        Self {
            record,
            schedule,
            report_grace,
            fetch_report: true,
            phase: JobPhase::Idle,
        }
    }

    pub fn phase(&self) -> &JobPhase {
        &self.phase
    }

    pub fn record(&self) -> Option<&RecordId> {
        self.record.as_ref()
    }

    /// Apply one event. Events that do not fit the current phase are ignored.
    pub fn handle(&mut self, event: JobEvent) -> Vec<JobAction> {
        let phase = std::mem::take(&mut self.phase);
        let (next, actions) = match (phase, event) {
            (JobPhase::Idle, JobEvent::Confirmed { items, options }) => {
                self.fetch_report = options.generate_report;
                let mut actions = self.mark(RecordStatus::Processing, None);
                actions.push(JobAction::SubmitJob { items, options });
                (JobPhase::Submitting, actions)
            }
            (JobPhase::Submitting, JobEvent::Submitted(Ok(ticket))) => {
                let job_id = ticket.job_id.trim().to_string();
                if job_id.is_empty() {
                    self.fail(None, JobFailure::MissingJobId)
                } else {
                    info!(%job_id, "job accepted");
                    let delay = self.schedule.delay_for(0);
                    (
                        JobPhase::Polling {
                            job_id: job_id.clone(),
                            attempts: 0,
                        },
                        vec![JobAction::SchedulePoll { job_id, delay }],
                    )
                }
            }
            (JobPhase::Submitting, JobEvent::Submitted(Err(err))) => {
                self.fail(None, JobFailure::Submission(err))
            }
            (JobPhase::Polling { job_id, attempts }, JobEvent::Polled(outcome)) => {
                self.on_poll(job_id, attempts + 1, outcome)
            }
            (JobPhase::Finishing { job_id, results }, JobEvent::ReportFetched(outcome)) => {
                let report = match outcome {
                    Ok(report) => report,
                    Err(err) => {
                        info!(%job_id, error = %err, "report unavailable; finishing without it");
                        None
                    }
                };
                (
                    JobPhase::Done {
                        job_id,
                        results,
                        report,
                    },
                    Vec::new(),
                )
            }
            (phase, event) => {
                debug!(phase = phase.label(), ?event, "event ignored");
                (phase, Vec::new())
            }
        };
        self.phase = next;
        actions
    }

    fn on_poll(
        &mut self,
        job_id: String,
        attempts: u32,
        outcome: Result<JobSnapshot, ApiError>,
    ) -> (JobPhase, Vec<JobAction>) {
        let snapshot = match outcome {
            Ok(snapshot) => snapshot,
            Err(err) => return self.fail(Some(job_id), JobFailure::Polling(err)),
        };
        debug!(%job_id, attempts, status = snapshot.label(), "job polled");

        match snapshot {
            JobSnapshot::Queued | JobSnapshot::Running => {
                if self.schedule.exhausted(attempts) {
                    return self.fail(Some(job_id), JobFailure::TimedOut { attempts });
                }
                let delay = self.schedule.delay_for(attempts);
                (
                    JobPhase::Polling {
                        job_id: job_id.clone(),
                        attempts,
                    },
                    vec![JobAction::SchedulePoll { job_id, delay }],
                )
            }
            JobSnapshot::Done { results } => {
                info!(%job_id, pages = results.len(), "job finished");
                let mut actions = self.mark(RecordStatus::Processed, None);
                if self.fetch_report {
                    actions.push(JobAction::FetchReport {
                        job_id: job_id.clone(),
                        delay: self.report_grace,
                    });
                    (JobPhase::Finishing { job_id, results }, actions)
                } else {
                    (
                        JobPhase::Done {
                            job_id,
                            results,
                            report: None,
                        },
                        actions,
                    )
                }
            }
            JobSnapshot::Failed { message } => {
                self.fail(Some(job_id), JobFailure::Backend(message))
            }
        }
    }

    fn fail(&self, job_id: Option<String>, failure: JobFailure) -> (JobPhase, Vec<JobAction>) {
        info!(job_id = job_id.as_deref().unwrap_or("-"), error = %failure, "job failed");
        let actions = self.mark(RecordStatus::Error, Some(failure.to_string()));
        (JobPhase::Failed { job_id, failure }, actions)
    }

    fn mark(&self, status: RecordStatus, message: Option<String>) -> Vec<JobAction> {
        self.record
            .iter()
            .map(|id| JobAction::MarkRecord {
                id: id.clone(),
                status,
                message: message.clone(),
            })
            .collect()
    }
}
