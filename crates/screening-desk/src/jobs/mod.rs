//! Job submission and status polling.
//!
//! [`JobMachine`] is the pure lifecycle; it only describes side effects as
//! [`JobAction`]s. [`JobRunner`] executes those actions against a
//! [`ScreeningApi`](crate::client::ScreeningApi) on a tokio task and
//! publishes every phase change.

mod machine;
mod runner;
mod schedule;
mod slot;

#[cfg(test)]
pub(crate) mod tests;

use crate::client::ApiError;

pub use machine::{JobAction, JobEvent, JobMachine, JobPhase};
pub use runner::{JobHandle, JobRunner};
pub use schedule::PollSchedule;
pub use slot::JobSlot;

/// Why a job did not reach `done`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum JobFailure {
    #[error("job submission failed: {0}")]
    Submission(ApiError),
    #[error("job status check failed: {0}")]
    Polling(ApiError),
    /// Terminal error reported by the backend; the message is shown verbatim.
    #[error("{0}")]
    Backend(String),
    #[error("job still pending after {attempts} status checks")]
    TimedOut { attempts: u32 },
    #[error("backend accepted the job without a job id")]
    MissingJobId,
}
