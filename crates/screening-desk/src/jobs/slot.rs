use super::{JobHandle, JobPhase};

/// At most one active job per UI surface. Starting a job cancels the one
/// already held.
#[derive(Debug, Default)]
pub struct JobSlot {
    active: Option<JobHandle>,
}

impl JobSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, handle: JobHandle) -> &mut JobHandle {
        if let Some(previous) = self.active.take() {
            previous.cancel();
        }
        self.active.insert(handle)
    }

    pub fn active(&self) -> Option<&JobHandle> {
        self.active.as_ref()
    }

    pub fn active_mut(&mut self) -> Option<&mut JobHandle> {
        self.active.as_mut()
    }

    pub fn phase(&self) -> Option<JobPhase> {
        self.active.as_ref().map(JobHandle::phase)
    }

    /// True while the held job has not reached a terminal phase.
    pub fn is_busy(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|handle| !handle.is_cancelled() && !handle.phase().is_terminal())
    }

    /// Cancel and release the held job.
    pub fn clear(&mut self) {
        if let Some(handle) = self.active.take() {
            handle.cancel();
        }
    }
}
