//! Dashboard view model: record list with counters and filters, the per-record
//! detail views, and the timers that keep them current.

mod refresher;
mod session;
mod state;


use std::sync::{Mutex, MutexGuard};

pub use refresher::RecordRefresher;
pub use session::{DashboardNotice, DashboardSession};
pub use state::{DashboardState, DetailView, StatusCounts, Submission, ViewKind};

pub(crate) fn lock(state: &Mutex<DashboardState>) -> MutexGuard<'_, DashboardState> {
    state.lock().expect("dashboard state mutex poisoned")
}
