use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use super::DashboardState;
use crate::client::ScreeningApi;

/// Fixed-period reload of the record list. Stops when dropped.
#[derive(Debug)]
pub struct RecordRefresher {
    cancel: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl RecordRefresher {
    /// Load immediately, then every `period` until stopped.
    pub fn spawn<A>(api: Arc<A>, state: Arc<Mutex<DashboardState>>, period: Duration) -> Self
    where
        A: ScreeningApi + ?Sized + 'static,
    {
        let (cancel, mut stopped) = watch::channel(false);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period.max(Duration::from_millis(1)));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = stopped.changed() => {
                        debug!("record refresh stopped");
                        return;
                    }
                }
                if *stopped.borrow() {
                    return;
                }
                refresh_once(api.as_ref(), &state).await;
            }
        });
        Self { cancel, task }
    }

    pub fn stop(&self) {
        self.cancel.send_replace(true);
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for RecordRefresher {
    fn drop(&mut self) {
        self.stop();
    }
}

/// One reload with the state's current filters. Failures keep the old list.
pub(crate) async fn refresh_once<A>(api: &A, state: &Mutex<DashboardState>)
where
    A: ScreeningApi + ?Sized,
{
    let filters = super::lock(state).filters().clone();
    match api.list_records(&filters).await {
        Ok(records) => {
            debug!(count = records.len(), "records refreshed");
            super::lock(state).apply_records(records);
        }
        Err(err) => warn!(error = %err, "record refresh failed"),
    }
}
