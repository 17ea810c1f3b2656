use std::sync::Arc;
use std::time::Duration;

use super::common::*;
use crate::client::SubmitOptions;
use crate::jobs::{JobRunner, JobSlot};

#[tokio::test(start_paused = true)]
async fn starting_a_job_cancels_the_previous_one() {
    let first_api = Arc::new(ScriptedApi::default());
    let second_api = Arc::new(ScriptedApi::default());
    let first = JobRunner::new(Arc::clone(&first_api), schedule(), Duration::ZERO);
    let second = JobRunner::new(Arc::clone(&second_api), schedule(), Duration::ZERO);

    let mut slot = JobSlot::new();
    slot.start(first.spawn(None, items(), SubmitOptions::default()));
    tokio::time::sleep(Duration::from_secs(4)).await;
    assert!(slot.is_busy());
    let first_calls = first_api.status_calls();

    slot.start(second.spawn(None, items(), SubmitOptions::default()));
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert_eq!(first_api.status_calls(), first_calls);
    assert!(second_api.status_calls() > 0);
}

#[tokio::test(start_paused = true)]
async fn clear_releases_and_cancels() {
    let api = Arc::new(ScriptedApi::default());
    let runner = JobRunner::new(Arc::clone(&api), schedule(), Duration::ZERO);

    let mut slot = JobSlot::new();
    slot.start(runner.spawn(None, items(), SubmitOptions::default()));
    tokio::time::sleep(Duration::from_secs(4)).await;
    slot.clear();
    let seen = api.status_calls();

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert!(!slot.is_busy());
    assert!(slot.active().is_none());
    assert_eq!(api.status_calls(), seen);
}
