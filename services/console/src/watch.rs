use crate::infra::{parse_status, Context};
use crate::records::render_counts;
use clap::Args;
use screening_desk::client::RecordFilters;
use screening_desk::dashboard::{DashboardSession, DashboardState};
use screening_desk::domain::RecordStatus;
use screening_desk::error::AppError;
use screening_desk::items::UnsatisfiedPolicy;
use std::time::Duration;
use tracing::info;

#[derive(Args, Debug, Default)]
pub(crate) struct DashboardArgs {
    /// Only count records in this status
    #[arg(long, value_parser = parse_status)]
    pub(crate) status: Option<RecordStatus>,
    /// Free-text search on name, CI or RUC
    #[arg(long)]
    pub(crate) query: Option<String>,
}

pub(crate) async fn run(context: &Context, args: DashboardArgs) -> Result<(), AppError> {
    let mut state = DashboardState::new(UnsatisfiedPolicy::Skip);
    state.set_filters(RecordFilters {
        status: args.status,
        query: args.query,
        ..RecordFilters::default()
    });

    let mut session = DashboardSession::start(context.api.clone(), state, &context.config.polling);
    let period = context
        .config
        .polling
        .record_refresh
        .max(Duration::from_millis(100));
    let mut ticker = tokio::time::interval(period);
    info!(base_url = %context.config.backend.base_url, "dashboard mounted");
    println!("Watching records; press Ctrl-C to stop.");

    let mut last = None;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let counts = session.state().counts();
                if last != Some(counts) {
                    render_counts(&counts);
                    last = Some(counts);
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    session.teardown();
    println!("Dashboard stopped.");
    Ok(())
}
