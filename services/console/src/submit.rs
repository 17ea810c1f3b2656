use crate::infra::{parse_criterion, parse_key_value, Context};
use clap::{Args, ValueEnum};
use screening_desk::client::{JobSnapshot, ReportMeta, ScreeningApi, SubmitOptions};
use screening_desk::criteria::{field_rule, Criterion, SelectionState};
use screening_desk::domain::{Record, RecordId};
use screening_desk::error::AppError;
use screening_desk::items::{ItemBuilder, UnsatisfiedPolicy};
use screening_desk::jobs::{JobPhase, JobRunner};
use tracing::info;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum PolicyArg {
    /// Reject the submission on the first page the record cannot satisfy
    #[default]
    Abort,
    /// Drop unsatisfiable pages and submit the rest
    Skip,
}

impl From<PolicyArg> for UnsatisfiedPolicy {
    fn from(value: PolicyArg) -> Self {
        match value {
            PolicyArg::Abort => UnsatisfiedPolicy::Abort,
            PolicyArg::Skip => UnsatisfiedPolicy::Skip,
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct SubmitArgs {
    /// Record id to screen
    #[arg(long)]
    pub(crate) record: String,
    /// Page keys to query, comma separated (e.g. ruc,deudas,interpol)
    #[arg(long, value_delimiter = ',', value_parser = parse_criterion)]
    pub(crate) criteria: Vec<Criterion>,
    /// Select every page the record has data for
    #[arg(long, conflicts_with = "criteria")]
    pub(crate) all: bool,
    /// Typed input overriding record data, as KEY=VALUE (repeatable)
    #[arg(long = "value", value_parser = parse_key_value)]
    pub(crate) values: Vec<(String, String)>,
    /// Ask the backend to run its browser headless
    #[arg(long)]
    pub(crate) headless: bool,
    /// Skip report generation
    #[arg(long)]
    pub(crate) no_report: bool,
    /// What to do with pages the record cannot satisfy
    #[arg(long, value_enum, default_value_t = PolicyArg::Abort)]
    pub(crate) policy: PolicyArg,
}

pub(crate) async fn run(context: &Context, args: SubmitArgs) -> Result<(), AppError> {
    let record = find_record(context, &args.record).await?;
    let selection = build_selection(&record, &args)?;

    let items = ItemBuilder::new(args.policy.into()).build(
        &record,
        selection.flags(),
        selection.values(),
    )?;
    println!(
        "Submitting {} item(s) for record {} ({})",
        items.len(),
        record.id,
        record.display_name()
    );
    for item in &items {
        println!("  - {} = {}", item.criterion, item.value);
    }

    let options = SubmitOptions {
        headless: args.headless,
        generate_report: !args.no_report,
        report_meta: Some(ReportMeta::from_record(&record)),
    };
    let runner = JobRunner::new(
        context.api.clone(),
        context.config.polling.schedule,
        context.config.polling.report_grace,
    );
    let mut handle = runner.spawn(Some(record.id.clone()), items, options);
    let mut phases = handle.subscribe();

    let outcome = loop {
        let phase = phases.borrow_and_update().clone();
        print_phase(&phase);
        if phase.is_terminal() {
            break phase;
        }
        tokio::select! {
            changed = phases.changed() => {
                if changed.is_err() {
                    break handle.wait().await;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                handle.cancel();
                return Err(AppError::Usage("interrupted; polling stopped".to_string()));
            }
        }
    };

    match outcome {
        JobPhase::Done { report, .. } => {
            if let Some(report) = report {
                println!(
                    "Report {}: {}",
                    report.id,
                    context.api.download_report_url(&report.id)
                );
            }
            Ok(())
        }
        JobPhase::Failed { failure, .. } => Err(AppError::Job(failure)),
        other => Err(AppError::Usage(format!(
            "job stopped in phase {}",
            other.label()
        ))),
    }
}

pub(crate) async fn run_status(context: &Context, job_id: &str) -> Result<(), AppError> {
    let snapshot = context.api.job_status(job_id).await?;
    println!("Job {job_id}: {}", snapshot.label());
    match snapshot {
        JobSnapshot::Done { results } => {
            for (page, outcome) in results {
                println!(
                    "  - {page}: {}",
                    outcome.screenshot_path.as_deref().unwrap_or("no screenshot")
                );
            }
        }
        JobSnapshot::Failed { message } => println!("  error: {message}"),
        JobSnapshot::Queued | JobSnapshot::Running => {}
    }
    Ok(())
}

async fn find_record(context: &Context, id: &str) -> Result<Record, AppError> {
    let id = RecordId::from(id);
    let records = context.api.list_records(&Default::default()).await?;
    records
        .into_iter()
        .find(|record| record.id == id)
        .ok_or_else(|| AppError::Usage(format!("record {id} not found")))
}

/// Tick the requested pages and store typed values, rejecting malformed input
/// the same way the form does.
fn build_selection(record: &Record, args: &SubmitArgs) -> Result<SelectionState, AppError> {
    let mut selection = SelectionState::new();
    let criteria: Vec<Criterion> = if args.all {
        Criterion::ALL
            .into_iter()
            .filter(|criterion| criterion.is_available_for(record))
            .collect()
    } else {
        args.criteria.clone()
    };
    if criteria.is_empty() {
        return Err(AppError::Usage(
            "select at least one page with --criteria or --all".to_string(),
        ));
    }
    for criterion in criteria {
        selection.set_selected(criterion, true);
    }

    for (key, raw) in &args.values {
        selection.set_value(key, raw);
        let stored = selection.value(key).unwrap_or_default();
        if let Some(message) = field_rule(key).and_then(|rule| {
            if stored.is_empty() && !rule.required {
                None
            } else {
                rule.check(stored)
            }
        }) {
            return Err(AppError::Usage(format!("{key}: {message}")));
        }
    }
    info!(
        record_id = %record.id,
        selected = selection.selected_count(),
        "selection ready"
    );
    Ok(selection)
}

fn print_phase(phase: &JobPhase) {
    match phase {
        JobPhase::Idle => {}
        JobPhase::Submitting => println!("submitting..."),
        JobPhase::Polling { job_id, attempts } => {
            println!("job {job_id}: waiting (check {attempts})")
        }
        JobPhase::Finishing { job_id, results } => {
            println!("job {job_id}: done, {} page(s); fetching report", results.len())
        }
        JobPhase::Done {
            job_id, results, ..
        } => {
            println!("job {job_id}: finished");
            for (page, outcome) in results {
                println!(
                    "  - {page}: {}",
                    outcome.screenshot_path.as_deref().unwrap_or("no screenshot")
                );
            }
        }
        JobPhase::Failed { failure, .. } => println!("job failed: {failure}"),
    }
}
