use crate::infra::{or_dash, parse_date, parse_status, Context, OutputFormat};
use chrono::NaiveDate;
use clap::Args;
use screening_desk::client::{RecordFilters, ScreeningApi};
use screening_desk::dashboard::StatusCounts;
use screening_desk::domain::{Record, RecordId, RecordStatus, Report};
use screening_desk::error::AppError;
use std::io;

#[derive(Args, Debug, Default)]
pub(crate) struct ListArgs {
    /// Only records in this status (Pendiente, Procesando, Procesado, Error)
    #[arg(long, value_parser = parse_status)]
    pub(crate) status: Option<RecordStatus>,
    /// Created on or after (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub(crate) from: Option<NaiveDate>,
    /// Created on or before (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub(crate) to: Option<NaiveDate>,
    /// Free-text search on name, CI or RUC
    #[arg(long)]
    pub(crate) query: Option<String>,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub(crate) format: OutputFormat,
}

impl ListArgs {
    pub(crate) fn filters(&self) -> RecordFilters {
        RecordFilters {
            status: self.status,
            from: self.from,
            to: self.to,
            query: self.query.clone(),
        }
    }
}

pub(crate) async fn run_list(context: &Context, args: ListArgs) -> Result<(), AppError> {
    let records = context.api.list_records(&args.filters()).await?;
    match args.format {
        OutputFormat::Table => {
            render_records(&records);
            render_counts(&StatusCounts::tally(&records));
        }
        OutputFormat::Csv => write_records_csv(io::stdout(), &records)?,
    }
    Ok(())
}

pub(crate) async fn run_reports(context: &Context, id: &str) -> Result<(), AppError> {
    let reports = context
        .api
        .list_record_reports(&RecordId::from(id))
        .await?;
    if reports.is_empty() {
        println!("No reports for record {id}.");
        return Ok(());
    }
    render_reports(context, &reports);
    Ok(())
}

pub(crate) fn render_records(records: &[Record]) {
    if records.is_empty() {
        println!("No records match the filters.");
        return;
    }
    println!(
        "{:<8} {:<11} {:<32} {:<11} {:<14} {:<12}",
        "ID", "STATUS", "NAME", "CI", "RUC", "ALERT"
    );
    for record in records {
        println!(
            "{:<8} {:<11} {:<32} {:<11} {:<14} {:<12}",
            record.id,
            record.status,
            truncate(&record.display_name(), 32),
            or_dash(&record.national_id),
            or_dash(&record.tax_id),
            record.alert_type.as_deref().unwrap_or("-"),
        );
        if let Some(process) = &record.active_process {
            println!(
                "         pages {}/{} ok, {} failed ({}%)",
                process.total_paginas_exitosas,
                process.total_paginas_solicitadas,
                process.total_paginas_fallidas,
                process.success_pct()
            );
        }
        if record.status == RecordStatus::Error {
            if let Some(message) = &record.error_message {
                println!("         error: {message}");
            }
        }
    }
}

pub(crate) fn render_counts(counts: &StatusCounts) {
    println!(
        "Total {} | pending {} | processing {} | processed {} | error {}",
        counts.total, counts.pending, counts.processing, counts.processed, counts.error
    );
}

pub(crate) fn render_reports(context: &Context, reports: &[Report]) {
    for report in reports {
        println!(
            "- report {} | job {} | {} | amount {} | alert date {} | created {}",
            report.id,
            report.job_id.as_deref().unwrap_or("-"),
            report.alert_type.as_deref().unwrap_or("Alerta"),
            report
                .amount
                .map(|amount| format!("{amount:.2} USD"))
                .unwrap_or_else(|| "-".to_string()),
            report
                .event_date
                .map(|date| date.to_string())
                .unwrap_or_else(|| "-".to_string()),
            report
                .created_at
                .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string()),
        );
        println!("  {}", context.api.download_report_url(&report.id));
    }
}

/// One CSV row per record with the wire status label.
pub(crate) fn write_records_csv<W: io::Write>(writer: W, records: &[Record]) -> io::Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record([
        "id",
        "estado",
        "nombre",
        "apellido",
        "ci",
        "ruc",
        "tipo",
        "monto",
        "fecha",
        "mensaje_error",
    ])?;
    for record in records {
        let amount = record.amount.map(|a| a.to_string()).unwrap_or_default();
        let date = record.event_date.map(|d| d.to_string()).unwrap_or_default();
        csv.write_record([
            record.id.0.as_str(),
            record.status.label(),
            record.first_name.as_str(),
            record.last_name.as_str(),
            record.national_id.as_str(),
            record.tax_id.as_str(),
            record.alert_type.as_deref().unwrap_or_default(),
            amount.as_str(),
            date.as_str(),
            record.error_message.as_deref().unwrap_or_default(),
        ])?;
    }
    csv.flush()
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        value.to_string()
    } else {
        let mut cut: String = value.chars().take(width.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}
