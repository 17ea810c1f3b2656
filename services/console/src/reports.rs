use crate::infra::{parse_date, Context};
use crate::records::render_reports;
use chrono::NaiveDate;
use clap::Args;
use screening_desk::client::{pages_or_catalog, ReportFilters, ScreeningApi};
use screening_desk::domain::ReportId;
use screening_desk::error::AppError;
use std::path::Path;
use tracing::info;

#[derive(Args, Debug, Default)]
pub(crate) struct ReportListArgs {
    /// Created on or after (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub(crate) from: Option<NaiveDate>,
    /// Created on or before (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub(crate) to: Option<NaiveDate>,
}

pub(crate) async fn run_list(context: &Context, args: ReportListArgs) -> Result<(), AppError> {
    let filters = ReportFilters {
        from: args.from,
        to: args.to,
    };
    let reports = context.api.list_reports(&filters).await?;
    if reports.is_empty() {
        println!("No reports in range.");
        return Ok(());
    }
    println!("{} report(s)", reports.len());
    render_reports(context, &reports);
    Ok(())
}

pub(crate) fn run_url(context: &Context, id: &str) {
    println!("{}", context.api.download_report_url(&ReportId::from(id)));
}

pub(crate) async fn run_download(context: &Context, id: &str, out: &Path) -> Result<(), AppError> {
    let bytes = context.api.download_report(&ReportId::from(id)).await?;
    tokio::fs::write(out, &bytes).await?;
    info!(report_id = id, bytes = bytes.len(), path = %out.display(), "report saved");
    println!("Saved report {id} to {} ({} bytes)", out.display(), bytes.len());
    Ok(())
}

pub(crate) async fn run_pages(context: &Context) -> Result<(), AppError> {
    let pages = pages_or_catalog(context.api.as_ref()).await;
    println!("{:<18} {:<36} DESCRIPTION", "CODE", "NAME");
    for page in pages {
        println!("{:<18} {:<36} {}", page.codigo, page.nombre, page.descripcion);
    }
    Ok(())
}
