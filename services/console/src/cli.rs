use crate::check::{self, CheckArgs};
use crate::infra::Context;
use crate::records::{self, ListArgs};
use crate::reports::{self, ReportListArgs};
use crate::submit::{self, SubmitArgs};
use crate::watch::{self, DashboardArgs};
use clap::{Parser, Subcommand};
use screening_desk::config::{AppConfig, BackendConfig};
use screening_desk::error::AppError;
use screening_desk::telemetry;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Screening Desk",
    about = "Select registry checks for records, submit them and follow the resulting jobs",
    version
)]
struct Cli {
    /// Override SCREENING_API_BASE for this invocation
    #[arg(long, global = true)]
    api_base: Option<String>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Browse records (default: `records list`)
    Records {
        #[command(subcommand)]
        command: RecordsCommand,
    },
    /// Build query items for a record, submit them and poll until the job ends
    Submit(SubmitArgs),
    /// Inspect a submitted job
    Job {
        #[command(subcommand)]
        command: JobCommand,
    },
    /// List and download generated reports
    Reports {
        #[command(subcommand)]
        command: ReportsCommand,
    },
    /// List the pages the backend can query
    Pages,
    /// Sanitize and validate form values without contacting the backend
    Check(CheckArgs),
    /// Keep the record list refreshed and print counters until Ctrl-C
    Dashboard(DashboardArgs),
}

#[derive(Subcommand, Debug)]
enum RecordsCommand {
    /// List records with optional filters
    List(ListArgs),
    /// List the reports generated for one record
    Reports {
        /// Record id
        id: String,
    },
}

#[derive(Subcommand, Debug)]
enum JobCommand {
    /// Fetch the current status of a job once
    Status {
        /// Job id returned on submission
        job_id: String,
    },
}

#[derive(Subcommand, Debug)]
enum ReportsCommand {
    /// List reports, optionally bounded by creation date
    List(ReportListArgs),
    /// Print the download link for a report
    Url {
        /// Report id
        id: String,
    },
    /// Download a report to a local file
    Download {
        /// Report id
        id: String,
        /// Destination path
        #[arg(long)]
        out: PathBuf,
    },
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Records {
        command: RecordsCommand::List(ListArgs::default()),
    });

    if let Command::Check(args) = command {
        return check::run(args);
    }

    let mut config = AppConfig::load()?;
    if let Some(base) = cli.api_base.as_deref() {
        config.backend = BackendConfig::parse(base)?;
    }
    telemetry::init(&config.telemetry)?;
    let context = Context::new(config);

    match command {
        Command::Records {
            command: RecordsCommand::List(args),
        } => records::run_list(&context, args).await,
        Command::Records {
            command: RecordsCommand::Reports { id },
        } => records::run_reports(&context, &id).await,
        Command::Submit(args) => submit::run(&context, args).await,
        Command::Job {
            command: JobCommand::Status { job_id },
        } => submit::run_status(&context, &job_id).await,
        Command::Reports {
            command: ReportsCommand::List(args),
        } => reports::run_list(&context, args).await,
        Command::Reports {
            command: ReportsCommand::Url { id },
        } => {
            reports::run_url(&context, &id);
            Ok(())
        }
        Command::Reports {
            command: ReportsCommand::Download { id, out },
        } => reports::run_download(&context, &id, &out).await,
        Command::Pages => reports::run_pages(&context).await,
        Command::Dashboard(args) => watch::run(&context, args).await,
        Command::Check(_) => Ok(()),
    }
}
