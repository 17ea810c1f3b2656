use chrono::NaiveDate;
use clap::ValueEnum;
use screening_desk::client::HttpScreeningClient;
use screening_desk::config::AppConfig;
use screening_desk::criteria::Criterion;
use screening_desk::domain::RecordStatus;
use std::sync::Arc;

/// Loaded configuration plus the backend client shared by every command.
pub(crate) struct Context {
    pub(crate) config: AppConfig,
    pub(crate) api: Arc<HttpScreeningClient>,
}

impl Context {
    pub(crate) fn new(config: AppConfig) -> Self {
        let api = Arc::new(HttpScreeningClient::new(&config.backend));
        Self { config, api }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Csv,
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn parse_status(raw: &str) -> Result<RecordStatus, String> {
    RecordStatus::parse(raw).ok_or_else(|| {
        let known: Vec<&str> = RecordStatus::ALL.iter().map(|s| s.label()).collect();
        format!("unknown status '{raw}' (expected one of {})", known.join(", "))
    })
}

pub(crate) fn parse_criterion(raw: &str) -> Result<Criterion, String> {
    Criterion::from_key(raw.trim()).ok_or_else(|| {
        let known: Vec<&str> = Criterion::ALL.iter().map(|c| c.key()).collect();
        format!("unknown page '{raw}' (expected one of {})", known.join(", "))
    })
}

/// `key=value` pairs for typed form inputs.
pub(crate) fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

pub(crate) fn or_dash(value: &str) -> &str {
    if value.trim().is_empty() {
        "-"
    } else {
        value
    }
}
