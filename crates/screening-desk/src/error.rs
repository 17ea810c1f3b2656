use crate::client::ApiError;
use crate::config::ConfigError;
use crate::items::ItemBuildError;
use crate::jobs::JobFailure;
use crate::telemetry::TelemetryError;
use std::fmt;

/// Top-level failure surfaced by binaries built on this crate.
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Api(ApiError),
    Validation(ItemBuildError),
    Job(JobFailure),
    Usage(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Api(err) => write!(f, "backend error: {}", err),
            AppError::Validation(err) => write!(f, "validation error: {}", err),
            AppError::Job(err) => write!(f, "job failed: {}", err),
            AppError::Usage(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Api(err) => Some(err),
            AppError::Validation(err) => Some(err),
            AppError::Job(err) => Some(err),
            AppError::Usage(_) => None,
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<ApiError> for AppError {
    fn from(value: ApiError) -> Self {
        Self::Api(value)
    }
}

impl From<ItemBuildError> for AppError {
    fn from(value: ItemBuildError) -> Self {
        Self::Validation(value)
    }
}

impl From<JobFailure> for AppError {
    fn from(value: JobFailure) -> Self {
        Self::Job(value)
    }
}
