use std::env;
use std::fmt;
use std::time::Duration;

use url::Url;

use crate::jobs::PollSchedule;

/// Distinguishes runtime behavior for different stages of the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000/api";

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub backend: BackendConfig,
    pub polling: PollingConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let raw_base = env::var("SCREENING_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
        let backend = BackendConfig::parse(&raw_base)?;

        let defaults = PollSchedule::default();
        let poll_interval = millis_var("JOB_POLL_INTERVAL_MS", defaults.interval)?;
        let max_interval = millis_var("JOB_POLL_MAX_INTERVAL_MS", defaults.max_interval)?;
        let backoff = match env::var("JOB_POLL_BACKOFF") {
            Ok(raw) => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite() && *value >= 1.0)
                .ok_or(ConfigError::InvalidNumber {
                    var: "JOB_POLL_BACKOFF",
                })?,
            Err(_) => defaults.backoff,
        };
        let max_attempts = match env::var("JOB_POLL_MAX_ATTEMPTS") {
            Ok(raw) => match raw.trim().parse::<u32>() {
                Ok(0) => None,
                Ok(value) => Some(value),
                Err(_) => {
                    return Err(ConfigError::InvalidNumber {
                        var: "JOB_POLL_MAX_ATTEMPTS",
                    })
                }
            },
            Err(_) => defaults.max_attempts,
        };

        let report_grace = millis_var("REPORT_GRACE_MS", Duration::from_millis(1_000))?;
        let record_refresh = millis_var("RECORD_REFRESH_INTERVAL_MS", Duration::from_secs(5))?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            backend,
            polling: PollingConfig {
                schedule: PollSchedule {
                    interval: poll_interval,
                    backoff,
                    max_interval,
                    max_attempts,
                },
                report_grace,
                record_refresh,
            },
            telemetry: TelemetryConfig { log_level },
        })
    }
}

fn millis_var(var: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    match env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|_| ConfigError::InvalidNumber { var }),
        Err(_) => Ok(default),
    }
}

/// Location of the screening backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: Url,
}

impl BackendConfig {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let trimmed = raw.trim().trim_end_matches('/');
        let base_url = Url::parse(trimmed).map_err(|source| ConfigError::InvalidBaseUrl {
            value: raw.to_string(),
            source,
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidBaseUrl {
                value: raw.to_string(),
                source: url::ParseError::RelativeUrlWithCannotBeABaseBase,
            });
        }
        Ok(Self { base_url })
    }
}

/// Timer settings for job polling and the record list refresh.
#[derive(Debug, Clone)]
pub struct PollingConfig {
    pub schedule: PollSchedule,
    pub report_grace: Duration,
    pub record_refresh: Duration,
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidBaseUrl {
        value: String,
        source: url::ParseError,
    },
    InvalidNumber {
        var: &'static str,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidBaseUrl { value, .. } => {
                write!(f, "SCREENING_API_BASE '{value}' is not an absolute URL")
            }
            ConfigError::InvalidNumber { var } => {
                write!(f, "{var} must be a valid non-negative number")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidBaseUrl { source, .. } => Some(source),
            ConfigError::InvalidNumber { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for var in [
            "APP_ENV",
            "SCREENING_API_BASE",
            "APP_LOG_LEVEL",
            "JOB_POLL_INTERVAL_MS",
            "JOB_POLL_BACKOFF",
            "JOB_POLL_MAX_INTERVAL_MS",
            "JOB_POLL_MAX_ATTEMPTS",
            "REPORT_GRACE_MS",
            "RECORD_REFRESH_INTERVAL_MS",
        ] {
            env::remove_var(var);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.backend.base_url.as_str(), "http://127.0.0.1:8000/api");
        assert_eq!(config.polling.schedule.interval, Duration::from_millis(3_000));
        assert_eq!(config.polling.record_refresh, Duration::from_secs(5));
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    fn zero_attempts_disables_the_cap() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("JOB_POLL_MAX_ATTEMPTS", "0");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.polling.schedule.max_attempts, None);
        reset_env();
    }

    #[test]
    fn rejects_relative_base_url() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("SCREENING_API_BASE", "/api");
        match AppConfig::load() {
            Err(ConfigError::InvalidBaseUrl { value, .. }) => assert_eq!(value, "/api"),
            other => panic!("expected invalid base url, got {other:?}"),
        }
        reset_env();
    }

    #[test]
    fn rejects_backoff_below_one() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("JOB_POLL_BACKOFF", "0.5");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidNumber {
                var: "JOB_POLL_BACKOFF"
            })
        ));
        reset_env();
    }
}
