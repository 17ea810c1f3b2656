use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

macro_rules! backend_id {
    ($name:ident) => {
        /// Backend-assigned identifier. Accepts numeric or string JSON ids.
        #[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                string_or_number(deserializer).map($name)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                $name(value.to_string())
            }
        }
    };
}

backend_id!(RecordId);
backend_id!(ReportId);

/// Processing state of a record as persisted by the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordStatus {
    #[default]
    #[serde(rename = "Pendiente")]
    Pending,
    #[serde(rename = "Procesando")]
    Processing,
    #[serde(rename = "Procesado")]
    Processed,
    #[serde(rename = "Error")]
    Error,
}

impl RecordStatus {
    pub const ALL: [RecordStatus; 4] = [
        RecordStatus::Pending,
        RecordStatus::Processing,
        RecordStatus::Processed,
        RecordStatus::Error,
    ];

    /// Wire label, also used in query strings.
    pub fn label(self) -> &'static str {
        match self {
            RecordStatus::Pending => "Pendiente",
            RecordStatus::Processing => "Procesando",
            RecordStatus::Processed => "Procesado",
            RecordStatus::Error => "Error",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL.into_iter().find(|status| {
            status.label().eq_ignore_ascii_case(raw)
                || format!("{status:?}").eq_ignore_ascii_case(raw)
        })
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Person or entity under investigation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    #[serde(rename = "nombre", default, deserialize_with = "null_as_empty")]
    pub first_name: String,
    #[serde(rename = "apellido", default, deserialize_with = "null_as_empty")]
    pub last_name: String,
    #[serde(rename = "ci", default, deserialize_with = "null_as_empty")]
    pub national_id: String,
    #[serde(rename = "ruc", default, deserialize_with = "null_as_empty")]
    pub tax_id: String,
    #[serde(rename = "estado", default)]
    pub status: RecordStatus,
    #[serde(rename = "tipo", default, deserialize_with = "empty_string_as_none")]
    pub alert_type: Option<String>,
    #[serde(rename = "monto", default)]
    pub amount: Option<f64>,
    #[serde(rename = "fecha", default, deserialize_with = "lenient_date")]
    pub event_date: Option<NaiveDate>,
    #[serde(rename = "fecha_creacion", default, deserialize_with = "lenient_datetime")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(
        rename = "fecha_actualizacion",
        default,
        deserialize_with = "lenient_datetime"
    )]
    pub updated_at: Option<NaiveDateTime>,
    #[serde(rename = "mensaje_error", default, deserialize_with = "empty_string_as_none")]
    pub error_message: Option<String>,
    #[serde(rename = "proceso_activo", default)]
    pub active_process: Option<ActiveProcess>,
}

impl Record {
    /// "SURNAME GIVEN" ordering used by the name-based registries.
    pub fn surname_first_name(&self) -> String {
        [self.last_name.trim(), self.first_name.trim()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn display_name(&self) -> String {
        [self.first_name.trim(), self.last_name.trim()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Backend process currently attached to a record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveProcess {
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub proceso_id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub job_id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub estado: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_paginas_solicitadas: u32,
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_paginas_exitosas: u32,
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_paginas_fallidas: u32,
}

impl ActiveProcess {
    /// Share of requested pages that succeeded, rounded to a whole percent.
    pub fn success_pct(&self) -> u8 {
        if self.total_paginas_solicitadas == 0 {
            return 0;
        }
        let pct = f64::from(self.total_paginas_exitosas) * 100.0
            / f64::from(self.total_paginas_solicitadas);
        pct.round().clamp(0.0, 100.0) as u8
    }
}

/// Generated document summarizing a finished job. Owned by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub job_id: Option<String>,
    #[serde(
        rename = "tipo_alerta",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub alert_type: Option<String>,
    #[serde(rename = "monto_usd", default)]
    pub amount: Option<f64>,
    #[serde(rename = "fecha_alerta", default, deserialize_with = "lenient_date")]
    pub event_date: Option<NaiveDate>,
    #[serde(
        alias = "fecha_creacion",
        default,
        deserialize_with = "lenient_datetime"
    )]
    pub created_at: Option<NaiveDateTime>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Unsigned(u64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Int(value) => value.to_string(),
        Raw::Unsigned(value) => value.to_string(),
    })
}

fn optional_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Text(text)) if !text.trim().is_empty() => Some(text),
        Some(Raw::Int(value)) => Some(value.to_string()),
        _ => None,
    })
}

/// Page counters: `null`, negatives and garbage read as zero.
fn lenient_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Unsigned(u64),
        Float(f64),
        Text(String),
        Other(serde::de::IgnoredAny),
    }

    let count = match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Unsigned(value)) => value,
        Some(Raw::Float(value)) if value.is_finite() && value > 0.0 => value as u64,
        Some(Raw::Text(text)) => text.trim().parse().unwrap_or_default(),
        _ => 0,
    };
    Ok(u32::try_from(count).unwrap_or(u32::MAX))
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.map(|value| value.trim().to_string()).unwrap_or_default())
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.as_deref().and_then(parse_datetime).map(|dt| dt.date()))
}

fn lenient_datetime<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.as_deref().and_then(parse_datetime))
}

/// Accepts RFC 3339, naive ISO timestamps and plain dates. Anything else is dropped.
pub(crate) fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc());
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }

    None
}
