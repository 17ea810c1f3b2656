use serde::{Deserialize, Serialize};

use crate::domain::Record;

/// One selectable public-registry page. The serialized form is the key the
/// backend understands, so it must never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Criterion {
    #[serde(rename = "interpol")]
    SanctionsList,
    #[serde(rename = "supercias_persona")]
    CorporateRegistry,
    #[serde(rename = "ruc")]
    TaxRegistry,
    #[serde(rename = "google")]
    WebSearch,
    #[serde(rename = "contraloria")]
    AssetDeclarations,
    #[serde(rename = "mercado_valores")]
    SecuritiesRegistry,
    #[serde(rename = "denuncias")]
    CriminalComplaints,
    #[serde(rename = "deudas")]
    DebtRegistry,
    #[serde(rename = "predio_quito")]
    PropertyQuito,
    #[serde(rename = "predio_manta")]
    PropertyManta,
}

/// Semantic piece of record data a criterion needs before it can be queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataTag {
    TaxId,
    NationalId,
    FullName,
    Surname,
}

impl DataTag {
    pub fn label(self) -> &'static str {
        match self {
            DataTag::TaxId => "RUC",
            DataTag::NationalId => "CI",
            DataTag::FullName => "Full name",
            DataTag::Surname => "Surname",
        }
    }

    fn present_in(self, record: &Record) -> bool {
        match self {
            DataTag::TaxId => !record.tax_id.trim().is_empty(),
            DataTag::NationalId => !record.national_id.trim().is_empty(),
            DataTag::FullName => {
                !record.first_name.trim().is_empty() && !record.last_name.trim().is_empty()
            }
            DataTag::Surname => !record.last_name.trim().is_empty(),
        }
    }
}

/// How a criterion's data tags combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    AllOf(&'static [DataTag]),
    AnyOf(&'static [DataTag]),
}

impl Requirement {
    pub fn tags(self) -> &'static [DataTag] {
        match self {
            Requirement::AllOf(tags) | Requirement::AnyOf(tags) => tags,
        }
    }
}

impl Criterion {
    /// Catalog order; item building walks criteria in this order.
    pub const ALL: [Criterion; 10] = [
        Criterion::SanctionsList,
        Criterion::CorporateRegistry,
        Criterion::TaxRegistry,
        Criterion::WebSearch,
        Criterion::AssetDeclarations,
        Criterion::SecuritiesRegistry,
        Criterion::CriminalComplaints,
        Criterion::DebtRegistry,
        Criterion::PropertyQuito,
        Criterion::PropertyManta,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Criterion::SanctionsList => "interpol",
            Criterion::CorporateRegistry => "supercias_persona",
            Criterion::TaxRegistry => "ruc",
            Criterion::WebSearch => "google",
            Criterion::AssetDeclarations => "contraloria",
            Criterion::SecuritiesRegistry => "mercado_valores",
            Criterion::CriminalComplaints => "denuncias",
            Criterion::DebtRegistry => "deudas",
            Criterion::PropertyQuito => "predio_quito",
            Criterion::PropertyManta => "predio_manta",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim();
        Self::ALL
            .into_iter()
            .find(|criterion| criterion.key().eq_ignore_ascii_case(key))
    }

    pub fn label(self) -> &'static str {
        match self {
            Criterion::SanctionsList => "INTERPOL red notices",
            Criterion::CorporateRegistry => "Supercias shareholders",
            Criterion::TaxRegistry => "SRI taxpayer registry",
            Criterion::WebSearch => "Google search",
            Criterion::AssetDeclarations => "Contraloría asset declarations",
            Criterion::SecuritiesRegistry => "Securities market registry",
            Criterion::CriminalComplaints => "Fiscalía criminal complaints",
            Criterion::DebtRegistry => "SRI firm and contested debts",
            Criterion::PropertyQuito => "Quito property registry",
            Criterion::PropertyManta => "Manta property registry",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Criterion::SanctionsList => "Red notice search by surname",
            Criterion::CorporateRegistry => "Shareholdings held by a natural person",
            Criterion::TaxRegistry => "Taxpayer status and registered activities",
            Criterion::WebSearch => "Open web results for the full name",
            Criterion::AssetDeclarations => "Sworn asset declarations of public servants",
            Criterion::SecuritiesRegistry => "Issuers and participants in the securities market",
            Criterion::CriminalComplaints => "Complaints filed with the prosecutor's office",
            Criterion::DebtRegistry => "Outstanding tax debts",
            Criterion::PropertyQuito => "Municipal cadastre search by owner name",
            Criterion::PropertyManta => "Municipal cadastre search by ID, passport or name",
        }
    }

    pub fn requirement(self) -> Requirement {
        use DataTag::*;
        match self {
            Criterion::SanctionsList => Requirement::AllOf(&[Surname]),
            Criterion::CorporateRegistry | Criterion::AssetDeclarations => {
                Requirement::AllOf(&[NationalId])
            }
            Criterion::TaxRegistry | Criterion::SecuritiesRegistry | Criterion::DebtRegistry => {
                Requirement::AllOf(&[TaxId])
            }
            Criterion::WebSearch | Criterion::CriminalComplaints | Criterion::PropertyQuito => {
                Requirement::AllOf(&[FullName])
            }
            Criterion::PropertyManta => Requirement::AnyOf(&[NationalId, TaxId, FullName]),
        }
    }

    /// Whether the record carries the data this criterion needs. Presence only;
    /// format checks happen when items are built.
    pub fn is_available_for(self, record: &Record) -> bool {
        match self.requirement() {
            Requirement::AllOf(tags) => tags.iter().all(|tag| tag.present_in(record)),
            Requirement::AnyOf(tags) => tags.iter().any(|tag| tag.present_in(record)),
        }
    }

    /// Input keys owned by this criterion in a selection form.
    pub fn input_keys(self) -> &'static [&'static str] {
        match self {
            Criterion::SanctionsList => &["interpol", SANCTIONS_GIVEN_NAMES_KEY],
            Criterion::CorporateRegistry => &["supercias_persona"],
            Criterion::TaxRegistry => &["ruc"],
            Criterion::WebSearch => &["google"],
            Criterion::AssetDeclarations => &["contraloria"],
            Criterion::SecuritiesRegistry => &["mercado_valores"],
            Criterion::CriminalComplaints => &["denuncias"],
            Criterion::DebtRegistry => &["deudas"],
            Criterion::PropertyQuito => &["predio_quito"],
            Criterion::PropertyManta => &["predio_manta"],
        }
    }
}

/// Optional given-names input sent alongside the sanctions-list surname.
pub const SANCTIONS_GIVEN_NAMES_KEY: &str = "nombres";

impl std::fmt::Display for Criterion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}
