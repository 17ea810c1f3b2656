use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::criteria::NAME_WORDS;

/// Shape of a value submitted to the Manta property registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyLookup {
    #[serde(rename = "ci")]
    NationalId,
    #[serde(rename = "ruc")]
    TaxId,
    #[serde(rename = "pasaporte")]
    Passport,
    #[serde(rename = "nombre")]
    Name,
}

static NATIONAL_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{10}$").expect("static pattern compiles"));
static TAX_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{13}$").expect("static pattern compiles"));
static PASSPORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{3}[0-9]{6}$").expect("static pattern compiles"));
static NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^{NAME_WORDS}$")).expect("static pattern compiles"));

pub(crate) fn is_national_id(value: &str) -> bool {
    NATIONAL_ID.is_match(value)
}

pub(crate) fn is_tax_id(value: &str) -> bool {
    TAX_ID.is_match(value)
}

/// Classify a lookup value; the first matching shape wins.
pub fn classify_property_lookup(value: &str) -> Option<PropertyLookup> {
    let value = value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase();

    if NATIONAL_ID.is_match(&value) {
        Some(PropertyLookup::NationalId)
    } else if TAX_ID.is_match(&value) {
        Some(PropertyLookup::TaxId)
    } else if PASSPORT.is_match(&value) {
        Some(PropertyLookup::Passport)
    } else if value.chars().count() >= 3 && NAME.is_match(&value) {
        Some(PropertyLookup::Name)
    } else {
        None
    }
}
