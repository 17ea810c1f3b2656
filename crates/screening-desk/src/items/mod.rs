//! Query items: the normalized (criterion, value) units the backend executes.

mod builder;
mod classify;


use serde::{Deserialize, Serialize};

use crate::criteria::Criterion;

pub use builder::{build_items, ItemBuildError, ItemBuilder, UnsatisfiedPolicy};
pub use classify::{classify_property_lookup, PropertyLookup};

/// One page to query for one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryItem {
    #[serde(rename = "tipo")]
    pub criterion: Criterion,
    #[serde(rename = "valor")]
    pub value: String,
    #[serde(rename = "apellidos", default, skip_serializing_if = "Option::is_none")]
    pub surnames: Option<String>,
    #[serde(rename = "nombres", default, skip_serializing_if = "Option::is_none")]
    pub given_names: Option<String>,
    #[serde(rename = "tipo_busqueda", default, skip_serializing_if = "Option::is_none")]
    pub lookup: Option<PropertyLookup>,
}

impl QueryItem {
    pub fn new(criterion: Criterion, value: &str) -> Self {
        Self {
            criterion,
            value: value.trim().to_string(),
            surnames: None,
            given_names: None,
            lookup: None,
        }
    }
}
