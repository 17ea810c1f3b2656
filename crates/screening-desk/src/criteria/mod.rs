//! Criterion catalog, per-field sanitize/validate rules and the selection
//! dialog state.

mod catalog;
mod rules;
mod selection;

pub use catalog::{Criterion, DataTag, Requirement, SANCTIONS_GIVEN_NAMES_KEY};
pub(crate) use rules::NAME_WORDS;
pub use rules::{field_rule, sanitize, validate, CharClass, FieldRule, FormValidation};
pub use selection::SelectionState;
