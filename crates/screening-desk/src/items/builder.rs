use std::collections::BTreeMap;

use tracing::warn;

use super::classify::{classify_property_lookup, is_national_id, is_tax_id};
use super::QueryItem;
use crate::criteria::{field_rule, Criterion, SANCTIONS_GIVEN_NAMES_KEY};
use crate::domain::Record;

/// What to do when a ticked criterion cannot be satisfied by the data at hand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnsatisfiedPolicy {
    /// Reject the whole submission on the first unsatisfiable criterion.
    #[default]
    Abort,
    /// Log and drop the item, keep building the rest.
    Skip,
}

/// Client-side rejection raised before anything reaches the network.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ItemBuildError {
    #[error("{message}")]
    Unsatisfied {
        criterion: Criterion,
        message: String,
    },
    #[error("no page selected or all selections unsatisfiable")]
    NothingToSubmit,
}

impl ItemBuildError {
    /// Criterion to highlight in the form, when there is one.
    pub fn criterion(&self) -> Option<Criterion> {
        match self {
            ItemBuildError::Unsatisfied { criterion, .. } => Some(*criterion),
            ItemBuildError::NothingToSubmit => None,
        }
    }
}

/// Turns a record plus a selection into the items sent to the backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct ItemBuilder {
    policy: UnsatisfiedPolicy,
}

impl ItemBuilder {
    pub fn new(policy: UnsatisfiedPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> UnsatisfiedPolicy {
        self.policy
    }

    /// Build items in catalog order. Typed inputs win over record data.
    pub fn build(
        &self,
        record: &Record,
        flags: &BTreeMap<Criterion, bool>,
        values: &BTreeMap<String, String>,
    ) -> Result<Vec<QueryItem>, ItemBuildError> {
        let inputs = Inputs {
            record,
            flags,
            values,
        };
        let mut items = Vec::new();

        for criterion in Criterion::ALL.into_iter().filter(|c| inputs.selected(*c)) {
            match derive(criterion, &inputs) {
                Ok(item) => items.push(item),
                Err(message) => match self.policy {
                    UnsatisfiedPolicy::Abort => {
                        return Err(ItemBuildError::Unsatisfied { criterion, message })
                    }
                    UnsatisfiedPolicy::Skip => {
                        warn!(record_id = %record.id, %criterion, %message, "criterion skipped");
                    }
                },
            }
        }

        if items.is_empty() {
            return Err(ItemBuildError::NothingToSubmit);
        }
        Ok(items)
    }
}

/// Fail-fast build used by the interactive single-record form.
pub fn build_items(
    record: &Record,
    flags: &BTreeMap<Criterion, bool>,
    values: &BTreeMap<String, String>,
) -> Result<Vec<QueryItem>, ItemBuildError> {
    ItemBuilder::new(UnsatisfiedPolicy::Abort).build(record, flags, values)
}

struct Inputs<'a> {
    record: &'a Record,
    flags: &'a BTreeMap<Criterion, bool>,
    values: &'a BTreeMap<String, String>,
}

impl Inputs<'_> {
    fn selected(&self, criterion: Criterion) -> bool {
        self.flags.get(&criterion).copied().unwrap_or(false)
    }

    /// Non-blank typed input, rejected when it fails its field rule.
    fn typed(&self, key: &str) -> Result<Option<&str>, String> {
        let Some(value) = self
            .values
            .get(key)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
        else {
            return Ok(None);
        };
        match field_rule(key).and_then(|rule| rule.check(value).map(|message| (rule, message))) {
            Some((rule, message)) => Err(format!("Invalid {}: {message}", rule.label)),
            None => Ok(Some(value)),
        }
    }

    /// Typed input for the criterion, else the record field.
    fn typed_or<'r>(&'r self, criterion: Criterion, fallback: &'r str) -> Result<&'r str, String> {
        Ok(self
            .typed(criterion.key())?
            .unwrap_or_else(|| fallback.trim()))
    }

    /// Well-formed RUC available to reuse, when the RUC page is ticked.
    fn reusable_tax_id(&self) -> Option<&str> {
        if !self.selected(Criterion::TaxRegistry) {
            return None;
        }
        self.typed_or(Criterion::TaxRegistry, &self.record.tax_id)
            .ok()
            .filter(|tax_id| is_tax_id(tax_id))
    }
}

fn derive(criterion: Criterion, inputs: &Inputs<'_>) -> Result<QueryItem, String> {
    let record = inputs.record;
    match criterion {
        Criterion::SanctionsList => {
            let surname = inputs.typed_or(criterion, &record.last_name)?;
            if surname.is_empty() {
                return Err(format!("{} requires the surname.", criterion.label()));
            }
            let mut item = QueryItem::new(criterion, surname);
            item.surnames = Some(surname.to_string());
            item.given_names = inputs.typed(SANCTIONS_GIVEN_NAMES_KEY)?.map(str::to_string);
            Ok(item)
        }
        Criterion::CorporateRegistry | Criterion::AssetDeclarations => {
            let id = inputs.typed_or(criterion, &record.national_id)?;
            if !is_national_id(id) {
                return Err(format!(
                    "{} requires a 10-digit CI; the record has none or it is malformed.",
                    criterion.label()
                ));
            }
            Ok(QueryItem::new(criterion, id))
        }
        Criterion::TaxRegistry | Criterion::SecuritiesRegistry => {
            let id = inputs.typed_or(criterion, &record.tax_id)?;
            if !is_tax_id(id) {
                return Err(format!(
                    "{} requires a 13-digit RUC; the record has none or it is malformed.",
                    criterion.label()
                ));
            }
            Ok(QueryItem::new(criterion, id))
        }
        Criterion::WebSearch | Criterion::CriminalComplaints => {
            if let Some(name) = inputs.typed(criterion.key())? {
                return Ok(QueryItem::new(criterion, name));
            }
            let first = record.first_name.trim();
            let last = record.last_name.trim();
            if first.is_empty() || last.is_empty() {
                return Err(format!(
                    "{} requires both given names and surnames.",
                    criterion.label()
                ));
            }
            Ok(QueryItem::new(criterion, &format!("{last} {first}")))
        }
        Criterion::DebtRegistry => {
            let value = inputs
                .typed(criterion.key())?
                .or_else(|| inputs.reusable_tax_id());
            match value {
                Some(value) => Ok(QueryItem::new(criterion, value)),
                None => Err(format!(
                    "{} needs a CI/RUC, or the RUC page selected with a RUC.",
                    criterion.label()
                )),
            }
        }
        Criterion::PropertyQuito => {
            let owned;
            let name = match inputs.typed(criterion.key())? {
                Some(name) => name,
                None => {
                    owned = record.surname_first_name();
                    owned.as_str()
                }
            };
            if name.chars().count() < 3 {
                return Err(format!(
                    "{} requires the owner's surname and given name.",
                    criterion.label()
                ));
            }
            Ok(QueryItem::new(criterion, name))
        }
        Criterion::PropertyManta => {
            let candidates: Vec<String> = match inputs.typed(criterion.key())? {
                Some(value) => vec![value.to_string()],
                None => vec![
                    record.national_id.trim().to_string(),
                    record.tax_id.trim().to_string(),
                    record.surname_first_name(),
                ],
            };
            candidates
                .into_iter()
                .filter(|candidate| !candidate.is_empty())
                .find_map(|candidate| {
                    classify_property_lookup(&candidate).map(|kind| {
                        let mut item = QueryItem::new(criterion, &candidate);
                        item.lookup = Some(kind);
                        item
                    })
                })
                .ok_or_else(|| {
                    format!(
                        "{} needs a CI (10), RUC (13), passport (ABC123456) or name.",
                        criterion.label()
                    )
                })
        }
    }
}
