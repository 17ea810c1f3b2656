use std::collections::BTreeMap;

use super::catalog::Criterion;
use super::rules::{sanitize, validate, FormValidation};

/// Transient state of one selection dialog: which criteria are ticked and what
/// the operator typed for them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    flags: BTreeMap<Criterion, bool>,
    values: BTreeMap<String, String>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_selected(&self, criterion: Criterion) -> bool {
        self.flags.get(&criterion).copied().unwrap_or(false)
    }

    /// Tick or untick a criterion. Unticking clears the inputs it owns so a
    /// stale value can never be submitted.
    pub fn set_selected(&mut self, criterion: Criterion, on: bool) {
        self.flags.insert(criterion, on);
        if !on {
            for key in criterion.input_keys() {
                self.values.remove(*key);
            }
        }
    }

    pub fn toggle(&mut self, criterion: Criterion) {
        let next = !self.is_selected(criterion);
        self.set_selected(criterion, next);
    }

    /// Tick every criterion, or clear all of them when all are already ticked.
    pub fn toggle_all(&mut self) {
        let all_on = Criterion::ALL.iter().all(|c| self.is_selected(*c));
        for criterion in Criterion::ALL {
            self.set_selected(criterion, !all_on);
        }
    }

    /// Store a keystroke for an input key, sanitized with that key's rule.
    pub fn set_value(&mut self, key: &str, raw: &str) {
        let clean = sanitize(key, raw);
        if clean.is_empty() {
            self.values.remove(key);
        } else {
            self.values.insert(key.to_string(), clean);
        }
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn flags(&self) -> &BTreeMap<Criterion, bool> {
        &self.flags
    }

    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    pub fn selected(&self) -> impl Iterator<Item = Criterion> + '_ {
        self.flags
            .iter()
            .filter(|(_, on)| **on)
            .map(|(criterion, _)| *criterion)
    }

    pub fn selected_count(&self) -> usize {
        self.selected().count()
    }

    /// Submit-time validation of the ticked criteria's primary inputs.
    pub fn validate(&self) -> FormValidation {
        let selected = self
            .flags
            .iter()
            .map(|(criterion, on)| (criterion.key().to_string(), *on))
            .collect();
        validate(&self.values, &selected)
    }

    pub fn clear(&mut self) {
        self.flags.clear();
        self.values.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unticking_clears_owned_inputs() {
        let mut state = SelectionState::new();
        state.set_selected(Criterion::SanctionsList, true);
        state.set_value("interpol", "macias");
        state.set_value("nombres", "jose");
        state.set_selected(Criterion::TaxRegistry, true);
        state.set_value("ruc", "1790012345001");

        state.set_selected(Criterion::SanctionsList, false);

        assert_eq!(state.value("interpol"), None);
        assert_eq!(state.value("nombres"), None);
        assert_eq!(state.value("ruc"), Some("1790012345001"));
    }

    #[test]
    fn set_value_sanitizes_input() {
        let mut state = SelectionState::new();
        state.set_value("ruc", "179-001-2345-001");
        assert_eq!(state.value("ruc"), Some("1790012345001"));
        state.set_value("ruc", "abc");
        assert_eq!(state.value("ruc"), None);
    }

    #[test]
    fn toggle_all_selects_then_clears() {
        let mut state = SelectionState::new();
        state.set_selected(Criterion::WebSearch, true);
        state.toggle_all();
        assert_eq!(state.selected_count(), Criterion::ALL.len());
        state.toggle_all();
        assert_eq!(state.selected_count(), 0);
    }

    #[test]
    fn validate_uses_criterion_keys() {
        let mut state = SelectionState::new();
        state.set_selected(Criterion::TaxRegistry, true);
        let result = state.validate();
        assert!(!result.is_valid);
        assert_eq!(result.errors["ruc"], "Enter RUC.");

        state.set_value("ruc", "1790012345001");
        assert!(state.validate().is_valid);
    }
}
