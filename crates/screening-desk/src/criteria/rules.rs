use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Characters a field keeps while the operator types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    /// ASCII digits only.
    Digits,
    /// Spanish uppercase letters plus single spaces between words.
    Letters,
    /// Plate characters: letters, digits and a hyphen.
    Plate,
    /// Letters, digits and single spaces.
    Mixed,
}

impl CharClass {
    fn admits(self, c: char) -> bool {
        match self {
            CharClass::Digits => c.is_ascii_digit(),
            CharClass::Letters => c.is_whitespace() || is_name_letter(c),
            CharClass::Plate => c.is_ascii_alphanumeric() || c == '-',
            CharClass::Mixed => c.is_whitespace() || c.is_ascii_digit() || is_name_letter(c),
        }
    }

    fn keeps_spaces(self) -> bool {
        matches!(self, CharClass::Letters | CharClass::Mixed)
    }
}

/// A letter whose uppercase form is a single character in the accepted alphabet.
fn is_name_letter(c: char) -> bool {
    let mut upper = c.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(u), None) => matches!(u, 'A'..='Z' | 'Á' | 'É' | 'Í' | 'Ó' | 'Ú' | 'Ñ'),
        _ => false,
    }
}

/// Sanitization and validation rule for one input key.
#[derive(Debug)]
pub struct FieldRule {
    pub key: &'static str,
    pub label: &'static str,
    pub max_len: usize,
    pub min_len: usize,
    pub required: bool,
    pub charset: CharClass,
    pub pattern: Regex,
    pub message: &'static str,
}

impl FieldRule {
    fn new(
        key: &'static str,
        label: &'static str,
        max_len: usize,
        charset: CharClass,
        pattern: &str,
        message: &'static str,
    ) -> Self {
        Self {
            key,
            label,
            max_len,
            min_len: 0,
            required: true,
            charset,
            pattern: Regex::new(pattern).expect("static field pattern compiles"),
            message,
        }
    }

    fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    fn min_len(mut self, min_len: usize) -> Self {
        self.min_len = min_len;
        self
    }

    /// Filter, collapse whitespace, uppercase, truncate. Idempotent.
    pub fn sanitize(&self, raw: &str) -> String {
        let kept: String = raw.chars().filter(|c| self.charset.admits(*c)).collect();
        let collapsed = if self.charset.keeps_spaces() {
            kept.split_whitespace().collect::<Vec<_>>().join(" ")
        } else {
            kept
        };
        let upper = collapsed.to_uppercase();
        let truncated: String = upper.chars().take(self.max_len).collect();
        truncated.trim_end().to_string()
    }

    /// First failing check for a selected field, if any.
    pub fn check(&self, raw: &str) -> Option<String> {
        let value = raw.trim().to_uppercase();
        if value.is_empty() {
            return self.required.then(|| format!("Enter {}.", self.label));
        }
        let len = value.chars().count();
        if len > self.max_len {
            return Some(format!("Maximum {} characters.", self.max_len));
        }
        if len < self.min_len || !self.pattern.is_match(&value) {
            return Some(self.message.to_string());
        }
        None
    }
}

pub(crate) const NAME_WORDS: &str = r"[A-ZÁÉÍÓÚÑ]+(?: [A-ZÁÉÍÓÚÑ]+)*";

static RULES: LazyLock<BTreeMap<&'static str, FieldRule>> = LazyLock::new(|| {
    use CharClass::*;

    let surname = r"^[A-ZÁÉÍÓÚÑ]{2,}(?: [A-ZÁÉÍÓÚÑ]{2,})*$";
    let full_name = r"^[A-ZÁÉÍÓÚÑ]+(?: [A-ZÁÉÍÓÚÑ]+)+$";
    let property_lookup =
        format!(r"^(?:[0-9]{{10}}|[0-9]{{13}}|[A-Z]{{3}}[0-9]{{6}}|{NAME_WORDS})$");

    let rules = [
        FieldRule::new("ruc", "RUC", 13, Digits, r"^[0-9]{13}$", "Exactly 13 digits."),
        FieldRule::new("ci", "CI", 10, Digits, r"^[0-9]{10}$", "Exactly 10 digits."),
        FieldRule::new("supercias_persona", "CI", 10, Digits, r"^[0-9]{10}$", "Exactly 10 digits."),
        FieldRule::new("contraloria", "CI", 10, Digits, r"^[0-9]{10}$", "Exactly 10 digits."),
        FieldRule::new("mercado_valores", "RUC", 13, Digits, r"^[0-9]{13}$", "Exactly 13 digits."),
        FieldRule::new(
            "interpol",
            "surnames",
            60,
            Letters,
            surname,
            "Letters and spaces only, at least 2 letters per word.",
        ),
        FieldRule::new(
            "apellidos",
            "surnames",
            60,
            Letters,
            surname,
            "Letters and spaces only, at least 2 letters per word.",
        ),
        FieldRule::new(
            "nombres",
            "given names",
            60,
            Letters,
            surname,
            "Letters and spaces only, at least 2 letters per word.",
        )
        .optional(),
        FieldRule::new(
            "google",
            "full name",
            120,
            Letters,
            full_name,
            "Enter surnames and given names.",
        ),
        FieldRule::new(
            "denuncias",
            "full name",
            120,
            Letters,
            full_name,
            "Enter surnames and given names.",
        ),
        FieldRule::new(
            "deudas",
            "CI or RUC",
            13,
            Digits,
            r"^(?:[0-9]{10}|[0-9]{13})$",
            "Enter a 10-digit CI or a 13-digit RUC.",
        )
        .optional(),
        FieldRule::new(
            "predio_quito",
            "owner name",
            120,
            Letters,
            r"^[A-ZÁÉÍÓÚÑ ]+$",
            "At least 3 letters of the owner's name.",
        )
        .min_len(3),
        FieldRule::new(
            "predio_manta",
            "CI, RUC, passport or name",
            60,
            Mixed,
            &property_lookup,
            "Enter a CI (10), RUC (13), passport (ABC123456) or name.",
        )
        .min_len(3),
        FieldRule::new(
            "placa",
            "plate",
            8,
            Plate,
            r"^[A-Z]{3}-?[0-9]{3,4}$",
            "Expected format: ABC-1234.",
        ),
    ];

    rules.into_iter().map(|rule| (rule.key, rule)).collect()
});

pub fn field_rule(key: &str) -> Option<&'static FieldRule> {
    RULES.get(key)
}

/// Keystroke-level cleanup for an input. Unknown keys are trimmed and uppercased.
pub fn sanitize(key: &str, raw: &str) -> String {
    match field_rule(key) {
        Some(rule) => rule.sanitize(raw),
        None => raw.trim().to_uppercase(),
    }
}

/// Submit-time outcome of checking every selected field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormValidation {
    pub errors: BTreeMap<String, String>,
    pub is_valid: bool,
    pub selected_count: usize,
}

/// Check every selected key. Unselected keys are never evaluated, whatever
/// value they still hold.
pub fn validate(
    values: &BTreeMap<String, String>,
    selected: &BTreeMap<String, bool>,
) -> FormValidation {
    let mut errors = BTreeMap::new();

    for key in selected.iter().filter(|(_, on)| **on).map(|(key, _)| key) {
        let raw = values.get(key).map(String::as_str).unwrap_or_default();
        let failure = match field_rule(key) {
            Some(rule) => rule.check(raw),
            None => raw.trim().is_empty().then(|| format!("Enter {key}.")),
        };
        if let Some(message) = failure {
            errors.insert(key.clone(), message);
        }
    }

    let selected_count = selected.values().filter(|on| **on).count();
    let is_valid = selected_count > 0 && errors.is_empty();

    FormValidation {
        errors,
        is_valid,
        selected_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn flags(pairs: &[(&str, bool)]) -> BTreeMap<String, bool> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn sanitize_keeps_digits_and_truncates() {
        assert_eq!(sanitize("ruc", " 17-9001 2345 001 99"), "1790012345001");
        assert_eq!(sanitize("ci", "09a12345678"), "0912345678");
    }

    #[test]
    fn sanitize_letters_collapses_and_uppercases() {
        assert_eq!(sanitize("apellidos", "  macías   villamar3 "), "MACÍAS VILLAMAR");
        assert_eq!(sanitize("apellidos", "o'brien-núñez"), "OBRIENNÚÑEZ");
    }

    #[test]
    fn sanitize_drops_letters_that_expand_when_uppercased() {
        assert_eq!(sanitize("apellidos", "straße"), "STRAE");
    }

    #[test]
    fn sanitize_does_not_leave_trailing_space_after_truncation() {
        let raw = format!("{} {}", "A".repeat(59), "BCD");
        let once = sanitize("apellidos", &raw);
        assert_eq!(once.chars().count(), 59);
        assert_eq!(sanitize("apellidos", &once), once);
    }

    #[test]
    fn sanitize_is_idempotent_across_rules() {
        let inputs = [
            "",
            "   ",
            "abc-1234",
            "  juan   pérez  ",
            "1234 5678 9012 3456",
            "ÑANDÚ\tcañón\n x",
            "abc123456",
            "--x--",
            "ß ß ß",
        ];
        let keys = [
            "ruc",
            "ci",
            "apellidos",
            "nombres",
            "placa",
            "deudas",
            "predio_manta",
            "predio_quito",
            "unknown",
        ];
        for key in keys {
            for input in inputs {
                let once = sanitize(key, input);
                assert_eq!(sanitize(key, &once), once, "key {key} input {input:?}");
            }
        }
    }

    #[test]
    fn zero_selected_is_never_valid() {
        let result = validate(&map(&[("ruc", "1790012345001")]), &flags(&[("ruc", false)]));
        assert!(!result.is_valid);
        assert_eq!(result.selected_count, 0);
        assert!(result.errors.is_empty());

        let empty = validate(&BTreeMap::new(), &BTreeMap::new());
        assert!(!empty.is_valid);
        assert_eq!(empty.selected_count, 0);
    }

    #[test]
    fn unselected_fields_are_not_evaluated() {
        let values = map(&[("ruc", "12"), ("placa", "ABC-1234")]);
        let result = validate(&values, &flags(&[("ruc", false), ("placa", true)]));
        assert!(result.is_valid, "{:?}", result.errors);
        assert!(!result.errors.contains_key("ruc"));
        assert_eq!(result.selected_count, 1);
    }

    #[test]
    fn reports_required_length_and_pattern_failures() {
        let values = map(&[("ci", "12345678901"), ("placa", "AB-12")]);
        let result = validate(
            &values,
            &flags(&[("ruc", true), ("ci", true), ("placa", true)]),
        );
        assert!(!result.is_valid);
        assert_eq!(result.errors["ruc"], "Enter RUC.");
        assert_eq!(result.errors["ci"], "Maximum 10 characters.");
        assert_eq!(result.errors["placa"], "Expected format: ABC-1234.");
    }

    #[test]
    fn digit_rules_reject_non_ascii_digits() {
        let ruc = field_rule("ruc").expect("ruc rule");
        assert_eq!(ruc.check("١٢٣٤٥٦٧٨٩٠١٢٣").as_deref(), Some("Exactly 13 digits."));
        let debts = field_rule("deudas").expect("deudas rule");
        assert!(debts.check("०९१२३४५६७८").is_some());
        assert_eq!(debts.check("0912345678"), None);
    }

    #[test]
    fn optional_fields_accept_empty_values() {
        let result = validate(&BTreeMap::new(), &flags(&[("deudas", true)]));
        assert!(result.is_valid);
        let bad = validate(&map(&[("deudas", "12345")]), &flags(&[("deudas", true)]));
        assert_eq!(bad.errors["deudas"], "Enter a 10-digit CI or a 13-digit RUC.");
    }

    #[test]
    fn minimum_length_uses_rule_message() {
        let result = validate(&map(&[("predio_quito", "AB")]), &flags(&[("predio_quito", true)]));
        assert_eq!(
            result.errors["predio_quito"],
            "At least 3 letters of the owner's name."
        );
    }

    #[test]
    fn unknown_selected_key_only_checks_presence() {
        let result = validate(&map(&[("extra", "x")]), &flags(&[("extra", true), ("other", true)]));
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors["other"], "Enter other.");
    }
}
