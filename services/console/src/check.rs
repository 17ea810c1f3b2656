use crate::infra::parse_key_value;
use clap::Args;
use screening_desk::criteria::{sanitize, validate, FormValidation};
use screening_desk::error::AppError;
use std::collections::BTreeMap;

#[derive(Args, Debug, Default)]
pub(crate) struct CheckArgs {
    /// Field keys to treat as selected (repeatable)
    #[arg(long = "select")]
    pub(crate) selected: Vec<String>,
    /// Raw field input as KEY=VALUE (repeatable)
    #[arg(long = "value", value_parser = parse_key_value)]
    pub(crate) values: Vec<(String, String)>,
}

pub(crate) fn run(args: CheckArgs) -> Result<(), AppError> {
    let output = evaluate(&args);
    let rendered = serde_json::to_string_pretty(&output)
        .map_err(|err| AppError::Usage(format!("failed to render result: {err}")))?;
    println!("{rendered}");

    let result = &output.validation;
    if result.is_valid {
        Ok(())
    } else {
        Err(AppError::Usage(format!(
            "{} field(s) invalid, {} selected",
            result.errors.len(),
            result.selected_count
        )))
    }
}

#[derive(Debug, serde::Serialize)]
struct CheckOutput {
    sanitized: BTreeMap<String, String>,
    #[serde(flatten)]
    validation: FormValidation,
}

fn evaluate(args: &CheckArgs) -> CheckOutput {
    let sanitized: BTreeMap<String, String> = args
        .values
        .iter()
        .map(|(key, raw)| (key.clone(), sanitize(key, raw)))
        .collect();
    let selected: BTreeMap<String, bool> = args
        .selected
        .iter()
        .map(|key| (key.trim().to_string(), true))
        .collect();
    let validation = validate(&sanitized, &selected);
    CheckOutput {
        sanitized,
        validation,
    }
}
