//! Form completion and readiness, independent of full rule validity.
//!
//! Readiness is a presence-only signal for progress UI: a field can be
//! non-empty (counted here) and still fail a pattern or range rule, so
//! `ready_for_submission` and the form validator's `valid` flag are distinct
//! predicates and can diverge.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::evaluators::has_value;
use crate::types::FieldMetadata;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormReadiness {
    /// Percentage of required fields with a non-empty value.
    pub required_completion: f64,
    /// Percentage of all entered fields with a non-empty value.
    pub overall_completion: f64,
    /// True iff every required field has a non-empty value.
    pub ready_for_submission: bool,
}

/// Derive completion percentages and submission readiness from the current
/// values and the rule catalog. A form with no required fields is 100%
/// required-complete by definition.
pub fn calculate_form_readiness(
    values: &Map<String, Value>,
    rules: &HashMap<String, FieldMetadata>,
) -> FormReadiness {
    let required_fields: Vec<&String> = rules
        .iter()
        .filter(|(_, metadata)| metadata.validation.is_required())
        .map(|(field_id, _)| field_id)
        .collect();

    let completed_required = required_fields
        .iter()
        .filter(|field_id| values.get(field_id.as_str()).is_some_and(has_value))
        .count();

    let completed_total = values.values().filter(|value| has_value(value)).count();

    FormReadiness {
        required_completion: percentage(completed_required, required_fields.len()),
        overall_completion: percentage(completed_total, values.len()),
        ready_for_submission: completed_required == required_fields.len(),
    }
}

fn percentage(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    completed as f64 / total as f64 * 100.0
}
