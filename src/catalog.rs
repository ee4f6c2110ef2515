//! Predefined validation rules for common clinical-trial fields.
//!
//! Rule catalogs are plain data handed to the validator by the caller; there
//! is no process-wide registry, so validation passes stay independently
//! testable.

use std::collections::HashMap;

use chrono::{Months, NaiveDate};
use serde_json::Value;

use crate::types::{
    CrossFieldRule, CustomRule, DataQualityRules, FieldMetadata, FieldType, FormDefinition,
    FormField, RangeAction, RangeCheck, RuleType, Severity, ValidationConfig,
};
use crate::validation::evaluators::{parse_date, value_as_string};

/// Common clinical validation patterns.
pub mod patterns {
    use std::sync::LazyLock;

    use regex::Regex;

    macro_rules! pattern {
        ($name:ident, $re:literal) => {
            pub static $name: LazyLock<Regex> =
                LazyLock::new(|| Regex::new($re).expect("valid pattern"));
        };
    }

    pattern!(EMAIL, r"^[^\s@]+@[^\s@]+\.[^\s@]+$");
    pattern!(PHONE, r"^\+?[\d\s\-()]+$");
    pattern!(PROTOCOL_NUMBER, r"^[A-Z0-9-]+$");
    pattern!(POST_CODE, r"^[A-Za-z0-9]{3,10}$");
    pattern!(ALPHANUMERIC, r"^[a-zA-Z0-9]+$");
    pattern!(NUMERIC, r"^\d+$");
    pattern!(DECIMAL, r"^\d+(\.\d+)?$");
    pattern!(ICD10, r"^[A-Z]\d{2}(\.[A-Z0-9]{1,4})?$");
    pattern!(MEDDRA, r"^\d{8}$");
}

const STUDY_PHASES: [&str; 6] = [
    "Phase 1", "Phase 2", "Phase 3", "Phase 4", "Phase 1/2", "Phase 2/3",
];

/// Metadata catalog for the standard study-registration fields, keyed by
/// field id. `today` anchors the twenty-year horizon on the study dates.
pub fn study_registration_rules(today: NaiveDate) -> HashMap<String, FieldMetadata> {
    let mut rules = HashMap::new();

    rules.insert(
        "studyName".to_string(),
        FieldMetadata::new(
            ValidationConfig::required()
                .with_type(FieldType::String)
                .with_length(3, 255),
        ),
    );

    rules.insert(
        "protocolNumber".to_string(),
        FieldMetadata::new(
            ValidationConfig::required()
                .with_pattern(patterns::PROTOCOL_NUMBER.as_str())
                .with_pattern_description(
                    "uppercase letters, numbers, and hyphens",
                )
                .with_custom_rule(
                    CustomRule::new(
                        "PROTOCOL_MIN_LENGTH",
                        "Protocol number should be at least 6 characters",
                        |value, _| value_as_string(value).len() >= 6,
                    )
                    .with_rule_type(RuleType::Format),
                ),
        ),
    );

    rules.insert(
        "principalInvestigator".to_string(),
        FieldMetadata::new(
            ValidationConfig::required()
                .with_type(FieldType::String)
                .with_length(2, 100)
                .with_pattern(r"^[A-Za-z\s.,\-']+$")
                .with_pattern_description("letters, spaces, and name punctuation"),
        ),
    );

    rules.insert(
        "sponsor".to_string(),
        FieldMetadata::new(
            ValidationConfig::required()
                .with_type(FieldType::String)
                .with_length(2, 200),
        ),
    );

    rules.insert(
        "studyPhaseId".to_string(),
        FieldMetadata::new(ValidationConfig::required().with_custom_rule(
            CustomRule::new(
                "STUDY_PHASE",
                "Please select a valid study phase",
                |value, _| STUDY_PHASES.contains(&value_as_string(value).as_str()),
            )
            .with_rule_type(RuleType::Consistency),
        )),
    );

    rules.insert(
        "description".to_string(),
        FieldMetadata::new(
            ValidationConfig::new()
                .with_type(FieldType::String)
                .with_length(10, 2000)
                .with_custom_rule(
                    CustomRule::new(
                        "DESCRIPTION_DETAIL",
                        "Study description should be more detailed (at least 50 characters)",
                        |value, _| value_as_string(value).chars().count() >= 50,
                    )
                    .with_severity(Severity::Warning),
                ),
        ),
    );

    rules.insert(
        "email".to_string(),
        FieldMetadata::new(ValidationConfig::new().with_type(FieldType::Email)),
    );

    rules.insert(
        "startDate".to_string(),
        FieldMetadata::new(
            ValidationConfig::new()
                .with_type(FieldType::Date)
                .with_allow_future_dates(true)
                .with_custom_rule(study_date_horizon_rule(today)),
        ),
    );

    rules.insert(
        "endDate".to_string(),
        FieldMetadata::new(
            ValidationConfig::new()
                .with_type(FieldType::Date)
                .with_allow_future_dates(true)
                .with_custom_rule(study_date_horizon_rule(today)),
        ),
    );

    rules.insert(
        "enrollmentTarget".to_string(),
        FieldMetadata::new(
            ValidationConfig::new()
                .with_type(FieldType::Integer)
                .with_range(1.0, None)
                .with_pattern(patterns::NUMERIC.as_str())
                .with_pattern_description("a whole number"),
        )
        .with_data_quality(DataQualityRules {
            range_checks: vec![
                RangeCheck::new("ENROLLMENT_SANITY", None, Some(10_000.0))
                    .with_message("Enrollment target seems unusually high. Please verify.")
                    .with_action(RangeAction::Warn),
            ],
        }),
    );

    rules
}

/// Cross-field date-ordering rule shared by study forms: the study start
/// must fall strictly before the end when both are entered.
pub fn study_date_order_rule() -> CrossFieldRule {
    CrossFieldRule::new(
        "START_BEFORE_END",
        vec!["startDate".to_string(), "endDate".to_string()],
        "Start date must be before end date",
        |snapshot| {
            let start = snapshot
                .get("startDate")
                .map(value_as_string)
                .as_deref()
                .and_then(parse_date);
            let end = snapshot
                .get("endDate")
                .map(value_as_string)
                .as_deref()
                .and_then(parse_date);
            match (start, end) {
                (Some(start), Some(end)) => start < end,
                _ => true,
            }
        },
    )
}

/// Horizon rule shared by the study date fields.
fn study_date_horizon_rule(today: NaiveDate) -> CustomRule {
    CustomRule::new(
        "STUDY_DATE_HORIZON",
        "Study dates should be within the next twenty years",
        move |value, _| is_valid_study_date(value, today),
    )
    .with_rule_type(RuleType::Consistency)
}

/// Complete study-registration form definition built from the catalog.
pub fn study_registration_form(today: NaiveDate) -> FormDefinition {
    let mut rules = study_registration_rules(today);
    let mut definition = FormDefinition::new("study-registration", "Study Registration")
        .with_cross_field_rule(study_date_order_rule());

    // Fixed display order; the catalog map itself is unordered.
    for field_id in [
        "studyName",
        "protocolNumber",
        "studyPhaseId",
        "sponsor",
        "principalInvestigator",
        "description",
        "email",
        "startDate",
        "endDate",
        "enrollmentTarget",
    ] {
        if let Some(metadata) = rules.remove(field_id) {
            definition = definition.with_field(FormField::new(field_id, metadata));
        }
    }

    definition
}

/// True when `value` is an acceptable study date: parseable and no more than
/// twenty years out.
pub fn is_valid_study_date(value: &Value, today: NaiveDate) -> bool {
    let rendered = value_as_string(value);
    if rendered.trim().is_empty() {
        return true;
    }
    match parse_date(&rendered) {
        Some(date) => {
            let horizon = today
                .checked_add_months(Months::new(240))
                .unwrap_or(NaiveDate::MAX);
            date <= horizon
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn clinical_patterns_match_expected_shapes() {
        assert!(patterns::PROTOCOL_NUMBER.is_match("ABC-2024-001"));
        assert!(!patterns::PROTOCOL_NUMBER.is_match("abc 2024"));
        assert!(patterns::ICD10.is_match("C50.911"));
        assert!(!patterns::ICD10.is_match("C5"));
        assert!(patterns::MEDDRA.is_match("10012345"));
        assert!(!patterns::MEDDRA.is_match("1234"));
    }

    #[test]
    fn registration_catalog_marks_core_fields_required() {
        let rules = study_registration_rules(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        for field in ["studyName", "protocolNumber", "sponsor", "studyPhaseId"] {
            assert!(rules[field].validation.is_required(), "{field}");
        }
        assert!(!rules["description"].validation.is_required());
    }

    #[test]
    fn study_date_horizon_is_twenty_years() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(is_valid_study_date(&json!("2040-01-01"), today));
        assert!(!is_valid_study_date(&json!("2050-01-01"), today));
        assert!(is_valid_study_date(&json!(""), today));
        assert!(!is_valid_study_date(&json!("not-a-date"), today));
    }
}
