use chrono::NaiveDate;
use crf_schema::*;
use serde_json::{Map, Value, json};

fn values(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 27).unwrap()
}

fn engine() -> FormValidationEngine {
    FormValidationEngine::new().with_today(today())
}

#[test]
fn registration_form_precompiles_cleanly() {
    let definition = catalog::study_registration_form(today());
    assert!(engine().precompile(&definition).is_ok());
    assert!(definition.validate_structure().is_ok());
}

#[test]
fn complete_registration_passes() {
    let engine = engine();
    let definition = catalog::study_registration_form(today());
    let form_values = values(&[
        ("studyName", json!("Phase II Efficacy Study of Examplinib")),
        ("protocolNumber", json!("EXA-2026-014")),
        ("studyPhaseId", json!("Phase 2")),
        ("sponsor", json!("Example Pharma Inc.")),
        ("principalInvestigator", json!("Dr. Jane Doe, MD")),
        (
            "description",
            json!("A randomized, double-blind, placebo-controlled study of Examplinib in adults."),
        ),
        ("email", json!("coordinator@example.org")),
        ("startDate", json!("2026-10-01")),
        ("endDate", json!("2027-06-30")),
        ("enrollmentTarget", json!(240)),
    ]);

    let result = engine.validate_form(&definition, &form_values).unwrap();
    assert!(result.valid, "errors: {:?}", result.errors);
    assert!(result.warnings.is_empty(), "warnings: {:?}", result.warnings);
}

#[test]
fn short_lowercase_protocol_number_fails_pattern_and_length_rule() {
    let engine = engine();
    let definition = catalog::study_registration_form(today());
    let form_values = values(&[("protocolNumber", json!("abc"))]);

    let result = engine.validate_form(&definition, &form_values).unwrap();
    let errors = &result.field_errors["protocolNumber"];
    assert!(errors.iter().any(|e| e.kind == IssueKind::Pattern));
    assert!(
        errors
            .iter()
            .any(|e| e.rule_id.as_deref() == Some("PROTOCOL_MIN_LENGTH"))
    );
}

#[test]
fn reversed_study_dates_fail_the_cross_field_rule() {
    let engine = engine();
    let definition = catalog::study_registration_form(today());
    let mut form_values = values(&[
        ("startDate", json!("2027-10-01")),
        ("endDate", json!("2026-10-01")),
    ]);

    let result = engine.validate_form(&definition, &form_values).unwrap();
    let start_errors = &result.field_errors["startDate"];
    assert!(start_errors.iter().any(|e| e.kind == IssueKind::CrossField));

    // Fixing the end date clears the rule on the next pass.
    form_values.insert("endDate".to_string(), json!("2028-10-01"));
    let result = engine.validate_form(&definition, &form_values).unwrap();
    assert!(!result.field_errors.contains_key("startDate"));
}

#[test]
fn oversized_enrollment_target_warns_but_does_not_block() {
    let engine = engine();
    let definition = catalog::study_registration_form(today());
    let form_values = values(&[("enrollmentTarget", json!(50_000))]);

    let result = engine.validate_form(&definition, &form_values).unwrap();
    let warnings = &result.field_warnings["enrollmentTarget"];
    assert!(
        warnings
            .iter()
            .any(|w| w.rule_id.as_deref() == Some("ENROLLMENT_SANITY"))
    );
    assert!(!result.field_errors.contains_key("enrollmentTarget"));
}

#[test]
fn study_dates_beyond_the_horizon_fail_the_catalog_rule() {
    let engine = engine();
    let definition = catalog::study_registration_form(today());
    let form_values = values(&[("endDate", json!("2050-01-01"))]);

    let result = engine.validate_form(&definition, &form_values).unwrap();
    let errors = &result.field_errors["endDate"];
    assert!(
        errors
            .iter()
            .any(|e| e.rule_id.as_deref() == Some("STUDY_DATE_HORIZON"))
    );

    let form_values = values(&[("endDate", json!("2040-01-01"))]);
    let result = engine.validate_form(&definition, &form_values).unwrap();
    assert!(!result.field_errors.contains_key("endDate"));
}

#[test]
fn readiness_tracks_required_catalog_fields() {
    let rules = catalog::study_registration_rules(today());
    let form_values = values(&[
        ("studyName", json!("Phase I Safety Study")),
        ("protocolNumber", json!("EXA-2026-001")),
        ("studyPhaseId", json!("Phase 1")),
        ("sponsor", json!("Example Pharma Inc.")),
        ("principalInvestigator", json!("")),
    ]);

    let readiness = calculate_form_readiness(&form_values, &rules);
    assert!(!readiness.ready_for_submission);
    assert_eq!(readiness.required_completion, 80.0);
    assert_eq!(readiness.overall_completion, 80.0);
}

#[test]
fn submission_payload_round_trips_through_json() {
    let submission = FormDataSubmission {
        study_id: "STUDY-1".to_string(),
        form_id: "demographics".to_string(),
        subject_id: "SUBJ-001".to_string(),
        visit_id: Some("V1".to_string()),
        form_data: values(&[("subjectId", json!("SUBJ-001"))]),
        status: SubmissionStatus::Complete,
    };

    let encoded = serde_json::to_value(&submission).unwrap();
    assert_eq!(encoded["status"], json!("COMPLETE"));
    assert_eq!(encoded["formData"]["subjectId"], json!("SUBJ-001"));

    let decoded: FormDataSubmission = serde_json::from_value(encoded).unwrap();
    assert_eq!(decoded, submission);
}
