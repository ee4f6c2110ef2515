use chrono::NaiveDate;
use crf_schema::*;
use serde_json::{Map, Value, json};

fn values(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn engine() -> FormValidationEngine {
    FormValidationEngine::new().with_today(NaiveDate::from_ymd_opt(2026, 8, 27).unwrap())
}

#[test]
fn field_without_metadata_always_passes() {
    let engine = engine();
    let result = engine
        .validate_field("anything", &json!("whatever"), None, &Map::new())
        .unwrap();
    assert!(result.valid);
    assert!(result.errors.is_empty());
    assert!(result.warnings.is_empty());
}

#[test]
fn required_empty_yields_exactly_one_required_error() {
    let engine = engine();
    let metadata = FieldMetadata::new(
        ValidationConfig::required()
            .with_type(FieldType::Integer)
            .with_range(1.0, 10.0),
    );

    for empty in [json!(null), json!(""), json!("   "), json!([])] {
        let result = engine
            .validate_field("dose", &empty, Some(&metadata), &Map::new())
            .unwrap();
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 1, "value: {empty}");
        assert_eq!(result.errors[0].kind, IssueKind::Required);
        assert_eq!(result.errors[0].rule_id.as_deref(), Some("REQUIRED"));
    }
}

#[test]
fn empty_optional_field_skips_all_other_checks() {
    let engine = engine();
    let metadata = FieldMetadata::new(
        ValidationConfig::new()
            .with_type(FieldType::Integer)
            .with_length(5, 10)
            .with_pattern(r"^\d+$"),
    );
    let result = engine
        .validate_field("weight", &json!(""), Some(&metadata), &Map::new())
        .unwrap();
    assert!(result.valid);
}

#[test]
fn range_bounds_are_inclusive_on_both_ends() {
    let engine = engine();
    let metadata = FieldMetadata::new(
        ValidationConfig::new()
            .with_type(FieldType::Integer)
            .with_range(1.0, 10.0),
    );

    for passing in [json!(1), json!(10), json!("1"), json!("10")] {
        let result = engine
            .validate_field("score", &passing, Some(&metadata), &Map::new())
            .unwrap();
        assert!(result.valid, "value {passing} should pass");
    }

    for failing in [json!(0), json!(11)] {
        let result = engine
            .validate_field("score", &failing, Some(&metadata), &Map::new())
            .unwrap();
        assert!(!result.valid, "value {failing} should fail");
        assert_eq!(result.errors[0].kind, IssueKind::Range);
    }
}

#[test]
fn all_failures_collected_without_short_circuit() {
    let engine = engine();
    let metadata = FieldMetadata::new(
        ValidationConfig::new()
            .with_type(FieldType::String)
            .with_length(5, 50)
            .with_pattern(r"^[A-Z]+$")
            .with_custom_rule(CustomRule::new("NO_X", "Value must not contain x", |v, _| {
                !crf_schema::validation::evaluators::value_as_string(v).contains('x')
            }))
            .with_custom_rule(CustomRule::new("NO_Y", "Value must not contain y", |v, _| {
                !crf_schema::validation::evaluators::value_as_string(v).contains('y')
            })),
    );

    let result = engine
        .validate_field("code", &json!("xy"), Some(&metadata), &Map::new())
        .unwrap();
    // length + pattern + both custom rules
    assert_eq!(result.errors.len(), 4);
    let kinds: Vec<_> = result.errors.iter().map(|e| e.kind).collect();
    assert!(kinds.contains(&IssueKind::Length));
    assert!(kinds.contains(&IssueKind::Pattern));
    assert_eq!(kinds.iter().filter(|k| **k == IssueKind::Custom).count(), 2);
}

#[test]
fn pattern_description_is_used_in_the_message() {
    let engine = engine();
    let metadata = FieldMetadata::new(
        ValidationConfig::new()
            .with_pattern(r"^[A-Z]{3}-\d{4}$")
            .with_pattern_description("three letters, a hyphen, four digits"),
    );
    let result = engine
        .validate_field("siteCode", &json!("bad"), Some(&metadata), &Map::new())
        .unwrap();
    assert!(
        result.errors[0]
            .message
            .contains("three letters, a hyphen, four digits")
    );
}

#[test]
fn info_severity_failures_never_block() {
    let engine = engine();
    let metadata = FieldMetadata::new(ValidationConfig::new().with_custom_rule(
        CustomRule::new("ADVISORY", "Consider adding units", |_, _| false)
            .with_severity(Severity::Info),
    ));
    let result = engine
        .validate_field("note", &json!("10"), Some(&metadata), &Map::new())
        .unwrap();
    assert!(result.valid);
    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings[0].severity, Severity::Info);
}

#[test]
fn panicking_custom_rule_becomes_a_generic_error() {
    let engine = engine();
    let metadata = FieldMetadata::new(ValidationConfig::new().with_custom_rule(CustomRule::new(
        "BROKEN",
        "unreachable",
        |_, _| panic!("boom"),
    )));
    let result = engine
        .validate_field("field", &json!("value"), Some(&metadata), &Map::new())
        .unwrap();
    assert!(!result.valid);
    assert_eq!(result.errors[0].kind, IssueKind::Custom);
    assert_eq!(result.errors[0].message, "Rule could not be evaluated");
    assert_eq!(result.errors[0].rule_id.as_deref(), Some("BROKEN"));
}

#[test]
fn invalid_pattern_is_a_rule_definition_error() {
    let engine = engine();
    let metadata = FieldMetadata::new(ValidationConfig::new().with_pattern("(unclosed"));
    let err = engine
        .validate_field("field", &json!("value"), Some(&metadata), &Map::new())
        .unwrap_err();
    assert!(matches!(err, CrfSchemaError::Rule { .. }));

    let definition = FormDefinition::new("f", "F")
        .with_field(FormField::new("field", metadata));
    assert!(engine.precompile(&definition).is_err());
}

#[test]
fn conditional_rule_applies_only_when_condition_holds() {
    let engine = engine();
    let metadata = FieldMetadata::new(ValidationConfig::new().with_conditional_rule(
        ConditionalRule::new(
            Condition::new("pregnant", ConditionOp::Equals, json!("yes")),
            ValidationConfig::required(),
        ),
    ));

    let snapshot = values(&[("pregnant", json!("no"))]);
    let result = engine
        .validate_field("lmpDate", &json!(null), Some(&metadata), &snapshot)
        .unwrap();
    assert!(result.valid);

    let snapshot = values(&[("pregnant", json!("yes"))]);
    let result = engine
        .validate_field("lmpDate", &json!(null), Some(&metadata), &snapshot)
        .unwrap();
    assert!(!result.valid);
    assert_eq!(result.errors[0].kind, IssueKind::Required);
}

#[test]
fn later_conditional_rule_wins_on_conflicting_keys() {
    let engine = engine();
    let condition = Condition::new("armed", ConditionOp::Equals, json!(true));
    let metadata = FieldMetadata::new(
        ValidationConfig::new()
            .with_conditional_rule(ConditionalRule::new(
                condition.clone(),
                ValidationConfig::new().with_required(true),
            ))
            .with_conditional_rule(ConditionalRule::new(
                condition.clone(),
                ValidationConfig::new().with_required(false),
            )),
    );
    let snapshot = values(&[("armed", json!(true))]);
    let result = engine
        .validate_field("field", &json!(null), Some(&metadata), &snapshot)
        .unwrap();
    assert!(result.valid, "later required=false must override");

    // Reversed declaration order flips the outcome.
    let metadata = FieldMetadata::new(
        ValidationConfig::new()
            .with_conditional_rule(ConditionalRule::new(
                condition.clone(),
                ValidationConfig::new().with_required(false),
            ))
            .with_conditional_rule(ConditionalRule::new(
                condition,
                ValidationConfig::new().with_required(true),
            )),
    );
    let result = engine
        .validate_field("field", &json!(null), Some(&metadata), &snapshot)
        .unwrap();
    assert!(!result.valid, "later required=true must override");
}

#[test]
fn cross_field_rule_attaches_to_first_related_field() {
    let engine = engine();
    let definition = FormDefinition::new("vitals", "Vitals")
        .with_field(FormField::new(
            "systolic",
            FieldMetadata::new(ValidationConfig::new().with_type(FieldType::Integer)),
        ))
        .with_field(FormField::new(
            "diastolic",
            FieldMetadata::new(ValidationConfig::new().with_type(FieldType::Integer)),
        ))
        .with_cross_field_rule(CrossFieldRule::new(
            "SYS_GT_DIA",
            vec!["systolic".to_string(), "diastolic".to_string()],
            "Systolic must be greater than diastolic",
            |snapshot| {
                let sys = snapshot.get("systolic").and_then(Value::as_f64);
                let dia = snapshot.get("diastolic").and_then(Value::as_f64);
                match (sys, dia) {
                    (Some(sys), Some(dia)) => sys > dia,
                    _ => true,
                }
            },
        ));

    let bad = values(&[("systolic", json!(70)), ("diastolic", json!(120))]);
    let result = engine.validate_form(&definition, &bad).unwrap();
    assert!(!result.valid);
    assert_eq!(result.errors[0].kind, IssueKind::CrossField);
    assert_eq!(result.errors[0].field, "systolic");
    assert!(result.field_errors.contains_key("systolic"));

    // Changing the related field and re-running re-evaluates the rule; no
    // stale per-field result survives between passes.
    let good = values(&[("systolic", json!(120)), ("diastolic", json!(70))]);
    let result = engine.validate_form(&definition, &good).unwrap();
    assert!(result.valid);
    assert!(result.field_errors.is_empty());
}

#[test]
fn cross_field_rule_honors_explicit_target() {
    let engine = engine();
    let definition = FormDefinition::new("f", "F").with_cross_field_rule(
        CrossFieldRule::new(
            "ALWAYS_FAILS",
            vec!["a".to_string(), "b".to_string()],
            "nope",
            |_| false,
        )
        .with_target("b"),
    );
    let result = engine.validate_form(&definition, &Map::new()).unwrap();
    assert_eq!(result.errors[0].field, "b");
}

#[test]
fn validate_form_is_idempotent() {
    let engine = engine();
    let definition =
        catalog::study_registration_form(NaiveDate::from_ymd_opt(2026, 8, 27).unwrap());
    let form_values = values(&[
        ("studyName", json!("Phase II Efficacy Study")),
        ("protocolNumber", json!("ABC-2026-001")),
        ("studyPhaseId", json!("Phase 2")),
        ("sponsor", json!("Example Pharma")),
        ("principalInvestigator", json!("Dr. Jane Doe, MD")),
        ("enrollmentTarget", json!(25000)),
    ]);

    let first = engine.validate_form(&definition, &form_values).unwrap();
    let second = engine.validate_form(&definition, &form_values).unwrap();
    assert_eq!(first, second);
}

#[test]
fn readiness_and_validity_are_independent_predicates() {
    let engine = engine();
    let metadata = FieldMetadata::new(ValidationConfig::required().with_type(FieldType::Integer));
    let definition =
        FormDefinition::new("f", "F").with_field(FormField::new("count", metadata.clone()));

    let form_values = values(&[("count", json!("abc"))]);
    let result = engine.validate_form(&definition, &form_values).unwrap();
    assert!(!result.valid);
    assert_eq!(result.errors[0].kind, IssueKind::Type);

    let mut rules = std::collections::HashMap::new();
    rules.insert("count".to_string(), metadata);
    let readiness = calculate_form_readiness(&form_values, &rules);
    assert!(readiness.ready_for_submission, "non-empty counts as present");
    assert_eq!(readiness.required_completion, 100.0);
}

fn enrollment_form() -> FormDefinition {
    let today = NaiveDate::from_ymd_opt(2026, 8, 27).unwrap();
    let adult_cutoff = NaiveDate::from_ymd_opt(2008, 8, 27).unwrap();

    FormDefinition::new("enrollment", "Subject Enrollment")
        .with_field(FormField::new(
            "subjectId",
            FieldMetadata::new(
                ValidationConfig::required()
                    .with_type(FieldType::String)
                    .with_length(3, 50)
                    .with_pattern(r"^[a-zA-Z0-9-_]+$"),
            ),
        ))
        .with_field(FormField::new(
            "dateOfBirth",
            FieldMetadata::new(
                ValidationConfig::required()
                    .with_type(FieldType::Date)
                    .with_date_bounds(None, today)
                    .with_custom_rule(CustomRule::new(
                        "MIN_AGE_18",
                        "Subject must be at least 18 years old",
                        move |value, _| {
                            crf_schema::validation::evaluators::parse_date(
                                &crf_schema::validation::evaluators::value_as_string(value),
                            )
                            .is_some_and(|dob| dob <= adult_cutoff)
                        },
                    )),
            ),
        ))
}

#[test]
fn enrollment_scenario_underage_and_short_id() {
    let engine = engine();
    let definition = enrollment_form();
    let form_values = values(&[
        ("subjectId", json!("AB")),
        ("dateOfBirth", json!("2010-01-01")),
    ]);

    let result = engine.validate_form(&definition, &form_values).unwrap();
    assert!(!result.valid);
    assert_eq!(result.errors.len(), 2);

    let subject_errors = &result.field_errors["subjectId"];
    assert_eq!(subject_errors[0].kind, IssueKind::Length);
    assert!(subject_errors[0].message.contains("at least 3 characters"));

    let dob_errors = &result.field_errors["dateOfBirth"];
    assert_eq!(dob_errors[0].kind, IssueKind::Custom);
    assert!(dob_errors[0].message.contains("at least 18 years old"));
}

#[test]
fn enrollment_scenario_valid_subject() {
    let engine = engine();
    let definition = enrollment_form();
    let form_values = values(&[
        ("subjectId", json!("SUBJ-001")),
        ("dateOfBirth", json!("1990-05-15")),
    ]);

    let result = engine.validate_form(&definition, &form_values).unwrap();
    assert!(result.valid, "errors: {:?}", result.errors);
    assert!(result.errors.is_empty());
}
