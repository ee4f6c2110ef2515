use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::RwLock;

use chrono::NaiveDate;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::async_rules::{AsyncPassOutcome, AsyncRuleRunner};
use super::evaluators::{
    check_dates, check_length, check_numeric, check_pattern, check_required, check_type, has_value,
};
use super::{FieldValidationResult, FormValidationResult, IssueKind, ValidationIssue};
use crate::error::{CrfSchemaError, Result};
use crate::types::{
    CrossFieldRule, CustomRule, FieldMetadata, FieldType, FormDefinition, Severity,
    ValidationConfig,
};

/// Validation engine for CRF field metadata. Each pass is a pure function of
/// its inputs; the engine itself only carries the compiled-pattern cache and
/// an optional fixed "today" for deterministic date rules.
pub struct FormValidationEngine {
    patterns: RwLock<HashMap<String, Regex>>,
    today: Option<NaiveDate>,
}

impl FormValidationEngine {
    pub fn new() -> Self {
        Self {
            patterns: RwLock::new(HashMap::new()),
            today: None,
        }
    }

    /// Pin the reference date used by clinical date rules. Without this the
    /// engine uses the local calendar date at validation time.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    /// Compile every pattern a definition can reach, including patterns
    /// inside conditional patches, so malformed rules surface at load time
    /// instead of mid-pass.
    pub fn precompile(&self, definition: &FormDefinition) -> Result<()> {
        definition.validate_structure()?;
        for field in &definition.fields {
            self.precompile_config(&field.metadata.validation)?;
        }
        Ok(())
    }

    fn precompile_config(&self, config: &ValidationConfig) -> Result<()> {
        if let Some(pattern) = &config.pattern {
            self.regex_for(pattern)?;
        }
        for conditional in &config.conditional_rules {
            self.precompile_config(&conditional.patch)?;
        }
        Ok(())
    }

    /// Cached regex lookup; compiles and caches on first use. An invalid
    /// pattern is a rule-definition error, not a validation finding.
    fn regex_for(&self, pattern: &str) -> Result<Regex> {
        if let Some(regex) = self
            .patterns
            .read()
            .map_err(|_| CrfSchemaError::rule("pattern cache poisoned"))?
            .get(pattern)
        {
            return Ok(regex.clone());
        }
        let regex = Regex::new(pattern)
            .map_err(|e| CrfSchemaError::rule(format!("Invalid pattern '{pattern}': {e}")))?;
        self.patterns
            .write()
            .map_err(|_| CrfSchemaError::rule("pattern cache poisoned"))?
            .insert(pattern.to_string(), regex.clone());
        Ok(regex)
    }

    /// Resolve the active rule set for a field: evaluate every conditional
    /// rule's condition against the *current* snapshot and shallow-merge the
    /// patches of the true ones, in declaration order (last applied wins).
    fn active_config(
        &self,
        config: &ValidationConfig,
        snapshot: &Map<String, Value>,
    ) -> ValidationConfig {
        if config.conditional_rules.is_empty() {
            return config.clone();
        }
        let mut active = config.clone();
        for conditional in &config.conditional_rules {
            if conditional.condition.evaluate(snapshot) {
                active.apply(&conditional.patch);
            }
        }
        active
    }

    /// Validate one field value against its metadata. Evaluators run in a
    /// fixed order (required, type, length/range, pattern, custom) and every
    /// failure is collected; nothing short-circuits.
    pub fn validate_field(
        &self,
        field_id: &str,
        value: &Value,
        metadata: Option<&FieldMetadata>,
        snapshot: &Map<String, Value>,
    ) -> Result<FieldValidationResult> {
        let Some(metadata) = metadata else {
            return Ok(FieldValidationResult::pass());
        };

        let active = self.active_config(&metadata.validation, snapshot);
        let mut issues = Vec::new();

        // An absent value can only fail the required check; the remaining
        // evaluators need a value to inspect.
        if !has_value(value) {
            issues.extend(check_required(field_id, value, &active));
            return Ok(FieldValidationResult::from_issues(issues));
        }

        if let Some(field_type) = active.field_type {
            issues.extend(check_type(field_id, value, field_type));
            if matches!(field_type, FieldType::Date | FieldType::Datetime) {
                issues.extend(check_dates(field_id, value, &active, self.today()));
            }
        }

        issues.extend(check_length(field_id, value, &active));
        issues.extend(check_numeric(field_id, value, &active));

        if let Some(pattern) = &active.pattern {
            let regex = self.regex_for(pattern)?;
            issues.extend(check_pattern(field_id, value, &regex, &active));
        }

        for rule in &active.custom_rules {
            issues.extend(self.run_custom_rule(field_id, value, snapshot, rule));
        }

        if let Some(data_quality) = &metadata.data_quality {
            issues.extend(super::evaluators::check_quality_ranges(
                field_id,
                value,
                &data_quality.range_checks,
            ));
        }

        Ok(FieldValidationResult::from_issues(issues))
    }

    /// Validate one field including the async rules declared in its active
    /// config. The synchronous evaluators run first, then every async rule is
    /// awaited through `runner` before the pass is finalized; a pass that was
    /// superseded mid-flight is discarded, not merged. Absent values skip the
    /// async rules the same way they skip every evaluator but `required`.
    pub async fn validate_field_async(
        &self,
        runner: &AsyncRuleRunner,
        field_id: &str,
        value: &Value,
        metadata: Option<&FieldMetadata>,
        snapshot: &Map<String, Value>,
    ) -> Result<AsyncPassOutcome> {
        let sync = self.validate_field(field_id, value, metadata, snapshot)?;

        let Some(metadata) = metadata else {
            return Ok(AsyncPassOutcome::Completed(sync));
        };
        let active = self.active_config(&metadata.validation, snapshot);
        if active.async_rules.is_empty() || !has_value(value) {
            return Ok(AsyncPassOutcome::Completed(sync));
        }

        match runner
            .validate_field(field_id, value, snapshot, &active.async_rules)
            .await
        {
            AsyncPassOutcome::Superseded => Ok(AsyncPassOutcome::Superseded),
            AsyncPassOutcome::Completed(hooks) => {
                let mut issues = sync.errors;
                issues.extend(sync.warnings);
                issues.extend(hooks.errors);
                issues.extend(hooks.warnings);
                Ok(AsyncPassOutcome::Completed(FieldValidationResult::from_issues(issues)))
            }
        }
    }

    /// All custom rules run and all failures are collected so the user sees
    /// every violated rule at once. A panicking predicate is converted into a
    /// generic custom error instead of aborting the pass.
    fn run_custom_rule(
        &self,
        field_id: &str,
        value: &Value,
        snapshot: &Map<String, Value>,
        rule: &CustomRule,
    ) -> Option<ValidationIssue> {
        match catch_unwind(AssertUnwindSafe(|| rule.check(value, snapshot))) {
            Ok(true) => None,
            Ok(false) => {
                let issue = match rule.severity {
                    Severity::Error => {
                        ValidationIssue::error(field_id, IssueKind::Custom, &rule.message)
                    }
                    Severity::Warning => {
                        ValidationIssue::warning(field_id, IssueKind::Custom, &rule.message)
                    }
                    Severity::Info => {
                        ValidationIssue::info(field_id, IssueKind::Custom, &rule.message)
                    }
                };
                Some(issue.with_rule_id(&rule.rule_id))
            }
            Err(_) => {
                warn!(field = field_id, rule = %rule.rule_id, "custom rule panicked");
                Some(
                    ValidationIssue::error(
                        field_id,
                        IssueKind::Custom,
                        "Rule could not be evaluated",
                    )
                    .with_rule_id(&rule.rule_id),
                )
            }
        }
    }

    /// Validate a complete form: every declared field in order, then the
    /// form-level cross-field rules once against the snapshot. Re-running
    /// with identical inputs yields an identical result; nothing is cached
    /// between passes.
    pub fn validate_form(
        &self,
        definition: &FormDefinition,
        values: &Map<String, Value>,
    ) -> Result<FormValidationResult> {
        debug!(
            form = %definition.id,
            fields = definition.fields.len(),
            "validating form"
        );

        let mut result = FormValidationResult::pass();

        for field in &definition.fields {
            let value = values.get(&field.id).unwrap_or(&Value::Null);
            let field_result =
                self.validate_field(&field.id, value, Some(&field.metadata), values)?;
            result.push_field(&field.id, field_result);
        }

        for rule in &definition.cross_field_rules {
            if let Some(issue) = self.run_cross_field_rule(rule, values) {
                let target = issue.field.clone();
                result.push_field(&target, FieldValidationResult::from_issues(vec![issue]));
            }
        }

        debug!(
            form = %definition.id,
            valid = result.valid,
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            "form validation finished"
        );

        Ok(result)
    }

    fn run_cross_field_rule(
        &self,
        rule: &CrossFieldRule,
        values: &Map<String, Value>,
    ) -> Option<ValidationIssue> {
        match catch_unwind(AssertUnwindSafe(|| rule.check(values))) {
            Ok(true) => None,
            Ok(false) => {
                let issue = match rule.severity {
                    Severity::Error => ValidationIssue::error(
                        rule.target_field(),
                        IssueKind::CrossField,
                        &rule.message,
                    ),
                    Severity::Warning => ValidationIssue::warning(
                        rule.target_field(),
                        IssueKind::CrossField,
                        &rule.message,
                    ),
                    Severity::Info => ValidationIssue::info(
                        rule.target_field(),
                        IssueKind::CrossField,
                        &rule.message,
                    ),
                };
                Some(issue.with_rule_id(&rule.rule_id))
            }
            Err(_) => {
                warn!(rule = %rule.rule_id, "cross-field rule panicked");
                Some(
                    ValidationIssue::error(
                        rule.target_field(),
                        IssueKind::CrossField,
                        "Rule could not be evaluated",
                    )
                    .with_rule_id(&rule.rule_id),
                )
            }
        }
    }
}

impl Default for FormValidationEngine {
    fn default() -> Self {
        Self::new()
    }
}
