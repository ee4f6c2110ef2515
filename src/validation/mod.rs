pub mod async_rules;
pub mod engine;
pub mod evaluators;
pub mod readiness;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::Severity;

pub use async_rules::{AsyncPassOutcome, AsyncRuleRunner};
pub use engine::FormValidationEngine;
pub use readiness::{FormReadiness, calculate_form_readiness};

/// Kind of a validation failure. Failures are data, never exceptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueKind {
    Required,
    Type,
    Length,
    Range,
    Pattern,
    Custom,
    CrossField,
    AsyncFailure,
}

/// One validation finding on one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub field: String,
    pub kind: IssueKind,
    pub message: String,
    pub severity: Severity,
    pub rule_id: Option<String>,
}

impl ValidationIssue {
    pub fn error(field: impl Into<String>, kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind,
            message: message.into(),
            severity: Severity::Error,
            rule_id: None,
        }
    }

    pub fn warning(field: impl Into<String>, kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind,
            message: message.into(),
            severity: Severity::Warning,
            rule_id: None,
        }
    }

    pub fn info(field: impl Into<String>, kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind,
            message: message.into(),
            severity: Severity::Info,
            rule_id: None,
        }
    }

    pub fn with_rule_id(mut self, rule_id: impl Into<String>) -> Self {
        self.rule_id = Some(rule_id.into());
        self
    }

    pub fn is_blocking(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Result of validating one field. `valid` is true iff `errors` is empty;
/// warnings (including info-severity findings) never affect it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl FieldValidationResult {
    /// Split a flat issue list into error and warning buckets.
    pub fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        let (errors, warnings): (Vec<_>, Vec<_>) =
            issues.into_iter().partition(ValidationIssue::is_blocking);
        Self {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    pub fn pass() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

/// Aggregated result of a full form pass. Flat lists preserve field
/// declaration order; the per-field maps give O(1) lookup for the UI.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FormValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub field_errors: HashMap<String, Vec<ValidationIssue>>,
    pub field_warnings: HashMap<String, Vec<ValidationIssue>>,
}

impl FormValidationResult {
    pub fn pass() -> Self {
        Self {
            valid: true,
            ..Self::default()
        }
    }

    pub(crate) fn push_field(&mut self, field_id: &str, result: FieldValidationResult) {
        if !result.errors.is_empty() {
            self.errors.extend(result.errors.iter().cloned());
            self.field_errors
                .entry(field_id.to_string())
                .or_default()
                .extend(result.errors);
        }
        if !result.warnings.is_empty() {
            self.warnings.extend(result.warnings.iter().cloned());
            self.field_warnings
                .entry(field_id.to_string())
                .or_default()
                .extend(result.warnings);
        }
        self.valid = self.errors.is_empty();
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    pub fn error_messages(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.message.as_str()).collect()
    }

    pub fn warning_messages(&self) -> Vec<&str> {
        self.warnings.iter().map(|w| w.message.as_str()).collect()
    }

    /// Findings of a given severity, across both buckets.
    pub fn by_severity(&self, severity: Severity) -> Vec<&ValidationIssue> {
        self.errors
            .iter()
            .chain(self.warnings.iter())
            .filter(|i| i.severity == severity)
            .collect()
    }

    /// One-line display summary.
    pub fn summary(&self) -> String {
        if self.valid && self.warnings.is_empty() {
            return "Form is valid".to_string();
        }
        let mut message = if self.valid {
            "Form is valid".to_string()
        } else {
            format!("Validation failed: {} error(s)", self.errors.len())
        };
        if !self.warnings.is_empty() {
            message.push_str(&format!(", {} warning(s)", self.warnings.len()));
        }
        message
    }
}
