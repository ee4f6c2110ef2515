use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Severity attached to a rule failure. `Error` blocks submission,
/// `Warning` is shown but non-blocking, `Info` is advisory only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleType {
    Range,
    Consistency,
    Format,
    Business,
}

/// Boolean predicate over a field value and the full form snapshot.
/// Compiled once when the rule is built, not re-parsed per pass.
pub type Predicate = Arc<dyn Fn(&Value, &Map<String, Value>) -> bool + Send + Sync>;

/// A named custom validation rule on one field. The predicate receives the
/// field value and the current form snapshot; returning `false` records a
/// failure with this rule's message and severity.
#[derive(Clone)]
pub struct CustomRule {
    pub rule_id: String,
    pub rule_type: RuleType,
    pub message: String,
    pub severity: Severity,
    predicate: Predicate,
}

impl CustomRule {
    pub fn new(
        rule_id: impl Into<String>,
        message: impl Into<String>,
        predicate: impl Fn(&Value, &Map<String, Value>) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            rule_type: RuleType::Business,
            message: message.into(),
            severity: Severity::Error,
            predicate: Arc::new(predicate),
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_rule_type(mut self, rule_type: RuleType) -> Self {
        self.rule_type = rule_type;
        self
    }

    pub fn check(&self, value: &Value, snapshot: &Map<String, Value>) -> bool {
        (self.predicate)(value, snapshot)
    }
}

impl fmt::Debug for CustomRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomRule")
            .field("rule_id", &self.rule_id)
            .field("rule_type", &self.rule_type)
            .field("severity", &self.severity)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConditionOp {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    Contains,
    NotContains,
}

/// Declarative condition against another field in the form snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub operator: ConditionOp,
    pub comparand: Value,
}

impl Condition {
    pub fn new(field: impl Into<String>, operator: ConditionOp, comparand: Value) -> Self {
        Self {
            field: field.into(),
            operator,
            comparand,
        }
    }

    /// Evaluate against the current form snapshot. An absent field only
    /// satisfies `NotEquals` and `NotContains`.
    pub fn evaluate(&self, snapshot: &Map<String, Value>) -> bool {
        let actual = snapshot.get(&self.field);
        match self.operator {
            ConditionOp::Equals => actual == Some(&self.comparand),
            ConditionOp::NotEquals => actual != Some(&self.comparand),
            ConditionOp::GreaterThan => match (actual.and_then(as_f64), as_f64(&self.comparand)) {
                (Some(a), Some(b)) => a > b,
                _ => false,
            },
            ConditionOp::LessThan => match (actual.and_then(as_f64), as_f64(&self.comparand)) {
                (Some(a), Some(b)) => a < b,
                _ => false,
            },
            ConditionOp::Contains => contains(actual, &self.comparand),
            ConditionOp::NotContains => !contains(actual, &self.comparand),
        }
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn contains(actual: Option<&Value>, comparand: &Value) -> bool {
    match actual {
        Some(Value::String(s)) => comparand.as_str().is_some_and(|c| s.contains(c)),
        Some(Value::Array(items)) => items.contains(comparand),
        _ => false,
    }
}

/// Conditional validation: when `condition` holds against the current
/// snapshot, `patch` is shallow-merged into the field's active rule set.
/// Conditions are re-evaluated on every pass, never cached.
#[derive(Debug, Clone)]
pub struct ConditionalRule {
    pub condition: Condition,
    pub patch: super::metadata::ValidationConfig,
}

impl ConditionalRule {
    pub fn new(condition: Condition, patch: super::metadata::ValidationConfig) -> Self {
        Self { condition, patch }
    }
}

/// Form-level rule whose predicate spans multiple fields. Evaluated once per
/// form pass; a failure attaches to `target`, or to the first entry of
/// `related_fields` when no explicit target is given.
#[derive(Clone)]
pub struct CrossFieldRule {
    pub rule_id: String,
    pub related_fields: Vec<String>,
    pub message: String,
    pub severity: Severity,
    pub target: Option<String>,
    predicate: Arc<dyn Fn(&Map<String, Value>) -> bool + Send + Sync>,
}

impl CrossFieldRule {
    pub fn new(
        rule_id: impl Into<String>,
        related_fields: Vec<String>,
        message: impl Into<String>,
        predicate: impl Fn(&Map<String, Value>) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            related_fields,
            message: message.into(),
            severity: Severity::Error,
            target: None,
            predicate: Arc::new(predicate),
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn check(&self, snapshot: &Map<String, Value>) -> bool {
        (self.predicate)(snapshot)
    }

    /// Field that receives this rule's failures.
    pub fn target_field(&self) -> &str {
        self.target
            .as_deref()
            .or_else(|| self.related_fields.first().map(String::as_str))
            .unwrap_or("")
    }
}

impl fmt::Debug for CrossFieldRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrossFieldRule")
            .field("rule_id", &self.rule_id)
            .field("related_fields", &self.related_fields)
            .field("severity", &self.severity)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

/// Outcome of a single async rule check.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleOutcome {
    Pass,
    Fail { message: String, severity: Severity },
}

impl RuleOutcome {
    pub fn fail(message: impl Into<String>) -> Self {
        Self::Fail {
            message: message.into(),
            severity: Severity::Error,
        }
    }
}

/// Async custom-rule hook, e.g. a duplicate protocol-number check against a
/// backend service. The underlying I/O may not support abort; staleness is
/// handled by the runner discarding superseded results.
#[async_trait]
pub trait AsyncRule: Send + Sync {
    fn rule_id(&self) -> &str;

    async fn check(
        &self,
        value: &Value,
        snapshot: &Map<String, Value>,
    ) -> std::result::Result<RuleOutcome, Box<dyn std::error::Error + Send + Sync>>;
}

/// Soft data-quality range check. Out-of-range values land in the error or
/// warning bucket depending on `action`, carrying `check_id` as the rule id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeCheck {
    pub check_id: String,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub message: Option<String>,
    pub action: RangeAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeAction {
    Warn,
    Error,
}

impl RangeCheck {
    pub fn new(check_id: impl Into<String>, min: Option<f64>, max: Option<f64>) -> Self {
        Self {
            check_id: check_id.into(),
            min,
            max,
            message: None,
            action: RangeAction::Warn,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_action(mut self, action: RangeAction) -> Self {
        self.action = action;
        self
    }
}
