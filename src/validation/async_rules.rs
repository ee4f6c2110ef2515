//! Async custom-rule execution with cancellation by staleness.
//!
//! Some rule hooks (duplicate protocol-number checks, coded-term lookups) go
//! over the network and cannot be aborted. Instead, every validation pass for
//! a field gets a sequence number; when a pass finishes, its result is kept
//! only if no newer pass for that field has started in the meantime.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use futures::future::join_all;
use serde_json::{Map, Value};
use tracing::debug;

use super::{FieldValidationResult, IssueKind, ValidationIssue};
use crate::types::{AsyncRule, RuleOutcome, Severity};

/// Outcome of an async validation pass for one field.
#[derive(Debug, Clone, PartialEq)]
pub enum AsyncPassOutcome {
    /// This pass is still the latest; its result stands.
    Completed(FieldValidationResult),
    /// A newer pass started while this one was in flight; the result must be
    /// discarded, not merged.
    Superseded,
}

/// Runs async rules for fields, keyed by `(field id, pass sequence number)`.
#[derive(Debug, Default)]
pub struct AsyncRuleRunner {
    passes: Mutex<HashMap<String, u64>>,
}

impl AsyncRuleRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new pass for a field, invalidating any in-flight older pass.
    pub fn begin_pass(&self, field_id: &str) -> u64 {
        let mut passes = lock(&self.passes);
        let seq = passes.entry(field_id.to_string()).or_insert(0);
        *seq += 1;
        *seq
    }

    fn is_current(&self, field_id: &str, seq: u64) -> bool {
        lock(&self.passes).get(field_id).copied() == Some(seq)
    }

    /// Run every async rule for one field and finalize the pass. The rules
    /// run concurrently but all are awaited before the result is produced; a
    /// rejected or erroring hook is surfaced as an `async-failure` error
    /// rather than swallowed.
    pub async fn validate_field(
        &self,
        field_id: &str,
        value: &Value,
        snapshot: &Map<String, Value>,
        rules: &[Arc<dyn AsyncRule>],
    ) -> AsyncPassOutcome {
        let seq = self.begin_pass(field_id);
        let mut issues = Vec::new();

        let outcomes = join_all(rules.iter().map(|rule| rule.check(value, snapshot))).await;
        for (rule, outcome) in rules.iter().zip(outcomes) {
            match outcome {
                Ok(RuleOutcome::Pass) => {}
                Ok(RuleOutcome::Fail { message, severity }) => {
                    let issue = match severity {
                        Severity::Error => {
                            ValidationIssue::error(field_id, IssueKind::Custom, message)
                        }
                        Severity::Warning => {
                            ValidationIssue::warning(field_id, IssueKind::Custom, message)
                        }
                        Severity::Info => {
                            ValidationIssue::info(field_id, IssueKind::Custom, message)
                        }
                    };
                    issues.push(issue.with_rule_id(rule.rule_id()));
                }
                Err(error) => {
                    debug!(field = field_id, rule = %rule.rule_id(), %error, "async rule failed");
                    issues.push(
                        ValidationIssue::error(
                            field_id,
                            IssueKind::AsyncFailure,
                            "Validation could not be completed",
                        )
                        .with_rule_id(rule.rule_id()),
                    );
                }
            }
        }

        if !self.is_current(field_id, seq) {
            debug!(field = field_id, seq, "async pass superseded");
            return AsyncPassOutcome::Superseded;
        }
        AsyncPassOutcome::Completed(FieldValidationResult::from_issues(issues))
    }
}

fn lock(passes: &Mutex<HashMap<String, u64>>) -> std::sync::MutexGuard<'_, HashMap<String, u64>> {
    passes.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
