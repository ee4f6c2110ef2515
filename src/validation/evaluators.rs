//! Stateless rule evaluators, one per rule category. Each takes the field
//! value (and whatever slice of config it needs) and reports failures as
//! issues; none of them ever panics or returns `Err` for a business-rule
//! failure.

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;
use url::Url;

use super::{IssueKind, ValidationIssue};
use crate::catalog::patterns;
use crate::types::{FieldType, RangeAction, RangeCheck, ValidationConfig};

/// Presence check shared by the required evaluator and the readiness
/// calculator: null, blank strings and empty multi-select arrays are absent;
/// booleans (checkboxes) always count as present.
pub fn has_value(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}

/// String rendering used for pattern and format checks.
pub fn value_as_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Numeric coercion: numbers pass through, numeric strings parse.
pub fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn check_required(field_id: &str, value: &Value, config: &ValidationConfig) -> Option<ValidationIssue> {
    if config.is_required() && !has_value(value) {
        return Some(
            ValidationIssue::error(field_id, IssueKind::Required, "This field is required")
                .with_rule_id("REQUIRED"),
        );
    }
    None
}

pub fn check_type(field_id: &str, value: &Value, field_type: FieldType) -> Option<ValidationIssue> {
    let s = value_as_string(value);
    let failure = |message: &str, rule_id: &str| {
        Some(ValidationIssue::error(field_id, IssueKind::Type, message).with_rule_id(rule_id))
    };

    match field_type {
        // Any value renders as a string.
        FieldType::String => None,
        FieldType::Integer => match value {
            Value::Number(n) => {
                if n.as_f64().is_some_and(|f| f.fract() == 0.0) {
                    None
                } else {
                    failure("Value must be an integer", "TYPE_INTEGER")
                }
            }
            _ => {
                if s.trim().parse::<i64>().is_ok() {
                    None
                } else {
                    failure("Value must be an integer", "TYPE_INTEGER")
                }
            }
        },
        FieldType::Decimal => {
            if value_as_f64(value).is_some() {
                None
            } else {
                failure("Value must be a number", "TYPE_DECIMAL")
            }
        }
        FieldType::Date => {
            if parse_date(&s).is_some() {
                None
            } else {
                failure("Invalid date format", "TYPE_DATE")
            }
        }
        FieldType::Datetime => {
            if parse_datetime(&s).is_some() {
                None
            } else {
                failure("Invalid date/time format", "TYPE_DATETIME")
            }
        }
        FieldType::Time => {
            if parse_time(&s).is_some() {
                None
            } else {
                failure("Invalid time format", "TYPE_TIME")
            }
        }
        FieldType::Email => {
            if patterns::EMAIL.is_match(&s) {
                None
            } else {
                failure("Invalid email format", "TYPE_EMAIL")
            }
        }
        FieldType::Phone => {
            if patterns::PHONE.is_match(&s) {
                None
            } else {
                failure("Invalid phone number format", "TYPE_PHONE")
            }
        }
        FieldType::Url => {
            if Url::parse(&s).is_ok() {
                None
            } else {
                failure("Invalid URL format", "TYPE_URL")
            }
        }
    }
}

pub fn check_length(field_id: &str, value: &Value, config: &ValidationConfig) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let Value::String(s) = value else {
        return issues;
    };
    let len = s.chars().count();

    if let Some(min) = config.min_length
        && min > 0
        && len < min
    {
        issues.push(
            ValidationIssue::error(
                field_id,
                IssueKind::Length,
                format!("Must be at least {min} characters"),
            )
            .with_rule_id("MIN_LENGTH"),
        );
    }
    if let Some(max) = config.max_length
        && max > 0
        && len > max
    {
        issues.push(
            ValidationIssue::error(
                field_id,
                IssueKind::Length,
                format!("Must be at most {max} characters"),
            )
            .with_rule_id("MAX_LENGTH"),
        );
    }
    issues
}

/// Numeric bounds (inclusive on both ends), decimal precision and sign.
pub fn check_numeric(field_id: &str, value: &Value, config: &ValidationConfig) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let Some(num) = value_as_f64(value) else {
        return issues;
    };

    if let Some(min) = config.min_value
        && num < min
    {
        issues.push(
            ValidationIssue::error(
                field_id,
                IssueKind::Range,
                format!("Value must be at least {min}"),
            )
            .with_rule_id("MIN_VALUE"),
        );
    }
    if let Some(max) = config.max_value
        && num > max
    {
        issues.push(
            ValidationIssue::error(
                field_id,
                IssueKind::Range,
                format!("Value must be at most {max}"),
            )
            .with_rule_id("MAX_VALUE"),
        );
    }

    if let Some(places) = config.decimal_places {
        let rendered = value_as_string(value);
        if let Some((_, frac)) = rendered.split_once('.')
            && frac.trim_end_matches('0').len() > places as usize
        {
            issues.push(
                ValidationIssue::error(
                    field_id,
                    IssueKind::Type,
                    format!("Maximum {places} decimal places allowed"),
                )
                .with_rule_id("DECIMAL_PLACES"),
            );
        }
    }

    if config.allow_negative == Some(false) && num < 0.0 {
        issues.push(
            ValidationIssue::error(field_id, IssueKind::Type, "Negative values are not allowed")
                .with_rule_id("NO_NEGATIVE"),
        );
    }

    issues
}

pub fn check_pattern(
    field_id: &str,
    value: &Value,
    regex: &regex::Regex,
    config: &ValidationConfig,
) -> Option<ValidationIssue> {
    if regex.is_match(&value_as_string(value)) {
        return None;
    }
    let message = match &config.pattern_description {
        Some(description) => format!("Invalid format. Expected: {description}"),
        None => "Value does not match the required format".to_string(),
    };
    Some(ValidationIssue::error(field_id, IssueKind::Pattern, message).with_rule_id("PATTERN"))
}

/// Clinical date rules for date/datetime fields: no future dates unless
/// explicitly allowed, verification warnings for implausible dates, and
/// explicit date bounds.
pub fn check_dates(
    field_id: &str,
    value: &Value,
    config: &ValidationConfig,
    today: NaiveDate,
) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let Some(date) = parse_date(&value_as_string(value)) else {
        return issues;
    };

    let allow_future = config.allow_future_dates.unwrap_or(false);
    if !allow_future && date > today {
        issues.push(
            ValidationIssue::error(field_id, IssueKind::Range, "Date cannot be in the future")
                .with_rule_id("DATE_FUTURE"),
        );
    }

    if let Some(hundred_years_ago) = today.checked_sub_days(Days::new(36525))
        && date < hundred_years_ago
    {
        issues.push(
            ValidationIssue::warning(
                field_id,
                IssueKind::Range,
                "Date is more than 100 years ago. Please verify.",
            )
            .with_rule_id("DATE_VERY_OLD"),
        );
    }

    if allow_future
        && let Some(one_year_ahead) = today.checked_add_days(Days::new(366))
        && date > one_year_ahead
    {
        issues.push(
            ValidationIssue::warning(
                field_id,
                IssueKind::Range,
                "Date is more than 1 year in the future. Please verify.",
            )
            .with_rule_id("DATE_FAR_FUTURE"),
        );
    }

    if let Some(min_date) = config.min_date
        && date < min_date
    {
        issues.push(
            ValidationIssue::error(
                field_id,
                IssueKind::Range,
                format!("Date must be on or after {min_date}"),
            )
            .with_rule_id("DATE_MIN"),
        );
    }
    if let Some(max_date) = config.max_date
        && date > max_date
    {
        issues.push(
            ValidationIssue::error(
                field_id,
                IssueKind::Range,
                format!("Date must be on or before {max_date}"),
            )
            .with_rule_id("DATE_MAX"),
        );
    }

    issues
}

/// Soft data-quality range checks; skipped entirely for non-numeric values.
pub fn check_quality_ranges(
    field_id: &str,
    value: &Value,
    checks: &[RangeCheck],
) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let Some(num) = value_as_f64(value) else {
        return issues;
    };

    for check in checks {
        let below = check.min.is_some_and(|min| num < min);
        let above = check.max.is_some_and(|max| num > max);
        if !(below || above) {
            continue;
        }
        let message = check
            .message
            .clone()
            .unwrap_or_else(|| "Value outside expected range".to_string());
        let issue = match check.action {
            RangeAction::Error => ValidationIssue::error(field_id, IssueKind::Range, message),
            RangeAction::Warn => ValidationIssue::warning(field_id, IssueKind::Range, message),
        };
        issues.push(issue.with_rule_id(&check.check_id));
    }

    issues
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_datetime(s).map(|dt| dt.date()))
}

pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M"))
        .ok()
}

pub fn parse_time(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}
