use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::rules::{AsyncRule, ConditionalRule, CustomRule, RangeCheck};

/// Expected data type of a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Integer,
    Decimal,
    Date,
    Datetime,
    Time,
    Email,
    Phone,
    Url,
}

/// Declarative validation rules for one field. All fields are optional; an
/// empty config accepts any value. Conditional rules may patch any of the
/// declarative fields at evaluation time, so accessors always read the
/// post-merge active config.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationConfig {
    pub required: Option<bool>,

    #[serde(rename = "type")]
    pub field_type: Option<FieldType>,

    pub min_length: Option<usize>,
    pub max_length: Option<usize>,

    pub min_value: Option<f64>,
    pub max_value: Option<f64>,

    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
    pub allow_future_dates: Option<bool>,

    pub pattern: Option<String>,
    pub pattern_description: Option<String>,

    pub decimal_places: Option<u32>,
    pub allow_negative: Option<bool>,

    #[serde(skip)]
    pub custom_rules: Vec<CustomRule>,

    #[serde(skip)]
    pub conditional_rules: Vec<ConditionalRule>,

    #[serde(skip)]
    pub async_rules: Vec<Arc<dyn AsyncRule>>,
}

impl ValidationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required() -> Self {
        Self {
            required: Some(true),
            ..Self::default()
        }
    }

    pub fn is_required(&self) -> bool {
        self.required.unwrap_or(false)
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn with_type(mut self, field_type: FieldType) -> Self {
        self.field_type = Some(field_type);
        self
    }

    pub fn with_length(mut self, min: impl Into<Option<usize>>, max: impl Into<Option<usize>>) -> Self {
        self.min_length = min.into();
        self.max_length = max.into();
        self
    }

    pub fn with_range(mut self, min: impl Into<Option<f64>>, max: impl Into<Option<f64>>) -> Self {
        self.min_value = min.into();
        self.max_value = max.into();
        self
    }

    pub fn with_date_bounds(
        mut self,
        min: impl Into<Option<NaiveDate>>,
        max: impl Into<Option<NaiveDate>>,
    ) -> Self {
        self.min_date = min.into();
        self.max_date = max.into();
        self
    }

    pub fn with_allow_future_dates(mut self, allow: bool) -> Self {
        self.allow_future_dates = Some(allow);
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn with_pattern_description(mut self, description: impl Into<String>) -> Self {
        self.pattern_description = Some(description.into());
        self
    }

    pub fn with_decimal_places(mut self, places: u32) -> Self {
        self.decimal_places = Some(places);
        self
    }

    pub fn with_allow_negative(mut self, allow: bool) -> Self {
        self.allow_negative = Some(allow);
        self
    }

    pub fn with_custom_rule(mut self, rule: CustomRule) -> Self {
        self.custom_rules.push(rule);
        self
    }

    pub fn with_conditional_rule(mut self, rule: ConditionalRule) -> Self {
        self.conditional_rules.push(rule);
        self
    }

    pub fn with_async_rule(mut self, rule: Arc<dyn AsyncRule>) -> Self {
        self.async_rules.push(rule);
        self
    }

    /// Shallow-merge `patch` into this config. Keys present in the patch
    /// override existing values; rule lists are replaced when non-empty.
    /// Applying patches in declaration order gives last-applied-wins.
    pub fn apply(&mut self, patch: &ValidationConfig) {
        macro_rules! take {
            ($field:ident) => {
                if patch.$field.is_some() {
                    self.$field = patch.$field.clone();
                }
            };
        }
        take!(required);
        take!(field_type);
        take!(min_length);
        take!(max_length);
        take!(min_value);
        take!(max_value);
        take!(min_date);
        take!(max_date);
        take!(allow_future_dates);
        take!(pattern);
        take!(pattern_description);
        take!(decimal_places);
        take!(allow_negative);
        if !patch.custom_rules.is_empty() {
            self.custom_rules = patch.custom_rules.clone();
        }
        if !patch.async_rules.is_empty() {
            self.async_rules = patch.async_rules.clone();
        }
        // Nested conditional rules are not merged; conditions apply one
        // level deep, matching the declared metadata shape.
    }
}

impl fmt::Debug for ValidationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationConfig")
            .field("required", &self.required)
            .field("field_type", &self.field_type)
            .field("min_length", &self.min_length)
            .field("max_length", &self.max_length)
            .field("min_value", &self.min_value)
            .field("max_value", &self.max_value)
            .field("pattern", &self.pattern)
            .field("custom_rules", &self.custom_rules.len())
            .field("conditional_rules", &self.conditional_rules.len())
            .field("async_rules", &self.async_rules.len())
            .finish_non_exhaustive()
    }
}

/// UI display configuration. Carried with the field but not interpreted by
/// the validation engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiConfig {
    pub placeholder: Option<String>,
    pub help_text: Option<String>,
    pub units: Option<String>,
    #[serde(default)]
    pub options: Vec<FieldOption>,
    pub read_only: Option<bool>,
    pub hidden: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldOption {
    pub value: String,
    pub label: String,
    pub coding_value: Option<String>,
    pub coding_system: Option<String>,
}

/// Clinical significance flags. Metadata only; the engine records but does
/// not enforce them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalFlags {
    pub sdv_required: bool,
    pub medical_review_required: bool,
    pub critical_data_point: bool,
    pub safety_data_point: bool,
}

/// Data-quality rules evaluated alongside validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQualityRules {
    #[serde(default)]
    pub range_checks: Vec<RangeCheck>,
}

/// Complete metadata contract for one form field. Immutable once the owning
/// form version leaves DRAFT.
#[derive(Debug, Clone, Default)]
pub struct FieldMetadata {
    pub validation: ValidationConfig,
    pub ui: Option<UiConfig>,
    pub clinical: Option<ClinicalFlags>,
    pub data_quality: Option<DataQualityRules>,
    pub description: Option<String>,
}

impl FieldMetadata {
    pub fn new(validation: ValidationConfig) -> Self {
        Self {
            validation,
            ui: None,
            clinical: None,
            data_quality: None,
            description: None,
        }
    }

    pub fn with_ui(mut self, ui: UiConfig) -> Self {
        self.ui = Some(ui);
        self
    }

    pub fn with_clinical(mut self, clinical: ClinicalFlags) -> Self {
        self.clinical = Some(clinical);
        self
    }

    pub fn with_data_quality(mut self, data_quality: DataQualityRules) -> Self {
        self.data_quality = Some(data_quality);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
