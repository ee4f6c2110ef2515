use std::collections::HashSet;
use std::fmt;

use super::metadata::FieldMetadata;
use super::rules::CrossFieldRule;

/// One field in a form definition, carrying its metadata contract.
#[derive(Debug, Clone)]
pub struct FormField {
    pub id: String,
    pub label: String,
    pub metadata: FieldMetadata,
}

impl FormField {
    pub fn new(id: impl Into<String>, metadata: FieldMetadata) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            metadata,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

/// Ordered form definition: field declaration order is display order and the
/// order issues are reported in. A new version is a new definition, never a
/// mutation of a published one.
#[derive(Debug, Clone, Default)]
pub struct FormDefinition {
    pub id: String,
    pub name: String,
    pub version: Option<String>,
    pub fields: Vec<FormField>,
    pub cross_field_rules: Vec<CrossFieldRule>,
}

impl FormDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version: None,
            fields: Vec::new(),
            cross_field_rules: Vec::new(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_field(mut self, field: FormField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_cross_field_rule(mut self, rule: CrossFieldRule) -> Self {
        self.cross_field_rules.push(rule);
        self
    }

    pub fn field(&self, field_id: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.id == field_id)
    }

    /// Structural sanity check on the definition itself: non-empty field ids,
    /// no duplicates, cross-field rules naming at least one field.
    pub fn validate_structure(&self) -> crate::Result<()> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.id.is_empty() {
                return Err(crate::CrfSchemaError::definition(
                    "Field id cannot be empty",
                ));
            }
            if !seen.insert(field.id.as_str()) {
                return Err(crate::CrfSchemaError::definition(format!(
                    "Duplicate field id: {}",
                    field.id
                )));
            }
        }

        for rule in &self.cross_field_rules {
            if rule.target.is_none() && rule.related_fields.is_empty() {
                return Err(crate::CrfSchemaError::rule(format!(
                    "Cross-field rule '{}' names no fields",
                    rule.rule_id
                )));
            }
        }

        Ok(())
    }
}

impl fmt::Display for FormDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FormDefinition({})", self.id)?;
        if !self.name.is_empty() {
            write!(f, " - {}", self.name)?;
        }
        if let Some(version) = &self.version {
            write!(f, " [v{version}]")?;
        }
        Ok(())
    }
}
