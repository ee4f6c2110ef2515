//! # crf-schema
//!
//! Metadata-driven validation engine for clinical trial case report forms
//! (CRFs): declarative field metadata, rule evaluators, field/form
//! validators, async rule hooks with staleness supersession, and a form
//! readiness calculator.
//!
//! ## Quick Start
//!
//! ```rust
//! use crf_schema::*;
//! use serde_json::{Map, json};
//!
//! # fn example() -> Result<()> {
//! let metadata = FieldMetadata::new(
//!     ValidationConfig::required()
//!         .with_type(FieldType::String)
//!         .with_length(3, 50),
//! );
//! let definition = FormDefinition::new("demographics", "Demographics")
//!     .with_field(FormField::new("subjectId", metadata));
//!
//! let mut values = Map::new();
//! values.insert("subjectId".to_string(), json!("SUBJ-001"));
//!
//! let engine = FormValidationEngine::new();
//! engine.precompile(&definition)?;
//! let result = engine.validate_form(&definition, &values)?;
//! assert!(result.valid);
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod error;
pub mod types;
pub mod validation;

pub use error::Result; // Our Result type takes precedence
pub use error::CrfSchemaError;
pub use types::*;
pub use validation::{
    AsyncPassOutcome, AsyncRuleRunner, FieldValidationResult, FormReadiness, FormValidationEngine,
    FormValidationResult, IssueKind, ValidationIssue, calculate_form_readiness,
};
