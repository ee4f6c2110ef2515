pub mod form;
pub mod metadata;
pub mod rules;
pub mod submission;

pub use form::{FormDefinition, FormField};
pub use metadata::{
    ClinicalFlags, DataQualityRules, FieldMetadata, FieldOption, FieldType, UiConfig,
    ValidationConfig,
};
pub use rules::{
    AsyncRule, Condition, ConditionOp, ConditionalRule, CrossFieldRule, CustomRule, Predicate,
    RangeAction, RangeCheck, RuleOutcome, RuleType, Severity,
};
pub use submission::{FormDataSubmission, FormDataSubmissionResponse, SubmissionStatus};
