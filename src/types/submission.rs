use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Payload handed to the data-capture backend once a form passes validation.
/// The engine builds and serializes this; persistence happens elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDataSubmission {
    pub study_id: String,
    pub form_id: String,
    pub subject_id: String,
    pub visit_id: Option<String>,
    pub form_data: Map<String, Value>,
    pub status: SubmissionStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionStatus {
    Draft,
    Complete,
    SignedOff,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDataSubmissionResponse {
    pub success: bool,
    pub form_data_id: Option<String>,
    pub record_id: Option<String>,
    pub message: Option<String>,
}
