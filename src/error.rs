use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrfSchemaError {
    #[error("Rule definition error: {message}")]
    Rule { message: String },

    #[error("Form definition error: {message}")]
    Definition { message: String },
}

impl CrfSchemaError {
    pub fn rule(message: impl Into<String>) -> Self {
        Self::Rule {
            message: message.into(),
        }
    }

    pub fn definition(message: impl Into<String>) -> Self {
        Self::Definition {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CrfSchemaError>;
