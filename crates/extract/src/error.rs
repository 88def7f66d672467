use std::time::Duration;
use thiserror::Error;

/// Failures of a single extraction step. None of these abort a batch.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("No field schema for cancer type '{0}'")]
    SchemaNotFound(String),

    #[error("Inference endpoint unreachable at {0}")]
    EndpointUnreachable(String),

    #[error("Model did not answer within {0:?}")]
    InvocationTimeout(Duration),

    #[error("Inference endpoint returned error (status {status}): {body}")]
    ServerError { status: u16, body: String },

    #[error("Malformed model reply: {0}")]
    MalformedReply(String),

    #[error("Model reply does not match the declared schema: {0}")]
    SchemaMismatch(String),

    #[error("HTTP client error: {0}")]
    Client(String),
}

impl ExtractError {
    /// Errors raised while talking to the inference server, as opposed to
    /// problems with what it said.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::EndpointUnreachable(_)
                | Self::InvocationTimeout(_)
                | Self::ServerError { .. }
                | Self::Client(_)
        )
    }
}

/// Problems found while validating the schema catalog at startup.
#[derive(Error, Debug, PartialEq)]
pub enum SchemaError {
    #[error("Cancer type '{0}' has no sections")]
    EmptySchema(String),

    #[error("Section '{section}' of '{cancer}' declares no fields")]
    EmptySection { cancer: String, section: String },

    #[error("Invalid field name '{field}' in '{cancer}' (expected snake_case)")]
    InvalidFieldName { cancer: String, field: String },

    #[error("Field '{field}' declared more than once in '{cancer}'")]
    DuplicateField { cancer: String, field: String },

    #[error("Choice field '{field}' in '{cancer}' has no allowed values")]
    EmptyChoice { cancer: String, field: String },

    #[error("Choice field '{field}' in '{cancer}' repeats value '{value}'")]
    DuplicateChoice {
        cancer: String,
        field: String,
        value: String,
    },

    #[error("Group '{field}' in '{cancer}' declares no sub-fields")]
    EmptyGroup { cancer: String, field: String },

    #[error("Group '{field}' in '{cancer}' nests another group")]
    NestedGroup { cancer: String, field: String },

    #[error("Cancer type '{0}' is declared more than once")]
    DuplicateCancerType(String),

    #[error("Cancer type '{0}' has no schema")]
    MissingCancerType(String),
}
