/// Bad local input. Raised before anything is sent over the network.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("select at least one processing dimension")]
    EmptyDimensions,
    #[error("no file content to process")]
    EmptyContent,
    #[error("select an AI service")]
    MissingServiceType,
    #[error("enter an API key")]
    MissingApiKey,
    #[error("the {service} service requires a base URL")]
    MissingBaseUrl { service: String },
    #[error("message is empty")]
    EmptyMessage,
    #[error("dimension name is empty")]
    EmptyDimensionName,
    #[error("default dimension {id} cannot be deleted")]
    DefaultDimension { id: u64 },
}

/// The backend returned a result payload that is neither a record nor a list
/// of records.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("malformed processing result: {reason}")]
pub struct MalformedResultError {
    pub reason: String,
}

impl MalformedResultError {
    pub(crate) fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}
