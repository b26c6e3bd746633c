use std::io;
use std::time::Duration;

use thiserror::Error;
use workbench_core::{MalformedResultError, ValidationError};

use crate::BackendError;

#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("submission rejected: {0}")]
    Submission(String),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("job {key} still pending after {waited:?}")]
    Timeout { key: String, waited: Duration },
    #[error("processing failed: {0}")]
    Failed(String),
    #[error(transparent)]
    Malformed(#[from] MalformedResultError),
    #[error("job {key} already finished")]
    InvalidHandle { key: String },
    #[error("job {key} cancelled")]
    Cancelled { key: String },
}

#[derive(Debug, Error)]
pub enum SendError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("chat request failed: {0}")]
    Backend(#[from] BackendError),
    #[error("chat reply missing: {0}")]
    MissingReply(String),
    #[error("chat request cancelled")]
    Cancelled,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("saving configuration failed: {0}")]
    Backend(#[from] BackendError),
}

#[derive(Debug, Error)]
pub enum DimensionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("dimension request failed: {0}")]
    Backend(#[from] BackendError),
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("cannot read {path}: {source}")]
    Read { path: String, source: io::Error },
    #[error("upload failed: {0}")]
    Backend(#[from] BackendError),
    #[error("upload response has no content")]
    MissingContent,
}

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
