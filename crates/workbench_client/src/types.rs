use std::fmt;

use workbench_core::JobStatus;

/// A failed exchange with the workbench backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendError {
    pub kind: FailureKind,
    pub message: String,
}

impl BackendError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for BackendError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    Network,
    Timeout,
    HttpStatus(u16),
    /// The backend answered with an `{error}` body.
    Rejected { status: u16 },
    Decode,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Rejected { status } => write!(f, "rejected by backend ({status})"),
            FailureKind::Decode => write!(f, "undecodable response"),
        }
    }
}

/// Progress of one processing job, for whoever is watching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobEvent {
    Submitted { key: String },
    Polled { attempt: u32, status: JobStatus },
    Completed { key: String, records: usize },
    Failed { key: String, message: String },
    TimedOut { key: String, attempts: u32 },
    Cancelled { key: String },
}
