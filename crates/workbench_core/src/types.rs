use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::result::ProcessedResult;
use crate::ValidationError;

pub type DimensionId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    #[default]
    Cleaning,
    Labeling,
}

impl JobKind {
    pub fn as_str(self) -> &'static str {
        match self {
            JobKind::Cleaning => "cleaning",
            JobKind::Labeling => "labeling",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSubmission {
    pub content: String,
    pub kind: JobKind,
    pub dimension_ids: BTreeSet<DimensionId>,
}

impl JobSubmission {
    pub fn new(
        content: impl Into<String>,
        kind: JobKind,
        dimension_ids: impl IntoIterator<Item = DimensionId>,
    ) -> Self {
        Self {
            content: content.into(),
            kind,
            dimension_ids: dimension_ids.into_iter().collect(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.dimension_ids.is_empty() {
            return Err(ValidationError::EmptyDimensions);
        }
        if self.content.trim().is_empty() {
            return Err(ValidationError::EmptyContent);
        }
        Ok(())
    }
}

/// A finished job as reported by the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedJob {
    pub result: ProcessedResult,
    pub process_type: Option<String>,
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Completed(CompletedJob),
    Failed(String),
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Pending)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    pub id: DimensionId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub order: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DimensionCatalog {
    pub cleaning: Vec<Dimension>,
    pub labeling: Vec<Dimension>,
}

impl DimensionCatalog {
    pub fn for_kind(&self, kind: JobKind) -> &[Dimension] {
        match kind {
            JobKind::Cleaning => &self.cleaning,
            JobKind::Labeling => &self.labeling,
        }
    }

    /// Ids that start out selected: the backend's default dimensions.
    pub fn default_selection(&self, kind: JobKind) -> BTreeSet<DimensionId> {
        self.for_kind(kind)
            .iter()
            .filter(|d| d.is_default)
            .map(|d| d.id)
            .collect()
    }

    pub fn find(&self, kind: JobKind, id: DimensionId) -> Option<&Dimension> {
        self.for_kind(kind).iter().find(|d| d.id == id)
    }
}

/// Server-reported token usage of the current chat session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub used: u64,
    pub max: u64,
}

pub const DEFAULT_MAX_TOKENS: u64 = 3072;

impl TokenUsage {
    pub fn reset() -> Self {
        Self {
            used: 0,
            max: DEFAULT_MAX_TOKENS,
        }
    }

    /// True once more than 90% of the budget is used.
    pub fn is_near_limit(&self) -> bool {
        self.used * 10 > self.max * 9
    }
}

impl fmt::Display for TokenUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.used, self.max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

/// Transient user-facing message (the toast of the web front end).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub text: String,
}

impl Notification {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            text: text.into(),
        }
    }
}
