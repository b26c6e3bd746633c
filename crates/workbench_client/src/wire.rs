//! JSON bodies exchanged with the backend.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use workbench_core::{
    CompletedJob, Dimension, DimensionCatalog, DimensionId, JobStatus, JobSubmission,
    ProcessedResult,
};

use crate::JobError;

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ProcessRequest<'a> {
    pub content: &'a str,
    pub process_type: &'static str,
    pub dimensions: Vec<DimensionId>,
}

impl<'a> From<&'a JobSubmission> for ProcessRequest<'a> {
    fn from(job: &'a JobSubmission) -> Self {
        Self {
            content: &job.content,
            process_type: job.kind.as_str(),
            dimensions: job.dimension_ids.iter().copied().collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ProcessAccepted {
    pub processing_key: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StatusBody {
    pub status: String,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub process_type: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl StatusBody {
    /// `processing`, `pending` and anything unrecognised mean the job is still
    /// running.
    pub fn into_status(self) -> Result<JobStatus, JobError> {
        match self.status.as_str() {
            "completed" => {
                let payload = self.result.unwrap_or(Value::Null);
                let result = ProcessedResult::from_value(&payload)?;
                Ok(JobStatus::Completed(CompletedJob {
                    result,
                    process_type: self.process_type,
                    timestamp: self.timestamp,
                }))
            }
            "failed" | "error" => Ok(JobStatus::Failed(
                self.error.unwrap_or_else(|| "unknown error".to_string()),
            )),
            _ => Ok(JobStatus::Pending),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub message: &'a str,
    pub session_id: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChatReplyBody {
    pub reply: Option<String>,
    #[serde(default)]
    pub tokens_used: Option<u64>,
    #[serde(default)]
    pub max_tokens: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct DimensionsBody {
    #[serde(default)]
    pub cleaning_dimensions: Vec<Dimension>,
    #[serde(default)]
    pub labeling_dimensions: Vec<Dimension>,
}

impl From<DimensionsBody> for DimensionCatalog {
    fn from(body: DimensionsBody) -> Self {
        DimensionCatalog {
            cleaning: body.cleaning_dimensions,
            labeling: body.labeling_dimensions,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct AddDimensionRequest<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: &'a str,
    pub description: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UploadBody {
    pub content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn status(value: Value) -> Result<JobStatus, JobError> {
        serde_json::from_value::<StatusBody>(value).unwrap().into_status()
    }

    #[test]
    fn unknown_status_is_pending() {
        assert_eq!(status(json!({ "status": "queued" })).unwrap(), JobStatus::Pending);
        assert_eq!(status(json!({ "status": "processing" })).unwrap(), JobStatus::Pending);
    }

    #[test]
    fn error_and_failed_are_failures() {
        assert_eq!(
            status(json!({ "status": "error", "error": "boom" })).unwrap(),
            JobStatus::Failed("boom".to_string())
        );
        assert_eq!(
            status(json!({ "status": "failed" })).unwrap(),
            JobStatus::Failed("unknown error".to_string())
        );
    }

    #[test]
    fn completed_without_result_is_malformed() {
        assert!(matches!(
            status(json!({ "status": "completed" })),
            Err(JobError::Malformed(_))
        ));
    }
}
