use crate::result::{ExportMetadata, ProcessedResult};
use crate::types::JobSubmission;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    SubmitJob(JobSubmission),
    ExportResult {
        result: ProcessedResult,
        metadata: ExportMetadata,
    },
    ResetChat { service: String },
}
