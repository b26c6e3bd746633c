use crate::types::{CompletedJob, DimensionCatalog, DimensionId, JobKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// The dimension catalog arrived from the backend.
    DimensionsLoaded(DimensionCatalog),
    /// User switched between cleaning and labeling.
    KindSelected(JobKind),
    /// User ticked or unticked a dimension of the current kind.
    DimensionToggled(DimensionId),
    /// An uploaded file's text came back.
    FileLoaded { name: String, content: String },
    /// Upload or dimension loading failed.
    LoadFailed(String),
    /// User clicked Process.
    ProcessClicked,
    /// The backend accepted the job.
    JobAccepted { key: String },
    /// Another status poll came back pending.
    JobPolled { attempt: u32 },
    JobCompleted(CompletedJob),
    JobFailed(String),
    /// User clicked Export.
    ExportClicked,
    /// The export file was written.
    ExportSaved { path: String },
    ExportFailed(String),
    /// The AI service configuration was saved.
    ServiceChanged(String),
    NoOp,
}
