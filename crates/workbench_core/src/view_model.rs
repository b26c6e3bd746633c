use crate::result::TabularView;
use crate::state::JobPhase;
use crate::types::{DimensionId, JobKind, Notification};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub kind: JobKind,
    /// Dimensions of the selected kind, in backend order.
    pub dimensions: Vec<DimensionRow>,
    pub file_name: Option<String>,
    pub content_chars: usize,
    pub phase: JobPhase,
    pub processing_key: Option<String>,
    pub table: Option<TabularView>,
    pub can_process: bool,
    pub can_export: bool,
    pub service: Option<String>,
    pub notifications: Vec<Notification>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionRow {
    pub id: DimensionId,
    pub name: String,
    pub description: String,
    /// Default dimensions cannot be deleted.
    pub is_default: bool,
    pub selected: bool,
}
