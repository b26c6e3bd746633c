use std::collections::BTreeSet;

use crate::result::{render, ExportMetadata};
use crate::types::{
    CompletedJob, DimensionCatalog, DimensionId, JobKind, JobSubmission, Notification,
};
use crate::view_model::{AppViewModel, DimensionRow};

/// Where the current file-processing job is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobPhase {
    #[default]
    Idle,
    Submitting,
    Polling {
        attempt: u32,
    },
    Completed,
    Failed,
}

impl JobPhase {
    pub fn is_busy(self) -> bool {
        matches!(self, JobPhase::Submitting | JobPhase::Polling { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    catalog: DimensionCatalog,
    kind: JobKind,
    cleaning_selected: BTreeSet<DimensionId>,
    labeling_selected: BTreeSet<DimensionId>,
    file_name: Option<String>,
    content: String,
    phase: JobPhase,
    processing_key: Option<String>,
    submitted: Option<JobSubmission>,
    result: Option<CompletedJob>,
    service: Option<String>,
    notifications: Vec<Notification>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        let selected = self.selected();
        let mut dimensions: Vec<DimensionRow> = self
            .catalog
            .for_kind(self.kind)
            .iter()
            .map(|d| DimensionRow {
                id: d.id,
                name: d.name.clone(),
                description: d.description.clone(),
                is_default: d.is_default,
                selected: selected.contains(&d.id),
            })
            .collect();
        dimensions.sort_by_key(|row| {
            self.catalog
                .find(self.kind, row.id)
                .map(|d| d.order)
                .unwrap_or_default()
        });

        AppViewModel {
            kind: self.kind,
            dimensions,
            file_name: self.file_name.clone(),
            content_chars: self.content.chars().count(),
            phase: self.phase,
            processing_key: self.processing_key.clone(),
            table: self.result.as_ref().map(|job| render(&job.result)),
            can_process: !self.phase.is_busy(),
            can_export: self.result.is_some(),
            service: self.service.clone(),
            notifications: self.notifications.clone(),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call, and resets the
    /// flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    pub fn kind(&self) -> JobKind {
        self.kind
    }

    pub fn phase(&self) -> JobPhase {
        self.phase
    }

    pub fn result(&self) -> Option<&CompletedJob> {
        self.result.as_ref()
    }

    pub fn selected(&self) -> &BTreeSet<DimensionId> {
        match self.kind {
            JobKind::Cleaning => &self.cleaning_selected,
            JobKind::Labeling => &self.labeling_selected,
        }
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
        self.dirty = true;
    }

    pub(crate) fn set_catalog(&mut self, catalog: DimensionCatalog) {
        self.cleaning_selected = catalog.default_selection(JobKind::Cleaning);
        self.labeling_selected = catalog.default_selection(JobKind::Labeling);
        self.catalog = catalog;
        self.mark_dirty();
    }

    pub(crate) fn set_kind(&mut self, kind: JobKind) {
        if self.kind != kind {
            self.kind = kind;
            self.mark_dirty();
        }
    }

    /// Flips a dimension of the current kind. Unknown ids are ignored.
    pub(crate) fn toggle_dimension(&mut self, id: DimensionId) -> bool {
        if self.catalog.find(self.kind, id).is_none() {
            return false;
        }
        let selected = match self.kind {
            JobKind::Cleaning => &mut self.cleaning_selected,
            JobKind::Labeling => &mut self.labeling_selected,
        };
        if !selected.remove(&id) {
            selected.insert(id);
        }
        self.mark_dirty();
        true
    }

    pub(crate) fn set_file(&mut self, name: String, content: String) {
        self.file_name = Some(name);
        self.content = content;
        self.mark_dirty();
    }

    pub(crate) fn submission(&self) -> JobSubmission {
        JobSubmission::new(self.content.clone(), self.kind, self.selected().iter().copied())
    }

    pub(crate) fn start_job(&mut self, submission: JobSubmission) {
        self.phase = JobPhase::Submitting;
        self.processing_key = None;
        self.result = None;
        self.submitted = Some(submission);
        self.mark_dirty();
    }

    pub(crate) fn job_accepted(&mut self, key: String) {
        self.phase = JobPhase::Polling { attempt: 0 };
        self.processing_key = Some(key);
        self.mark_dirty();
    }

    pub(crate) fn job_polled(&mut self, attempt: u32) {
        if let JobPhase::Polling { .. } = self.phase {
            self.phase = JobPhase::Polling { attempt };
            self.mark_dirty();
        }
    }

    pub(crate) fn job_completed(&mut self, job: CompletedJob) {
        self.phase = JobPhase::Completed;
        self.result = Some(job);
        self.mark_dirty();
    }

    pub(crate) fn job_failed(&mut self) {
        self.phase = JobPhase::Failed;
        self.mark_dirty();
    }

    /// Metadata for exporting the current result, taken from the submission
    /// that produced it.
    pub(crate) fn export_metadata(&self) -> ExportMetadata {
        let (process_type, dimensions, original_data) = match &self.submitted {
            Some(sub) => (
                sub.kind.as_str().to_string(),
                sub.dimension_ids.iter().copied().collect(),
                sub.content.clone(),
            ),
            None => (self.kind.as_str().to_string(), Vec::new(), String::new()),
        };
        let (process_type, timestamp) = match &self.result {
            Some(job) => (
                job.process_type.clone().unwrap_or(process_type),
                job.timestamp.clone().unwrap_or_default(),
            ),
            None => (process_type, String::new()),
        };
        ExportMetadata {
            process_type,
            dimensions,
            original_data,
            timestamp,
        }
    }

    pub(crate) fn set_service(&mut self, service: String) {
        self.service = Some(service);
        self.mark_dirty();
    }
}
