use workbench_logging::{bench_debug, bench_info, bench_warn};

use crate::{AppState, Effect, Msg, Notification};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::DimensionsLoaded(catalog) => {
            bench_debug!(
                "dimension catalog: {} cleaning, {} labeling",
                catalog.cleaning.len(),
                catalog.labeling.len()
            );
            state.set_catalog(catalog);
            Vec::new()
        }
        Msg::KindSelected(kind) => {
            state.set_kind(kind);
            Vec::new()
        }
        Msg::DimensionToggled(id) => {
            if !state.toggle_dimension(id) {
                bench_warn!("toggle for unknown dimension {id} ignored");
            }
            Vec::new()
        }
        Msg::FileLoaded { name, content } => {
            state.notify(Notification::success(format!("Loaded {name}")));
            state.set_file(name, content);
            Vec::new()
        }
        Msg::LoadFailed(message) => {
            state.notify(Notification::error(message));
            Vec::new()
        }
        Msg::ProcessClicked => {
            if state.phase().is_busy() {
                state.notify(Notification::error("A job is already running"));
                return (state, Vec::new());
            }
            let submission = state.submission();
            if let Err(err) = submission.validate() {
                state.notify(Notification::error(err.to_string()));
                return (state, Vec::new());
            }
            bench_info!(
                "submitting {} job with {} dimensions",
                submission.kind,
                submission.dimension_ids.len()
            );
            state.start_job(submission.clone());
            state.notify(Notification::info("Processing started"));
            vec![Effect::SubmitJob(submission)]
        }
        Msg::JobAccepted { key } => {
            state.job_accepted(key);
            Vec::new()
        }
        Msg::JobPolled { attempt } => {
            state.job_polled(attempt);
            Vec::new()
        }
        Msg::JobCompleted(job) => {
            let records = job.result.len();
            state.job_completed(job);
            state.notify(Notification::success(format!(
                "Processing complete: {records} record(s)"
            )));
            Vec::new()
        }
        Msg::JobFailed(message) => {
            state.job_failed();
            state.notify(Notification::error(format!("Processing failed: {message}")));
            Vec::new()
        }
        Msg::ExportClicked => match state.result() {
            Some(job) => {
                let result = job.result.clone();
                let metadata = state.export_metadata();
                vec![Effect::ExportResult { result, metadata }]
            }
            None => {
                state.notify(Notification::error("No processed data to export"));
                Vec::new()
            }
        },
        Msg::ExportSaved { path } => {
            state.notify(Notification::success(format!("Exported to {path}")));
            Vec::new()
        }
        Msg::ExportFailed(message) => {
            state.notify(Notification::error(format!("Export failed: {message}")));
            Vec::new()
        }
        Msg::ServiceChanged(service) => {
            state.set_service(service.clone());
            state.notify(Notification::info(format!("Now using the {service} service")));
            vec![Effect::ResetChat { service }]
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}
