use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio_util::sync::CancellationToken;
use workbench_client::{
    save_export, AsyncJobPoller, ChannelProgressSink, ExportClient, JobEvent,
};
use workbench_core::{export, Effect, ExportMetadata, JobStatus, JobSubmission, Msg, ProcessedResult};
use workbench_logging::{bench_debug, bench_info, bench_warn};

/// Runs the effects the state machine asks for and reports back as [`Msg`]s.
/// Every job or export effect ends with exactly one final message.
#[derive(Clone)]
pub struct EffectRunner {
    poller: Arc<AsyncJobPoller>,
    exporter: Option<Arc<ExportClient>>,
    export_dir: PathBuf,
    cancel: CancellationToken,
}

impl EffectRunner {
    pub fn new(poller: AsyncJobPoller, export_dir: PathBuf, cancel: CancellationToken) -> Self {
        Self {
            poller: Arc::new(poller),
            exporter: None,
            export_dir,
            cancel,
        }
    }

    /// Exports through the backend instead of serializing locally.
    pub fn with_remote_export(mut self, exporter: ExportClient) -> Self {
        self.exporter = Some(Arc::new(exporter));
        self
    }

    /// Starts every effect in the background. Returns the effects it does not
    /// handle, which belong to the caller.
    pub fn enqueue(&self, effects: Vec<Effect>, msg_tx: &UnboundedSender<Msg>) -> Vec<Effect> {
        let mut unhandled = Vec::new();
        for effect in effects {
            match effect {
                Effect::SubmitJob(job) => {
                    bench_info!(
                        "SubmitJob kind={} dimensions={} content_chars={}",
                        job.kind,
                        job.dimension_ids.len(),
                        job.content.chars().count()
                    );
                    let runner = self.clone();
                    let msg_tx = msg_tx.clone();
                    tokio::spawn(async move { runner.run_job(job, msg_tx).await });
                }
                Effect::ExportResult { result, metadata } => {
                    let runner = self.clone();
                    let msg_tx = msg_tx.clone();
                    tokio::spawn(async move {
                        let msg = runner.run_export(result, metadata).await;
                        let _ = msg_tx.send(msg);
                    });
                }
                other => unhandled.push(other),
            }
        }
        unhandled
    }

    async fn run_job(&self, job: JobSubmission, msg_tx: UnboundedSender<Msg>) {
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let poller = self.poller.clone();
        let cancel = self.cancel.clone();
        let run = async move {
            let sink = ChannelProgressSink::new(event_tx);
            poller.process(&job, &sink, &cancel).await
        };
        let forward = async {
            while let Some(event) = event_rx.recv().await {
                if let Some(msg) = progress_msg(event) {
                    let _ = msg_tx.send(msg);
                }
            }
        };
        // `forward` ends once `run` drops the sink.
        let (outcome, ()) = tokio::join!(run, forward);
        let msg = match outcome {
            Ok(completed) => Msg::JobCompleted(completed),
            Err(err) => {
                bench_warn!("job ended without a result: {err}");
                Msg::JobFailed(err.to_string())
            }
        };
        let _ = msg_tx.send(msg);
    }

    async fn run_export(&self, result: ProcessedResult, metadata: ExportMetadata) -> Msg {
        let blob = match &self.exporter {
            Some(exporter) => match exporter.export_remote(&result, &metadata).await {
                Ok(bytes) => bytes,
                Err(err) => return Msg::ExportFailed(err.to_string()),
            },
            None => export(&result, &metadata),
        };
        match save_export(&self.export_dir, &blob, &Local::now()) {
            Ok(path) => Msg::ExportSaved {
                path: path.display().to_string(),
            },
            Err(err) => Msg::ExportFailed(err.to_string()),
        }
    }
}

fn progress_msg(event: JobEvent) -> Option<Msg> {
    match event {
        JobEvent::Submitted { key } => Some(Msg::JobAccepted { key }),
        JobEvent::Polled {
            attempt,
            status: JobStatus::Pending,
        } => Some(Msg::JobPolled { attempt }),
        other => {
            bench_debug!("job event {other:?}");
            None
        }
    }
}

/// Messages that end an effect started by [`EffectRunner::enqueue`].
pub fn is_final(msg: &Msg) -> bool {
    matches!(
        msg,
        Msg::JobCompleted(_) | Msg::JobFailed(_) | Msg::ExportSaved { .. } | Msg::ExportFailed(_)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use workbench_core::{CompletedJob, Record};

    #[test]
    fn only_pending_polls_become_messages() {
        assert_eq!(
            progress_msg(JobEvent::Polled {
                attempt: 2,
                status: JobStatus::Pending
            }),
            Some(Msg::JobPolled { attempt: 2 })
        );
        let done = JobStatus::Completed(CompletedJob {
            result: ProcessedResult::Single(Record::new("a", "b")),
            process_type: None,
            timestamp: None,
        });
        assert_eq!(
            progress_msg(JobEvent::Polled {
                attempt: 3,
                status: done
            }),
            None
        );
        assert_eq!(
            progress_msg(JobEvent::Submitted {
                key: "k".to_string()
            }),
            Some(Msg::JobAccepted {
                key: "k".to_string()
            })
        );
    }

    #[test]
    fn final_messages_are_recognised() {
        assert!(is_final(&Msg::JobFailed("x".to_string())));
        assert!(!is_final(&Msg::JobPolled { attempt: 1 }));
    }
}
