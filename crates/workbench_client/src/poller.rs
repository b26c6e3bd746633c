use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use workbench_core::{CompletedJob, JobStatus, JobSubmission};
use workbench_logging::{bench_debug, bench_info, bench_warn};

use crate::backend::{Backend, BackendRequest};
use crate::wire::{ProcessAccepted, ProcessRequest, StatusBody};
use crate::{BackendError, FailureKind, JobError, JobEvent, ProgressSink};

#[derive(Debug, Clone)]
pub struct PollSettings {
    /// Pause between two status requests.
    pub interval: Duration,
    /// Wall-clock budget for the whole wait, measured from its first poll.
    pub timeout: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            timeout: Duration::from_secs(180),
        }
    }
}

/// A submitted job. Once a terminal status has been seen (or the wait gave
/// up) the handle is finished and can no longer be polled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    key: String,
    finished: bool,
}

impl JobHandle {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            finished: false,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn finish(&mut self) {
        self.finished = true;
    }
}

pub struct AsyncJobPoller {
    backend: Arc<dyn Backend>,
    settings: PollSettings,
}

impl AsyncJobPoller {
    pub fn new(backend: Arc<dyn Backend>, settings: PollSettings) -> Self {
        Self { backend, settings }
    }

    pub fn settings(&self) -> &PollSettings {
        &self.settings
    }

    /// Validates locally, then starts the job on the backend.
    pub async fn submit(&self, job: &JobSubmission) -> Result<JobHandle, JobError> {
        job.validate()?;
        let body = serde_json::to_value(ProcessRequest::from(job))
            .map_err(|err| BackendError::new(FailureKind::Decode, err.to_string()))?;
        let reply = self
            .backend
            .send(BackendRequest::post_json("process-file/", body))
            .await?;

        let accepted: Option<ProcessAccepted> = serde_json::from_slice(&reply.body).ok();
        let error = accepted.as_ref().and_then(|a| a.error.clone());
        let key = accepted.and_then(|a| a.processing_key);
        match (reply.is_success(), key) {
            (true, Some(key)) if !key.is_empty() => {
                bench_info!("job {key} accepted ({} job)", job.kind);
                Ok(JobHandle::new(key))
            }
            (true, _) => Err(JobError::Submission(
                error.unwrap_or_else(|| "response has no processing_key".to_string()),
            )),
            (false, _) => Err(JobError::Submission(
                error.unwrap_or_else(|| format!("http status {}", reply.status)),
            )),
        }
    }

    /// One status request. Fails fast on a finished handle.
    pub async fn poll(&self, handle: &mut JobHandle) -> Result<JobStatus, JobError> {
        if handle.is_finished() {
            return Err(JobError::InvalidHandle {
                key: handle.key.clone(),
            });
        }
        let result = self.fetch_status(&handle.key).await;
        match &result {
            Ok(status) if status.is_terminal() => handle.finish(),
            Err(JobError::Malformed(_)) => handle.finish(),
            _ => {}
        }
        result
    }

    /// Polls until the job completes, fails, runs out of time or is
    /// cancelled. Every poll and the final outcome are reported to `sink`.
    pub async fn wait(
        &self,
        handle: &mut JobHandle,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<CompletedJob, JobError> {
        if handle.is_finished() {
            return Err(JobError::InvalidHandle {
                key: handle.key.clone(),
            });
        }
        let deadline = Instant::now() + self.settings.timeout;
        let key = handle.key.clone();
        let mut attempt = 0u32;

        loop {
            if cancel.is_cancelled() {
                return Err(cancelled(handle, sink));
            }
            attempt += 1;
            let polled = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                status = self.fetch_status(&key) => Some(status),
            };
            let Some(polled) = polled else {
                return Err(cancelled(handle, sink));
            };
            let status = match polled {
                Ok(status) => status,
                Err(err) => {
                    if matches!(err, JobError::Malformed(_)) {
                        handle.finish();
                    }
                    bench_warn!("polling job {key} failed: {err}");
                    sink.emit(JobEvent::Failed {
                        key: key.clone(),
                        message: err.to_string(),
                    });
                    return Err(err);
                }
            };
            sink.emit(JobEvent::Polled {
                attempt,
                status: status.clone(),
            });

            match status {
                JobStatus::Completed(job) => {
                    handle.finish();
                    bench_info!("job {key} completed after {attempt} poll(s)");
                    sink.emit(JobEvent::Completed {
                        key,
                        records: job.result.len(),
                    });
                    return Ok(job);
                }
                JobStatus::Failed(message) => {
                    handle.finish();
                    bench_warn!("job {key} failed: {message}");
                    sink.emit(JobEvent::Failed {
                        key,
                        message: message.clone(),
                    });
                    return Err(JobError::Failed(message));
                }
                JobStatus::Pending => {}
            }

            let now = Instant::now();
            if now >= deadline {
                handle.finish();
                bench_warn!("job {key} timed out after {attempt} poll(s)");
                sink.emit(JobEvent::TimedOut {
                    key: key.clone(),
                    attempts: attempt,
                });
                return Err(JobError::Timeout {
                    key,
                    waited: self.settings.timeout,
                });
            }
            let pause = self.settings.interval.min(deadline - now);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled(handle, sink)),
                _ = sleep(pause) => {}
            }
        }
    }

    /// Submit and wait.
    pub async fn process(
        &self,
        job: &JobSubmission,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<CompletedJob, JobError> {
        let mut handle = self.submit(job).await?;
        sink.emit(JobEvent::Submitted {
            key: handle.key.clone(),
        });
        self.wait(&mut handle, sink, cancel).await
    }

    async fn fetch_status(&self, key: &str) -> Result<JobStatus, JobError> {
        let path = format!("check-processing-status/{}/", urlencoding::encode(key));
        let reply = self.backend.send(BackendRequest::get(path)).await?;
        // A status body wins over the HTTP status: failures arrive as 500.
        if let Ok(body) = serde_json::from_slice::<StatusBody>(&reply.body) {
            let status = body.into_status()?;
            bench_debug!("job {key}: {status:?}");
            return Ok(status);
        }
        match reply.into_json() {
            Err(err) => Err(err.into()),
            Ok(_) => Err(BackendError::new(FailureKind::Decode, "status body missing").into()),
        }
    }
}

fn cancelled(handle: &mut JobHandle, sink: &dyn ProgressSink) -> JobError {
    handle.finish();
    bench_info!("job {} cancelled", handle.key);
    sink.emit(JobEvent::Cancelled {
        key: handle.key.clone(),
    });
    JobError::Cancelled {
        key: handle.key.clone(),
    }
}
