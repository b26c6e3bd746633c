use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use workbench_client::{
    AsyncJobPoller, Backend, BackendSettings, JobError, JobEvent, JobHandle, NullSink,
    PollSettings, ProgressSink, ReqwestBackend,
};
use workbench_core::{JobKind, JobStatus, JobSubmission, ProcessedResult, Record};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(workbench_logging::initialize_for_tests);
}

#[derive(Default)]
struct TestSink {
    events: Arc<Mutex<Vec<JobEvent>>>,
}

impl TestSink {
    fn take(&self) -> Vec<JobEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl ProgressSink for TestSink {
    fn emit(&self, event: JobEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn poller(server: &MockServer, settings: PollSettings) -> AsyncJobPoller {
    let backend = ReqwestBackend::new(&BackendSettings {
        base_url: server.uri(),
        ..BackendSettings::default()
    })
    .unwrap();
    let backend: Arc<dyn Backend> = Arc::new(backend);
    AsyncJobPoller::new(backend, settings)
}

fn fast() -> PollSettings {
    PollSettings {
        interval: Duration::from_millis(10),
        timeout: Duration::from_secs(5),
    }
}

async fn mount_accept(server: &MockServer, key: &str) {
    Mock::given(method("POST"))
        .and(path("/process-file/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "processing_key": key })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn empty_dimension_set_never_reaches_the_network() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/process-file/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let job = JobSubmission::new("hello", JobKind::Cleaning, []);
    let err = poller(&server, fast()).submit(&job).await.unwrap_err();
    assert!(matches!(err, JobError::Validation(_)), "{err:?}");
}

#[tokio::test]
async fn hello_job_completes_after_two_pending_polls() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/process-file/"))
        .and(body_json(json!({
            "content": "hello",
            "process_type": "cleaning",
            "dimensions": [1],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "processing_key": "k1" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/check-processing-status/k1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "processing" })))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/check-processing-status/k1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "completed",
            "result": { "input": "hello", "output": "HELLO" },
            "process_type": "cleaning",
            "timestamp": "2024-05-01T10:00:00",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let poller = poller(&server, fast());
    let job = JobSubmission::new("hello", JobKind::Cleaning, [1]);
    let sink = TestSink::default();
    let cancel = CancellationToken::new();

    let mut handle = poller.submit(&job).await.unwrap();
    assert_eq!(handle.key(), "k1");
    let completed = poller.wait(&mut handle, &sink, &cancel).await.unwrap();
    assert_eq!(
        completed.result,
        ProcessedResult::Single(Record::new("hello", "HELLO"))
    );
    assert_eq!(completed.timestamp.as_deref(), Some("2024-05-01T10:00:00"));
    assert!(handle.is_finished());

    let events = sink.take();
    let polls: Vec<u32> = events
        .iter()
        .filter_map(|event| match event {
            JobEvent::Polled { attempt, .. } => Some(*attempt),
            _ => None,
        })
        .collect();
    assert_eq!(polls, vec![1, 2, 3]);
    assert_eq!(
        events.last(),
        Some(&JobEvent::Completed {
            key: "k1".to_string(),
            records: 1
        })
    );

    // A finished handle fails without another request; `.expect(1)` above
    // would catch a fourth status call.
    let err = poller.poll(&mut handle).await.unwrap_err();
    assert!(matches!(err, JobError::InvalidHandle { .. }), "{err:?}");
}

#[tokio::test]
async fn failed_status_is_honoured_despite_http_500() {
    init_logging();
    let server = MockServer::start().await;
    mount_accept(&server, "k2").await;
    Mock::given(method("GET"))
        .and(path("/check-processing-status/k2/"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "status": "failed",
            "error": "model overloaded",
        })))
        .mount(&server)
        .await;

    let job = JobSubmission::new("text", JobKind::Labeling, [3]);
    let err = poller(&server, fast())
        .process(&job, &NullSink, &CancellationToken::new())
        .await
        .unwrap_err();
    match err {
        JobError::Failed(message) => assert_eq!(message, "model overloaded"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn pending_job_times_out_at_the_deadline() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/check-processing-status/slow/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "processing" })))
        .mount(&server)
        .await;

    let settings = PollSettings {
        interval: Duration::from_millis(20),
        timeout: Duration::from_millis(100),
    };
    let poller = poller(&server, settings);
    let sink = TestSink::default();
    let mut handle = JobHandle::new("slow");
    let err = poller
        .wait(&mut handle, &sink, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, JobError::Timeout { .. }), "{err:?}");
    assert!(handle.is_finished());
    match sink.take().last() {
        Some(JobEvent::TimedOut { attempts, .. }) => assert!(*attempts >= 2),
        other => panic!("unexpected last event: {other:?}"),
    }
}

#[tokio::test]
async fn cancelled_wait_stops_before_polling() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/check-processing-status/k3/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "processing" })))
        .expect(0)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let mut handle = JobHandle::new("k3");
    let err = poller(&server, fast())
        .wait(&mut handle, &NullSink, &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, JobError::Cancelled { .. }), "{err:?}");
}

#[tokio::test]
async fn cancelling_during_the_interval_ends_the_wait() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/check-processing-status/k4/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "processing" })))
        .mount(&server)
        .await;

    let settings = PollSettings {
        interval: Duration::from_secs(30),
        timeout: Duration::from_secs(60),
    };
    let poller = poller(&server, settings);
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let mut handle = JobHandle::new("k4");
    let (result, _) = tokio::join!(poller.wait(&mut handle, &NullSink, &cancel), async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });
    assert!(matches!(result, Err(JobError::Cancelled { .. })));
}

#[tokio::test]
async fn rejected_submission_carries_backend_message() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/process-file/"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "error": "API not configured" })),
        )
        .mount(&server)
        .await;

    let job = JobSubmission::new("hello", JobKind::Cleaning, [1]);
    let err = poller(&server, fast()).submit(&job).await.unwrap_err();
    match err {
        JobError::Submission(message) => assert_eq!(message, "API not configured"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn malformed_result_finishes_the_handle() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/check-processing-status/k5/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "status": "completed", "result": 7 })),
        )
        .mount(&server)
        .await;

    let poller = poller(&server, fast());
    let mut handle = JobHandle::new("k5");
    let err = poller.poll(&mut handle).await.unwrap_err();
    assert!(matches!(err, JobError::Malformed(_)), "{err:?}");
    assert!(handle.is_finished());
}

#[tokio::test]
async fn single_poll_reports_pending() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/check-processing-status/k6/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "processing" })))
        .mount(&server)
        .await;

    let poller = poller(&server, fast());
    let mut handle = JobHandle::new("k6");
    assert_eq!(poller.poll(&mut handle).await.unwrap(), JobStatus::Pending);
    assert!(!handle.is_finished());
}
