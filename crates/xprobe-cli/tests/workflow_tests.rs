//! Smoke test workflow against mock and local services.
//!
//! The mocks implement the HAL traits directly, so every branch of the
//! workflow runs without a network.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use xprobe_adapter_ibm::IbmConnector;
use xprobe_adapter_sim::{LOCAL_BACKEND, LocalConnector};
use xprobe_cli::{SmokeTestOptions, WorkflowOutcome, XprobeConfig, run_smoke_test};
use xprobe_hal::{
    BackendFilter, BackendInfo, Channel, Credentials, EstimatorPub, EstimatorResult,
    ExpectationValues, HalError, HalResult, JobId, JobStatus, PubResult, QuantumService,
    SessionConnector, WaitOptions,
};

// ============================================================================
// Test doubles
// ============================================================================

/// A service with a fixed backend list and a job that ends in `final_status`.
#[derive(Clone)]
struct MockService {
    backends: Vec<BackendInfo>,
    final_status: JobStatus,
    evs: ExpectationValues,
    submitted: Arc<Mutex<Vec<(String, String)>>>,
    cancelled: Arc<AtomicBool>,
}

impl MockService {
    fn completing_with(evs: impl Into<ExpectationValues>) -> Self {
        Self {
            backends: vec![
                BackendInfo::new("mock_backend_2", 127).with_pending_jobs(Some(40)),
                BackendInfo::new("mock_backend_1", 127).with_pending_jobs(Some(3)),
                BackendInfo::new("mock_simulator", 32)
                    .simulator()
                    .with_pending_jobs(Some(0)),
            ],
            final_status: JobStatus::Completed,
            evs: evs.into(),
            submitted: Arc::new(Mutex::new(Vec::new())),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    fn with_status(mut self, status: JobStatus) -> Self {
        self.final_status = status;
        self
    }

    fn with_backends(mut self, backends: Vec<BackendInfo>) -> Self {
        self.backends = backends;
        self
    }
}

#[async_trait]
impl QuantumService for MockService {
    fn name(&self) -> &str {
        "mock"
    }

    async fn backends(&self) -> HalResult<Vec<BackendInfo>> {
        Ok(self.backends.clone())
    }

    async fn submit_estimator(&self, backend: &str, pubs: &[EstimatorPub]) -> HalResult<JobId> {
        assert_eq!(pubs.len(), 1);
        let label = pubs[0].observable.terms()[0].0.label();
        self.submitted
            .lock()
            .unwrap()
            .push((backend.to_string(), label));
        Ok(JobId::new("mock-job-123"))
    }

    async fn status(&self, _job_id: &JobId) -> HalResult<JobStatus> {
        if self.cancelled.load(Ordering::SeqCst) {
            return Ok(JobStatus::Cancelled);
        }
        Ok(self.final_status.clone())
    }

    async fn estimator_result(&self, _job_id: &JobId) -> HalResult<EstimatorResult> {
        Ok(EstimatorResult::new(vec![PubResult::new(self.evs.clone())]))
    }

    async fn cancel(&self, _job_id: &JobId) -> HalResult<()> {
        self.cancelled.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Hands out a clone of `service`, or fails the way `reject` says.
struct MockConnector {
    service: MockService,
    reject: Option<fn() -> HalError>,
    connects: AtomicUsize,
    output: Option<SharedBuffer>,
    saw_circuit_first: AtomicBool,
}

impl MockConnector {
    fn new(service: MockService) -> Self {
        Self {
            service,
            reject: None,
            connects: AtomicUsize::new(0),
            output: None,
            saw_circuit_first: AtomicBool::new(false),
        }
    }

    fn rejecting(reject: fn() -> HalError) -> Self {
        Self {
            reject: Some(reject),
            ..Self::new(MockService::completing_with(-0.87))
        }
    }

    fn watching(mut self, output: SharedBuffer) -> Self {
        self.output = Some(output);
        self
    }
}

#[async_trait]
impl SessionConnector for MockConnector {
    async fn connect(&self, _credentials: &Credentials) -> HalResult<Box<dyn QuantumService>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if let Some(output) = &self.output {
            let printed = output.contents();
            self.saw_circuit_first.store(
                printed.contains("Quantum Circuit:") && printed.contains("┤ X ├"),
                Ordering::SeqCst,
            );
        }
        match self.reject {
            Some(reject) => Err(reject()),
            None => Ok(Box::new(self.service.clone())),
        }
    }
}

/// An output sink the connector can inspect while the workflow runs.
#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn ibm_credentials() -> HalResult<Credentials> {
    Ok(Credentials::new(Channel::IbmQuantumPlatform, "test-key").with_instance("crn:v1:test"))
}

fn options() -> SmokeTestOptions {
    SmokeTestOptions {
        filter: BackendFilter::hardware(),
        wait: WaitOptions::default().with_poll_interval(Duration::from_millis(10)),
        progress: false,
    }
}

async fn run(
    connector: &dyn SessionConnector,
    credentials: HalResult<Credentials>,
    options: &SmokeTestOptions,
) -> (WorkflowOutcome, String) {
    let mut out = Vec::new();
    let outcome = run_smoke_test(&mut out, connector, credentials, options)
        .await
        .unwrap();
    (outcome, String::from_utf8(out).unwrap())
}

fn assert_in_order(text: &str, needles: &[&str]) {
    let mut from = 0;
    for needle in needles {
        let found = text[from..]
            .find(needle)
            .unwrap_or_else(|| panic!("'{needle}' missing or out of order in:\n{text}"));
        from += found + needle.len();
    }
}

const GUIDANCE: &str = "Could not connect to IBM Quantum hardware.";

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_noisy_hardware_result_is_reported() {
    let service = MockService::completing_with(-0.87);
    let submitted = Arc::clone(&service.submitted);
    let connector = MockConnector::new(service);

    let (outcome, text) = run(&connector, ibm_credentials(), &options()).await;

    assert_eq!(
        outcome,
        WorkflowOutcome::Success {
            backend: "mock_backend_1".into(),
            job_id: JobId::new("mock-job-123"),
            evs: ExpectationValues::Scalar(-0.87),
        }
    );
    assert_eq!(outcome.exit_code(), 0);
    assert_in_order(
        &text,
        &[
            "Quantum Circuit:",
            "q_0: ─┤ X ├┤M├─",
            "--- Attempting to run on real hardware ---",
            "Least busy backend found: mock_backend_1",
            "Job ID: mock-job-123",
            "Job sent to the backend. Waiting for results...",
            "Hardware Result (Expectation Value): -0.87",
            "For an ideal X-gate, the state is |1>, and the expected Z value is -1.",
        ],
    );
    assert!(!text.contains(GUIDANCE));
    assert_eq!(
        *submitted.lock().unwrap(),
        vec![("mock_backend_1".to_string(), "Z".to_string())]
    );
}

#[tokio::test]
async fn test_circuit_is_printed_before_connecting() {
    let output = SharedBuffer::default();
    let connector =
        MockConnector::new(MockService::completing_with(-0.9)).watching(output.clone());

    let mut sink = output.clone();
    let outcome = run_smoke_test(&mut sink, &connector, ibm_credentials(), &options())
        .await
        .unwrap();

    assert!(outcome.is_success());
    assert_eq!(connector.connects.load(Ordering::SeqCst), 1);
    assert!(connector.saw_circuit_first.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_rejected_authentication_prints_guidance() {
    let connector =
        MockConnector::rejecting(|| HalError::AuthenticationFailed("invalid API key".into()));

    let (outcome, text) = run(&connector, ibm_credentials(), &options()).await;

    assert!(matches!(&outcome, WorkflowOutcome::AuthError(msg) if msg.contains("invalid API key")));
    assert_eq!(outcome.exit_code(), 2);
    assert_in_order(
        &text,
        &[
            "Quantum Circuit:",
            "--- Attempting to run on real hardware ---",
            GUIDANCE,
            "Please ensure you have an IBM Quantum account and have provided your API credentials.",
            "IBM_API_KEY=<key> IBM_SERVICE_CRN=<crn>",
            "Error details: Authentication failed: invalid API key",
        ],
    );
    assert!(!text.contains("Least busy backend found"));
}

#[tokio::test]
async fn test_missing_credentials_never_connect() {
    let connector = MockConnector::new(MockService::completing_with(-1.0));
    let credentials = Credentials::resolve(None, None, None, None);

    let (outcome, text) = run(&connector, credentials, &options()).await;

    assert!(matches!(outcome, WorkflowOutcome::AuthError(_)));
    assert_eq!(connector.connects.load(Ordering::SeqCst), 0);
    assert!(text.contains("Quantum Circuit:"));
    assert!(text.contains(GUIDANCE));
    assert!(text.contains("IBM_QUANTUM_TOKEN"));
}

#[tokio::test]
async fn test_local_channel_on_ibm_is_auth_error() {
    let config = XprobeConfig {
        channel: Some(Channel::Local),
        ..XprobeConfig::default()
    };

    let (outcome, text) = run(&IbmConnector::new(), config.credentials(), &options()).await;

    assert!(
        matches!(&outcome, WorkflowOutcome::AuthError(msg) if msg.contains("channel 'local'")),
        "{outcome:?}"
    );
    assert_eq!(outcome.exit_code(), 2);
    assert_in_order(&text, &["Quantum Circuit:", GUIDANCE, "Error details:"]);
}

#[tokio::test]
async fn test_no_hardware_backend_available() {
    let service = MockService::completing_with(-0.9).with_backends(vec![
        BackendInfo::new("mock_simulator", 32).simulator(),
        BackendInfo::new("mock_backend_down", 127).with_operational(false),
    ]);
    let connector = MockConnector::new(service);

    let (outcome, text) = run(&connector, ibm_credentials(), &options()).await;

    assert!(matches!(outcome, WorkflowOutcome::BackendUnavailable(_)));
    assert_eq!(outcome.exit_code(), 3);
    assert!(text.contains(GUIDANCE));
    assert!(text.contains("Error details: No backend matches the filter"));
}

#[tokio::test]
async fn test_failed_job_is_execution_error() {
    let service =
        MockService::completing_with(0.0).with_status(JobStatus::Failed("calibration".into()));
    let connector = MockConnector::new(service);

    let (outcome, text) = run(&connector, ibm_credentials(), &options()).await;

    assert!(matches!(&outcome, WorkflowOutcome::ExecutionError(msg) if msg.contains("calibration")));
    assert_eq!(outcome.exit_code(), 4);
    assert_in_order(
        &text,
        &["Job ID: mock-job-123", GUIDANCE, "Error details: Job failed: calibration"],
    );
    assert!(!text.contains("Hardware Result"));
}

#[tokio::test(start_paused = true)]
async fn test_timeout_cancels_the_job() {
    let service = MockService::completing_with(0.0).with_status(JobStatus::Queued);
    let cancelled = Arc::clone(&service.cancelled);
    let connector = MockConnector::new(service);
    let options = SmokeTestOptions {
        wait: WaitOptions::default()
            .with_poll_interval(Duration::from_secs(2))
            .with_timeout(Duration::from_secs(30)),
        ..options()
    };

    let (outcome, text) = run(&connector, ibm_credentials(), &options).await;

    assert!(matches!(&outcome, WorkflowOutcome::ExecutionError(msg) if msg.contains("Timeout")));
    assert!(cancelled.load(Ordering::SeqCst));
    assert!(text.contains("Error details: Timeout waiting for job mock-job-123"));
}

#[tokio::test]
async fn test_broadcast_result_keeps_array_shape() {
    let connector = MockConnector::new(MockService::completing_with(vec![-0.87, -0.91]));

    let (outcome, text) = run(&connector, ibm_credentials(), &options()).await;

    assert!(outcome.is_success());
    assert!(text.contains("Hardware Result (Expectation Value): [-0.87, -0.91]"));
}

#[tokio::test]
async fn test_local_estimator_is_ideal() {
    let options = SmokeTestOptions {
        filter: BackendFilter::any(1),
        ..options()
    };

    let (outcome, text) = run(&LocalConnector::new(), Ok(Credentials::local()), &options).await;

    match outcome {
        WorkflowOutcome::Success { backend, evs, .. } => {
            assert_eq!(backend, LOCAL_BACKEND);
            assert_eq!(evs, ExpectationValues::Scalar(-1.0));
        }
        other => panic!("expected success, got {other:?}"),
    }
    assert!(text.contains(&format!("Least busy backend found: {LOCAL_BACKEND}")));
    assert!(text.contains("Hardware Result (Expectation Value): -1.0"));
}

#[tokio::test]
async fn test_local_estimator_with_hardware_filter_is_unavailable() {
    let (outcome, _) = run(&LocalConnector::new(), Ok(Credentials::local()), &options()).await;
    assert!(matches!(outcome, WorkflowOutcome::BackendUnavailable(_)));
}
