//! Service and session traits.
//!
//! A [`SessionConnector`] turns [`Credentials`] into an authenticated
//! [`QuantumService`]. The service lists backends and runs estimator jobs:
//!
//! ```text
//!   connect() ──→ least_busy() ──→ submit_estimator() ──→ wait() ──→ EstimatorResult
//! ```
//!
//! | Method | Required | Returns |
//! |--------|----------|---------|
//! | `name()` | yes | `&str` |
//! | `backends()` | yes | `HalResult<Vec<BackendInfo>>` |
//! | `submit_estimator()` | yes | `HalResult<JobId>` |
//! | `status()` | yes | `HalResult<JobStatus>` |
//! | `estimator_result()` | yes | `HalResult<EstimatorResult>` |
//! | `cancel()` | yes | `HalResult<()>` |
//! | `least_busy()` | provided | `HalResult<BackendInfo>` |
//! | `wait()` | provided | `HalResult<EstimatorResult>` |

use std::cmp::Ordering;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use xprobe_ir::{Circuit, SparsePauliOp};

use crate::auth::Credentials;
use crate::error::{HalError, HalResult};
use crate::job::{JobId, JobStatus};
use crate::result::EstimatorResult;

/// Default interval between status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// What a service reports about one execution target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendInfo {
    /// Backend name, e.g. `ibm_brisbane`.
    pub name: String,
    /// Number of qubits.
    pub num_qubits: u32,
    /// Whether the backend is a simulator.
    pub simulator: bool,
    /// Whether the backend currently accepts jobs.
    pub operational: bool,
    /// Jobs waiting ahead of a new submission, if known.
    pub pending_jobs: Option<u32>,
    /// Free-form status message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_msg: Option<String>,
}

impl BackendInfo {
    /// An operational hardware backend with an empty queue.
    pub fn new(name: impl Into<String>, num_qubits: u32) -> Self {
        Self {
            name: name.into(),
            num_qubits,
            simulator: false,
            operational: true,
            pending_jobs: Some(0),
            status_msg: None,
        }
    }

    /// Mark as a simulator.
    pub fn simulator(mut self) -> Self {
        self.simulator = true;
        self
    }

    /// Set the operational flag.
    pub fn with_operational(mut self, operational: bool) -> Self {
        self.operational = operational;
        self
    }

    /// Set the queue length.
    pub fn with_pending_jobs(mut self, pending: Option<u32>) -> Self {
        self.pending_jobs = pending;
        self
    }
}

/// Constraints a backend must satisfy to be selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendFilter {
    /// Minimum number of qubits.
    pub min_num_qubits: u32,
    /// Required simulator flag; `None` accepts both.
    pub simulator: Option<bool>,
    /// Required operational flag; `None` accepts both.
    pub operational: Option<bool>,
}

impl BackendFilter {
    /// Real, operational hardware with at least one qubit.
    pub fn hardware() -> Self {
        Self {
            min_num_qubits: 1,
            simulator: Some(false),
            operational: Some(true),
        }
    }

    /// Accept any backend with at least `min_num_qubits` qubits.
    pub fn any(min_num_qubits: u32) -> Self {
        Self {
            min_num_qubits,
            simulator: None,
            operational: None,
        }
    }

    /// Whether `backend` satisfies every constraint.
    pub fn matches(&self, backend: &BackendInfo) -> bool {
        backend.num_qubits >= self.min_num_qubits
            && self.simulator.is_none_or(|s| backend.simulator == s)
            && self.operational.is_none_or(|o| backend.operational == o)
    }
}

impl Default for BackendFilter {
    fn default() -> Self {
        Self::hardware()
    }
}

impl fmt::Display for BackendFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "min_num_qubits={}", self.min_num_qubits)?;
        if let Some(s) = self.simulator {
            write!(f, ", simulator={s}")?;
        }
        if let Some(o) = self.operational {
            write!(f, ", operational={o}")?;
        }
        Ok(())
    }
}

/// Order backends by queue length; unknown queues last, ties by name.
fn queue_order(a: &BackendInfo, b: &BackendInfo) -> Ordering {
    match (a.pending_jobs, b.pending_jobs) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.name.cmp(&b.name))
}

/// Pick the least busy backend among those matching `filter`.
pub fn select_least_busy(
    backends: impl IntoIterator<Item = BackendInfo>,
    filter: &BackendFilter,
) -> HalResult<BackendInfo> {
    backends
        .into_iter()
        .filter(|b| {
            let keep = filter.matches(b);
            if !keep {
                debug!(backend = %b.name, "Backend does not match filter");
            }
            keep
        })
        .min_by(queue_order)
        .ok_or_else(|| HalError::NoEligibleBackend(filter.to_string()))
}

/// One primitive unified bloc: a circuit and the observable to estimate on it.
#[derive(Debug, Clone, PartialEq)]
pub struct EstimatorPub {
    /// The circuit.
    pub circuit: Circuit,
    /// The observable.
    pub observable: SparsePauliOp,
}

impl EstimatorPub {
    /// Pair a circuit with an observable of the same width.
    pub fn new(circuit: Circuit, observable: SparsePauliOp) -> HalResult<Self> {
        if observable.num_qubits() != circuit.num_qubits() {
            return Err(HalError::InvalidCircuit(format!(
                "observable acts on {} qubits but circuit '{}' has {}",
                observable.num_qubits(),
                circuit.name(),
                circuit.num_qubits()
            )));
        }
        Ok(Self {
            circuit,
            observable,
        })
    }
}

/// How long and how often [`QuantumService::wait`] polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Interval between status polls.
    pub poll_interval: Duration,
    /// Give up after this long; `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Cancel the remote job when the timeout fires.
    pub cancel_on_timeout: bool,
}

impl WaitOptions {
    /// Set the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set a timeout, after which the job is cancelled.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
            cancel_on_timeout: true,
        }
    }
}

/// An authenticated connection to a quantum runtime.
#[async_trait]
pub trait QuantumService: Send + Sync {
    /// Name of the service, for logs.
    fn name(&self) -> &str;

    /// List the backends visible to this account.
    async fn backends(&self) -> HalResult<Vec<BackendInfo>>;

    /// Submit estimator pubs to `backend`. The job starts `Queued`.
    async fn submit_estimator(&self, backend: &str, pubs: &[EstimatorPub]) -> HalResult<JobId>;

    /// Get the status of a job.
    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus>;

    /// Get the result of a completed estimator job.
    async fn estimator_result(&self, job_id: &JobId) -> HalResult<EstimatorResult>;

    /// Cancel a pending job.
    async fn cancel(&self, job_id: &JobId) -> HalResult<()>;

    /// The least busy backend matching `filter`.
    async fn least_busy(&self, filter: &BackendFilter) -> HalResult<BackendInfo> {
        let backends = self.backends().await?;
        debug!(count = backends.len(), %filter, "Selecting least busy backend");
        let chosen = select_least_busy(backends, filter)?;
        info!(backend = %chosen.name, pending_jobs = ?chosen.pending_jobs, "Selected backend");
        Ok(chosen)
    }

    /// Poll until the job is terminal and return its result.
    async fn wait(&self, job_id: &JobId, options: &WaitOptions) -> HalResult<EstimatorResult> {
        let started = tokio::time::Instant::now();

        loop {
            let status = self.status(job_id).await?;
            debug!(job_id = %job_id, %status, "Polled job status");

            match status {
                JobStatus::Completed => return self.estimator_result(job_id).await,
                JobStatus::Failed(msg) => return Err(HalError::JobFailed(msg)),
                JobStatus::Cancelled => return Err(HalError::JobCancelled),
                JobStatus::Queued | JobStatus::Running => {}
            }

            if let Some(timeout) = options.timeout {
                if started.elapsed() >= timeout {
                    if options.cancel_on_timeout {
                        if let Err(e) = self.cancel(job_id).await {
                            warn!(job_id = %job_id, error = %e, "Failed to cancel timed out job");
                        }
                    }
                    return Err(HalError::Timeout(job_id.to_string()));
                }
            }

            tokio::time::sleep(options.poll_interval).await;
        }
    }
}

/// Opens sessions against a runtime.
#[async_trait]
pub trait SessionConnector: Send + Sync {
    /// Authenticate and return a ready service.
    async fn connect(&self, credentials: &Credentials) -> HalResult<Box<dyn QuantumService>>;
}
