//! Local estimator service.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use xprobe_hal::{
    BackendInfo, Credentials, EstimatorPub, EstimatorResult, HalError, HalResult, Job, JobId,
    JobStatus, PubResult, QuantumService, SessionConnector,
};
use xprobe_ir::{Circuit, InstructionKind};

use crate::statevector::Statevector;

/// Name of the single backend the local service exposes.
pub const LOCAL_BACKEND: &str = "local_statevector";

/// Job data for the local estimator.
struct SimJob {
    job: Job,
    result: Option<EstimatorResult>,
}

/// Noiseless estimator backed by statevector simulation.
///
/// Jobs run to completion inside `submit_estimator`, so every job is
/// `Completed` by the time its id is returned.
pub struct LocalEstimator {
    /// Jobs by id.
    jobs: Arc<Mutex<FxHashMap<String, SimJob>>>,
    /// Maximum number of qubits supported.
    max_qubits: u32,
}

impl LocalEstimator {
    /// Create an estimator with the default qubit limit.
    pub fn new() -> Self {
        Self::with_max_qubits(20)
    }

    /// Create an estimator with a custom qubit limit.
    pub fn with_max_qubits(max_qubits: u32) -> Self {
        Self {
            jobs: Arc::new(Mutex::new(FxHashMap::default())),
            max_qubits,
        }
    }

    fn backend_info(&self) -> BackendInfo {
        BackendInfo::new(LOCAL_BACKEND, self.max_qubits).simulator()
    }

    /// Evaluate one pub exactly.
    #[instrument(skip_all, fields(circuit = %pub_.circuit.name(), terms = pub_.observable.len()))]
    fn estimate(&self, pub_: &EstimatorPub) -> HalResult<PubResult> {
        let start = Instant::now();
        check_measurements_are_final(&pub_.circuit)?;

        let mut sv = Statevector::new(pub_.circuit.num_qubits());
        for inst in pub_.circuit.instructions() {
            sv.apply(inst);
        }

        let mut value = 0.0;
        for (pauli, coeff) in pub_.observable.terms() {
            if coeff.im != 0.0 {
                return Err(HalError::InvalidCircuit(format!(
                    "observable term {pauli} has a complex coefficient"
                )));
            }
            value += coeff.re * sv.expectation(pauli);
        }

        debug!(value, elapsed = ?start.elapsed(), "Estimated pub");
        Ok(PubResult::new(value).with_stds(0.0))
    }

    fn with_job<T>(&self, job_id: &JobId, f: impl FnOnce(&mut SimJob) -> T) -> HalResult<T> {
        let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        jobs.get_mut(job_id.as_str())
            .map(f)
            .ok_or_else(|| HalError::JobNotFound(job_id.to_string()))
    }
}

impl Default for LocalEstimator {
    fn default() -> Self {
        Self::new()
    }
}

/// Reject circuits that act on a qubit after measuring it.
///
/// Final measurements are dropped for estimation; anything else would change
/// the state being estimated.
fn check_measurements_are_final(circuit: &Circuit) -> HalResult<()> {
    let mut measured = vec![false; circuit.num_qubits()];
    for inst in circuit.instructions() {
        match &inst.kind {
            InstructionKind::Measure => {
                for q in &inst.qubits {
                    measured[q.0 as usize] = true;
                }
            }
            InstructionKind::Gate(gate) => {
                if let Some(q) = inst.qubits.iter().find(|q| measured[q.0 as usize]) {
                    return Err(HalError::Unsupported(format!(
                        "gate {} acts on {q} after it was measured",
                        gate.name()
                    )));
                }
            }
            InstructionKind::Barrier => {}
        }
    }
    Ok(())
}

#[async_trait]
impl QuantumService for LocalEstimator {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "local"
    }

    async fn backends(&self) -> HalResult<Vec<BackendInfo>> {
        Ok(vec![self.backend_info()])
    }

    #[instrument(skip(self, pubs), fields(pubs = pubs.len()))]
    async fn submit_estimator(&self, backend: &str, pubs: &[EstimatorPub]) -> HalResult<JobId> {
        if backend != LOCAL_BACKEND {
            return Err(HalError::BackendUnavailable(format!(
                "{backend} (the local service only runs {LOCAL_BACKEND})"
            )));
        }
        if pubs.is_empty() {
            return Err(HalError::SubmissionFailed(
                "an estimator job needs at least one pub".into(),
            ));
        }
        if let Some(too_wide) = pubs
            .iter()
            .find(|p| p.circuit.num_qubits() > self.max_qubits as usize)
        {
            return Err(HalError::InvalidCircuit(format!(
                "circuit '{}' has {} qubits but the simulator only supports {}",
                too_wide.circuit.name(),
                too_wide.circuit.num_qubits(),
                self.max_qubits
            )));
        }

        let job_id = JobId::new(Uuid::new_v4().to_string());
        {
            let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
            jobs.insert(
                job_id.0.clone(),
                SimJob {
                    job: Job::new(job_id.clone(), backend),
                    result: None,
                },
            );
        }

        self.with_job(&job_id, |j| j.job.transition(JobStatus::Running))?;
        let outcome = pubs
            .iter()
            .map(|p| self.estimate(p))
            .collect::<HalResult<Vec<_>>>();

        match outcome {
            Ok(results) => self.with_job(&job_id, |j| {
                j.result = Some(EstimatorResult::new(results));
                j.job.transition(JobStatus::Completed);
            })?,
            Err(e) => self.with_job(&job_id, |j| j.job.transition(JobStatus::Failed(e.to_string())))?,
        }

        info!(job_id = %job_id, "Local estimator job finished");
        Ok(job_id)
    }

    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus> {
        self.with_job(job_id, |j| j.job.status.clone())
    }

    async fn estimator_result(&self, job_id: &JobId) -> HalResult<EstimatorResult> {
        self.with_job(job_id, |j| match &j.job.status {
            JobStatus::Completed => j
                .result
                .clone()
                .ok_or_else(|| HalError::Backend(format!("Job {} has no result", j.job.id))),
            JobStatus::Failed(msg) => Err(HalError::JobFailed(msg.clone())),
            JobStatus::Cancelled => Err(HalError::JobCancelled),
            JobStatus::Queued | JobStatus::Running => Err(HalError::Backend(format!(
                "Job {} not yet completed",
                j.job.id
            ))),
        })?
    }

    async fn cancel(&self, job_id: &JobId) -> HalResult<()> {
        self.with_job(job_id, |j| j.job.transition(JobStatus::Cancelled))
    }
}

/// Connector for the local estimator. Credentials are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalConnector {
    max_qubits: Option<u32>,
}

impl LocalConnector {
    /// A connector producing estimators with the default qubit limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the number of qubits.
    pub fn with_max_qubits(max_qubits: u32) -> Self {
        Self {
            max_qubits: Some(max_qubits),
        }
    }
}

#[async_trait]
impl SessionConnector for LocalConnector {
    async fn connect(&self, credentials: &Credentials) -> HalResult<Box<dyn QuantumService>> {
        debug!(channel = %credentials.channel(), "Opening local estimator session");
        Ok(Box::new(match self.max_qubits {
            Some(max) => LocalEstimator::with_max_qubits(max),
            None => LocalEstimator::new(),
        }))
    }
}
