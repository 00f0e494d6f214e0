//! Tests for the provided `least_busy` and `wait` methods of `QuantumService`.
//!
//! `ScriptedService` replays a fixed sequence of job statuses, then repeats
//! the last one forever.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use xprobe_hal::{
    BackendFilter, BackendInfo, EstimatorPub, EstimatorResult, HalError, HalResult, JobId,
    JobStatus, PubResult, QuantumService, WaitOptions,
};

struct ScriptedService {
    backends: Vec<BackendInfo>,
    statuses: Mutex<VecDeque<JobStatus>>,
    polls: AtomicU32,
    cancels: AtomicU32,
}

impl ScriptedService {
    fn new(statuses: impl IntoIterator<Item = JobStatus>) -> Self {
        Self {
            backends: vec![
                BackendInfo::new("mock_backend_1", 5).with_pending_jobs(Some(2)),
                BackendInfo::new("mock_backend_2", 5).with_pending_jobs(Some(9)),
            ],
            statuses: Mutex::new(statuses.into_iter().collect()),
            polls: AtomicU32::new(0),
            cancels: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl QuantumService for ScriptedService {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "scripted"
    }

    async fn backends(&self) -> HalResult<Vec<BackendInfo>> {
        Ok(self.backends.clone())
    }

    async fn submit_estimator(&self, _backend: &str, _pubs: &[EstimatorPub]) -> HalResult<JobId> {
        Ok(JobId::new("scripted-0"))
    }

    async fn status(&self, _job_id: &JobId) -> HalResult<JobStatus> {
        self.polls.fetch_add(1, Ordering::Relaxed);
        let mut statuses = self.statuses.lock().unwrap();
        if statuses.len() > 1 {
            Ok(statuses.pop_front().unwrap())
        } else {
            Ok(statuses.front().cloned().unwrap_or(JobStatus::Queued))
        }
    }

    async fn estimator_result(&self, _job_id: &JobId) -> HalResult<EstimatorResult> {
        Ok(EstimatorResult::new(vec![PubResult::new(-0.87)]))
    }

    async fn cancel(&self, _job_id: &JobId) -> HalResult<()> {
        self.cancels.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

#[tokio::test]
async fn least_busy_uses_backend_list() {
    let service = ScriptedService::new([JobStatus::Completed]);
    let chosen = service.least_busy(&BackendFilter::hardware()).await.unwrap();
    assert_eq!(chosen.name, "mock_backend_1");
}

#[tokio::test(start_paused = true)]
async fn wait_polls_until_completed() {
    let service = ScriptedService::new([
        JobStatus::Queued,
        JobStatus::Queued,
        JobStatus::Running,
        JobStatus::Completed,
    ]);
    let result = service
        .wait(&JobId::new("scripted-0"), &WaitOptions::default())
        .await
        .unwrap();

    assert_eq!(result.pubs[0].data.evs.first(), Some(-0.87));
    assert_eq!(service.polls.load(Ordering::Relaxed), 4);
    assert_eq!(service.cancels.load(Ordering::Relaxed), 0);
}

#[tokio::test(start_paused = true)]
async fn wait_reports_failure_reason() {
    let service = ScriptedService::new([
        JobStatus::Running,
        JobStatus::Failed("calibration drift".into()),
    ]);
    let err = service
        .wait(&JobId::new("scripted-0"), &WaitOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, HalError::JobFailed(msg) if msg == "calibration drift"));
}

#[tokio::test(start_paused = true)]
async fn wait_reports_cancellation() {
    let service = ScriptedService::new([JobStatus::Cancelled]);
    let err = service
        .wait(&JobId::new("scripted-0"), &WaitOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, HalError::JobCancelled));
}

#[tokio::test(start_paused = true)]
async fn wait_without_timeout_keeps_polling() {
    let service = ScriptedService::new([JobStatus::Queued]);
    let options = WaitOptions::default().with_poll_interval(Duration::from_secs(1));
    let job = JobId::new("scripted-0");

    let outcome = tokio::time::timeout(Duration::from_secs(3600), service.wait(&job, &options)).await;
    assert!(outcome.is_err(), "wait returned although the job never finished");
    assert!(service.polls.load(Ordering::Relaxed) > 100);
    assert_eq!(service.cancels.load(Ordering::Relaxed), 0);
}

#[tokio::test(start_paused = true)]
async fn wait_timeout_cancels_job() {
    let service = ScriptedService::new([JobStatus::Queued]);
    let options = WaitOptions::default()
        .with_poll_interval(Duration::from_secs(2))
        .with_timeout(Duration::from_secs(10));

    let err = service
        .wait(&JobId::new("scripted-0"), &options)
        .await
        .unwrap_err();

    assert!(matches!(err, HalError::Timeout(id) if id == "scripted-0"));
    assert_eq!(service.cancels.load(Ordering::Relaxed), 1);
}
