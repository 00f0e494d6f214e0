//! The hardware smoke test.
//!
//! Builds the X probe, opens a session, picks the least busy backend, runs
//! one estimator job measuring Pauli-Z and reports the expectation value.
//! Every failure after the circuit is printed ends in the same guidance
//! block; the caller gets a [`WorkflowOutcome`] instead of an error.

use std::io::{self, Write};
use std::time::Duration;

use console::Term;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use xprobe_hal::{
    BackendFilter, Credentials, EstimatorPub, EstimatorResult, ExpectationValues, HalError,
    HalResult, JobId, QuantumService, SessionConnector, WaitOptions,
};
use xprobe_ir::{Circuit, SparsePauliOp, draw};

/// How the smoke test selects a backend and waits for the job.
#[derive(Debug, Clone, Copy)]
pub struct SmokeTestOptions {
    /// Backend selection constraints.
    pub filter: BackendFilter,
    /// Polling and timeout behaviour.
    pub wait: WaitOptions,
    /// Show a spinner on stderr while waiting (only drawn on a terminal).
    pub progress: bool,
}

impl Default for SmokeTestOptions {
    fn default() -> Self {
        Self {
            filter: BackendFilter::hardware(),
            wait: WaitOptions::default(),
            progress: true,
        }
    }
}

/// How a smoke test run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowOutcome {
    /// The job completed.
    Success {
        /// Backend the job ran on.
        backend: String,
        /// Remote job id.
        job_id: JobId,
        /// Expectation values of the first pub.
        evs: ExpectationValues,
    },
    /// Credentials were missing or rejected.
    AuthError(String),
    /// No usable backend.
    BackendUnavailable(String),
    /// Submission, execution or retrieval failed.
    ExecutionError(String),
}

impl WorkflowOutcome {
    /// Classify a service error.
    pub fn from_error(err: &HalError) -> Self {
        if err.is_auth() {
            WorkflowOutcome::AuthError(err.to_string())
        } else if err.is_backend_unavailable() {
            WorkflowOutcome::BackendUnavailable(err.to_string())
        } else {
            WorkflowOutcome::ExecutionError(err.to_string())
        }
    }

    /// Whether the job completed.
    pub fn is_success(&self) -> bool {
        matches!(self, WorkflowOutcome::Success { .. })
    }

    /// Process exit status for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            WorkflowOutcome::Success { .. } => 0,
            WorkflowOutcome::AuthError(_) => 2,
            WorkflowOutcome::BackendUnavailable(_) => 3,
            WorkflowOutcome::ExecutionError(_) => 4,
        }
    }
}

/// Failure inside the guarded part of the run.
enum StepError {
    Output(io::Error),
    Service(HalError),
}

impl From<io::Error> for StepError {
    fn from(e: io::Error) -> Self {
        StepError::Output(e)
    }
}

impl From<HalError> for StepError {
    fn from(e: HalError) -> Self {
        StepError::Service(e)
    }
}

/// Run the smoke test, writing the report to `out`.
///
/// Nothing touches the network before the circuit has been printed.
/// Only failures to write `out` are returned as errors.
pub async fn run_smoke_test<W: Write>(
    out: &mut W,
    connector: &dyn SessionConnector,
    credentials: HalResult<Credentials>,
    options: &SmokeTestOptions,
) -> io::Result<WorkflowOutcome> {
    let circuit = Circuit::x_probe();

    writeln!(out, "Quantum Circuit:")?;
    writeln!(out, "{}", draw(&circuit))?;
    writeln!(out, "\n--- Attempting to run on real hardware ---")?;
    out.flush()?;

    match execute(out, circuit, connector, credentials, options).await {
        Ok(outcome) => Ok(outcome),
        Err(StepError::Output(e)) => Err(e),
        Err(StepError::Service(err)) => {
            let outcome = WorkflowOutcome::from_error(&err);
            warn!(error = %err, exit_code = outcome.exit_code(), "Smoke test failed");
            print_guidance(out, &err)?;
            Ok(outcome)
        }
    }
}

async fn execute<W: Write>(
    out: &mut W,
    circuit: Circuit,
    connector: &dyn SessionConnector,
    credentials: HalResult<Credentials>,
    options: &SmokeTestOptions,
) -> Result<WorkflowOutcome, StepError> {
    let observable = SparsePauliOp::from_label("Z").map_err(HalError::from)?;
    let pub_ = EstimatorPub::new(circuit, observable)?;

    let credentials = credentials?;
    info!(channel = %credentials.channel(), "Opening session");
    let service = connector.connect(&credentials).await?;

    let backend = service.least_busy(&options.filter).await?;
    writeln!(out, "Least busy backend found: {}", backend.name)?;

    let job_id = service
        .submit_estimator(&backend.name, std::slice::from_ref(&pub_))
        .await?;
    writeln!(out, "Job ID: {job_id}")?;
    writeln!(out, "Job sent to the backend. Waiting for results...")?;
    out.flush()?;
    info!(job_id = %job_id, backend = %backend.name, "Waiting for estimator job");

    let result = wait_with_progress(service.as_ref(), &job_id, options).await?;
    let evs = result
        .first()
        .map(|pub_result| pub_result.data.evs.clone())
        .ok_or_else(|| HalError::Backend(format!("Job {job_id} returned no results")))?;
    info!(job_id = %job_id, %evs, "Estimator job completed");

    writeln!(out, "\nHardware Result (Expectation Value): {evs}")?;
    writeln!(
        out,
        "For an ideal X-gate, the state is |1>, and the expected Z value is -1."
    )?;

    Ok(WorkflowOutcome::Success {
        backend: backend.name,
        job_id,
        evs,
    })
}

async fn wait_with_progress(
    service: &dyn QuantumService,
    job_id: &JobId,
    options: &SmokeTestOptions,
) -> HalResult<EstimatorResult> {
    let spinner = if options.progress && Term::stderr().is_term() {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) =
            ProgressStyle::default_spinner().template("{spinner:.cyan} {msg} [{elapsed}]")
        {
            spinner.set_style(style);
        }
        spinner.set_message(format!("Waiting for job {job_id}"));
        spinner.enable_steady_tick(Duration::from_millis(120));
        spinner
    } else {
        ProgressBar::hidden()
    };

    let result = service.wait(job_id, &options.wait).await;
    spinner.finish_and_clear();
    result
}

fn print_guidance<W: Write>(out: &mut W, err: &HalError) -> io::Result<()> {
    writeln!(out, "\nCould not connect to IBM Quantum hardware.")?;
    writeln!(
        out,
        "Please ensure you have an IBM Quantum account and have provided your API credentials."
    )?;
    writeln!(
        out,
        "You can provide them with: export IBM_API_KEY=<key> IBM_SERVICE_CRN=<crn> (or IBM_QUANTUM_TOKEN=<token>)"
    )?;
    writeln!(out, "Error details: {err}")?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_classification() {
        let auth = WorkflowOutcome::from_error(&HalError::AuthenticationFailed("401".into()));
        assert!(matches!(auth, WorkflowOutcome::AuthError(_)));
        assert_eq!(auth.exit_code(), 2);

        let missing = WorkflowOutcome::from_error(&HalError::Auth("no key".into()));
        assert!(matches!(missing, WorkflowOutcome::AuthError(_)));

        let none = WorkflowOutcome::from_error(&HalError::NoEligibleBackend("sim=false".into()));
        assert!(matches!(none, WorkflowOutcome::BackendUnavailable(_)));
        assert_eq!(none.exit_code(), 3);

        let failed = WorkflowOutcome::from_error(&HalError::JobFailed("boom".into()));
        assert!(matches!(failed, WorkflowOutcome::ExecutionError(msg) if msg.contains("boom")));

        let timeout = WorkflowOutcome::from_error(&HalError::Timeout("j".into()));
        assert_eq!(timeout.exit_code(), 4);
    }

    #[test]
    fn test_success_exit_code() {
        let outcome = WorkflowOutcome::Success {
            backend: "ibm_test".into(),
            job_id: JobId::new("j1"),
            evs: ExpectationValues::Scalar(-0.9),
        };
        assert!(outcome.is_success());
        assert_eq!(outcome.exit_code(), 0);
    }

    #[test]
    fn test_guidance_block() {
        let mut out = Vec::new();
        print_guidance(&mut out, &HalError::Auth("missing".into())).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "");
        assert_eq!(lines[1], "Could not connect to IBM Quantum hardware.");
        assert!(lines[3].contains("IBM_API_KEY"));
        assert_eq!(lines[4], "Error details: Authentication error: missing");
    }
}
