//! IBM Quantum estimator service.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};
use xprobe_hal::{
    BackendInfo, Channel, Credentials, EstimatorPub, EstimatorResult, HalError, HalResult, JobId,
    JobStatus, QuantumService, SessionConnector,
};
use xprobe_ir::Circuit;
use xprobe_qasm3::emit;

use crate::api::{
    DEFAULT_ENDPOINT, EstimatorOptions, EstimatorPubWire, IAM_TOKEN_URL, IbmClient,
    LEGACY_ENDPOINT,
};
use crate::error::{IbmError, IbmResult};

/// Convert a circuit to `OpenQASM` 3.0.
///
/// Adds `include "stdgates.inc";` after the version header so that IBM's
/// QASM loader can resolve standard gate definitions.
pub fn circuit_to_qasm(circuit: &Circuit) -> IbmResult<String> {
    let qasm = emit(circuit).map_err(|e| IbmError::CircuitError(e.to_string()))?;
    Ok(qasm.replacen(
        "OPENQASM 3.0;",
        "OPENQASM 3.0;\ninclude \"stdgates.inc\";",
        1,
    ))
}

/// Convert a pub into its wire form.
pub fn pub_to_wire(pub_: &EstimatorPub) -> IbmResult<EstimatorPubWire> {
    let qasm = circuit_to_qasm(&pub_.circuit)?;
    let observable = pub_
        .observable
        .to_real_map()
        .map_err(|e| IbmError::ObservableError(e.to_string()))?;
    Ok(EstimatorPubWire(qasm, observable))
}

/// Estimator service on IBM Quantum.
#[derive(Debug)]
pub struct IbmService {
    client: Arc<IbmClient>,
    options: EstimatorOptions,
}

impl IbmService {
    /// Wrap a connected client.
    pub fn new(client: IbmClient) -> Self {
        Self {
            client: Arc::new(client),
            options: EstimatorOptions::default(),
        }
    }

    /// Set estimator options sent with every job.
    pub fn with_options(mut self, options: EstimatorOptions) -> Self {
        self.options = options;
        self
    }
}

#[async_trait]
impl QuantumService for IbmService {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "ibm"
    }

    async fn backends(&self) -> HalResult<Vec<BackendInfo>> {
        let backends = self.client.list_backends().await?;
        Ok(backends.into_iter().map(BackendInfo::from).collect())
    }

    async fn submit_estimator(&self, backend: &str, pubs: &[EstimatorPub]) -> HalResult<JobId> {
        if pubs.is_empty() {
            return Err(HalError::SubmissionFailed(
                "an estimator job needs at least one pub".into(),
            ));
        }

        let info = self.client.get_backend(backend).await?;
        if !info.status.operational {
            return Err(HalError::BackendUnavailable(
                info.status
                    .status_msg
                    .unwrap_or_else(|| format!("{backend} is offline")),
            ));
        }
        if let Some(too_wide) = pubs
            .iter()
            .find(|p| p.circuit.num_qubits() > info.num_qubits as usize)
        {
            return Err(HalError::InvalidCircuit(format!(
                "circuit '{}' requires {} qubits but {backend} only has {}",
                too_wide.circuit.name(),
                too_wide.circuit.num_qubits(),
                info.num_qubits
            )));
        }

        let wire = pubs.iter().map(pub_to_wire).collect::<IbmResult<Vec<_>>>()?;

        let response = self
            .client
            .submit_estimator_job(backend, wire, &self.options)
            .await
            .map_err(|e| match e {
                IbmError::ApiError { .. } => HalError::SubmissionFailed(e.to_string()),
                other => other.into(),
            })?;

        info!(job_id = %response.id, backend, "Estimator job submitted");
        Ok(JobId(response.id))
    }

    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus> {
        let response = self.client.get_job_status(job_id.as_str()).await?;
        debug!(job_id = %job_id, status = %response.status, "IBM job status");
        Ok(response.to_job_status())
    }

    async fn estimator_result(&self, job_id: &JobId) -> HalResult<EstimatorResult> {
        match self.status(job_id).await? {
            JobStatus::Completed => {}
            JobStatus::Failed(msg) => return Err(HalError::JobFailed(msg)),
            JobStatus::Cancelled => return Err(HalError::JobCancelled),
            JobStatus::Queued | JobStatus::Running => {
                return Err(HalError::Backend(format!("Job {job_id} not yet completed")));
            }
        }

        let result = self.client.get_job_results(job_id.as_str()).await?;
        if result.pubs.is_empty() {
            return Err(HalError::Backend(format!("Job {job_id} returned no results")));
        }
        Ok(result)
    }

    async fn cancel(&self, job_id: &JobId) -> HalResult<()> {
        self.client.cancel_job(job_id.as_str()).await?;
        info!(job_id = %job_id, "Cancelled IBM job");
        Ok(())
    }
}

/// Opens IBM Quantum sessions.
#[derive(Debug, Clone, Default)]
pub struct IbmConnector {
    endpoint: Option<String>,
    iam_url: Option<String>,
    options: EstimatorOptions,
}

impl IbmConnector {
    /// A connector for the public IBM endpoints.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the API endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Override the IAM token endpoint.
    pub fn with_iam_url(mut self, iam_url: impl Into<String>) -> Self {
        self.iam_url = Some(iam_url.into());
        self
    }

    /// Estimator options for sessions opened by this connector.
    pub fn with_options(mut self, options: EstimatorOptions) -> Self {
        self.options = options;
        self
    }

    async fn open(&self, credentials: &Credentials) -> IbmResult<IbmClient> {
        match credentials.channel() {
            Channel::IbmQuantumPlatform | Channel::IbmCloud => {
                let crn = credentials.instance().ok_or(IbmError::MissingServiceCrn)?;
                let endpoint = self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT);
                let iam_url = self.iam_url.as_deref().unwrap_or(IAM_TOKEN_URL);
                info!(channel = %credentials.channel(), endpoint, "Connecting to IBM Cloud API");
                IbmClient::connect_with(iam_url, endpoint, credentials.token(), crn).await
            }
            Channel::IbmQuantum => {
                let endpoint = self.endpoint.as_deref().unwrap_or(LEGACY_ENDPOINT);
                info!(endpoint, "Connecting with legacy IBM Quantum token");
                let client = IbmClient::legacy(endpoint, credentials.token())?;
                Ok(match credentials.instance() {
                    Some(instance) => client.with_instance(instance),
                    None => client,
                })
            }
            Channel::Local => Err(IbmError::UnsupportedChannel(
                credentials.channel().to_string(),
            )),
        }
    }
}

#[async_trait]
impl SessionConnector for IbmConnector {
    async fn connect(&self, credentials: &Credentials) -> HalResult<Box<dyn QuantumService>> {
        let client = self.open(credentials).await?;
        Ok(Box::new(
            IbmService::new(client).with_options(self.options.clone()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xprobe_ir::SparsePauliOp;

    #[test]
    fn test_circuit_to_qasm_includes_stdgates() {
        let qasm = circuit_to_qasm(&Circuit::x_probe()).unwrap();
        assert!(qasm.starts_with("OPENQASM 3.0;\ninclude \"stdgates.inc\";\n"));
        assert_eq!(qasm.matches("include").count(), 1);
        assert!(qasm.contains("x q[0];"));
        assert!(qasm.contains("c[0] = measure q[0];"));
    }

    #[test]
    fn test_pub_to_wire() {
        let pub_ =
            EstimatorPub::new(Circuit::x_probe(), SparsePauliOp::from_label("Z").unwrap())
                .unwrap();
        let wire = pub_to_wire(&pub_).unwrap();
        assert!(wire.0.contains("qubit[1] q;"));
        assert_eq!(wire.1.get("Z"), Some(&1.0));
        assert_eq!(wire.1.len(), 1);
    }

    #[tokio::test]
    async fn test_connector_rejects_local_channel() {
        let err = IbmConnector::new()
            .connect(&Credentials::local())
            .await
            .err()
            .unwrap();
        assert!(err.is_auth(), "{err:?}");
    }

    #[tokio::test]
    async fn test_connector_requires_crn() {
        let creds = Credentials::new(Channel::IbmQuantumPlatform, "key");
        let err = IbmConnector::new().connect(&creds).await.err().unwrap();
        assert!(err.is_auth());
    }

    #[tokio::test]
    async fn test_legacy_connect_is_lazy() {
        let creds = Credentials::new(Channel::IbmQuantum, "token").with_instance("ibm-q/open/main");
        let service = IbmConnector::new()
            .with_endpoint("https://example.invalid")
            .connect(&creds)
            .await
            .unwrap();
        assert_eq!(service.name(), "ibm");
    }
}
