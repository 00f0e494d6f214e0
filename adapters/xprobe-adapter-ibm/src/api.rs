//! IBM Quantum Platform API client.
//!
//! This module implements the parts of the IBM Quantum REST API the
//! estimator flow needs:
//! - Authentication via IAM token exchange (API key flow)
//! - Listing backends with their configuration and queue status
//! - Submitting estimator jobs (Qiskit Runtime V2 primitives)
//! - Polling job status, fetching results and cancelling
//!
//! Supports both the IBM Cloud API (`quantum.cloud.ibm.com/api`) and the
//! legacy endpoint (`api.quantum-computing.ibm.com`).

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode, header};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use xprobe_hal::{EstimatorResult, JobStatus};

use crate::error::{IbmError, IbmResult};

/// Default IBM Quantum Cloud API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://quantum.cloud.ibm.com/api";

/// Legacy IBM Quantum API endpoint.
pub const LEGACY_ENDPOINT: &str = "https://api.quantum-computing.ibm.com";

/// IBM Cloud IAM token endpoint.
pub const IAM_TOKEN_URL: &str = "https://iam.cloud.ibm.com/identity/token";

/// IBM API version header value.
const IBM_API_VERSION: &str = "2026-02-01";

/// User-Agent sent with requests (Cloudflare blocks the default reqwest UA).
const USER_AGENT: &str = concat!("xprobe/", env!("CARGO_PKG_VERSION"));

const IAM_GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:apikey";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Refresh an IAM token this long before it expires.
const IAM_REFRESH_BUFFER: Duration = Duration::from_secs(300);

/// Lifetime assumed when IAM omits `expires_in`.
const IAM_DEFAULT_LIFETIME: Duration = Duration::from_secs(3600);

/// IBM Quantum API client.
///
/// On the Cloud API the client holds the API key and re-exchanges it for a
/// fresh IAM bearer token shortly before the current one expires, and once
/// more if the API rejects a token it still considered valid.
pub struct IbmClient {
    /// HTTP client with the static headers preset.
    client: Client,
    /// API endpoint URL, without trailing slash.
    endpoint: String,
    /// How requests are authorized.
    auth: Auth,
    /// Instance (hub/group/project) sent with legacy submissions.
    instance: Option<String>,
}

/// Request authorization.
enum Auth {
    /// Legacy token, sent as the bearer token as-is.
    Static(String),
    /// IBM Cloud API key, exchanged for short-lived IAM tokens.
    Iam(IamSession),
}

impl fmt::Debug for IbmClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IbmClient")
            .field("endpoint", &self.endpoint)
            .field("token", &"[REDACTED]")
            .field("instance", &self.instance)
            .field("cloud_api", &self.is_cloud_api())
            .finish()
    }
}

/// IAM token response from `iam.cloud.ibm.com`.
#[derive(Debug, Deserialize)]
struct IamTokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// A bearer token with its expiry.
#[derive(Clone)]
struct IamToken {
    access_token: String,
    expires_at: Instant,
}

impl IamToken {
    fn expires_soon(&self) -> bool {
        Instant::now() + IAM_REFRESH_BUFFER >= self.expires_at
    }
}

/// API key plus the current IAM token.
struct IamSession {
    client: Client,
    iam_url: String,
    api_key: String,
    token: Arc<RwLock<Option<IamToken>>>,
}

impl IamSession {
    /// The current token, exchanging the API key when it is missing or
    /// about to expire.
    async fn bearer(&self) -> IbmResult<String> {
        {
            let token = self.token.read().await;
            if let Some(t) = token.as_ref().filter(|t| !t.expires_soon()) {
                return Ok(t.access_token.clone());
            }
        }
        self.refresh(None).await
    }

    /// Exchange the API key for a new token.
    ///
    /// With `rejected` set, another caller that already replaced that token
    /// wins and its token is returned without a second exchange.
    async fn refresh(&self, rejected: Option<&str>) -> IbmResult<String> {
        let mut token = self.token.write().await;
        if let Some(t) = token.as_ref() {
            let replaced = rejected.is_some_and(|r| r != t.access_token);
            let fresh = rejected.is_none() && !t.expires_soon();
            if replaced || fresh {
                return Ok(t.access_token.clone());
            }
        }

        let issued = self.exchange().await?;
        let access_token = issued.access_token.clone();
        *token = Some(issued);
        Ok(access_token)
    }

    async fn exchange(&self) -> IbmResult<IamToken> {
        info!("Exchanging API key for an IAM token");
        let response = self
            .client
            .post(&self.iam_url)
            .header(header::ACCEPT, "application/json")
            .form(&[("grant_type", IAM_GRANT_TYPE), ("apikey", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| IbmError::IamTokenExchange(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "no body".to_string());
            return Err(IbmError::IamTokenExchange(format!(
                "IAM returned {status}: {body}"
            )));
        }

        let issued: IamTokenResponse = response.json().await.map_err(|e| {
            IbmError::IamTokenExchange(format!("failed to parse IAM response: {e}"))
        })?;
        debug!(expires_in = ?issued.expires_in, "IAM token issued");

        let lifetime = issued
            .expires_in
            .map_or(IAM_DEFAULT_LIFETIME, Duration::from_secs);
        Ok(IamToken {
            access_token: issued.access_token,
            expires_at: Instant::now() + lifetime,
        })
    }
}

fn static_headers() -> header::HeaderMap {
    let mut headers = header::HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("application/json"),
    );
    headers.insert(
        header::ACCEPT,
        header::HeaderValue::from_static("application/json"),
    );
    headers
}

fn build_client(headers: header::HeaderMap) -> IbmResult<Client> {
    Ok(Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .timeout(REQUEST_TIMEOUT)
        .connect_timeout(CONNECT_TIMEOUT)
        .build()?)
}

fn bearer_header(token: &str) -> IbmResult<header::HeaderValue> {
    header::HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| IbmError::InvalidToken)
}

/// Turn a non-success response into an error.
async fn error_from(response: Response, context: &str) -> IbmError {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "no body".to_string());

    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        return IbmError::Unauthorized {
            status: status.as_u16(),
            message: body,
        };
    }

    match serde_json::from_str::<ApiErrorResponse>(&body) {
        Ok(error) if !error.message.is_empty() => IbmError::ApiError {
            code: error.code,
            message: format!("{context}: {}", error.message),
        },
        _ => IbmError::ApiError {
            code: None,
            message: format!("{context} ({status}): {body}"),
        },
    }
}

impl IbmClient {
    /// Create a client for the legacy direct-token mode.
    ///
    /// The token is used as the bearer token as-is. Nothing is sent until
    /// the first request, so a bad token surfaces there.
    pub fn legacy(endpoint: impl Into<String>, token: &str) -> IbmResult<Self> {
        if token.trim().is_empty() {
            return Err(IbmError::MissingToken);
        }
        bearer_header(token)?;

        Ok(Self {
            client: build_client(static_headers())?,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            auth: Auth::Static(token.to_string()),
            instance: None,
        })
    }

    /// Create a client for the IBM Cloud API key flow.
    pub async fn connect(api_key: &str, service_crn: &str) -> IbmResult<Self> {
        Self::connect_with(IAM_TOKEN_URL, DEFAULT_ENDPOINT, api_key, service_crn).await
    }

    /// Like [`IbmClient::connect`], with explicit IAM and API endpoints.
    ///
    /// Exchanges the API key for a first IAM token, so bad credentials fail
    /// here, and sends the `Service-CRN` header the Cloud API requires on
    /// every request.
    pub async fn connect_with(
        iam_url: &str,
        endpoint: &str,
        api_key: &str,
        service_crn: &str,
    ) -> IbmResult<Self> {
        if api_key.trim().is_empty() {
            return Err(IbmError::MissingToken);
        }
        if service_crn.trim().is_empty() {
            return Err(IbmError::MissingServiceCrn);
        }

        let mut headers = static_headers();
        headers.insert(
            header::HeaderName::from_static("service-crn"),
            header::HeaderValue::from_str(service_crn)
                .map_err(|_| IbmError::InvalidServiceCrn)?,
        );
        headers.insert(
            header::HeaderName::from_static("ibm-api-version"),
            header::HeaderValue::from_static(IBM_API_VERSION),
        );

        let session = IamSession {
            client: Client::builder()
                .user_agent(USER_AGENT)
                .timeout(Duration::from_secs(30))
                .connect_timeout(CONNECT_TIMEOUT)
                .build()?,
            iam_url: iam_url.to_string(),
            api_key: api_key.to_string(),
            token: Arc::new(RwLock::new(None)),
        };
        session.refresh(None).await?;

        Ok(Self {
            client: build_client(headers)?,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            auth: Auth::Iam(session),
            instance: None,
        })
    }

    /// Set the instance (hub/group/project) for legacy job submission.
    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    fn is_cloud_api(&self) -> bool {
        matches!(self.auth, Auth::Iam(_))
    }

    async fn bearer(&self) -> IbmResult<String> {
        match &self.auth {
            Auth::Static(token) => Ok(token.clone()),
            Auth::Iam(session) => session.bearer().await,
        }
    }

    /// Send an authorized request; on a 401 with an IAM session, exchange
    /// the API key once and resend.
    async fn send<F>(&self, request: F) -> IbmResult<Response>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let token = self.bearer().await?;
        let response = request(&self.client)
            .header(header::AUTHORIZATION, bearer_header(&token)?)
            .send()
            .await?;

        match &self.auth {
            Auth::Iam(session) if response.status() == StatusCode::UNAUTHORIZED => {
                warn!("IAM token rejected, exchanging the API key again");
                let token = session.refresh(Some(token.as_str())).await?;
                Ok(request(&self.client)
                    .header(header::AUTHORIZATION, bearer_header(&token)?)
                    .send()
                    .await?)
            }
            _ => Ok(response),
        }
    }

    /// Get available backends.
    ///
    /// On the Cloud API this fetches the device list and then the
    /// configuration and status of each device.
    pub async fn list_backends(&self) -> IbmResult<Vec<BackendInfo>> {
        if self.is_cloud_api() {
            self.list_backends_cloud().await
        } else {
            self.list_backends_legacy().await
        }
    }

    async fn list_backends_cloud(&self) -> IbmResult<Vec<BackendInfo>> {
        let url = format!("{}/v1/backends", self.endpoint);
        let response = self.send(|c| c.get(&url)).await?;
        if !response.status().is_success() {
            return Err(error_from(response, "list backends failed").await);
        }

        let devices: DevicesResponse = response.json().await?;
        debug!(count = devices.devices.len(), "Listed devices");
        let mut backends = Vec::with_capacity(devices.devices.len());

        for device in &devices.devices {
            match self.get_backend(&device.name).await {
                Ok(info) => backends.push(info),
                // Credential problems affect every device; stop early.
                Err(e @ IbmError::Unauthorized { .. }) => return Err(e),
                Err(e) => warn!(backend = %device.name, error = %e, "Skipping backend"),
            }
        }

        Ok(backends)
    }

    async fn list_backends_legacy(&self) -> IbmResult<Vec<BackendInfo>> {
        let url = format!("{}/v1/backends", self.endpoint);
        let response = self.send(|c| c.get(&url)).await?;
        if !response.status().is_success() {
            return Err(error_from(response, "list backends failed").await);
        }

        let backends: LegacyBackendsResponse = response.json().await?;
        Ok(backends.backends)
    }

    /// Get details for a specific backend.
    pub async fn get_backend(&self, name: &str) -> IbmResult<BackendInfo> {
        if self.is_cloud_api() {
            self.get_backend_cloud(name).await
        } else {
            self.get_backend_legacy(name).await
        }
    }

    /// Merge `/configuration` and `/status` into one `BackendInfo`.
    async fn get_backend_cloud(&self, name: &str) -> IbmResult<BackendInfo> {
        let config_url = format!("{}/v1/backends/{}/configuration", self.endpoint, name);
        let config_response = self.send(|c| c.get(&config_url)).await?;

        if !config_response.status().is_success() {
            if config_response.status() == StatusCode::NOT_FOUND {
                return Err(IbmError::BackendUnavailable(name.to_string()));
            }
            return Err(error_from(
                config_response,
                &format!("backend configuration failed for {name}"),
            )
            .await);
        }
        let config: BackendConfigResponse = config_response.json().await?;

        let status_url = format!("{}/v1/backends/{}/status", self.endpoint, name);
        let status_response = self.send(|c| c.get(&status_url)).await?;

        let status = if status_response.status().is_success() {
            let s: BackendStatusResponse = status_response.json().await?;
            s.into()
        } else {
            // Configuration succeeded, so assume operational with an unknown queue.
            debug!(backend = name, status = %status_response.status(), "Backend status unavailable");
            BackendStatus {
                operational: true,
                status_msg: None,
                pending_jobs: None,
            }
        };

        Ok(BackendInfo {
            name: config.backend_name,
            num_qubits: config.n_qubits,
            status,
            simulator: config.simulator.unwrap_or(false),
        })
    }

    async fn get_backend_legacy(&self, name: &str) -> IbmResult<BackendInfo> {
        let url = format!("{}/v1/backends/{}", self.endpoint, name);
        let response = self.send(|c| c.get(&url)).await?;

        if !response.status().is_success() {
            if response.status() == StatusCode::NOT_FOUND {
                return Err(IbmError::BackendUnavailable(name.to_string()));
            }
            return Err(error_from(response, &format!("backend lookup failed for {name}")).await);
        }

        response.json().await.map_err(IbmError::from)
    }

    /// Submit a job to the V2 Estimator primitive.
    pub async fn submit_estimator_job(
        &self,
        backend: &str,
        pubs: Vec<EstimatorPubWire>,
        options: &EstimatorOptions,
    ) -> IbmResult<SubmitResponse> {
        let url = format!("{}/v1/jobs", self.endpoint);
        let request = EstimatorJobRequest::new(backend, pubs, options.clone())
            .with_hub(if self.is_cloud_api() {
                None
            } else {
                self.instance.clone()
            });

        debug!(backend, pubs = request.params.pubs.len(), "Submitting estimator job");
        let response = self.send(|c| c.post(&url).json(&request)).await?;

        if !response.status().is_success() {
            return Err(error_from(response, "job submission failed").await);
        }

        response.json().await.map_err(IbmError::from)
    }

    /// Get job status.
    pub async fn get_job_status(&self, job_id: &str) -> IbmResult<JobStatusResponse> {
        let url = format!("{}/v1/jobs/{}", self.endpoint, job_id);
        let response = self.send(|c| c.get(&url)).await?;

        if !response.status().is_success() {
            if response.status() == StatusCode::NOT_FOUND {
                return Err(IbmError::JobNotFound(job_id.to_string()));
            }
            return Err(error_from(response, "job status failed").await);
        }

        response.json().await.map_err(IbmError::from)
    }

    /// Get estimator results.
    pub async fn get_job_results(&self, job_id: &str) -> IbmResult<EstimatorResult> {
        let url = format!("{}/v1/jobs/{}/results", self.endpoint, job_id);
        let response = self.send(|c| c.get(&url)).await?;

        if !response.status().is_success() {
            if response.status() == StatusCode::NOT_FOUND {
                return Err(IbmError::JobNotFound(job_id.to_string()));
            }
            return Err(error_from(response, "job results failed").await);
        }

        response.json().await.map_err(IbmError::from)
    }

    /// Cancel a job.
    pub async fn cancel_job(&self, job_id: &str) -> IbmResult<()> {
        let url = format!("{}/v1/jobs/{}/cancel", self.endpoint, job_id);
        let response = self.send(|c| c.post(&url)).await?;

        if !response.status().is_success() {
            if response.status() == StatusCode::NOT_FOUND {
                return Err(IbmError::JobNotFound(job_id.to_string()));
            }
            return Err(error_from(response, "job cancel failed").await);
        }

        Ok(())
    }
}

// ============================================================================
// Request types
// ============================================================================

/// One estimator pub on the wire: `[qasm, {label: coefficient}]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EstimatorPubWire(pub String, pub BTreeMap<String, f64>);

/// Estimator options forwarded to the runtime. Unset fields use its defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EstimatorOptions {
    /// Error mitigation level (0-2).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resilience_level: Option<u8>,
    /// Shots per pub when no precision is requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_shots: Option<u32>,
}

/// Estimator job request.
#[derive(Debug, Serialize)]
struct EstimatorJobRequest<'a> {
    /// Program ID.
    program_id: &'static str,
    /// Backend name.
    backend: &'a str,
    /// Instance (hub/group/project), legacy only.
    #[serde(skip_serializing_if = "Option::is_none")]
    hub: Option<String>,
    /// Primitive parameters.
    params: EstimatorParams,
}

impl<'a> EstimatorJobRequest<'a> {
    fn new(backend: &'a str, pubs: Vec<EstimatorPubWire>, options: EstimatorOptions) -> Self {
        Self {
            program_id: "estimator",
            backend,
            hub: None,
            params: EstimatorParams {
                version: 2,
                pubs,
                options,
            },
        }
    }

    fn with_hub(mut self, hub: Option<String>) -> Self {
        self.hub = hub;
        self
    }
}

/// V2 estimator parameters.
#[derive(Debug, Serialize)]
struct EstimatorParams {
    version: u8,
    pubs: Vec<EstimatorPubWire>,
    options: EstimatorOptions,
}

// ============================================================================
// Response types
// ============================================================================

/// API error response.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: String,
}

/// Cloud API device list (`{"devices": [...]}`).
#[derive(Debug, Deserialize)]
struct DevicesResponse {
    devices: Vec<DeviceEntry>,
}

#[derive(Debug, Deserialize)]
struct DeviceEntry {
    name: String,
}

/// Legacy API backend list (`{"backends": [...]}`).
#[derive(Debug, Deserialize)]
struct LegacyBackendsResponse {
    backends: Vec<BackendInfo>,
}

/// Cloud API `/backends/{name}/configuration`.
#[derive(Debug, Deserialize)]
struct BackendConfigResponse {
    backend_name: String,
    n_qubits: u32,
    #[serde(default)]
    simulator: Option<bool>,
}

/// Cloud API `/backends/{name}/status`.
#[derive(Debug, Deserialize)]
struct BackendStatusResponse {
    state: bool,
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    length_queue: Option<u64>,
}

impl From<BackendStatusResponse> for BackendStatus {
    fn from(s: BackendStatusResponse) -> Self {
        let status_msg = match (s.status.is_empty(), s.message.is_empty()) {
            (true, true) => None,
            (false, true) => Some(s.status),
            (true, false) => Some(s.message),
            (false, false) => Some(format!("{}: {}", s.status, s.message)),
        };
        Self {
            operational: s.state,
            status_msg,
            pending_jobs: s
                .length_queue
                .map(|q| u32::try_from(q).unwrap_or(u32::MAX)),
        }
    }
}

/// Backend information.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendInfo {
    /// Backend name.
    pub name: String,
    /// Number of qubits.
    pub num_qubits: u32,
    /// Backend status.
    pub status: BackendStatus,
    /// Whether this is a simulator.
    #[serde(default)]
    pub simulator: bool,
}

impl From<BackendInfo> for xprobe_hal::BackendInfo {
    fn from(info: BackendInfo) -> Self {
        Self {
            name: info.name,
            num_qubits: info.num_qubits,
            simulator: info.simulator,
            operational: info.status.operational,
            pending_jobs: info.status.pending_jobs,
            status_msg: info.status.status_msg,
        }
    }
}

/// Backend status.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendStatus {
    /// Whether the backend is operational.
    pub operational: bool,
    /// Status message.
    #[serde(default)]
    pub status_msg: Option<String>,
    /// Number of pending jobs.
    #[serde(default)]
    pub pending_jobs: Option<u32>,
}

/// Job submission response.
#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    /// Job ID.
    pub id: String,
    /// Backend the job was queued on.
    #[serde(default)]
    pub backend: Option<String>,
}

/// Job status response.
#[derive(Debug, Clone, Deserialize)]
pub struct JobStatusResponse {
    /// Job ID.
    pub id: String,
    /// Job status (mixed case on the Cloud API).
    pub status: String,
    /// Backend name.
    #[serde(default)]
    pub backend: Option<String>,
    /// Creation time.
    #[serde(default)]
    pub created: Option<String>,
    /// Error information if failed (legacy API).
    #[serde(default)]
    pub error: Option<JobError>,
    /// State object with reason (Cloud API).
    #[serde(default)]
    pub state: Option<JobState>,
}

/// Job error information (legacy API).
#[derive(Debug, Clone, Deserialize)]
pub struct JobError {
    /// Error code.
    #[serde(default)]
    pub code: Option<String>,
    /// Error message.
    pub message: String,
}

/// Job state with reason (Cloud API).
#[derive(Debug, Clone, Deserialize)]
pub struct JobState {
    /// Status string.
    #[serde(default)]
    pub status: String,
    /// Reason for failure.
    #[serde(default)]
    pub reason: Option<String>,
    /// Reason code.
    #[serde(default)]
    pub reason_code: Option<u32>,
}

impl JobStatusResponse {
    /// The failure reason, preferring the Cloud API `state.reason`.
    pub fn error_message(&self) -> Option<String> {
        self.state
            .as_ref()
            .and_then(|s| s.reason.clone())
            .or_else(|| self.error.as_ref().map(|e| e.message.clone()))
    }

    /// Map the wire status onto the job state machine.
    ///
    /// Unknown statuses count as running so polling continues.
    pub fn to_job_status(&self) -> JobStatus {
        match self.status.to_uppercase().as_str() {
            "QUEUED" => JobStatus::Queued,
            "VALIDATING" | "RUNNING" => JobStatus::Running,
            "COMPLETED" => JobStatus::Completed,
            "FAILED" | "ERROR" => JobStatus::Failed(
                self.error_message()
                    .unwrap_or_else(|| "Unknown error".to_string()),
            ),
            "CANCELLED" | "CANCELLED - RAN TOO LONG" => JobStatus::Cancelled,
            _ => JobStatus::Running,
        }
    }
}
