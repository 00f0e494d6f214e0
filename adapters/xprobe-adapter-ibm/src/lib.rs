//! IBM Quantum adapter for xprobe.
//!
//! Runs estimator jobs on IBM Quantum hardware through the Qiskit Runtime
//! REST API. Two channels are supported:
//!
//! | Channel | Credentials | Endpoint |
//! |---------|-------------|----------|
//! | `ibm_quantum_platform` / `ibm_cloud` | `IBM_API_KEY` + `IBM_SERVICE_CRN` | `quantum.cloud.ibm.com/api` |
//! | `ibm_quantum` | `IBM_QUANTUM_TOKEN` | `api.quantum-computing.ibm.com` |
//!
//! ```ignore
//! use xprobe_adapter_ibm::IbmConnector;
//! use xprobe_hal::{BackendFilter, Credentials, SessionConnector};
//!
//! let service = IbmConnector::new().connect(&Credentials::from_env(None)?).await?;
//! let backend = service.least_busy(&BackendFilter::hardware()).await?;
//! ```

pub mod api;
pub mod error;
pub mod service;

pub use api::{EstimatorOptions, IbmClient};
pub use error::{IbmError, IbmResult};
pub use service::{IbmConnector, IbmService};
