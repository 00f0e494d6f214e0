//! xprobe Hardware Abstraction Layer
//!
//! A small contract for cloud quantum runtimes that run estimator jobs:
//! authenticate with [`Credentials`], pick a target with
//! [`QuantumService::least_busy`], submit [`EstimatorPub`]s and wait for the
//! [`EstimatorResult`].
//!
//! # Supported Services
//!
//! | Service | Crate | Authentication |
//! |---------|-------|----------------|
//! | Local statevector estimator | `xprobe-adapter-sim` | None |
//! | IBM Quantum Platform | `xprobe-adapter-ibm` | `IBM_API_KEY` + `IBM_SERVICE_CRN` |
//! | IBM Quantum (legacy) | `xprobe-adapter-ibm` | `IBM_QUANTUM_TOKEN` |
//!
//! # Example
//!
//! ```ignore
//! use xprobe_hal::{BackendFilter, Credentials, EstimatorPub, SessionConnector, WaitOptions};
//! use xprobe_ir::{Circuit, SparsePauliOp};
//!
//! let service = connector.connect(&Credentials::from_env(None)?).await?;
//! let backend = service.least_busy(&BackendFilter::hardware()).await?;
//!
//! let pub_ = EstimatorPub::new(Circuit::x_probe(), SparsePauliOp::from_label("Z")?)?;
//! let job_id = service.submit_estimator(&backend.name, &[pub_]).await?;
//! let result = service.wait(&job_id, &WaitOptions::default()).await?;
//! println!("{}", result.pubs[0].data.evs);
//! ```

pub mod auth;
pub mod error;
pub mod job;
pub mod result;
pub mod service;

pub use auth::{Channel, Credentials};
pub use error::{HalError, HalResult};
pub use job::{Job, JobId, JobStatus};
pub use result::{EstimatorResult, ExpectationValues, PubData, PubResult};
pub use service::{
    BackendFilter, BackendInfo, EstimatorPub, QuantumService, SessionConnector, WaitOptions,
    select_least_busy,
};
