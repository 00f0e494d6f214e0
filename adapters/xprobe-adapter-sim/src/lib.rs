//! xprobe Local Estimator
//!
//! A noiseless, in-process implementation of the estimator service. It uses
//! exact statevector simulation, so the probe circuit's Pauli-Z expectation
//! comes back as exactly -1. That makes it the reference point for hardware
//! runs and lets the whole flow run offline.
//!
//! # Performance
//!
//! | Qubits | Memory |
//! |--------|--------|
//! | 10 | ~16 KB |
//! | 20 | ~16 MB |
//! | 25 | ~512 MB |
//!
//! # Example
//!
//! ```ignore
//! use xprobe_adapter_sim::{LOCAL_BACKEND, LocalEstimator};
//! use xprobe_hal::{EstimatorPub, QuantumService, WaitOptions};
//! use xprobe_ir::{Circuit, SparsePauliOp};
//!
//! let service = LocalEstimator::new();
//! let pub_ = EstimatorPub::new(Circuit::x_probe(), SparsePauliOp::from_label("Z")?)?;
//! let job = service.submit_estimator(LOCAL_BACKEND, &[pub_]).await?;
//! let result = service.wait(&job, &WaitOptions::default()).await?;
//! assert_eq!(result.pubs[0].data.evs.first(), Some(-1.0));
//! ```

mod estimator;
mod statevector;

pub use estimator::{LOCAL_BACKEND, LocalConnector, LocalEstimator};
pub use statevector::Statevector;
