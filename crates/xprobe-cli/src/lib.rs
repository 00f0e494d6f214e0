//! Library half of the xprobe CLI.
//!
//! [`workflow::run_smoke_test`] is the hardware smoke test itself; it takes
//! any [`xprobe_hal::SessionConnector`], so it runs unchanged against IBM
//! Quantum, the local estimator or a test double. [`config::XprobeConfig`]
//! layers defaults, the YAML file and the environment.

pub mod config;
pub mod workflow;

pub use config::{ConfigError, XprobeConfig};
pub use workflow::{SmokeTestOptions, WorkflowOutcome, run_smoke_test};
