//! `OpenQASM` 3 Emitter for xprobe
//!
//! Serializes [`xprobe_ir::Circuit`] into the `OpenQASM` 3.0 text that cloud
//! runtimes accept as the circuit half of a primitive job.
//!
//! # Example: Emitting QASM
//!
//! ```rust
//! use xprobe_ir::Circuit;
//! use xprobe_qasm3::emit;
//!
//! let qasm = emit(&Circuit::x_probe()).unwrap();
//! assert!(qasm.starts_with("OPENQASM 3.0;"));
//! assert!(qasm.contains("x q[0];"));
//! assert!(qasm.contains("c[0] = measure q[0];"));
//! ```

pub mod emitter;
pub mod error;

pub use emitter::emit;
pub use error::{EmitError, EmitResult};
