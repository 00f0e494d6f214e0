//! Error types for the QASM3 emitter.

use thiserror::Error;

/// Errors that can occur during emission.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EmitError {
    /// The circuit has no qubits to declare.
    #[error("Cannot emit circuit '{0}': it has no qubits")]
    EmptyCircuit(String),
}

/// Result type for emission.
pub type EmitResult<T> = Result<T, EmitError>;
