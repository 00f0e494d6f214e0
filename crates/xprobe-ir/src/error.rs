//! Error types for the IR crate.

use crate::qubit::{ClbitId, QubitId};
use thiserror::Error;

/// Errors that can occur in IR operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Qubit not found in circuit.
    #[error("Qubit {qubit} not found in circuit{}", format_gate_context(.gate_name))]
    QubitNotFound {
        /// The qubit that was not found.
        qubit: QubitId,
        /// Optional gate name for context.
        gate_name: Option<String>,
    },

    /// Classical bit not found in circuit.
    #[error("Classical bit {clbit} not found in circuit")]
    ClbitNotFound {
        /// The classical bit that was not found.
        clbit: ClbitId,
    },

    /// Gate requires different number of qubits.
    #[error("Gate '{gate_name}' requires {expected} qubits, got {got}")]
    QubitCountMismatch {
        /// Name of the gate.
        gate_name: String,
        /// Expected number of qubits.
        expected: u32,
        /// Actual number of qubits provided.
        got: u32,
    },

    /// Duplicate qubit in operation.
    #[error("Duplicate qubit {qubit} in operation{}", format_gate_context(.gate_name))]
    DuplicateQubit {
        /// The duplicate qubit.
        qubit: QubitId,
        /// Optional gate name for context.
        gate_name: Option<String>,
    },

    /// A wire listed out of position in a serialized circuit.
    #[error("Wire {found} listed at position {position}")]
    WireOrder {
        /// Position in the wire list.
        position: usize,
        /// The wire found there.
        found: String,
    },

    /// Measurement operands do not pair up.
    #[error("Measurement maps {qubits} qubits onto {clbits} classical bits")]
    MeasureArity {
        /// Number of qubits measured.
        qubits: usize,
        /// Number of classical bits written.
        clbits: usize,
    },

    /// Malformed Pauli label.
    #[error("Invalid Pauli label '{label}': {reason}")]
    InvalidPauliLabel {
        /// The offending label.
        label: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Observable terms of different widths were combined.
    #[error("Observable term '{label}' acts on {got} qubits, expected {expected}")]
    ObservableWidthMismatch {
        /// The offending label.
        label: String,
        /// Width of the first term.
        expected: usize,
        /// Width of the offending term.
        got: usize,
    },

    /// An observable without any term.
    #[error("Observable has no terms")]
    EmptyObservable,

    /// A coefficient that cannot be sent as a real weight.
    #[error("Coefficient of '{label}' has imaginary part {imag}; observable is not Hermitian")]
    NonHermitian {
        /// Label of the term.
        label: String,
        /// Imaginary part of its coefficient.
        imag: f64,
    },
}

/// Helper function to format optional gate context.
#[allow(clippy::ref_option)]
fn format_gate_context(gate_name: &Option<String>) -> String {
    match gate_name {
        Some(name) => format!(" (gate: {name})"),
        None => String::new(),
    }
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qubit_not_found_with_gate_context() {
        let err = IrError::QubitNotFound {
            qubit: QubitId(3),
            gate_name: Some("x".into()),
        };
        assert_eq!(err.to_string(), "Qubit q_3 not found in circuit (gate: x)");
    }

    #[test]
    fn test_qubit_not_found_without_context() {
        let err = IrError::QubitNotFound {
            qubit: QubitId(1),
            gate_name: None,
        };
        assert_eq!(err.to_string(), "Qubit q_1 not found in circuit");
    }

    #[test]
    fn test_non_hermitian_display() {
        let err = IrError::NonHermitian {
            label: "Z".into(),
            imag: 0.5,
        };
        assert!(err.to_string().contains("not Hermitian"));
    }
}
