//! Quantum gate types.

use serde::{Deserialize, Serialize};

/// Standard gates with known semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StandardGate {
    // Single-qubit Pauli gates
    /// Identity gate.
    I,
    /// Pauli-X gate.
    X,
    /// Pauli-Y gate.
    Y,
    /// Pauli-Z gate.
    Z,

    // Single-qubit Clifford gates
    /// Hadamard gate.
    H,
    /// S gate (sqrt(Z)).
    S,
    /// S-dagger gate.
    Sdg,
    /// sqrt(X) gate.
    SX,

    // Two-qubit gates
    /// Controlled-X (CNOT) gate.
    CX,
    /// Controlled-Z gate.
    CZ,
}

impl StandardGate {
    /// Get the OpenQASM name of this gate.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            StandardGate::I => "id",
            StandardGate::X => "x",
            StandardGate::Y => "y",
            StandardGate::Z => "z",
            StandardGate::H => "h",
            StandardGate::S => "s",
            StandardGate::Sdg => "sdg",
            StandardGate::SX => "sx",
            StandardGate::CX => "cx",
            StandardGate::CZ => "cz",
        }
    }

    /// Label used when drawing the gate on its target wire.
    pub fn symbol(&self) -> &'static str {
        match self {
            StandardGate::I => "I",
            StandardGate::X | StandardGate::CX => "X",
            StandardGate::Y => "Y",
            StandardGate::Z | StandardGate::CZ => "Z",
            StandardGate::H => "H",
            StandardGate::S => "S",
            StandardGate::Sdg => "Sdg",
            StandardGate::SX => "√X",
        }
    }

    /// Get the number of qubits this gate operates on.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        match self {
            StandardGate::CX | StandardGate::CZ => 2,
            _ => 1,
        }
    }

    /// Whether the gate has a control qubit (drawn as `■`).
    pub fn is_controlled(&self) -> bool {
        matches!(self, StandardGate::CX | StandardGate::CZ)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_arity() {
        assert_eq!(StandardGate::X.num_qubits(), 1);
        assert_eq!(StandardGate::SX.num_qubits(), 1);
        assert_eq!(StandardGate::CX.num_qubits(), 2);
    }

    #[test]
    fn test_gate_names() {
        assert_eq!(StandardGate::X.name(), "x");
        assert_eq!(StandardGate::Sdg.name(), "sdg");
        assert_eq!(StandardGate::CX.symbol(), "X");
        assert!(StandardGate::CZ.is_controlled());
        assert!(!StandardGate::H.is_controlled());
    }

    #[test]
    fn test_names_resolve_in_stdgates() {
        // Gates declared by OpenQASM 3 `stdgates.inc`.
        const STDGATES: &[&str] = &[
            "p", "x", "y", "z", "h", "s", "sdg", "t", "tdg", "sx", "rx", "ry", "rz", "cx", "cy",
            "cz", "cp", "crx", "cry", "crz", "ch", "swap", "ccx", "cswap", "cu", "CX", "phase",
            "cphase", "id", "u1", "u2", "u3",
        ];
        for gate in [
            StandardGate::I,
            StandardGate::X,
            StandardGate::Y,
            StandardGate::Z,
            StandardGate::H,
            StandardGate::S,
            StandardGate::Sdg,
            StandardGate::SX,
            StandardGate::CX,
            StandardGate::CZ,
        ] {
            assert!(STDGATES.contains(&gate.name()), "{gate:?}");
        }
    }
}
