//! xprobe Circuit Representation
//!
//! The data that the smoke test hands to a remote runtime: a small gate-level
//! circuit and the Pauli observable whose expectation value is estimated.
//!
//! # Core Components
//!
//! - **Qubits and Classical Bits**: [`QubitId`], [`ClbitId`]
//! - **Gates**: [`StandardGate`] for the fixed-semantics gates the probe uses
//! - **Instructions**: [`Instruction`] combining an operation with its operands
//! - **Circuit**: [`Circuit`], an ordered, validated instruction list
//! - **Observables**: [`SparsePauliOp`], a weighted sum of Pauli strings
//! - **Drawing**: [`draw`] renders a circuit as box-drawing text
//!
//! # Example: the X probe
//!
//! ```rust
//! use xprobe_ir::{Circuit, QubitId, ClbitId, SparsePauliOp};
//!
//! let circuit = Circuit::x_probe();
//! assert_eq!(circuit.num_qubits(), 1);
//! assert_eq!(circuit.num_clbits(), 1);
//!
//! let observable = SparsePauliOp::from_label("Z").unwrap();
//! assert_eq!(observable.num_qubits(), 1);
//! ```
//!
//! # Example: building by hand
//!
//! ```rust
//! use xprobe_ir::{Circuit, QubitId, ClbitId};
//!
//! let mut circuit = Circuit::with_size("flip", 1, 1);
//! circuit.x(QubitId(0)).unwrap();
//! circuit.measure(QubitId(0), ClbitId(0)).unwrap();
//! assert_eq!(circuit.depth(), 2);
//! ```

pub mod circuit;
pub mod draw;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod observable;
pub mod qubit;

pub use circuit::Circuit;
pub use draw::draw;
pub use error::{IrError, IrResult};
pub use gate::StandardGate;
pub use instruction::{Instruction, InstructionKind};
pub use observable::{Pauli, PauliString, SparsePauliOp};
pub use qubit::{Clbit, ClbitId, Qubit, QubitId};
