//! QASM3 emitter for serializing circuits.

use xprobe_ir::{Circuit, ClbitId, Instruction, InstructionKind, QubitId};

use crate::error::{EmitError, EmitResult};

/// Emit a circuit as QASM3 source code.
pub fn emit(circuit: &Circuit) -> EmitResult<String> {
    let mut emitter = Emitter::new();
    emitter.emit_circuit(circuit)
}

/// QASM3 emitter.
struct Emitter {
    output: String,
}

impl Emitter {
    fn new() -> Self {
        Self {
            output: String::new(),
        }
    }

    fn emit_circuit(&mut self, circuit: &Circuit) -> EmitResult<String> {
        let num_qubits = circuit.num_qubits();
        if num_qubits == 0 {
            return Err(EmitError::EmptyCircuit(circuit.name().to_string()));
        }

        self.writeln("OPENQASM 3.0;");
        self.writeln("");

        self.writeln(&format!("qubit[{num_qubits}] q;"));
        let num_clbits = circuit.num_clbits();
        if num_clbits > 0 {
            self.writeln(&format!("bit[{num_clbits}] c;"));
        }
        self.writeln("");

        for instruction in circuit.instructions() {
            self.emit_instruction(instruction);
        }

        Ok(std::mem::take(&mut self.output))
    }

    fn emit_instruction(&mut self, instruction: &Instruction) {
        match &instruction.kind {
            InstructionKind::Gate(gate) => {
                let qubits = emit_qubits(&instruction.qubits);
                self.writeln(&format!("{} {qubits};", gate.name()));
            }

            InstructionKind::Measure => {
                for (q, c) in instruction.qubits.iter().zip(&instruction.clbits) {
                    self.writeln(&format!("{} = measure {};", emit_clbit(*c), emit_qubit(*q)));
                }
            }

            InstructionKind::Barrier => {
                let qubits = emit_qubits(&instruction.qubits);
                if qubits.is_empty() {
                    self.writeln("barrier;");
                } else {
                    self.writeln(&format!("barrier {qubits};"));
                }
            }
        }
    }

    fn writeln(&mut self, line: &str) {
        self.output.push_str(line);
        self.output.push('\n');
    }
}

fn emit_qubit(qubit: QubitId) -> String {
    format!("q[{}]", qubit.0)
}

fn emit_clbit(clbit: ClbitId) -> String {
    format!("c[{}]", clbit.0)
}

fn emit_qubits(qubits: &[QubitId]) -> String {
    qubits
        .iter()
        .map(|q| emit_qubit(*q))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_x_probe() {
        let qasm = emit(&Circuit::x_probe()).unwrap();
        assert_eq!(
            qasm,
            "OPENQASM 3.0;\n\nqubit[1] q;\nbit[1] c;\n\nx q[0];\nc[0] = measure q[0];\n"
        );
    }

    #[test]
    fn test_emit_two_qubit_gate_and_barrier() {
        let mut circuit = Circuit::with_size("bell", 2, 0);
        circuit.h(QubitId(0)).unwrap();
        circuit.barrier([QubitId(0), QubitId(1)]).unwrap();
        circuit.cx(QubitId(0), QubitId(1)).unwrap();

        let qasm = emit(&circuit).unwrap();
        assert!(!qasm.contains("bit["));
        assert!(qasm.contains("h q[0];\n"));
        assert!(qasm.contains("barrier q[0], q[1];\n"));
        assert!(qasm.contains("cx q[0], q[1];\n"));
    }

    #[test]
    fn test_emit_rejects_empty_circuit() {
        let err = emit(&Circuit::new("nothing")).unwrap_err();
        assert!(matches!(err, EmitError::EmptyCircuit(name) if name == "nothing"));
    }
}
