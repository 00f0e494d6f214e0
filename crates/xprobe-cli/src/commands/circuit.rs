//! Circuit command implementation.

use anyhow::{Context, Result};
use console::style;

use xprobe_ir::{Circuit, draw};
use xprobe_qasm3::emit;

/// Print the probe circuit and the OpenQASM 3.0 program it becomes.
pub fn execute() -> Result<()> {
    let circuit = Circuit::x_probe();
    let qasm = emit(&circuit).context("Failed to emit OpenQASM")?;

    println!(
        "{} {} ({} qubit, {} clbit, depth {})",
        style("Circuit").cyan().bold(),
        style(circuit.name()).green(),
        circuit.num_qubits(),
        circuit.num_clbits(),
        circuit.depth()
    );
    println!("{}", draw(&circuit));
    println!();
    println!("{}", style("OpenQASM 3.0:").cyan().bold());
    print!("{qasm}");
    Ok(())
}
