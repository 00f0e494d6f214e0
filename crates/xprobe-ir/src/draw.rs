//! Text rendering of circuits.
//!
//! Every wire occupies three text rows (box top, wire, box bottom). Each
//! instruction gets its own column; there is no layer packing.
//!
//! ```text
//!       ┌───┐┌─┐
//! q_0: ─┤ X ├┤M├─
//!       └───┘└╥┘
//!             ║
//! c_0: ═══════╩══
//! ```

use crate::circuit::Circuit;
use crate::instruction::{Instruction, InstructionKind};
use crate::qubit::{ClbitId, QubitId};

/// A wire in the drawing.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Wire {
    Quantum,
    Classical,
}

impl Wire {
    fn line(self) -> char {
        match self {
            Wire::Quantum => '─',
            Wire::Classical => '═',
        }
    }
}

/// Three rows of one wire within one column.
type Cell = [String; 3];

/// Render a circuit as box-drawing text.
pub fn draw(circuit: &Circuit) -> String {
    let wires: Vec<Wire> = std::iter::repeat_n(Wire::Quantum, circuit.num_qubits())
        .chain(std::iter::repeat_n(Wire::Classical, circuit.num_clbits()))
        .collect();

    let labels: Vec<String> = circuit
        .qubits()
        .iter()
        .map(|q| format!("{}: ", q.id))
        .chain(circuit.clbits().iter().map(|c| format!("{}: ", c.id)))
        .collect();
    let label_width = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);

    let mut rows: Vec<Cell> = labels
        .iter()
        .zip(&wires)
        .map(|(label, wire)| {
            let pad = " ".repeat(label_width);
            [
                format!("{pad} "),
                format!("{label:>label_width$}{}", wire.line()),
                format!("{pad} "),
            ]
        })
        .collect();

    for inst in circuit.instructions() {
        for column in columns(circuit, inst, &wires) {
            for (row, cell) in rows.iter_mut().zip(column) {
                for (line, part) in row.iter_mut().zip(cell) {
                    line.push_str(&part);
                }
            }
        }
    }

    let mut lines = Vec::with_capacity(rows.len() * 3);
    for (row, wire) in rows.iter_mut().zip(&wires) {
        row[0].push(' ');
        row[1].push(wire.line());
        row[2].push(' ');
        lines.extend(row.iter().map(|l| l.trim_end().to_string()));
    }

    while lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }
    lines.join("\n")
}

fn idle(wire: Wire, width: usize) -> Cell {
    [
        " ".repeat(width),
        wire.line().to_string().repeat(width),
        " ".repeat(width),
    ]
}

/// A row of `fill` with `center` at column `mid`.
fn marked(width: usize, mid: usize, fill: char, center: char) -> String {
    (0..width)
        .map(|i| if i == mid { center } else { fill })
        .collect()
}

fn qubit_row(q: QubitId) -> usize {
    q.0 as usize
}

fn clbit_row(circuit: &Circuit, c: ClbitId) -> usize {
    circuit.num_qubits() + c.0 as usize
}

/// Render one instruction; multi-bit measurements become one column per pair.
fn columns(circuit: &Circuit, inst: &Instruction, wires: &[Wire]) -> Vec<Vec<Cell>> {
    match &inst.kind {
        InstructionKind::Gate(gate) if gate.is_controlled() && inst.qubits.len() == 2 => {
            let symbol = gate.symbol();
            let width = symbol.chars().count() + 4;
            let mid = width / 2;
            let control = qubit_row(inst.qubits[0]);
            let target = qubit_row(inst.qubits[1]);
            let (lo, hi) = (control.min(target), control.max(target));

            let column = wires
                .iter()
                .enumerate()
                .map(|(row, &wire)| {
                    if row == target {
                        let edge = "─".repeat(width - 2);
                        let top = if control < target {
                            format!("┌{}┐", marked(width - 2, mid - 1, '─', '┴'))
                        } else {
                            format!("┌{edge}┐")
                        };
                        let bottom = if control > target {
                            format!("└{}┘", marked(width - 2, mid - 1, '─', '┬'))
                        } else {
                            format!("└{edge}┘")
                        };
                        [top, format!("┤ {symbol} ├"), bottom]
                    } else if row == control {
                        let up = if control > target { '│' } else { ' ' };
                        let down = if control < target { '│' } else { ' ' };
                        [
                            marked(width, mid, ' ', up),
                            marked(width, mid, '─', '■'),
                            marked(width, mid, ' ', down),
                        ]
                    } else if row > lo && row < hi {
                        let cross = if wire == Wire::Quantum { '┼' } else { '╪' };
                        [
                            marked(width, mid, ' ', '│'),
                            marked(width, mid, wire.line(), cross),
                            marked(width, mid, ' ', '│'),
                        ]
                    } else {
                        idle(wire, width)
                    }
                })
                .collect();
            vec![column]
        }

        InstructionKind::Gate(gate) => {
            let symbol = gate.symbol();
            let width = symbol.chars().count() + 4;
            let column = wires
                .iter()
                .enumerate()
                .map(|(row, &wire)| {
                    if inst.qubits.iter().any(|&q| qubit_row(q) == row) {
                        let edge = "─".repeat(width - 2);
                        [
                            format!("┌{edge}┐"),
                            format!("┤ {symbol} ├"),
                            format!("└{edge}┘"),
                        ]
                    } else {
                        idle(wire, width)
                    }
                })
                .collect();
            vec![column]
        }

        InstructionKind::Measure => inst
            .qubits
            .iter()
            .zip(&inst.clbits)
            .map(|(&q, &c)| {
                let measured = qubit_row(q);
                let written = clbit_row(circuit, c);
                wires
                    .iter()
                    .enumerate()
                    .map(|(row, &wire)| {
                        if row == measured {
                            ["┌─┐".into(), "┤M├".into(), "└╥┘".into()]
                        } else if row > measured && row < written {
                            let cross = if wire == Wire::Quantum {
                                "─╫─"
                            } else {
                                "═╬═"
                            };
                            [" ║ ".into(), cross.into(), " ║ ".into()]
                        } else if row == written {
                            [" ║ ".into(), "═╩═".into(), "   ".into()]
                        } else {
                            idle(wire, 3)
                        }
                    })
                    .collect()
            })
            .collect(),

        InstructionKind::Barrier => {
            let column = wires
                .iter()
                .enumerate()
                .map(|(row, &wire)| {
                    if inst.qubits.iter().any(|&q| qubit_row(q) == row) {
                        [" ░ ".into(), "─░─".into(), " ░ ".into()]
                    } else {
                        idle(wire, 3)
                    }
                })
                .collect();
            vec![column]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_x_probe() {
        let text = draw(&Circuit::x_probe());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "      ┌───┐┌─┐",
                "q_0: ─┤ X ├┤M├─",
                "      └───┘└╥┘",
                "            ║",
                "c_0: ═══════╩══",
            ]
        );
    }

    #[test]
    fn test_draw_empty_wires() {
        let text = draw(&Circuit::with_size("idle", 1, 0));
        assert_eq!(text.lines().nth(1), Some("q_0: ──"));
    }

    #[test]
    fn test_draw_cx_connects_wires() {
        let mut circuit = Circuit::with_size("bell", 2, 0);
        circuit.h(QubitId(0)).unwrap();
        circuit.cx(QubitId(0), QubitId(1)).unwrap();
        let text = draw(&circuit);
        assert!(text.contains('■'));
        assert!(text.contains("┌─┴─┐"));
        assert!(text.contains("┤ H ├"));
    }

    #[test]
    fn test_draw_barrier() {
        let mut circuit = Circuit::with_size("b", 2, 0);
        circuit.barrier([QubitId(0), QubitId(1)]).unwrap();
        let text = draw(&circuit);
        assert_eq!(text.matches('░').count(), 6);
    }
}
