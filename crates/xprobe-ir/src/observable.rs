//! Pauli observables.
//!
//! A [`SparsePauliOp`] is a weighted sum of Pauli strings. Labels follow the
//! usual little-endian convention: the rightmost character acts on qubit 0,
//! so `"ZI"` measures Z on qubit 1.

use std::collections::BTreeMap;
use std::fmt;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};

/// Tolerance under which an imaginary coefficient counts as zero.
const HERMITIAN_TOLERANCE: f64 = 1e-12;

/// A single-qubit Pauli operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pauli {
    /// Identity.
    I,
    /// Pauli-X.
    X,
    /// Pauli-Y.
    Y,
    /// Pauli-Z.
    Z,
}

impl Pauli {
    fn from_char(c: char) -> Option<Self> {
        match c {
            'I' => Some(Pauli::I),
            'X' => Some(Pauli::X),
            'Y' => Some(Pauli::Y),
            'Z' => Some(Pauli::Z),
            _ => None,
        }
    }

    fn as_char(self) -> char {
        match self {
            Pauli::I => 'I',
            Pauli::X => 'X',
            Pauli::Y => 'Y',
            Pauli::Z => 'Z',
        }
    }
}

/// A tensor product of Pauli operators, stored qubit 0 first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PauliString {
    paulis: Vec<Pauli>,
}

impl PauliString {
    /// Parse a label such as `"Z"` or `"XIZ"`.
    pub fn parse(label: &str) -> IrResult<Self> {
        if label.is_empty() {
            return Err(IrError::InvalidPauliLabel {
                label: label.to_string(),
                reason: "label is empty".into(),
            });
        }
        let paulis = label
            .chars()
            .rev()
            .map(|c| {
                Pauli::from_char(c).ok_or_else(|| IrError::InvalidPauliLabel {
                    label: label.to_string(),
                    reason: format!("unexpected character '{c}'"),
                })
            })
            .collect::<IrResult<Vec<_>>>()?;
        Ok(Self { paulis })
    }

    /// Number of qubits the string acts on.
    pub fn num_qubits(&self) -> usize {
        self.paulis.len()
    }

    /// The Pauli acting on `qubit`.
    pub fn get(&self, qubit: usize) -> Option<Pauli> {
        self.paulis.get(qubit).copied()
    }

    /// Paulis in qubit order (qubit 0 first).
    pub fn paulis(&self) -> &[Pauli] {
        &self.paulis
    }

    /// The label in the conventional right-to-left order.
    pub fn label(&self) -> String {
        self.paulis.iter().rev().map(|p| p.as_char()).collect()
    }
}

impl fmt::Display for PauliString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// A weighted sum of Pauli strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparsePauliOp {
    terms: Vec<(PauliString, Complex64)>,
}

impl SparsePauliOp {
    /// A single term with unit coefficient, e.g. `SparsePauliOp::from_label("Z")`.
    pub fn from_label(label: &str) -> IrResult<Self> {
        Self::from_list([(label, Complex64::new(1.0, 0.0))])
    }

    /// Build from `(label, coefficient)` pairs.
    ///
    /// All labels must have the same width and there must be at least one.
    pub fn from_list<'a, I, C>(terms: I) -> IrResult<Self>
    where
        I: IntoIterator<Item = (&'a str, C)>,
        C: Into<Complex64>,
    {
        let mut parsed: Vec<(PauliString, Complex64)> = Vec::new();
        for (label, coeff) in terms {
            let pauli = PauliString::parse(label)?;
            if let Some((first, _)) = parsed.first() {
                if first.num_qubits() != pauli.num_qubits() {
                    return Err(IrError::ObservableWidthMismatch {
                        label: label.to_string(),
                        expected: first.num_qubits(),
                        got: pauli.num_qubits(),
                    });
                }
            }
            parsed.push((pauli, coeff.into()));
        }
        if parsed.is_empty() {
            return Err(IrError::EmptyObservable);
        }
        Ok(Self { terms: parsed })
    }

    /// Number of qubits the observable acts on.
    pub fn num_qubits(&self) -> usize {
        self.terms.first().map_or(0, |(p, _)| p.num_qubits())
    }

    /// Number of terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Always false; construction rejects empty observables.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// The `(pauli, coefficient)` terms.
    pub fn terms(&self) -> &[(PauliString, Complex64)] {
        &self.terms
    }

    /// Whether every coefficient is real.
    pub fn is_hermitian(&self) -> bool {
        self.terms
            .iter()
            .all(|(_, c)| c.im.abs() <= HERMITIAN_TOLERANCE)
    }

    /// Collapse into `label -> real weight`, summing repeated labels.
    ///
    /// This is the shape runtimes accept for an observable on the wire.
    pub fn to_real_map(&self) -> IrResult<BTreeMap<String, f64>> {
        let mut map = BTreeMap::new();
        for (pauli, coeff) in &self.terms {
            if coeff.im.abs() > HERMITIAN_TOLERANCE {
                return Err(IrError::NonHermitian {
                    label: pauli.label(),
                    imag: coeff.im,
                });
            }
            *map.entry(pauli.label()).or_insert(0.0) += coeff.re;
        }
        Ok(map)
    }
}

impl fmt::Display for SparsePauliOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (pauli, coeff)) in self.terms.iter().enumerate() {
            if i > 0 {
                f.write_str(" + ")?;
            }
            if coeff.im == 0.0 {
                write!(f, "{} * {pauli}", coeff.re)?;
            } else {
                write!(f, "({coeff}) * {pauli}")?;
            }
        }
        Ok(())
    }
}
