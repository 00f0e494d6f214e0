//! Estimator results.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Expectation values for one pub, as the service shaped them.
///
/// A single observable on a single circuit yields a scalar; broadcast
/// pubs yield an array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExpectationValues {
    /// A single value.
    Scalar(f64),
    /// One value per broadcast element.
    Array(Vec<f64>),
}

impl ExpectationValues {
    /// The first value, if any.
    pub fn first(&self) -> Option<f64> {
        match self {
            ExpectationValues::Scalar(v) => Some(*v),
            ExpectationValues::Array(values) => values.first().copied(),
        }
    }

    /// All values, flattened.
    pub fn to_vec(&self) -> Vec<f64> {
        match self {
            ExpectationValues::Scalar(v) => vec![*v],
            ExpectationValues::Array(values) => values.clone(),
        }
    }
}

impl From<f64> for ExpectationValues {
    fn from(v: f64) -> Self {
        ExpectationValues::Scalar(v)
    }
}

impl From<Vec<f64>> for ExpectationValues {
    fn from(values: Vec<f64>) -> Self {
        ExpectationValues::Array(values)
    }
}

impl fmt::Display for ExpectationValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpectationValues::Scalar(v) => write!(f, "{v:?}"),
            ExpectationValues::Array(values) => {
                f.write_str("[")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v:?}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Data produced for one (circuit, observable) pub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PubData {
    /// Expectation values.
    pub evs: ExpectationValues,
    /// Standard errors, when the service reports them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stds: Option<ExpectationValues>,
}

/// Result for one pub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PubResult {
    /// The numeric data.
    pub data: PubData,
    /// Service-specific metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl PubResult {
    /// A result carrying only expectation values.
    pub fn new(evs: impl Into<ExpectationValues>) -> Self {
        Self {
            data: PubData {
                evs: evs.into(),
                stds: None,
            },
            metadata: None,
        }
    }

    /// Attach standard errors.
    pub fn with_stds(mut self, stds: impl Into<ExpectationValues>) -> Self {
        self.data.stds = Some(stds.into());
        self
    }
}

/// Result of an estimator job, one entry per submitted pub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimatorResult {
    /// Per-pub results in submission order.
    #[serde(rename = "results")]
    pub pubs: Vec<PubResult>,
    /// Job-level metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl EstimatorResult {
    /// Build from per-pub results.
    pub fn new(pubs: Vec<PubResult>) -> Self {
        Self {
            pubs,
            metadata: None,
        }
    }

    /// The first pub's result.
    pub fn first(&self) -> Option<&PubResult> {
        self.pubs.first()
    }
}
