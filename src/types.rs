use serde::{Deserialize, Serialize};
use std::fmt;

/// Statistical type of a feature column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    Continuous,
    Categorical,
}

/// A raw (decoded) feature value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    Label(String),
}

impl FeatureValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Label(_) => None,
        }
    }

    /// Activity name carried by a sequence feature
    pub fn activity(&self) -> String {
        match self {
            Self::Label(s) => s.clone(),
            Self::Number(v) => format_number(*v),
        }
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{}", format_number(*v)),
            Self::Label(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for FeatureValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<&str> for FeatureValue {
    fn from(s: &str) -> Self {
        Self::Label(s.to_string())
    }
}

fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}

/// Closed set of model families the search supports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Classifier,
    Regressor,
}

/// Model decision recorded for the query and each counterfactual
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Prediction {
    Class(usize),
    Value(f64),
}

impl Prediction {
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Class(c) => *c as f64,
            Self::Value(v) => *v,
        }
    }
}

/// State of one declarative constraint on one trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TraceState {
    Satisfied,
    PossiblySatisfied,
    PossiblyViolated,
    Violated,
}

impl TraceState {
    pub fn is_violated(&self) -> bool {
        matches!(self, Self::Violated)
    }
}
