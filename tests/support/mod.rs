//! Toy model and declarative checker shared by the integration tests

#![allow(dead_code)]

use conformcf::config::{AppConfig, Initialization};
use conformcf::data::{FeatureSchema, FeatureSpec, LabelEncoder, TabularData};
use conformcf::engines::conformance::{CheckReport, ConformanceChecker, Constraint, EventLog, TemplateKind};
use conformcf::ml::PredictionModel;
use conformcf::types::{FeatureValue, ModelKind, TraceState};
use conformcf::Result;
use polars::prelude::*;
use std::collections::BTreeMap;

/// Approval becomes likely once income passes `midpoint`
pub struct LoanModel {
    pub midpoint: f64,
    pub spread: f64,
}

impl Default for LoanModel {
    /// Income in 10k units
    fn default() -> Self {
        Self {
            midpoint: 5.0,
            spread: 0.5,
        }
    }
}

impl LoanModel {
    /// Income in currency units
    pub fn raw_scale() -> Self {
        Self {
            midpoint: 50000.0,
            spread: 5000.0,
        }
    }
}

impl PredictionModel for LoanModel {
    fn kind(&self) -> ModelKind {
        ModelKind::Classifier
    }

    fn predict_scores(&self, batch: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        Ok(batch
            .iter()
            .map(|row| vec![1.0 / (1.0 + (-(row[1] - self.midpoint) / self.spread).exp())])
            .collect())
    }

    fn predict(&self, batch: &[Vec<f64>]) -> Result<Vec<f64>> {
        Ok(batch
            .iter()
            .map(|row| if row[1] >= self.midpoint { 1.0 } else { 0.0 })
            .collect())
    }
}

/// Declare checker for Existence/Absence/Exactly counts, Init, Response
/// and Precedence
pub struct DeclareChecker {
    constraints: Vec<Constraint>,
    log: EventLog,
    pub loads: usize,
}

impl DeclareChecker {
    pub fn new(constraints: Vec<Constraint>) -> Self {
        Self {
            constraints,
            log: EventLog::default(),
            loads: 0,
        }
    }

    /// Loan process model: starts with apply, every apply is reviewed
    pub fn loan_process() -> Self {
        Self::new(vec![
            Constraint::unary("Init", "apply"),
            Constraint::cardinality("Existence", 1, "apply"),
            Constraint::cardinality("Absence", 2, "review"),
            Constraint::binary("Response", "apply", "review"),
            Constraint::binary("Precedence", "apply", "approve"),
        ])
    }

    fn holds(constraint: &Constraint, acts: &[&str]) -> bool {
        let count = |a: &str| acts.iter().filter(|x| **x == a).count() as u32;
        let activity = constraint.attributes.as_str();
        match (constraint.template.as_str(), constraint.kind) {
            ("Init", TemplateKind::Unary) => acts.first() == Some(&activity),
            ("Existence", TemplateKind::Cardinality(n)) => count(activity) >= n,
            ("Absence", TemplateKind::Cardinality(n)) => count(activity) < n,
            ("Exactly", TemplateKind::Cardinality(n)) => count(activity) == n,
            ("Response", TemplateKind::Binary) => match constraint.binary_activities() {
                Some((a, b)) => acts
                    .iter()
                    .enumerate()
                    .all(|(i, x)| *x != a || acts[i + 1..].iter().any(|y| *y == b)),
                None => false,
            },
            ("Precedence", TemplateKind::Binary) => match constraint.binary_activities() {
                Some((a, b)) => acts
                    .iter()
                    .enumerate()
                    .all(|(i, x)| *x != b || acts[..i].iter().any(|y| *y == a)),
                None => false,
            },
            _ => true,
        }
    }
}

impl ConformanceChecker for DeclareChecker {
    fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    fn set_constraints(&mut self, constraints: Vec<Constraint>) {
        self.constraints = constraints;
    }

    fn load(&mut self, log: &EventLog) -> Result<()> {
        self.log = log.clone();
        self.loads += 1;
        Ok(())
    }

    fn check(&self, _consider_vacuity: bool) -> Result<CheckReport> {
        let mut report = CheckReport::new();
        for trace in self.log.traces() {
            let acts: Vec<&str> = trace.activities().collect();
            let states: BTreeMap<String, TraceState> = self
                .constraints
                .iter()
                .map(|c| {
                    let state = if Self::holds(c, &acts) {
                        TraceState::Satisfied
                    } else {
                        TraceState::Violated
                    };
                    (c.result_id(), state)
                })
                .collect();
            report.insert(trace.case_id.clone(), states);
        }
        Ok(report)
    }
}

pub fn loan_frame() -> DataFrame {
    frame_with_income(&[1.2, 3.0, 4.5, 5.2, 6.1, 7.0, 8.4, 9.9, 12.0, 3.8, 5.6, 9.1])
}

pub fn raw_loan_frame() -> DataFrame {
    frame_with_income(&[
        12000.0, 30000.0, 45000.0, 52000.0, 61000.0, 70000.0, 84000.0, 99000.0, 120000.0, 38000.0, 56000.0,
        91000.0,
    ])
}

fn frame_with_income(income: &[f64]) -> DataFrame {
    df! {
        "age" => &[22i64, 25, 31, 35, 41, 44, 50, 58, 63, 29, 37, 47],
        "income" => income,
        "prefix_1" => &[
            "apply", "apply", "review", "apply", "apply", "review",
            "approve", "apply", "review", "apply", "apply", "0",
        ],
        "prefix_2" => &[
            "review", "approve", "approve", "review", "approve", "review",
            "0", "review", "approve", "0", "review", "0",
        ],
        "label" => &[0i64, 0, 0, 1, 1, 1, 1, 1, 1, 0, 1, 1],
    }
    .unwrap()
}

pub fn loan_schema() -> FeatureSchema {
    FeatureSchema::new(
        vec![
            FeatureSpec::continuous("age"),
            FeatureSpec::continuous("income"),
            FeatureSpec::categorical("prefix_1"),
            FeatureSpec::categorical("prefix_2"),
        ],
        "prefix",
    )
    .unwrap()
}

pub struct LoanSetup {
    pub encoder: LabelEncoder,
    pub data: TabularData,
    pub model: LoanModel,
}

impl LoanSetup {
    pub fn new() -> Self {
        Self::from_frame(loan_frame(), LoanModel::default())
    }

    /// Same applicants with income in currency units
    pub fn raw_scale() -> Self {
        Self::from_frame(raw_loan_frame(), LoanModel::raw_scale())
    }

    fn from_frame(df: DataFrame, model: LoanModel) -> Self {
        let schema = loan_schema();
        let encoder = LabelEncoder::from_frame(&df, &schema).unwrap();
        let data = TabularData::from_frame(&df, schema, &encoder, &BTreeMap::new()).unwrap();
        Self { encoder, data, model }
    }
}

/// Rejected applicant: low income, applied then reviewed
pub fn loan_query() -> Vec<FeatureValue> {
    vec![
        FeatureValue::Number(25.0),
        FeatureValue::Number(3.0),
        FeatureValue::from("apply"),
        FeatureValue::from("review"),
    ]
}

/// The rejected applicant with income in currency units
pub fn raw_loan_query() -> Vec<FeatureValue> {
    let mut query = loan_query();
    query[1] = FeatureValue::Number(30000.0);
    query
}

/// Three counterfactuals towards approval, age fixed
pub fn loan_config(seed: u64) -> AppConfig {
    let mut config = AppConfig::default();
    config.search.total_cfs = 3;
    config.search.seed = Some(seed);
    config.search.initialization = Initialization::Random;
    config.search.features_to_vary = Some(vec![
        "income".to_string(),
        "prefix_1".to_string(),
        "prefix_2".to_string(),
    ]);
    config
}
