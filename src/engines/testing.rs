//! Shared fixtures for the engine unit tests

use crate::config::{ActivityTracking, FeatureWeights, LossWeights};
use crate::data::{DataInterface, Encoder, FeatureSchema, FeatureSpec, LabelEncoder, TabularData};
use crate::engines::conformance::{CheckReport, ConformanceChecker, ConformanceContext, Constraint, EventLog, TemplateKind};
use crate::engines::context::SearchContext;
use crate::engines::evaluation::resolve_feature_weights;
use crate::error::Result;
use crate::ml::{respond, DesiredOutcome, PredictionModel};
use crate::types::{ModelKind, TraceState};
use std::collections::{BTreeMap, HashMap};

// prefix codes
pub const PAD: f64 = 0.0;
pub const APPLY: f64 = 1.0;
pub const APPROVE: f64 = 2.0;
pub const REVIEW: f64 = 3.0;

/// Logistic on income around `midpoint`
pub struct IncomeModel {
    pub midpoint: f64,
}

impl PredictionModel for IncomeModel {
    fn kind(&self) -> ModelKind {
        ModelKind::Classifier
    }

    fn predict_scores(&self, batch: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        Ok(batch
            .iter()
            .map(|row| {
                let p = 1.0 / (1.0 + (-(row[1] - self.midpoint) / 5000.0).exp());
                vec![1.0 - p, p]
            })
            .collect())
    }

    fn predict(&self, batch: &[Vec<f64>]) -> Result<Vec<f64>> {
        Ok(batch
            .iter()
            .map(|row| if row[1] >= self.midpoint { 1.0 } else { 0.0 })
            .collect())
    }
}

/// Evaluates Existence/Absence counts, Init and Response on the loaded log
pub struct ToyChecker {
    pub constraints: Vec<Constraint>,
    pub log: EventLog,
    pub loads: usize,
}

impl ToyChecker {
    pub fn new(constraints: Vec<Constraint>) -> Self {
        Self {
            constraints,
            log: EventLog::default(),
            loads: 0,
        }
    }
}

impl ConformanceChecker for ToyChecker {
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
            let count = |a: &str| acts.iter().filter(|x| **x == a).count() as u32;
            let mut states = BTreeMap::new();
            for c in &self.constraints {
                let ok = match (c.template.as_str(), c.kind) {
                    ("Existence", TemplateKind::Cardinality(n)) => count(c.attributes.as_str()) >= n,
                    ("Absence", TemplateKind::Cardinality(n)) => count(c.attributes.as_str()) < n,
                    ("Init", TemplateKind::Unary) => acts.first() == Some(&c.attributes.as_str()),
                    ("Response", TemplateKind::Binary) => match c.binary_activities() {
                        Some((a, b)) => acts
                            .iter()
                            .enumerate()
                            .all(|(i, x)| *x != a || acts[i + 1..].iter().any(|y| *y == b)),
                        None => false,
                    },
                    _ => true,
                };
                let state = if ok { TraceState::Satisfied } else { TraceState::Violated };
                states.insert(c.result_id(), state);
            }
            report.insert(trace.case_id.clone(), states);
        }
        Ok(report)
    }
}

pub fn schema() -> FeatureSchema {
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

pub fn encoder(schema: &FeatureSchema) -> LabelEncoder {
    let levels: Vec<String> = ["0", "apply", "approve", "review"].iter().map(|s| s.to_string()).collect();
    let labels: HashMap<String, Vec<String>> = [
        ("prefix_1".to_string(), levels.clone()),
        ("prefix_2".to_string(), levels),
    ]
    .into_iter()
    .collect();
    LabelEncoder::new(schema, &labels).unwrap()
}

pub fn model_constraints() -> Vec<Constraint> {
    vec![
        Constraint::cardinality("Existence", 1, "apply"),
        Constraint::binary("Response", "apply", "review"),
    ]
}

pub struct Fixture {
    pub encoder: LabelEncoder,
    pub data: TabularData,
    pub rows: Vec<Vec<f64>>,
    pub model: IncomeModel,
    pub weights: LossWeights,
    pub tracking: ActivityTracking,
    pub query: Vec<f64>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_midpoint(50000.0)
    }

    /// Model that never predicts the desired class inside the data ranges
    pub fn unreachable() -> Self {
        Self::with_midpoint(1e12)
    }

    fn with_midpoint(midpoint: f64) -> Self {
        let schema = schema();
        let encoder = encoder(&schema);
        let rows = vec![
            vec![22.0, 12000.0, APPLY, REVIEW],
            vec![25.0, 30000.0, APPLY, APPROVE],
            vec![31.0, 45000.0, REVIEW, APPROVE],
            vec![35.0, 52000.0, APPLY, REVIEW],
            vec![41.0, 61000.0, APPLY, APPROVE],
            vec![44.0, 70000.0, REVIEW, REVIEW],
            vec![50.0, 84000.0, APPROVE, PAD],
            vec![58.0, 99000.0, APPLY, REVIEW],
            vec![63.0, 120000.0, REVIEW, APPROVE],
        ];
        let data = TabularData::from_rows(schema, rows.clone(), &encoder).unwrap();
        Self {
            encoder,
            data,
            rows,
            model: IncomeModel { midpoint },
            weights: LossWeights::default(),
            tracking: ActivityTracking {
                activity_name: Some("approve".to_string()),
                position: Some(1),
                penalty: 0.5,
            },
            query: vec![25.0, 30000.0, APPLY, REVIEW],
        }
    }

    /// Age pinned to the query, two counterfactuals from twelve individuals
    pub fn context(&self) -> SearchContext<'_> {
        let ranges = self.data.feature_ranges();
        let feature_weights = resolve_feature_weights(
            &FeatureWeights::InverseMad,
            self.data.schema(),
            &self.data.mads(),
            &ranges,
        );
        let query_response = respond(&self.model, &[self.query.clone()]).unwrap().remove(0);
        SearchContext {
            data: &self.data,
            model: &self.model,
            encoder: &self.encoder as &dyn Encoder,
            weights: &self.weights,
            tracking: &self.tracking,
            query: self.query.clone(),
            query_response,
            outcome: DesiredOutcome::Class { class: 1, min_score: None },
            ranges,
            precisions: self.data.decimal_precisions(),
            varying: vec![false, true, true, true],
            feature_weights,
            population_size: 12,
            elite_count: 2,
            total_cfs: 2,
            conformance: ConformanceContext::from_constraints(&model_constraints()),
        }
    }
}
