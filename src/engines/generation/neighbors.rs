use crate::data::FeatureSchema;
use crate::ml::{DesiredOutcome, Response};
use crate::types::Prediction;

/// Reference rows the model already places in the desired outcome, searchable
/// by distance to the query.
///
/// Distance is Euclidean over raw continuous values plus the one-hot
/// encoding of categorical features, so each categorical mismatch adds 2 to
/// the squared distance.
#[derive(Debug, Clone)]
pub struct CounterClassIndex {
    rows: Vec<Vec<f64>>,
    continuous: Vec<usize>,
    categorical: Vec<usize>,
}

impl CounterClassIndex {
    /// `None` when no reference row reaches the desired outcome
    pub fn build(
        schema: &FeatureSchema,
        rows: &[Vec<f64>],
        responses: &[Response],
        outcome: &DesiredOutcome,
    ) -> Option<Self> {
        let rows: Vec<Vec<f64>> = rows
            .iter()
            .zip(responses)
            .filter(|(_, response)| reaches(outcome, response))
            .map(|(row, _)| row.clone())
            .collect();
        if rows.is_empty() {
            return None;
        }
        Some(Self {
            rows,
            continuous: schema.continuous_indexes().to_vec(),
            categorical: schema.categorical_indexes().to_vec(),
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn squared_distance(&self, a: &[f64], b: &[f64]) -> f64 {
        let continuous: f64 = self.continuous.iter().map(|&i| (a[i] - b[i]).powi(2)).sum();
        let mismatches = self.categorical.iter().filter(|&&i| a[i] != b[i]).count();
        continuous + 2.0 * mismatches as f64
    }

    /// Up to `k` rows ordered by distance to `query`; ties keep dataset order
    pub fn nearest(&self, query: &[f64], k: usize) -> Vec<Vec<f64>> {
        let mut ranked: Vec<(f64, usize)> = self
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| (self.squared_distance(query, row), i))
            .collect();
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0));
        ranked
            .into_iter()
            .take(k)
            .map(|(_, i)| self.rows[i].clone())
            .collect()
    }
}

/// Classifiers match on the (desired-tie-broken) predicted label, regressors on the range
fn reaches(outcome: &DesiredOutcome, response: &Response) -> bool {
    match outcome {
        DesiredOutcome::Class { class, .. } => outcome.prediction(response) == Prediction::Class(*class),
        DesiredOutcome::Range { .. } => outcome.is_satisfied(response),
    }
}
