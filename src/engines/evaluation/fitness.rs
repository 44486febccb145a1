use super::distance::MixedDistance;
use crate::config::{FeatureWeights, LossWeights};
use crate::data::{round_to_precision, DataInterface, FeatureRanges, FeatureSchema};
use crate::error::{CounterfactualError, Result};
use crate::ml::{DesiredOutcome, Response};
use rayon::prelude::*;

/// Which loss terms enter the total
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LossVariant {
    /// Includes `conformance * (1 - score)`
    Full,
    /// Drops the conformance term
    Baseline,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LossBreakdown {
    pub yloss: f64,
    pub proximity: f64,
    pub sparsity: f64,
    pub plausibility: f64,
    pub conformance: Option<f64>,
    pub total: f64,
}

/// Loss of one population member
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitnessRecord {
    pub index: usize,
    pub loss: f64,
}

/// Per-feature proximity weights.
///
/// Inverse MAD gives continuous features `round(1 / MAD, 2)`. Features without
/// an explicit weight fall back to `round(1 / max, 2)` of their range.
pub fn resolve_feature_weights(
    weights: &FeatureWeights,
    schema: &FeatureSchema,
    mads: &[f64],
    ranges: &FeatureRanges,
) -> Vec<f64> {
    let by_max = |idx: usize| {
        let max = ranges.get(idx).max_value();
        if max > 0.0 {
            round_to_precision(1.0 / max, 2)
        } else {
            1.0
        }
    };

    (0..schema.len())
        .map(|idx| match weights {
            FeatureWeights::InverseMad if schema.is_continuous(idx) => {
                round_to_precision(1.0 / mads[idx], 2)
            }
            FeatureWeights::InverseMad => by_max(idx),
            FeatureWeights::Custom(custom) => custom
                .get(schema.name(idx))
                .copied()
                .unwrap_or_else(|| by_max(idx)),
        })
        .collect()
}

pub struct FitnessEvaluator<'a> {
    data: &'a dyn DataInterface,
    weights: &'a LossWeights,
    outcome: &'a DesiredOutcome,
    query: &'a [f64],
    query_normalized: Vec<f64>,
    continuous_weights: Vec<(usize, f64)>,
    distance: MixedDistance,
    anchor: Option<Vec<f64>>,
}

impl<'a> FitnessEvaluator<'a> {
    pub fn new(
        data: &'a dyn DataInterface,
        weights: &'a LossWeights,
        outcome: &'a DesiredOutcome,
        query: &'a [f64],
        feature_weights: &[f64],
    ) -> Self {
        let schema = data.schema();
        let continuous_weights = schema
            .continuous_indexes()
            .iter()
            .map(|&i| (i, feature_weights[i]))
            .collect();
        let distance = MixedDistance::new(schema, weights.plausibility_continuous_ratio);

        let anchor = match data.reference_rows() {
            Some(rows) => distance.nearest(query, rows).map(<[f64]>::to_vec),
            None => {
                log::warn!("No reference dataset; plausibility loss is 0");
                None
            }
        };

        Self {
            data,
            weights,
            outcome,
            query,
            query_normalized: data.normalize(query),
            continuous_weights,
            distance,
            anchor,
        }
    }

    /// Weighted L1 over normalized continuous features; needs at least two of them
    pub fn proximity(&self, candidate: &[f64]) -> f64 {
        if self.weights.proximity <= 0.0 || self.continuous_weights.len() < 2 {
            return 0.0;
        }
        let normalized = self.data.normalize(candidate);
        let (weighted, total): (f64, f64) = self
            .continuous_weights
            .iter()
            .map(|&(i, w)| (w * (normalized[i] - self.query_normalized[i]).abs(), w))
            .fold((0.0, 0.0), |(a, b), (x, w)| (a + x, b + w));
        if total > 0.0 {
            weighted / total
        } else {
            0.0
        }
    }

    /// Fraction of features whose truncated value moved
    pub fn sparsity(&self, candidate: &[f64]) -> f64 {
        if self.weights.sparsity <= 0.0 {
            return 0.0;
        }
        let changed = candidate
            .iter()
            .zip(self.query)
            .filter(|(c, q)| (**c as i64) != (**q as i64))
            .count();
        changed as f64 / candidate.len() as f64
    }

    /// Distance from the query's nearest reference row
    pub fn plausibility(&self, candidate: &[f64]) -> f64 {
        self.anchor
            .as_deref()
            .map(|anchor| self.distance.distance(anchor, candidate))
            .unwrap_or(0.0)
    }

    pub fn breakdown(&self, candidate: &[f64], response: &Response, conformance: Option<f64>) -> LossBreakdown {
        let yloss = self.outcome.yloss(response);
        let proximity = self.proximity(candidate);
        let sparsity = self.sparsity(candidate);
        let plausibility = self.plausibility(candidate);

        let mut total = yloss
            + self.weights.proximity * proximity
            + self.weights.sparsity * sparsity
            + self.weights.plausibility * plausibility;
        if let Some(score) = conformance {
            total += self.weights.conformance * (1.0 - score);
        }

        LossBreakdown {
            yloss,
            proximity,
            sparsity,
            plausibility,
            conformance,
            total,
        }
    }

    /// Score a population and rank it by ascending loss (stable on ties)
    pub fn evaluate(
        &self,
        population: &[Vec<f64>],
        responses: &[Response],
        variant: LossVariant,
        conformance: Option<&[f64]>,
    ) -> Result<Vec<FitnessRecord>> {
        if responses.len() != population.len() {
            return Err(CounterfactualError::Generation(format!(
                "{} responses for {} individuals",
                responses.len(),
                population.len()
            )));
        }
        let conformance = match (variant, conformance) {
            (LossVariant::Baseline, _) => None,
            (LossVariant::Full, Some(scores)) if scores.len() == population.len() => Some(scores),
            (LossVariant::Full, Some(scores)) => {
                return Err(CounterfactualError::Generation(format!(
                    "{} conformance scores for {} individuals",
                    scores.len(),
                    population.len()
                )));
            }
            (LossVariant::Full, None) => {
                return Err(CounterfactualError::Generation(
                    "Full loss requested without conformance scores".to_string(),
                ));
            }
        };

        let mut records: Vec<FitnessRecord> = population
            .par_iter()
            .zip(responses.par_iter())
            .enumerate()
            .map(|(index, (candidate, response))| FitnessRecord {
                index,
                loss: self
                    .breakdown(candidate, response, conformance.map(|c| c[index]))
                    .total,
            })
            .collect();

        records.sort_by(|a, b| a.loss.total_cmp(&b.loss));
        Ok(records)
    }
}
