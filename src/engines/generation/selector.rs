use crate::config::Optimization;
use crate::data::round_to_precision;
use crate::engines::conformance::{ConformanceChecker, ConformanceScorer};
use crate::engines::context::SearchContext;
use crate::engines::generation::{individual::Individual, population};
use crate::error::Result;
use crate::types::{FeatureKind, FeatureValue, Prediction};
use polars::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use std::time::Duration;

/// Conformance an individual needs to survive filtering
pub const FILTER_THRESHOLD: f64 = 0.99;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Counterfactual {
    /// Encoded values, continuous features rounded to their precision
    pub encoded: Individual,
    pub values: Vec<FeatureValue>,
    pub prediction: Prediction,
    /// Present when the final population was conformance-filtered
    pub conformance: Option<f64>,
}

/// Result of one search
#[derive(Clone, Debug, Serialize)]
pub struct CounterfactualSet {
    pub feature_names: Vec<String>,
    pub outcome_name: String,
    pub query: Vec<FeatureValue>,
    pub query_prediction: Prediction,
    pub counterfactuals: Vec<Counterfactual>,
    pub requested: usize,
    pub iterations: usize,
    pub converged: bool,
    pub elapsed: Duration,
}

impl CounterfactualSet {
    pub fn len(&self) -> usize {
        self.counterfactuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counterfactuals.is_empty()
    }

    /// All requested counterfactuals were found
    pub fn is_complete(&self) -> bool {
        self.counterfactuals.len() >= self.requested
    }

    /// Decoded counterfactuals, one row each, plus the outcome column
    pub fn to_frame(&self) -> Result<DataFrame> {
        let mut columns = Vec::with_capacity(self.feature_names.len() + 1);
        for (idx, name) in self.feature_names.iter().enumerate() {
            let numeric: Option<Vec<f64>> = self
                .counterfactuals
                .iter()
                .map(|cf| cf.values[idx].as_number())
                .collect();
            let column = match numeric {
                Some(values) if self.query[idx].as_number().is_some() => Column::new(name.as_str().into(), values),
                _ => Column::new(
                    name.as_str().into(),
                    self.counterfactuals
                        .iter()
                        .map(|cf| cf.values[idx].to_string())
                        .collect::<Vec<String>>(),
                ),
            };
            columns.push(column);
        }
        columns.push(Column::new(
            self.outcome_name.as_str().into(),
            self.counterfactuals
                .iter()
                .map(|cf| cf.prediction.as_f64())
                .collect::<Vec<f64>>(),
        ));
        Ok(DataFrame::new(columns)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Picks the reported counterfactuals out of the final population
pub struct ResultSelector<'c> {
    ctx: &'c SearchContext<'c>,
    optimization: Optimization,
}

impl<'c> ResultSelector<'c> {
    pub fn new(ctx: &'c SearchContext<'c>, optimization: Optimization) -> Self {
        Self { ctx, optimization }
    }

    /// Optional conformance filtering, then the first valid candidates in
    /// population order, at most `total_cfs` of them.
    ///
    /// Candidates are rounded to their precision before duplicates are
    /// dropped, and validity is judged on the rounded row that gets reported.
    pub fn select(
        &self,
        population: Vec<Individual>,
        checker: &mut dyn ConformanceChecker,
    ) -> Result<Vec<Counterfactual>> {
        let ctx = self.ctx;
        let population = population::dedup(population);

        let (population, scores): (Vec<Individual>, Vec<Option<f64>>) = match self.optimization {
            Optimization::Filtering => {
                let scorer = ConformanceScorer::new(ctx.schema(), ctx.encoder, ctx.tracking);
                let scores = scorer.score(checker, &population)?;
                let before = population.len();
                let kept: (Vec<_>, Vec<_>) = population
                    .into_iter()
                    .zip(scores)
                    .filter(|(_, score)| *score > FILTER_THRESHOLD)
                    .map(|(individual, score)| (individual, Some(score)))
                    .unzip();
                log::info!(
                    "Conformance filtering kept {} of {} individuals",
                    kept.0.len(),
                    before
                );
                kept
            }
            Optimization::Loss | Optimization::Baseline => {
                let n = population.len();
                (population, vec![None; n])
            }
        };

        let mut seen = HashSet::with_capacity(population.len());
        let (rounded, scores): (Vec<Individual>, Vec<Option<f64>>) = population
            .iter()
            .map(|individual| self.round(individual))
            .zip(scores)
            .filter(|(encoded, _)| seen.insert(population::value_key(encoded)))
            .unzip();

        let responses = ctx.responses(&rounded)?;
        let mut selected = Vec::with_capacity(ctx.total_cfs);
        for ((encoded, response), conformance) in rounded.into_iter().zip(&responses).zip(scores) {
            if selected.len() >= ctx.total_cfs {
                break;
            }
            if !ctx.outcome.is_satisfied(response) {
                continue;
            }
            selected.push(Counterfactual {
                values: ctx.encoder.decode(&encoded)?,
                encoded,
                prediction: ctx.outcome.prediction(response),
                conformance,
            });
        }
        Ok(selected)
    }

    fn round(&self, individual: &[f64]) -> Individual {
        let schema = self.ctx.schema();
        individual
            .iter()
            .enumerate()
            .map(|(idx, &v)| match schema.kind(idx) {
                FeatureKind::Continuous => round_to_precision(v, self.ctx.precisions[idx]),
                FeatureKind::Categorical => v,
            })
            .collect()
    }
}
