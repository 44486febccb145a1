use crate::config::{ActivityTracking, LossWeights};
use crate::data::{round_to_precision, DataInterface, Encoder, FeatureRange, FeatureRanges, FeatureSchema};
use crate::engines::conformance::ConformanceContext;
use crate::error::Result;
use crate::ml::{respond, DesiredOutcome, PredictionModel, Response};
use rand::Rng;

/// Everything one search invocation reads, resolved once up front and
/// borrowed by the initializer, fitness, conformance and mating phases.
pub struct SearchContext<'a> {
    pub data: &'a dyn DataInterface,
    pub model: &'a dyn PredictionModel,
    pub encoder: &'a dyn Encoder,
    pub weights: &'a LossWeights,
    pub tracking: &'a ActivityTracking,
    /// Encoded query instance
    pub query: Vec<f64>,
    pub query_response: Response,
    pub outcome: DesiredOutcome,
    /// Natural ranges narrowed by `permitted_range`
    pub ranges: FeatureRanges,
    pub precisions: Vec<u32>,
    /// `varying[i]` is false for features pinned to the query value
    pub varying: Vec<bool>,
    pub feature_weights: Vec<f64>,
    pub population_size: usize,
    pub elite_count: usize,
    /// Counterfactuals the caller asked for
    pub total_cfs: usize,
    pub conformance: ConformanceContext,
}

impl<'a> SearchContext<'a> {
    pub fn schema(&self) -> &FeatureSchema {
        self.data.schema()
    }

    pub fn responses(&self, batch: &[Vec<f64>]) -> Result<Vec<Response>> {
        respond(self.model, batch)
    }

    /// Fresh value for one feature: a range draw if it may vary, else the query's value.
    /// Continuous draws are rounded to the feature precision and kept in range.
    pub fn draw_feature<R: Rng + ?Sized>(&self, idx: usize, rng: &mut R) -> f64 {
        if !self.varying[idx] {
            return self.query[idx];
        }
        let range = self.ranges.get(idx);
        match range {
            FeatureRange::Continuous { min, max } => {
                round_to_precision(range.sample(rng), self.precisions[idx]).clamp(*min, *max)
            }
            FeatureRange::Categorical(_) => range.sample(rng),
        }
    }

    /// Mutation draw used by crossover; continuous values are not rounded
    pub fn mutate_feature<R: Rng + ?Sized>(&self, idx: usize, rng: &mut R) -> f64 {
        if self.varying[idx] {
            self.ranges.get(idx).sample(rng)
        } else {
            self.query[idx]
        }
    }

    pub fn draw_individual<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<f64> {
        (0..self.query.len()).map(|idx| self.draw_feature(idx, rng)).collect()
    }
}
