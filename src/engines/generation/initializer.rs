use super::individual::Individual;
use super::neighbors::CounterClassIndex;
use super::population;
use crate::engines::context::SearchContext;
use crate::error::{CounterfactualError, Result};
use rand::Rng;

/// Builds the first generation
pub struct PopulationInitializer<'c> {
    ctx: &'c SearchContext<'c>,
    max_batches: usize,
}

impl<'c> PopulationInitializer<'c> {
    pub fn new(ctx: &'c SearchContext<'c>, max_batches: usize) -> Self {
        Self { ctx, max_batches }
    }

    /// `n` random individuals that already reach the desired outcome.
    ///
    /// Each batch draws as many candidates as are still missing and keeps the
    /// valid ones; running out of batches is a configuration problem (the
    /// ranges or fixed features make the outcome unreachable).
    pub fn random_init<R: Rng>(&self, n: usize, rng: &mut R) -> Result<Vec<Individual>> {
        let mut valid: Vec<Individual> = Vec::with_capacity(n);
        let mut batches = 0;
        while valid.len() < n {
            if batches == self.max_batches {
                return Err(CounterfactualError::Configuration(format!(
                    "Random initialization found {} of {} valid candidates in {} batches",
                    valid.len(),
                    n,
                    self.max_batches
                )));
            }
            batches += 1;

            let missing = n - valid.len();
            let batch: Vec<Individual> = (0..missing).map(|_| self.ctx.draw_individual(rng)).collect();
            let responses = self.ctx.responses(&batch)?;
            valid.extend(
                batch
                    .into_iter()
                    .zip(responses.iter())
                    .filter(|(_, response)| self.ctx.outcome.is_satisfied(response))
                    .map(|(individual, _)| individual),
            );
        }
        log::debug!("Random initialization took {} batch(es)", batches);
        valid.truncate(n);
        Ok(valid)
    }

    /// Seed from counter-class neighbours, then top up with random draws.
    ///
    /// Per varied feature the neighbour's value is kept when in range, else
    /// the query's, else a fresh draw. Returns `None` when no neighbour index
    /// could be built.
    pub fn kdtree_init<R: Rng>(
        &self,
        reference_rows: &[Vec<f64>],
        rng: &mut R,
    ) -> Result<Option<Vec<Individual>>> {
        let ctx = self.ctx;
        let responses = ctx.responses(reference_rows)?;
        let Some(index) = CounterClassIndex::build(ctx.schema(), reference_rows, &responses, &ctx.outcome) else {
            return Ok(None);
        };

        let k = index.len().min(ctx.population_size * ctx.total_cfs);
        let neighbours = index.nearest(&ctx.query, k);
        log::debug!("{} counter-class neighbours of {} indexed rows", neighbours.len(), index.len());

        let seeded: Vec<Individual> = neighbours
            .iter()
            .take(ctx.population_size)
            .map(|row| {
                (0..row.len())
                    .map(|idx| {
                        if !ctx.varying[idx] {
                            return ctx.query[idx];
                        }
                        let range = ctx.ranges.get(idx);
                        if range.contains(row[idx]) {
                            row[idx]
                        } else if range.contains(ctx.query[idx]) {
                            ctx.query[idx]
                        } else {
                            ctx.draw_feature(idx, rng)
                        }
                    })
                    .collect()
            })
            .collect();

        let mut population = population::dedup(seeded);
        if population.len() < ctx.population_size {
            let missing = ctx.population_size - population.len();
            population.extend(self.random_init(missing, rng)?);
        }
        Ok(Some(population))
    }
}
