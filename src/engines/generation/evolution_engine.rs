use crate::config::{MatingPolicy, Optimization};
use crate::engines::conformance::{ConformanceChecker, ConformanceScorer};
use crate::engines::context::SearchContext;
use crate::engines::evaluation::{FitnessEvaluator, LossVariant};
use crate::engines::generation::{
    individual::Individual,
    operators::MatingEngine,
    population,
    progress::ProgressCallback,
};
use crate::error::{CounterfactualError, Result};
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

/// Consecutive stagnant generations that end the search
pub const STAGNATION_LIMIT: usize = 5;

pub struct EvolutionConfig {
    pub max_iterations: usize,
    pub thresh: f64,
    pub mating: MatingPolicy,
    pub optimization: Optimization,
    pub seed: Option<u64>,
}

/// Where the loop controller is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Initialized,
    Iterating,
    Converged,
    MaxIterationsReached,
    Filtering,
    Done,
}

/// Final population plus how the loop ended
#[derive(Debug, Clone)]
pub struct EvolutionOutcome {
    pub population: Vec<Individual>,
    pub iterations: usize,
    pub stop_state: LoopState,
}

impl EvolutionOutcome {
    pub fn converged(&self) -> bool {
        self.stop_state == LoopState::Converged
    }
}

/// Stagnation bookkeeping between generations
#[derive(Debug, Clone, Copy)]
struct Stagnation {
    previous_best: f64,
    current_best: f64,
    elites_valid: bool,
    count: usize,
}

impl Stagnation {
    fn new() -> Self {
        Self {
            previous_best: f64::NEG_INFINITY,
            current_best: f64::INFINITY,
            elites_valid: false,
            count: 0,
        }
    }

    /// Count a stagnant round or reset; true once the limit is reached
    fn check(&mut self, thresh: f64) -> bool {
        if (self.previous_best - self.current_best).abs() <= thresh && self.elites_valid {
            self.count += 1;
        } else {
            self.count = 0;
        }
        self.count >= STAGNATION_LIMIT
    }

    fn record(&mut self, best: f64, elites_valid: bool) {
        self.previous_best = self.current_best;
        self.current_best = best;
        self.elites_valid = elites_valid;
    }
}

pub struct EvolutionEngine<'c> {
    config: EvolutionConfig,
    ctx: &'c SearchContext<'c>,
    mating: MatingEngine<'c>,
    rng: StdRng,
    state: LoopState,
}

impl<'c> EvolutionEngine<'c> {
    pub fn new(config: EvolutionConfig, ctx: &'c SearchContext<'c>) -> Result<Self> {
        if ctx.population_size <= ctx.elite_count {
            return Err(CounterfactualError::Configuration(format!(
                "population_size {} leaves no room for offspring next to {} elites",
                ctx.population_size, ctx.elite_count
            )));
        }

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mating = MatingEngine::new(ctx, config.mating)?;

        Ok(Self {
            config,
            ctx,
            mating,
            rng,
            state: LoopState::Initialized,
        })
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    fn loss_variant(&self) -> LossVariant {
        match self.config.optimization {
            Optimization::Baseline => LossVariant::Baseline,
            Optimization::Loss | Optimization::Filtering => LossVariant::Full,
        }
    }

    /// Evolve `population` until stagnation or `max_iterations`
    pub fn run<C: ProgressCallback>(
        &mut self,
        mut population: Vec<Individual>,
        checker: &mut dyn ConformanceChecker,
        callback: &mut C,
    ) -> Result<EvolutionOutcome> {
        let ctx = self.ctx;
        let variant = self.loss_variant();
        let evaluator = FitnessEvaluator::new(ctx.data, ctx.weights, &ctx.outcome, &ctx.query, &ctx.feature_weights);
        let scorer = ConformanceScorer::new(ctx.schema(), ctx.encoder, ctx.tracking);

        let mut stagnation = Stagnation::new();
        let mut iterations = 0;
        self.state = LoopState::Iterating;

        while iterations < self.config.max_iterations {
            if stagnation.check(self.config.thresh) {
                log::info!(
                    "Converged after {} generations (best loss {:.4})",
                    iterations,
                    stagnation.current_best
                );
                self.state = LoopState::Converged;
                break;
            }

            callback.on_generation_start(iterations, &population);
            population = population::dedup(population);
            if population.is_empty() {
                return Err(CounterfactualError::Generation("Population is empty".to_string()));
            }

            let conformance = match variant {
                LossVariant::Full => {
                    let scores = scorer.score(checker, &population)?;
                    callback.on_conformance_scored(iterations, &scores);
                    Some(scores)
                }
                LossVariant::Baseline => None,
            };
            let responses = ctx.responses(&population)?;
            let ranking = evaluator.evaluate(&population, &responses, variant, conformance.as_deref())?;

            let elites: Vec<Individual> = ranking
                .iter()
                .take(ctx.elite_count)
                .map(|r| population[r.index].clone())
                .collect();
            let elites_valid = ranking
                .iter()
                .take(ctx.elite_count)
                .all(|r| ctx.outcome.is_satisfied(&responses[r.index]));
            stagnation.record(ranking[0].loss, elites_valid);

            // parents come from the best half of the ranking
            let half = population.len() / 2;
            let offspring_count = ctx.population_size - elites.len();
            let mut next = elites;
            next.reserve(offspring_count);
            for _ in 0..offspring_count {
                let parent1 = &population[ranking[self.rng.gen_range(0..=half)].index];
                let parent2 = &population[ranking[self.rng.gen_range(0..=half)].index];
                next.push(self.mating.mate(parent1, parent2, &mut self.rng)?);
            }
            population = next;

            callback.on_generation_complete(iterations, stagnation.current_best, stagnation.count);
            iterations += 1;
        }

        if self.state == LoopState::Iterating {
            log::info!("Reached max_iterations ({})", self.config.max_iterations);
            self.state = LoopState::MaxIterationsReached;
        }

        Ok(EvolutionOutcome {
            population,
            iterations,
            stop_state: self.state,
        })
    }

    /// Enter the result-selection phase
    pub fn begin_filtering(&mut self) {
        self.state = LoopState::Filtering;
    }

    pub fn finish(&mut self) {
        self.state = LoopState::Done;
    }
}
