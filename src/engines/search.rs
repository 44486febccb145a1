use crate::config::{AppConfig, ConfigSection, FeatureWeights, Initialization};
use crate::data::{DataInterface, Encoder, FeatureSchema};
use crate::engines::conformance::{ConformanceChecker, ConformanceContext, ConformanceScorer};
use crate::engines::context::SearchContext;
use crate::engines::evaluation::resolve_feature_weights;
use crate::engines::generation::{
    CounterfactualSet, EvolutionConfig, EvolutionEngine, Individual, PopulationInitializer, ProgressCallback,
    ResultSelector,
};
use crate::error::{CounterfactualError, Result};
use crate::ml::{respond, DesiredOutcome, PredictionModel};
use rand::Rng;
use std::time::Instant;

/// Conformance-aware genetic counterfactual search over one model and dataset
pub struct CounterfactualSearch<'a> {
    data: &'a dyn DataInterface,
    model: &'a dyn PredictionModel,
    encoder: &'a dyn Encoder,
}

impl<'a> CounterfactualSearch<'a> {
    pub fn new(data: &'a dyn DataInterface, model: &'a dyn PredictionModel, encoder: &'a dyn Encoder) -> Self {
        Self { data, model, encoder }
    }

    /// Search counterfactuals for `query` (raw values in schema order).
    ///
    /// The checker's model is narrowed to the constraints the query satisfies
    /// before the loop starts, and stays narrowed afterwards.
    pub fn generate<C: ProgressCallback>(
        &self,
        query: &[crate::types::FeatureValue],
        config: &AppConfig,
        checker: &mut dyn ConformanceChecker,
        callback: &mut C,
    ) -> Result<CounterfactualSet> {
        let start = Instant::now();
        let search = &config.search;
        search.validate()?;
        config.weights.validate()?;
        config.tracking.validate()?;

        let schema = self.data.schema();
        if query.len() != schema.len() {
            return Err(CounterfactualError::ArityMismatch {
                expected: schema.len(),
                actual: query.len(),
            });
        }
        let encoded_query = self.encoder.encode(query)?;

        log::debug!("total_cfs: {}", search.total_cfs);
        log::debug!("optimization: {:?}", search.optimization);
        log::debug!("max_iterations: {}", search.max_iterations);
        log::debug!(
            "Tracked activity: {:?} at {:?}, penalty {}",
            config.tracking.activity_name,
            config.tracking.position,
            config.tracking.penalty
        );

        let query_response = respond(self.model, std::slice::from_ref(&encoded_query))?
            .into_iter()
            .next()
            .ok_or_else(|| CounterfactualError::Model("No prediction for the query".to_string()))?;
        let outcome = DesiredOutcome::resolve(
            self.model.kind(),
            search.desired_class,
            search.desired_range,
            search.stopping_threshold,
            &query_response,
        )?;
        log::info!("Query predicted {:?}, searching for {:?}", query_response.prediction(), outcome);

        let ranges = self
            .data
            .feature_ranges()
            .with_permitted(schema, &search.permitted_range, self.encoder)?;
        let varying = varying_mask(schema, search.features_to_vary.as_deref())?;
        if let FeatureWeights::Custom(weights) = &search.feature_weights {
            check_known(schema, weights.keys().map(String::as_str), "feature_weights")?;
        }
        let feature_weights = resolve_feature_weights(&search.feature_weights, schema, &self.data.mads(), &ranges);

        let scorer = ConformanceScorer::new(schema, self.encoder, &config.tracking);
        scorer.filter_model(checker, &encoded_query)?;
        let conformance = ConformanceContext::from_constraints(checker.constraints());
        log::debug!(
            "Activations: {:?}, targets: {:?}",
            conformance.activations,
            conformance.targets
        );

        let ctx = SearchContext {
            data: self.data,
            model: self.model,
            encoder: self.encoder,
            weights: &config.weights,
            tracking: &config.tracking,
            query: encoded_query,
            query_response,
            outcome,
            ranges,
            precisions: self.data.decimal_precisions(),
            varying,
            feature_weights,
            population_size: search.population_size(),
            elite_count: search.elite_count(),
            total_cfs: search.total_cfs,
            conformance,
        };

        let mut engine = EvolutionEngine::new(
            EvolutionConfig {
                max_iterations: search.max_iterations,
                thresh: search.thresh,
                mating: search.mating,
                optimization: search.optimization,
                seed: search.seed,
            },
            &ctx,
        )?;

        let initializer = PopulationInitializer::new(&ctx, search.max_init_batches);
        let initial = initial_population(&ctx, &initializer, search.initialization, self.data, engine.rng_mut())?;
        log::info!("Initialization complete with {} individuals", initial.len());

        let evolved = engine.run(initial, checker, callback)?;
        let iterations = evolved.iterations;
        let converged = evolved.converged();

        engine.begin_filtering();
        let counterfactuals = ResultSelector::new(&ctx, search.optimization).select(evolved.population, checker)?;
        engine.finish();

        let result = CounterfactualSet {
            feature_names: schema.names().map(str::to_string).collect(),
            outcome_name: config.dataset.outcome.clone(),
            query: self.encoder.decode(&ctx.query)?,
            query_prediction: ctx.query_response.prediction(),
            counterfactuals,
            requested: search.total_cfs,
            iterations,
            converged,
            elapsed: start.elapsed(),
        };

        if result.is_complete() {
            log::info!(
                "Found {} counterfactuals in {:.2?} ({} generations)",
                result.len(),
                result.elapsed,
                result.iterations
            );
        } else {
            log::info!(
                "Only {} (required {}) counterfactuals found in {:.2?}; consider another query or more features to vary",
                result.len(),
                result.requested,
                result.elapsed
            );
        }
        Ok(result)
    }
}

fn initial_population<R: Rng>(
    ctx: &SearchContext<'_>,
    initializer: &PopulationInitializer<'_>,
    initialization: Initialization,
    data: &dyn DataInterface,
    rng: &mut R,
) -> Result<Vec<Individual>> {
    match initialization {
        Initialization::Random => initializer.random_init(ctx.population_size, rng),
        Initialization::Kdtree => {
            let rows = data.reference_rows().ok_or_else(|| {
                CounterfactualError::Configuration(
                    "kdtree initialization needs the reference dataset; use random initialization".to_string(),
                )
            })?;
            match initializer.kdtree_init(rows, rng)? {
                Some(population) => Ok(population),
                None => {
                    log::warn!("No reference row reaches the desired outcome, falling back to random initialization");
                    initializer.random_init(ctx.population_size, rng)
                }
            }
        }
    }
}

fn check_known<'n>(schema: &FeatureSchema, names: impl Iterator<Item = &'n str>, field: &str) -> Result<()> {
    for name in names {
        if schema.index_of(name).is_none() {
            return Err(CounterfactualError::Configuration(format!(
                "{} names unknown feature '{}'",
                field, name
            )));
        }
    }
    Ok(())
}

/// `None` varies every feature
fn varying_mask(schema: &FeatureSchema, features_to_vary: Option<&[String]>) -> Result<Vec<bool>> {
    match features_to_vary {
        None => Ok(vec![true; schema.len()]),
        Some(names) => {
            check_known(schema, names.iter().map(String::as_str), "features_to_vary")?;
            Ok(schema
                .names()
                .map(|name| names.iter().any(|n| n == name))
                .collect())
        }
    }
}
