use super::traits::{invalid, ConfigSection};
use crate::error::CounterfactualError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Population members per requested counterfactual
pub const POPULATION_FACTOR: usize = 15;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub total_cfs: usize,
    /// Overrides `POPULATION_FACTOR * total_cfs`
    pub population_size: Option<usize>,
    pub initialization: Initialization,
    pub algorithm: Algorithm,
    /// `None` varies every feature
    pub features_to_vary: Option<Vec<String>>,
    pub desired_class: DesiredClass,
    pub desired_range: Option<[f64; 2]>,
    pub permitted_range: BTreeMap<String, PermittedRange>,
    pub yloss_type: YLossType,
    pub diversity_loss_type: DiversityLossType,
    pub feature_weights: FeatureWeights,
    /// Minimum desired-class score a classifier candidate must reach
    pub stopping_threshold: Option<f64>,
    pub max_iterations: usize,
    pub thresh: f64,
    pub mating: MatingPolicy,
    pub optimization: Optimization,
    pub seed: Option<u64>,
    pub max_init_batches: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Initialization {
    Random,
    Kdtree,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    DiverseCf,
    /// Keeps a single elite per generation
    RandomInitCf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DesiredClass {
    Opposite,
    Class(usize),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PermittedRange {
    Interval([f64; 2]),
    Levels(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YLossType {
    HingeLoss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiversityLossType {
    AvgDist,
    DppStyleInverseDist,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureWeights {
    InverseMad,
    Custom(BTreeMap<String, f64>),
}

/// Crossover policy used to breed offspring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatingPolicy {
    /// Uniform crossover with 20% mutation
    Plain,
    /// Never reuses an activity from the activation or target sets
    SequenceAwareA,
    /// Only avoids activations, so targets may reappear
    SequenceAwareB,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Optimization {
    /// Conformance enters the loss every generation
    Loss,
    /// As `Loss`, then keeps only near-fully conformant survivors
    Filtering,
    /// Ignores conformance entirely
    Baseline,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            total_cfs: 3,
            population_size: None,
            initialization: Initialization::Kdtree,
            algorithm: Algorithm::DiverseCf,
            features_to_vary: None,
            desired_class: DesiredClass::Opposite,
            desired_range: None,
            permitted_range: BTreeMap::new(),
            yloss_type: YLossType::HingeLoss,
            diversity_loss_type: DiversityLossType::DppStyleInverseDist,
            feature_weights: FeatureWeights::InverseMad,
            stopping_threshold: None,
            max_iterations: 50,
            thresh: 1e-2,
            mating: MatingPolicy::Plain,
            optimization: Optimization::Loss,
            seed: None,
            max_init_batches: 1000,
        }
    }
}

impl SearchConfig {
    pub fn population_size(&self) -> usize {
        self.population_size
            .unwrap_or(POPULATION_FACTOR * self.total_cfs)
    }

    /// Number of individuals carried unchanged into the next generation
    pub fn elite_count(&self) -> usize {
        match self.algorithm {
            Algorithm::DiverseCf => self.total_cfs,
            Algorithm::RandomInitCf => 1,
        }
    }
}

impl ConfigSection for SearchConfig {
    fn section_name() -> &'static str {
        "search"
    }

    fn validate(&self) -> Result<(), CounterfactualError> {
        let section = Self::section_name();
        if self.total_cfs == 0 {
            return Err(invalid(section, "total_cfs must be at least 1"));
        }
        if self.population_size() == 0 {
            return Err(invalid(section, "population_size must be at least 1"));
        }
        if self.max_init_batches == 0 {
            return Err(invalid(section, "max_init_batches must be at least 1"));
        }
        if !(self.thresh >= 0.0) {
            return Err(invalid(section, "thresh must be non-negative"));
        }
        if let Some([lo, hi]) = self.desired_range {
            if lo > hi {
                return Err(invalid(
                    section,
                    format!("desired_range lower bound {} exceeds upper bound {}", lo, hi),
                ));
            }
        }
        if let Some(t) = self.stopping_threshold {
            if !(0.0..=1.0).contains(&t) {
                return Err(invalid(section, "stopping_threshold must be between 0 and 1"));
            }
        }
        for (name, range) in &self.permitted_range {
            match range {
                PermittedRange::Interval([lo, hi]) if lo > hi => {
                    return Err(invalid(
                        section,
                        format!("permitted_range for '{}' is empty ({} > {})", name, lo, hi),
                    ));
                }
                PermittedRange::Levels(levels) if levels.is_empty() => {
                    return Err(invalid(
                        section,
                        format!("permitted_range for '{}' lists no levels", name),
                    ));
                }
                _ => {}
            }
        }
        if let FeatureWeights::Custom(weights) = &self.feature_weights {
            if let Some((name, w)) = weights.iter().find(|(_, w)| !(**w > 0.0)) {
                return Err(invalid(
                    section,
                    format!("feature weight for '{}' must be positive, got {}", name, w),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_population_is_fifteen_per_cf() {
        let config = SearchConfig::default();
        assert_eq!(config.population_size(), 45);
        assert_eq!(config.elite_count(), 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_random_init_keeps_single_elite() {
        let config = SearchConfig {
            algorithm: Algorithm::RandomInitCf,
            total_cfs: 4,
            ..Default::default()
        };
        assert_eq!(config.elite_count(), 1);
        assert_eq!(config.population_size(), 60);
    }

    #[test]
    fn test_rejects_inverted_ranges() {
        let mut config = SearchConfig {
            desired_range: Some([2.0, 1.0]),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        config.desired_range = None;
        config
            .permitted_range
            .insert("income".to_string(), PermittedRange::Interval([10.0, 5.0]));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_counterfactuals() {
        let config = SearchConfig {
            total_cfs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
