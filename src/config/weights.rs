use super::traits::{invalid, ConfigSection};
use crate::error::CounterfactualError;
use serde::{Deserialize, Serialize};

/// Loss-term weights, fixed for the duration of a search.
///
/// `diversity` and `categorical_penalty` are accepted for compatibility with
/// the wider counterfactual tooling but do not enter the genetic loss.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LossWeights {
    pub proximity: f64,
    pub sparsity: f64,
    pub diversity: f64,
    pub plausibility: f64,
    pub categorical_penalty: f64,
    pub conformance: f64,
    /// Share of the continuous part in the plausibility distance
    pub plausibility_continuous_ratio: Option<f64>,
}

impl Default for LossWeights {
    fn default() -> Self {
        Self {
            proximity: 0.5,
            sparsity: 0.5,
            diversity: 0.5,
            plausibility: 0.5,
            categorical_penalty: 0.1,
            conformance: 3.0,
            plausibility_continuous_ratio: None,
        }
    }
}

impl ConfigSection for LossWeights {
    fn section_name() -> &'static str {
        "weights"
    }

    fn validate(&self) -> Result<(), CounterfactualError> {
        let section = Self::section_name();
        let named = [
            ("proximity", self.proximity),
            ("sparsity", self.sparsity),
            ("diversity", self.diversity),
            ("plausibility", self.plausibility),
            ("categorical_penalty", self.categorical_penalty),
            ("conformance", self.conformance),
        ];
        for (name, value) in named {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(
                    section,
                    format!("{} weight must be a non-negative number, got {}", name, value),
                ));
            }
        }
        if let Some(ratio) = self.plausibility_continuous_ratio {
            if !(0.0..=1.0).contains(&ratio) {
                return Err(invalid(
                    section,
                    "plausibility_continuous_ratio must be between 0 and 1",
                ));
            }
        }
        Ok(())
    }
}
