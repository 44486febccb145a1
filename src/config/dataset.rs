use super::traits::{invalid, ConfigSection};
use crate::error::CounterfactualError;
use crate::types::FeatureKind;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub path: Option<PathBuf>,
    pub outcome: String,
    pub features: Vec<FeatureDefinition>,
    /// Stub shared by activity-position columns (`prefix_1`, `prefix_2`, ...)
    pub sequence_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureDefinition {
    pub name: String,
    pub kind: FeatureKind,
    #[serde(default)]
    pub precision: Option<u32>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: None,
            outcome: "label".to_string(),
            features: Vec::new(),
            sequence_prefix: "prefix".to_string(),
        }
    }
}

impl ConfigSection for DatasetConfig {
    fn section_name() -> &'static str {
        "dataset"
    }

    fn validate(&self) -> Result<(), CounterfactualError> {
        let section = Self::section_name();
        let mut seen = HashSet::new();
        for feature in &self.features {
            if !seen.insert(feature.name.as_str()) {
                return Err(invalid(
                    section,
                    format!("feature '{}' is defined twice", feature.name),
                ));
            }
            if feature.name == self.outcome {
                return Err(invalid(
                    section,
                    format!("outcome column '{}' cannot also be a feature", self.outcome),
                ));
            }
        }
        if self.sequence_prefix.is_empty() {
            return Err(invalid(section, "sequence_prefix must not be empty"));
        }
        Ok(())
    }
}
