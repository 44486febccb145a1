use crate::config::DatasetConfig;
use crate::error::{CounterfactualError, Result};
use crate::types::FeatureKind;

/// One column of the feature vector
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSpec {
    pub name: String,
    pub kind: FeatureKind,
}

impl FeatureSpec {
    pub fn continuous(name: &str) -> Self {
        Self { name: name.to_string(), kind: FeatureKind::Continuous }
    }

    pub fn categorical(name: &str) -> Self {
        Self { name: name.to_string(), kind: FeatureKind::Categorical }
    }
}

/// Ordered feature layout shared by the query, every candidate and the
/// reference rows.
///
/// Activity-position columns (`<prefix>_<n>`) form the sequence subset; their
/// order is the numeric suffix, not their column position.
#[derive(Debug, Clone)]
pub struct FeatureSchema {
    features: Vec<FeatureSpec>,
    continuous: Vec<usize>,
    categorical: Vec<usize>,
    sequence: Vec<usize>,
    in_sequence: Vec<bool>,
}

impl FeatureSchema {
    pub fn new(features: Vec<FeatureSpec>, sequence_prefix: &str) -> Result<Self> {
        if features.is_empty() {
            return Err(CounterfactualError::Configuration(
                "Feature schema needs at least one feature".to_string(),
            ));
        }

        let continuous = indexes_of(&features, FeatureKind::Continuous);
        let categorical = indexes_of(&features, FeatureKind::Categorical);

        let mut ordered: Vec<(u32, usize)> = Vec::new();
        for (idx, feature) in features.iter().enumerate() {
            if let Some(step) = sequence_step(&feature.name, sequence_prefix) {
                if feature.kind != FeatureKind::Categorical {
                    return Err(CounterfactualError::Configuration(format!(
                        "Sequence feature '{}' must be categorical",
                        feature.name
                    )));
                }
                ordered.push((step, idx));
            }
        }
        ordered.sort_unstable();
        if ordered.windows(2).any(|w| w[0].0 == w[1].0) {
            return Err(CounterfactualError::Configuration(format!(
                "Duplicate '{}' step in feature schema",
                sequence_prefix
            )));
        }
        let sequence: Vec<usize> = ordered.into_iter().map(|(_, idx)| idx).collect();

        let mut in_sequence = vec![false; features.len()];
        for &idx in &sequence {
            in_sequence[idx] = true;
        }

        Ok(Self {
            features,
            continuous,
            categorical,
            sequence,
            in_sequence,
        })
    }

    pub fn from_config(config: &DatasetConfig) -> Result<Self> {
        let features = config
            .features
            .iter()
            .map(|f| FeatureSpec { name: f.name.clone(), kind: f.kind })
            .collect();
        Self::new(features, &config.sequence_prefix)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn features(&self) -> &[FeatureSpec] {
        &self.features
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.features.iter().map(|f| f.name.as_str())
    }

    pub fn name(&self, idx: usize) -> &str {
        &self.features[idx].name
    }

    pub fn kind(&self, idx: usize) -> FeatureKind {
        self.features[idx].kind
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.features.iter().position(|f| f.name == name)
    }

    pub fn continuous_indexes(&self) -> &[usize] {
        &self.continuous
    }

    pub fn categorical_indexes(&self) -> &[usize] {
        &self.categorical
    }

    /// Activity-position features in trace order
    pub fn sequence_indexes(&self) -> &[usize] {
        &self.sequence
    }

    pub fn is_sequence(&self, idx: usize) -> bool {
        self.in_sequence[idx]
    }

    pub fn is_continuous(&self, idx: usize) -> bool {
        self.features[idx].kind == FeatureKind::Continuous
    }

    pub fn check_arity(&self, row: &[f64]) -> Result<()> {
        if row.len() != self.len() {
            return Err(CounterfactualError::ArityMismatch {
                expected: self.len(),
                actual: row.len(),
            });
        }
        Ok(())
    }
}

fn indexes_of(features: &[FeatureSpec], kind: FeatureKind) -> Vec<usize> {
    features
        .iter()
        .enumerate()
        .filter(|(_, f)| f.kind == kind)
        .map(|(i, _)| i)
        .collect()
}

/// `prefix_3` -> `Some(3)` for prefix `prefix`
fn sequence_step(name: &str, prefix: &str) -> Option<u32> {
    name.strip_prefix(prefix)?
        .strip_prefix('_')?
        .parse()
        .ok()
}
