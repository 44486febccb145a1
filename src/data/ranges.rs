use super::encoder::Encoder;
use super::schema::FeatureSchema;
use crate::config::PermittedRange;
use crate::error::{CounterfactualError, Result};
use crate::types::{FeatureKind, FeatureValue};
use rand::Rng;
use std::collections::BTreeMap;

/// Valid domain of one feature, in encoded space
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureRange {
    Continuous { min: f64, max: f64 },
    /// Encoded level codes; never empty
    Categorical(Vec<f64>),
}

impl FeatureRange {
    pub fn continuous(min: f64, max: f64) -> Result<Self> {
        if !(min <= max) {
            return Err(CounterfactualError::Data(format!(
                "Invalid continuous range [{}, {}]",
                min, max
            )));
        }
        Ok(Self::Continuous { min, max })
    }

    pub fn categorical(mut levels: Vec<f64>) -> Result<Self> {
        if levels.is_empty() {
            return Err(CounterfactualError::Data(
                "Categorical range needs at least one level".to_string(),
            ));
        }
        levels.sort_by(|a, b| a.total_cmp(b));
        levels.dedup();
        Ok(Self::Categorical(levels))
    }

    pub fn contains(&self, value: f64) -> bool {
        match self {
            Self::Continuous { min, max } => *min <= value && value <= *max,
            Self::Categorical(levels) => levels.iter().any(|l| *l == value),
        }
    }

    /// Uniform draw: continuous over `[min, max]`, categorical over the levels
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self {
            Self::Continuous { min, max } => rng.gen_range(*min..=*max),
            Self::Categorical(levels) => levels[rng.gen_range(0..levels.len())],
        }
    }

    pub fn max_value(&self) -> f64 {
        match self {
            Self::Continuous { max, .. } => *max,
            Self::Categorical(levels) => levels.last().copied().unwrap_or(0.0),
        }
    }
}

/// Round half to even at `precision` decimals
pub fn round_to_precision(value: f64, precision: u32) -> f64 {
    let scale = 10f64.powi(precision as i32);
    (value * scale).round_ties_even() / scale
}

/// Per-feature ranges, indexed like the schema
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRanges {
    ranges: Vec<FeatureRange>,
}

impl FeatureRanges {
    pub fn new(ranges: Vec<FeatureRange>) -> Self {
        Self { ranges }
    }

    pub fn get(&self, idx: usize) -> &FeatureRange {
        &self.ranges[idx]
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeatureRange> {
        self.ranges.iter()
    }

    /// Narrow the natural ranges with user-permitted intervals or label lists
    pub fn with_permitted(
        mut self,
        schema: &FeatureSchema,
        permitted: &BTreeMap<String, PermittedRange>,
        encoder: &dyn Encoder,
    ) -> Result<Self> {
        for (name, range) in permitted {
            let idx = schema.index_of(name).ok_or_else(|| {
                CounterfactualError::Configuration(format!(
                    "permitted_range names unknown feature '{}'",
                    name
                ))
            })?;
            self.ranges[idx] = match (schema.kind(idx), range) {
                (FeatureKind::Continuous, PermittedRange::Interval([lo, hi])) => {
                    FeatureRange::continuous(*lo, *hi)?
                }
                (FeatureKind::Categorical, PermittedRange::Levels(labels)) => {
                    let codes = labels
                        .iter()
                        .map(|l| encoder.encode_value(idx, &FeatureValue::Label(l.clone())))
                        .collect::<Result<Vec<_>>>()?;
                    FeatureRange::categorical(codes)?
                }
                (kind, _) => {
                    return Err(CounterfactualError::Configuration(format!(
                        "permitted_range for '{}' does not match its {:?} kind",
                        name, kind
                    )));
                }
            };
            log::debug!("Permitted range for '{}': {:?}", name, self.ranges[idx]);
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_samples_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(3);
        let cont = FeatureRange::continuous(10.0, 20.0).unwrap();
        let cat = FeatureRange::categorical(vec![2.0, 0.0, 1.0, 2.0]).unwrap();
        for _ in 0..200 {
            assert!(cont.contains(cont.sample(&mut rng)));
            assert!(cat.contains(cat.sample(&mut rng)));
        }
        assert_eq!(cat, FeatureRange::Categorical(vec![0.0, 1.0, 2.0]));
    }

    #[test]
    fn test_degenerate_interval() {
        let mut rng = StdRng::seed_from_u64(0);
        let point = FeatureRange::continuous(5.0, 5.0).unwrap();
        assert_eq!(point.sample(&mut rng), 5.0);
        assert!(FeatureRange::continuous(6.0, 5.0).is_err());
        assert!(FeatureRange::categorical(vec![]).is_err());
    }

    #[test]
    fn test_round_half_to_even() {
        assert_eq!(round_to_precision(2.5, 0), 2.0);
        assert_eq!(round_to_precision(3.5, 0), 4.0);
        assert_eq!(round_to_precision(1.23456, 2), 1.23);
        assert_eq!(round_to_precision(41234.7, 0), 41235.0);
    }
}
