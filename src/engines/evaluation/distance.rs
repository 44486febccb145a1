use crate::data::FeatureSchema;

/// Mixed continuous/categorical distance used for plausibility.
///
/// Continuous part: cityblock over continuous features divided by the total
/// feature count. Categorical part: Hamming fraction over categorical
/// features. Parts are weighted by each kind's share of the feature count
/// unless a continuous share is given.
#[derive(Debug, Clone)]
pub struct MixedDistance {
    continuous: Vec<usize>,
    categorical: Vec<usize>,
    num_features: usize,
    ratio_continuous: f64,
    ratio_categorical: f64,
}

impl MixedDistance {
    pub fn new(schema: &FeatureSchema, continuous_ratio: Option<f64>) -> Self {
        let num_features = schema.len();
        let continuous = schema.continuous_indexes().to_vec();
        let categorical = schema.categorical_indexes().to_vec();
        let (ratio_continuous, ratio_categorical) = match continuous_ratio {
            Some(r) => (r, 1.0 - r),
            None => (
                continuous.len() as f64 / num_features as f64,
                categorical.len() as f64 / num_features as f64,
            ),
        };
        Self {
            continuous,
            categorical,
            num_features,
            ratio_continuous,
            ratio_categorical,
        }
    }

    pub fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        let cityblock: f64 = self.continuous.iter().map(|&i| (a[i] - b[i]).abs()).sum();
        let dist_cont = cityblock / self.num_features as f64;

        let dist_cat = if self.categorical.is_empty() {
            0.0
        } else {
            let mismatches = self.categorical.iter().filter(|&&i| a[i] != b[i]).count();
            mismatches as f64 / self.categorical.len() as f64
        };

        self.ratio_continuous * dist_cont + self.ratio_categorical * dist_cat
    }

    /// Closest row to `query`; the first row wins ties
    pub fn nearest<'r>(&self, query: &[f64], rows: &'r [Vec<f64>]) -> Option<&'r [f64]> {
        rows.iter()
            .map(|row| (self.distance(query, row), row))
            .fold(None, |best: Option<(f64, &Vec<f64>)>, (d, row)| match best {
                Some((b, _)) if b <= d => best,
                _ => Some((d, row)),
            })
            .map(|(_, row)| row.as_slice())
    }
}
