use super::connectors::CsvConnector;
use super::schema::FeatureSchema;
use crate::error::{CounterfactualError, Result};
use crate::types::{FeatureKind, FeatureValue};
use polars::prelude::DataFrame;
use std::collections::{BTreeSet, HashMap};

/// Transform between the search's encoded vectors and raw domain values.
///
/// Record-level `encode` and `decode` must be mutual inverses.
pub trait Encoder: Send + Sync {
    fn encode_value(&self, feature: usize, value: &FeatureValue) -> Result<f64>;

    fn decode_value(&self, feature: usize, code: f64) -> Result<FeatureValue>;

    /// Labels a categorical feature can take; empty for continuous features
    fn levels(&self, feature: usize) -> Vec<String>;

    fn encode(&self, record: &[FeatureValue]) -> Result<Vec<f64>> {
        record
            .iter()
            .enumerate()
            .map(|(idx, value)| self.encode_value(idx, value))
            .collect()
    }

    fn decode(&self, record: &[f64]) -> Result<Vec<FeatureValue>> {
        record
            .iter()
            .enumerate()
            .map(|(idx, code)| self.decode_value(idx, *code))
            .collect()
    }
}

#[derive(Debug, Clone)]
struct LabelTable {
    labels: Vec<String>,
    codes: HashMap<String, usize>,
}

impl LabelTable {
    fn new(labels: BTreeSet<String>) -> Self {
        let labels: Vec<String> = labels.into_iter().collect();
        let codes = labels
            .iter()
            .enumerate()
            .map(|(code, label)| (label.clone(), code))
            .collect();
        Self { labels, codes }
    }
}

/// Label encoder: each categorical feature maps its sorted labels to codes
/// `0..k`; continuous features pass through unchanged.
#[derive(Debug, Clone)]
pub struct LabelEncoder {
    tables: Vec<Option<LabelTable>>,
    names: Vec<String>,
}

impl LabelEncoder {
    /// Build from explicit label lists keyed by feature name
    pub fn new(schema: &FeatureSchema, labels: &HashMap<String, Vec<String>>) -> Result<Self> {
        let mut tables = Vec::with_capacity(schema.len());
        for (idx, feature) in schema.features().iter().enumerate() {
            let table = match feature.kind {
                FeatureKind::Continuous => None,
                FeatureKind::Categorical => {
                    let levels = labels.get(&feature.name).ok_or_else(|| {
                        CounterfactualError::Encoding(format!(
                            "No labels supplied for categorical feature '{}'",
                            schema.name(idx)
                        ))
                    })?;
                    Some(LabelTable::new(levels.iter().cloned().collect()))
                }
            };
            tables.push(table);
        }
        Ok(Self {
            tables,
            names: schema.names().map(str::to_string).collect(),
        })
    }

    /// Collect every label observed in the frame's categorical columns
    pub fn from_frame(df: &DataFrame, schema: &FeatureSchema) -> Result<Self> {
        let mut labels = HashMap::new();
        for &idx in schema.categorical_indexes() {
            let name = schema.name(idx);
            let column = CsvConnector::label_column(df, name)?;
            labels.insert(name.to_string(), column);
        }
        Self::new(schema, &labels)
    }

    fn table(&self, feature: usize) -> Result<Option<&LabelTable>> {
        self.tables
            .get(feature)
            .map(|t| t.as_ref())
            .ok_or_else(|| CounterfactualError::Encoding(format!("Feature index {} out of range", feature)))
    }
}

impl Encoder for LabelEncoder {
    fn encode_value(&self, feature: usize, value: &FeatureValue) -> Result<f64> {
        match (self.table(feature)?, value) {
            (None, FeatureValue::Number(v)) => Ok(*v),
            (None, FeatureValue::Label(s)) => s.trim().parse::<f64>().map_err(|_| {
                CounterfactualError::Encoding(format!(
                    "Continuous feature '{}' got non-numeric value '{}'",
                    self.names[feature], s
                ))
            }),
            (Some(table), value) => {
                let label = value.activity();
                table
                    .codes
                    .get(&label)
                    .map(|code| *code as f64)
                    .ok_or_else(|| {
                        CounterfactualError::Encoding(format!(
                            "Unknown label '{}' for feature '{}'",
                            label, self.names[feature]
                        ))
                    })
            }
        }
    }

    fn decode_value(&self, feature: usize, code: f64) -> Result<FeatureValue> {
        match self.table(feature)? {
            None => Ok(FeatureValue::Number(code)),
            Some(table) => {
                let valid = code >= 0.0 && code.fract() == 0.0 && (code as usize) < table.labels.len();
                if !valid {
                    return Err(CounterfactualError::Encoding(format!(
                        "Code {} is not a level of feature '{}'",
                        code, self.names[feature]
                    )));
                }
                Ok(FeatureValue::Label(table.labels[code as usize].clone()))
            }
        }
    }

    fn levels(&self, feature: usize) -> Vec<String> {
        match self.tables.get(feature) {
            Some(Some(table)) => table.labels.clone(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::schema::FeatureSpec;
    use proptest::prelude::*;

    fn encoder() -> (FeatureSchema, LabelEncoder) {
        let schema = FeatureSchema::new(
            vec![
                FeatureSpec::continuous("age"),
                FeatureSpec::categorical("prefix_1"),
                FeatureSpec::categorical("prefix_2"),
            ],
            "prefix",
        )
        .unwrap();
        let labels: HashMap<String, Vec<String>> = [
            ("prefix_1", vec!["apply", "review", "approve", "0"]),
            ("prefix_2", vec!["review", "approve", "reject", "0"]),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.into_iter().map(String::from).collect()))
        .collect();
        let encoder = LabelEncoder::new(&schema, &labels).unwrap();
        (schema, encoder)
    }

    #[test]
    fn test_codes_follow_sorted_labels() {
        let (_, encoder) = encoder();
        assert_eq!(encoder.levels(1), vec!["0", "apply", "approve", "review"]);
        assert_eq!(encoder.encode_value(1, &"review".into()).unwrap(), 3.0);
        assert!(encoder.levels(0).is_empty());
    }

    #[test]
    fn test_unknown_label_and_code() {
        let (_, encoder) = encoder();
        assert!(encoder.encode_value(1, &"ship".into()).is_err());
        assert!(encoder.decode_value(2, 9.0).is_err());
        assert!(encoder.decode_value(2, 0.5).is_err());
    }

    proptest! {
        #[test]
        fn prop_decode_encode_roundtrip(age in 18.0f64..90.0, a in 0usize..4, b in 0usize..4) {
            let (_, encoder) = encoder();
            let codes = vec![age, a as f64, b as f64];
            let decoded = encoder.decode(&codes).unwrap();
            prop_assert_eq!(encoder.encode(&decoded).unwrap(), codes);
            let again = encoder.decode(&encoder.encode(&decoded).unwrap()).unwrap();
            prop_assert_eq!(again, decoded);
        }
    }
}
