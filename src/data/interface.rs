use super::connectors::CsvConnector;
use super::encoder::Encoder;
use super::ranges::{FeatureRange, FeatureRanges};
use super::schema::FeatureSchema;
use crate::error::{CounterfactualError, Result};
use crate::types::{FeatureKind, FeatureValue};
use polars::prelude::DataFrame;
use std::collections::BTreeMap;

/// Most decimals inferred for a float column
const MAX_INFERRED_PRECISION: u32 = 6;

/// Feature metadata the search reads from the training data
pub trait DataInterface: Send + Sync {
    fn schema(&self) -> &FeatureSchema;

    /// Natural per-feature domains, encoded
    fn feature_ranges(&self) -> FeatureRanges;

    fn decimal_precisions(&self) -> Vec<u32>;

    /// Median absolute deviation per feature; never zero for continuous features
    fn mads(&self) -> Vec<f64>;

    /// Min-max scale continuous features, leave categorical codes untouched
    fn normalize(&self, row: &[f64]) -> Vec<f64>;

    /// Encoded reference rows, when the training data is available
    fn reference_rows(&self) -> Option<&[Vec<f64>]>;
}

/// `DataInterface` backed by an in-memory reference dataset
#[derive(Debug, Clone)]
pub struct TabularData {
    schema: FeatureSchema,
    rows: Option<Vec<Vec<f64>>>,
    ranges: FeatureRanges,
    precisions: Vec<u32>,
    mads: Vec<f64>,
}

impl TabularData {
    /// Build from a polars frame; `precision` pins decimals for named features
    pub fn from_frame(
        df: &DataFrame,
        schema: FeatureSchema,
        encoder: &dyn Encoder,
        precision: &BTreeMap<String, u32>,
    ) -> Result<Self> {
        let names: Vec<&str> = schema.names().collect();
        CsvConnector::require_columns(df, &names)?;

        let mut columns: Vec<Vec<f64>> = Vec::with_capacity(schema.len());
        let mut integer = Vec::with_capacity(schema.len());
        for (idx, feature) in schema.features().iter().enumerate() {
            let column = match feature.kind {
                FeatureKind::Continuous => CsvConnector::numeric_column(df, &feature.name)?,
                FeatureKind::Categorical => CsvConnector::label_column(df, &feature.name)?
                    .into_iter()
                    .map(|label| encoder.encode_value(idx, &FeatureValue::Label(label)))
                    .collect::<Result<Vec<_>>>()?,
            };
            integer.push(CsvConnector::is_integer_column(df, &feature.name)?);
            columns.push(column);
        }

        let rows = transpose(&columns, df.height());
        let mut data = Self::from_rows(schema, rows, encoder)?;
        for (idx, is_int) in integer.into_iter().enumerate() {
            if is_int {
                data.precisions[idx] = 0;
            }
        }
        data.pin_precisions(precision)?;
        Ok(data)
    }

    /// Build from already-encoded rows
    pub fn from_rows(schema: FeatureSchema, rows: Vec<Vec<f64>>, encoder: &dyn Encoder) -> Result<Self> {
        if rows.is_empty() {
            return Err(CounterfactualError::Data("Reference dataset is empty".to_string()));
        }
        for row in &rows {
            schema.check_arity(row)?;
        }

        let mut ranges = Vec::with_capacity(schema.len());
        let mut precisions = Vec::with_capacity(schema.len());
        let mut mads = Vec::with_capacity(schema.len());
        for idx in 0..schema.len() {
            let column: Vec<f64> = rows.iter().map(|r| r[idx]).collect();
            match schema.kind(idx) {
                FeatureKind::Continuous => {
                    let min = column.iter().copied().fold(f64::INFINITY, f64::min);
                    let max = column.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                    ranges.push(FeatureRange::continuous(min, max)?);
                    precisions.push(infer_precision(&column));
                    let mad = median_abs_deviation(&column);
                    if mad == 0.0 {
                        log::warn!(
                            "MAD for feature '{}' is 0, using 1.0 instead",
                            schema.name(idx)
                        );
                        mads.push(1.0);
                    } else {
                        mads.push(mad);
                    }
                }
                FeatureKind::Categorical => {
                    let levels = encoder.levels(idx);
                    let codes = (0..levels.len()).map(|c| c as f64).collect();
                    ranges.push(FeatureRange::categorical(codes).map_err(|_| {
                        CounterfactualError::Data(format!(
                            "Encoder knows no levels for '{}'",
                            schema.name(idx)
                        ))
                    })?);
                    precisions.push(0);
                    mads.push(1.0);
                }
            }
        }

        Ok(Self {
            schema,
            rows: Some(rows),
            ranges: FeatureRanges::new(ranges),
            precisions,
            mads,
        })
    }

    /// Keep the metadata but forget the rows, as a private data interface would
    pub fn without_reference_rows(mut self) -> Self {
        self.rows = None;
        self
    }

    fn pin_precisions(&mut self, precision: &BTreeMap<String, u32>) -> Result<()> {
        for (name, digits) in precision {
            let idx = self.schema.index_of(name).ok_or_else(|| {
                CounterfactualError::Configuration(format!("Precision given for unknown feature '{}'", name))
            })?;
            self.precisions[idx] = *digits;
        }
        Ok(())
    }
}

impl DataInterface for TabularData {
    fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    fn feature_ranges(&self) -> FeatureRanges {
        self.ranges.clone()
    }

    fn decimal_precisions(&self) -> Vec<u32> {
        self.precisions.clone()
    }

    fn mads(&self) -> Vec<f64> {
        self.mads.clone()
    }

    fn normalize(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .enumerate()
            .map(|(idx, &v)| match self.ranges.get(idx) {
                FeatureRange::Continuous { min, max } if self.schema.is_continuous(idx) => {
                    if max > min {
                        (v - min) / (max - min)
                    } else {
                        0.0
                    }
                }
                _ => v,
            })
            .collect()
    }

    fn reference_rows(&self) -> Option<&[Vec<f64>]> {
        self.rows.as_deref()
    }
}

fn transpose(columns: &[Vec<f64>], height: usize) -> Vec<Vec<f64>> {
    (0..height)
        .map(|row| columns.iter().map(|c| c[row]).collect())
        .collect()
}

fn median(values: &mut [f64]) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    }
}

fn median_abs_deviation(column: &[f64]) -> f64 {
    let mut sorted = column.to_vec();
    let center = median(&mut sorted);
    let mut deviations: Vec<f64> = column.iter().map(|v| (v - center).abs()).collect();
    median(&mut deviations)
}

fn infer_precision(column: &[f64]) -> u32 {
    column
        .iter()
        .map(|v| {
            let text = format!("{}", v);
            text.split_once('.')
                .map(|(_, decimals)| decimals.len() as u32)
                .unwrap_or(0)
        })
        .max()
        .unwrap_or(0)
        .min(MAX_INFERRED_PRECISION)
}
