use crate::error::{CounterfactualError, Result};
use polars::prelude::*;
use std::path::Path;

pub struct CsvConnector;

impl CsvConnector {
    /// Load CSV file into DataFrame
    pub fn load<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.as_ref().to_path_buf()))?
            .finish()
            .map_err(|e| CounterfactualError::Data(format!("Failed to read CSV: {}", e)))?;

        Ok(df)
    }

    /// Load a CSV file and check the named columns are present
    pub fn load_with_columns<P: AsRef<Path>>(path: P, required: &[&str]) -> Result<DataFrame> {
        let df = Self::load(&path)?;
        Self::require_columns(&df, required)?;

        let null_report = Self::check_nulls(&df);
        if !null_report.is_empty() {
            log::warn!("Null values detected: {:?}", null_report);
        }

        log::info!(
            "Loaded {} rows x {} columns from {}",
            df.height(),
            df.width(),
            path.as_ref().display()
        );
        Ok(df)
    }

    pub fn require_columns(df: &DataFrame, required: &[&str]) -> Result<()> {
        let columns = df.get_column_names();
        for name in required {
            if !columns.iter().any(|col| col.as_str() == *name) {
                return Err(CounterfactualError::Data(format!(
                    "Missing required column: {}",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Column values as `f64`; nulls are rejected
    pub fn numeric_column(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
        let series = df
            .column(name)?
            .as_materialized_series()
            .cast(&DataType::Float64)?;
        let values = series.f64()?;
        values
            .into_iter()
            .enumerate()
            .map(|(row, v)| {
                v.ok_or_else(|| {
                    CounterfactualError::Data(format!("Null or non-numeric value in '{}' at row {}", name, row))
                })
            })
            .collect()
    }

    /// Column values rendered as labels; nulls are rejected
    pub fn label_column(df: &DataFrame, name: &str) -> Result<Vec<String>> {
        let series = df
            .column(name)?
            .as_materialized_series()
            .cast(&DataType::String)?;
        let values = series.str()?;
        values
            .into_iter()
            .enumerate()
            .map(|(row, v)| {
                v.map(str::to_string).ok_or_else(|| {
                    CounterfactualError::Data(format!("Null label in '{}' at row {}", name, row))
                })
            })
            .collect()
    }

    /// True when the column holds integers only
    pub fn is_integer_column(df: &DataFrame, name: &str) -> Result<bool> {
        Ok(df.column(name)?.dtype().is_integer())
    }

    fn check_nulls(df: &DataFrame) -> Vec<(String, usize)> {
        df.get_columns()
            .iter()
            .filter(|col| col.null_count() > 0)
            .map(|col| (col.name().to_string(), col.null_count()))
            .collect()
    }
}
