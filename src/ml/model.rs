use super::outcome::Response;
use crate::error::{CounterfactualError, Result};
use crate::types::ModelKind;

/// Black-box model the search explains.
///
/// Batches are encoded feature vectors laid out like the schema.
pub trait PredictionModel: Send + Sync {
    fn kind(&self) -> ModelKind;

    /// Class scores, `N x C`; binary models may return a single column
    fn predict_scores(&self, batch: &[Vec<f64>]) -> Result<Vec<Vec<f64>>>;

    /// Point predictions (regression) or hard labels
    fn predict(&self, batch: &[Vec<f64>]) -> Result<Vec<f64>>;
}

/// Class scores with single-column binary output expanded to `(1 - p, p)`
pub fn class_scores(model: &dyn PredictionModel, batch: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
    let scores = model.predict_scores(batch)?;
    if scores.len() != batch.len() {
        return Err(CounterfactualError::Model(format!(
            "Model returned {} score rows for {} inputs",
            scores.len(),
            batch.len()
        )));
    }
    Ok(scores
        .into_iter()
        .map(|row| match row.as_slice() {
            [p] => vec![1.0 - p, *p],
            _ => row,
        })
        .collect())
}

/// Model output in the shape the outcome logic needs for the model's kind
pub fn respond(model: &dyn PredictionModel, batch: &[Vec<f64>]) -> Result<Vec<Response>> {
    if batch.is_empty() {
        return Ok(Vec::new());
    }
    match model.kind() {
        ModelKind::Classifier => Ok(class_scores(model, batch)?
            .into_iter()
            .map(Response::Scores)
            .collect()),
        ModelKind::Regressor => {
            let values = model.predict(batch)?;
            if values.len() != batch.len() {
                return Err(CounterfactualError::Model(format!(
                    "Model returned {} predictions for {} inputs",
                    values.len(),
                    batch.len()
                )));
            }
            Ok(values.into_iter().map(Response::Value).collect())
        }
    }
}
