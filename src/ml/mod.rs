pub mod model;
pub mod outcome;

pub use model::{class_scores, respond, PredictionModel};
pub use outcome::{DesiredOutcome, Response};
