pub mod config;
pub mod data;
pub mod engines;
pub mod error;
pub mod ml;
pub mod types;

pub use engines::generation::{Counterfactual, CounterfactualSet};
pub use engines::CounterfactualSearch;
pub use error::{CounterfactualError, Result};
