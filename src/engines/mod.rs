pub mod conformance;
pub mod context;
pub mod evaluation;
pub mod generation;
pub mod search;

#[cfg(test)]
pub(crate) mod testing;

pub use context::SearchContext;
pub use search::CounterfactualSearch;
