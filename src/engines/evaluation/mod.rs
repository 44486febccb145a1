pub mod distance;
pub mod fitness;

pub use distance::MixedDistance;
pub use fitness::{resolve_feature_weights, FitnessEvaluator, FitnessRecord, LossBreakdown, LossVariant};
