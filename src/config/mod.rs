pub mod traits;
pub mod search;
pub mod weights;
pub mod tracking;
pub mod dataset;
pub mod manager;

pub use manager::{ConfigManager, AppConfig};
pub use search::{
    Algorithm, DesiredClass, FeatureWeights, Initialization, MatingPolicy, Optimization,
    PermittedRange, SearchConfig,
};
pub use weights::LossWeights;
pub use tracking::ActivityTracking;
pub use dataset::{DatasetConfig, FeatureDefinition};
pub use traits::ConfigSection;
