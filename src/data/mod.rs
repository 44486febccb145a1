pub mod connectors;
pub mod encoder;
pub mod interface;
pub mod ranges;
pub mod schema;

pub use connectors::CsvConnector;
pub use encoder::{Encoder, LabelEncoder};
pub use interface::{DataInterface, TabularData};
pub use ranges::{round_to_precision, FeatureRange, FeatureRanges};
pub use schema::{FeatureSchema, FeatureSpec};
