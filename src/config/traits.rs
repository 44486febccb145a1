use crate::error::CounterfactualError;
use serde::{Deserialize, Serialize};

/// Trait for configuration sections
pub trait ConfigSection: Serialize + for<'de> Deserialize<'de> + Default + Clone {
    fn section_name() -> &'static str;
    fn validate(&self) -> Result<(), CounterfactualError>;
}

/// Shorthand for the configuration error every section raises
pub(crate) fn invalid(section: &str, message: impl Into<String>) -> CounterfactualError {
    CounterfactualError::Configuration(format!("[{}] {}", section, message.into()))
}
