use super::{
    dataset::DatasetConfig,
    search::SearchConfig,
    tracking::ActivityTracking,
    traits::ConfigSection,
    weights::LossWeights,
};
use crate::error::CounterfactualError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, RwLock};

/// Prefix for environment overrides, e.g. `CONFORMCF__SEARCH__TOTAL_CFS=5`
pub const ENV_PREFIX: &str = "CONFORMCF";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub search: SearchConfig,
    pub weights: LossWeights,
    pub tracking: ActivityTracking,
    pub dataset: DatasetConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), CounterfactualError> {
        self.search.validate()?;
        self.weights.validate()?;
        self.tracking.validate()?;
        self.dataset.validate()?;
        Ok(())
    }
}

pub struct ConfigManager {
    config: Arc<RwLock<AppConfig>>,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(AppConfig::default())),
        }
    }

    /// Load a config file, layering `CONFORMCF__*` environment overrides on top
    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CounterfactualError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CounterfactualError::Configuration(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;

        log::debug!("Loaded configuration from {}", path.display());
        *self.write_lock()? = config;
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CounterfactualError> {
        let config = self.get()?;
        let toml_str = toml::to_string_pretty(&config)
            .map_err(|e| CounterfactualError::Configuration(format!("Failed to serialize: {}", e)))?;

        std::fs::write(path, toml_str)
            .map_err(|e| CounterfactualError::Configuration(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    pub fn get(&self) -> Result<AppConfig, CounterfactualError> {
        let config = self
            .config
            .read()
            .map_err(|_| CounterfactualError::Configuration("Config lock poisoned".to_string()))?;
        Ok(config.clone())
    }

    pub fn update<F>(&self, f: F) -> Result<(), CounterfactualError>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut config = self.write_lock()?;
        let mut candidate = config.clone();
        f(&mut candidate);
        candidate.validate()?;
        *config = candidate;
        Ok(())
    }

    fn write_lock(&self) -> Result<std::sync::RwLockWriteGuard<'_, AppConfig>, CounterfactualError> {
        self.config
            .write()
            .map_err(|_| CounterfactualError::Configuration("Config lock poisoned".to_string()))
    }
}
