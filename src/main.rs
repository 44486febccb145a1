use anyhow::{bail, Context};
use conformcf::config::ConfigManager;
use conformcf::data::{CsvConnector, DataInterface, FeatureRange, FeatureSchema, LabelEncoder, TabularData};
use std::collections::BTreeMap;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let Some(path) = std::env::args().nth(1) else {
        bail!("usage: conformcf <config.toml>");
    };

    let manager = ConfigManager::new();
    manager
        .load_from_file(&path)
        .with_context(|| format!("loading configuration from {}", path))?;
    let config = manager.get()?;

    let dataset = &config.dataset;
    let Some(csv_path) = dataset.path.as_ref() else {
        bail!("[dataset] path is required");
    };
    if dataset.features.is_empty() {
        bail!("[dataset] declares no features");
    }

    let schema = FeatureSchema::from_config(dataset)?;
    let mut columns: Vec<&str> = schema.names().collect();
    columns.push(dataset.outcome.as_str());
    let df = CsvConnector::load_with_columns(csv_path, &columns)
        .with_context(|| format!("loading reference data from {}", csv_path.display()))?;

    let encoder = LabelEncoder::from_frame(&df, &schema)?;
    let precision: BTreeMap<String, u32> = dataset
        .features
        .iter()
        .filter_map(|f| f.precision.map(|p| (f.name.clone(), p)))
        .collect();
    let data = TabularData::from_frame(&df, schema, &encoder, &precision)?;

    let schema = data.schema();
    log::info!(
        "{} features ({} continuous, {} categorical, {} sequence positions)",
        schema.len(),
        schema.continuous_indexes().len(),
        schema.categorical_indexes().len(),
        schema.sequence_indexes().len()
    );
    let ranges = data.feature_ranges();
    let precisions = data.decimal_precisions();
    let mads = data.mads();
    for (idx, range) in ranges.iter().enumerate() {
        match range {
            FeatureRange::Continuous { min, max } => log::info!(
                "  {}: [{}, {}] precision {} mad {:.4}",
                schema.name(idx),
                min,
                max,
                precisions[idx],
                mads[idx]
            ),
            FeatureRange::Categorical(levels) => {
                log::info!("  {}: {} levels", schema.name(idx), levels.len())
            }
        }
    }
    log::info!(
        "Search: {} counterfactuals, population {}, {:?} optimization, {:?} mating",
        config.search.total_cfs,
        config.search.population_size(),
        config.search.optimization,
        config.search.mating
    );

    Ok(())
}
