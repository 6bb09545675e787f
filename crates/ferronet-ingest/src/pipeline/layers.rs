//! Layer report for a merged network, without writing a new database

use super::ensure_inputs;
use super::merge::load_sources;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::sources::omnipath;
use ferronet_core::layers::{ExpansionPolicy, Layers};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone)]
pub struct LayersOptions {
    pub network: PathBuf,
    pub interactions: PathBuf,
    pub policy: ExpansionPolicy,
    /// Write the full layer membership as JSON
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LayerReport {
    pub core_source: String,
    pub max_hops: usize,
    pub policy: ExpansionPolicy,
    pub sizes: Vec<usize>,
    pub layers: Vec<BTreeSet<String>>,
}

impl LayerReport {
    fn new(layers: &Layers, config: &PipelineConfig, policy: ExpansionPolicy) -> Self {
        Self {
            core_source: config.core_source.clone(),
            max_hops: config.max_hops,
            policy,
            sizes: layers.sizes(),
            layers: layers.iter().map(|(_, members)| members.clone()).collect(),
        }
    }
}

pub async fn run(options: &LayersOptions, config: &PipelineConfig) -> Result<LayerReport> {
    ensure_inputs([options.network.as_path(), options.interactions.as_path()])?;

    let mut loaded = load_sources(std::slice::from_ref(&options.network)).await?;
    let network = loaded.remove(0);
    let interactions = omnipath::read_interactions_file(&options.interactions)?;

    let core = omnipath::core_set(&network.nodes, &config.core_source);
    let layers = Layers::classify(
        &core,
        interactions
            .iter()
            .map(|interaction| (interaction.source.as_str(), interaction.target.as_str())),
        config.max_hops,
        options.policy,
    );
    let report = LayerReport::new(&layers, config, options.policy);

    if let Some(output) = &options.output {
        std::fs::write(output, serde_json::to_string_pretty(&report)?)?;
        info!(output = %output.display(), "Layer report written");
    }
    Ok(report)
}
