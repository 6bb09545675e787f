//! Merged network + OmniPath interactions → layered, extended network
//!
//! The extension is merged back together with the network it was built from,
//! so running it again on its own output adds nothing.

use super::merge::{load_sources, source_label};
use super::{ensure_inputs, RunRecorder, RunReport};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::sources::omnipath::{self, ExtensionStats};
use crate::storage::{write_atomically, NetworkRows};
use ferronet_core::alias::AliasMap;
use ferronet_core::classifier::IdentifierClassifier;
use ferronet_core::index::NoGeneLookup;
use ferronet_core::layers::ExpansionPolicy;
use ferronet_core::network::{MergeStats, NetworkMerger};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone)]
pub struct OmniPathOptions {
    pub network: PathBuf,
    pub interactions: PathBuf,
    pub output: PathBuf,
    pub policy: ExpansionPolicy,
}

#[derive(Debug, Clone, Serialize)]
pub struct OmniPathStats {
    pub core_source: String,
    pub max_hops: usize,
    pub policy: ExpansionPolicy,
    pub layer_sizes: Vec<usize>,
    pub extension: ExtensionStats,
    pub merge: MergeStats,
}

pub async fn run(options: &OmniPathOptions, config: &PipelineConfig) -> Result<RunReport> {
    ensure_inputs([options.network.as_path(), options.interactions.as_path()])?;

    let mut recorder = RunRecorder::start("omnipath");
    recorder.inputs([options.network.as_path(), options.interactions.as_path()])?;

    info!("Step 1/4: Loading merged network");
    let mut loaded = load_sources(std::slice::from_ref(&options.network)).await?;
    let base = loaded.remove(0);

    info!("Step 2/4: Reading OmniPath interactions");
    let interactions = omnipath::read_interactions_file(&options.interactions)?;

    info!(
        "Step 3/4: Layering around {} nodes, up to {} hops",
        config.core_source, config.max_hops
    );
    let classifier = IdentifierClassifier::new()?;
    let (extension, layers, extension_stats) = omnipath::extension_network(
        &base,
        &classifier,
        &interactions,
        &config.core_source,
        config.max_hops,
        options.policy,
    );

    info!("Step 4/4: Merging extension into {}", source_label(&options.network));
    let merged = NetworkMerger::new(AliasMap::with_unicode_gene_symbols(), NoGeneLookup)
        .merge(&[base, extension]);
    let stored = write_atomically(&options.output, NetworkRows::from(&merged)).await?;
    info!(
        nodes = stored.nodes_stored,
        edges = stored.edges_stored,
        output = %options.output.display(),
        "Extended network written"
    );

    let fingerprint = merged.fingerprint();
    let stats = OmniPathStats {
        core_source: config.core_source.clone(),
        max_hops: config.max_hops,
        policy: options.policy,
        layer_sizes: layers.sizes(),
        extension: extension_stats,
        merge: merged.stats,
    };
    recorder.finish(&options.output, &stored, &stats, fingerprint)
}
