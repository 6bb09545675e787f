//! Source network databases → one merged network database
//!
//! Every input is checked before anything is read, so a missing source aborts
//! the run without touching the output.

use super::{ensure_inputs, RunRecorder, RunReport};
use crate::clients::{GeneHits, MyGeneClient};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::storage::{write_atomically, NetworkRows, NetworkStore};
use ferronet_core::alias::AliasMap;
use ferronet_core::index::IdentityIndex;
use ferronet_core::models::{Node, SourceNetwork};
use ferronet_core::network::{MergedNetwork, NetworkMerger};
use futures::future::try_join_all;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Source databases, merged in the given order
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
    /// Query MyGene for edge endpoints no source node answers to
    pub query_genes: bool,
}

/// Source label for a database path: its file stem
pub fn source_label(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Load every database concurrently, keeping input order
pub async fn load_sources(paths: &[PathBuf]) -> Result<Vec<SourceNetwork>> {
    try_join_all(paths.iter().map(|path| async move {
        let store = NetworkStore::open_existing(path).await?;
        let network = store.load_network(source_label(path)).await;
        store.close().await;
        network
    }))
    .await
}

/// Edge endpoints that match no node name or identifier, even after alias folding
pub fn unresolved_endpoints(sources: &[SourceNetwork], aliases: &AliasMap) -> Vec<String> {
    let nodes: Vec<Node> = sources
        .iter()
        .flat_map(|source| source.nodes.iter().cloned())
        .collect();
    let index = IdentityIndex::build(&nodes);

    let endpoints: BTreeSet<&str> = sources
        .iter()
        .flat_map(|source| &source.edges)
        .flat_map(|edge| [edge.source.as_str(), edge.target.as_str()])
        .filter(|token| index.lookup(token).is_none() && index.lookup(aliases.canonicalize(token)).is_none())
        .collect();
    endpoints.into_iter().map(str::to_string).collect()
}

/// Merge already loaded sources, prefetching gene lookups when asked to
pub async fn merge_sources(
    sources: &[SourceNetwork],
    query_genes: bool,
    config: &PipelineConfig,
) -> Result<MergedNetwork> {
    let aliases = AliasMap::with_unicode_gene_symbols();

    let hits = if query_genes {
        let symbols = unresolved_endpoints(sources, &aliases);
        debug!(symbols = symbols.len(), "Endpoints left for gene lookup");
        if symbols.is_empty() {
            GeneHits::default()
        } else {
            MyGeneClient::new(config.mygene.clone())?
                .query_symbols(&symbols)
                .await?
        }
    } else {
        GeneHits::default()
    };

    Ok(NetworkMerger::new(aliases, hits.to_lookup()).merge(sources))
}

pub async fn run(options: &MergeOptions, config: &PipelineConfig) -> Result<RunReport> {
    ensure_inputs(options.inputs.iter().map(PathBuf::as_path))?;

    let mut recorder = RunRecorder::start("merge");
    recorder.inputs(options.inputs.iter().map(PathBuf::as_path))?;

    info!("Step 1/3: Loading {} source databases", options.inputs.len());
    let sources = load_sources(&options.inputs).await?;
    for source in &sources {
        info!(
            source = %source.label,
            nodes = source.nodes.len(),
            edges = source.edges.len(),
            "Loaded source network"
        );
    }

    info!("Step 2/3: Merging networks");
    let merged = merge_sources(&sources, options.query_genes, config).await?;

    info!("Step 3/3: Writing merged network");
    let stored = write_atomically(&options.output, NetworkRows::from(&merged)).await?;
    info!(
        nodes = stored.nodes_stored,
        edges = stored.edges_stored,
        output = %options.output.display(),
        "Merged network written"
    );

    let fingerprint = merged.fingerprint();
    recorder.finish(&options.output, &stored, &merged.stats, fingerprint)
}
