//! FerrDB export → FerrDB network database

use super::{ensure_inputs, source_fingerprint, RunRecorder, RunReport};
use crate::clients::{GeneHits, MyGeneClient};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::sources::compounds::CompoundIndex;
use crate::sources::ferrdb::{self, PathwayParser};
use crate::storage::{write_atomically, NetworkRows};
use ferronet_core::alias::AliasMap;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone)]
pub struct FerrdbOptions {
    pub database: PathBuf,
    /// KEGG compound list used to recognise small molecules in pathway strings
    pub compounds: Option<PathBuf>,
    pub output: PathBuf,
    /// Resolve pathway entities through MyGene
    pub query_genes: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FerrdbStats {
    pub records: usize,
    pub compound_names: usize,
    pub gene_queries: usize,
    pub gene_hits: usize,
    pub failed_batches: usize,
    pub nodes: usize,
    pub edges: usize,
}

pub async fn run(options: &FerrdbOptions, config: &PipelineConfig) -> Result<RunReport> {
    ensure_inputs(
        std::iter::once(options.database.as_path()).chain(options.compounds.as_deref()),
    )?;

    let mut recorder = RunRecorder::start("ferrdb");
    recorder.input(&options.database)?;

    info!("Step 1/4: Reading FerrDB tables");
    let records = ferrdb::read_records(&options.database).await?;

    info!("Step 2/4: Loading compound names");
    let compounds = match &options.compounds {
        Some(path) => {
            recorder.input(path)?;
            CompoundIndex::from_path(path)?
        },
        None => CompoundIndex::default(),
    };

    let parser = PathwayParser::new(AliasMap::with_unicode_gene_symbols())?;
    let queries = ferrdb::gene_queries(&records, &parser, &compounds);

    let hits = if options.query_genes && !queries.is_empty() {
        info!("Step 3/4: Querying MyGene for {} pathway entities", queries.len());
        MyGeneClient::new(config.mygene.clone())?
            .query_symbols(&queries)
            .await?
    } else {
        info!("Step 3/4: Skipping MyGene lookup");
        GeneHits::default()
    };

    info!("Step 4/4: Building and writing the FerrDB network");
    let network = ferrdb::build_network(&records, &parser, &hits, &compounds);
    let stats = FerrdbStats {
        records: records.len(),
        compound_names: compounds.len(),
        gene_queries: queries.len(),
        gene_hits: hits.len(),
        failed_batches: hits.failed_batches,
        nodes: network.nodes.len(),
        edges: network.edges.len(),
    };

    let stored = write_atomically(&options.output, NetworkRows::from(&network)).await?;
    info!(
        nodes = stats.nodes,
        edges = stats.edges,
        output = %options.output.display(),
        "FerrDB network written"
    );

    recorder.finish(&options.output, &stored, &stats, source_fingerprint(&network))
}
