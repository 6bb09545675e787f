//! KGML files → KEGG network database

use super::{ensure_inputs, source_fingerprint, RunRecorder, RunReport};
use crate::clients::uniprot::{FROM_KEGG, TO_SWISS_PROT};
use crate::clients::IdMappingClient;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::sources::kegg;
use crate::storage::{write_atomically, NetworkRows};
use ferronet_common::types::HUMAN_TAX_ID;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone)]
pub struct KeggOptions {
    /// KGML files, or directories holding `*.xml` / `*.kgml` files
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
    /// Map KEGG gene ids to Swiss-Prot accessions through UniProt
    pub map_uniprot: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct KeggStats {
    pub files: usize,
    pub pathways: Vec<String>,
    pub genes: usize,
    pub genes_mapped: usize,
    pub genes_unmapped: usize,
    pub nodes: usize,
    pub edges: usize,
}

/// Expand directory inputs to the KGML files they hold, sorted by name
pub fn kgml_files(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            files.push(input.clone());
            continue;
        }
        let mut found: Vec<PathBuf> = std::fs::read_dir(input)?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| is_kgml(path))
            .collect();
        found.sort();
        files.extend(found);
    }
    Ok(files)
}

fn is_kgml(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| matches!(extension, "xml" | "kgml"))
}

pub async fn run(options: &KeggOptions, config: &PipelineConfig) -> Result<RunReport> {
    ensure_inputs(options.inputs.iter().map(PathBuf::as_path))?;
    let files = kgml_files(&options.inputs)?;

    let mut recorder = RunRecorder::start("kegg");
    recorder.inputs(files.iter().map(PathBuf::as_path))?;

    info!("Step 1/3: Parsing {} KGML files", files.len());
    let mut pathways = Vec::with_capacity(files.len());
    for file in &files {
        pathways.push(kegg::read_kgml(file).await?);
    }

    let genes = kegg::gene_ids(&pathways);
    let mut stats = KeggStats {
        files: files.len(),
        pathways: pathways.iter().map(|pathway| pathway.name.clone()).collect(),
        genes: genes.len(),
        ..KeggStats::default()
    };

    let uniprot = if options.map_uniprot && !genes.is_empty() {
        info!("Step 2/3: Mapping {} KEGG genes to UniProt", genes.len());
        let client = IdMappingClient::new(config.uniprot.clone())?;
        let results = client
            .batch_convert(FROM_KEGG, TO_SWISS_PROT, &genes, Some(HUMAN_TAX_ID))
            .await?;
        results.mapped
    } else {
        info!("Step 2/3: Skipping UniProt mapping");
        HashMap::new()
    };
    stats.genes_mapped = genes.iter().filter(|gene| uniprot.contains_key(*gene)).count();
    stats.genes_unmapped = stats.genes - stats.genes_mapped;

    info!("Step 3/3: Building and writing the KEGG network");
    let network = kegg::build_network(&pathways, &uniprot);
    stats.nodes = network.nodes.len();
    stats.edges = network.edges.len();

    let stored = write_atomically(&options.output, NetworkRows::from(&network)).await?;
    info!(
        nodes = stats.nodes,
        edges = stats.edges,
        genes_mapped = stats.genes_mapped,
        output = %options.output.display(),
        "KEGG network written"
    );

    recorder.finish(&options.output, &stored, &stats, source_fingerprint(&network))
}
