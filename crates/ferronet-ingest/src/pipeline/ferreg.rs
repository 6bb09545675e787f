//! FerReg database → FerReg network database

use super::{ensure_inputs, source_fingerprint, RunRecorder, RunReport};
use crate::error::Result;
use crate::sources::ferreg::{self, FerregNodes};
use crate::storage::{write_atomically, NetworkRows};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct FerregOptions {
    pub database: PathBuf,
    pub output: PathBuf,
}

pub async fn run(options: &FerregOptions) -> Result<RunReport> {
    ensure_inputs([options.database.as_path()])?;

    let mut recorder = RunRecorder::start("ferreg");
    recorder.input(&options.database)?;

    info!("Step 1/2: Reading FerReg hub rows");
    let rows = ferreg::read_rows(&options.database).await?;

    info!("Step 2/2: Building and writing the FerReg network");
    let (network, stats) = ferreg::build_network(&rows, &FerregNodes::new()?);
    if stats.dangling_edges > 0 {
        warn!(dangling_edges = stats.dangling_edges, "FerReg edges with an unnamed endpoint");
    }

    let stored = write_atomically(&options.output, NetworkRows::from(&network)).await?;
    info!(
        rows = stats.rows,
        nodes = network.nodes.len(),
        edges = network.edges.len(),
        diseases = network.diseases.len(),
        output = %options.output.display(),
        "FerReg network written"
    );

    recorder.finish(&options.output, &stored, &stats, source_fingerprint(&network))
}
