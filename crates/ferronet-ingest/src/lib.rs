//! Ferronet Ingest
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Builds ferroptosis interaction networks from KEGG, FerrDB, FerReg and
//! OmniPath, and merges them into one graph.
//!
//! # Overview
//!
//! - **Sources**: adapters turning each upstream resource into a source network
//! - **Clients**: UniProt ID mapping and MyGene lookups
//! - **Storage**: SQLite network databases (one per source, one merged)
//! - **Pipelines**: the `ferronet` subcommands, each leaving a JSON run report
//!
//! A typical run builds the per-source databases, merges them, then extends
//! the merged network with layered OmniPath interactions:
//!
//! ```text
//! ferronet kegg kgml/ -o output/kegg.db
//! ferronet ferrdb ferrdb.db --compounds compound.tsv -o output/ferrdb.db
//! ferronet ferreg ferreg.db -o output/ferreg.db
//! ferronet merge output/kegg.db output/ferrdb.db output/ferreg.db -o output/merged.db
//! ferronet omnipath output/merged.db omnipath.tsv -o output/extended.db
//! ```

pub mod clients;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod sources;
pub mod storage;

// Re-export commonly used types
pub use config::PipelineConfig;
pub use error::{IngestError, Result};

use clap::{Parser, Subcommand, ValueEnum};
use ferronet_core::layers::ExpansionPolicy;
use std::path::PathBuf;

/// Ferronet - ferroptosis interaction network builder
#[derive(Parser, Debug)]
#[command(name = "ferronet")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory for outputs written without an explicit path
    #[arg(long, env = "FERRONET_OUTPUT_DIR", global = true)]
    pub output_dir: Option<PathBuf>,

    /// Hop limit for layered expansion
    #[arg(long, env = "FERRONET_MAX_HOPS", global = true)]
    pub max_hops: Option<usize>,

    /// `source_db` tag whose protein nodes form the layering core
    #[arg(long, env = "FERRONET_CORE_SOURCE", global = true)]
    pub core_source: Option<String>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the KEGG network from KGML files
    Kegg {
        /// KGML files or directories of KGML files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output database (defaults to <output-dir>/kegg.db)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Keep KEGG gene ids instead of mapping them to UniProt
        #[arg(long)]
        no_uniprot: bool,
    },

    /// Build the FerrDB network from a FerrDB export
    Ferrdb {
        /// FerrDB SQLite export
        database: PathBuf,

        /// KEGG compound list (`cpd:C00001<TAB>Water; H2O`)
        #[arg(short, long)]
        compounds: Option<PathBuf>,

        /// Output database (defaults to <output-dir>/ferrdb.db)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip MyGene lookups for pathway entities
        #[arg(long)]
        offline: bool,
    },

    /// Build the FerReg network from a FerReg database
    Ferreg {
        /// FerReg SQLite database
        database: PathBuf,

        /// Output database (defaults to <output-dir>/ferreg.db)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Merge source network databases into one
    Merge {
        /// Source databases, merged in order
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output database (defaults to <output-dir>/merged.db)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Query MyGene for edge endpoints no node answers to
        #[arg(long)]
        query_genes: bool,
    },

    /// Extend a merged network with layered OmniPath interactions
    Omnipath {
        /// Merged network database
        network: PathBuf,

        /// OmniPath interactions TSV
        interactions: PathBuf,

        /// Output database (defaults to <output-dir>/extended.db)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Adjacency used for expansion
        #[arg(long, value_enum, default_value_t = Policy::Undirected)]
        policy: Policy,
    },

    /// Report distance layers around the core without writing a network
    Layers {
        /// Merged network database
        network: PathBuf,

        /// OmniPath interactions TSV
        interactions: PathBuf,

        /// Write full layer membership as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Adjacency used for expansion
        #[arg(long, value_enum, default_value_t = Policy::Undirected)]
        policy: Policy,
    },

    /// Show which namespace identifiers are classified into
    Classify {
        /// Identifiers to classify
        #[arg(required = true)]
        tokens: Vec<String>,
    },
}

/// Expansion policy as a command-line value
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Policy {
    /// Either endpoint of an interaction reaches the other
    Undirected,
    /// Only regulators of already layered nodes
    Upstream,
}

impl From<Policy> for ExpansionPolicy {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::Undirected => ExpansionPolicy::Undirected,
            Policy::Upstream => ExpansionPolicy::Upstream,
        }
    }
}

impl Cli {
    /// Environment configuration with command-line overrides applied
    pub fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = PipelineConfig::from_env();
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(max_hops) = self.max_hops {
            config.max_hops = max_hops;
        }
        if let Some(core_source) = &self.core_source {
            config.core_source = core_source.clone();
        }
        config.validate()?;
        Ok(config)
    }
}
