//! Ferronet - network build entry point

use anyhow::Result;
use clap::Parser;
use ferronet_common::logging::{init_logging, LogConfig, LogLevel};
use ferronet_ingest::pipeline::{
    ferrdb::FerrdbOptions, ferreg::FerregOptions, kegg::KeggOptions, layers::LayersOptions,
    merge::MergeOptions, omnipath::OmniPathOptions, RunReport,
};
use ferronet_ingest::{pipeline, Cli, Commands, PipelineConfig};
use std::path::PathBuf;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbose flag
    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("ferronet".to_string())
        .build();

    // Environment variables take precedence over the flag-derived defaults
    let log_config = LogConfig::from_env_over(log_config.clone()).unwrap_or(log_config);
    let _guard = init_logging(&log_config)?;

    let config = cli.pipeline_config()?;
    execute(cli.command, &config).await
}

fn output_or_default(output: Option<PathBuf>, config: &PipelineConfig, file_name: &str) -> PathBuf {
    output.unwrap_or_else(|| config.output_dir.join(file_name))
}

fn summarize(report: &RunReport) {
    info!(
        command = %report.command,
        output = %report.output.display(),
        nodes = report.stored.nodes,
        edges = report.stored.edges,
        fingerprint = %report.fingerprint,
        "Run complete"
    );
}

async fn execute(command: Commands, config: &PipelineConfig) -> Result<()> {
    match command {
        Commands::Kegg { inputs, output, no_uniprot } => {
            let options = KeggOptions {
                inputs,
                output: output_or_default(output, config, "kegg.db"),
                map_uniprot: !no_uniprot,
            };
            summarize(&pipeline::kegg::run(&options, config).await?);
        },

        Commands::Ferrdb { database, compounds, output, offline } => {
            let options = FerrdbOptions {
                database,
                compounds,
                output: output_or_default(output, config, "ferrdb.db"),
                query_genes: !offline,
            };
            summarize(&pipeline::ferrdb::run(&options, config).await?);
        },

        Commands::Ferreg { database, output } => {
            let options = FerregOptions {
                database,
                output: output_or_default(output, config, "ferreg.db"),
            };
            summarize(&pipeline::ferreg::run(&options).await?);
        },

        Commands::Merge { inputs, output, query_genes } => {
            let options = MergeOptions {
                inputs,
                output: output_or_default(output, config, "merged.db"),
                query_genes,
            };
            summarize(&pipeline::merge::run(&options, config).await?);
        },

        Commands::Omnipath { network, interactions, output, policy } => {
            let options = OmniPathOptions {
                network,
                interactions,
                output: output_or_default(output, config, "extended.db"),
                policy: policy.into(),
            };
            summarize(&pipeline::omnipath::run(&options, config).await?);
        },

        Commands::Layers { network, interactions, output, policy } => {
            let options = LayersOptions {
                network,
                interactions,
                policy: policy.into(),
                output,
            };
            let report = pipeline::layers::run(&options, config).await?;
            println!("layer\tnodes");
            for (hop, size) in report.sizes.iter().enumerate() {
                println!("{}\t{}", hop, size);
            }
        },

        Commands::Classify { tokens } => {
            for classification in pipeline::classify::run(&tokens)? {
                println!("{}\t{}", classification.token, classification.id_type);
            }
        },
    }

    Ok(())
}
