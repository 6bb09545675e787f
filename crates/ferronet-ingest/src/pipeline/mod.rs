//! Pipelines behind the `ferronet` subcommands
//!
//! Each pipeline reads its inputs, builds or merges networks, writes the output
//! database atomically and leaves a JSON run report next to it.

pub mod classify;
pub mod ferrdb;
pub mod ferreg;
pub mod kegg;
pub mod layers;
pub mod merge;
pub mod omnipath;

use crate::error::{IngestError, Result};
use crate::storage::StorageStats;
use chrono::{DateTime, Utc};
use ferronet_common::checksum::compute_file_checksum;
use ferronet_core::models::SourceNetwork;
use ferronet_core::network::MergedNetwork;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Fail with [`IngestError::MissingInput`] for the first path that does not exist
pub fn ensure_inputs<'a, I>(paths: I) -> Result<()>
where
    I: IntoIterator<Item = &'a Path>,
{
    for path in paths {
        if !path.exists() {
            return Err(IngestError::MissingInput(path.to_path_buf()));
        }
    }
    Ok(())
}

/// `<output>.report.json`
pub fn report_path(output: &Path) -> PathBuf {
    let mut path = output.as_os_str().to_owned();
    path.push(".report.json");
    PathBuf::from(path)
}

/// Fingerprint of a network that has not been through a merge
pub fn source_fingerprint(network: &SourceNetwork) -> String {
    MergedNetwork {
        nodes: network.nodes.clone(),
        edges: network.edges.clone(),
        diseases: network.diseases.clone(),
        disease_links: network.disease_links.clone(),
        experiments: network.experiments.clone(),
        ..MergedNetwork::default()
    }
    .fingerprint()
}

#[derive(Debug, Clone, Serialize)]
pub struct InputDigest {
    pub path: PathBuf,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoredCounts {
    pub nodes: usize,
    pub identifiers: usize,
    pub edges: usize,
    pub diseases: usize,
    pub disease_edges: usize,
    pub experiments: usize,
}

impl From<&StorageStats> for StoredCounts {
    fn from(stats: &StorageStats) -> Self {
        Self {
            nodes: stats.nodes_stored,
            identifiers: stats.identifiers_stored,
            edges: stats.edges_stored,
            diseases: stats.diseases_stored,
            disease_edges: stats.disease_edges_stored,
            experiments: stats.experiments_stored,
        }
    }
}

/// Written next to every output database
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub command: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub inputs: Vec<InputDigest>,
    pub output: PathBuf,
    pub stored: StoredCounts,
    pub stats: serde_json::Value,
    pub fingerprint: String,
}

/// Collects what a run touched until the output is written
#[derive(Debug)]
pub struct RunRecorder {
    command: String,
    started_at: DateTime<Utc>,
    inputs: Vec<InputDigest>,
}

impl RunRecorder {
    pub fn start(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            started_at: Utc::now(),
            inputs: Vec::new(),
        }
    }

    /// Digest an input file; call before the file can change underneath the run
    pub fn input(&mut self, path: &Path) -> Result<()> {
        let sha256 = compute_file_checksum(path)?;
        self.inputs.push(InputDigest {
            path: path.to_path_buf(),
            sha256,
        });
        Ok(())
    }

    pub fn inputs<'a, I>(&mut self, paths: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a Path>,
    {
        for path in paths {
            self.input(path)?;
        }
        Ok(())
    }

    /// Write the report for a finished run and return it
    pub fn finish<S: Serialize>(
        self,
        output: &Path,
        stored: &StorageStats,
        stats: &S,
        fingerprint: String,
    ) -> Result<RunReport> {
        let report = RunReport {
            command: self.command,
            started_at: self.started_at,
            finished_at: Utc::now(),
            inputs: self.inputs,
            output: output.to_path_buf(),
            stored: stored.into(),
            stats: serde_json::to_value(stats)?,
            fingerprint,
        };

        let path = report_path(output);
        std::fs::write(&path, serde_json::to_string_pretty(&report)?)?;
        info!(
            command = %report.command,
            report = %path.display(),
            fingerprint = %report.fingerprint,
            elapsed_ms = (report.finished_at - report.started_at).num_milliseconds(),
            "Run report written"
        );
        Ok(report)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ensure_inputs_names_missing_file() {
        let dir = TempDir::new().unwrap();
        let present = dir.path().join("kegg.db");
        std::fs::write(&present, b"").unwrap();
        let missing = dir.path().join("ferrdb.db");

        let err = ensure_inputs([present.as_path(), missing.as_path()]).unwrap_err();
        assert!(matches!(err, IngestError::MissingInput(path) if path == missing));
    }

    #[test]
    fn test_report_written_next_to_output() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("input.tsv");
        std::fs::write(&input, b"source\ttarget\n").unwrap();
        let output = dir.path().join("merged.db");

        let mut recorder = RunRecorder::start("merge");
        recorder.input(&input).unwrap();
        let report = recorder
            .finish(&output, &StorageStats::default(), &serde_json::json!({"sources": 1}), "abc".into())
            .unwrap();

        assert_eq!(report.inputs[0].sha256.len(), 64);
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(report_path(&output)).unwrap()).unwrap();
        assert_eq!(written["command"], "merge");
        assert_eq!(written["stats"]["sources"], 1);
        assert_eq!(written["fingerprint"], "abc");
    }
}
