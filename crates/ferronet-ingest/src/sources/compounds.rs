//! KEGG compound list (`cpd:C00001<TAB>Water; H2O`)

use crate::error::Result;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Lower-cased compound name → KEGG compound id
#[derive(Debug, Clone, Default)]
pub struct CompoundIndex {
    by_name: HashMap<String, String>,
}

impl CompoundIndex {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let index = Self::from_reader(file)?;
        info!(path = %path.display(), names = index.len(), "Loaded KEGG compound list");
        Ok(index)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_reader(reader);

        let mut by_name = HashMap::new();
        for record in csv_reader.records() {
            let record = record?;
            let (Some(id), Some(names)) = (record.get(0), record.get(1)) else {
                debug!(?record, "Skipping compound line without names");
                continue;
            };
            let id = id.trim();
            for name in names.split(';').map(str::trim).filter(|name| !name.is_empty()) {
                by_name
                    .entry(name.to_lowercase())
                    .or_insert_with(|| id.to_string());
            }
        }
        Ok(Self { by_name })
    }

    /// Compound id for a name, compared case-insensitively
    pub fn get(&self, name: &str) -> Option<&str> {
        self.by_name.get(&name.trim().to_lowercase()).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
