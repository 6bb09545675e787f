//! MyGene.info batch symbol queries

use crate::config::{http_client, MyGeneConfig};
use crate::error::{IngestError, Result};
use ferronet_core::index::GeneLookup;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

const QUERY_FIELDS: &str = "symbol,name,ensembl.gene,uniprot,alias";

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    fn first(&self) -> Option<&T> {
        match self {
            OneOrMany::One(value) => Some(value),
            OneOrMany::Many(values) => values.first(),
        }
    }

    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct EnsemblRef {
    gene: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct UniprotRef {
    #[serde(rename = "Swiss-Prot")]
    swiss_prot: Option<OneOrMany<String>>,
    #[serde(rename = "TrEMBL")]
    trembl: Option<OneOrMany<String>>,
}

/// One element of the `/query` response array
#[derive(Debug, Clone, Deserialize)]
struct RawHit {
    query: String,
    #[serde(default)]
    notfound: bool,
    #[serde(rename = "_id")]
    entrez_id: Option<String>,
    symbol: Option<String>,
    name: Option<String>,
    alias: Option<OneOrMany<String>>,
    ensembl: Option<OneOrMany<EnsemblRef>>,
    uniprot: Option<UniprotRef>,
}

/// Gene record for a queried symbol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneHit {
    pub query: String,
    pub entrez_id: Option<String>,
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub aliases: Vec<String>,
    pub ensembl_id: Option<String>,
    /// Swiss-Prot accession, else the first TrEMBL accession
    pub uniprot_id: Option<String>,
}

impl From<RawHit> for GeneHit {
    fn from(raw: RawHit) -> Self {
        let uniprot_id = raw.uniprot.as_ref().and_then(|uniprot| {
            uniprot
                .swiss_prot
                .as_ref()
                .and_then(|swiss_prot| swiss_prot.first().cloned())
                .or_else(|| uniprot.trembl.as_ref().and_then(|trembl| trembl.first().cloned()))
        });
        let ensembl_id = raw
            .ensembl
            .as_ref()
            .and_then(|ensembl| ensembl.first())
            .and_then(|ensembl| ensembl.gene.clone());

        Self {
            query: raw.query,
            entrez_id: raw.entrez_id,
            symbol: raw.symbol,
            name: raw.name,
            aliases: raw.alias.map(OneOrMany::into_vec).unwrap_or_default(),
            ensembl_id,
            uniprot_id,
        }
    }
}

/// Query → first hit, keyed by the lower-cased query
#[derive(Debug, Clone, Default)]
pub struct GeneHits {
    hits: HashMap<String, GeneHit>,
    pub failed_batches: usize,
}

impl GeneHits {
    pub fn get(&self, query: &str) -> Option<&GeneHit> {
        self.hits.get(&query.trim().to_lowercase())
    }

    pub fn insert(&mut self, hit: GeneHit) {
        self.hits.entry(hit.query.trim().to_lowercase()).or_insert(hit);
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Symbol → UniProt lookup for the edge resolver
    pub fn to_lookup(&self) -> PrefetchedLookup {
        let mut by_symbol = HashMap::new();
        for hit in self.hits.values() {
            let Some(accession) = hit.uniprot_id.as_ref() else {
                continue;
            };
            by_symbol
                .entry(hit.query.trim().to_lowercase())
                .or_insert_with(|| accession.clone());
            if let Some(symbol) = hit.symbol.as_ref() {
                by_symbol
                    .entry(symbol.to_lowercase())
                    .or_insert_with(|| accession.clone());
            }
        }
        PrefetchedLookup { by_symbol }
    }
}

impl FromIterator<GeneHit> for GeneHits {
    fn from_iter<I: IntoIterator<Item = GeneHit>>(iter: I) -> Self {
        let mut hits = GeneHits::default();
        for hit in iter {
            hits.insert(hit);
        }
        hits
    }
}

/// Gene lookup answered from hits fetched before the merge
#[derive(Debug, Clone, Default)]
pub struct PrefetchedLookup {
    by_symbol: HashMap<String, String>,
}

impl GeneLookup for PrefetchedLookup {
    fn uniprot_for_symbol(&self, symbol: &str) -> Option<String> {
        self.by_symbol.get(&symbol.trim().to_lowercase()).cloned()
    }
}

pub struct MyGeneClient {
    client: reqwest::Client,
    config: MyGeneConfig,
}

impl MyGeneClient {
    pub fn new(config: MyGeneConfig) -> Result<Self> {
        config.validate()?;
        let client = http_client(config.timeout_secs)?;
        Ok(Self { client, config })
    }

    /// Query symbols in batches
    ///
    /// A batch that still fails after the retries is logged and skipped.
    pub async fn query_symbols(&self, symbols: &[String]) -> Result<GeneHits> {
        let mut hits = GeneHits::default();
        let batches = symbols.chunks(self.config.batch_size);
        let total = batches.len();

        for (position, batch) in batches.enumerate() {
            debug!(batch = position + 1, total, size = batch.len(), "Querying MyGene");
            match self.query_batch_with_retry(batch).await {
                Ok(raw_hits) => {
                    for raw in raw_hits.into_iter().filter(|raw| !raw.notfound) {
                        hits.insert(raw.into());
                    }
                },
                Err(err) => {
                    warn!(batch = position + 1, error = %err, "MyGene batch failed, skipping");
                    hits.failed_batches += 1;
                },
            }
        }

        info!(
            queried = symbols.len(),
            found = hits.len(),
            failed_batches = hits.failed_batches,
            "MyGene lookup complete"
        );
        Ok(hits)
    }

    async fn query_batch_with_retry(&self, batch: &[String]) -> Result<Vec<RawHit>> {
        let mut last_error = None;

        for attempt in 1..=self.config.max_retries.max(1) {
            match self.query_batch(batch).await {
                Ok(hits) => return Ok(hits),
                Err(err) => {
                    warn!("MyGene attempt {}/{} failed: {}", attempt, self.config.max_retries, err);
                    last_error = Some(err);

                    if attempt < self.config.max_retries {
                        let backoff_secs = 2u64.pow(attempt);
                        tokio::time::sleep(Duration::from_secs(backoff_secs)).await;
                    }
                },
            }
        }

        Err(last_error.unwrap_or_else(|| IngestError::config("MyGene max_retries is 0")))
    }

    async fn query_batch(&self, batch: &[String]) -> Result<Vec<RawHit>> {
        let url = format!("{}/query", self.config.base_url.trim_end_matches('/'));
        let body = serde_json::json!({
            "q": batch,
            "species": self.config.species,
            "fields": QUERY_FIELDS,
        });

        let response = self.client.post(&url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(IngestError::Service {
                url,
                status: response.status().as_u16(),
            });
        }
        Ok(response.json().await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_prefers_swiss_prot() {
        let raw: Vec<RawHit> = serde_json::from_str(
            r#"[
                {"query": "gpx4", "_id": "2879", "symbol": "GPX4", "name": "glutathione peroxidase 4",
                 "alias": ["GPx-4", "MCSP"], "ensembl": {"gene": "ENSG00000167468"},
                 "uniprot": {"Swiss-Prot": "P36969", "TrEMBL": ["A0A024R1V9"]}},
                {"query": "ncoa4", "_id": "8031", "symbol": "NCOA4", "alias": "ARA70",
                 "ensembl": [{"gene": "ENSG00000266412"}, {"gene": "ENSG00000288669"}],
                 "uniprot": {"TrEMBL": ["Q5T9V3", "A0A0A0MRN0"]}},
                {"query": "notagene", "notfound": true}
            ]"#,
        )
        .unwrap();

        let hits: GeneHits = raw
            .into_iter()
            .filter(|raw| !raw.notfound)
            .map(GeneHit::from)
            .collect();

        let gpx4 = hits.get("GPX4").unwrap();
        assert_eq!(gpx4.uniprot_id.as_deref(), Some("P36969"));
        assert_eq!(gpx4.ensembl_id.as_deref(), Some("ENSG00000167468"));
        assert_eq!(gpx4.aliases, vec!["GPx-4", "MCSP"]);

        let ncoa4 = hits.get("ncoa4").unwrap();
        assert_eq!(ncoa4.uniprot_id.as_deref(), Some("Q5T9V3"));
        assert_eq!(ncoa4.ensembl_id.as_deref(), Some("ENSG00000266412"));
        assert_eq!(ncoa4.aliases, vec!["ARA70"]);
        assert!(hits.get("notagene").is_none());

        let lookup = hits.to_lookup();
        assert_eq!(lookup.uniprot_for_symbol("Gpx4"), Some("P36969".to_string()));
    }
}
