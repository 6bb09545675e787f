//! FerrDB drivers, suppressors and markers
//!
//! Each curated gene becomes a node. Its free-text `Pathway` column
//! (`SLC7A11:+:GSH:+:GPX4:-:ferroptosis, ...`) is parsed into signed steps;
//! steps between resolvable entities become `ferrdb_pw` edges.

use crate::clients::GeneHits;
use crate::error::{IngestError, Result};
use crate::sources::compounds::CompoundIndex;
use crate::sources::{text_column as text, SourceBuilder};
use crate::storage::{open_read_only, table_exists};
use ferronet_common::types::{IdType, NodeType, HUMAN_TAX_ID};
use ferronet_core::alias::AliasMap;
use ferronet_core::models::{direction_tags, Edge, Identifier, Node, SourceNetwork};
use regex::Regex;
use sqlx::sqlite::SqliteRow;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info, warn};

pub const SOURCE_DB: &str = "ferrdb";
pub const LAYER: &str = "ferrdb_pw";
pub const TABLES: [&str; 3] = ["driver", "suppressor", "marker"];

const FERROPTOSIS: &str = "ferroptosis";
const PROTEIN_CODING: &str = "gene with protein product";
const VALIDATED: &str = "Validated";

// ============================================================================
// Pathway strings
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sign {
    Positive,
    Negative,
}

impl Sign {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sign::Positive => "positive",
            Sign::Negative => "negative",
        }
    }

    fn from_marker(marker: &str) -> Self {
        if marker.contains('-') {
            Sign::Negative
        } else {
            Sign::Positive
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathwayStep {
    pub source: String,
    pub target: String,
    pub sign: Sign,
}

impl PathwayStep {
    /// Steps into "ferroptosis" or out of a parenthesised annotation carry no edge
    pub fn is_interaction(&self) -> bool {
        let annotation = |entity: &str| entity.starts_with('(');
        !(annotation(&self.source)
            || annotation(&self.target)
            || self.target.eq_ignore_ascii_case(FERROPTOSIS)
            || self.source.eq_ignore_ascii_case(FERROPTOSIS))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPathway {
    pub steps: Vec<PathwayStep>,
}

impl ParsedPathway {
    /// Product of every step sign, terminal ferroptosis step included
    pub fn effect(&self) -> Option<&'static str> {
        if self.steps.is_empty() {
            return None;
        }
        let negatives = self
            .steps
            .iter()
            .filter(|step| step.sign == Sign::Negative)
            .count();
        Some(if negatives % 2 == 0 {
            "promotes ferroptosis"
        } else {
            "suppresses ferroptosis"
        })
    }

    pub fn interactions(&self) -> impl Iterator<Item = &PathwayStep> {
        self.steps.iter().filter(|step| step.is_interaction())
    }
}

pub struct PathwayParser {
    sign: Regex,
    whitespace: Regex,
    aliases: AliasMap,
}

impl PathwayParser {
    pub fn new(aliases: AliasMap) -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|err| IngestError::parse(format!("pathway pattern: {}", err)))
        };
        Ok(Self {
            sign: compile(r":[+-]:")?,
            whitespace: compile(r"\s+")?,
            aliases,
        })
    }

    /// Replace non-breaking spaces and collapse whitespace runs
    pub fn clean(&self, raw: &str) -> String {
        let replaced = raw.replace('\u{a0}', " ");
        self.whitespace.replace_all(&replaced, " ").trim().to_string()
    }

    fn entity(&self, raw: &str) -> String {
        let cleaned = self.clean(raw);
        self.aliases.canonicalize(&cleaned).to_string()
    }

    pub fn parse(&self, pathway: &str) -> ParsedPathway {
        let cleaned = self.clean(pathway);
        let mut steps = Vec::new();

        for chain in cleaned.split([',', ';']).map(str::trim).filter(|chain| !chain.is_empty()) {
            let signs: Vec<Sign> = self
                .sign
                .find_iter(chain)
                .map(|marker| Sign::from_marker(marker.as_str()))
                .collect();
            let entities: Vec<String> = self.sign.split(chain).map(|raw| self.entity(raw)).collect();

            if signs.is_empty() {
                debug!(chain, "Pathway fragment without a signed step");
                continue;
            }
            for (position, sign) in signs.into_iter().enumerate() {
                let (source, target) = (&entities[position], &entities[position + 1]);
                if source.is_empty() || target.is_empty() {
                    continue;
                }
                steps.push(PathwayStep {
                    source: source.clone(),
                    target: target.clone(),
                    sign,
                });
            }
        }
        ParsedPathway { steps }
    }
}

// ============================================================================
// Curated records
// ============================================================================

/// One validated human row of a driver / suppressor / marker table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FerrdbRecord {
    pub table: String,
    pub symbol: Option<String>,
    pub uniprot: Option<String>,
    pub hgnc: Option<String>,
    pub ensembl: Option<String>,
    pub pathway: Option<String>,
}

impl FerrdbRecord {
    fn from_row(table: &str, row: &SqliteRow) -> Self {
        Self {
            table: table.to_string(),
            symbol: text(row, "Symbol_or_reported_abbr").or_else(|| text(row, "Symbol")),
            uniprot: text(row, "UniProtAC"),
            hgnc: text(row, "HGNC_ID"),
            ensembl: text(row, "ENSG_stable"),
            pathway: text(row, "Pathway"),
        }
    }

    /// Human, validated, protein-coding; columns a table lacks do not filter
    fn passes_filters(row: &SqliteRow) -> bool {
        let organism_ok = text(row, "Exp_organism")
            .map_or(true, |organism| organism.to_lowercase().contains("human"));
        let confidence_ok = text(row, "Confidence").map_or(true, |confidence| confidence == VALIDATED);
        let gene_type_ok = text(row, "Gene_type_hgnc_locus_type_or_other")
            .map_or(true, |gene_type| gene_type == PROTEIN_CODING);
        organism_ok && confidence_ok && gene_type_ok
    }

    fn node(&self) -> Option<Node> {
        let name = self.uniprot.as_ref().or(self.symbol.as_ref())?;
        let primary_id_type = if self.uniprot.is_some() {
            IdType::UniprotId
        } else {
            IdType::GeneName
        };

        let mut node = Node::new(name.clone(), primary_id_type, NodeType::Protein)
            .with_tax_id(HUMAN_TAX_ID)
            .with_role(&self.table)
            .with_source_db(SOURCE_DB);
        if let Some(symbol) = &self.symbol {
            node = node.with_display_name(symbol.clone());
        }
        for (id_type, value) in [
            (IdType::UniprotId, &self.uniprot),
            (IdType::GeneName, &self.symbol),
            (IdType::HgncId, &self.hgnc),
            (IdType::EnsemblId, &self.ensembl),
        ] {
            if let Some(value) = value {
                node.add_identifier(Identifier {
                    id_type,
                    value: value.clone(),
                    is_primary: id_type == primary_id_type,
                });
            }
        }
        Some(node)
    }
}

/// Read the curated tables of a FerrDB export
pub async fn read_records(path: &Path) -> Result<Vec<FerrdbRecord>> {
    let pool = open_read_only(path).await?;
    let mut records = Vec::new();

    for table in TABLES {
        if !table_exists(&pool, table).await? {
            warn!(path = %path.display(), table, "FerrDB table missing, skipping");
            continue;
        }
        let rows = sqlx::query(&format!("SELECT * FROM \"{}\"", table))
            .fetch_all(&pool)
            .await?;
        let before = records.len();
        records.extend(
            rows.iter()
                .filter(|row| FerrdbRecord::passes_filters(row))
                .map(|row| FerrdbRecord::from_row(table, row)),
        );
        info!(table, rows = rows.len(), kept = records.len() - before, "Read FerrDB table");
    }

    pool.close().await;
    Ok(records)
}

/// Lower-cased pathway entities worth a gene lookup: not compounds, not annotations
pub fn gene_queries(records: &[FerrdbRecord], parser: &PathwayParser, compounds: &CompoundIndex) -> Vec<String> {
    let mut queries = BTreeSet::new();
    for record in records {
        let Some(pathway) = &record.pathway else {
            continue;
        };
        for step in parser.parse(pathway).interactions() {
            for entity in [&step.source, &step.target] {
                if !compounds.contains(entity) {
                    queries.insert(entity.to_lowercase());
                }
            }
        }
    }
    queries.into_iter().collect()
}

fn entity_node(entity: &str, hits: &GeneHits, compounds: &CompoundIndex) -> Option<Node> {
    if let Some(hit) = hits.get(entity) {
        let symbol = hit.symbol.clone().unwrap_or_else(|| entity.to_string());
        let (name, primary_id_type) = match &hit.uniprot_id {
            Some(accession) => (accession.clone(), IdType::UniprotId),
            None => (symbol.clone(), IdType::GeneName),
        };
        let mut node = Node::new(name, primary_id_type, NodeType::Protein)
            .with_display_name(symbol.clone())
            .with_tax_id(HUMAN_TAX_ID)
            .with_source_db(SOURCE_DB)
            .with_identifier(Identifier::new(IdType::GeneName, symbol));
        if let Some(accession) = &hit.uniprot_id {
            node.add_identifier(Identifier::primary(IdType::UniprotId, accession.clone()));
        }
        if let Some(ensembl) = &hit.ensembl_id {
            node.add_identifier(Identifier::new(IdType::EnsemblId, ensembl.clone()));
        }
        return Some(node);
    }

    compounds.get(entity).map(|compound_id| {
        Node::new(compound_id, IdType::KeggId, NodeType::SmallMolecule)
            .with_display_name(entity)
            .with_source_db(SOURCE_DB)
            .with_identifier(Identifier::primary(IdType::KeggId, compound_id))
    })
}

/// Build the FerrDB source network
pub fn build_network(
    records: &[FerrdbRecord],
    parser: &PathwayParser,
    hits: &GeneHits,
    compounds: &CompoundIndex,
) -> SourceNetwork {
    let mut builder = SourceBuilder::new(SOURCE_DB);
    let mut skipped_records = 0usize;
    let mut unresolved_steps = 0usize;

    for record in records {
        if record.symbol.as_deref().is_some_and(|symbol| compounds.contains(symbol)) {
            debug!(symbol = ?record.symbol, "FerrDB row names a compound, skipping node");
        } else if let Some(node) = record.node() {
            builder.add_node(node);
        } else {
            skipped_records += 1;
        }

        let Some(pathway) = &record.pathway else {
            continue;
        };
        let parsed = parser.parse(pathway);
        let effect = parsed.effect().unwrap_or_default();

        for step in parsed.interactions() {
            let (Some(source), Some(target)) = (
                entity_node(&step.source, hits, compounds),
                entity_node(&step.target, hits, compounds),
            ) else {
                unresolved_steps += 1;
                debug!(source = %step.source, target = %step.target, "Unresolved pathway step");
                continue;
            };
            let (Some(source), Some(target)) = (
                builder.add_node(source).map(str::to_string),
                builder.add_node(target).map(str::to_string),
            ) else {
                unresolved_steps += 1;
                continue;
            };

            let tags = format!("{}|{}", direction_tags(true, false), step.sign.as_str());
            builder.add_edge(
                Edge::new(source, target, LAYER)
                    .with_interaction_types(&tags)
                    .with_effect(effect)
                    .with_source_db(SOURCE_DB),
            );
        }
    }

    if skipped_records > 0 {
        warn!(skipped_records, "FerrDB rows without UniProt accession or symbol");
    }
    info!(
        records = records.len(),
        nodes = builder.node_count(),
        edges = builder.edge_count(),
        unresolved_steps,
        "Built FerrDB network"
    );
    builder.finish()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::clients::GeneHit;

    fn parser() -> PathwayParser {
        PathwayParser::new(AliasMap::with_unicode_gene_symbols()).unwrap()
    }

    fn hit(query: &str, symbol: &str, uniprot: &str) -> GeneHit {
        GeneHit {
            query: query.to_string(),
            entrez_id: None,
            symbol: Some(symbol.to_string()),
            name: None,
            aliases: Vec::new(),
            ensembl_id: None,
            uniprot_id: Some(uniprot.to_string()),
        }
    }

    #[test]
    fn test_parse_chains_and_effect() {
        let parsed = parser().parse("NF-κB:+:SLC7A11:+:GSH;\u{a0}GSH  :+: GPX4:-:ferroptosis, (ROS):+:TP53");

        let pairs: Vec<(&str, &str, Sign)> = parsed
            .steps
            .iter()
            .map(|step| (step.source.as_str(), step.target.as_str(), step.sign))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("NFKB1", "SLC7A11", Sign::Positive),
                ("SLC7A11", "GSH", Sign::Positive),
                ("GSH", "GPX4", Sign::Positive),
                ("GPX4", "ferroptosis", Sign::Negative),
                ("(ROS)", "TP53", Sign::Positive),
            ]
        );
        assert_eq!(parsed.interactions().count(), 3);
        assert_eq!(parsed.effect(), Some("suppresses ferroptosis"));
        assert_eq!(parser().parse("").effect(), None);
    }

    #[test]
    fn test_network_from_records() {
        let records = vec![
            FerrdbRecord {
                table: "suppressor".to_string(),
                symbol: Some("GPX4".to_string()),
                uniprot: Some("P36969".to_string()),
                hgnc: Some("HGNC:4556".to_string()),
                pathway: Some("SLC7A11:+:glutathione:+:GPX4:-:ferroptosis".to_string()),
                ..FerrdbRecord::default()
            },
            FerrdbRecord {
                table: "driver".to_string(),
                symbol: Some("NOTHING".to_string()),
                pathway: Some("unknownthing:+:GPX4".to_string()),
                ..FerrdbRecord::default()
            },
        ];
        let hits: GeneHits = [hit("slc7a11", "SLC7A11", "Q9UPY5"), hit("gpx4", "GPX4", "P36969")]
            .into_iter()
            .collect();
        let compounds = CompoundIndex::from_reader("cpd:C00051\tGlutathione; GSH\n".as_bytes()).unwrap();

        let queries = gene_queries(&records, &parser(), &compounds);
        assert_eq!(queries, vec!["gpx4", "slc7a11", "unknownthing"]);

        let network = build_network(&records, &parser(), &hits, &compounds);

        let names: Vec<&str> = network.nodes.iter().map(|node| node.name.as_str()).collect();
        assert_eq!(names, vec!["P36969", "Q9UPY5", "cpd:C00051", "NOTHING"]);
        assert_eq!(network.nodes[0].role_in_ferroptosis, "suppressor");
        assert_eq!(network.nodes[0].identifier(IdType::HgncId), Some("HGNC:4556"));

        assert_eq!(network.edges.len(), 2);
        assert_eq!(network.edges[0].source, "Q9UPY5");
        assert_eq!(network.edges[0].target, "cpd:C00051");
        assert_eq!(network.edges[0].layer, LAYER);
        assert_eq!(network.edges[0].effect_on_ferroptosis, "suppresses ferroptosis");
        assert_eq!(
            network.edges[0].interaction_types,
            "is_direct:false|is_directed:true|positive"
        );
    }
}
