//! Whole-network merge
//!
//! Combines several source networks into one graph: nodes are deduplicated,
//! edges reconciled against the merged nodes, and disease / experiment rows
//! re-pointed at the reconciled edges.

use crate::alias::AliasMap;
use crate::edges::{EdgeReconciler, EdgeStats};
use crate::index::{GeneLookup, IdentityIndex, Resolver};
use crate::list_union;
use crate::merger::{merge_nodes, NodeMergeStats};
use crate::models::{Disease, DiseaseLink, Edge, ExperimentModel, Node, SourceNetwork};
use ferronet_common::checksum::checksum_lines;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{info, info_span, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeStats {
    pub sources: usize,
    pub nodes: NodeMergeStats,
    pub edges: EdgeStats,
    pub diseases: usize,
    pub disease_links: usize,
    pub experiments: usize,
    /// Disease links and experiments whose edge was skipped
    pub orphaned_rows: usize,
}

#[derive(Debug, Clone, Default)]
pub struct MergedNetwork {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub diseases: Vec<Disease>,
    pub disease_links: Vec<DiseaseLink>,
    pub experiments: Vec<ExperimentModel>,
    pub name_mapping: HashMap<String, String>,
    pub stats: MergeStats,
}

impl MergedNetwork {
    pub fn index(&self) -> IdentityIndex {
        IdentityIndex::build(&self.nodes)
    }

    /// View the merged graph as a source for a further merge
    pub fn into_source(self, label: impl Into<String>) -> SourceNetwork {
        SourceNetwork {
            label: label.into(),
            nodes: self.nodes,
            edges: self.edges,
            diseases: self.diseases,
            disease_links: self.disease_links,
            experiments: self.experiments,
        }
    }

    /// SHA-256 over the sorted content of the graph
    ///
    /// Two runs that produce the same nodes, edges and auxiliary rows produce
    /// the same fingerprint, regardless of row order.
    pub fn fingerprint(&self) -> String {
        let mut lines: Vec<String> = Vec::new();

        for node in &self.nodes {
            let identifiers: Vec<String> = node
                .identifiers()
                .iter()
                .map(|id| {
                    let marker = if id.is_primary { "*" } else { "" };
                    format!("{}={}{}", id.id_type, id.value, marker)
                })
                .collect();
            lines.push(format!(
                "node\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                node.name,
                node.primary_id_type,
                node.label(),
                node.node_type,
                node.tax_id.map(|tax| tax.to_string()).unwrap_or_default(),
                identifiers.join(","),
                node.pathways,
                node.role_in_ferroptosis,
                node.function,
                node.source_db
            ));
        }
        for edge in &self.edges {
            lines.push(edge_line(edge));
        }
        for disease in &self.diseases {
            lines.push(format!(
                "disease\t{}\t{}\t{}",
                disease.disease_id, disease.disease_name, disease.description
            ));
        }
        for link in &self.disease_links {
            let edge = self.edges.get(link.edge).map(edge_line).unwrap_or_default();
            lines.push(format!(
                "disease_edge\t{}\t{}\t{}\t{}",
                link.disease_id, edge, link.reference, link.source_db
            ));
        }
        for experiment in &self.experiments {
            let edge = self.edges.get(experiment.edge).map(edge_line).unwrap_or_default();
            lines.push(format!(
                "experiment\t{}\t{}\t{}\t{}",
                edge, experiment.cellline, experiment.in_vivo, experiment.reference
            ));
        }

        lines.sort_unstable();
        checksum_lines(lines)
    }
}

fn edge_line(edge: &Edge) -> String {
    format!(
        "edge\t{}\t{}\t{}\t{}\t{}\t{}",
        edge.source,
        edge.target,
        edge.layer,
        edge.interaction_types,
        edge.effect_on_ferroptosis,
        edge.source_db
    )
}

/// Merges source networks with a fixed alias table and gene lookup
pub struct NetworkMerger<L: GeneLookup> {
    aliases: AliasMap,
    lookup: L,
}

impl<L: GeneLookup> NetworkMerger<L> {
    pub fn new(aliases: AliasMap, lookup: L) -> Self {
        Self { aliases, lookup }
    }

    pub fn merge(&self, sources: &[SourceNetwork]) -> MergedNetwork {
        let span = info_span!("merge_networks", sources = sources.len());
        let _enter = span.enter();

        // Step 1: nodes
        let mut nameless = 0usize;
        let records: Vec<Node> = sources
            .iter()
            .flat_map(|source| source.nodes.iter())
            .filter(|node| {
                let absent = list_union::is_absent(&node.name);
                nameless += usize::from(absent);
                !absent
            })
            .cloned()
            .collect();
        if nameless > 0 {
            warn!(nameless, "Dropping node records without a name");
        }
        info!(records = records.len(), "Step 1/4: Merging nodes");
        let node_merge = merge_nodes(&records);
        let nodes = node_merge.nodes;
        let index = IdentityIndex::build(&nodes);

        let mut aliases = self.aliases.clone();
        for node in &nodes {
            for key in node.lookup_keys() {
                aliases.insert_case_folded(key);
            }
        }

        // Step 2: diseases
        info!("Step 2/4: Merging diseases");
        let diseases = merge_diseases(sources);

        // Step 3: edges
        info!("Step 3/4: Reconciling edges");
        let mut reconciler = EdgeReconciler::new(Resolver::new(&index, &aliases, &self.lookup));
        let mut edge_maps: Vec<Vec<Option<usize>>> = Vec::with_capacity(sources.len());
        for source in sources {
            let before = reconciler.stats().unresolved;
            let map: Vec<Option<usize>> = source
                .edges
                .iter()
                .map(|edge| reconciler.add(edge).ok())
                .collect();
            let skipped = reconciler.stats().unresolved - before;
            if skipped > 0 {
                warn!(source = %source.label, skipped, "Source edges with unresolved endpoints");
            }
            edge_maps.push(map);
        }
        let (edges, edge_stats) = reconciler.finish();

        // Step 4: auxiliary rows
        info!("Step 4/4: Re-linking disease and experiment rows");
        let mut orphaned_rows = 0;
        let mut seen_links = HashSet::new();
        let mut disease_links = Vec::new();
        let mut seen_experiments = HashSet::new();
        let mut experiments = Vec::new();

        for (source, edge_map) in sources.iter().zip(&edge_maps) {
            for link in &source.disease_links {
                let Some(edge) = edge_map.get(link.edge).copied().flatten() else {
                    orphaned_rows += 1;
                    continue;
                };
                if seen_links.insert((link.disease_id.clone(), edge)) {
                    disease_links.push(DiseaseLink {
                        edge,
                        ..link.clone()
                    });
                }
            }
            for experiment in &source.experiments {
                let Some(edge) = edge_map.get(experiment.edge).copied().flatten() else {
                    orphaned_rows += 1;
                    continue;
                };
                let relinked = ExperimentModel {
                    edge,
                    ..experiment.clone()
                };
                if seen_experiments.insert(relinked.clone()) {
                    experiments.push(relinked);
                }
            }
        }

        let stats = MergeStats {
            sources: sources.len(),
            nodes: node_merge.stats,
            edges: edge_stats,
            diseases: diseases.len(),
            disease_links: disease_links.len(),
            experiments: experiments.len(),
            orphaned_rows,
        };
        info!(
            nodes = nodes.len(),
            edges = edges.len(),
            diseases = stats.diseases,
            disease_links = stats.disease_links,
            experiments = stats.experiments,
            orphaned = orphaned_rows,
            "Network merge complete"
        );

        MergedNetwork {
            nodes,
            edges,
            diseases,
            disease_links,
            experiments,
            name_mapping: node_merge.name_mapping,
            stats,
        }
    }
}

/// Union diseases by id; the first name wins, descriptions are unioned
fn merge_diseases(sources: &[SourceNetwork]) -> Vec<Disease> {
    let mut position: HashMap<String, usize> = HashMap::new();
    let mut diseases: Vec<Disease> = Vec::new();

    for disease in sources.iter().flat_map(|source| &source.diseases) {
        if list_union::is_absent(&disease.disease_id) {
            continue;
        }
        match position.get(&disease.disease_id) {
            Some(&existing) => {
                let merged = &mut diseases[existing];
                if merged.disease_name.is_empty() {
                    merged.disease_name = disease.disease_name.clone();
                }
                merged.description =
                    list_union::merge_strings(&merged.description, &disease.description);
            },
            None => {
                position.insert(disease.disease_id.clone(), diseases.len());
                diseases.push(Disease {
                    description: list_union::normalize(&disease.description),
                    ..disease.clone()
                });
            },
        }
    }
    diseases
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::NoGeneLookup;
    use crate::models::{direction_tags, Identifier};
    use ferronet_common::types::{IdType, NodeType};

    fn protein(name: &str) -> Node {
        Node::new(name, IdType::UniprotId, NodeType::Protein)
    }

    #[test]
    fn test_disease_rows_follow_merged_edges() {
        let mut first = SourceNetwork::new("ferreg");
        first.nodes = vec![protein("P1"), protein("P2")];
        first.edges = vec![Edge::new("P1", "P2", "ferreg")
            .with_interaction_types(&direction_tags(true, false))
            .with_source_db("FerReg")];
        first.diseases = vec![Disease {
            disease_id: "2C90".to_string(),
            disease_name: "Renal cell carcinoma".to_string(),
            description: "kidney".to_string(),
        }];
        first.disease_links = vec![DiseaseLink {
            disease_id: "2C90".to_string(),
            edge: 0,
            reference: "PMID:1".to_string(),
            source_db: "FerReg".to_string(),
        }];
        first.experiments = vec![ExperimentModel {
            edge: 0,
            cellline: "786-O".to_string(),
            in_vivo: String::new(),
            reference: "FerReg".to_string(),
        }];

        let mut second = SourceNetwork::new("other");
        second.nodes = vec![Node::new("geneP2", IdType::GeneName, NodeType::Protein)
            .with_identifier(Identifier::new(IdType::UniprotId, "P2"))];
        second.edges = vec![
            Edge::new("P1", "geneP2", "ferreg").with_interaction_types(&direction_tags(true, false)),
            Edge::new("P1", "unknown", "ferreg"),
        ];
        second.diseases = vec![Disease {
            disease_id: "2C90".to_string(),
            disease_name: String::new(),
            description: "renal".to_string(),
        }];
        second.disease_links = vec![
            DiseaseLink {
                disease_id: "2C90".to_string(),
                edge: 0,
                reference: "PMID:2".to_string(),
                source_db: "other".to_string(),
            },
            DiseaseLink {
                disease_id: "2C90".to_string(),
                edge: 1,
                reference: "PMID:3".to_string(),
                source_db: "other".to_string(),
            },
        ];

        let merged = NetworkMerger::new(AliasMap::new(), NoGeneLookup).merge(&[first, second]);

        assert_eq!(merged.nodes.len(), 2);
        assert_eq!(merged.edges.len(), 1);
        assert_eq!(merged.diseases.len(), 1);
        assert_eq!(merged.diseases[0].description, "kidney|renal");
        assert_eq!(merged.disease_links.len(), 1);
        assert_eq!(merged.disease_links[0].reference, "PMID:1");
        assert_eq!(merged.experiments.len(), 1);
        assert_eq!(merged.stats.orphaned_rows, 1);
        assert_eq!(merged.stats.edges.unresolved, 1);
    }

    #[test]
    fn test_case_folded_names_resolve() {
        let mut source = SourceNetwork::new("ferrdb");
        source.nodes = vec![
            Node::new("Erastin", IdType::ExternalId, NodeType::SmallMolecule),
            protein("P1"),
        ];
        source.edges = vec![Edge::new("erastin", "P1", "ferrdb_pw")];
        let merged = NetworkMerger::new(AliasMap::new(), NoGeneLookup).merge(&[source]);
        assert_eq!(merged.edges.len(), 1);
        assert_eq!(merged.edges[0].source, "Erastin");
    }

    #[test]
    fn test_fingerprint_ignores_row_order() {
        let mut source = SourceNetwork::new("a");
        source.nodes = vec![protein("P1"), protein("P2")];
        let mut reversed = SourceNetwork::new("b");
        reversed.nodes = vec![protein("P2"), protein("P1")];

        let merger = NetworkMerger::new(AliasMap::new(), NoGeneLookup);
        assert_eq!(
            merger.merge(&[source]).fingerprint(),
            merger.merge(&[reversed]).fingerprint()
        );
    }

    #[test]
    fn test_nameless_records_are_dropped_before_merging() {
        let mut first = SourceNetwork::new("first");
        first.nodes = vec![protein("P1"), Node::new("", IdType::ExternalId, NodeType::Unresolved)];
        let mut second = SourceNetwork::new("second");
        second.nodes = vec![
            Node::new("", IdType::ExternalId, NodeType::Unresolved),
            Node::new("-", IdType::ExternalId, NodeType::Unresolved),
        ];

        let merged = NetworkMerger::new(AliasMap::new(), NoGeneLookup).merge(&[first, second]);

        let names: Vec<&str> = merged.nodes.iter().map(|node| node.name.as_str()).collect();
        assert_eq!(names, vec!["P1"]);
        assert_eq!(merged.stats.nodes.records_read, 1);
    }
}
