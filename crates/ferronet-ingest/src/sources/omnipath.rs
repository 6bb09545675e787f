//! OmniPath interaction table and layered extension around a core node set

use crate::error::Result;
use crate::sources::SourceBuilder;
use ferronet_common::types::{IdType, NodeType, HUMAN_TAX_ID};
use ferronet_core::classifier::IdentifierClassifier;
use ferronet_core::layers::{ExpansionPolicy, Layers};
use ferronet_core::list_union;
use ferronet_core::models::{direction_tags, Edge, Identifier, Node, SourceNetwork};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

pub const SOURCE_DB: &str = "OmniPath";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OmniPathInteraction {
    pub source: String,
    pub target: String,
    #[serde(default, deserialize_with = "flag")]
    pub is_directed: Option<bool>,
    #[serde(default)]
    pub sources: Option<String>,
}

/// `1`/`0`, `true`/`false` in any case; anything else is unknown
fn flag<'de, D>(deserializer: D) -> std::result::Result<Option<bool>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|raw| match raw.trim().to_lowercase().as_str() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }))
}

impl OmniPathInteraction {
    /// `is_directed:x|is_direct:x[|sources:...]`; unknown direction reads as undirected
    pub fn interaction_types(&self) -> String {
        let directed = self.is_directed.unwrap_or(false);
        let mut tags = direction_tags(directed, directed);
        if let Some(sources) = self.sources.as_deref().filter(|sources| !sources.trim().is_empty()) {
            tags.push_str("|sources:");
            tags.push_str(sources.trim());
        }
        tags
    }
}

pub fn read_interactions<R: Read>(reader: R) -> Result<Vec<OmniPathInteraction>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(reader);

    let mut interactions = Vec::new();
    let mut skipped = 0usize;
    for record in csv_reader.deserialize::<OmniPathInteraction>() {
        match record {
            Ok(interaction) if !interaction.source.is_empty() && !interaction.target.is_empty() => {
                interactions.push(interaction)
            },
            Ok(_) => skipped += 1,
            Err(err) => {
                warn!(error = %err, "Skipping malformed OmniPath row");
                skipped += 1;
            },
        }
    }
    if skipped > 0 {
        warn!(skipped, "OmniPath rows skipped");
    }
    Ok(interactions)
}

pub fn read_interactions_file(path: &Path) -> Result<Vec<OmniPathInteraction>> {
    let file = std::fs::File::open(path)?;
    let interactions = read_interactions(file)?;
    info!(path = %path.display(), interactions = interactions.len(), "Loaded OmniPath interactions");
    Ok(interactions)
}

/// UniProt accessions of a node, or its name when it has none
fn protein_keys(node: &Node) -> Vec<String> {
    let accessions: Vec<String> = node
        .identifiers()
        .iter()
        .filter(|identifier| identifier.id_type == IdType::UniprotId)
        .map(|identifier| identifier.value.clone())
        .collect();
    if accessions.is_empty() {
        vec![node.name.clone()]
    } else {
        accessions
    }
}

/// Protein nodes whose `source_db` contains `core_source`, by UniProt accession
pub fn core_set(nodes: &[Node], core_source: &str) -> BTreeSet<String> {
    nodes
        .iter()
        .filter(|node| node.node_type == NodeType::Protein)
        .filter(|node| list_union::tokens(&node.source_db).any(|tag| tag == core_source))
        .flat_map(protein_keys)
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtensionStats {
    pub interactions: usize,
    pub edges: usize,
    pub new_nodes: usize,
    pub skipped: usize,
    /// Edge count per layer label, index = label
    pub per_layer: Vec<usize>,
}

/// Layer OmniPath interactions around the core of `network`
///
/// Returns a source network holding the layered edges plus a node for every
/// endpoint the network does not know yet. New endpoints are typed by
/// `classifier`, so complexes and other non-UniProt ids keep their own label.
pub fn extension_network(
    network: &SourceNetwork,
    classifier: &IdentifierClassifier,
    interactions: &[OmniPathInteraction],
    core_source: &str,
    max_hops: usize,
    policy: ExpansionPolicy,
) -> (SourceNetwork, Layers, ExtensionStats) {
    let core = core_set(&network.nodes, core_source);
    let known: BTreeSet<String> = network
        .nodes
        .iter()
        .filter(|node| node.node_type == NodeType::Protein)
        .flat_map(protein_keys)
        .collect();

    let layers = Layers::classify(
        &core,
        interactions
            .iter()
            .map(|interaction| (interaction.source.as_str(), interaction.target.as_str())),
        max_hops,
        policy,
    );

    let mut builder = SourceBuilder::new("omnipath");
    let mut stats = ExtensionStats {
        interactions: interactions.len(),
        per_layer: vec![0; max_hops + 1],
        ..ExtensionStats::default()
    };

    for interaction in interactions {
        let Some(label) = layers.edge_layer(&interaction.source, &interaction.target, max_hops) else {
            stats.skipped += 1;
            continue;
        };
        for endpoint in [&interaction.source, &interaction.target] {
            if !known.contains(endpoint) && !builder.has_node(endpoint) {
                let id_type = classifier.classify(endpoint);
                let added = builder.add_node(
                    Node::new(endpoint.clone(), id_type, NodeType::Protein)
                        .with_display_name(endpoint.clone())
                        .with_tax_id(HUMAN_TAX_ID)
                        .with_identifier(Identifier::primary(id_type, endpoint.clone()))
                        .with_source_db(SOURCE_DB),
                );
                if added.is_some() {
                    stats.new_nodes += 1;
                }
            }
        }
        builder.add_edge(
            Edge::new(interaction.source.clone(), interaction.target.clone(), label.to_string())
                .with_interaction_types(&interaction.interaction_types())
                .with_source_db(SOURCE_DB),
        );
        stats.per_layer[label] += 1;
    }

    let extension = builder.finish();
    stats.edges = extension.edges.len();
    info!(
        core = core.len(),
        interactions = stats.interactions,
        edges = stats.edges,
        new_nodes = stats.new_nodes,
        skipped = stats.skipped,
        per_layer = ?stats.per_layer,
        "Built OmniPath extension"
    );
    (extension, layers, stats)
}
