//! KEGG pathway maps (KGML)
//!
//! Gene and compound entries become nodes; every relation expands to the
//! cartesian product of the KEGG ids behind its two entries.

use crate::error::Result;
use crate::sources::SourceBuilder;
use ferronet_common::types::{IdType, NodeType, HUMAN_TAX_ID};
use ferronet_core::models::{direction_tags, Edge, Identifier, Node, SourceNetwork};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

pub const SOURCE_DB: &str = "KEGG";
pub const LAYER: &str = "0";
pub const ROLE: &str = "core";

/// KGML document root
#[derive(Debug, Clone, Deserialize)]
pub struct KgmlPathway {
    /// e.g. `path:hsa04216`
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@title", default)]
    pub title: Option<String>,
    #[serde(rename = "entry", default)]
    pub entries: Vec<KgmlEntry>,
    #[serde(rename = "relation", default)]
    pub relations: Vec<KgmlRelation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KgmlEntry {
    #[serde(rename = "@id")]
    pub id: String,
    /// Space-separated KEGG ids (`hsa:2879 hsa:2880`)
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@type")]
    pub entry_type: String,
    #[serde(default)]
    pub graphics: Vec<KgmlGraphics>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KgmlGraphics {
    #[serde(rename = "@name", default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KgmlRelation {
    #[serde(rename = "@entry1")]
    pub entry1: String,
    #[serde(rename = "@entry2")]
    pub entry2: String,
    #[serde(rename = "@type", default)]
    pub relation_type: Option<String>,
    #[serde(rename = "subtype", default)]
    pub subtypes: Vec<KgmlSubtype>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KgmlSubtype {
    #[serde(rename = "@name")]
    pub name: String,
}

impl KgmlEntry {
    pub fn kegg_ids(&self) -> impl Iterator<Item = &str> {
        self.name.split_whitespace()
    }

    /// First label of the first graphics element (`"GPX4, GPX-4..."` → `GPX4`)
    pub fn label(&self) -> Option<&str> {
        self.graphics
            .iter()
            .filter_map(|graphics| graphics.name.as_deref())
            .next()
            .and_then(|name| name.split(',').next())
            .map(|label| label.trim().trim_end_matches("..."))
            .filter(|label| !label.is_empty())
    }

    fn node_type(&self) -> Option<NodeType> {
        match self.entry_type.as_str() {
            "gene" => Some(NodeType::Protein),
            "compound" => Some(NodeType::SmallMolecule),
            _ => None,
        }
    }
}

pub fn parse_kgml(xml: &str) -> Result<KgmlPathway> {
    Ok(quick_xml::de::from_str(xml)?)
}

pub async fn read_kgml(path: &Path) -> Result<KgmlPathway> {
    let xml = tokio::fs::read_to_string(path).await?;
    let pathway = parse_kgml(&xml)?;
    debug!(
        path = %path.display(),
        pathway = %pathway.name,
        entries = pathway.entries.len(),
        relations = pathway.relations.len(),
        "Parsed KGML"
    );
    Ok(pathway)
}

/// KEGG gene ids of every gene entry, in first-seen order
pub fn gene_ids(pathways: &[KgmlPathway]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    pathways
        .iter()
        .flat_map(|pathway| &pathway.entries)
        .filter(|entry| entry.entry_type == "gene")
        .flat_map(|entry| entry.kegg_ids())
        .filter(|id| seen.insert(*id))
        .map(str::to_string)
        .collect()
}

/// Build the KEGG source network
///
/// `uniprot` maps KEGG gene ids to UniProt accessions; mapped genes are named
/// by their accession, the rest keep their KEGG id.
pub fn build_network(pathways: &[KgmlPathway], uniprot: &HashMap<String, String>) -> SourceNetwork {
    let mut builder = SourceBuilder::new("kegg");
    let mut skipped_relations = 0usize;

    for pathway in pathways {
        let mut members: HashMap<&str, Vec<String>> = HashMap::new();

        for entry in &pathway.entries {
            let Some(node_type) = entry.node_type() else {
                continue;
            };
            let single = entry.kegg_ids().count() == 1;
            let names: Vec<String> = entry
                .kegg_ids()
                .filter_map(|kegg_id| {
                    let node = entry_node(kegg_id, node_type, &pathway.name, entry.label().filter(|_| single), uniprot);
                    builder.add_node(node).map(str::to_string)
                })
                .collect();
            members.insert(entry.id.as_str(), names);
        }

        for relation in &pathway.relations {
            let (Some(sources), Some(targets)) = (
                members.get(relation.entry1.as_str()),
                members.get(relation.entry2.as_str()),
            ) else {
                skipped_relations += 1;
                continue;
            };

            let mut tags = direction_tags(true, true);
            for subtype in &relation.subtypes {
                tags.push('|');
                tags.push_str(&subtype.name);
            }

            for source in sources {
                for target in targets {
                    builder.add_edge(
                        Edge::new(source.clone(), target.clone(), LAYER)
                            .with_interaction_types(&tags)
                            .with_source_db(SOURCE_DB),
                    );
                }
            }
        }
    }

    info!(
        pathways = pathways.len(),
        nodes = builder.node_count(),
        edges = builder.edge_count(),
        skipped_relations,
        "Built KEGG network"
    );
    builder.finish()
}

fn entry_node(
    kegg_id: &str,
    node_type: NodeType,
    pathway: &str,
    label: Option<&str>,
    uniprot: &HashMap<String, String>,
) -> Node {
    let mapped = uniprot.get(kegg_id).filter(|_| node_type == NodeType::Protein);
    let mut node = match mapped {
        Some(accession) => Node::new(accession.clone(), IdType::UniprotId, node_type)
            .with_identifier(Identifier::primary(IdType::UniprotId, accession.clone()))
            .with_identifier(Identifier::new(IdType::KeggId, kegg_id)),
        None => Node::new(kegg_id, IdType::KeggId, node_type)
            .with_identifier(Identifier::primary(IdType::KeggId, kegg_id)),
    }
    .with_pathways(pathway)
    .with_role(ROLE)
    .with_source_db(SOURCE_DB);

    if let Some(label) = label {
        node = node.with_display_name(label);
        if node_type == NodeType::Protein {
            node.add_identifier(Identifier::new(IdType::GeneName, label));
        }
    }
    if node_type == NodeType::Protein {
        node.tax_id = Some(HUMAN_TAX_ID);
    }
    node
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const KGML: &str = r#"<?xml version="1.0"?>
<!DOCTYPE pathway SYSTEM "https://www.kegg.jp/kegg/xml/KGML_v0.7.2_.dtd">
<pathway name="path:hsa04216" org="hsa" number="04216" title="Ferroptosis">
    <entry id="1" name="hsa:2879" type="gene">
        <graphics name="GPX4, GPX-4, MCSP..." type="rectangle"/>
    </entry>
    <entry id="2" name="hsa:6520 hsa:23657" type="gene">
        <graphics name="SLC3A2, 4F2..." type="rectangle"/>
    </entry>
    <entry id="3" name="cpd:C00051" type="compound">
        <graphics name="C00051" type="circle"/>
    </entry>
    <entry id="4" name="path:hsa00480" type="map">
        <graphics name="Glutathione metabolism" type="roundrectangle"/>
    </entry>
    <relation entry1="2" entry2="1" type="PPrel">
        <subtype name="activation" value="--&gt;"/>
    </relation>
    <relation entry1="4" entry2="1" type="maplink">
        <subtype name="compound" value="3"/>
    </relation>
</pathway>"#;

    #[test]
    fn test_parse_entries_and_relations() {
        let pathway = parse_kgml(KGML).unwrap();
        assert_eq!(pathway.name, "path:hsa04216");
        assert_eq!(pathway.title.as_deref(), Some("Ferroptosis"));
        assert_eq!(pathway.entries.len(), 4);
        assert_eq!(pathway.entries[0].label(), Some("GPX4"));
        assert_eq!(pathway.relations[0].subtypes[0].name, "activation");
        assert_eq!(gene_ids(&[pathway]), vec!["hsa:2879", "hsa:6520", "hsa:23657"]);
    }

    #[test]
    fn test_relations_expand_to_gene_pairs() {
        let pathway = parse_kgml(KGML).unwrap();
        let uniprot: HashMap<String, String> =
            [("hsa:2879".to_string(), "P36969".to_string())].into_iter().collect();

        let network = build_network(&[pathway], &uniprot);

        assert_eq!(network.nodes.len(), 4);
        let gpx4 = &network.nodes[0];
        assert_eq!(gpx4.name, "P36969");
        assert_eq!(gpx4.label(), "GPX4");
        assert_eq!(gpx4.identifier(IdType::KeggId), Some("hsa:2879"));
        assert_eq!(gpx4.role_in_ferroptosis, "core");
        assert_eq!(gpx4.pathways, "path:hsa04216");

        let compound = network.nodes.iter().find(|node| node.name == "cpd:C00051").unwrap();
        assert_eq!(compound.node_type, NodeType::SmallMolecule);
        assert_eq!(compound.tax_id, None);

        assert_eq!(network.edges.len(), 2);
        assert!(network.edges.iter().all(|edge| edge.target == "P36969"));
        assert_eq!(
            network.edges[0].interaction_types,
            "activation|is_direct:true|is_directed:true"
        );
    }
}
