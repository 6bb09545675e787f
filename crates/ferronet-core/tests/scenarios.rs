//! End-to-end merge scenarios over small hand-built networks

use ferronet_common::types::{IdType, NodeType};
use ferronet_core::alias::AliasMap;
use ferronet_core::index::NoGeneLookup;
use ferronet_core::layers::{ExpansionPolicy, Layers};
use ferronet_core::list_union::{merge_strings, TagSet};
use ferronet_core::merger::merge_nodes;
use ferronet_core::models::{Edge, Identifier, Node, SourceNetwork};
use ferronet_core::network::NetworkMerger;
use std::collections::{BTreeSet, HashMap};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("ferronet_core=debug")
        .with_test_writer()
        .try_init();
}

fn set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|name| name.to_string()).collect()
}

#[test]
fn test_uniprot_and_kegg_records_merge_into_one_node() {
    init_tracing();

    let records = vec![
        Node::new("P12345", IdType::UniprotId, NodeType::Protein)
            .with_identifier(Identifier::new(IdType::KeggId, "hsa:100")),
        Node::new("hsa:100", IdType::KeggId, NodeType::Protein)
            .with_identifier(Identifier::new(IdType::UniprotId, "P12345")),
    ];

    let merged = merge_nodes(&records);

    assert_eq!(merged.nodes.len(), 1);
    let keys: BTreeSet<&str> = merged.nodes[0].lookup_keys().collect();
    assert!(keys.contains("P12345"));
    assert!(keys.contains("hsa:100"));
    assert_eq!(merged.nodes[0].identifier(IdType::KeggId), Some("hsa:100"));
    assert_eq!(merged.nodes[0].identifier(IdType::UniprotId), Some("P12345"));
}

#[test]
fn test_pathway_strings_union() {
    let merged = merge_strings("A|B", "B|C");
    let tokens: BTreeSet<&str> = merged.split('|').collect();
    assert_eq!(tokens, ["A", "B", "C"].into_iter().collect());
    assert_eq!(merged.split('|').count(), 3);
}

#[test]
fn test_directed_duplicates_union_tags_and_sources() {
    init_tracing();

    let mut source = SourceNetwork::new("scenario");
    source.nodes = vec![
        Node::new("A", IdType::UniprotId, NodeType::Protein),
        Node::new("B", IdType::UniprotId, NodeType::Protein),
    ];
    source.edges = vec![
        Edge::new("A", "B", "0")
            .with_interaction_types("is_directed:true|is_direct:true")
            .with_source_db("srcX"),
        Edge::new("A", "B", "0")
            .with_interaction_types("is_directed:true|sources:srcY")
            .with_source_db("srcY"),
    ];

    let merged = NetworkMerger::new(AliasMap::new(), NoGeneLookup).merge(&[source]);

    assert_eq!(merged.edges.len(), 1);
    let edge = &merged.edges[0];
    let tags = TagSet::parse(&edge.interaction_types);
    assert!(tags.contains("is_directed:true"));
    assert!(tags.contains("is_direct:true"));
    assert!(tags.contains("sources:srcY"));
    assert_eq!(tags.len(), 3);
    assert_eq!(edge.source_db, "srcX|srcY");
    assert_eq!(merged.stats.edges.merged, 1);
}

#[test]
fn test_layers_around_two_core_nodes() {
    let interactions = [("X", "Z"), ("Z", "W"), ("Y", "V")];
    let layers = Layers::classify(&set(&["X", "Y"]), interactions, 2, ExpansionPolicy::Undirected);

    assert_eq!(layers.core(), &set(&["X", "Y"]));
    assert_eq!(layers.layer(1), Some(&set(&["V", "Z"])));
    assert_eq!(layers.layer(2), Some(&set(&["W"])));
}

#[test]
fn test_three_sources_share_one_gene() {
    init_tracing();

    let mut kegg = SourceNetwork::new("kegg");
    kegg.nodes = vec![
        Node::new("P36969", IdType::UniprotId, NodeType::Protein)
            .with_identifier(Identifier::primary(IdType::UniprotId, "P36969"))
            .with_identifier(Identifier::new(IdType::KeggId, "hsa:2879"))
            .with_source_db("KEGG"),
        Node::new("Q16236", IdType::UniprotId, NodeType::Protein)
            .with_identifier(Identifier::new(IdType::KeggId, "hsa:4780"))
            .with_source_db("KEGG"),
    ];
    kegg.edges = vec![Edge::new("hsa:4780", "hsa:2879", "0")
        .with_interaction_types("is_directed:true|is_direct:true|expression")
        .with_source_db("KEGG")];

    let mut ferrdb = SourceNetwork::new("ferrdb");
    ferrdb.nodes = vec![Node::new("GPX4", IdType::GeneName, NodeType::Protein)
        .with_identifier(Identifier::new(IdType::UniprotId, "P36969"))
        .with_role("suppressor")
        .with_source_db("ferrdb")];
    ferrdb.edges = vec![Edge::new("NRF2", "gpx4", "ferrdb_pw")
        .with_interaction_types("is_directed:true|is_direct:false|positive")
        .with_effect("suppresses ferroptosis")
        .with_source_db("ferrdb")];

    let mut aliases = AliasMap::with_unicode_gene_symbols();
    aliases.insert("NRF2", "hsa:4780");
    let mut lookup = HashMap::new();
    lookup.insert("NFE2L2".to_string(), "Q16236".to_string());

    let merged = NetworkMerger::new(aliases, lookup).merge(&[kegg, ferrdb]);

    assert_eq!(merged.nodes.len(), 2);
    let gpx4 = merged
        .nodes
        .iter()
        .find(|node| node.name == "P36969")
        .expect("GPX4 node");
    assert_eq!(gpx4.source_db, "KEGG|ferrdb");
    assert_eq!(gpx4.role_in_ferroptosis, "suppressor");
    assert_eq!(merged.name_mapping.get("GPX4").map(String::as_str), Some("P36969"));

    assert_eq!(merged.edges.len(), 2);
    assert!(merged
        .edges
        .iter()
        .all(|edge| edge.source == "Q16236" && edge.target == "P36969"));
    assert_eq!(merged.stats.edges.unresolved, 0);
}
