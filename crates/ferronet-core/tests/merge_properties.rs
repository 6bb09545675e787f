//! Algebraic properties of the merge primitives

use ferronet_common::types::{IdType, NodeType};
use ferronet_core::alias::AliasMap;
use ferronet_core::edges::EdgeReconciler;
use ferronet_core::index::{IdentityIndex, NoGeneLookup, Resolver};
use ferronet_core::layers::{ExpansionPolicy, Layers};
use ferronet_core::list_union::merge_strings;
use ferronet_core::merger::{merge_nodes, Partition};
use ferronet_core::models::{Edge, Identifier, Node};
use proptest::prelude::*;
use std::collections::BTreeSet;

fn pipe_value() -> impl Strategy<Value = String> {
    prop::collection::vec(prop_oneof!["[a-c]{1,2}", Just("-".to_string()), Just(String::new())], 0..5)
        .prop_map(|tokens| tokens.join("|"))
}

fn records() -> impl Strategy<Value = Vec<Node>> {
    prop::collection::vec(prop::collection::vec(0u8..12, 0..3), 1..12).prop_map(|id_sets| {
        id_sets
            .into_iter()
            .enumerate()
            .map(|(position, ids)| {
                let mut node = Node::new(format!("r{}", position), IdType::ExternalId, NodeType::Protein);
                for id in ids {
                    node.add_identifier(Identifier::new(IdType::KeggId, format!("k{}", id)));
                }
                node
            })
            .collect()
    })
}

fn as_sets(partition: &Partition, records: &[Node]) -> BTreeSet<BTreeSet<String>> {
    partition
        .groups()
        .iter()
        .map(|group| group.iter().map(|&position| records[position].name.clone()).collect())
        .collect()
}

proptest! {
    #[test]
    fn merge_strings_is_commutative(a in pipe_value(), b in pipe_value()) {
        prop_assert_eq!(merge_strings(&a, &b), merge_strings(&b, &a));
    }

    #[test]
    fn merge_strings_is_idempotent(a in pipe_value(), b in pipe_value()) {
        let once = merge_strings(&a, &b);
        prop_assert_eq!(merge_strings(&once, &b), once.clone());
        prop_assert_eq!(merge_strings(&once, &once), once);
    }

    #[test]
    fn partition_is_order_independent(records in records()) {
        let forward = Partition::of(&records);
        let mut reversed_records = records.clone();
        reversed_records.reverse();
        let reversed = Partition::of(&reversed_records);
        prop_assert_eq!(as_sets(&forward, &records), as_sets(&reversed, &reversed_records));
    }

    #[test]
    fn merging_merged_nodes_changes_nothing(records in records()) {
        let once = merge_nodes(&records);
        let twice = merge_nodes(&once.nodes);
        prop_assert_eq!(&once.nodes, &twice.nodes);
    }

    #[test]
    fn records_sharing_an_identifier_share_a_node(records in records()) {
        let merged = merge_nodes(&records);
        for (i, a) in records.iter().enumerate() {
            for (j, b) in records.iter().enumerate() {
                let shared = a.identifiers().iter().any(|x| b.identifiers().iter().any(|y| x.value == y.value));
                if shared {
                    prop_assert_eq!(merged.assignment[i], merged.assignment[j]);
                }
            }
        }
    }

    #[test]
    fn layers_form_a_partition(edges in prop::collection::vec((0u8..10, 0u8..10), 0..25)) {
        let names: Vec<(String, String)> = edges
            .iter()
            .map(|(a, b)| (format!("n{}", a), format!("n{}", b)))
            .collect();
        let core: BTreeSet<String> = ["n0".to_string(), "n1".to_string()].into_iter().collect();
        let layers = Layers::classify(
            &core,
            names.iter().map(|(a, b)| (a.as_str(), b.as_str())),
            3,
            ExpansionPolicy::Undirected,
        );

        prop_assert_eq!(layers.core(), &core);
        let mut seen = BTreeSet::new();
        for (_, layer) in layers.iter() {
            for name in layer {
                prop_assert!(seen.insert(name.clone()), "{} appears in two layers", name);
            }
        }
    }
}

#[test]
fn undirected_insert_order_yields_one_edge() {
    let index = IdentityIndex::build(&[
        Node::new("A", IdType::UniprotId, NodeType::Protein),
        Node::new("B", IdType::UniprotId, NodeType::Protein),
    ]);
    let aliases = AliasMap::new();
    let mut reconciler = EdgeReconciler::new(Resolver::new(&index, &aliases, NoGeneLookup));

    reconciler
        .add(&Edge::new("A", "B", "2").with_source_db("one"))
        .ok();
    reconciler
        .add(&Edge::new("B", "A", "2").with_source_db("two"))
        .ok();

    let (edges, _) = reconciler.finish();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].source_db, "one|two");
}
