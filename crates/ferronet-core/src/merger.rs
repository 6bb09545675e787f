//! Node deduplication
//!
//! Records are grouped into equivalence classes: two records belong together
//! when a chain of shared lookup keys (name or identifier value) connects them.
//! The traversal runs over an inverted index of record positions with an
//! explicit work list, so group size never touches the call stack.

use crate::models::Node;
use ferronet_common::types::IdType;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info};

/// Equivalence classes as sorted lists of record positions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    groups: Vec<Vec<usize>>,
}

impl Partition {
    /// Group records connected through shared lookup keys
    ///
    /// Groups are ordered by their smallest member, members ascending.
    pub fn of(records: &[Node]) -> Self {
        let mut by_key: HashMap<&str, Vec<usize>> = HashMap::new();
        for (position, record) in records.iter().enumerate() {
            for key in record.lookup_keys() {
                let holders = by_key.entry(key).or_default();
                if holders.last() != Some(&position) {
                    holders.push(position);
                }
            }
        }

        let mut visited = vec![false; records.len()];
        let mut groups = Vec::new();
        let mut work = Vec::new();

        for start in 0..records.len() {
            if visited[start] {
                continue;
            }
            visited[start] = true;
            work.push(start);
            let mut group = Vec::new();

            while let Some(position) = work.pop() {
                group.push(position);
                for key in records[position].lookup_keys() {
                    let Some(holders) = by_key.get(key) else {
                        continue;
                    };
                    for &other in holders {
                        if !visited[other] {
                            visited[other] = true;
                            work.push(other);
                        }
                    }
                }
            }

            group.sort_unstable();
            groups.push(group);
        }

        Self { groups }
    }

    pub fn groups(&self) -> &[Vec<usize>] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Pick the record whose name becomes canonical
///
/// The first member with a UniProt primary identifier wins, otherwise the first member.
pub fn base_record(records: &[Node], group: &[usize]) -> Option<usize> {
    group
        .iter()
        .copied()
        .find(|&position| records[position].primary_id_type == IdType::UniprotId)
        .or_else(|| group.first().copied())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NodeMergeStats {
    pub records_read: usize,
    pub nodes_written: usize,
    pub records_absorbed: usize,
}

/// Result of deduplicating a record list
#[derive(Debug, Clone)]
pub struct NodeMerge {
    pub nodes: Vec<Node>,
    /// For each input record, the position of its merged node
    pub assignment: Vec<usize>,
    /// Every member name and identifier value mapped to its canonical name
    pub name_mapping: HashMap<String, String>,
    pub stats: NodeMergeStats,
}

/// Deduplicate records into canonical nodes
pub fn merge_nodes(records: &[Node]) -> NodeMerge {
    let partition = Partition::of(records);
    let mut nodes = Vec::with_capacity(partition.len());
    let mut assignment = vec![0; records.len()];
    let mut name_mapping = HashMap::new();

    for group in partition.groups() {
        let Some(base_position) = base_record(records, group) else {
            continue;
        };
        let merged_position = nodes.len();
        let mut merged = records[base_position].clone();

        for &position in group {
            assignment[position] = merged_position;
            if position != base_position {
                merged.absorb(&records[position]);
            }
        }

        if group.len() > 1 {
            debug!(
                canonical = %merged.name,
                members = group.len(),
                "Merged duplicate node records"
            );
        }

        for &position in group {
            for key in records[position].lookup_keys() {
                name_mapping.insert(key.to_string(), merged.name.clone());
            }
        }
        nodes.push(merged);
    }

    let stats = NodeMergeStats {
        records_read: records.len(),
        nodes_written: nodes.len(),
        records_absorbed: records.len() - nodes.len(),
    };
    info!(
        records = stats.records_read,
        nodes = stats.nodes_written,
        absorbed = stats.records_absorbed,
        "Node merge complete"
    );

    NodeMerge {
        nodes,
        assignment,
        name_mapping,
        stats,
    }
}
