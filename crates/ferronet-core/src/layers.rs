//! Distance layers around a core node set
//!
//! Layer 0 is the core set itself; layer k holds the nodes first reached after
//! k hops of breadth-first expansion over an interaction list. All sets are
//! ordered, so results do not depend on input order.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

pub const DEFAULT_MAX_HOPS: usize = 2;

/// Which interactions count as adjacency during expansion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpansionPolicy {
    /// Either endpoint reaches the other
    #[default]
    Undirected,
    /// Only regulators of already-layered nodes (source -> layered target)
    Upstream,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Layers {
    layers: Vec<BTreeSet<String>>,
    #[serde(skip)]
    depth: BTreeMap<String, usize>,
}

impl Layers {
    /// Breadth-first layering of `interactions` (pairs of node names) around `core`
    pub fn classify<'a, I>(
        core: &BTreeSet<String>,
        interactions: I,
        max_hops: usize,
        policy: ExpansionPolicy,
    ) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut adjacency: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for (source, target) in interactions {
            if source == target {
                continue;
            }
            // Keyed by the node that is already layered when the neighbour is discovered.
            adjacency.entry(target).or_default().insert(source);
            if policy == ExpansionPolicy::Undirected {
                adjacency.entry(source).or_default().insert(target);
            }
        }

        let mut depth: BTreeMap<String, usize> =
            core.iter().map(|name| (name.clone(), 0)).collect();
        let mut layers = vec![core.clone()];

        for hop in 1..=max_hops {
            let Some(frontier) = layers.last() else {
                break;
            };
            let mut next = BTreeSet::new();
            for name in frontier {
                let Some(neighbours) = adjacency.get(name.as_str()) else {
                    continue;
                };
                for neighbour in neighbours {
                    if !depth.contains_key(*neighbour) {
                        next.insert(neighbour.to_string());
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            for name in &next {
                depth.insert(name.clone(), hop);
            }
            layers.push(next);
        }

        let result = Self { layers, depth };
        info!(
            core = core.len(),
            layered = result.depth.len(),
            sizes = ?result.sizes(),
            "Layer classification complete"
        );
        result
    }

    /// Nodes first reached in `hop` hops; `None` past the last non-empty layer
    pub fn layer(&self, hop: usize) -> Option<&BTreeSet<String>> {
        self.layers.get(hop)
    }

    pub fn core(&self) -> &BTreeSet<String> {
        &self.layers[0]
    }

    pub fn depth_of(&self, name: &str) -> Option<usize> {
        self.depth.get(name).copied()
    }

    pub fn sizes(&self) -> Vec<usize> {
        self.layers.iter().map(BTreeSet::len).collect()
    }

    /// Number of layers including the core
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.depth.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &BTreeSet<String>)> {
        self.layers.iter().enumerate()
    }

    /// Layer label for an edge between two layered nodes
    ///
    /// Core-core edges are layer 0. Edges between adjacent layers take the
    /// outer layer; edges within a non-core layer k are labelled k + 1. Edges
    /// spanning more than one layer, touching unlayered nodes, or landing past
    /// `max_hops` get no label.
    pub fn edge_layer(&self, a: &str, b: &str, max_hops: usize) -> Option<usize> {
        let depth_a = self.depth_of(a)?;
        let depth_b = self.depth_of(b)?;
        let label = match (depth_a.min(depth_b), depth_a.max(depth_b)) {
            (0, 0) => 0,
            (low, high) if high == low + 1 => high,
            (low, high) if low == high => low + 1,
            _ => return None,
        };
        (label <= max_hops).then_some(label)
    }
}
