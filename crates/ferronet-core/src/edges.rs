//! Edge reconciliation
//!
//! Raw edges name their endpoints with whatever token the source used. The
//! reconciler resolves both endpoints to canonical names, then deduplicates:
//! directed edges on `(source, target, layer)`, undirected edges on the same
//! key in either orientation. Duplicates have their set attributes unioned.

use crate::index::{GeneLookup, ResolutionStep, Resolver};
use crate::models::Edge;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct EdgeKey {
    source: String,
    target: String,
    layer: String,
}

impl EdgeKey {
    fn new(source: &str, target: &str, layer: &str) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
            layer: layer.to_string(),
        }
    }

    fn reversed(&self) -> Self {
        Self {
            source: self.target.clone(),
            target: self.source.clone(),
            layer: self.layer.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EdgeStats {
    pub edges_read: usize,
    pub unresolved: usize,
    pub merged: usize,
    pub resolved_by_alias: usize,
    pub resolved_by_lookup: usize,
}

/// Why an edge was not added
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeRejection {
    UnresolvedSource(String),
    UnresolvedTarget(String),
}

pub struct EdgeReconciler<'a, L: GeneLookup> {
    resolver: Resolver<'a, L>,
    directed: HashMap<EdgeKey, usize>,
    undirected: HashMap<EdgeKey, usize>,
    edges: Vec<Edge>,
    stats: EdgeStats,
}

impl<'a, L: GeneLookup> EdgeReconciler<'a, L> {
    pub fn new(resolver: Resolver<'a, L>) -> Self {
        Self {
            resolver,
            directed: HashMap::new(),
            undirected: HashMap::new(),
            edges: Vec::new(),
            stats: EdgeStats::default(),
        }
    }

    fn canonical_endpoint(&mut self, token: &str) -> Option<String> {
        let (id, step) = self.resolver.resolve_with_step(token)?;
        match step {
            ResolutionStep::Alias => self.stats.resolved_by_alias += 1,
            ResolutionStep::GeneLookup => self.stats.resolved_by_lookup += 1,
            ResolutionStep::CanonicalName | ResolutionStep::IdentifierValue => {},
        }
        self.resolver.index().name(id).map(str::to_string)
    }

    /// Add a raw edge and return the position of the reconciled edge it landed in
    pub fn add(&mut self, raw: &Edge) -> Result<usize, EdgeRejection> {
        self.stats.edges_read += 1;

        let Some(source) = self.canonical_endpoint(&raw.source) else {
            self.stats.unresolved += 1;
            debug!(source = %raw.source, target = %raw.target, layer = %raw.layer, "Skipping edge: source unresolved");
            return Err(EdgeRejection::UnresolvedSource(raw.source.clone()));
        };
        let Some(target) = self.canonical_endpoint(&raw.target) else {
            self.stats.unresolved += 1;
            debug!(source = %raw.source, target = %raw.target, layer = %raw.layer, "Skipping edge: target unresolved");
            return Err(EdgeRejection::UnresolvedTarget(raw.target.clone()));
        };

        let key = EdgeKey::new(&source, &target, &raw.layer);
        let existing = if raw.is_directed() {
            self.directed.get(&key).copied()
        } else {
            self.undirected
                .get(&key)
                .or_else(|| self.undirected.get(&key.reversed()))
                .copied()
        };

        if let Some(position) = existing {
            self.edges[position].absorb(raw);
            self.stats.merged += 1;
            return Ok(position);
        }

        let position = self.edges.len();
        let mut edge = raw.clone();
        edge.source = source;
        edge.target = target;
        self.edges.push(edge);
        if raw.is_directed() {
            self.directed.insert(key, position);
        } else {
            self.undirected.insert(key, position);
        }
        Ok(position)
    }

    pub fn stats(&self) -> &EdgeStats {
        &self.stats
    }

    /// Reconciled edges with explicit direction tags
    pub fn finish(self) -> (Vec<Edge>, EdgeStats) {
        let mut edges = self.edges;
        for edge in &mut edges {
            edge.fill_direction_defaults();
        }

        if self.stats.unresolved > 0 {
            warn!(
                skipped = self.stats.unresolved,
                read = self.stats.edges_read,
                "Edges skipped: endpoint could not be resolved"
            );
        }
        info!(
            read = self.stats.edges_read,
            unique = edges.len(),
            merged = self.stats.merged,
            skipped = self.stats.unresolved,
            "Edge reconciliation complete"
        );
        (edges, self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias::AliasMap;
    use crate::index::{IdentityIndex, NoGeneLookup};
    use crate::models::{direction_tags, Identifier, Node};
    use ferronet_common::types::{IdType, NodeType};

    fn index() -> IdentityIndex {
        IdentityIndex::build(&[
            Node::new("A", IdType::UniprotId, NodeType::Protein)
                .with_identifier(Identifier::new(IdType::GeneName, "geneA")),
            Node::new("B", IdType::UniprotId, NodeType::Protein),
        ])
    }

    #[test]
    fn test_undirected_reverse_merges() {
        let index = index();
        let aliases = AliasMap::new();
        let mut reconciler = EdgeReconciler::new(Resolver::new(&index, &aliases, NoGeneLookup));

        let first = Edge::new("A", "B", "1")
            .with_interaction_types(&direction_tags(false, false))
            .with_source_db("OmniPath");
        let second = Edge::new("B", "geneA", "1")
            .with_interaction_types("is_directed:false|binding")
            .with_source_db("STRING");

        assert_eq!(reconciler.add(&first), Ok(0));
        assert_eq!(reconciler.add(&second), Ok(0));

        let (edges, stats) = reconciler.finish();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].source, "A");
        assert_eq!(edges[0].source_db, "OmniPath|STRING");
        assert!(edges[0].interaction_types.contains("binding"));
        assert_eq!(stats.merged, 1);
    }

    #[test]
    fn test_directed_reverse_stays_separate() {
        let index = index();
        let aliases = AliasMap::new();
        let mut reconciler = EdgeReconciler::new(Resolver::new(&index, &aliases, NoGeneLookup));
        let tags = direction_tags(true, true);

        assert_eq!(reconciler.add(&Edge::new("A", "B", "0").with_interaction_types(&tags)), Ok(0));
        assert_eq!(reconciler.add(&Edge::new("B", "A", "0").with_interaction_types(&tags)), Ok(1));
        assert_eq!(reconciler.finish().0.len(), 2);
    }

    #[test]
    fn test_layer_is_part_of_the_key() {
        let index = index();
        let aliases = AliasMap::new();
        let mut reconciler = EdgeReconciler::new(Resolver::new(&index, &aliases, NoGeneLookup));

        reconciler.add(&Edge::new("A", "B", "0")).ok();
        reconciler.add(&Edge::new("A", "B", "1")).ok();
        assert_eq!(reconciler.finish().0.len(), 2);
    }

    #[test]
    fn test_unresolved_endpoint_is_counted() {
        let index = index();
        let aliases = AliasMap::new();
        let mut reconciler = EdgeReconciler::new(Resolver::new(&index, &aliases, NoGeneLookup));

        assert_eq!(
            reconciler.add(&Edge::new("A", "XYZ", "0")),
            Err(EdgeRejection::UnresolvedTarget("XYZ".to_string()))
        );
        let (edges, stats) = reconciler.finish();
        assert!(edges.is_empty());
        assert_eq!(stats.unresolved, 1);
        assert_eq!(stats.edges_read, 1);
    }

    #[test]
    fn test_missing_direction_defaults_to_undirected() {
        let index = index();
        let aliases = AliasMap::new();
        let mut reconciler = EdgeReconciler::new(Resolver::new(&index, &aliases, NoGeneLookup));
        reconciler.add(&Edge::new("A", "B", "2").with_interaction_types("binding")).ok();
        let (edges, _) = reconciler.finish();
        assert_eq!(
            edges[0].interaction_types,
            "binding|is_direct:false|is_directed:false"
        );
    }
}
