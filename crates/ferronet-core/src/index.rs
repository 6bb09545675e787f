//! Identity index and token resolution
//!
//! The index maps canonical names and identifier values to node ids of one
//! graph. It is built explicitly by whoever owns the graph and handed to the
//! [`Resolver`], which applies the fallback chain used for edge endpoints.

use crate::alias::AliasMap;
use crate::list_union;
use crate::models::Node;
use ferronet_common::types::IdType;
use std::collections::{BTreeSet, HashMap};

/// Position of a node in the graph's node list
pub type NodeId = usize;

#[derive(Debug, Clone, Default)]
pub struct IdentityIndex {
    names: Vec<String>,
    by_name: HashMap<String, NodeId>,
    by_value: HashMap<String, BTreeSet<NodeId>>,
    by_typed_value: HashMap<(IdType, String), NodeId>,
}

impl IdentityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(nodes: &[Node]) -> Self {
        let mut index = Self::new();
        for node in nodes {
            index.insert(node);
        }
        index
    }

    /// Add a node and return its id
    pub fn insert(&mut self, node: &Node) -> NodeId {
        let id = self.names.len();
        self.names.push(node.name.clone());
        self.by_name.entry(node.name.clone()).or_insert(id);

        for identifier in node.identifiers() {
            if list_union::is_absent(&identifier.value) {
                continue;
            }
            self.by_value
                .entry(identifier.value.clone())
                .or_default()
                .insert(id);
            self.by_typed_value
                .entry((identifier.id_type, identifier.value.clone()))
                .or_insert(id);
        }
        id
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Canonical name of a node
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    pub fn by_name(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(name).copied()
    }

    /// Lowest node id carrying `value` under any identifier type
    pub fn by_identifier_value(&self, value: &str) -> Option<NodeId> {
        self.by_value.get(value).and_then(|ids| ids.first().copied())
    }

    /// First node carrying `value` as an identifier of exactly `id_type`
    pub fn by_identifier(&self, id_type: IdType, value: &str) -> Option<NodeId> {
        self.by_typed_value
            .get(&(id_type, value.to_string()))
            .copied()
    }

    /// Name match, then identifier match
    pub fn lookup(&self, token: &str) -> Option<NodeId> {
        self.by_name(token)
            .or_else(|| self.by_identifier_value(token))
    }
}

/// Last-resort symbol lookup against an external gene database
pub trait GeneLookup {
    /// UniProt accession for a gene symbol, if known
    fn uniprot_for_symbol(&self, symbol: &str) -> Option<String>;
}

/// Lookup that never finds anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGeneLookup;

impl GeneLookup for NoGeneLookup {
    fn uniprot_for_symbol(&self, _symbol: &str) -> Option<String> {
        None
    }
}

impl<T: GeneLookup + ?Sized> GeneLookup for &T {
    fn uniprot_for_symbol(&self, symbol: &str) -> Option<String> {
        (**self).uniprot_for_symbol(symbol)
    }
}

impl GeneLookup for HashMap<String, String> {
    fn uniprot_for_symbol(&self, symbol: &str) -> Option<String> {
        self.get(symbol)
            .or_else(|| self.get(&symbol.to_uppercase()))
            .cloned()
    }
}

/// Which step of the fallback chain produced a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionStep {
    CanonicalName,
    IdentifierValue,
    Alias,
    GeneLookup,
}

/// Resolves raw tokens to node ids
pub struct Resolver<'a, L: GeneLookup> {
    index: &'a IdentityIndex,
    aliases: &'a AliasMap,
    lookup: L,
}

impl<'a, L: GeneLookup> Resolver<'a, L> {
    pub fn new(index: &'a IdentityIndex, aliases: &'a AliasMap, lookup: L) -> Self {
        Self {
            index,
            aliases,
            lookup,
        }
    }

    pub fn index(&self) -> &IdentityIndex {
        self.index
    }

    pub fn resolve(&self, token: &str) -> Option<NodeId> {
        self.resolve_with_step(token).map(|(id, _)| id)
    }

    /// Canonical name, identifier value, alias map, then gene lookup
    ///
    /// An accession from the gene lookup prefers the node holding it as a UniProt id.
    pub fn resolve_with_step(&self, token: &str) -> Option<(NodeId, ResolutionStep)> {
        let token = token.trim();
        if list_union::is_absent(token) {
            return None;
        }

        if let Some(id) = self.index.by_name(token) {
            return Some((id, ResolutionStep::CanonicalName));
        }
        if let Some(id) = self.index.by_identifier_value(token) {
            return Some((id, ResolutionStep::IdentifierValue));
        }
        if let Some(id) = self
            .aliases
            .get(token)
            .and_then(|alias| self.index.lookup(alias))
        {
            return Some((id, ResolutionStep::Alias));
        }
        let accession = self.lookup.uniprot_for_symbol(self.aliases.canonicalize(token))?;
        self.index
            .by_identifier(IdType::UniprotId, &accession)
            .or_else(|| self.index.lookup(&accession))
            .map(|id| (id, ResolutionStep::GeneLookup))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::models::Identifier;
    use ferronet_common::types::NodeType;

    fn nodes() -> Vec<Node> {
        vec![
            Node::new("P36969", IdType::UniprotId, NodeType::Protein)
                .with_identifier(Identifier::primary(IdType::UniprotId, "P36969"))
                .with_identifier(Identifier::new(IdType::KeggId, "hsa:2879")),
            Node::new("Q16236", IdType::UniprotId, NodeType::Protein)
                .with_identifier(Identifier::new(IdType::GeneName, "NFE2L2")),
            Node::new("P19838", IdType::UniprotId, NodeType::Protein)
                .with_identifier(Identifier::new(IdType::GeneName, "NFKB1")),
        ]
    }

    #[test]
    fn test_chain_order() {
        let index = IdentityIndex::build(&nodes());
        let aliases = AliasMap::with_unicode_gene_symbols();
        let mut external = HashMap::new();
        external.insert("GPX4".to_string(), "P36969".to_string());
        let resolver = Resolver::new(&index, &aliases, external);

        assert_eq!(
            resolver.resolve_with_step("P36969"),
            Some((0, ResolutionStep::CanonicalName))
        );
        assert_eq!(
            resolver.resolve_with_step("hsa:2879"),
            Some((0, ResolutionStep::IdentifierValue))
        );
        assert_eq!(
            resolver.resolve_with_step("NF-κB"),
            Some((2, ResolutionStep::Alias))
        );
        assert_eq!(
            resolver.resolve_with_step("GPX4"),
            Some((0, ResolutionStep::GeneLookup))
        );
        assert_eq!(resolver.resolve("XYZ"), None);
        assert_eq!(resolver.resolve("-"), None);
    }

    #[test]
    fn test_lowest_id_wins_for_shared_value() {
        let shared = vec![
            Node::new("a", IdType::ExternalId, NodeType::Unresolved)
                .with_identifier(Identifier::new(IdType::GeneName, "X")),
            Node::new("b", IdType::ExternalId, NodeType::Unresolved)
                .with_identifier(Identifier::new(IdType::ExternalId, "X")),
        ];
        let index = IdentityIndex::build(&shared);
        assert_eq!(index.by_identifier_value("X"), Some(0));
        assert_eq!(index.by_identifier(IdType::ExternalId, "X"), Some(1));
        assert_eq!(index.name(1), Some("b"));
    }

    #[test]
    fn test_gene_lookup_prefers_uniprot_typed_identifier() {
        let shared = vec![
            Node::new("ext-1", IdType::ExternalId, NodeType::Unresolved)
                .with_identifier(Identifier::new(IdType::ExternalId, "Q9X000")),
            Node::new("SLC7A11", IdType::GeneName, NodeType::Protein)
                .with_identifier(Identifier::new(IdType::UniprotId, "Q9X000")),
        ];
        let index = IdentityIndex::build(&shared);
        let aliases = AliasMap::new();
        let mut external = HashMap::new();
        external.insert("XCT".to_string(), "Q9X000".to_string());
        let resolver = Resolver::new(&index, &aliases, external);

        assert_eq!(resolver.resolve("Q9X000"), Some(0));
        assert_eq!(
            resolver.resolve_with_step("XCT"),
            Some((1, ResolutionStep::GeneLookup))
        );
    }

    #[test]
    fn test_resolution_is_stable_across_calls() {
        let index = IdentityIndex::build(&nodes());
        let aliases = AliasMap::new();
        let resolver = Resolver::new(&index, &aliases, NoGeneLookup);
        let first = resolver.resolve("NFE2L2");
        assert_eq!(first, Some(1));
        assert_eq!(resolver.resolve("NFE2L2"), first);
    }
}
