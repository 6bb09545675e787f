//! Graph records shared by the source adapters, the merge engine and storage

use crate::list_union::{self, TagSet};
use ferronet_common::types::{IdType, NodeType};
use serde::{Deserialize, Serialize};

pub const DIRECTED_TAG: &str = "is_directed:true";
pub const UNDIRECTED_TAG: &str = "is_directed:false";
pub const DIRECT_TAG_PREFIX: &str = "is_direct:";
pub const DIRECTED_TAG_PREFIX: &str = "is_directed:";

// ============================================================================
// Nodes
// ============================================================================

/// One identifier attached to a node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    pub id_type: IdType,
    pub value: String,
    pub is_primary: bool,
}

impl Identifier {
    pub fn new(id_type: IdType, value: impl Into<String>) -> Self {
        Self {
            id_type,
            value: value.into(),
            is_primary: false,
        }
    }

    pub fn primary(id_type: IdType, value: impl Into<String>) -> Self {
        Self {
            is_primary: true,
            ..Self::new(id_type, value)
        }
    }
}

/// A molecular entity, either as read from one source or after merging
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Canonical name, unique within a merged graph
    pub name: String,
    pub primary_id_type: IdType,
    pub display_name: Option<String>,
    pub node_type: NodeType,
    pub tax_id: Option<i64>,
    identifiers: Vec<Identifier>,
    pub pathways: String,
    pub role_in_ferroptosis: String,
    pub function: String,
    pub source_db: String,
}

impl Node {
    pub fn new(name: impl Into<String>, primary_id_type: IdType, node_type: NodeType) -> Self {
        Self {
            name: name.into(),
            primary_id_type,
            display_name: None,
            node_type,
            tax_id: None,
            identifiers: Vec::new(),
            pathways: String::new(),
            role_in_ferroptosis: String::new(),
            function: String::new(),
            source_db: String::new(),
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        let display_name = display_name.into();
        if !list_union::is_absent(&display_name) {
            self.display_name = Some(display_name);
        }
        self
    }

    pub fn with_tax_id(mut self, tax_id: i64) -> Self {
        self.tax_id = Some(tax_id);
        self
    }

    pub fn with_source_db(mut self, source_db: &str) -> Self {
        self.source_db = list_union::merge_strings(&self.source_db, source_db);
        self
    }

    pub fn with_pathways(mut self, pathways: &str) -> Self {
        self.pathways = list_union::merge_strings(&self.pathways, pathways);
        self
    }

    pub fn with_role(mut self, role: &str) -> Self {
        self.role_in_ferroptosis = list_union::merge_strings(&self.role_in_ferroptosis, role);
        self
    }

    pub fn with_function(mut self, function: &str) -> Self {
        self.function = list_union::merge_strings(&self.function, function);
        self
    }

    pub fn with_identifier(mut self, identifier: Identifier) -> Self {
        self.add_identifier(identifier);
        self
    }

    /// Display name, falling back to the canonical name
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    pub fn identifiers(&self) -> &[Identifier] {
        &self.identifiers
    }

    /// Add an identifier, keeping (type, value) pairs unique and at most one
    /// primary per type. A second primary for a type is stored as non-primary.
    /// Returns false when nothing was added.
    pub fn add_identifier(&mut self, identifier: Identifier) -> bool {
        let value = identifier.value.trim();
        if list_union::is_absent(value) {
            return false;
        }

        let has_primary = self
            .identifiers
            .iter()
            .any(|existing| existing.id_type == identifier.id_type && existing.is_primary);

        if let Some(existing) = self
            .identifiers
            .iter_mut()
            .find(|existing| existing.id_type == identifier.id_type && existing.value == value)
        {
            if identifier.is_primary && !has_primary {
                existing.is_primary = true;
            }
            return false;
        }

        self.identifiers.push(Identifier {
            id_type: identifier.id_type,
            value: value.to_string(),
            is_primary: identifier.is_primary && !has_primary,
        });
        self.identifiers.sort_by(|a, b| {
            (a.id_type, !a.is_primary, &a.value).cmp(&(b.id_type, !b.is_primary, &b.value))
        });
        true
    }

    /// First identifier of a type, primary preferred
    pub fn identifier(&self, id_type: IdType) -> Option<&str> {
        self.identifiers
            .iter()
            .find(|identifier| identifier.id_type == id_type)
            .map(|identifier| identifier.value.as_str())
    }

    /// Every string this node can be looked up by: its name plus all identifier values
    pub fn lookup_keys(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str())
            .chain(self.identifiers.iter().map(|identifier| identifier.value.as_str()))
            .filter(|key| !list_union::is_absent(key))
    }

    /// Union another record of the same entity into this one
    ///
    /// Scalar fields keep this node's values and only fill gaps from `other`.
    pub fn absorb(&mut self, other: &Node) {
        if self.display_name.is_none() {
            self.display_name = other.display_name.clone();
        }
        if self.tax_id.is_none() {
            self.tax_id = other.tax_id;
        }
        if self.node_type == NodeType::Unresolved {
            self.node_type = other.node_type;
        }
        for identifier in &other.identifiers {
            self.add_identifier(identifier.clone());
        }
        if other.name != self.name {
            let id_type = match other.primary_id_type {
                IdType::Unresolved => IdType::ExternalId,
                id_type => id_type,
            };
            self.add_identifier(Identifier::new(id_type, other.name.clone()));
        }
        self.pathways = list_union::merge_strings(&self.pathways, &other.pathways);
        self.role_in_ferroptosis =
            list_union::merge_strings(&self.role_in_ferroptosis, &other.role_in_ferroptosis);
        self.function = list_union::merge_strings(&self.function, &other.function);
        self.source_db = list_union::merge_strings(&self.source_db, &other.source_db);
    }
}

// ============================================================================
// Edges
// ============================================================================

/// A relation between two nodes
///
/// Before reconciliation the endpoints are raw tokens from a source; after it
/// they are canonical node names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub layer: String,
    pub interaction_types: String,
    pub effect_on_ferroptosis: String,
    pub source_db: String,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>, layer: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            layer: layer.into(),
            interaction_types: String::new(),
            effect_on_ferroptosis: String::new(),
            source_db: String::new(),
        }
    }

    pub fn with_interaction_types(mut self, interaction_types: &str) -> Self {
        self.interaction_types =
            list_union::merge_strings(&self.interaction_types, interaction_types);
        self
    }

    pub fn with_effect(mut self, effect: &str) -> Self {
        self.effect_on_ferroptosis = list_union::merge_strings(&self.effect_on_ferroptosis, effect);
        self
    }

    pub fn with_source_db(mut self, source_db: &str) -> Self {
        self.source_db = list_union::merge_strings(&self.source_db, source_db);
        self
    }

    /// Directed iff the `is_directed:true` tag is present
    pub fn is_directed(&self) -> bool {
        list_union::tokens(&self.interaction_types).any(|tag| tag == DIRECTED_TAG)
    }

    /// Union the set attributes of a duplicate edge
    pub fn absorb(&mut self, other: &Edge) {
        self.interaction_types =
            list_union::merge_strings(&self.interaction_types, &other.interaction_types);
        self.effect_on_ferroptosis =
            list_union::merge_strings(&self.effect_on_ferroptosis, &other.effect_on_ferroptosis);
        self.source_db = list_union::merge_strings(&self.source_db, &other.source_db);
    }

    /// Add `is_directed:false` / `is_direct:false` when the tags are missing
    pub fn fill_direction_defaults(&mut self) {
        let mut tags = TagSet::parse(&self.interaction_types);
        if !tags.has_prefix(DIRECTED_TAG_PREFIX) {
            tags.insert(UNDIRECTED_TAG);
        }
        if !tags.has_prefix(DIRECT_TAG_PREFIX) {
            tags.insert(format!("{}false", DIRECT_TAG_PREFIX));
        }
        self.interaction_types = tags.to_string();
    }
}

/// Build the `is_directed:x|is_direct:y` prefix of an interaction type set
pub fn direction_tags(directed: bool, direct: bool) -> String {
    format!("{}{}|{}{}", DIRECTED_TAG_PREFIX, directed, DIRECT_TAG_PREFIX, direct)
}

// ============================================================================
// Diseases and experiments
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disease {
    /// ICD-11 code when known, otherwise the disease name
    pub disease_id: String,
    pub disease_name: String,
    pub description: String,
}

/// Links a disease to an edge of the same source network (by edge index)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiseaseLink {
    pub disease_id: String,
    pub edge: usize,
    pub reference: String,
    pub source_db: String,
}

/// Cell line / in vivo evidence for an edge of the same source network
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExperimentModel {
    pub edge: usize,
    pub cellline: String,
    pub in_vivo: String,
    pub reference: String,
}

/// Everything one source contributes to a merge
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceNetwork {
    /// Label used in logs ("kegg", "ferrdb", a file name, ...)
    pub label: String,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub diseases: Vec<Disease>,
    pub disease_links: Vec<DiseaseLink>,
    pub experiments: Vec<ExperimentModel>,
}

impl SourceNetwork {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_identifier_keeps_single_primary_per_type() {
        let mut node = Node::new("P36969", IdType::UniprotId, NodeType::Protein);
        assert!(node.add_identifier(Identifier::primary(IdType::UniprotId, "P36969")));
        assert!(node.add_identifier(Identifier::primary(IdType::UniprotId, "A0A024R161")));
        assert!(!node.add_identifier(Identifier::new(IdType::UniprotId, "P36969")));
        assert!(!node.add_identifier(Identifier::new(IdType::GeneName, "-")));

        let primaries: Vec<_> = node
            .identifiers()
            .iter()
            .filter(|identifier| identifier.is_primary)
            .collect();
        assert_eq!(primaries.len(), 1);
        assert_eq!(primaries[0].value, "P36969");
        assert_eq!(node.identifier(IdType::UniprotId), Some("P36969"));
    }

    #[test]
    fn test_absorb_unions_sets_and_fills_gaps() {
        let mut base = Node::new("P36969", IdType::UniprotId, NodeType::Protein)
            .with_source_db("KEGG")
            .with_pathways("hsa04216");
        let other = Node::new("GPX4", IdType::GeneName, NodeType::Protein)
            .with_display_name("GPX4")
            .with_tax_id(9606)
            .with_source_db("ferrdb|KEGG")
            .with_identifier(Identifier::primary(IdType::HgncId, "HGNC:4556"));

        base.absorb(&other);

        assert_eq!(base.name, "P36969");
        assert_eq!(base.label(), "GPX4");
        assert_eq!(base.tax_id, Some(9606));
        assert_eq!(base.source_db, "KEGG|ferrdb");
        assert_eq!(base.identifier(IdType::GeneName), Some("GPX4"));
        assert_eq!(base.identifier(IdType::HgncId), Some("HGNC:4556"));
    }

    #[test]
    fn test_edge_direction_tags() {
        let mut edge = Edge::new("A", "B", "0").with_interaction_types("activation");
        assert!(!edge.is_directed());
        edge.fill_direction_defaults();
        assert_eq!(edge.interaction_types, "activation|is_direct:false|is_directed:false");

        let directed = Edge::new("A", "B", "0").with_interaction_types(&direction_tags(true, true));
        assert!(directed.is_directed());
    }
}
