//! Row shapes of the network schema
//!
//! Columns are optional on read so that databases written by older exports
//! (NULLs instead of empty strings, missing display names) still load.

use ferronet_common::types::{IdType, NodeType};
use ferronet_core::models::{Disease, Edge, Identifier, Node};

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct NodeRow {
    pub id: i64,
    pub name: String,
    pub primary_id_type: Option<String>,
    pub display_name: Option<String>,
    pub tax_id: Option<i64>,
    #[sqlx(rename = "type")]
    pub node_type: Option<String>,
    pub pathways: Option<String>,
    pub role_in_ferroptosis: Option<String>,
    pub function: Option<String>,
    pub source_db: Option<String>,
}

impl NodeRow {
    pub fn into_node(self, identifiers: Vec<IdentifierRow>) -> Node {
        let mut node = Node::new(
            self.name,
            IdType::from_legacy(self.primary_id_type.as_deref().unwrap_or_default()),
            NodeType::from_legacy(self.node_type.as_deref().unwrap_or_default()),
        );
        node.display_name = self.display_name.filter(|name| !name.trim().is_empty());
        node.tax_id = self.tax_id;
        node = node
            .with_pathways(self.pathways.as_deref().unwrap_or_default())
            .with_role(self.role_in_ferroptosis.as_deref().unwrap_or_default())
            .with_function(self.function.as_deref().unwrap_or_default())
            .with_source_db(self.source_db.as_deref().unwrap_or_default());

        for row in identifiers {
            node.add_identifier(Identifier {
                id_type: IdType::from_legacy(&row.id_type),
                value: row.id_value,
                is_primary: row.is_primary.unwrap_or(false),
            });
        }
        node
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct IdentifierRow {
    pub node_id: i64,
    pub id_type: String,
    pub id_value: String,
    pub is_primary: Option<bool>,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct EdgeRow {
    pub id: i64,
    pub interactor_a_node_name: String,
    pub interactor_b_node_name: String,
    pub layer: Option<String>,
    pub interaction_types: Option<String>,
    pub effect_on_ferroptosis: Option<String>,
    pub source_db: Option<String>,
}

impl From<EdgeRow> for Edge {
    fn from(row: EdgeRow) -> Self {
        Edge::new(
            row.interactor_a_node_name,
            row.interactor_b_node_name,
            row.layer.unwrap_or_default(),
        )
        .with_interaction_types(row.interaction_types.as_deref().unwrap_or_default())
        .with_effect(row.effect_on_ferroptosis.as_deref().unwrap_or_default())
        .with_source_db(row.source_db.as_deref().unwrap_or_default())
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct DiseaseRow {
    pub disease_id: String,
    pub disease_name: Option<String>,
    pub description: Option<String>,
}

impl From<DiseaseRow> for Disease {
    fn from(row: DiseaseRow) -> Self {
        Disease {
            disease_id: row.disease_id,
            disease_name: row.disease_name.unwrap_or_default(),
            description: row.description.unwrap_or_default(),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct DiseaseEdgeRow {
    pub disease_id: String,
    pub edge_id: i64,
    pub reference: Option<String>,
    pub source_db: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ExperimentRow {
    pub edge_id: i64,
    pub cellline: Option<String>,
    pub in_vivo: Option<String>,
    pub reference: Option<String>,
}
