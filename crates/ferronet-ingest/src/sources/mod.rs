//! Source adapters
//!
//! Each adapter turns one upstream resource into a [`SourceNetwork`]. Nodes are
//! deduplicated by name on the way in, since a network database keeps node
//! names unique.

pub mod compounds;
pub mod ferrdb;
pub mod ferreg;
pub mod kegg;
pub mod omnipath;

use ferronet_core::list_union;
use ferronet_core::models::{Disease, DiseaseLink, Edge, ExperimentModel, Node, SourceNetwork};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Trimmed, non-empty text of a column
///
/// Integer and real values are rendered as text. Missing columns read as `None`;
/// a value that decodes as neither text nor a number is logged and read as `None`.
pub(crate) fn text_column(row: &SqliteRow, column: &str) -> Option<String> {
    let value = match row.try_get::<Option<String>, _>(column) {
        Ok(value) => value,
        Err(sqlx::Error::ColumnNotFound(_)) => None,
        Err(_) => numeric_column(row, column),
    };
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn numeric_column(row: &SqliteRow, column: &str) -> Option<String> {
    if let Ok(value) = row.try_get::<Option<i64>, _>(column) {
        return value.map(|value| value.to_string());
    }
    if let Ok(value) = row.try_get::<Option<f64>, _>(column) {
        return value.map(|value| value.to_string());
    }
    warn!(column, "Column value is neither text nor a number, ignoring it");
    None
}

/// Accumulates a source network, folding repeated node names together
#[derive(Debug)]
pub struct SourceBuilder {
    network: SourceNetwork,
    node_positions: HashMap<String, usize>,
    edge_positions: HashMap<[String; 6], usize>,
    disease_ids: HashSet<String>,
    disease_links: HashSet<(String, usize)>,
    experiments: HashSet<ExperimentModel>,
    nameless_nodes: usize,
}

impl SourceBuilder {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            network: SourceNetwork::new(label),
            node_positions: HashMap::new(),
            edge_positions: HashMap::new(),
            disease_ids: HashSet::new(),
            disease_links: HashSet::new(),
            experiments: HashSet::new(),
            nameless_nodes: 0,
        }
    }

    /// Add a node, absorbing it into an earlier node of the same name
    ///
    /// Nodes without a name are dropped and `None` is returned.
    pub fn add_node(&mut self, node: Node) -> Option<&str> {
        if list_union::is_absent(&node.name) {
            debug!(source = %self.network.label, "Dropping node without a name");
            self.nameless_nodes += 1;
            return None;
        }
        let position = match self.node_positions.get(&node.name) {
            Some(&position) => {
                self.network.nodes[position].absorb(&node);
                position
            },
            None => {
                let position = self.network.nodes.len();
                self.node_positions.insert(node.name.clone(), position);
                self.network.nodes.push(node);
                position
            },
        };
        Some(&self.network.nodes[position].name)
    }

    pub fn has_node(&self, name: &str) -> bool {
        self.node_positions.contains_key(name)
    }

    /// Returns the edge's index within this source; an identical edge is stored once
    pub fn add_edge(&mut self, edge: Edge) -> usize {
        let key = [
            edge.source.clone(),
            edge.target.clone(),
            edge.layer.clone(),
            edge.interaction_types.clone(),
            edge.effect_on_ferroptosis.clone(),
            edge.source_db.clone(),
        ];
        if let Some(&position) = self.edge_positions.get(&key) {
            return position;
        }
        let position = self.network.edges.len();
        self.edge_positions.insert(key, position);
        self.network.edges.push(edge);
        position
    }

    /// Diseases are kept once per id
    pub fn add_disease(&mut self, disease: Disease) {
        if self.disease_ids.insert(disease.disease_id.clone()) {
            self.network.diseases.push(disease);
        }
    }

    /// One link per (disease, edge); the first reference is kept
    pub fn link_disease(&mut self, link: DiseaseLink) {
        if self.disease_links.insert((link.disease_id.clone(), link.edge)) {
            self.network.disease_links.push(link);
        }
    }

    pub fn add_experiment(&mut self, experiment: ExperimentModel) {
        if self.experiments.insert(experiment.clone()) {
            self.network.experiments.push(experiment);
        }
    }

    pub fn node_count(&self) -> usize {
        self.network.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.network.edges.len()
    }

    pub fn finish(self) -> SourceNetwork {
        if self.nameless_nodes > 0 {
            warn!(source = %self.network.label, dropped = self.nameless_nodes, "Dropped nodes without a name");
        }
        self.network
    }
}
