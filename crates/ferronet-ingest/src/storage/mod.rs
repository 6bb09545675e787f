//! SQLite persistence for networks
//!
//! Every source adapter writes its network into a database with the schema in
//! `migrations/`, and the merge pipelines read those databases back. Writes go
//! through one transaction with explicit row ids (node and edge positions + 1),
//! so edge and auxiliary rows can be bound without read-backs.

mod rows;

use crate::error::{IngestError, Result};
use ferronet_core::models::{Disease, DiseaseLink, Edge, ExperimentModel, Node, SourceNetwork};
use ferronet_core::network::MergedNetwork;
use rows::{DiseaseEdgeRow, DiseaseRow, EdgeRow, ExperimentRow, IdentifierRow, NodeRow};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{QueryBuilder, Row, Sqlite, Transaction};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Rows per multi-row INSERT
pub const DEFAULT_INSERT_CHUNK_SIZE: usize = 500;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageStats {
    pub nodes_stored: usize,
    pub identifiers_stored: usize,
    pub edges_stored: usize,
    pub diseases_stored: usize,
    pub disease_edges_stored: usize,
    pub experiments_stored: usize,
}

/// Network rows to persist, borrowed from a merged or source network
pub struct NetworkRows<'a> {
    pub nodes: &'a [Node],
    pub edges: &'a [Edge],
    pub diseases: &'a [Disease],
    pub disease_links: &'a [DiseaseLink],
    pub experiments: &'a [ExperimentModel],
}

impl<'a> From<&'a MergedNetwork> for NetworkRows<'a> {
    fn from(network: &'a MergedNetwork) -> Self {
        Self {
            nodes: &network.nodes,
            edges: &network.edges,
            diseases: &network.diseases,
            disease_links: &network.disease_links,
            experiments: &network.experiments,
        }
    }
}

impl<'a> From<&'a SourceNetwork> for NetworkRows<'a> {
    fn from(network: &'a SourceNetwork) -> Self {
        Self {
            nodes: &network.nodes,
            edges: &network.edges,
            diseases: &network.diseases,
            disease_links: &network.disease_links,
            experiments: &network.experiments,
        }
    }
}

pub struct NetworkStore {
    pool: SqlitePool,
    path: PathBuf,
    chunk_size: usize,
}

impl NetworkStore {
    /// Create a fresh database at `path`, replacing any existing file
    pub async fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        debug!(path = %path.display(), "Created network database");

        Ok(Self {
            pool,
            path,
            chunk_size: DEFAULT_INSERT_CHUNK_SIZE,
        })
    }

    /// Open an existing database read-only
    pub async fn open_existing(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let pool = open_read_only(&path).await?;

        Ok(Self {
            pool,
            path,
            chunk_size: DEFAULT_INSERT_CHUNK_SIZE,
        })
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub async fn close(self) {
        self.pool.close().await;
    }

    async fn table_exists(&self, table: &str) -> Result<bool> {
        table_exists(&self.pool, table).await
    }

    async fn require_table(&self, table: &str) -> Result<()> {
        if self.table_exists(table).await? {
            Ok(())
        } else {
            Err(IngestError::MissingTable {
                path: self.path.clone(),
                table: table.to_string(),
            })
        }
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Read the whole network; `node` and `edge` are required, the rest optional
    pub async fn load_network(&self, label: impl Into<String>) -> Result<SourceNetwork> {
        self.require_table("node").await?;
        self.require_table("edge").await?;

        let mut network = SourceNetwork::new(label);

        let node_rows = sqlx::query_as::<_, NodeRow>(
            r#"
            SELECT id, name, primary_id_type, display_name, tax_id, type,
                   pathways, role_in_ferroptosis, function, source_db
            FROM node
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut identifiers: HashMap<i64, Vec<IdentifierRow>> = HashMap::new();
        if self.table_exists("node_identifier").await? {
            let rows = sqlx::query_as::<_, IdentifierRow>(
                r#"
                SELECT node_id, id_type, id_value, is_primary
                FROM node_identifier
                ORDER BY node_id, id_type, id_value
                "#,
            )
            .fetch_all(&self.pool)
            .await?;
            for row in rows {
                identifiers.entry(row.node_id).or_default().push(row);
            }
        } else {
            warn!(path = %self.path.display(), "No node_identifier table; nodes load without identifiers");
        }

        network.nodes = node_rows
            .into_iter()
            .map(|row| {
                let ids = identifiers.remove(&row.id).unwrap_or_default();
                row.into_node(ids)
            })
            .collect();

        let edge_rows = sqlx::query_as::<_, EdgeRow>(
            r#"
            SELECT id, interactor_a_node_name, interactor_b_node_name, layer,
                   interaction_types, effect_on_ferroptosis, source_db
            FROM edge
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut edge_position: HashMap<i64, usize> = HashMap::with_capacity(edge_rows.len());
        for (position, row) in edge_rows.into_iter().enumerate() {
            edge_position.insert(row.id, position);
            network.edges.push(row.into());
        }

        if self.table_exists("disease").await? {
            network.diseases = sqlx::query_as::<_, DiseaseRow>(
                r#"
                SELECT disease_id, disease_name, description FROM disease ORDER BY id
                "#,
            )
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Disease::from)
            .collect();
        }

        if self.table_exists("disease_edge").await? {
            let rows = sqlx::query_as::<_, DiseaseEdgeRow>(
                r#"
                SELECT disease_id, edge_id, reference, source_db FROM disease_edge
                ORDER BY edge_id, disease_id
                "#,
            )
            .fetch_all(&self.pool)
            .await?;
            for row in rows {
                let Some(&edge) = edge_position.get(&row.edge_id) else {
                    warn!(edge_id = row.edge_id, "disease_edge row points at a missing edge");
                    continue;
                };
                network.disease_links.push(DiseaseLink {
                    disease_id: row.disease_id,
                    edge,
                    reference: row.reference.unwrap_or_default(),
                    source_db: row.source_db.unwrap_or_default(),
                });
            }
        }

        if self.table_exists("experiment_model").await? {
            let rows = sqlx::query_as::<_, ExperimentRow>(
                r#"
                SELECT edge_id, cellline, in_vivo, reference FROM experiment_model
                ORDER BY edge_id
                "#,
            )
            .fetch_all(&self.pool)
            .await?;
            for row in rows {
                let Some(&edge) = edge_position.get(&row.edge_id) else {
                    warn!(edge_id = row.edge_id, "experiment_model row points at a missing edge");
                    continue;
                };
                network.experiments.push(ExperimentModel {
                    edge,
                    cellline: row.cellline.unwrap_or_default(),
                    in_vivo: row.in_vivo.unwrap_or_default(),
                    reference: row.reference.unwrap_or_default(),
                });
            }
        }

        info!(
            source = %network.label,
            nodes = network.nodes.len(),
            edges = network.edges.len(),
            diseases = network.diseases.len(),
            experiments = network.experiments.len(),
            "Loaded network"
        );
        Ok(network)
    }

    // ========================================================================
    // Writing
    // ========================================================================

    /// Write a full network in one transaction
    ///
    /// Edges whose endpoints are not among `rows.nodes` are skipped with a warning.
    pub async fn write_network(&self, rows: NetworkRows<'_>) -> Result<StorageStats> {
        let mut tx = self.pool.begin().await?;
        let mut stats = StorageStats::default();

        let node_ids: HashMap<&str, i64> = rows
            .nodes
            .iter()
            .enumerate()
            .map(|(position, node)| (node.name.as_str(), row_id(position)))
            .collect();

        for chunk in indexed(rows.nodes).chunks(self.chunk_size) {
            self.insert_nodes(&mut tx, chunk).await?;
            stats.nodes_stored += chunk.len();
        }

        let identifiers: Vec<(i64, &ferronet_core::models::Identifier)> = rows
            .nodes
            .iter()
            .enumerate()
            .flat_map(|(position, node)| {
                node.identifiers()
                    .iter()
                    .map(move |identifier| (row_id(position), identifier))
            })
            .collect();
        for chunk in identifiers.chunks(self.chunk_size) {
            self.insert_identifiers(&mut tx, chunk).await?;
            stats.identifiers_stored += chunk.len();
        }

        let mut edge_ids: HashMap<usize, i64> = HashMap::with_capacity(rows.edges.len());
        let mut resolved_edges = Vec::with_capacity(rows.edges.len());
        for (position, edge) in rows.edges.iter().enumerate() {
            match (node_ids.get(edge.source.as_str()), node_ids.get(edge.target.as_str())) {
                (Some(&a), Some(&b)) => {
                    edge_ids.insert(position, row_id(position));
                    resolved_edges.push((row_id(position), a, b, edge));
                },
                _ => warn!(source = %edge.source, target = %edge.target, "Not storing edge with unknown endpoint"),
            }
        }
        for chunk in resolved_edges.chunks(self.chunk_size) {
            self.insert_edges(&mut tx, chunk).await?;
            stats.edges_stored += chunk.len();
        }

        for chunk in indexed(rows.diseases).chunks(self.chunk_size) {
            self.insert_diseases(&mut tx, chunk).await?;
            stats.diseases_stored += chunk.len();
        }

        let links: Vec<(i64, &DiseaseLink)> = rows
            .disease_links
            .iter()
            .filter_map(|link| edge_ids.get(&link.edge).map(|&id| (id, link)))
            .collect();
        for chunk in links.chunks(self.chunk_size) {
            self.insert_disease_edges(&mut tx, chunk).await?;
            stats.disease_edges_stored += chunk.len();
        }

        let experiments: Vec<(i64, &ExperimentModel)> = rows
            .experiments
            .iter()
            .filter_map(|experiment| edge_ids.get(&experiment.edge).map(|&id| (id, experiment)))
            .collect();
        for chunk in experiments.chunks(self.chunk_size) {
            self.insert_experiments(&mut tx, chunk).await?;
            stats.experiments_stored += chunk.len();
        }

        tx.commit().await?;
        info!(path = %self.path.display(), ?stats, "Network written");
        Ok(stats)
    }

    async fn insert_nodes(&self, tx: &mut Transaction<'_, Sqlite>, nodes: &[(i64, &Node)]) -> Result<()> {
        let mut query_builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            r#"
            INSERT INTO node (
                id, name, primary_id_type, display_name, tax_id, type,
                pathways, role_in_ferroptosis, function, source_db
            )
            "#,
        );
        query_builder.push_values(nodes, |mut b, (id, node)| {
            b.push_bind(*id)
                .push_bind(node.name.as_str())
                .push_bind(node.primary_id_type.as_str())
                .push_bind(node.display_name.as_deref())
                .push_bind(node.tax_id)
                .push_bind(node.node_type.as_str())
                .push_bind(node.pathways.as_str())
                .push_bind(node.role_in_ferroptosis.as_str())
                .push_bind(node.function.as_str())
                .push_bind(node.source_db.as_str());
        });
        query_builder.build().execute(&mut **tx).await?;
        Ok(())
    }

    async fn insert_identifiers(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        identifiers: &[(i64, &ferronet_core::models::Identifier)],
    ) -> Result<()> {
        let mut query_builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            r#"
            INSERT INTO node_identifier (node_id, id_type, id_value, is_primary)
            "#,
        );
        query_builder.push_values(identifiers, |mut b, (node_id, identifier)| {
            b.push_bind(*node_id)
                .push_bind(identifier.id_type.as_str())
                .push_bind(identifier.value.as_str())
                .push_bind(identifier.is_primary);
        });
        query_builder.build().execute(&mut **tx).await?;
        Ok(())
    }

    async fn insert_edges(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        edges: &[(i64, i64, i64, &Edge)],
    ) -> Result<()> {
        let mut query_builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            r#"
            INSERT INTO edge (
                id, interactor_a_node_id, interactor_b_node_id,
                interactor_a_node_name, interactor_b_node_name,
                layer, interaction_types, effect_on_ferroptosis, source_db
            )
            "#,
        );
        query_builder.push_values(edges, |mut b, (id, node_a, node_b, edge)| {
            b.push_bind(*id)
                .push_bind(*node_a)
                .push_bind(*node_b)
                .push_bind(edge.source.as_str())
                .push_bind(edge.target.as_str())
                .push_bind(edge.layer.as_str())
                .push_bind(edge.interaction_types.as_str())
                .push_bind(edge.effect_on_ferroptosis.as_str())
                .push_bind(edge.source_db.as_str());
        });
        query_builder.build().execute(&mut **tx).await?;
        Ok(())
    }

    async fn insert_diseases(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        diseases: &[(i64, &Disease)],
    ) -> Result<()> {
        let mut query_builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            r#"
            INSERT INTO disease (id, disease_id, disease_name, description)
            "#,
        );
        query_builder.push_values(diseases, |mut b, (id, disease)| {
            b.push_bind(*id)
                .push_bind(disease.disease_id.as_str())
                .push_bind(disease.disease_name.as_str())
                .push_bind(disease.description.as_str());
        });
        query_builder.push(" ON CONFLICT (disease_id) DO NOTHING");
        query_builder.build().execute(&mut **tx).await?;
        Ok(())
    }

    async fn insert_disease_edges(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        links: &[(i64, &DiseaseLink)],
    ) -> Result<()> {
        let mut query_builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            r#"
            INSERT INTO disease_edge (disease_id, edge_id, reference, source_db)
            "#,
        );
        query_builder.push_values(links, |mut b, (edge_id, link)| {
            b.push_bind(link.disease_id.as_str())
                .push_bind(*edge_id)
                .push_bind(link.reference.as_str())
                .push_bind(link.source_db.as_str());
        });
        query_builder.push(" ON CONFLICT (disease_id, edge_id) DO NOTHING");
        query_builder.build().execute(&mut **tx).await?;
        Ok(())
    }

    async fn insert_experiments(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        experiments: &[(i64, &ExperimentModel)],
    ) -> Result<()> {
        let mut query_builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            r#"
            INSERT INTO experiment_model (edge_id, cellline, in_vivo, reference)
            "#,
        );
        query_builder.push_values(experiments, |mut b, (edge_id, experiment)| {
            b.push_bind(*edge_id)
                .push_bind(experiment.cellline.as_str())
                .push_bind(experiment.in_vivo.as_str())
                .push_bind(experiment.reference.as_str());
        });
        query_builder.build().execute(&mut **tx).await?;
        Ok(())
    }
}

/// Open any SQLite file read-only; a missing file is a fatal input error
pub(crate) async fn open_read_only(path: &Path) -> Result<SqlitePool> {
    if !path.is_file() {
        return Err(IngestError::MissingInput(path.to_path_buf()));
    }

    let options = SqliteConnectOptions::new().filename(path).read_only(true);
    Ok(SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?)
}

pub(crate) async fn table_exists(pool: &SqlitePool, table: &str) -> Result<bool> {
    let row = sqlx::query(
        r#"
        SELECT COUNT(*) AS count FROM sqlite_master WHERE type = 'table' AND name = ?1
        "#,
    )
    .bind(table)
    .fetch_one(pool)
    .await?;

    let count: i64 = row.get("count");
    Ok(count > 0)
}

fn row_id(position: usize) -> i64 {
    position as i64 + 1
}

fn indexed<T>(items: &[T]) -> Vec<(i64, &T)> {
    items
        .iter()
        .enumerate()
        .map(|(position, item)| (row_id(position), item))
        .collect()
}

/// Write `rows` to `output` atomically: a `.partial` sibling is written first and
/// renamed into place only after the transaction commits.
pub async fn write_atomically(output: &Path, rows: NetworkRows<'_>) -> Result<StorageStats> {
    let mut partial = output.as_os_str().to_owned();
    partial.push(".partial");
    let partial = PathBuf::from(partial);

    let store = NetworkStore::create(&partial).await?;
    let result = store.write_network(rows).await;
    store.close().await;

    match result {
        Ok(stats) => {
            std::fs::rename(&partial, output)?;
            Ok(stats)
        },
        Err(err) => {
            if let Err(cleanup) = std::fs::remove_file(&partial) {
                warn!(path = %partial.display(), error = %cleanup, "Failed to remove partial output");
            }
            Err(err)
        },
    }
}
