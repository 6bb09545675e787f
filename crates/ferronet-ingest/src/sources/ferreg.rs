//! FerReg target / regulator / drug / disease database
//!
//! Every row of the hub join names up to three entities (target, regulator,
//! drug), one disease and the regulation between them. Entities are keyed by
//! FerReg's internal ids inside a row and by their chosen primary identifier
//! in the network.

use crate::error::{IngestError, Result};
use crate::sources::{text_column, SourceBuilder};
use crate::storage::{open_read_only, table_exists};
use ferronet_common::types::{IdType, NodeType, HUMAN_TAX_ID};
use ferronet_core::classifier::IdentifierClassifier;
use ferronet_core::models::{
    direction_tags, Disease, DiseaseLink, Edge, ExperimentModel, Identifier, Node, SourceNetwork,
};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

pub const SOURCE_DB: &str = "FerReg";
pub const LAYER: &str = "ferreg";
pub const EXPERIMENT_REFERENCE: &str = "FerReg";

/// Placeholder target FerReg uses for "no target"
const NO_TARGET: &str = "TAR99999";

const REQUIRED_TABLES: [&str; 6] = [
    "target_regulator_drug_disease_pair",
    "general_target",
    "general_regulator",
    "general_drug",
    "general_disease",
    "regulation_information",
];

const HUB_QUERY: &str = r#"
    SELECT
        hub.unique_id,
        hub.target_id,
        hub.regulator_id,
        hub.drug_id,
        hub.disease_id,
        t.gene_name AS target_gene_name,
        t.uniprot_id AS target_uniprot,
        t.pathway AS target_pathway,
        t.function AS target_function,
        r.regulator_name,
        r.External_id AS regulator_external_id,
        r.Type AS regulator_type,
        r.Function AS regulator_function,
        d.drug_name,
        d.inchikey,
        dis.Disease_name AS disease_name,
        dis."Disease ICD" AS disease_icd,
        reg.Regulation AS regulation,
        reg.drug2ferroptosis,
        reg.drug2regulator,
        reg.drug2target,
        reg."regulator to target gene" AS regulator2target,
        reg.regulator2ferroptosis,
        reg.target_role4ferroptosis,
        reg."Vivo model" AS vivo_model,
        reg.ReferenceID AS reference_id,
        reg."Cell Line" AS cell_line
    FROM target_regulator_drug_disease_pair hub
    LEFT JOIN general_target t ON hub.target_id = t.target_id
    LEFT JOIN general_regulator r ON hub.regulator_id = r.regulator_id
    LEFT JOIN general_drug d ON hub.drug_id = d.drug_id
    LEFT JOIN general_disease dis ON hub.disease_id = dis.disease_id
    LEFT JOIN regulation_information reg ON hub.unique_id = reg.unique_id
    WHERE hub.target_id != ?1
    ORDER BY hub.unique_id
"#;

/// Markers FerReg uses for "no value"
const EMPTY_MARKERS: [&str; 6] = ["", ".", "na", "null", "none", "undefined"];

/// ICD values that mean "no code"; the disease name is used as id instead
const NO_ICD: [&str; 4] = ["ICD-11: N.A.", "N.A.", "NA", ""];

/// `None` for blank values and FerReg's empty markers
pub fn clean_value(value: Option<&str>) -> Option<String> {
    let value = value?.trim();
    if EMPTY_MARKERS.contains(&value.to_lowercase().as_str()) {
        None
    } else {
        Some(value.to_string())
    }
}

/// One row of the hub join, with values already cleaned
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FerregRow {
    pub unique_id: Option<String>,
    pub target_id: Option<String>,
    pub regulator_id: Option<String>,
    pub drug_id: Option<String>,
    pub disease_id: Option<String>,
    pub target_gene_name: Option<String>,
    pub target_uniprot: Option<String>,
    pub target_pathway: Option<String>,
    pub target_function: Option<String>,
    pub target_role: Option<String>,
    pub regulator_name: Option<String>,
    pub regulator_external_id: Option<String>,
    pub regulator_type: Option<String>,
    pub regulator_function: Option<String>,
    pub regulator_role: Option<String>,
    pub drug_name: Option<String>,
    pub inchikey: Option<String>,
    pub drug_role: Option<String>,
    pub disease_name: Option<String>,
    pub disease_icd: Option<String>,
    pub regulation: Option<String>,
    pub regulator_to_target: Option<String>,
    pub drug_to_target: Option<String>,
    pub drug_to_regulator: Option<String>,
    pub vivo_model: Option<String>,
    pub reference_id: Option<String>,
    pub cell_line: Option<String>,
}

impl FerregRow {
    fn from_row(row: &SqliteRow) -> Self {
        let get = |column: &str| clean_value(text_column(row, column).as_deref());
        Self {
            unique_id: get("unique_id"),
            target_id: get("target_id"),
            regulator_id: get("regulator_id"),
            drug_id: get("drug_id"),
            disease_id: get("disease_id"),
            target_gene_name: get("target_gene_name"),
            target_uniprot: get("target_uniprot"),
            target_pathway: get("target_pathway"),
            target_function: get("target_function"),
            target_role: get("target_role4ferroptosis"),
            regulator_name: get("regulator_name"),
            regulator_external_id: get("regulator_external_id"),
            regulator_type: get("regulator_type"),
            regulator_function: get("regulator_function"),
            regulator_role: get("regulator2ferroptosis"),
            drug_name: get("drug_name"),
            inchikey: get("inchikey"),
            drug_role: get("drug2ferroptosis"),
            disease_name: get("disease_name"),
            disease_icd: get("disease_icd"),
            regulation: get("regulation"),
            regulator_to_target: get("regulator2target"),
            drug_to_target: get("drug2target"),
            drug_to_regulator: get("drug2regulator"),
            vivo_model: get("vivo_model"),
            reference_id: get("reference_id"),
            cell_line: get("cell_line"),
        }
    }

    /// Disease id: the ICD code unless it is a "not available" marker, else the name
    pub fn disease_key(&self) -> Option<String> {
        match self.disease_icd.as_deref() {
            Some(icd) if !NO_ICD.contains(&icd) => Some(icd.to_string()),
            _ => self.disease_name.clone(),
        }
    }
}

/// The three entity roles of a hub row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Target,
    Regulator,
    Drug,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Target => "target",
            Role::Regulator => "regulator",
            Role::Drug => "drug",
        }
    }

    fn internal_id(self, row: &FerregRow) -> Option<&str> {
        match self {
            Role::Target => row.target_id.as_deref(),
            Role::Regulator => row.regulator_id.as_deref(),
            Role::Drug => row.drug_id.as_deref(),
        }
    }
}

/// Edge columns of a hub row and the roles they connect
const EDGE_COLUMNS: [(Role, Role); 3] = [
    (Role::Regulator, Role::Target),
    (Role::Drug, Role::Target),
    (Role::Drug, Role::Regulator),
];

fn edge_value(row: &FerregRow, from: Role, to: Role) -> Option<&str> {
    match (from, to) {
        (Role::Regulator, Role::Target) => row.regulator_to_target.as_deref(),
        (Role::Drug, Role::Target) => row.drug_to_target.as_deref(),
        (Role::Drug, Role::Regulator) => row.drug_to_regulator.as_deref(),
        _ => None,
    }
}

/// Builds FerReg nodes from hub rows
pub struct FerregNodes {
    classifier: IdentifierClassifier,
}

impl FerregNodes {
    pub fn new() -> Result<Self> {
        Ok(Self {
            classifier: IdentifierClassifier::new()?,
        })
    }

    /// Id type of a regulator's external id
    ///
    /// FerReg's external ids are UniProt accessions, Ensembl genes, miRBase
    /// accessions or free-form ids; KEGG/InChIKey guesses do not apply here.
    fn regulator_id_type(&self, external_id: &str) -> IdType {
        match self.classifier.classify(external_id) {
            id_type @ (IdType::UniprotId | IdType::EnsemblId | IdType::MirbaseId) => id_type,
            _ => IdType::ExternalId,
        }
    }

    pub fn node(&self, role: Role, row: &FerregRow) -> Option<Node> {
        match role {
            Role::Target => {
                let (name, id_type) = match (&row.target_uniprot, &row.target_gene_name) {
                    (Some(uniprot), _) => (uniprot, IdType::UniprotId),
                    (None, Some(gene_name)) => (gene_name, IdType::GeneName),
                    (None, None) => return None,
                };
                let mut node = Node::new(name.clone(), id_type, NodeType::Protein)
                    .with_tax_id(HUMAN_TAX_ID)
                    .with_identifier(Identifier::primary(id_type, name.clone()))
                    .with_pathways(row.target_pathway.as_deref().unwrap_or_default())
                    .with_role(row.target_role.as_deref().unwrap_or_default())
                    .with_function(row.target_function.as_deref().unwrap_or_default());
                if let Some(gene_name) = &row.target_gene_name {
                    node = node
                        .with_display_name(gene_name.clone())
                        .with_identifier(Identifier::new(IdType::GeneName, gene_name.clone()));
                }
                Some(node.with_source_db(SOURCE_DB))
            },
            Role::Regulator => {
                let (name, id_type) = match (&row.regulator_external_id, &row.regulator_name) {
                    (Some(external), _) => (external, self.regulator_id_type(external)),
                    (None, Some(name)) => (name, IdType::GeneName),
                    (None, None) => return None,
                };
                let node_type = row
                    .regulator_type
                    .as_deref()
                    .map(NodeType::from_regulator_description)
                    .unwrap_or(NodeType::Protein);
                let mut node = Node::new(name.clone(), id_type, node_type)
                    .with_tax_id(HUMAN_TAX_ID)
                    .with_identifier(Identifier::primary(id_type, name.clone()))
                    .with_role(row.regulator_role.as_deref().unwrap_or_default())
                    .with_function(row.regulator_function.as_deref().unwrap_or_default());
                if let Some(regulator_name) = &row.regulator_name {
                    node = node
                        .with_display_name(regulator_name.clone())
                        .with_identifier(Identifier::new(IdType::GeneName, regulator_name.clone()));
                }
                Some(node.with_source_db(SOURCE_DB))
            },
            Role::Drug => {
                let (name, id_type) = match (&row.inchikey, &row.drug_name) {
                    (Some(inchikey), _) => (inchikey, IdType::Inchikey),
                    (None, Some(drug_name)) => (drug_name, IdType::ExternalId),
                    (None, None) => return None,
                };
                let mut node = Node::new(name.clone(), id_type, NodeType::SmallMolecule)
                    .with_identifier(Identifier::primary(id_type, name.clone()))
                    .with_role(row.drug_role.as_deref().unwrap_or_default());
                if let Some(drug_name) = &row.drug_name {
                    node = node
                        .with_display_name(drug_name.clone())
                        .with_identifier(Identifier::new(IdType::ExternalId, drug_name.clone()));
                }
                Some(node.with_source_db(SOURCE_DB))
            },
        }
    }
}

/// Read the hub join of a FerReg database
pub async fn read_rows(path: &Path) -> Result<Vec<FerregRow>> {
    let pool = open_read_only(path).await?;
    for table in REQUIRED_TABLES {
        if !table_exists(&pool, table).await? {
            pool.close().await;
            return Err(IngestError::MissingTable {
                path: path.to_path_buf(),
                table: table.to_string(),
            });
        }
    }

    let rows = sqlx::query(HUB_QUERY).bind(NO_TARGET).fetch_all(&pool).await?;
    pool.close().await;

    info!(path = %path.display(), rows = rows.len(), "Read FerReg hub rows");
    Ok(rows.iter().map(FerregRow::from_row).collect())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FerregStats {
    pub rows: usize,
    pub rows_without_edges: usize,
    pub dangling_edges: usize,
}

/// Build the FerReg source network
pub fn build_network(rows: &[FerregRow], nodes: &FerregNodes) -> (SourceNetwork, FerregStats) {
    let mut builder = SourceBuilder::new("ferreg");
    let mut stats = FerregStats {
        rows: rows.len(),
        ..FerregStats::default()
    };
    // (role, internal id) → network node name
    let mut names: HashMap<(Role, String), String> = HashMap::new();

    for row in rows {
        for role in [Role::Regulator, Role::Drug, Role::Target] {
            let Some(internal_id) = role.internal_id(row) else {
                continue;
            };
            if let Some(name) = nodes
                .node(role, row)
                .and_then(|node| builder.add_node(node).map(str::to_string))
            {
                names.entry((role, internal_id.to_string())).or_insert(name);
            }
        }

        let mut row_edges = Vec::new();
        for (from, to) in EDGE_COLUMNS {
            let Some(value) = edge_value(row, from, to) else {
                continue;
            };
            let endpoint = |role: Role| {
                role.internal_id(row)
                    .and_then(|internal_id| names.get(&(role, internal_id.to_string())))
                    .cloned()
            };
            let (Some(source), Some(target)) = (endpoint(from), endpoint(to)) else {
                stats.dangling_edges += 1;
                debug!(unique_id = ?row.unique_id, from = from.as_str(), to = to.as_str(), "FerReg edge without endpoint node");
                continue;
            };

            let tags = format!("{}|{}", direction_tags(true, false), value);
            row_edges.push(builder.add_edge(
                Edge::new(source, target, LAYER)
                    .with_interaction_types(&tags)
                    .with_source_db(SOURCE_DB),
            ));
        }

        if row_edges.is_empty() {
            stats.rows_without_edges += 1;
            continue;
        }

        if let (Some(_), Some(disease_id)) = (&row.disease_id, row.disease_key()) {
            builder.add_disease(Disease {
                disease_id: disease_id.clone(),
                disease_name: row.disease_name.clone().unwrap_or_default(),
                description: row.regulation.clone().unwrap_or_default(),
            });
            for &edge in &row_edges {
                builder.link_disease(DiseaseLink {
                    disease_id: disease_id.clone(),
                    edge,
                    reference: row.reference_id.clone().unwrap_or_default(),
                    source_db: SOURCE_DB.to_string(),
                });
            }
        }

        if row.cell_line.is_some() || row.vivo_model.is_some() {
            for &edge in &row_edges {
                builder.add_experiment(ExperimentModel {
                    edge,
                    cellline: row.cell_line.clone().unwrap_or_default(),
                    in_vivo: row.vivo_model.clone().unwrap_or_default(),
                    reference: EXPERIMENT_REFERENCE.to_string(),
                });
            }
        }
    }

    info!(
        rows = stats.rows,
        nodes = builder.node_count(),
        edges = builder.edge_count(),
        rows_without_edges = stats.rows_without_edges,
        dangling_edges = stats.dangling_edges,
        "Built FerReg network"
    );
    (builder.finish(), stats)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn some(value: &str) -> Option<String> {
        Some(value.to_string())
    }

    fn hub_row() -> FerregRow {
        FerregRow {
            unique_id: some("FR0001"),
            target_id: some("TAR00001"),
            regulator_id: some("REG00001"),
            drug_id: some("DRUG0001"),
            disease_id: some("DIS0001"),
            target_gene_name: some("GPX4"),
            target_uniprot: some("P36969"),
            target_role: some("suppressor"),
            regulator_name: some("MIR-15A"),
            regulator_external_id: some("MIMAT0000068"),
            regulator_type: some("microRNA"),
            drug_name: some("Erastin"),
            inchikey: some("BKQFRNYHFIQEKN-UHFFFAOYSA-N"),
            disease_name: some("Hepatocellular carcinoma"),
            disease_icd: some("ICD-11: N.A."),
            regulation: some("miR-15a suppresses GPX4"),
            regulator_to_target: some("Suppress"),
            drug_to_target: some("Inhibit"),
            reference_id: some("PMID:31341071"),
            cell_line: some("HepG2"),
            ..FerregRow::default()
        }
    }

    #[test]
    fn test_clean_value_markers() {
        assert_eq!(clean_value(Some(" NA ")), None);
        assert_eq!(clean_value(Some("Undefined")), None);
        assert_eq!(clean_value(Some(".")), None);
        assert_eq!(clean_value(None), None);
        assert_eq!(clean_value(Some(" GPX4 ")), Some("GPX4".to_string()));
    }

    #[test]
    fn test_disease_key_falls_back_to_name() {
        let mut row = hub_row();
        assert_eq!(row.disease_key().as_deref(), Some("Hepatocellular carcinoma"));
        row.disease_icd = some("2C12.02");
        assert_eq!(row.disease_key().as_deref(), Some("2C12.02"));
    }

    #[test]
    fn test_hub_row_becomes_nodes_edges_and_evidence() {
        let nodes = FerregNodes::new().unwrap();
        let (network, stats) = build_network(&[hub_row(), hub_row()], &nodes);

        assert_eq!(network.nodes.len(), 3);
        let regulator = network.nodes.iter().find(|node| node.name == "MIMAT0000068").unwrap();
        assert_eq!(regulator.primary_id_type, IdType::MirbaseId);
        assert_eq!(regulator.node_type, NodeType::MiRna);
        assert_eq!(regulator.label(), "MIR-15A");

        let drug = network.nodes.iter().find(|node| node.node_type == NodeType::SmallMolecule).unwrap();
        assert_eq!(drug.primary_id_type, IdType::Inchikey);
        assert_eq!(drug.tax_id, None);

        assert_eq!(network.edges.len(), 2);
        assert_eq!(network.edges[0].source, "MIMAT0000068");
        assert_eq!(network.edges[0].target, "P36969");
        assert_eq!(
            network.edges[0].interaction_types,
            "Suppress|is_direct:false|is_directed:true"
        );

        assert_eq!(network.diseases.len(), 1);
        assert_eq!(network.diseases[0].disease_id, "Hepatocellular carcinoma");
        assert_eq!(network.disease_links.len(), 2);
        assert_eq!(network.experiments.len(), 2);
        assert_eq!(stats.dangling_edges, 0);
    }
}
