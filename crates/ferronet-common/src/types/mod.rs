//! Vocabularies shared by every source adapter and the merge engine

use crate::error::FerronetError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

// ============================================================================
// Identifier Types
// ============================================================================

/// Namespace an identifier value belongs to
///
/// Ordering follows declaration order, which keeps identifier listings stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdType {
    UniprotId,
    KeggId,
    PubchemId,
    GeneName,
    EnsemblId,
    MirbaseId,
    Inchikey,
    HgncId,
    ExternalId,
    Unresolved,
}

impl IdType {
    pub const ALL: [IdType; 10] = [
        IdType::UniprotId,
        IdType::KeggId,
        IdType::PubchemId,
        IdType::GeneName,
        IdType::EnsemblId,
        IdType::MirbaseId,
        IdType::Inchikey,
        IdType::HgncId,
        IdType::ExternalId,
        IdType::Unresolved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IdType::UniprotId => "uniprot_id",
            IdType::KeggId => "kegg_id",
            IdType::PubchemId => "pubchem_id",
            IdType::GeneName => "gene_name",
            IdType::EnsemblId => "ensembl_id",
            IdType::MirbaseId => "mirbase_id",
            IdType::Inchikey => "inchikey",
            IdType::HgncId => "hgnc_id",
            IdType::ExternalId => "external_id",
            IdType::Unresolved => "unresolved",
        }
    }

    /// Parse spellings found in older source databases as well as the canonical ones
    ///
    /// Unknown labels map to `Unresolved` instead of failing so that a single odd
    /// row never aborts a load.
    pub fn from_legacy(label: &str) -> Self {
        if let Ok(id_type) = label.parse() {
            return id_type;
        }
        match label.trim().to_lowercase().as_str() {
            "uniprot" | "uniprot_ac" | "uniprotkb" => IdType::UniprotId,
            "kegg" | "kegg_compound" => IdType::KeggId,
            "cid" | "pubchem" | "pubchem_cid" => IdType::PubchemId,
            "symbol" | "gene_symbol" | "name" => IdType::GeneName,
            "ensg_id" | "ensembl" | "ensembl_gene" => IdType::EnsemblId,
            "mirbase" | "mimat" => IdType::MirbaseId,
            "hgnc" => IdType::HgncId,
            "compound_name" | "external" => IdType::ExternalId,
            _ => IdType::Unresolved,
        }
    }
}

impl FromStr for IdType {
    type Err = FerronetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IdType::ALL
            .iter()
            .copied()
            .find(|id_type| id_type.as_str() == s)
            .ok_or_else(|| FerronetError::InvalidIdentifierType(s.to_string()))
    }
}

impl std::fmt::Display for IdType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Node Types
// ============================================================================

/// Molecular kind of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum NodeType {
    #[serde(rename = "protein")]
    Protein,
    #[serde(rename = "small_molecule")]
    SmallMolecule,
    #[serde(rename = "miRNA")]
    MiRna,
    #[serde(rename = "lncRNA")]
    LncRna,
    #[serde(rename = "mRNA")]
    MRna,
    #[serde(rename = "non_coding")]
    NonCoding,
    #[default]
    #[serde(rename = "unresolved")]
    Unresolved,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Protein => "protein",
            NodeType::SmallMolecule => "small_molecule",
            NodeType::MiRna => "miRNA",
            NodeType::LncRna => "lncRNA",
            NodeType::MRna => "mRNA",
            NodeType::NonCoding => "non_coding",
            NodeType::Unresolved => "unresolved",
        }
    }

    /// Accepts canonical labels plus `compound` and `nd` from older exports
    pub fn from_legacy(label: &str) -> Self {
        match label.trim() {
            "compound" | "nd" | "drug" => NodeType::SmallMolecule,
            "gene" => NodeType::Protein,
            other => other.parse().unwrap_or(NodeType::Unresolved),
        }
    }

    /// Map a free-text regulator description ("lncRNA", "microRNA", ...) to a node type
    pub fn from_regulator_description(description: &str) -> Self {
        let lowered = description.to_lowercase();
        if lowered.contains("lncrna") {
            NodeType::LncRna
        } else if lowered.contains("mirna") || lowered.contains("microrna") {
            NodeType::MiRna
        } else if lowered.contains("mrna") {
            NodeType::MRna
        } else {
            NodeType::Protein
        }
    }
}

impl FromStr for NodeType {
    type Err = FerronetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "protein" => Ok(NodeType::Protein),
            "small_molecule" => Ok(NodeType::SmallMolecule),
            "miRNA" => Ok(NodeType::MiRna),
            "lncRNA" => Ok(NodeType::LncRna),
            "mRNA" => Ok(NodeType::MRna),
            "non_coding" => Ok(NodeType::NonCoding),
            "unresolved" => Ok(NodeType::Unresolved),
            _ => Err(FerronetError::InvalidNodeType(s.to_string())),
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// NCBI taxonomy id for Homo sapiens
pub const HUMAN_TAX_ID: i64 = 9606;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_id_type_round_trips_through_label() {
        for id_type in IdType::ALL {
            assert_eq!(id_type.as_str().parse::<IdType>().unwrap(), id_type);
        }
        assert!("uniprot".parse::<IdType>().is_err());
    }

    #[test]
    fn test_id_type_legacy_labels() {
        assert_eq!(IdType::from_legacy("ensg_id"), IdType::EnsemblId);
        assert_eq!(IdType::from_legacy("cid"), IdType::PubchemId);
        assert_eq!(IdType::from_legacy("Symbol"), IdType::GeneName);
        assert_eq!(IdType::from_legacy("compound_name"), IdType::ExternalId);
        assert_eq!(IdType::from_legacy("something_else"), IdType::Unresolved);
    }

    #[test]
    fn test_node_type_legacy_and_regulators() {
        assert_eq!(NodeType::from_legacy("compound"), NodeType::SmallMolecule);
        assert_eq!(NodeType::from_legacy("nd"), NodeType::SmallMolecule);
        assert_eq!(NodeType::from_legacy("miRNA"), NodeType::MiRna);
        assert_eq!(NodeType::from_legacy("???"), NodeType::Unresolved);

        assert_eq!(NodeType::from_regulator_description("lncRNA"), NodeType::LncRna);
        assert_eq!(NodeType::from_regulator_description("microRNA"), NodeType::MiRna);
        assert_eq!(NodeType::from_regulator_description("mRNA"), NodeType::MRna);
        assert_eq!(NodeType::from_regulator_description("transcription factor"), NodeType::Protein);
    }

    #[test]
    fn test_node_type_serde_uses_labels() {
        let json = serde_json::to_string(&NodeType::MiRna).unwrap();
        assert_eq!(json, "\"miRNA\"");
        let parsed: IdType = serde_json::from_str("\"kegg_id\"").unwrap();
        assert_eq!(parsed, IdType::KeggId);
    }
}
