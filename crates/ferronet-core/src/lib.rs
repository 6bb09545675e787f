//! Ferronet Core
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Entity resolution and graph merging for molecular interaction networks.
//! Everything here is synchronous and in-memory; reading and writing source
//! databases is the ingest crate's job.
//!
//! # Pieces
//!
//! - [`list_union`]: pipe-delimited set attributes and their union
//! - [`classifier`]: identifier namespace heuristics
//! - [`alias`]: per-run alias table for Greek-letter and case variants
//! - [`index`]: identity index and the endpoint resolver chain
//! - [`merger`]: union-find node deduplication
//! - [`edges`]: directed / undirected edge reconciliation
//! - [`layers`]: breadth-first distance layers around a core set
//! - [`network`]: merge of whole source networks
//!
//! # Example
//!
//! ```
//! use ferronet_core::alias::AliasMap;
//! use ferronet_core::index::NoGeneLookup;
//! use ferronet_core::models::{direction_tags, Edge, Identifier, Node, SourceNetwork};
//! use ferronet_core::network::NetworkMerger;
//! use ferronet_common::types::{IdType, NodeType};
//!
//! let mut kegg = SourceNetwork::new("kegg");
//! kegg.nodes.push(
//!     Node::new("P36969", IdType::UniprotId, NodeType::Protein)
//!         .with_identifier(Identifier::new(IdType::KeggId, "hsa:2879")),
//! );
//! kegg.nodes.push(Node::new("Q16236", IdType::UniprotId, NodeType::Protein));
//! kegg.edges.push(
//!     Edge::new("Q16236", "hsa:2879", "0").with_interaction_types(&direction_tags(true, true)),
//! );
//!
//! let merged = NetworkMerger::new(AliasMap::with_unicode_gene_symbols(), NoGeneLookup)
//!     .merge(&[kegg]);
//! assert_eq!(merged.edges[0].target, "P36969");
//! ```

pub mod alias;
pub mod classifier;
pub mod edges;
pub mod index;
pub mod layers;
pub mod list_union;
pub mod merger;
pub mod models;
pub mod network;

pub use alias::AliasMap;
pub use classifier::IdentifierClassifier;
pub use index::{GeneLookup, IdentityIndex, NoGeneLookup, Resolver};
pub use layers::{ExpansionPolicy, Layers};
pub use models::{Disease, DiseaseLink, Edge, ExperimentModel, Identifier, Node, SourceNetwork};
pub use network::{MergedNetwork, NetworkMerger};
