//! HTTP clients for the external reference services

pub mod mygene;
pub mod uniprot;

pub use mygene::{GeneHit, GeneHits, MyGeneClient, PrefetchedLookup};
pub use uniprot::{IdMappingClient, JobState, MappingRequest, MappingResults, PollOutcome};
