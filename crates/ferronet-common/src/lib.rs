//! Ferronet Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, utilities, and error handling for the ferronet workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`FerronetError`] and the crate [`Result`] alias
//! - **Logging**: subscriber setup shared by every binary
//! - **Checksums**: input file digests recorded in run reports
//! - **Types**: identifier and node vocabularies used by every source
//!
//! # Example
//!
//! ```no_run
//! use ferronet_common::checksum::compute_file_checksum;
//! use ferronet_common::types::IdType;
//!
//! fn describe(path: &str) -> ferronet_common::Result<()> {
//!     let digest = compute_file_checksum(path)?;
//!     let id_type: IdType = "uniprot_id".parse()?;
//!     tracing::info!(%digest, %id_type, "input registered");
//!     Ok(())
//! }
//! ```

pub mod checksum;
pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{FerronetError, Result};
