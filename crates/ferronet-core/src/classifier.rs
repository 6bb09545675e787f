//! Identifier classification
//!
//! Guesses which namespace a bare identifier string belongs to. The rules are
//! heuristics: a six-character gene symbol starting with `P` classifies as a
//! UniProt accession, for instance. Callers use the result to pick an
//! `id_type` label, never as proof that the identifier exists.

use ferronet_common::types::IdType;
use ferronet_common::{FerronetError, Result};
use regex::Regex;

/// Swiss-Prot style accession, e.g. `P12345`, `Q9Y2X3`, `A0A024`
const SWISSPROT_PATTERN: &str = r"^([OPQ][0-9][A-Z0-9]{3}[0-9]|[A-NR-Z][0-9][A-Z][A-Z0-9]{2}[0-9])$";

/// Ten-character TrEMBL accession, e.g. `A0A024R161`
const TREMBL_PATTERN: &str = r"^[A-NR-Z][0-9][A-Z][A-Z0-9]{2}[0-9][A-Z][A-Z0-9]{2}[0-9]$";

const KEGG_PREFIXES: [&str; 5] = ["hsa:", "cpd:", "dr:", "gl:", "ko:"];

const INCHIKEY_LEN: usize = 27;

#[derive(Debug, Clone)]
pub struct IdentifierClassifier {
    swissprot: Regex,
    trembl: Regex,
}

impl IdentifierClassifier {
    pub fn new() -> Result<Self> {
        let compile =
            |pattern: &str| Regex::new(pattern).map_err(|e| FerronetError::Parse(e.to_string()));
        Ok(Self {
            swissprot: compile(SWISSPROT_PATTERN)?,
            trembl: compile(TREMBL_PATTERN)?,
        })
    }

    /// Classify a token, first matching rule wins:
    ///
    /// 1. UniProt accession (six characters starting with O/P/Q, or a
    ///    Swiss-Prot / TrEMBL pattern match)
    /// 2. `ENSG` prefix: Ensembl gene
    /// 3. `MIMAT` prefix: miRBase mature miRNA
    /// 4. 27 characters: InChIKey
    /// 5. KEGG (`hsa:`, `cpd:`, ...) or `HGNC:` prefixes
    /// 6. anything else: external id; blank input is unresolved
    pub fn classify(&self, token: &str) -> IdType {
        let token = token.trim();
        if token.is_empty() {
            return IdType::Unresolved;
        }

        let upper = token.to_uppercase();
        if self.is_uniprot_accession(&upper) {
            return IdType::UniprotId;
        }
        if upper.starts_with("ENSG") {
            return IdType::EnsemblId;
        }
        if upper.starts_with("MIMAT") {
            return IdType::MirbaseId;
        }
        if token.chars().count() == INCHIKEY_LEN {
            return IdType::Inchikey;
        }

        let lower = token.to_lowercase();
        if KEGG_PREFIXES.iter().any(|prefix| lower.starts_with(prefix)) {
            return IdType::KeggId;
        }
        if upper.starts_with("HGNC:") {
            return IdType::HgncId;
        }

        IdType::ExternalId
    }

    /// Expects an upper-cased, trimmed token
    fn is_uniprot_accession(&self, token: &str) -> bool {
        let six_with_opq = token.chars().count() == 6 && token.starts_with(['O', 'P', 'Q']);
        six_with_opq || self.swissprot.is_match(token) || self.trembl.is_match(token)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn classifier() -> IdentifierClassifier {
        IdentifierClassifier::new().unwrap()
    }

    #[test]
    fn test_uniprot_accessions() {
        let c = classifier();
        assert_eq!(c.classify("P12345"), IdType::UniprotId);
        assert_eq!(c.classify("Q9Y2X3"), IdType::UniprotId);
        assert_eq!(c.classify("A0A024"), IdType::UniprotId);
        assert_eq!(c.classify("A0A024R161"), IdType::UniprotId);
        assert_eq!(c.classify("p12345"), IdType::UniprotId);
    }

    #[test]
    fn test_six_character_symbol_starting_with_p_is_uniprot() {
        // Known ambiguity of the heuristic.
        assert_eq!(classifier().classify("PPARGC"), IdType::UniprotId);
    }

    #[test]
    fn test_short_form_counts_characters_not_bytes() {
        let c = classifier();
        // Six bytes, four characters.
        assert_eq!(c.classify("PÄÄa"), IdType::ExternalId);
        assert_eq!(c.classify("Pαβγδε"), IdType::UniprotId);
    }

    #[test]
    fn test_prefix_rules() {
        let c = classifier();
        assert_eq!(c.classify("ENSG00000167468"), IdType::EnsemblId);
        assert_eq!(c.classify("MIMAT0000062"), IdType::MirbaseId);
        assert_eq!(c.classify("hsa:2879"), IdType::KeggId);
        assert_eq!(c.classify("cpd:C00051"), IdType::KeggId);
        assert_eq!(c.classify("HGNC:4556"), IdType::HgncId);
    }

    #[test]
    fn test_inchikey_by_length() {
        assert_eq!(classifier().classify("RWSXRVCMGQZWBV-WDSKDSINSA-N"), IdType::Inchikey);
    }

    #[test]
    fn test_fallbacks() {
        let c = classifier();
        assert_eq!(c.classify("GPX4"), IdType::ExternalId);
        assert_eq!(c.classify("erastin"), IdType::ExternalId);
        assert_eq!(c.classify("   "), IdType::Unresolved);
    }
}
