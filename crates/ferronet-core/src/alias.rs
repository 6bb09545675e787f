//! Alias table for non-canonical tokens
//!
//! Pathway strings spell genes with Greek letters (`NF-κB`, `GSK-3β`) and in
//! arbitrary case. The alias map rewrites such tokens to a name the identity
//! index knows. It lives for one run and is never persisted.

use std::collections::HashMap;

/// Greek-letter gene symbol variants seen in curated pathway text
const UNICODE_GENE_SYMBOLS: [(&str, &str); 10] = [
    ("GSK-3β", "GSK3B"),
    ("GSK3β", "GSK3B"),
    ("HIF-1α", "HIF1A"),
    ("HIF1α", "HIF1A"),
    ("Ikβ-α", "NFKBIA"),
    ("NF-κB", "NFKB1"),
    ("NFκB", "NFKB1"),
    ("PPARα", "PPARA"),
    ("TGF-β2", "TGFB2"),
    ("β-catenin", "CTNNB1"),
];

#[derive(Debug, Clone, Default)]
pub struct AliasMap {
    exact: HashMap<String, String>,
    folded: HashMap<String, String>,
}

impl AliasMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map preloaded with the Greek-letter gene symbol table
    pub fn with_unicode_gene_symbols() -> Self {
        let mut map = Self::new();
        for (alias, canonical) in UNICODE_GENE_SYMBOLS {
            map.insert(alias, canonical);
        }
        map
    }

    /// Register `alias`; an existing mapping for the same alias is kept
    pub fn insert(&mut self, alias: impl Into<String>, canonical: impl Into<String>) {
        let alias = alias.into();
        let canonical = canonical.into();
        let alias = alias.trim();
        if alias.is_empty() || alias == canonical {
            return;
        }
        self.folded
            .entry(alias.to_lowercase())
            .or_insert_with(|| canonical.clone());
        self.exact.entry(alias.to_string()).or_insert(canonical);
    }

    /// Register every lower-cased spelling of `canonical` as an alias of itself
    pub fn insert_case_folded(&mut self, canonical: &str) {
        self.folded
            .entry(canonical.trim().to_lowercase())
            .or_insert_with(|| canonical.trim().to_string());
    }

    /// Exact match first, then case-insensitive
    pub fn get(&self, token: &str) -> Option<&str> {
        let token = token.trim();
        self.exact
            .get(token)
            .or_else(|| self.folded.get(&token.to_lowercase()))
            .map(String::as_str)
    }

    /// Rewrite a token through the map, returning it unchanged when unknown
    pub fn canonicalize<'a>(&'a self, token: &'a str) -> &'a str {
        self.get(token).unwrap_or(token)
    }

    pub fn len(&self) -> usize {
        self.folded.len().max(self.exact.len())
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.folded.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unicode_symbols() {
        let map = AliasMap::with_unicode_gene_symbols();
        assert_eq!(map.get("NF-κB"), Some("NFKB1"));
        assert_eq!(map.get("β-catenin"), Some("CTNNB1"));
        assert_eq!(map.get("HIF-1α "), Some("HIF1A"));
        assert_eq!(map.canonicalize("GPX4"), "GPX4");
    }

    #[test]
    fn test_case_folded_lookup() {
        let mut map = AliasMap::new();
        map.insert_case_folded("Erastin");
        map.insert("RSL3", "rsl3-compound");
        assert_eq!(map.get("ERASTIN"), Some("Erastin"));
        assert_eq!(map.get("rsl3"), Some("rsl3-compound"));
    }

    #[test]
    fn test_first_mapping_wins() {
        let mut map = AliasMap::new();
        map.insert("p53", "TP53");
        map.insert("p53", "TP53BP1");
        assert_eq!(map.get("p53"), Some("TP53"));
    }
}
