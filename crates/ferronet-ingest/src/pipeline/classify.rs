//! Identifier classification for ad-hoc tokens

use crate::error::Result;
use ferronet_common::types::IdType;
use ferronet_core::classifier::IdentifierClassifier;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub token: String,
    pub id_type: IdType,
}

pub fn run(tokens: &[String]) -> Result<Vec<Classification>> {
    let classifier = IdentifierClassifier::new()?;
    Ok(tokens
        .iter()
        .map(|token| Classification {
            token: token.clone(),
            id_type: classifier.classify(token),
        })
        .collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_classifies_each_token() {
        let tokens: Vec<String> = ["P36969", "ENSG00000167468", "MIMAT0000062", "GPX4"]
            .iter()
            .map(|token| token.to_string())
            .collect();

        let types: Vec<IdType> = run(&tokens).unwrap().into_iter().map(|c| c.id_type).collect();
        assert_eq!(
            types,
            vec![IdType::UniprotId, IdType::EnsemblId, IdType::MirbaseId, IdType::ExternalId]
        );
    }
}
