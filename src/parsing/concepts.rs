//! Concept mapping: US-GAAP/DEI taxonomy names → standardized labels.
//!
//! The taxonomy ships inside the binary (`concept_mappings.json` embedded at
//! build time) so the runtime has no filesystem dependency; changing a mapping
//! requires a rebuild but no code change. Lookup tables are built once at
//! first use and are immutable thereafter.

use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::HashMap;

use crate::error::{EdgarError, Result};

static MAPPINGS_JSON: &str = include_str!("concept_mappings.json");

static MAPPER: Lazy<ConceptMapper> = Lazy::new(|| {
    ConceptMapper::load(MAPPINGS_JSON).expect("embedded concept_mappings.json must parse")
});

/// The on-disk shape of `concept_mappings.json`; schema/version header
/// fields are ignored.
#[derive(Debug, Deserialize)]
struct ConceptMappingFile {
    mappings: HashMap<String, ConceptDefinition>,
}

/// A standardized concept and the XBRL tags that report it.
#[derive(Debug, Clone, Deserialize)]
pub struct ConceptDefinition {
    pub concepts: Vec<String>,
    #[serde(default)]
    pub notes: String,
    /// Drives required-field validation in the snapshot projector
    #[serde(default)]
    pub required: bool,
}

/// Lookup tables over the embedded taxonomy.
pub struct ConceptMapper {
    /// standardized label → definition
    mappings: HashMap<String, ConceptDefinition>,
    /// lowercased XBRL concept → standardized label
    reverse: HashMap<String, String>,
}

impl ConceptMapper {
    fn load(json: &str) -> Result<Self> {
        let file: ConceptMappingFile = serde_json::from_str(json)?;

        let mut reverse = HashMap::new();
        for (label, def) in &file.mappings {
            for concept in &def.concepts {
                reverse.insert(concept.to_lowercase(), label.clone());
            }
        }

        Ok(ConceptMapper {
            mappings: file.mappings,
            reverse,
        })
    }

    /// Standardized label for an XBRL concept; lookup is case-insensitive on
    /// the full qualified name.
    pub fn standardized_label(&self, concept: &str) -> Option<&str> {
        self.reverse.get(&concept.to_lowercase()).map(String::as_str)
    }

    /// All XBRL concepts reporting a standardized label.
    pub fn concepts_for_label(&self, label: &str) -> Result<&[String]> {
        self.mappings
            .get(label)
            .map(|def| def.concepts.as_slice())
            .ok_or_else(|| {
                EdgarError::InvalidFormat(format!("unknown standardized label: {}", label))
            })
    }

    /// All standardized labels in the taxonomy.
    pub fn all_labels(&self) -> Vec<&str> {
        self.mappings.keys().map(String::as_str).collect()
    }

    /// Labels whose snapshot value is required, sorted for stable output.
    pub fn required_labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = self
            .mappings
            .iter()
            .filter(|(_, def)| def.required)
            .map(|(label, _)| label.as_str())
            .collect();
        labels.sort_unstable();
        labels
    }

    pub fn has_mapping(&self, concept: &str) -> bool {
        self.standardized_label(concept).is_some()
    }
}

/// Standardized label for an XBRL concept, from the process-wide mapper.
pub fn standardized_label(concept: &str) -> Option<&'static str> {
    MAPPER.standardized_label(concept)
}

/// All XBRL concepts that map to a standardized label.
pub fn concepts_for_label(label: &str) -> Result<&'static [String]> {
    MAPPER.concepts_for_label(label)
}

/// All standardized labels in the embedded taxonomy.
pub fn all_labels() -> Vec<&'static str> {
    MAPPER.all_labels()
}

/// Required labels, sorted.
pub fn required_labels() -> Vec<&'static str> {
    MAPPER.required_labels()
}

/// True when the concept has a standardized mapping.
pub fn has_mapping(concept: &str) -> bool {
    MAPPER.has_mapping(concept)
}
