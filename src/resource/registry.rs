//! Resource Registry - Load resource schemas and resolution tables from JSON
//!
//! Every service domain ships one JSON file with the schemas of the Terraform
//! resources it converts to, plus the tables mapping assets onto converters.
//! The files are embedded at compile time and may be extended at run time
//! with an extra definitions file.

use super::shape::{ResourceSchema, Schema};
use crate::error::{ConvertError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

/// Embedded resource JSON files (compiled into the binary)
const RESOURCE_FILES: &[(&str, &str)] = &[
    ("compute", include_str!("../resources/compute.json")),
    ("resourcemanager", include_str!("../resources/resourcemanager.json")),
];

/// Ordered name pattern entry
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct NamePatternDef {
    pub pattern: String,
    pub converter: String,
}

/// Root structure of resources/*.json
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceConfig {
    /// Shared object schemas referenced with `{"ref": ...}`
    #[serde(default)]
    pub definitions: BTreeMap<String, Schema>,
    /// Terraform resource type -> schema
    #[serde(default)]
    pub resources: BTreeMap<String, Schema>,
    /// Asset type -> converter name
    #[serde(default)]
    pub asset_types: BTreeMap<String, String>,
    /// Asset name pattern -> converter name, first match wins
    #[serde(default)]
    pub name_patterns: Vec<NamePatternDef>,
}

impl ResourceConfig {
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| ConvertError::InvalidDefinition(format!("resource definitions: {}", e)))
    }

    /// Load extra definitions from disk
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConvertError::InvalidDefinition(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    /// Merge another config into this one. Entries of `other` win on conflict;
    /// its name patterns are tried before the existing ones.
    pub fn merge(&mut self, other: ResourceConfig) {
        self.definitions.extend(other.definitions);
        self.resources.extend(other.resources);
        self.asset_types.extend(other.asset_types);
        let mut patterns = other.name_patterns;
        patterns.append(&mut self.name_patterns);
        self.name_patterns = patterns;
    }
}

/// Source of resource schemas, consulted once per converter at registry build time
pub trait SchemaProvider {
    fn resource_schema(&self, name: &str) -> Option<ResourceSchema>;
}

impl SchemaProvider for ResourceConfig {
    fn resource_schema(&self, name: &str) -> Option<ResourceSchema> {
        let block = self.resources.get(name)?;
        Some(ResourceSchema::new(name, block.clone()).with_definitions(self.definitions.clone()))
    }
}

/// Global registry loaded from JSON
static REGISTRY: OnceLock<BTreeMap<&'static str, ResourceConfig>> = OnceLock::new();

fn domains() -> &'static BTreeMap<&'static str, ResourceConfig> {
    REGISTRY.get_or_init(|| {
        RESOURCE_FILES
            .iter()
            .map(|(domain, content)| {
                let config = ResourceConfig::from_json(content).unwrap_or_else(|e| {
                    panic!("Failed to parse embedded resource JSON for {}: {}", domain, e)
                });
                (*domain, config)
            })
            .collect()
    })
}

/// Get the definitions of one service domain
pub fn get_domain(domain: &str) -> Option<&'static ResourceConfig> {
    domains().get(domain)
}

/// Get all embedded domain names
pub fn get_all_domains() -> Vec<&'static str> {
    domains().keys().copied().collect()
}

/// All embedded domains merged into one config
pub fn get_registry() -> ResourceConfig {
    let mut merged = ResourceConfig::default();
    for config in domains().values() {
        merged.definitions.extend(config.definitions.clone());
        merged.resources.extend(config.resources.clone());
        merged.asset_types.extend(config.asset_types.clone());
        merged.name_patterns.extend(config.name_patterns.iter().cloned());
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::Shape;

    #[test]
    fn test_registry_loads_successfully() {
        let registry = get_registry();
        assert!(
            !registry.resources.is_empty(),
            "Registry should have resources"
        );
        assert!(!registry.asset_types.is_empty(), "Registry should map asset types");
    }

    #[test]
    fn test_every_asset_type_maps_to_known_resource() {
        let registry = get_registry();
        for (asset_type, converter) in &registry.asset_types {
            assert!(
                registry.resources.contains_key(converter),
                "{} maps to {} which has no schema",
                asset_type,
                converter
            );
        }
        for entry in &registry.name_patterns {
            assert!(registry.resources.contains_key(&entry.converter));
        }
    }

    #[test]
    fn test_compute_domain_exists() {
        let compute = get_domain("compute").expect("compute domain should exist");
        assert!(compute.resources.contains_key("google_compute_forwarding_rule"));
        assert!(get_all_domains().contains(&"resourcemanager"));
    }

    #[test]
    fn test_schema_provider_attaches_definitions() {
        let registry = get_registry();
        let schema = registry
            .resource_schema("google_compute_backend_service")
            .expect("backend service schema");
        assert!(matches!(schema.block.get("backend"), Some(Shape::Set(_))));
        assert!(schema.definition("backend").is_some());
        assert!(registry.resource_schema("google_nothing").is_none());
    }

    #[test]
    fn test_merge_prefers_new_entries_and_patterns() {
        let mut base = ResourceConfig::from_json(
            r#"{"asset_types": {"a": "one"}, "name_patterns": [{"pattern": "x", "converter": "one"}]}"#,
        )
        .unwrap();
        let extra = ResourceConfig::from_json(
            r#"{"asset_types": {"a": "two"}, "name_patterns": [{"pattern": "y", "converter": "two"}]}"#,
        )
        .unwrap();
        base.merge(extra);
        assert_eq!(base.asset_types["a"], "two");
        assert_eq!(base.name_patterns[0].pattern, "y");
        assert_eq!(base.name_patterns.len(), 2);
    }

    #[test]
    fn test_malformed_definitions_rejected() {
        let err = ResourceConfig::from_json(r#"{"resources": {"r": {"f": "tuple"}}}"#).unwrap_err();
        assert!(matches!(err, ConvertError::InvalidDefinition(_)));
    }
}
