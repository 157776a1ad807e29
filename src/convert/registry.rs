//! Converter Registry
//!
//! Name-indexed converter instances, each built once from its schema. The
//! registry is immutable after construction and shared read-only between
//! conversion runs (and threads).

use super::Converter;
use crate::error::{ConvertError, Result};
use crate::resource::{ResourceSchema, SchemaProvider};
use std::collections::BTreeMap;

/// Builds a converter from its name and the schema of the resource it emits
pub type ConverterFactory = fn(&str, ResourceSchema) -> Box<dyn Converter>;

pub struct ConverterRegistry {
    converters: BTreeMap<String, Box<dyn Converter>>,
}

impl ConverterRegistry {
    /// Construct every converter eagerly. A factory whose name has no schema
    /// is a configuration error and fails the whole build.
    pub fn build<P>(factories: &[(&str, ConverterFactory)], provider: &P) -> Result<Self>
    where
        P: SchemaProvider + ?Sized,
    {
        let mut converters = BTreeMap::new();
        for (name, factory) in factories {
            let schema = provider
                .resource_schema(name)
                .ok_or_else(|| ConvertError::SchemaUnavailable {
                    name: name.to_string(),
                })?;
            tracing::debug!("Registered converter {}", name);
            converters.insert(name.to_string(), factory(name, schema));
        }
        Ok(Self { converters })
    }

    pub fn get(&self, name: &str) -> Option<&dyn Converter> {
        self.converters.get(name).map(|c| c.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.converters.contains_key(name)
    }

    /// Registered converter names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.converters.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.converters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }
}

impl std::fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field("converters", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::Asset;
    use crate::convert::ResourceBlock;
    use crate::resource::{ResourceConfig, Schema};

    struct SchemaNameConverter {
        schema: ResourceSchema,
    }

    impl Converter for SchemaNameConverter {
        fn convert(&self, _assets: &[&Asset]) -> Result<Vec<ResourceBlock>> {
            Err(ConvertError::converter_failure(&self.schema.name, "not implemented"))
        }
    }

    fn factory(_name: &str, schema: ResourceSchema) -> Box<dyn Converter> {
        Box::new(SchemaNameConverter { schema })
    }

    fn provider() -> ResourceConfig {
        let mut config = ResourceConfig::default();
        config.resources.insert("known".to_string(), Schema::new());
        config
    }

    #[test]
    fn test_build_constructs_each_converter_once() {
        let registry = ConverterRegistry::build(&[("known", factory as ConverterFactory)], &provider()).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("known"));
        let err = registry.get("known").unwrap().convert(&[]).unwrap_err();
        assert!(err.to_string().contains("known"));
    }

    #[test]
    fn test_missing_schema_fails_build() {
        let factories: &[(&str, ConverterFactory)] = &[("known", factory), ("unknown", factory)];
        let err = ConverterRegistry::build(factories, &provider()).unwrap_err();
        assert!(matches!(err, ConvertError::SchemaUnavailable { name } if name == "unknown"));
    }
}
