//! Service converters
//!
//! Each service domain contributes converter factories. Schemas and
//! resolution tables live next to them in `src/resources/<domain>.json`.
//!
//! - [`compute`] - Compute Engine
//! - [`resourcemanager`] - Projects

pub mod compute;
mod mapping;
pub mod resourcemanager;

pub use mapping::{resource_label, to_snake_case, MappedConverter, Preprocess};

use crate::asset::Asset;
use crate::convert::{self, ConverterFactory, ConverterRegistry, ResolutionTable};
use crate::error::Result;
use crate::resource::{get_registry, ResourceConfig};
use std::sync::Arc;

/// Factories of every supported converter
pub fn factories() -> Vec<(&'static str, ConverterFactory)> {
    compute::FACTORIES
        .iter()
        .chain(resourcemanager::FACTORIES)
        .copied()
        .collect()
}

/// Resolution table and converter registry built from one set of definitions
pub struct Catalog {
    pub table: ResolutionTable,
    pub registry: Arc<ConverterRegistry>,
}

impl Catalog {
    /// Catalog of the embedded GCP definitions
    pub fn gcp() -> Result<Self> {
        Self::with_config(&get_registry())
    }

    pub fn with_config(config: &ResourceConfig) -> Result<Self> {
        let table = ResolutionTable::from_config(config)?;
        let registry = ConverterRegistry::build(&factories(), config)?;
        tracing::info!("Catalog ready with {} converters", registry.len());
        Ok(Self {
            table,
            registry: Arc::new(registry),
        })
    }

    pub fn convert(&self, assets: &[Asset]) -> Result<String> {
        convert::convert(assets, &self.table, &self.registry)
    }

    pub async fn convert_concurrent(&self, assets: &[Asset]) -> Result<String> {
        convert::convert_concurrent(assets, &self.table, Arc::clone(&self.registry)).await
    }
}
