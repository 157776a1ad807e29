//! Conversion pipeline
//!
//! Assets are resolved to converter names, grouped, converted group by group
//! and written as a single HCL document.
//!
//! # Module Structure
//!
//! - [`normalize`] - Turns set containers into lists
//! - [`typed`] - Builds schema-typed values from attribute trees
//! - [`resolver`] - Maps assets onto converter names
//! - [`registry`] - Holds the converter instances
//! - [`writer`] - Renders typed values as HCL blocks
//!
//! Conversion is all-or-nothing: the first failing group aborts the run and
//! nothing is written.

pub mod normalize;
pub mod registry;
pub mod resolver;
pub mod typed;
pub mod writer;

pub use normalize::normalize;
pub use registry::{ConverterFactory, ConverterRegistry};
pub use resolver::{parse_field_value, ResolutionTable};
pub use typed::{build_typed_value, Collection, Scalar, TypedValue};
pub use writer::{write_body, write_document};

use crate::asset::Asset;
use crate::error::{ConvertError, Result};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Labelled block emitted by a converter, e.g. `["google_compute_instance", "vm"]`
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceBlock {
    labels: Vec<String>,
    value: TypedValue,
}

impl ResourceBlock {
    pub fn new(labels: Vec<String>, value: TypedValue) -> Result<Self> {
        if labels.is_empty() {
            return Err(ConvertError::unsupported_shape(
                "",
                "resource block without labels",
            ));
        }
        Ok(Self { labels, value })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn value(&self) -> &TypedValue {
        &self.value
    }
}

/// Maps a batch of same-kind assets to resource blocks.
///
/// A converter sees every asset of its kind at once, so it may merge several
/// assets into one block or split one asset into several.
pub trait Converter: Send + Sync {
    fn convert(&self, assets: &[&Asset]) -> Result<Vec<ResourceBlock>>;
}

/// Group assets by converter name. Unresolved assets are dropped.
pub fn group_assets<'a>(
    assets: &'a [Asset],
    table: &ResolutionTable,
) -> BTreeMap<String, Vec<&'a Asset>> {
    let mut groups: BTreeMap<String, Vec<&Asset>> = BTreeMap::new();
    for asset in assets {
        match table.resolve(asset) {
            Some(name) => {
                tracing::debug!("{} -> {}", asset.name, name);
                groups.entry(name.to_string()).or_default().push(asset);
            }
            None => tracing::trace!("No converter for {} ({})", asset.name, asset.asset_type),
        }
    }
    groups
}

/// Convert assets into resource blocks, in converter-name order
pub fn convert_blocks(
    assets: &[Asset],
    table: &ResolutionTable,
    registry: &ConverterRegistry,
) -> Result<Vec<ResourceBlock>> {
    let mut blocks = Vec::new();

    for (name, group) in group_assets(assets, table) {
        let Some(converter) = registry.get(&name) else {
            tracing::warn!("Converter {} is not registered, skipping {} assets", name, group.len());
            continue;
        };
        let items = converter.convert(&group)?;
        tracing::debug!("{}: {} assets -> {} blocks", name, group.len(), items.len());
        blocks.extend(items);
    }

    Ok(blocks)
}

/// Convert assets into an HCL document
pub fn convert(
    assets: &[Asset],
    table: &ResolutionTable,
    registry: &ConverterRegistry,
) -> Result<String> {
    let blocks = convert_blocks(assets, table, registry)?;
    tracing::info!("Converted {} assets into {} resources", assets.len(), blocks.len());
    write_document(&blocks)
}

/// Like [`convert`], running the converter of each group on the blocking pool.
/// Output is identical to the sequential version.
pub async fn convert_concurrent(
    assets: &[Asset],
    table: &ResolutionTable,
    registry: Arc<ConverterRegistry>,
) -> Result<String> {
    let groups: Vec<(String, Vec<Asset>)> = group_assets(assets, table)
        .into_iter()
        .filter(|(name, group)| {
            let known = registry.contains(name);
            if !known {
                tracing::warn!("Converter {} is not registered, skipping {} assets", name, group.len());
            }
            known
        })
        .map(|(name, group)| (name, group.into_iter().cloned().collect()))
        .collect();

    let tasks = groups.into_iter().map(|(name, group)| {
        let registry = Arc::clone(&registry);
        tokio::task::spawn_blocking(move || {
            let refs: Vec<&Asset> = group.iter().collect();
            match registry.get(&name) {
                Some(converter) => converter.convert(&refs),
                None => Ok(Vec::new()),
            }
        })
    });

    // try_join_all keeps the input order, which is the group order
    let results = futures::future::try_join_all(tasks)
        .await
        .map_err(|e| ConvertError::converter_failure("<task>", e.to_string()))?;

    let mut blocks = Vec::new();
    for result in results {
        blocks.extend(result?);
    }

    tracing::info!("Converted {} assets into {} resources", assets.len(), blocks.len());
    write_document(&blocks)
}
