//! Asset type resolution
//!
//! Picks the converter for an asset: exact asset-type lookup first, then the
//! ordered list of resource-name patterns. Unresolved assets are not an error.

use crate::asset::Asset;
use crate::error::{ConvertError, Result};
use crate::resource::{NamePatternDef, ResourceConfig};
use regex::Regex;
use std::collections::{BTreeMap, HashMap};

/// Optional `//service.host/` prefix of a full resource name
const SERVICE_PREFIX: &str = r"^(?://[^/]+/)?";

struct NamePattern {
    source: String,
    regex: Regex,
    converter: String,
}

/// Exact and pattern mappings from asset identity to converter name
#[derive(Default)]
pub struct ResolutionTable {
    by_type: HashMap<String, String>,
    by_pattern: Vec<NamePattern>,
}

impl ResolutionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the table of a resource config. Fails on the first invalid pattern.
    pub fn from_config(config: &ResourceConfig) -> Result<Self> {
        let mut table = Self::new();
        for (asset_type, converter) in &config.asset_types {
            table.add_asset_type(asset_type, converter);
        }
        for NamePatternDef { pattern, converter } in &config.name_patterns {
            table.add_name_pattern(pattern, converter)?;
        }
        Ok(table)
    }

    pub fn add_asset_type(&mut self, asset_type: &str, converter: &str) -> &mut Self {
        self.by_type
            .insert(asset_type.to_string(), converter.to_string());
        self
    }

    /// Append a resource name pattern. It matches full names with or without
    /// the service prefix and must end on a path segment boundary.
    pub fn add_name_pattern(&mut self, pattern: &str, converter: &str) -> Result<&mut Self> {
        let regex = Regex::new(&format!("{}(?:{})(?:/|$)", SERVICE_PREFIX, pattern)).map_err(
            |source| ConvertError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            },
        )?;
        self.by_pattern.push(NamePattern {
            source: pattern.to_string(),
            regex,
            converter: converter.to_string(),
        });
        Ok(self)
    }

    /// Converter name for `asset`, if any
    pub fn resolve(&self, asset: &Asset) -> Option<&str> {
        if let Some(name) = self.by_type.get(&asset.asset_type) {
            return Some(name.as_str());
        }
        self.resolve_name(&asset.name)
    }

    /// Converter name for a resource name, using the patterns only
    pub fn resolve_name(&self, resource_name: &str) -> Option<&str> {
        self.by_pattern
            .iter()
            .find(|p| p.regex.is_match(resource_name))
            .map(|p| p.converter.as_str())
    }

    /// Like [`resolve`](Self::resolve), also returning the named capture groups
    /// of the matching pattern (empty for exact-type matches).
    pub fn resolve_with_captures(&self, asset: &Asset) -> Option<(&str, BTreeMap<String, String>)> {
        if let Some(name) = self.by_type.get(&asset.asset_type) {
            return Some((name.as_str(), BTreeMap::new()));
        }
        self.by_pattern.iter().find_map(|p| {
            let caps = p.regex.captures(&asset.name)?;
            let named = p
                .regex
                .capture_names()
                .flatten()
                .filter_map(|n| caps.name(n).map(|m| (n.to_string(), m.as_str().to_string())))
                .collect();
            tracing::trace!("{} matched pattern {}", asset.name, p.source);
            Some((p.converter.as_str(), named))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty() && self.by_pattern.is_empty()
    }
}

/// Extract the path segment that follows `name` in a resource url.
///
/// e.g. `parse_field_value("projects/p/regions/r/x", "regions")` -> `"r"`.
/// Returns an empty string when the segment is absent.
pub fn parse_field_value(url: &str, name: &str) -> String {
    let fragments: Vec<&str> = url.split('/').collect();
    fragments
        .windows(2)
        .find(|pair| pair[0] == name)
        .map(|pair| pair[1].to_string())
        .unwrap_or_default()
}
