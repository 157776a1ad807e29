//! Cloud Asset Inventory records
//!
//! Assets arrive as JSON (an export array or newline-delimited records). Their
//! `resource.data` payload is kept untyped as an [`AttributeTree`].

use crate::error::{ConvertError, Result};
use serde::{Deserialize, Deserializer};
use serde_json::{Number, Value};
use std::collections::BTreeMap;
use std::io::Read;

/// Untyped attribute tree taken from an asset payload.
///
/// `Set` is the unordered container converters may build (for example when
/// deduplicating). It is not serializable as-is; run [`crate::convert::normalize`]
/// before handing the tree to the typed-value builder.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AttributeTree {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    List(Vec<AttributeTree>),
    Set(Vec<AttributeTree>),
    Map(BTreeMap<String, AttributeTree>),
}

impl AttributeTree {
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeTree::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeTree::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, AttributeTree>> {
        match self {
            AttributeTree::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Get a value by map key, `None` for non-maps
    pub fn get(&self, key: &str) -> Option<&AttributeTree> {
        self.as_map()?.get(key)
    }

    /// Short name of the node's kind, used in error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            AttributeTree::Null => "null",
            AttributeTree::Bool(_) => "bool",
            AttributeTree::Number(_) => "number",
            AttributeTree::String(_) => "string",
            AttributeTree::List(_) => "list",
            AttributeTree::Set(_) => "set",
            AttributeTree::Map(_) => "map",
        }
    }

    /// JSON wire form. Sets are written as arrays in their current order.
    pub fn to_json(&self) -> Value {
        match self {
            AttributeTree::Null => Value::Null,
            AttributeTree::Bool(b) => Value::Bool(*b),
            AttributeTree::Number(n) => Value::Number(n.clone()),
            AttributeTree::String(s) => Value::String(s.clone()),
            AttributeTree::List(items) | AttributeTree::Set(items) => {
                Value::Array(items.iter().map(AttributeTree::to_json).collect())
            }
            AttributeTree::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for AttributeTree {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => AttributeTree::Null,
            Value::Bool(b) => AttributeTree::Bool(b),
            Value::Number(n) => AttributeTree::Number(n),
            Value::String(s) => AttributeTree::String(s),
            Value::Array(items) => {
                AttributeTree::List(items.into_iter().map(AttributeTree::from).collect())
            }
            Value::Object(map) => AttributeTree::Map(
                map.into_iter()
                    .map(|(k, v)| (k, AttributeTree::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for AttributeTree {
    fn from(value: &str) -> Self {
        AttributeTree::String(value.to_string())
    }
}

impl From<String> for AttributeTree {
    fn from(value: String) -> Self {
        AttributeTree::String(value)
    }
}

impl<'de> Deserialize<'de> for AttributeTree {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(AttributeTree::from)
    }
}

/// Resource payload of an asset
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssetResource {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub discovery_document_uri: String,
    #[serde(default)]
    pub discovery_name: String,
    #[serde(default)]
    pub parent: String,
    #[serde(default)]
    pub data: AttributeTree,
}

/// One Cloud Asset Inventory record
#[derive(Debug, Clone, Deserialize)]
pub struct Asset {
    /// Full resource name, e.g. `//compute.googleapis.com/projects/p/zones/z/instances/vm`
    pub name: String,
    pub asset_type: String,
    #[serde(default)]
    pub resource: Option<AssetResource>,
    #[serde(default)]
    pub iam_policy: Option<Value>,
    #[serde(default)]
    pub ancestors: Vec<String>,
}

impl Asset {
    pub fn new(name: &str, asset_type: &str, data: AttributeTree) -> Self {
        Self {
            name: name.to_string(),
            asset_type: asset_type.to_string(),
            resource: Some(AssetResource {
                data,
                ..Default::default()
            }),
            iam_policy: None,
            ancestors: Vec::new(),
        }
    }

    /// The asset's attribute tree, if it carries a resource payload
    pub fn data(&self) -> Option<&AttributeTree> {
        self.resource.as_ref().map(|r| &r.data)
    }

    /// Last path segment of the asset name
    pub fn short_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

/// Read assets from a JSON array or newline-delimited JSON records
pub fn load_assets<R: Read>(mut reader: R) -> Result<Vec<Asset>> {
    let mut content = String::new();
    reader
        .read_to_string(&mut content)
        .map_err(|e| ConvertError::InvalidDefinition(format!("failed to read assets: {}", e)))?;

    let trimmed = content.trim_start();
    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed)
            .map_err(|e| ConvertError::InvalidDefinition(format!("invalid asset array: {}", e)));
    }

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line).map_err(|e| {
                ConvertError::InvalidDefinition(format!("invalid asset on line {}: {}", idx + 1, e))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attribute_tree_from_json_keeps_structure() {
        let tree = AttributeTree::from(json!({"a": [1, "x", null], "b": {"c": true}}));
        let a = tree.get("a").unwrap();
        assert_eq!(a.kind_name(), "list");
        assert_eq!(tree.get("b").and_then(|b| b.get("c")), Some(&AttributeTree::Bool(true)));
        assert_eq!(tree.to_json(), json!({"a": [1, "x", null], "b": {"c": true}}));
    }

    #[test]
    fn test_load_assets_array() {
        let input = r#"[
            {"name": "//compute.googleapis.com/projects/p/global/healthChecks/hc", "asset_type": "compute.googleapis.com/HealthCheck",
             "resource": {"version": "v1", "data": {"name": "hc"}}}
        ]"#;
        let assets = load_assets(input.as_bytes()).unwrap();
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].short_name(), "hc");
        assert_eq!(assets[0].data().and_then(|d| d.get("name")).and_then(|n| n.as_str()), Some("hc"));
    }

    #[test]
    fn test_load_assets_newline_delimited() {
        let input = "{\"name\": \"a\", \"asset_type\": \"t\"}\n\n{\"name\": \"b\", \"asset_type\": \"t\"}\n";
        let assets = load_assets(input.as_bytes()).unwrap();
        assert_eq!(assets.len(), 2);
        assert!(assets[0].resource.is_none());
        assert!(assets[1].ancestors.is_empty());
    }

    #[test]
    fn test_load_assets_reports_bad_line() {
        let input = "{\"name\": \"a\", \"asset_type\": \"t\"}\nnot json\n";
        let err = load_assets(input.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
