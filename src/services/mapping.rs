//! Generic field-mapping converter
//!
//! Most Terraform resources mirror their API representation closely: field
//! names are the snake_case form of the API's camelCase ones, and single nested
//! messages become one-element block lists. [`MappedConverter`] relies on that
//! convention and projects asset data onto the resource schema, dropping the
//! fields the schema does not know.

use crate::asset::{Asset, AttributeTree};
use crate::convert::{build_typed_value, parse_field_value, Converter, ResourceBlock};
use crate::error::{ConvertError, Result};
use crate::resource::{ResourceSchema, Schema, Shape};
use std::collections::BTreeMap;

/// Hook run on the raw data map before projection
pub type Preprocess = fn(&mut BTreeMap<String, AttributeTree>);

/// Location fields filled from the asset name when the data lacks them
const LOCATION_FIELDS: &[(&str, &str)] = &[
    ("project", "projects"),
    ("region", "regions"),
    ("zone", "zones"),
];

pub struct MappedConverter {
    name: String,
    schema: ResourceSchema,
    renames: &'static [(&'static str, &'static str)],
    preprocess: Option<Preprocess>,
}

impl MappedConverter {
    pub fn new(name: &str, schema: ResourceSchema) -> Self {
        Self {
            name: name.to_string(),
            schema,
            renames: &[],
            preprocess: None,
        }
    }

    /// Field renames applied after snake-casing, e.g. `("backends", "backend")`
    pub fn with_renames(mut self, renames: &'static [(&'static str, &'static str)]) -> Self {
        self.renames = renames;
        self
    }

    pub fn with_preprocess(mut self, preprocess: Preprocess) -> Self {
        self.preprocess = Some(preprocess);
        self
    }

    fn convert_asset(&self, asset: &Asset) -> Result<Option<ResourceBlock>> {
        let raw = match asset.data() {
            Some(AttributeTree::Map(raw)) => raw,
            None | Some(AttributeTree::Null) => {
                tracing::debug!("{} carries no resource data, skipping", asset.name);
                return Ok(None);
            }
            Some(other) => {
                return Err(ConvertError::converter_failure(
                    &self.name,
                    format!("asset {} has {} resource data", asset.name, other.kind_name()),
                ))
            }
        };

        let mut raw = raw.clone();
        if let Some(preprocess) = self.preprocess {
            preprocess(&mut raw);
        }

        let mut fields = self.project_object(&raw, &self.schema.block);
        for (field, segment) in LOCATION_FIELDS {
            if self.schema.block.contains_key(*field) && !fields.contains_key(*field) {
                let value = parse_field_value(&asset.name, segment);
                if !value.is_empty() {
                    fields.insert(field.to_string(), AttributeTree::String(value));
                }
            }
        }
        if self.schema.block.contains_key("name") && !fields.contains_key("name") {
            fields.insert("name".to_string(), AttributeTree::from(asset.short_name()));
        }

        let value = build_typed_value(&AttributeTree::Map(fields), &self.schema)?;
        ResourceBlock::new(
            vec![self.name.clone(), resource_label(asset.short_name())],
            value,
        )
        .map(Some)
    }

    fn project(&self, value: &AttributeTree, shape: &Shape) -> AttributeTree {
        match (shape, value) {
            (Shape::Object(_) | Shape::Ref(_), AttributeTree::Map(map)) => {
                match self.schema.object_fields(shape) {
                    Some(fields) => AttributeTree::Map(self.project_object(map, fields)),
                    None => value.clone(),
                }
            }
            (Shape::List(element), AttributeTree::List(items) | AttributeTree::Set(items)) => {
                AttributeTree::List(items.iter().map(|i| self.project(i, element)).collect())
            }
            (Shape::Set(element), AttributeTree::List(items) | AttributeTree::Set(items)) => {
                AttributeTree::Set(items.iter().map(|i| self.project(i, element)).collect())
            }
            (Shape::List(element) | Shape::Set(element), AttributeTree::Map(_))
                if element.is_object() =>
            {
                AttributeTree::List(vec![self.project(value, element)])
            }
            (Shape::Map(element), AttributeTree::Map(map)) => AttributeTree::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), self.project(v, element)))
                    .collect(),
            ),
            _ => value.clone(),
        }
    }

    fn project_object(
        &self,
        map: &BTreeMap<String, AttributeTree>,
        fields: &Schema,
    ) -> BTreeMap<String, AttributeTree> {
        let mut projected = BTreeMap::new();
        for (key, value) in map {
            let field = self.field_name(key);
            if let Some(shape) = fields.get(&field) {
                projected.insert(field, self.project(value, shape));
            }
        }
        projected
    }

    fn field_name(&self, key: &str) -> String {
        let snake = to_snake_case(key);
        self.renames
            .iter()
            .find(|(from, _)| *from == snake)
            .map(|(_, to)| to.to_string())
            .unwrap_or(snake)
    }
}

impl Converter for MappedConverter {
    fn convert(&self, assets: &[&Asset]) -> Result<Vec<ResourceBlock>> {
        assets
            .iter()
            .filter_map(|asset| self.convert_asset(asset).transpose())
            .collect()
    }
}

/// `IPAddress` -> `ip_address`, `checkIntervalSec` -> `check_interval_sec`
pub fn to_snake_case(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let mut out = String::with_capacity(key.len() + 4);
    for (idx, c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() && idx > 0 {
            let prev = chars[idx - 1];
            let next_lower = chars.get(idx + 1).is_some_and(|n| n.is_ascii_lowercase());
            if prev.is_ascii_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_ascii_uppercase() && next_lower)
            {
                out.push('_');
            }
        }
        out.push(c.to_ascii_lowercase());
    }
    out
}

/// Terraform resource name for an asset: letters, digits, `_` and `-`,
/// not starting with a digit or dash
pub fn resource_label(name: &str) -> String {
    let mut label: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    if !label.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        label.insert(0, '_');
    }
    label
}
