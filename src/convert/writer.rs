//! Block Tree Writer
//!
//! Renders resource blocks as HCL. For every non-null field of an object:
//! objects become nested blocks, non-empty lists/sets of objects become one
//! repeated block per element, everything else becomes an attribute. Empty
//! collections and empty strings are left out.

use super::typed::{Collection, Scalar, TypedValue};
use super::ResourceBlock;
use crate::error::{ConvertError, Result};
use hcl::{Attribute, Block, BlockLabel, Body, Identifier, Structure};
use std::collections::BTreeMap;

/// Render blocks as one document of top-level `resource` blocks
pub fn write_document(blocks: &[ResourceBlock]) -> Result<String> {
    let body = blocks
        .iter()
        .map(|block| write_resource_block(block).map(Structure::Block))
        .collect::<Result<Body>>()?;
    Ok(hcl::to_string(&body)?)
}

fn write_resource_block(block: &ResourceBlock) -> Result<Block> {
    if block.labels.is_empty() {
        return Err(ConvertError::unsupported_shape("", "resource block without labels"));
    }
    let TypedValue::Object(_) = &block.value else {
        return Err(ConvertError::unsupported_shape(
            "",
            format!("expected object type, found {}", kind_name(&block.value)),
        ));
    };

    Ok(Block {
        identifier: identifier("resource", "")?,
        labels: block
            .labels
            .iter()
            .map(|label| BlockLabel::String(label.clone()))
            .collect(),
        body: write_body(&block.value)?,
    })
}

/// Render an object value as a block body. `Null` renders as an empty body.
pub fn write_body(value: &TypedValue) -> Result<Body> {
    write_value(value, "")
}

fn write_value(value: &TypedValue, path: &str) -> Result<Body> {
    match value {
        TypedValue::Null => Ok(Body::default()),
        TypedValue::Object(fields) => write_fields(fields, path).map(Body::from_iter),
        other => Err(ConvertError::unsupported_shape(
            path,
            format!("expected object type, found {}", kind_name(other)),
        )),
    }
}

fn write_fields(fields: &BTreeMap<String, TypedValue>, path: &str) -> Result<Vec<Structure>> {
    let mut structures = Vec::new();

    for (key, value) in fields {
        let field_path = join(path, key);
        match value {
            TypedValue::Null => continue,
            TypedValue::Object(_) => {
                let body = write_value(value, &field_path)?;
                structures.push(Structure::Block(nested_block(key, &field_path, body)?));
            }
            TypedValue::Collection(collection) if collection.is_empty() => continue,
            TypedValue::Collection(
                Collection::List { element, items } | Collection::Set { element, items },
            ) if element.is_object() => {
                for (idx, item) in items.iter().enumerate() {
                    let item_path = format!("{}[{}]", field_path, idx);
                    let body = write_value(item, &item_path)?;
                    structures.push(Structure::Block(nested_block(key, &item_path, body)?));
                }
            }
            TypedValue::Scalar(Scalar::String(s)) if s.is_empty() => continue,
            TypedValue::Collection(_) | TypedValue::Scalar(_) => {
                let expr = to_hcl_value(value, &field_path)?;
                structures.push(Structure::Attribute(Attribute::new(
                    identifier(key, &field_path)?,
                    expr,
                )));
            }
        }
    }

    Ok(structures)
}

fn nested_block(key: &str, path: &str, body: Body) -> Result<Block> {
    Ok(Block {
        identifier: identifier(key, path)?,
        labels: Vec::new(),
        body,
    })
}

fn identifier(key: &str, path: &str) -> Result<Identifier> {
    Identifier::new(key).map_err(|_| {
        ConvertError::unsupported_shape(path, format!("{:?} is not a valid identifier", key))
    })
}

/// Attribute value form of a typed value
fn to_hcl_value(value: &TypedValue, path: &str) -> Result<hcl::Value> {
    Ok(match value {
        TypedValue::Null => hcl::Value::Null,
        TypedValue::Scalar(Scalar::String(s)) => hcl::Value::String(s.clone()),
        TypedValue::Scalar(Scalar::Bool(b)) => hcl::Value::Bool(*b),
        TypedValue::Scalar(Scalar::Number(n)) => hcl::Value::Number(to_hcl_number(n, path)?),
        TypedValue::Collection(Collection::List { items, .. })
        | TypedValue::Collection(Collection::Set { items, .. }) => hcl::Value::Array(
            items
                .iter()
                .enumerate()
                .map(|(idx, item)| to_hcl_value(item, &format!("{}[{}]", path, idx)))
                .collect::<Result<Vec<_>>>()?,
        ),
        TypedValue::Collection(Collection::Map { entries: fields, .. })
        | TypedValue::Object(fields) => hcl::Value::Object(
            fields
                .iter()
                .map(|(k, v)| Ok((k.clone(), to_hcl_value(v, &join(path, k))?)))
                .collect::<Result<hcl::Map<String, hcl::Value>>>()?,
        ),
    })
}

fn to_hcl_number(n: &serde_json::Number, path: &str) -> Result<hcl::Number> {
    if let Some(i) = n.as_i64() {
        return Ok(hcl::Number::from(i));
    }
    if let Some(u) = n.as_u64() {
        return Ok(hcl::Number::from(u));
    }
    n.as_f64()
        .and_then(hcl::Number::from_f64)
        .ok_or_else(|| ConvertError::unsupported_shape(path, format!("{} is not a finite number", n)))
}

fn kind_name(value: &TypedValue) -> &'static str {
    match value {
        TypedValue::Null => "null",
        TypedValue::Scalar(_) => "scalar",
        TypedValue::Object(_) => "object",
        TypedValue::Collection(_) => "collection",
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}
