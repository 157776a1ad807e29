//! Schema-typed values
//!
//! Converters describe a resource as an untyped [`AttributeTree`]. Before it can
//! be written, the tree is normalized, turned into its JSON wire form and
//! decoded against the resource schema. Everything downstream (notably the
//! block writer) only looks at the resulting [`TypedValue`].

use super::normalize::normalize;
use crate::asset::AttributeTree;
use crate::error::{ConvertError, Result};
use crate::resource::{ResourceSchema, Schema, Shape};
use serde_json::{Number, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    String(String),
    Number(Number),
    Bool(bool),
}

/// List, set or map value together with its declared element shape
#[derive(Debug, Clone, PartialEq)]
pub enum Collection {
    List { element: Shape, items: Vec<TypedValue> },
    Set { element: Shape, items: Vec<TypedValue> },
    Map { element: Shape, entries: BTreeMap<String, TypedValue> },
}

impl Collection {
    pub fn element(&self) -> &Shape {
        match self {
            Collection::List { element, .. }
            | Collection::Set { element, .. }
            | Collection::Map { element, .. } => element,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Collection::List { items, .. } | Collection::Set { items, .. } => items.len(),
            Collection::Map { entries, .. } => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Collection::Map { .. })
    }
}

/// Value tree shaped exactly like a schema. Absent fields are `Null`.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Null,
    Scalar(Scalar),
    Object(BTreeMap<String, TypedValue>),
    Collection(Collection),
}

impl TypedValue {
    pub fn is_null(&self) -> bool {
        matches!(self, TypedValue::Null)
    }

    /// Field of an object value
    pub fn get(&self, key: &str) -> Option<&TypedValue> {
        match self {
            TypedValue::Object(fields) => fields.get(key),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TypedValue::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            TypedValue::Null => Value::Null,
            TypedValue::Scalar(Scalar::String(s)) => Value::String(s.clone()),
            TypedValue::Scalar(Scalar::Number(n)) => Value::Number(n.clone()),
            TypedValue::Scalar(Scalar::Bool(b)) => Value::Bool(*b),
            TypedValue::Object(fields) => Value::Object(
                fields.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            TypedValue::Collection(Collection::List { items, .. })
            | TypedValue::Collection(Collection::Set { items, .. }) => {
                Value::Array(items.iter().map(TypedValue::to_json).collect())
            }
            TypedValue::Collection(Collection::Map { entries, .. }) => Value::Object(
                entries.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

/// Build a typed value for `tree` under the resource schema.
///
/// Scalars are coerced between string, number and bool the usual way
/// (`"8080"` is a valid number, `true` a valid string). Structural mismatches
/// and attributes the schema does not declare fail with `TypeMismatch`.
pub fn build_typed_value(tree: &AttributeTree, schema: &ResourceSchema) -> Result<TypedValue> {
    let wire = normalize(tree).to_json();
    match &wire {
        Value::Object(map) => decode_object(map, &schema.block, schema, ""),
        other => Err(ConvertError::type_mismatch("", "object", json_kind(other))),
    }
}

fn decode(value: &Value, shape: &Shape, schema: &ResourceSchema, path: &str) -> Result<TypedValue> {
    if value.is_null() {
        return Ok(TypedValue::Null);
    }

    match shape {
        Shape::String => decode_string(value, path).map(|s| TypedValue::Scalar(Scalar::String(s))),
        Shape::Number => decode_number(value, path).map(|n| TypedValue::Scalar(Scalar::Number(n))),
        Shape::Bool => decode_bool(value, path).map(|b| TypedValue::Scalar(Scalar::Bool(b))),
        Shape::List(element) | Shape::Set(element) => {
            let Value::Array(raw) = value else {
                return Err(ConvertError::type_mismatch(path, shape.to_string(), json_kind(value)));
            };
            let mut items = Vec::with_capacity(raw.len());
            for (idx, item) in raw.iter().enumerate() {
                let decoded = decode(item, element, schema, &format!("{}[{}]", path, idx))?;
                if matches!(shape, Shape::Set(_)) && items.contains(&decoded) {
                    continue;
                }
                items.push(decoded);
            }
            let element = element.as_ref().clone();
            Ok(TypedValue::Collection(if matches!(shape, Shape::Set(_)) {
                Collection::Set { element, items }
            } else {
                Collection::List { element, items }
            }))
        }
        Shape::Map(element) => {
            let Value::Object(raw) = value else {
                return Err(ConvertError::type_mismatch(path, shape.to_string(), json_kind(value)));
            };
            let mut entries = BTreeMap::new();
            for (key, item) in raw {
                entries.insert(key.clone(), decode(item, element, schema, &join(path, key))?);
            }
            Ok(TypedValue::Collection(Collection::Map {
                element: element.as_ref().clone(),
                entries,
            }))
        }
        Shape::Object(_) | Shape::Ref(_) => {
            let Some(fields) = schema.object_fields(shape) else {
                let name = match shape {
                    Shape::Ref(name) => name.clone(),
                    _ => shape.to_string(),
                };
                return Err(ConvertError::SchemaUnavailable { name });
            };
            let Value::Object(raw) = value else {
                return Err(ConvertError::type_mismatch(path, shape.to_string(), json_kind(value)));
            };
            decode_object(raw, fields, schema, path)
        }
    }
}

fn decode_object(
    raw: &serde_json::Map<String, Value>,
    fields: &Schema,
    schema: &ResourceSchema,
    path: &str,
) -> Result<TypedValue> {
    if let Some((key, value)) = raw.iter().find(|(key, _)| !fields.contains_key(*key)) {
        return Err(ConvertError::type_mismatch(
            &join(path, key),
            "no such attribute",
            json_kind(value),
        ));
    }

    let mut object = BTreeMap::new();
    for (name, shape) in fields {
        let value = raw.get(name).unwrap_or(&Value::Null);
        object.insert(name.clone(), decode(value, shape, schema, &join(path, name))?);
    }
    Ok(TypedValue::Object(object))
}

fn decode_string(value: &Value, path: &str) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(ConvertError::type_mismatch(path, "string", json_kind(other))),
    }
}

fn decode_number(value: &Value, path: &str) -> Result<Number> {
    match value {
        Value::Number(n) => Ok(n.clone()),
        Value::String(s) => {
            if let Ok(int) = s.trim().parse::<i64>() {
                return Ok(Number::from(int));
            }
            s.trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .ok_or_else(|| ConvertError::type_mismatch(path, "number", format!("string {:?}", s)))
        }
        other => Err(ConvertError::type_mismatch(path, "number", json_kind(other))),
    }
}

fn decode_bool(value: &Value, path: &str) -> Result<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) if s == "true" => Ok(true),
        Value::String(s) if s == "false" => Ok(false),
        Value::String(s) => Err(ConvertError::type_mismatch(path, "bool", format!("string {:?}", s))),
        other => Err(ConvertError::type_mismatch(path, "bool", json_kind(other))),
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> ResourceSchema {
        let block: Schema = serde_json::from_value(json!({
            "name": "string",
            "port": "number",
            "enabled": "bool",
            "tags": {"set": "string"},
            "labels": {"map": "string"},
            "log_config": {"object": {"enable": "bool"}},
            "backend": {"list": {"ref": "backend"}}
        }))
        .unwrap();
        let defs = BTreeMap::from([(
            "backend".to_string(),
            serde_json::from_value::<Schema>(json!({"group": "string"})).unwrap(),
        )]);
        ResourceSchema::new("test_resource", block).with_definitions(defs)
    }

    #[test]
    fn test_absent_fields_are_null() {
        let value = build_typed_value(&AttributeTree::from(json!({"name": "a"})), &schema()).unwrap();
        assert_eq!(value.get("name").and_then(|v| v.as_str()), Some("a"));
        assert!(value.get("port").unwrap().is_null());
        assert!(value.get("backend").unwrap().is_null());
    }

    #[test]
    fn test_scalar_coercion() {
        let tree = AttributeTree::from(json!({"name": 12, "port": "8080", "enabled": "true"}));
        let value = build_typed_value(&tree, &schema()).unwrap();
        assert_eq!(value.get("name").unwrap().to_json(), json!("12"));
        assert_eq!(value.get("port").unwrap().to_json(), json!(8080));
        assert_eq!(value.get("enabled").unwrap().to_json(), json!(true));
    }

    #[test]
    fn test_nested_objects_and_refs() {
        let tree = AttributeTree::from(json!({
            "log_config": {"enable": true},
            "backend": [{"group": "g1"}, {"group": "g2"}]
        }));
        let value = build_typed_value(&tree, &schema()).unwrap();
        assert!(matches!(value.get("log_config"), Some(TypedValue::Object(_))));
        let Some(TypedValue::Collection(backend)) = value.get("backend") else {
            panic!("backend should be a collection");
        };
        assert!(backend.element().is_object());
        assert_eq!(backend.len(), 2);
    }

    #[test]
    fn test_set_deduplicates() {
        let tree = AttributeTree::Map(
            [(
                "tags".to_string(),
                AttributeTree::Set(vec!["b".into(), "a".into(), "b".into()]),
            )]
            .into(),
        );
        let value = build_typed_value(&tree, &schema()).unwrap();
        assert_eq!(value.get("tags").unwrap().to_json(), json!(["a", "b"]));
    }

    #[test]
    fn test_string_for_object_is_type_mismatch() {
        let tree = AttributeTree::from(json!({"log_config": "yes"}));
        let err = build_typed_value(&tree, &schema()).unwrap_err();
        match err {
            ConvertError::TypeMismatch { path, found, .. } => {
                assert_eq!(path, "log_config");
                assert_eq!(found, "string");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_attribute_is_type_mismatch() {
        let tree = AttributeTree::from(json!({"backend": [{"group": "g", "weight": 1}]}));
        let err = build_typed_value(&tree, &schema()).unwrap_err();
        assert!(err.to_string().contains("backend[0].weight"), "{err}");
    }

    #[test]
    fn test_non_numeric_string_for_number_fails() {
        let tree = AttributeTree::from(json!({"port": "http"}));
        assert!(matches!(
            build_typed_value(&tree, &schema()),
            Err(ConvertError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_root_must_be_object() {
        let err = build_typed_value(&AttributeTree::from("x"), &schema()).unwrap_err();
        assert!(matches!(err, ConvertError::TypeMismatch { .. }));
    }

    #[test]
    fn test_missing_ref_is_schema_unavailable() {
        let block: Schema = serde_json::from_value(json!({"x": {"ref": "nowhere"}})).unwrap();
        let schema = ResourceSchema::new("r", block);
        let err = build_typed_value(&AttributeTree::from(json!({"x": {}})), &schema).unwrap_err();
        assert!(matches!(err, ConvertError::SchemaUnavailable { name } if name == "nowhere"));
    }
}
