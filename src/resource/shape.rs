//! Field shapes
//!
//! A schema maps field names to shapes. Shapes are written in JSON either as a
//! bare scalar name (`"string"`) or as a single-key object (`{"list": "string"}`,
//! `{"object": {...}}`, `{"ref": "backend"}`).

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Field name -> shape, iterated in lexicographic order
pub type Schema = BTreeMap<String, Shape>;

/// Expected shape of one field
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    String,
    Number,
    Bool,
    List(Box<Shape>),
    Set(Box<Shape>),
    Map(Box<Shape>),
    Object(Schema),
    /// Named object schema declared under `definitions`
    Ref(String),
}

impl Shape {
    pub fn list(element: Shape) -> Self {
        Shape::List(Box::new(element))
    }

    pub fn set(element: Shape) -> Self {
        Shape::Set(Box::new(element))
    }

    pub fn map(element: Shape) -> Self {
        Shape::Map(Box::new(element))
    }

    /// Whether values of this shape are objects (refs always name objects)
    pub fn is_object(&self) -> bool {
        matches!(self, Shape::Object(_) | Shape::Ref(_))
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::String => write!(f, "string"),
            Shape::Number => write!(f, "number"),
            Shape::Bool => write!(f, "bool"),
            Shape::List(e) => write!(f, "list({})", e),
            Shape::Set(e) => write!(f, "set({})", e),
            Shape::Map(e) => write!(f, "map({})", e),
            Shape::Object(_) => write!(f, "object"),
            Shape::Ref(name) => write!(f, "object({})", name),
        }
    }
}

/// Schema of one resource type together with the definitions its refs point at
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    pub name: String,
    pub block: Schema,
    pub definitions: Arc<BTreeMap<String, Schema>>,
}

impl ResourceSchema {
    pub fn new(name: &str, block: Schema) -> Self {
        Self {
            name: name.to_string(),
            block,
            definitions: Arc::new(BTreeMap::new()),
        }
    }

    pub fn with_definitions(mut self, definitions: BTreeMap<String, Schema>) -> Self {
        self.definitions = Arc::new(definitions);
        self
    }

    pub fn definition(&self, name: &str) -> Option<&Schema> {
        self.definitions.get(name)
    }

    /// Fields of an object shape, following refs. `None` for non-objects and unknown refs.
    pub fn object_fields<'a>(&'a self, shape: &'a Shape) -> Option<&'a Schema> {
        match shape {
            Shape::Object(fields) => Some(fields),
            Shape::Ref(name) => self.definition(name),
            _ => None,
        }
    }
}
