//! Conversion errors
//!
//! Registry-construction errors are fatal at start-up. Everything raised while
//! converting aborts the whole batch; callers never see partial output.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConvertError>;

#[derive(Debug, Error)]
pub enum ConvertError {
    /// A converter (or a `ref` inside a schema) names a schema nobody provides
    #[error("schema unavailable: {name}")]
    SchemaUnavailable { name: String },

    /// Runtime shape of a value disagrees with the schema
    #[error("type mismatch at {path}: expected {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: String,
        found: String,
    },

    /// The writer met a value it cannot place in a block body
    #[error("unsupported shape at {path}: {message}")]
    UnsupportedShape { path: String, message: String },

    /// Opaque failure reported by a per-resource converter
    #[error("converter {converter} failed: {message}")]
    ConverterFailure { converter: String, message: String },

    #[error("invalid name pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid definition: {0}")]
    InvalidDefinition(String),

    #[error("failed to render document: {0}")]
    Render(#[from] hcl::Error),
}

impl ConvertError {
    pub fn type_mismatch(path: &str, expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            path: display_path(path),
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn unsupported_shape(path: &str, message: impl Into<String>) -> Self {
        Self::UnsupportedShape {
            path: display_path(path),
            message: message.into(),
        }
    }

    pub fn converter_failure(converter: &str, message: impl Into<String>) -> Self {
        Self::ConverterFailure {
            converter: converter.to_string(),
            message: message.into(),
        }
    }
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        "<root>".to_string()
    } else {
        path.to_string()
    }
}
