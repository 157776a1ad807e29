//! Attribute tree normalization
//!
//! Converters may hand over trees holding [`AttributeTree::Set`] containers,
//! which have no wire form. Normalization turns every set into a list.

use crate::asset::AttributeTree;

/// Replace every set in `tree` with a list, recursively.
///
/// Set elements are ordered by their canonical JSON text so that repeated runs
/// over the same input produce the same output.
pub fn normalize(tree: &AttributeTree) -> AttributeTree {
    match tree {
        AttributeTree::List(items) => AttributeTree::List(items.iter().map(normalize).collect()),
        AttributeTree::Set(items) => {
            let mut keyed: Vec<(String, AttributeTree)> = items
                .iter()
                .map(normalize)
                .map(|item| (item.to_json().to_string(), item))
                .collect();
            keyed.sort_by(|a, b| a.0.cmp(&b.0));
            AttributeTree::List(keyed.into_iter().map(|(_, item)| item).collect())
        }
        AttributeTree::Map(map) => AttributeTree::Map(
            map.iter()
                .map(|(key, value)| (key.clone(), normalize(value)))
                .collect(),
        ),
        scalar => scalar.clone(),
    }
}
