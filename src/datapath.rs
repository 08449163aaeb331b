//! Deep get/set/delete on a nested JSON document, addressed by
//! dot-separated paths (`"name.first"`).

use serde_json::{Map, Value};

/// Returns the value at `path`, or `None` if any segment is missing.
/// A missing path is never an error.
pub fn get<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |node, segment| node.get(segment))
}

/// Assigns `value` at `path`, creating intermediate objects as needed.
/// Non-object intermediates are replaced by empty objects.
pub fn set(doc: &mut Value, path: &str, value: Value) {
    let (parents, leaf) = split_leaf(path);
    let mut node = doc;
    if let Some(parents) = parents {
        for segment in parents.split('.') {
            node = child(node, segment);
        }
    }
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    if let Value::Object(map) = node {
        map.insert(leaf.to_string(), value);
    }
}

/// Removes the leaf at `path`. Returns false (without error) if the path
/// does not exist.
pub fn unset(doc: &mut Value, path: &str) -> bool {
    let (parents, leaf) = split_leaf(path);
    let mut node = doc;
    if let Some(parents) = parents {
        for segment in parents.split('.') {
            match node.get_mut(segment) {
                Some(next) => node = next,
                None => return false,
            }
        }
    }
    match node {
        Value::Object(map) => map.remove(leaf).is_some(),
        _ => false,
    }
}

fn split_leaf(path: &str) -> (Option<&str>, &str) {
    match path.rsplit_once('.') {
        Some((parents, leaf)) => (Some(parents), leaf),
        None => (None, path),
    }
}

fn child<'a>(node: &'a mut Value, segment: &str) -> &'a mut Value {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map
            .entry(segment.to_string())
            .or_insert(Value::Null),
        _ => unreachable!(),
    }
}
