//! Local JSON mirror of a store subtree.

use serde_json::{Map, Value};

use super::path::StorePath;

pub fn get_at<'a>(root: &'a Value, path: &StorePath) -> Option<&'a Value> {
    let mut node = root;
    for segment in path.segments() {
        node = node.as_object()?.get(segment)?;
    }
    Some(node)
}

/// Replaces the node at `path`. `Null` deletes it, and any object left empty
/// along the way is pruned.
pub fn set_at(root: &mut Value, path: &StorePath, value: Value) {
    set_segments(root, path.segments(), value);
}

pub fn merge_at(root: &mut Value, path: &StorePath, children: Map<String, Value>) {
    for (key, value) in children {
        let mut child = path.segments().to_vec();
        child.extend(key.split('/').filter(|s| !s.is_empty()).map(str::to_string));
        set_segments(root, &child, value);
    }
}

fn set_segments(node: &mut Value, segments: &[String], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *node = prune(value);
        return;
    };

    if value.is_null() && !node.is_object() {
        return;
    }
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    let Value::Object(map) = node else {
        return;
    };

    let child = map.entry(head.to_string()).or_insert(Value::Null);
    set_segments(child, rest, value);

    if child.is_null() {
        map.remove(head);
    }
    if map.is_empty() {
        *node = Value::Null;
    }
}

fn prune(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let pruned = map
                .into_iter()
                .map(|(k, v)| (k, prune(v)))
                .filter(|(_, v)| !v.is_null())
                .collect::<Map<String, Value>>();
            if pruned.is_empty() {
                Value::Null
            } else {
                Value::Object(pruned)
            }
        }
        other => other,
    }
}
