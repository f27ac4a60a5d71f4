//! Dotted-path addressing over JSON values.
//!
//! A path like `a.b.0.c` navigates nested objects and arrays: a segment that
//! is a non-negative integer indexes into an array, anything else looks up an
//! object key. Out-of-range indexes, missing keys, `null` values, and
//! non-container intermediates all resolve to "missing" rather than an error.

use serde_json::Value;

/// Extract the value at `path`, or `None` when any step is missing.
pub fn get_path<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }
    let mut current = data;
    for segment in path.split('.') {
        current = match current {
            Value::Array(items) => {
                let idx: usize = segment.parse().ok()?;
                items.get(idx)?
            }
            Value::Object(map) => map.get(segment)?,
            _ => return None,
        };
        if current.is_null() {
            return None;
        }
    }
    Some(current)
}

/// Mutable variant of [`get_path`], used to adjust counters in place.
pub fn get_path_mut<'a>(data: &'a mut Value, path: &str) -> Option<&'a mut Value> {
    if path.is_empty() {
        return None;
    }
    let mut current = data;
    for segment in path.split('.') {
        current = match current {
            Value::Array(items) => {
                let idx: usize = segment.parse().ok()?;
                items.get_mut(idx)?
            }
            Value::Object(map) => map.get_mut(segment)?,
            _ => return None,
        };
        if current.is_null() {
            return None;
        }
    }
    Some(current)
}

/// Set the value at `path`, creating intermediate objects as needed.
///
/// Intermediate segments that are missing or not objects are replaced with
/// fresh objects. An empty path is a no-op.
pub fn set_path(data: &mut Value, path: &str, value: Value) {
    if path.is_empty() {
        return;
    }
    let segments: Vec<&str> = path.split('.').collect();
    let mut current = data;
    for segment in &segments[..segments.len() - 1] {
        if !current.is_object() {
            *current = Value::Object(serde_json::Map::new());
        }
        let map = current.as_object_mut().expect("coerced to object above");
        current = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
        if !current.is_object() {
            *current = Value::Object(serde_json::Map::new());
        }
    }
    if !current.is_object() {
        *current = Value::Object(serde_json::Map::new());
    }
    current
        .as_object_mut()
        .expect("coerced to object above")
        .insert(segments[segments.len() - 1].to_string(), value);
}
