//! Dot-path access into a JSON object document.
//!
//! Shared by every store so that `"a.b"` means the same thing in memory
//! and on disk.

use crate::error::DeployError;
use serde_json::{Map, Value};

pub(crate) fn get<'a>(doc: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    let mut segments = key.split('.');
    let first = segments.next()?;
    let mut current = doc.get(first)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Missing parents are created. A parent that holds anything other than an
/// object is left alone and the write is refused.
pub(crate) fn set(
    doc: &mut Map<String, Value>,
    key: &str,
    value: Value,
) -> Result<(), DeployError> {
    let segments: Vec<&str> = key.split('.').collect();
    let Some((last, parents)) = segments.split_last() else {
        return Ok(());
    };

    let mut current = doc;
    for (depth, segment) in parents.iter().enumerate() {
        let slot = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        current = match slot {
            Value::Object(map) => map,
            other => {
                return Err(DeployError::CorruptRecord {
                    key: segments[..=depth].join("."),
                    reason: format!("expected an object, found {other}"),
                })
            }
        };
    }
    current.insert(last.to_string(), value);
    Ok(())
}

/// Parents left empty by the removal are pruned.
pub(crate) fn delete(doc: &mut Map<String, Value>, key: &str) -> bool {
    let segments: Vec<&str> = key.split('.').collect();
    delete_in(doc, &segments)
}

fn delete_in(map: &mut Map<String, Value>, segments: &[&str]) -> bool {
    match segments {
        [] => false,
        [last] => map.remove(*last).is_some(),
        [head, rest @ ..] => {
            let Some(Value::Object(child)) = map.get_mut(*head) else {
                return false;
            };
            let removed = delete_in(child, rest);
            if removed && child.is_empty() {
                map.remove(*head);
            }
            removed
        }
    }
}
