use serde_json::{Map, Value};

use crate::{
    error::{Error, Result},
    path::DataPath,
};

/// Parse an array index segment, rejecting signs and leading zeros the way
/// JSON Pointer does.
fn array_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || (segment.len() > 1 && segment.starts_with('0')) {
        return None;
    }
    if !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

/// The data model store for a single surface.
///
/// Holds one JSON value. All mutation is whole-value replacement at a path;
/// intermediate containers are never created on the fly.
#[derive(Debug, Clone, PartialEq)]
pub struct DataModel {
    /// Current root value.
    root: Value,
}

impl Default for DataModel {
    fn default() -> Self {
        Self::new(Value::Object(Map::new()))
    }
}

impl DataModel {
    /// Construct a store holding the given root value.
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    /// The full current value.
    pub fn snapshot(&self) -> &Value {
        &self.root
    }

    /// Resolve a path against the current value.
    pub fn get(&self, path: &DataPath) -> Option<&Value> {
        let mut current = &self.root;
        for seg in path.segments() {
            current = match current {
                Value::Object(map) => map.get(seg)?,
                Value::Array(items) => items.get(array_index(seg)?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Resolve a path to a mutable slot.
    fn get_mut(&mut self, path: &DataPath) -> Option<&mut Value> {
        let mut current = &mut self.root;
        for seg in path.segments() {
            current = match current {
                Value::Object(map) => map.get_mut(seg)?,
                Value::Array(items) => items.get_mut(array_index(seg)?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// True if [`DataModel::set`] would succeed for `path`.
    pub fn can_set(&self, path: &DataPath) -> bool {
        let Some((parent, last)) = path.split_last() else {
            return true;
        };
        match self.get(&parent) {
            Some(Value::Object(_)) => true,
            Some(Value::Array(items)) => array_index(last).is_some_and(|i| i < items.len()),
            _ => false,
        }
    }

    /// Replace the value at `path`.
    ///
    /// The parent of `path` must already exist. If the parent is an object the
    /// final key is replaced or inserted; if it is an array the index must be
    /// in range. On failure the store is left untouched.
    pub fn set(&mut self, path: &DataPath, value: Value) -> Result<()> {
        let Some((parent, last)) = path.split_last() else {
            self.root = value;
            return Ok(());
        };
        let not_found = || Error::PathNotFound(path.to_string());
        match self.get_mut(&parent).ok_or_else(not_found)? {
            Value::Object(map) => {
                map.insert(last.to_string(), value);
                Ok(())
            }
            Value::Array(items) => {
                let slot = array_index(last)
                    .and_then(|i| items.get_mut(i))
                    .ok_or_else(not_found)?;
                *slot = value;
                Ok(())
            }
            _ => Err(not_found()),
        }
    }
}
