use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{dispatch::Patch, message::ErrorEnvelope, path::DataPath};

/// Which counter error reports increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CounterScope {
    /// Each surface counts its own errors.
    #[default]
    Surface,
    /// One count shared by every surface in the engine.
    Process,
}

/// A monotonically increasing error counter. Clones share the count.
#[derive(Debug, Clone, Default)]
pub struct ErrorCounter {
    /// Shared count.
    count: Arc<AtomicU64>,
}

impl ErrorCounter {
    /// Construct a counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment and return the new value.
    pub fn increment(&self) -> u64 {
        self.count.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Current value.
    pub fn get(&self) -> u64 {
        self.count.load(Ordering::SeqCst)
    }
}

/// Compose the acknowledgement text for the `n`th error.
pub fn compose(n: u64, envelope: &ErrorEnvelope) -> String {
    let mut msg = format!(
        "Server received error #{n}: [{}] {}",
        envelope.code, envelope.message
    );
    if let Some(path) = &envelope.path {
        msg.push_str(&format!(" (path: {path})"));
    }
    msg
}

/// Lay a status value over the object already at the status location. Other
/// keys of that object are kept, so a status at the root leaves the rest of
/// the model alone. A missing or non-object value is replaced.
pub fn overlay(current: Option<&Value>, status: Value) -> Value {
    match (current, status) {
        (Some(Value::Object(existing)), Value::Object(fields)) => {
            let mut merged = existing.clone();
            merged.extend(fields);
            Value::Object(merged)
        }
        (_, status) => status,
    }
}

/// Where a surface publishes its error status.
///
/// The status fields `{"lastErrorMessage": ..., "errorCount": ...}` are
/// written at `path` in one frame, laid over whatever object is already
/// there.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorStatus {
    /// Location of the status object in the data model.
    pub path: DataPath,
}

impl ErrorStatus {
    /// Publish the status at `path`.
    pub fn at(path: impl Into<DataPath>) -> Self {
        Self { path: path.into() }
    }

    /// The status value before any error has been reported.
    pub fn initial(&self) -> Value {
        json!({
            "lastErrorMessage": "No errors reported yet.",
            "errorCount": 0,
        })
    }

    /// The patch publishing the `n`th error.
    pub fn patch(&self, n: u64, message: &str) -> Patch {
        Patch::new(
            self.path.clone(),
            json!({
                "lastErrorMessage": message,
                "errorCount": n,
            }),
        )
    }
}
