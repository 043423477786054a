//! # Opaque workflow specification document.
//!
//! [`WorkflowSpec`] wraps the caller-supplied specification as an opaque
//! structured document with explicit, typed accessors. Consumers never index
//! into the raw map; a malformed document surfaces as a `None`/empty result
//! from an accessor instead of a runtime key error.
//!
//! ## Recognized structure
//! ```json
//! {
//!   "workspace": { "retention_days": { "**/*.root": 30 } },
//!   "inputs":    { "files": ["data.csv"],
//!                  "options": { "toplevel": "workflow.yaml" } }
//! }
//! ```
//! Everything else in the document is carried untouched for the execution
//! layer.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque workflow specification with typed accessors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowSpec {
    doc: Value,
}

impl WorkflowSpec {
    /// Wraps a raw specification document.
    pub fn new(doc: Value) -> Self {
        Self { doc }
    }

    /// An empty specification (no retention settings, no inputs).
    pub fn empty() -> Self {
        Self {
            doc: Value::Object(serde_json::Map::new()),
        }
    }

    /// Borrow the underlying document.
    pub fn as_value(&self) -> &Value {
        &self.doc
    }

    /// Declared workspace retention settings: `(pattern, days)` pairs from
    /// `workspace.retention_days`.
    ///
    /// Entries whose day count is not an integer fitting in `u32` are
    /// skipped. Range validation is the resolver's job; this only extracts
    /// usable numbers.
    pub fn retention_days(&self) -> Vec<(String, u32)> {
        self.doc
            .get("workspace")
            .and_then(|w| w.get("retention_days"))
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .filter_map(|(pattern, days)| {
                        days.as_u64()
                            .and_then(|d| u32::try_from(d).ok())
                            .map(|d| (pattern.clone(), d))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Declared input files: `inputs.files`.
    pub fn inputs_files(&self) -> Vec<String> {
        self.doc
            .get("inputs")
            .and_then(|i| i.get("files"))
            .and_then(Value::as_array)
            .map(|files| {
                files
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Operator-facing execution options: `inputs.options`.
    ///
    /// Forwarded verbatim to the execution layer; a missing or non-object
    /// section yields the empty map.
    pub fn operational_options(&self) -> serde_json::Map<String, Value> {
        self.doc
            .get("inputs")
            .and_then(|i| i.get("options"))
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default()
    }
}
