//! Execution results keyed by snippet id
//!
//! [`ExecutionTable`] is the single-writer store behind
//! [`SnippetEngine`](crate::engine::SnippetEngine): entries are created lazily
//! on the first run of an id, overwritten by every later run of the same id,
//! and only ever removed all at once by [`ExecutionTable::clear`].

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::SystemTime;

/// Lifecycle state of a snippet's most recent run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    #[default]
    Idle,
    Running,
    Succeeded,
    Failed,
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExecutionStatus::Idle => "idle",
            ExecutionStatus::Running => "running",
            ExecutionStatus::Succeeded => "succeeded",
            ExecutionStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// What a single evaluation produced, before it is published in the table
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecutionOutcome {
    /// One entry per console call
    pub output_lines: Vec<String>,
    /// Present exactly when the run threw
    pub error_message: Option<String>,
}

impl ExecutionOutcome {
    pub fn succeeded(&self) -> bool {
        self.error_message.is_none()
    }

    pub fn status(&self) -> ExecutionStatus {
        if self.succeeded() {
            ExecutionStatus::Succeeded
        } else {
            ExecutionStatus::Failed
        }
    }
}

/// Result record for one snippet id
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub status: ExecutionStatus,
    pub output_lines: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, with = "epoch_millis")]
    pub started_at: Option<SystemTime>,
    #[serde(default, with = "epoch_millis")]
    pub finished_at: Option<SystemTime>,
}

/// Mapping from snippet id to its latest result
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ExecutionTable {
    results: FxHashMap<String, ExecutionResult>,
}

impl ExecutionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, snippet_id: &str) -> Option<&ExecutionResult> {
        self.results.get(snippet_id)
    }

    pub fn contains(&self, snippet_id: &str) -> bool {
        self.results.contains_key(snippet_id)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ExecutionResult)> {
        self.results.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Mark `snippet_id` as running, discarding the output of any previous run
    pub(crate) fn begin(&mut self, snippet_id: &str) {
        let entry = self.results.entry(snippet_id.to_string()).or_default();
        entry.status = ExecutionStatus::Running;
        entry.output_lines.clear();
        entry.error_message = None;
        entry.started_at = Some(SystemTime::now());
        entry.finished_at = None;
    }

    /// Publish the outcome of the run started by [`ExecutionTable::begin`]
    pub(crate) fn finish(&mut self, snippet_id: &str, outcome: ExecutionOutcome) -> &ExecutionResult {
        let entry = self.results.entry(snippet_id.to_string()).or_default();
        entry.status = outcome.status();
        entry.output_lines = outcome.output_lines;
        entry.error_message = outcome.error_message;
        entry.finished_at = Some(SystemTime::now());
        entry
    }

    /// Drop every result
    pub(crate) fn clear(&mut self) {
        self.results.clear();
    }
}

/// Serialize optional timestamps as milliseconds since the Unix epoch
mod epoch_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    pub fn serialize<S>(time: &Option<SystemTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match time {
            Some(t) => {
                let millis = t
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_millis() as u64)
                    .unwrap_or(0);
                serializer.serialize_some(&millis)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<SystemTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = Option::<u64>::deserialize(deserializer)?;
        Ok(millis.map(|ms| UNIX_EPOCH + Duration::from_millis(ms)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(lines: &[&str], error: Option<&str>) -> ExecutionOutcome {
        ExecutionOutcome {
            output_lines: lines.iter().map(|s| s.to_string()).collect(),
            error_message: error.map(str::to_string),
        }
    }

    #[test]
    fn test_entries_are_created_lazily() {
        let mut table = ExecutionTable::new();
        assert!(table.get("intro").is_none());

        table.begin("intro");
        assert_eq!(table.get("intro").map(|r| r.status), Some(ExecutionStatus::Running));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_last_write_wins() {
        let mut table = ExecutionTable::new();
        table.begin("a");
        table.finish("a", outcome(&["first"], None));
        table.begin("a");
        assert!(table.get("a").unwrap().output_lines.is_empty());
        table.finish("a", outcome(&["second"], Some("Error: boom")));

        let result = table.get("a").unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(result.status, ExecutionStatus::Failed);
        assert_eq!(result.output_lines, vec!["second"]);
        assert_eq!(result.error_message.as_deref(), Some("Error: boom"));
        assert!(result.finished_at >= result.started_at);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut table = ExecutionTable::new();
        table.begin("a");
        table.finish("a", outcome(&[], None));
        table.begin("b");
        table.finish("b", outcome(&[], None));
        table.clear();
        assert!(table.is_empty());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&ExecutionStatus::Succeeded).unwrap();
        assert_eq!(json, "\"succeeded\"");
    }

    #[test]
    fn test_result_json_shape() {
        let result = ExecutionResult {
            status: ExecutionStatus::Succeeded,
            output_lines: vec!["[1, 2, 3]".to_string()],
            error_message: None,
            started_at: Some(std::time::UNIX_EPOCH + std::time::Duration::from_millis(1500)),
            finished_at: None,
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["status"], "succeeded");
        assert_eq!(value["output_lines"][0], "[1, 2, 3]");
        assert_eq!(value["started_at"], 1500);
        assert!(value["finished_at"].is_null());
        assert!(value.get("error_message").is_none());
    }
}
