use serde::{Deserialize, Serialize};

/// The diff recorded by one scan that observed at least one change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityLogEntry {
    pub id: i64,
    pub project: i64,
    /// Scan time as sent on the wire. Parsed lazily; may be malformed.
    pub timestamp: String,
    pub files_added: u64,
    pub files_modified: u64,
    pub files_deleted: u64,
    /// Net byte delta; negative when the folder shrank.
    pub size_change: i64,
}

impl ActivityLogEntry {
    /// Files added plus modified: the "files changed" value plotted on charts.
    #[must_use]
    pub fn changed_files(&self) -> u64 {
        self.files_added.saturating_add(self.files_modified)
    }

    /// Every change the entry records, deletions included.
    #[must_use]
    pub fn total_changes(&self) -> u64 {
        self.changed_files().saturating_add(self.files_deleted)
    }
}

/// Totals over an activity window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivitySummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_end: Option<String>,
    pub total_added: u64,
    pub total_modified: u64,
    pub total_deleted: u64,
    pub net_size_change: i64,
    /// Distinct calendar days with at least one entry.
    pub active_days: u64,
}

/// Response of the activity query: entries oldest first plus their summary.
///
/// `logs` is required so that a body of another shape fails to parse
/// instead of reading as an empty window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityReport {
    pub logs: Vec<ActivityLogEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<ActivitySummary>,
}
