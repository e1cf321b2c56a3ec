use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Changes observed by one folder scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSummary {
    pub files_added: u64,
    pub files_modified: u64,
    pub files_deleted: u64,
    pub size_change: i64,
}

impl ScanSummary {
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.files_added > 0 || self.files_modified > 0 || self.files_deleted > 0
    }
}

/// Outcome of project discovery under one projects root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RootScanSummary {
    pub new_projects: u64,
    pub removed_projects: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A project whose scan failed during a scan-all run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanError {
    pub project: String,
    pub error: String,
}

/// Discovery over every root followed by a scan of every active project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanAllSummary {
    /// Discovery results keyed by root name.
    pub discovery: BTreeMap<String, RootScanSummary>,
    pub total_projects: u64,
    pub scanned_projects: u64,
    pub total_files_added: u64,
    pub total_files_modified: u64,
    pub total_files_deleted: u64,
    pub total_size_change: i64,
    /// Grand totals over active projects after all scans.
    pub total_files: u64,
    pub total_size: u64,
    pub errors: Vec<ScanError>,
}

impl ScanAllSummary {
    /// Fold one project's scan into the running totals.
    pub fn record(&mut self, scan: &ScanSummary) {
        self.scanned_projects += 1;
        self.total_files_added = self.total_files_added.saturating_add(scan.files_added);
        self.total_files_modified = self.total_files_modified.saturating_add(scan.files_modified);
        self.total_files_deleted = self.total_files_deleted.saturating_add(scan.files_deleted);
        self.total_size_change = self.total_size_change.saturating_add(scan.size_change);
    }
}
