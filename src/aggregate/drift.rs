//! Consistency check between a project's snapshot totals and its history.
//!
//! A project stores `total_files`/`total_size` as of the last scan, a file
//! inventory, and an append-only log of per-scan deltas. All three describe
//! the same folder, so they must agree when nothing was lost. This module only
//! reports disagreement; it never corrects anything.

use serde::Serialize;

use crate::models::{ActivityLogEntry, FileRecord, Project};

/// Side-by-side totals with the drift of each derived figure from the snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    pub project_id: i64,
    pub snapshot_files: u64,
    pub snapshot_size: u64,
    pub inventory_files: u64,
    pub inventory_size: u64,
    /// `Σ added − Σ deleted` over the complete log.
    pub log_files: i64,
    /// `Σ size_change` over the complete log.
    pub log_size: i64,
    pub inventory_files_drift: i64,
    pub inventory_size_drift: i64,
    pub log_files_drift: i64,
    pub log_size_drift: i64,
    pub consistent: bool,
}

fn signed(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

/// Compare `project`'s totals with its inventory and its complete delta log.
///
/// Drifts are `derived − snapshot`; zero everywhere means consistent.
#[must_use]
pub fn reconcile(project: &Project, files: &[FileRecord], full_log: &[ActivityLogEntry]) -> Reconciliation {
    let inventory_files = files.len() as u64;
    let inventory_size = files.iter().map(|f| f.size).fold(0, u64::saturating_add);

    let log_files = full_log
        .iter()
        .map(|e| signed(e.files_added).saturating_sub(signed(e.files_deleted)))
        .fold(0, i64::saturating_add);
    let log_size = full_log
        .iter()
        .map(|e| e.size_change)
        .fold(0, i64::saturating_add);

    let snapshot_files = signed(project.total_files);
    let snapshot_size = signed(project.total_size);

    let inventory_files_drift = signed(inventory_files).saturating_sub(snapshot_files);
    let inventory_size_drift = signed(inventory_size).saturating_sub(snapshot_size);
    let log_files_drift = log_files.saturating_sub(snapshot_files);
    let log_size_drift = log_size.saturating_sub(snapshot_size);

    Reconciliation {
        project_id: project.id,
        snapshot_files: project.total_files,
        snapshot_size: project.total_size,
        inventory_files,
        inventory_size,
        log_files,
        log_size,
        inventory_files_drift,
        inventory_size_drift,
        log_files_drift,
        log_size_drift,
        consistent: inventory_files_drift == 0
            && inventory_size_drift == 0
            && log_files_drift == 0
            && log_size_drift == 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(added: u64, deleted: u64, size_change: i64) -> ActivityLogEntry {
        ActivityLogEntry {
            files_added: added,
            files_deleted: deleted,
            size_change,
            ..Default::default()
        }
    }

    fn files(sizes: &[u64]) -> Vec<FileRecord> {
        sizes
            .iter()
            .enumerate()
            .map(|(i, s)| FileRecord::new(format!("f{i}"), format!("f{i}"), *s, String::new()))
            .collect()
    }

    #[test]
    fn matching_history_is_consistent() {
        let project = Project {
            id: 4,
            total_files: 2,
            total_size: 300,
            ..Default::default()
        };
        let log = vec![entry(3, 0, 500), entry(0, 1, -200)];
        let r = reconcile(&project, &files(&[100, 200]), &log);
        assert!(r.consistent);
        assert_eq!(r.log_files, 2);
        assert_eq!(r.log_size, 300);
    }

    #[test]
    fn lost_log_entry_is_reported() {
        let project = Project {
            total_files: 2,
            total_size: 300,
            ..Default::default()
        };
        let log = vec![entry(3, 0, 500)];
        let r = reconcile(&project, &files(&[100, 200]), &log);
        assert!(!r.consistent);
        assert_eq!(r.log_files_drift, 1);
        assert_eq!(r.log_size_drift, 200);
        assert_eq!(r.inventory_files_drift, 0);
    }

    #[test]
    fn stale_snapshot_is_reported() {
        let project = Project {
            total_files: 5,
            total_size: 0,
            ..Default::default()
        };
        let r = reconcile(&project, &files(&[10]), &[entry(1, 0, 10)]);
        assert_eq!(r.inventory_files_drift, -4);
        assert_eq!(r.inventory_size_drift, 10);
        assert!(!r.consistent);
    }
}
