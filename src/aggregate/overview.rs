//! Dashboard headline figures and project list filtering.

use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::Serialize;

use crate::aggregate::bucket::bucket_keys;
use crate::aggregate::timestamp::parse_instant;
use crate::models::{ActivityLogEntry, ActivitySummary, Project};

/// Maximum number of entries in the "newly discovered" panel.
pub const RECENT_DISCOVERIES: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_projects: u64,
    pub active_projects: u64,
    pub total_files: u64,
    pub total_size: u64,
    /// Rounded share of active projects; absent when there are none at all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_percent: Option<u64>,
}

/// Headline figures over every project, active or not.
#[must_use]
pub fn dashboard_stats(projects: &[Project]) -> DashboardStats {
    let total_projects = projects.len() as u64;
    let active_projects = projects.iter().filter(|p| p.active).count() as u64;
    let active_percent = (total_projects > 0)
        .then(|| (active_projects * 100 + total_projects / 2) / total_projects);
    DashboardStats {
        total_projects,
        active_projects,
        total_files: projects.iter().map(|p| p.total_files).fold(0, u64::saturating_add),
        total_size: projects.iter().map(|p| p.total_size).fold(0, u64::saturating_add),
        active_percent,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Inactive,
}

impl StatusFilter {
    fn admits(self, project: &Project) -> bool {
        match self {
            Self::All => true,
            Self::Active => project.active,
            Self::Inactive => !project.active,
        }
    }
}

/// Projects passing the status filter whose name or folder contains `search`,
/// ignoring case. An empty search matches everything.
#[must_use]
pub fn filter_projects<'a>(
    projects: &'a [Project],
    status: StatusFilter,
    search: &str,
) -> Vec<&'a Project> {
    let needle = search.trim().to_lowercase();
    projects
        .iter()
        .filter(|p| status.admits(p))
        .filter(|p| {
            needle.is_empty()
                || p.name.to_lowercase().contains(&needle)
                || p.folder_path.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Active auto-discovered projects, newest first, capped at [`RECENT_DISCOVERIES`].
#[must_use]
pub fn recent_discoveries(projects: &[Project]) -> Vec<&Project> {
    let created = |p: &Project| -> Option<DateTime<Utc>> { parse_instant(&p.created_at).ok() };
    let mut found: Vec<&Project> = projects
        .iter()
        .filter(|p| p.active && p.is_auto_discovered)
        .collect();
    found.sort_by(|a, b| created(b).cmp(&created(a)));
    found.truncate(RECENT_DISCOVERIES);
    found
}

/// Active projects never scanned, or last scanned `interval` or longer before `now`.
///
/// An unparseable `last_scan` counts as never scanned.
#[must_use]
pub fn scans_due(projects: &[Project], now: DateTime<Utc>, interval: Duration) -> Vec<&Project> {
    projects
        .iter()
        .filter(|p| p.active)
        .filter(|p| {
            p.last_scan
                .as_deref()
                .and_then(|raw| parse_instant(raw).ok())
                .is_none_or(|last| now - last >= interval)
        })
        .collect()
}

/// Totals over a window of entries plus the number of distinct active days.
#[must_use]
pub fn summarize_activity(logs: &[ActivityLogEntry], offset: FixedOffset) -> ActivitySummary {
    ActivitySummary {
        period_start: None,
        period_end: None,
        total_added: logs.iter().map(|l| l.files_added).fold(0, u64::saturating_add),
        total_modified: logs.iter().map(|l| l.files_modified).fold(0, u64::saturating_add),
        total_deleted: logs.iter().map(|l| l.files_deleted).fold(0, u64::saturating_add),
        net_size_change: logs.iter().map(|l| l.size_change).fold(0, i64::saturating_add),
        active_days: bucket_keys(logs, offset).len() as u64,
    }
}
