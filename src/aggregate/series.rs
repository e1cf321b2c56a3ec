//! Multi-project "files changed" series aligned on shared day buckets.

use std::collections::BTreeMap;

use chrono::FixedOffset;
use serde::Serialize;

use crate::aggregate::bucket::{bucket_keys, entry_key, BucketKey};
use crate::models::{ActivityLogEntry, Project};

/// Number of projects charted in "all projects" mode.
pub const TOP_PROJECTS: usize = 5;

/// Series name used when a selected project is missing from the project list.
pub const FALLBACK_SERIES_NAME: &str = "Selected Project";

/// One project's activity log, as fetched for charting.
#[derive(Debug, Clone, Default)]
pub struct ProjectActivity {
    pub project_name: String,
    pub logs: Vec<ActivityLogEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesPoint {
    pub bucket: BucketKey,
    /// Files added plus modified in this bucket.
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivitySeries {
    pub project_name: String,
    pub points: Vec<SeriesPoint>,
}

impl ActivitySeries {
    #[must_use]
    pub fn total(&self) -> u64 {
        self.points.iter().map(|p| p.count).fold(0, u64::saturating_add)
    }
}

/// Chart-ready output: the shared bucket axis and one series per project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActivityChart {
    pub buckets: Vec<BucketKey>,
    pub series: Vec<ActivitySeries>,
}

impl ActivityChart {
    /// True when there is nothing to plot and a "no data" state should be shown.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Pick the projects charted in "all projects" mode: active ones only,
/// most files first, ties in list order, at most [`TOP_PROJECTS`].
#[must_use]
pub fn select_top_projects(projects: &[Project]) -> Vec<&Project> {
    let mut active: Vec<&Project> = projects.iter().filter(|p| p.active).collect();
    active.sort_by(|a, b| b.total_files.cmp(&a.total_files));
    active.truncate(TOP_PROJECTS);
    active
}

/// Build one series per project over the union of their day buckets.
///
/// Series keep input order; every series has one point per bucket, zero where
/// the project had no entry. Entries sharing a bucket are summed. With no
/// projects or no entries the chart is empty.
#[must_use]
pub fn build_series(projects: &[ProjectActivity], offset: FixedOffset) -> ActivityChart {
    let buckets = bucket_keys(projects.iter().flat_map(|p| &p.logs), offset);
    if buckets.is_empty() {
        return ActivityChart::default();
    }

    let series = projects
        .iter()
        .map(|project| {
            let mut per_bucket: BTreeMap<BucketKey, u64> = BTreeMap::new();
            for entry in &project.logs {
                if let Some(key) = entry_key(entry, offset) {
                    let slot = per_bucket.entry(key).or_insert(0);
                    *slot = slot.saturating_add(entry.changed_files());
                }
            }
            let points = buckets
                .iter()
                .map(|bucket| SeriesPoint {
                    bucket: bucket.clone(),
                    count: per_bucket.get(bucket).copied().unwrap_or(0),
                })
                .collect();
            ActivitySeries {
                project_name: project.project_name.clone(),
                points,
            }
        })
        .collect();

    ActivityChart { buckets, series }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::timestamp::utc_offset;

    fn log(ts: &str, added: u64, modified: u64) -> ActivityLogEntry {
        ActivityLogEntry {
            timestamp: ts.into(),
            files_added: added,
            files_modified: modified,
            ..Default::default()
        }
    }

    fn counts(s: &ActivitySeries) -> Vec<u64> {
        s.points.iter().map(|p| p.count).collect()
    }

    fn project(name: &str, total_files: u64, active: bool) -> Project {
        Project {
            name: name.into(),
            total_files,
            active,
            ..Default::default()
        }
    }

    #[test]
    fn two_projects_align_on_shared_days() {
        let p1 = ProjectActivity {
            project_name: "P1".into(),
            logs: vec![
                log("2024-06-01T10:00:00Z", 2, 1),
                log("2024-06-03T10:00:00Z", 0, 5),
            ],
        };
        let p2 = ProjectActivity {
            project_name: "P2".into(),
            logs: vec![log("2024-06-02T10:00:00Z", 4, 0)],
        };

        let chart = build_series(&[p1, p2], utc_offset());
        let days: Vec<&str> = chart.buckets.iter().map(BucketKey::as_str).collect();
        assert_eq!(days, ["2024-06-01", "2024-06-02", "2024-06-03"]);
        assert_eq!(chart.series[0].project_name, "P1");
        assert_eq!(counts(&chart.series[0]), [3, 0, 5]);
        assert_eq!(counts(&chart.series[1]), [0, 4, 0]);
    }

    #[test]
    fn same_bucket_entries_are_summed() {
        let p = ProjectActivity {
            project_name: "P".into(),
            logs: vec![
                log("2024-06-01T08:00:00Z", 1, 1),
                log("2024-06-01T18:00:00Z", 3, 0),
            ],
        };
        let chart = build_series(&[p], utc_offset());
        assert_eq!(counts(&chart.series[0]), [5]);
    }

    #[test]
    fn huge_counts_saturate_instead_of_overflowing() {
        let p = ProjectActivity {
            project_name: "P".into(),
            logs: vec![
                log("2024-06-01T08:00:00Z", u64::MAX, 1),
                log("2024-06-01T18:00:00Z", u64::MAX, u64::MAX),
            ],
        };
        let chart = build_series(&[p], utc_offset());
        assert_eq!(counts(&chart.series[0]), [u64::MAX]);
        assert_eq!(chart.series[0].total(), u64::MAX);
    }

    #[test]
    fn deletions_and_size_do_not_count() {
        let p = ProjectActivity {
            project_name: "P".into(),
            logs: vec![ActivityLogEntry {
                timestamp: "2024-06-01T08:00:00Z".into(),
                files_deleted: 9,
                size_change: -4096,
                ..Default::default()
            }],
        };
        let chart = build_series(&[p], utc_offset());
        assert_eq!(counts(&chart.series[0]), [0]);
    }

    #[test]
    fn series_lengths_match_and_totals_are_preserved() {
        let projects = vec![
            ProjectActivity {
                project_name: "A".into(),
                logs: vec![
                    log("2024-01-05T01:00:00Z", 3, 2),
                    log("2024-01-09T01:00:00Z", 1, 0),
                    log("2024-01-09T05:00:00Z", 0, 7),
                ],
            },
            ProjectActivity {
                project_name: "B".into(),
                logs: vec![log("2024-01-02T01:00:00Z", 10, 10)],
            },
            ProjectActivity {
                project_name: "C".into(),
                logs: vec![],
            },
        ];
        let chart = build_series(&projects, utc_offset());
        assert_eq!(chart.series.len(), 3);
        for (series, input) in chart.series.iter().zip(&projects) {
            assert_eq!(series.points.len(), chart.buckets.len());
            let expected: u64 = input.logs.iter().map(ActivityLogEntry::changed_files).sum();
            assert_eq!(series.total(), expected);
        }
        assert_eq!(counts(&chart.series[2]), [0, 0, 0]);
    }

    #[test]
    fn no_projects_or_no_entries_gives_empty_chart() {
        assert!(build_series(&[], utc_offset()).is_empty());
        let idle = ProjectActivity {
            project_name: "Idle".into(),
            logs: vec![],
        };
        let chart = build_series(&[idle], utc_offset());
        assert!(chart.is_empty());
        assert!(chart.buckets.is_empty());
    }

    #[test]
    fn top_projects_are_active_ranked_and_capped() {
        let projects = vec![
            project("a", 10, true),
            project("b", 50, true),
            project("c", 999, false),
            project("d", 10, true),
            project("e", 70, true),
            project("f", 5, true),
            project("g", 1, true),
        ];
        let top: Vec<&str> = select_top_projects(&projects)
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(top, ["e", "b", "a", "d", "f"]);
    }
}
