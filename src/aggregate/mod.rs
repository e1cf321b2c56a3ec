//! Pure aggregation over project, activity and file records.
//!
//! Nothing here performs I/O or keeps state between calls; every function
//! takes its inputs by reference and returns fresh values.

pub mod bucket;
pub mod classify;
pub mod drift;
pub mod level;
pub mod overview;
pub mod series;
pub mod table;
pub mod timestamp;

pub use bucket::{bucket_keys, day_key, BucketKey};
pub use classify::{classify, extension, FileCategory};
pub use drift::{reconcile, Reconciliation};
pub use level::{classify_total, classify_window, ActivityLevel};
pub use overview::{
    dashboard_stats, filter_projects, recent_discoveries, scans_due, summarize_activity,
    DashboardStats, StatusFilter,
};
pub use series::{
    build_series, select_top_projects, ActivityChart, ActivitySeries, ProjectActivity,
    SeriesPoint, FALLBACK_SERIES_NAME, TOP_PROJECTS,
};
pub use table::{file_table, sort_files, FileRow, FileTableQuery, SortDirection, SortField, SortState};
pub use timestamp::{display_offset, parse_instant, utc_offset};
