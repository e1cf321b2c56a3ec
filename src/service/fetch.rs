//! Concurrent activity fetch feeding the dashboard chart.

use chrono::FixedOffset;
use futures_util::future::try_join_all;

use crate::aggregate::{
    build_series, select_top_projects, ActivityChart, ProjectActivity, FALLBACK_SERIES_NAME,
};
use crate::error::{Result, TrackError};
use crate::models::Project;
use crate::service::{ActivityWindow, ProjectService};

/// Which projects the chart covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChartSelection {
    /// The most active projects, ranked by file count.
    #[default]
    AllProjects,
    Project(i64),
}

/// Fetch every selected project's activity window at once and build the chart.
///
/// `projects` is the caller's current project list; it supplies the top-5
/// ranking and series names. All fetches must succeed; the first failure is
/// returned as [`TrackError::IncompleteFetch`] naming the project, and no
/// chart is built.
pub async fn fetch_activity_chart<S: ProjectService>(
    service: &S,
    projects: &[Project],
    selection: ChartSelection,
    window: ActivityWindow,
    offset: FixedOffset,
) -> Result<ActivityChart> {
    let targets: Vec<(i64, String)> = match selection {
        ChartSelection::AllProjects => select_top_projects(projects)
            .into_iter()
            .map(|p| (p.id, p.name.clone()))
            .collect(),
        ChartSelection::Project(id) => {
            let name = projects
                .iter()
                .find(|p| p.id == id)
                .map_or_else(|| FALLBACK_SERIES_NAME.to_string(), |p| p.name.clone());
            vec![(id, name)]
        }
    };

    let fetches = targets.into_iter().map(|(id, name)| async move {
        tracing::debug!(project = id, days = window.days(), "fetching activity for {name}");
        match service.get_activity(id, window).await {
            Ok(report) => Ok(ProjectActivity {
                project_name: name,
                logs: report.logs,
            }),
            Err(e) => Err(TrackError::IncompleteFetch {
                project: name,
                source: Box::new(e),
            }),
        }
    });
    let activity = try_join_all(fetches).await?;

    Ok(build_series(&activity, offset))
}
