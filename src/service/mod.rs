//! The tracking service boundary.
//!
//! Everything above this module works on plain records; everything below
//! talks to either the local store or a remote REST service.

pub mod fetch;
pub mod http;
pub mod local;

use crate::error::{Result, TrackError};
use crate::models::{
    ActivityReport, FileRecord, NewCategory, NewProject, NewRoot, NewTask, Project, ProjectDetail,
    ProjectFilter, ProjectRoot, RootScanSummary, ScanAllSummary, ScanSummary, Task, TaskCategory,
    TaskComment, TaskDetail, TaskFilter, TaskUpdate,
};

pub use fetch::{fetch_activity_chart, ChartSelection};
pub use http::HttpService;
pub use local::LocalService;

/// Activity lookback window offered by the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActivityWindow {
    Week,
    #[default]
    Month,
    Quarter,
}

impl ActivityWindow {
    #[must_use]
    pub fn days(self) -> u32 {
        match self {
            Self::Week => 7,
            Self::Month => 30,
            Self::Quarter => 90,
        }
    }

    pub fn from_days(days: u32) -> Result<Self> {
        match days {
            7 => Ok(Self::Week),
            30 => Ok(Self::Month),
            90 => Ok(Self::Quarter),
            _ => Err(TrackError::InvalidWindow { days }),
        }
    }
}

/// Server-side file listing filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileQuery {
    /// Case-insensitive substring of the filename.
    pub filename_contains: Option<String>,
}

/// Operations the tracker needs from a project store.
#[allow(async_fn_in_trait)]
pub trait ProjectService {
    async fn list_projects(&self, filter: &ProjectFilter) -> Result<Vec<Project>>;

    /// A project with its five most recent activity entries.
    async fn get_project(&self, id: i64) -> Result<ProjectDetail>;

    async fn create_project(&self, new: &NewProject) -> Result<Project>;

    async fn set_project_active(&self, id: i64, active: bool) -> Result<Project>;

    async fn delete_project(&self, id: i64) -> Result<()>;

    /// Entries inside the window, oldest first, with their summary.
    async fn get_activity(&self, id: i64, window: ActivityWindow) -> Result<ActivityReport>;

    async fn list_files(&self, id: i64, query: &FileQuery) -> Result<Vec<FileRecord>>;

    async fn scan_project(&self, id: i64) -> Result<ScanSummary>;

    async fn list_roots(&self) -> Result<Vec<ProjectRoot>>;

    async fn create_root(&self, new: &NewRoot) -> Result<ProjectRoot>;

    async fn delete_root(&self, id: i64) -> Result<()>;

    async fn scan_root(&self, id: i64) -> Result<RootScanSummary>;

    async fn scan_all(&self) -> Result<ScanAllSummary>;
}

/// Task management attached to projects.
#[allow(async_fn_in_trait)]
pub trait TaskService {
    async fn list_categories(&self) -> Result<Vec<TaskCategory>>;

    async fn create_category(&self, new: &NewCategory) -> Result<TaskCategory>;

    /// Tasks of the category become uncategorized.
    async fn delete_category(&self, id: i64) -> Result<()>;

    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>>;

    /// A task with its category and comments, oldest comment first.
    async fn get_task(&self, id: i64) -> Result<TaskDetail>;

    async fn create_task(&self, new: &NewTask) -> Result<Task>;

    async fn update_task(&self, id: i64, update: &TaskUpdate) -> Result<Task>;

    async fn delete_task(&self, id: i64) -> Result<()>;

    async fn add_comment(&self, task: i64, text: &str) -> Result<TaskComment>;

    /// Comments on a task, newest first.
    async fn list_comments(&self, task: i64) -> Result<Vec<TaskComment>>;
}

/// The service selected at start-up.
pub enum Backend {
    Local(LocalService),
    Remote(HttpService),
}

macro_rules! delegate {
    ($self:ident, $svc:ident => $call:expr) => {
        match $self {
            Backend::Local($svc) => $call.await,
            Backend::Remote($svc) => $call.await,
        }
    };
}

impl ProjectService for Backend {
    async fn list_projects(&self, filter: &ProjectFilter) -> Result<Vec<Project>> {
        delegate!(self, s => s.list_projects(filter))
    }

    async fn get_project(&self, id: i64) -> Result<ProjectDetail> {
        delegate!(self, s => s.get_project(id))
    }

    async fn create_project(&self, new: &NewProject) -> Result<Project> {
        delegate!(self, s => s.create_project(new))
    }

    async fn set_project_active(&self, id: i64, active: bool) -> Result<Project> {
        delegate!(self, s => s.set_project_active(id, active))
    }

    async fn delete_project(&self, id: i64) -> Result<()> {
        delegate!(self, s => s.delete_project(id))
    }

    async fn get_activity(&self, id: i64, window: ActivityWindow) -> Result<ActivityReport> {
        delegate!(self, s => s.get_activity(id, window))
    }

    async fn list_files(&self, id: i64, query: &FileQuery) -> Result<Vec<FileRecord>> {
        delegate!(self, s => s.list_files(id, query))
    }

    async fn scan_project(&self, id: i64) -> Result<ScanSummary> {
        delegate!(self, s => s.scan_project(id))
    }

    async fn list_roots(&self) -> Result<Vec<ProjectRoot>> {
        delegate!(self, s => s.list_roots())
    }

    async fn create_root(&self, new: &NewRoot) -> Result<ProjectRoot> {
        delegate!(self, s => s.create_root(new))
    }

    async fn delete_root(&self, id: i64) -> Result<()> {
        delegate!(self, s => s.delete_root(id))
    }

    async fn scan_root(&self, id: i64) -> Result<RootScanSummary> {
        delegate!(self, s => s.scan_root(id))
    }

    async fn scan_all(&self) -> Result<ScanAllSummary> {
        delegate!(self, s => s.scan_all())
    }
}

impl TaskService for Backend {
    async fn list_categories(&self) -> Result<Vec<TaskCategory>> {
        delegate!(self, s => s.list_categories())
    }

    async fn create_category(&self, new: &NewCategory) -> Result<TaskCategory> {
        delegate!(self, s => s.create_category(new))
    }

    async fn delete_category(&self, id: i64) -> Result<()> {
        delegate!(self, s => s.delete_category(id))
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        delegate!(self, s => s.list_tasks(filter))
    }

    async fn get_task(&self, id: i64) -> Result<TaskDetail> {
        delegate!(self, s => s.get_task(id))
    }

    async fn create_task(&self, new: &NewTask) -> Result<Task> {
        delegate!(self, s => s.create_task(new))
    }

    async fn update_task(&self, id: i64, update: &TaskUpdate) -> Result<Task> {
        delegate!(self, s => s.update_task(id, update))
    }

    async fn delete_task(&self, id: i64) -> Result<()> {
        delegate!(self, s => s.delete_task(id))
    }

    async fn add_comment(&self, task: i64, text: &str) -> Result<TaskComment> {
        delegate!(self, s => s.add_comment(task, text))
    }

    async fn list_comments(&self, task: i64) -> Result<Vec<TaskComment>> {
        delegate!(self, s => s.list_comments(task))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_from_days() {
        assert_eq!(ActivityWindow::from_days(7).unwrap(), ActivityWindow::Week);
        assert_eq!(ActivityWindow::from_days(90).unwrap().days(), 90);
        assert!(matches!(
            ActivityWindow::from_days(14),
            Err(TrackError::InvalidWindow { days: 14 })
        ));
        assert_eq!(ActivityWindow::default().days(), 30);
    }
}
