//! [`ProjectService`] over the local `SQLite` store and file system.

use chrono::{Duration, FixedOffset};

use crate::aggregate::summarize_activity;
use crate::clock::{to_wire, Clock};
use crate::config::ScanSettings;
use crate::db::Database;
use crate::error::{Result, TrackError};
use crate::models::{
    ActivityReport, FileRecord, NewCategory, NewProject, NewRoot, NewTask, Project, ProjectDetail,
    ProjectFilter, ProjectRoot, RootScanSummary, ScanAllSummary, ScanSummary, Task, TaskCategory,
    TaskComment, TaskDetail, TaskFilter, TaskUpdate,
};
use crate::scan::FolderMonitor;
use crate::service::{ActivityWindow, FileQuery, ProjectService, TaskService};

/// Number of entries returned with a project's detail.
const RECENT_ACTIVITY: usize = 5;

pub struct LocalService {
    db: Database,
    settings: ScanSettings,
    clock: Box<dyn Clock>,
    offset: FixedOffset,
}

impl LocalService {
    pub fn new(
        db: Database,
        settings: ScanSettings,
        clock: Box<dyn Clock>,
        offset: FixedOffset,
    ) -> Self {
        Self {
            db,
            settings,
            clock,
            offset,
        }
    }

    #[must_use]
    pub fn database(&self) -> &Database {
        &self.db
    }

    fn monitor(&self) -> FolderMonitor<'_> {
        FolderMonitor::new(&self.db, &self.settings, self.clock.as_ref())
    }

    fn project(&self, id: i64) -> Result<Project> {
        self.db
            .get_project(id)?
            .ok_or(TrackError::ProjectNotFound { id })
    }

    fn task(&self, id: i64) -> Result<Task> {
        self.db.get_task(id)?.ok_or(TrackError::TaskNotFound { id })
    }

    fn category(&self, id: i64) -> Result<TaskCategory> {
        self.db
            .get_category(id)?
            .ok_or(TrackError::CategoryNotFound { id })
    }
}

impl ProjectService for LocalService {
    async fn list_projects(&self, filter: &ProjectFilter) -> Result<Vec<Project>> {
        self.db.list_projects(filter)
    }

    async fn get_project(&self, id: i64) -> Result<ProjectDetail> {
        let project = self.project(id)?;
        let recent_activity = self.db.recent_activity(id, RECENT_ACTIVITY)?;
        Ok(ProjectDetail {
            project,
            recent_activity,
        })
    }

    async fn create_project(&self, new: &NewProject) -> Result<Project> {
        let created_at = to_wire(self.clock.now());
        let id = self.db.insert_project(new, false, &created_at)?;
        tracing::debug!(id, "created project {}", new.name);
        self.project(id)
    }

    async fn set_project_active(&self, id: i64, active: bool) -> Result<Project> {
        if !self.db.set_project_active(id, active)? {
            return Err(TrackError::ProjectNotFound { id });
        }
        self.project(id)
    }

    async fn delete_project(&self, id: i64) -> Result<()> {
        if !self.db.delete_project(id)? {
            return Err(TrackError::ProjectNotFound { id });
        }
        Ok(())
    }

    async fn get_activity(&self, id: i64, window: ActivityWindow) -> Result<ActivityReport> {
        self.project(id)?;
        let end = self.clock.now();
        let start = end - Duration::days(i64::from(window.days()));
        let (start, end) = (to_wire(start), to_wire(end));
        let logs = self.db.activity_between(id, &start, &end)?;
        let mut summary = summarize_activity(&logs, self.offset);
        summary.period_start = Some(start);
        summary.period_end = Some(end);
        tracing::debug!(project = id, days = window.days(), entries = logs.len(), "activity");
        Ok(ActivityReport {
            logs,
            summary: Some(summary),
        })
    }

    async fn list_files(&self, id: i64, query: &FileQuery) -> Result<Vec<FileRecord>> {
        self.project(id)?;
        self.db.search_files(id, query.filename_contains.as_deref())
    }

    async fn scan_project(&self, id: i64) -> Result<ScanSummary> {
        self.monitor().scan_project(id)
    }

    async fn list_roots(&self) -> Result<Vec<ProjectRoot>> {
        self.db.list_roots()
    }

    async fn create_root(&self, new: &NewRoot) -> Result<ProjectRoot> {
        let created_at = to_wire(self.clock.now());
        let id = self.db.insert_root(new, &created_at)?;
        self.db
            .get_root(id)?
            .ok_or(TrackError::RootNotFound { id })
    }

    async fn delete_root(&self, id: i64) -> Result<()> {
        if !self.db.delete_root(id)? {
            return Err(TrackError::RootNotFound { id });
        }
        Ok(())
    }

    async fn scan_root(&self, id: i64) -> Result<RootScanSummary> {
        self.monitor().scan_root(id)
    }

    async fn scan_all(&self) -> Result<ScanAllSummary> {
        self.monitor().scan_all()
    }
}

impl TaskService for LocalService {
    async fn list_categories(&self) -> Result<Vec<TaskCategory>> {
        self.db.list_categories()
    }

    async fn create_category(&self, new: &NewCategory) -> Result<TaskCategory> {
        new.validate()?;
        let id = self.db.insert_category(new)?;
        self.category(id)
    }

    async fn delete_category(&self, id: i64) -> Result<()> {
        if !self.db.delete_category(id)? {
            return Err(TrackError::CategoryNotFound { id });
        }
        Ok(())
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        self.db.list_tasks(filter)
    }

    async fn get_task(&self, id: i64) -> Result<TaskDetail> {
        let task = self.task(id)?;
        let category_details = match task.category {
            Some(category) => self.db.get_category(category)?,
            None => None,
        };
        let comments = self.db.comments_for_task(id, false)?;
        Ok(TaskDetail {
            task,
            category_details,
            comments,
        })
    }

    async fn create_task(&self, new: &NewTask) -> Result<Task> {
        let mut new = new.clone();
        new.validate()?;
        self.project(new.project)?;
        if let Some(category) = new.category {
            self.category(category)?;
        }
        let id = self.db.insert_task(&new, &to_wire(self.clock.now()))?;
        tracing::debug!(id, project = new.project, "created task {}", new.title);
        self.task(id)
    }

    async fn update_task(&self, id: i64, update: &TaskUpdate) -> Result<Task> {
        let mut update = update.clone();
        update.validate()?;
        let mut task = self.task(id)?;
        if let Some(Some(category)) = update.category {
            self.category(category)?;
        }
        update.apply(&mut task);
        self.db.update_task(&task, &to_wire(self.clock.now()))?;
        self.task(id)
    }

    async fn delete_task(&self, id: i64) -> Result<()> {
        if !self.db.delete_task(id)? {
            return Err(TrackError::TaskNotFound { id });
        }
        Ok(())
    }

    async fn add_comment(&self, task: i64, text: &str) -> Result<TaskComment> {
        if text.trim().is_empty() {
            return Err(TrackError::Invalid {
                field: "text",
                reason: "must not be empty".into(),
            });
        }
        self.task(task)?;
        let id = self
            .db
            .insert_comment(task, text.trim(), &to_wire(self.clock.now()))?;
        self.db
            .get_comment(id)?
            .ok_or_else(|| TrackError::Other(format!("comment {id} vanished after insert")))
    }

    async fn list_comments(&self, task: i64) -> Result<Vec<TaskComment>> {
        self.task(task)?;
        self.db.comments_for_task(task, true)
    }
}
