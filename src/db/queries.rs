use rusqlite::{params, Row};

use crate::error::Result;
use crate::models::{
    ActivityLogEntry, FileRecord, NewCategory, NewProject, NewRoot, NewTask, Project,
    ProjectFilter, ProjectRoot, ScanSummary, Task, TaskCategory, TaskComment, TaskFilter,
    TaskPriority, TaskStatus,
};

use super::Database;

const ROOT_COLUMNS: &str = "id, name, path, auto_discover, last_scan, created_at";
const PROJECT_COLUMNS: &str = "id, name, folder_path, root_id, is_auto_discovered, active, \
                               total_files, total_size, last_scan, created_at";
const FILE_COLUMNS: &str = "id, project_id, path, filename, size, last_modified, file_hash";
const ACTIVITY_COLUMNS: &str =
    "id, project_id, timestamp, files_added, files_modified, files_deleted, size_change";
const CATEGORY_COLUMNS: &str = "id, name, description, color";
const TASK_COLUMNS: &str = "id, title, description, project_id, category_id, status, priority, \
                            due_date, created_at, updated_at";
const COMMENT_COLUMNS: &str = "id, task_id, text, created_at, updated_at";

fn root_from_row(row: &Row<'_>) -> rusqlite::Result<ProjectRoot> {
    Ok(ProjectRoot {
        id: row.get(0)?,
        name: row.get(1)?,
        path: row.get(2)?,
        auto_discover: row.get(3)?,
        last_scan: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        folder_path: row.get(2)?,
        root: row.get(3)?,
        is_auto_discovered: row.get(4)?,
        active: row.get(5)?,
        total_files: row.get::<_, i64>(6)? as u64,
        total_size: row.get::<_, i64>(7)? as u64,
        last_scan: row.get(8)?,
        created_at: row.get(9)?,
    })
}

fn file_from_row(row: &Row<'_>) -> rusqlite::Result<FileRecord> {
    Ok(FileRecord {
        id: row.get(0)?,
        project: row.get(1)?,
        path: row.get(2)?,
        filename: row.get(3)?,
        size: row.get::<_, i64>(4)? as u64,
        last_modified: row.get(5)?,
        file_hash: row.get(6)?,
    })
}

fn activity_from_row(row: &Row<'_>) -> rusqlite::Result<ActivityLogEntry> {
    Ok(ActivityLogEntry {
        id: row.get(0)?,
        project: row.get(1)?,
        timestamp: row.get(2)?,
        files_added: row.get::<_, i64>(3)? as u64,
        files_modified: row.get::<_, i64>(4)? as u64,
        files_deleted: row.get::<_, i64>(5)? as u64,
        size_change: row.get(6)?,
    })
}

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<TaskCategory> {
    Ok(TaskCategory {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        color: row.get(3)?,
    })
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    let status: String = row.get(5)?;
    let priority: String = row.get(6)?;
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        project: row.get(3)?,
        category: row.get(4)?,
        status: TaskStatus::parse(&status).unwrap_or_default(),
        priority: TaskPriority::parse(&priority).unwrap_or_default(),
        due_date: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<TaskComment> {
    Ok(TaskComment {
        id: row.get(0)?,
        task: row.get(1)?,
        text: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

impl Database {
    // ─── Root operations ───

    /// Insert a projects root. Returns the row ID.
    pub fn insert_root(&self, root: &NewRoot, created_at: &str) -> Result<i64> {
        self.conn().execute(
            "INSERT INTO project_roots (name, path, auto_discover, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![root.name, root.path, root.auto_discover, created_at],
        )?;
        Ok(self.conn().last_insert_rowid())
    }

    /// Get a root by ID.
    pub fn get_root(&self, id: i64) -> Result<Option<ProjectRoot>> {
        let sql = format!("SELECT {ROOT_COLUMNS} FROM project_roots WHERE id = ?1");
        let mut stmt = self.conn().prepare(&sql)?;
        let mut rows = stmt.query_map(params![id], root_from_row)?;
        match rows.next() {
            Some(r) => Ok(Some(r?)),
            None => Ok(None),
        }
    }

    /// Get all roots, oldest first.
    pub fn list_roots(&self) -> Result<Vec<ProjectRoot>> {
        let sql = format!("SELECT {ROOT_COLUMNS} FROM project_roots ORDER BY id");
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map([], root_from_row)?;
        let mut roots = Vec::new();
        for r in rows {
            roots.push(r?);
        }
        Ok(roots)
    }

    /// Delete a root. Its projects stay, detached. Returns whether a row was removed.
    pub fn delete_root(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM project_roots WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    pub fn set_root_last_scan(&self, id: i64, last_scan: &str) -> Result<()> {
        self.conn().execute(
            "UPDATE project_roots SET last_scan = ?1 WHERE id = ?2",
            params![last_scan, id],
        )?;
        Ok(())
    }

    // ─── Project operations ───

    /// Insert a project. Returns the row ID.
    pub fn insert_project(
        &self,
        project: &NewProject,
        is_auto_discovered: bool,
        created_at: &str,
    ) -> Result<i64> {
        self.conn().execute(
            "INSERT INTO projects (name, folder_path, root_id, is_auto_discovered, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                project.name,
                project.folder_path,
                project.root,
                is_auto_discovered,
                created_at
            ],
        )?;
        Ok(self.conn().last_insert_rowid())
    }

    /// Get a project by ID.
    pub fn get_project(&self, id: i64) -> Result<Option<Project>> {
        let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1");
        let mut stmt = self.conn().prepare(&sql)?;
        let mut rows = stmt.query_map(params![id], project_from_row)?;
        match rows.next() {
            Some(r) => Ok(Some(r?)),
            None => Ok(None),
        }
    }

    /// Get a project by its folder path.
    pub fn get_project_by_path(&self, folder_path: &str) -> Result<Option<Project>> {
        let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE folder_path = ?1");
        let mut stmt = self.conn().prepare(&sql)?;
        let mut rows = stmt.query_map(params![folder_path], project_from_row)?;
        match rows.next() {
            Some(r) => Ok(Some(r?)),
            None => Ok(None),
        }
    }

    /// List projects matching `filter`, in creation order.
    pub fn list_projects(&self, filter: &ProjectFilter) -> Result<Vec<Project>> {
        let sql = format!(
            "SELECT {PROJECT_COLUMNS} FROM projects
             WHERE (?1 IS NULL OR active = ?1) AND (?2 IS NULL OR is_auto_discovered = ?2)
             ORDER BY id"
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(
            params![filter.active, filter.is_auto_discovered],
            project_from_row,
        )?;
        let mut projects = Vec::new();
        for r in rows {
            projects.push(r?);
        }
        Ok(projects)
    }

    /// Projects belonging to a root.
    pub fn projects_for_root(&self, root_id: i64) -> Result<Vec<Project>> {
        let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE root_id = ?1 ORDER BY id");
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(params![root_id], project_from_row)?;
        let mut projects = Vec::new();
        for r in rows {
            projects.push(r?);
        }
        Ok(projects)
    }

    /// Returns whether the project exists.
    pub fn set_project_active(&self, id: i64, active: bool) -> Result<bool> {
        let rows = self.conn().execute(
            "UPDATE projects SET active = ?1 WHERE id = ?2",
            params![active, id],
        )?;
        Ok(rows > 0)
    }

    /// Overwrite a project's snapshot totals after a scan.
    pub fn update_project_totals(
        &self,
        id: i64,
        total_files: u64,
        total_size: u64,
        last_scan: &str,
    ) -> Result<()> {
        self.conn().execute(
            "UPDATE projects SET total_files = ?1, total_size = ?2, last_scan = ?3 WHERE id = ?4",
            params![total_files as i64, total_size as i64, last_scan, id],
        )?;
        Ok(())
    }

    /// Delete a project with its files and activity (cascade).
    pub fn delete_project(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM projects WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    /// Sum of `total_files` and `total_size` over active projects.
    pub fn active_totals(&self) -> Result<(u64, u64)> {
        let (files, size): (i64, i64) = self.conn().query_row(
            "SELECT COALESCE(SUM(total_files), 0), COALESCE(SUM(total_size), 0)
             FROM projects WHERE active = 1",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )?;
        Ok((files as u64, size as u64))
    }

    // ─── File operations ───

    /// All files of a project, by path.
    pub fn files_for_project(&self, project_id: i64) -> Result<Vec<FileRecord>> {
        self.search_files(project_id, None)
    }

    /// Files of a project whose filename contains `filename_contains`, ignoring case.
    ///
    /// Both sides are folded with Unicode lowercasing in Rust; SQLite's
    /// `lower()` only folds ASCII.
    pub fn search_files(
        &self,
        project_id: i64,
        filename_contains: Option<&str>,
    ) -> Result<Vec<FileRecord>> {
        let needle = filename_contains
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        let sql = format!("SELECT {FILE_COLUMNS} FROM files WHERE project_id = ?1 ORDER BY path");
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(params![project_id], file_from_row)?;
        let mut files = Vec::new();
        for r in rows {
            let file = r?;
            let hit = needle
                .as_deref()
                .is_none_or(|n| file.filename.to_lowercase().contains(n));
            if hit {
                files.push(file);
            }
        }
        Ok(files)
    }

    /// Insert a file record for a project. Returns the row ID.
    pub fn insert_file(&self, project_id: i64, file: &FileRecord) -> Result<i64> {
        self.conn().execute(
            "INSERT INTO files (project_id, path, filename, size, last_modified, file_hash)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                project_id,
                file.path,
                file.filename,
                file.size as i64,
                file.last_modified,
                file.file_hash
            ],
        )?;
        Ok(self.conn().last_insert_rowid())
    }

    /// Overwrite the observed state of an existing file record.
    pub fn update_file(&self, file: &FileRecord) -> Result<()> {
        self.conn().execute(
            "UPDATE files SET size = ?1, last_modified = ?2, file_hash = ?3 WHERE id = ?4",
            params![file.size as i64, file.last_modified, file.file_hash, file.id],
        )?;
        Ok(())
    }

    pub fn delete_file(&self, file_id: i64) -> Result<()> {
        self.conn()
            .execute("DELETE FROM files WHERE id = ?1", params![file_id])?;
        Ok(())
    }

    // ─── Activity operations ───

    /// Append an activity entry for a scan. Returns the row ID.
    pub fn insert_activity(
        &self,
        project_id: i64,
        timestamp: &str,
        scan: &ScanSummary,
    ) -> Result<i64> {
        self.conn().execute(
            "INSERT INTO activity_logs
             (project_id, timestamp, files_added, files_modified, files_deleted, size_change)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                project_id,
                timestamp,
                scan.files_added as i64,
                scan.files_modified as i64,
                scan.files_deleted as i64,
                scan.size_change
            ],
        )?;
        Ok(self.conn().last_insert_rowid())
    }

    /// Entries in `[start, end]`, oldest first.
    pub fn activity_between(
        &self,
        project_id: i64,
        start: &str,
        end: &str,
    ) -> Result<Vec<ActivityLogEntry>> {
        let sql = format!(
            "SELECT {ACTIVITY_COLUMNS} FROM activity_logs
             WHERE project_id = ?1 AND timestamp >= ?2 AND timestamp <= ?3
             ORDER BY timestamp, id"
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(params![project_id, start, end], activity_from_row)?;
        let mut logs = Vec::new();
        for r in rows {
            logs.push(r?);
        }
        Ok(logs)
    }

    /// The complete log of a project, oldest first.
    pub fn all_activity(&self, project_id: i64) -> Result<Vec<ActivityLogEntry>> {
        let sql = format!(
            "SELECT {ACTIVITY_COLUMNS} FROM activity_logs WHERE project_id = ?1 ORDER BY timestamp, id"
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(params![project_id], activity_from_row)?;
        let mut logs = Vec::new();
        for r in rows {
            logs.push(r?);
        }
        Ok(logs)
    }

    /// The `limit` most recent entries, newest first.
    pub fn recent_activity(&self, project_id: i64, limit: usize) -> Result<Vec<ActivityLogEntry>> {
        let sql = format!(
            "SELECT {ACTIVITY_COLUMNS} FROM activity_logs WHERE project_id = ?1
             ORDER BY timestamp DESC, id DESC LIMIT ?2"
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(params![project_id, limit as i64], activity_from_row)?;
        let mut logs = Vec::new();
        for r in rows {
            logs.push(r?);
        }
        Ok(logs)
    }

    // ─── Task category operations ───

    /// Insert a task category. Returns the row ID.
    pub fn insert_category(&self, category: &NewCategory) -> Result<i64> {
        self.conn().execute(
            "INSERT INTO task_categories (name, description, color) VALUES (?1, ?2, ?3)",
            params![category.name, category.description, category.color],
        )?;
        Ok(self.conn().last_insert_rowid())
    }

    pub fn get_category(&self, id: i64) -> Result<Option<TaskCategory>> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM task_categories WHERE id = ?1");
        let mut stmt = self.conn().prepare(&sql)?;
        let mut rows = stmt.query_map(params![id], category_from_row)?;
        match rows.next() {
            Some(r) => Ok(Some(r?)),
            None => Ok(None),
        }
    }

    /// All categories, by name.
    pub fn list_categories(&self) -> Result<Vec<TaskCategory>> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM task_categories ORDER BY name, id");
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map([], category_from_row)?;
        let mut categories = Vec::new();
        for r in rows {
            categories.push(r?);
        }
        Ok(categories)
    }

    /// Delete a category. Its tasks stay, uncategorized.
    pub fn delete_category(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM task_categories WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // ─── Task operations ───

    /// Insert a task. Returns the row ID.
    pub fn insert_task(&self, task: &NewTask, now: &str) -> Result<i64> {
        self.conn().execute(
            "INSERT INTO tasks
             (title, description, project_id, category_id, status, priority, due_date, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
            params![
                task.title,
                task.description,
                task.project,
                task.category,
                task.status.as_str(),
                task.priority.as_str(),
                task.due_date,
                now
            ],
        )?;
        Ok(self.conn().last_insert_rowid())
    }

    pub fn get_task(&self, id: i64) -> Result<Option<Task>> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1");
        let mut stmt = self.conn().prepare(&sql)?;
        let mut rows = stmt.query_map(params![id], task_from_row)?;
        match rows.next() {
            Some(r) => Ok(Some(r?)),
            None => Ok(None),
        }
    }

    /// Tasks matching `filter`, in creation order.
    pub fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks
             WHERE (?1 IS NULL OR project_id = ?1) AND (?2 IS NULL OR status = ?2)
               AND (?3 IS NULL OR priority = ?3) AND (?4 IS NULL OR category_id = ?4)
             ORDER BY id"
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(
            params![
                filter.project,
                filter.status.map(TaskStatus::as_str),
                filter.priority.map(TaskPriority::as_str),
                filter.category
            ],
            task_from_row,
        )?;
        let mut tasks = Vec::new();
        for r in rows {
            tasks.push(r?);
        }
        Ok(tasks)
    }

    /// Overwrite a task's editable fields and stamp `updated_at`.
    pub fn update_task(&self, task: &Task, now: &str) -> Result<bool> {
        let rows = self.conn().execute(
            "UPDATE tasks SET title = ?1, description = ?2, category_id = ?3, status = ?4,
                              priority = ?5, due_date = ?6, updated_at = ?7
             WHERE id = ?8",
            params![
                task.title,
                task.description,
                task.category,
                task.status.as_str(),
                task.priority.as_str(),
                task.due_date,
                now,
                task.id
            ],
        )?;
        Ok(rows > 0)
    }

    /// Delete a task with its comments (cascade).
    pub fn delete_task(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // ─── Task comment operations ───

    /// Insert a comment on a task. Returns the row ID.
    pub fn insert_comment(&self, task_id: i64, text: &str, now: &str) -> Result<i64> {
        self.conn().execute(
            "INSERT INTO task_comments (task_id, text, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
            params![task_id, text, now],
        )?;
        Ok(self.conn().last_insert_rowid())
    }

    pub fn get_comment(&self, id: i64) -> Result<Option<TaskComment>> {
        let sql = format!("SELECT {COMMENT_COLUMNS} FROM task_comments WHERE id = ?1");
        let mut stmt = self.conn().prepare(&sql)?;
        let mut rows = stmt.query_map(params![id], comment_from_row)?;
        match rows.next() {
            Some(r) => Ok(Some(r?)),
            None => Ok(None),
        }
    }

    /// Comments on a task, oldest first or newest first.
    pub fn comments_for_task(&self, task_id: i64, newest_first: bool) -> Result<Vec<TaskComment>> {
        let order = if newest_first {
            "created_at DESC, id DESC"
        } else {
            "created_at, id"
        };
        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM task_comments WHERE task_id = ?1 ORDER BY {order}"
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(params![task_id], comment_from_row)?;
        let mut comments = Vec::new();
        for r in rows {
            comments.push(r?);
        }
        Ok(comments)
    }
}
