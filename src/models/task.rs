use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackError};

/// Colour given to categories created without one.
pub const DEFAULT_CATEGORY_COLOR: &str = "#3498db";

const MAX_TITLE_CHARS: usize = 255;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    NotStarted,
    InProgress,
    Blocked,
    Completed,
    Cancelled,
}

impl TaskStatus {
    pub const ALL: [Self; 5] = [
        Self::NotStarted,
        Self::InProgress,
        Self::Blocked,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Wire and storage code, e.g. `IN_PROGRESS`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "NOT_STARTED",
            Self::InProgress => "IN_PROGRESS",
            Self::Blocked => "BLOCKED",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::NotStarted => "Not Started",
            Self::InProgress => "In Progress",
            Self::Blocked => "Blocked",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Accepts the code or the label in any case, with `-`, `_` or space separators.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let key = normalize(s);
        Self::ALL.into_iter().find(|v| v.as_str() == key)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    pub const ALL: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Urgent];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Urgent => "URGENT",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Urgent => "Urgent",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let key = normalize(s);
        Self::ALL.into_iter().find(|v| v.as_str() == key)
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_uppercase().replace(['-', ' '], "_")
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskCategory {
    pub id: i64,
    pub name: String,
    pub description: String,
    /// `#rrggbb`.
    pub color: String,
}

/// A piece of work attached to a project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub project: i64,
    pub category: Option<i64>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    /// Calendar date, `YYYY-MM-DD`.
    pub due_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskComment {
    pub id: i64,
    pub task: i64,
    pub text: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A task with its category expanded and its comments, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDetail {
    #[serde(flatten)]
    pub task: Task,
    #[serde(default)]
    pub category_details: Option<TaskCategory>,
    #[serde(default)]
    pub comments: Vec<TaskComment>,
}

/// Payload for creating a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub description: String,
    pub color: String,
}

impl NewCategory {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            description: String::new(),
            color: DEFAULT_CATEGORY_COLOR.to_string(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(invalid("name", "must not be empty"));
        }
        let hex = self.color.strip_prefix('#').unwrap_or("");
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid("color", format!("expected #rrggbb, got {:?}", self.color)));
        }
        Ok(())
    }
}

/// Payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub project: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<i64>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

impl NewTask {
    /// A not-started, medium-priority task with no category or due date.
    #[must_use]
    pub fn new(project: i64, title: &str) -> Self {
        Self {
            title: title.trim().to_string(),
            description: String::new(),
            project,
            category: None,
            status: TaskStatus::default(),
            priority: TaskPriority::default(),
            due_date: None,
        }
    }

    /// Check the title and normalize the due date.
    pub fn validate(&mut self) -> Result<()> {
        validate_title(&self.title)?;
        if let Some(raw) = &self.due_date {
            self.due_date = Some(parse_due_date(raw)?);
        }
        Ok(())
    }
}

/// Partial task update; `None` leaves a field untouched.
///
/// `category` and `due_date` use `Some(None)` to clear the value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Option<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<String>>,
}

impl TaskUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Validate the set fields and normalize the due date.
    pub fn validate(&mut self) -> Result<()> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(Some(raw)) = &self.due_date {
            self.due_date = Some(Some(parse_due_date(raw)?));
        }
        Ok(())
    }

    /// Write the set fields onto `task`.
    pub fn apply(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.trim().to_string();
        }
        if let Some(description) = &self.description {
            task.description.clone_from(description);
        }
        if let Some(category) = self.category {
            task.category = category;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(due_date) = &self.due_date {
            task.due_date.clone_from(due_date);
        }
    }
}

/// Task list filter; `None` fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub project: Option<i64>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub category: Option<i64>,
}

impl TaskFilter {
    #[must_use]
    pub fn for_project(project: i64) -> Self {
        Self {
            project: Some(project),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        self.project.is_none_or(|p| p == task.project)
            && self.status.is_none_or(|s| s == task.status)
            && self.priority.is_none_or(|p| p == task.priority)
            && self.category.is_none_or(|c| task.category == Some(c))
    }
}

/// Parse a `YYYY-MM-DD` due date and return it in canonical form.
pub fn parse_due_date(raw: &str) -> Result<String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map(|d| d.format("%Y-%m-%d").to_string())
        .map_err(|e| invalid("due_date", format!("{raw:?}: {e}")))
}

fn validate_title(title: &str) -> Result<()> {
    let title = title.trim();
    if title.is_empty() {
        return Err(invalid("title", "must not be empty"));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(invalid("title", format!("longer than {MAX_TITLE_CHARS} characters")));
    }
    Ok(())
}

fn invalid(field: &'static str, reason: impl Into<String>) -> TrackError {
    TrackError::Invalid {
        field,
        reason: reason.into(),
    }
}
