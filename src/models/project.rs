use serde::{Deserialize, Serialize};

use super::activity::ActivityLogEntry;

/// A tracked project folder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub folder_path: String,
    /// Owning projects root, if the project was discovered under one.
    pub root: Option<i64>,
    pub is_auto_discovered: bool,
    pub active: bool,
    /// Recomputed wholesale on every scan.
    pub total_files: u64,
    /// Bytes; recomputed wholesale on every scan.
    pub total_size: u64,
    pub last_scan: Option<String>,
    pub created_at: String,
}

/// A project together with its most recent activity entries (newest first).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    #[serde(default)]
    pub recent_activity: Vec<ActivityLogEntry>,
}

/// A folder whose subdirectories are auto-discovered as projects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectRoot {
    pub id: i64,
    pub name: String,
    pub path: String,
    pub auto_discover: bool,
    pub last_scan: Option<String>,
    pub created_at: String,
}

/// Server-side project list filter; `None` fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectFilter {
    pub active: Option<bool>,
    pub is_auto_discovered: Option<bool>,
}

impl ProjectFilter {
    #[must_use]
    pub fn active() -> Self {
        Self {
            active: Some(true),
            is_auto_discovered: None,
        }
    }

    /// Active projects found by root discovery.
    #[must_use]
    pub fn discovered() -> Self {
        Self {
            active: Some(true),
            is_auto_discovered: Some(true),
        }
    }

    #[must_use]
    pub fn matches(&self, project: &Project) -> bool {
        self.active.is_none_or(|a| a == project.active)
            && self
                .is_auto_discovered
                .is_none_or(|d| d == project.is_auto_discovered)
    }
}

/// Payload for registering a project by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProject {
    pub name: String,
    pub folder_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<i64>,
}

/// Payload for registering a projects root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRoot {
    pub name: String,
    pub path: String,
    pub auto_discover: bool,
}

impl NewProject {
    /// Build a payload whose name defaults to the last path component.
    #[must_use]
    pub fn from_path(folder_path: &str, name: Option<&str>) -> Self {
        Self {
            name: name.map_or_else(|| default_name(folder_path), str::to_string),
            folder_path: folder_path.to_string(),
            root: None,
        }
    }
}

impl NewRoot {
    #[must_use]
    pub fn from_path(path: &str, name: Option<&str>, auto_discover: bool) -> Self {
        Self {
            name: name.map_or_else(|| default_name(path), str::to_string),
            path: path.to_string(),
            auto_discover,
        }
    }
}

fn default_name(path: &str) -> String {
    let trimmed = path.trim_end_matches(['/', '\\']);
    trimmed
        .rsplit(['/', '\\'])
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(trimmed)
        .to_string()
}
