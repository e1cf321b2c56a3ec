use clap::{Args, Parser, Subcommand};

use crate::aggregate::{FileCategory, SortField, StatusFilter};
use crate::models::{TaskPriority, TaskStatus};

#[derive(Parser)]
#[command(
    name = "digitrack",
    version,
    about = "Track scanned project folders and their file activity",
    after_help = "Data lives in .digitrack/ under the working directory unless --data-dir is given. \
                  Set --remote (or DIGITRACK_REMOTE) to talk to a tracking service instead of the \
                  local store."
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args)]
pub struct GlobalArgs {
    /// Data directory holding the database, config.toml and state.json
    #[arg(long, global = true)]
    pub data_dir: Option<String>,

    /// Base URL of a remote tracking service (e.g. http://localhost:8000/api)
    #[arg(long, global = true, env = "DIGITRACK_REMOTE")]
    pub remote: Option<String>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Manage projects roots (folders whose subdirectories become projects)
    #[command(subcommand)]
    Root(RootCommand),

    /// Manage tracked projects
    #[command(subcommand)]
    Project(ProjectCommand),

    /// Manage project tasks and their comments
    #[command(subcommand)]
    Task(TaskCommand),

    /// Manage task categories
    #[command(subcommand)]
    Category(CategoryCommand),

    /// Scan one project folder for added, modified and deleted files
    Scan {
        /// Project ID
        id: i64,
    },

    /// Discover projects under every root, then scan every active project
    ScanAll,

    /// Headline totals, activity chart and recently discovered projects
    Dashboard {
        /// Chart a single project instead of the five largest active ones
        #[arg(short, long)]
        project: Option<i64>,
        /// Activity window in days: 7, 30 or 90
        #[arg(short, long, default_value = "30")]
        days: u32,
    },

    /// Activity entries and summary of one project
    Activity {
        /// Project ID
        id: i64,
        /// Activity window in days: 7, 30 or 90
        #[arg(short, long, default_value = "30")]
        days: u32,
    },

    /// Classified, sorted file listing of one project
    Files {
        /// Project ID
        id: i64,
        /// Case-insensitive filename substring
        #[arg(short, long)]
        search: Option<String>,
        /// Sort field: filename, size or last_modified
        #[arg(long, default_value = "filename", value_parser = parse_sort_field)]
        sort: SortField,
        /// Sort descending
        #[arg(long)]
        desc: bool,
        /// Only files of this category (document, image, spreadsheet, ...)
        #[arg(short, long, value_parser = parse_category)]
        category: Option<FileCategory>,
    },

    /// Status badges and activity level from the most recent scans
    Status {
        /// Project ID
        id: i64,
    },

    /// Compare a project's totals with its file inventory and activity log
    Verify {
        /// Project ID
        id: i64,
    },

    /// Show effective settings
    Settings {
        /// Write the effective settings to config.toml
        #[arg(long)]
        init: bool,
    },

    /// Show whether the first-run welcome is still pending
    Welcome {
        /// Mark the welcome as seen
        #[arg(long)]
        dismiss: bool,
    },
}

#[derive(Subcommand)]
pub enum RootCommand {
    /// Register a projects root
    Add {
        /// Folder containing one subdirectory per project
        path: String,
        /// Display name (default: folder name)
        #[arg(short, long)]
        name: Option<String>,
        /// Store the root with auto_discover off (informational; scan-all still discovers it)
        #[arg(long)]
        no_discover: bool,
    },
    /// List projects roots
    List,
    /// Remove a projects root; its projects stay tracked
    Remove {
        /// Root ID
        id: i64,
    },
    /// Discover projects under one root
    Scan {
        /// Root ID
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum ProjectCommand {
    /// Track a folder by hand
    Add {
        /// Project folder
        path: String,
        /// Display name (default: folder name)
        #[arg(short, long)]
        name: Option<String>,
    },
    /// List projects
    List {
        /// all, active or inactive
        #[arg(long, default_value = "all", value_parser = parse_status)]
        status: StatusFilter,
        /// Case-insensitive substring of name or folder
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Project with its five most recent activity entries
    Show {
        /// Project ID
        id: i64,
    },
    /// Resume tracking a project
    Activate {
        /// Project ID
        id: i64,
    },
    /// Stop tracking a project without deleting its history
    Deactivate {
        /// Project ID
        id: i64,
    },
    /// Delete a project with its files and history
    Remove {
        /// Project ID
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum TaskCommand {
    /// Create a task on a project
    Add {
        /// Project ID
        project: i64,
        /// Task title
        title: String,
        #[arg(short, long)]
        description: Option<String>,
        /// Category ID
        #[arg(short, long)]
        category: Option<i64>,
        /// not_started, in_progress, blocked, completed or cancelled
        #[arg(long, value_parser = parse_task_status)]
        status: Option<TaskStatus>,
        /// low, medium, high or urgent
        #[arg(short, long, value_parser = parse_priority)]
        priority: Option<TaskPriority>,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
    },
    /// List tasks, optionally filtered
    List {
        /// Only tasks of this project
        #[arg(long)]
        project: Option<i64>,
        #[arg(long, value_parser = parse_task_status)]
        status: Option<TaskStatus>,
        #[arg(short, long, value_parser = parse_priority)]
        priority: Option<TaskPriority>,
        /// Only tasks of this category ID
        #[arg(short, long)]
        category: Option<i64>,
    },
    /// Task with its category and comments
    Show {
        /// Task ID
        id: i64,
    },
    /// Change fields of a task
    Update {
        /// Task ID
        id: i64,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        /// Category ID
        #[arg(short, long, conflicts_with = "no_category")]
        category: Option<i64>,
        /// Remove the category
        #[arg(long)]
        no_category: bool,
        #[arg(long, value_parser = parse_task_status)]
        status: Option<TaskStatus>,
        #[arg(short, long, value_parser = parse_priority)]
        priority: Option<TaskPriority>,
        /// Due date (YYYY-MM-DD)
        #[arg(long, conflicts_with = "no_due")]
        due: Option<String>,
        /// Remove the due date
        #[arg(long)]
        no_due: bool,
    },
    /// Delete a task with its comments
    Remove {
        /// Task ID
        id: i64,
    },
    /// Comment on a task
    Comment {
        /// Task ID
        id: i64,
        /// Comment text
        text: String,
    },
    /// Comments on a task, newest first
    Comments {
        /// Task ID
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum CategoryCommand {
    /// Create a task category
    Add {
        name: String,
        #[arg(short, long)]
        description: Option<String>,
        /// Hex colour, e.g. #3498db
        #[arg(long)]
        color: Option<String>,
    },
    /// List task categories
    List,
    /// Delete a category; its tasks become uncategorized
    Remove {
        /// Category ID
        id: i64,
    },
}

fn parse_sort_field(s: &str) -> Result<SortField, String> {
    SortField::parse(s).ok_or_else(|| format!("unknown sort field: {s}"))
}

fn parse_category(s: &str) -> Result<FileCategory, String> {
    FileCategory::parse(s).ok_or_else(|| format!("unknown file category: {s}"))
}

fn parse_task_status(s: &str) -> Result<TaskStatus, String> {
    TaskStatus::parse(s).ok_or_else(|| format!("unknown task status: {s}"))
}

fn parse_priority(s: &str) -> Result<TaskPriority, String> {
    TaskPriority::parse(s).ok_or_else(|| format!("unknown priority: {s}"))
}

fn parse_status(s: &str) -> Result<StatusFilter, String> {
    match s.to_lowercase().as_str() {
        "all" => Ok(StatusFilter::All),
        "active" => Ok(StatusFilter::Active),
        "inactive" => Ok(StatusFilter::Inactive),
        _ => Err(format!("unknown status: {s}")),
    }
}
